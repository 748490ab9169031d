//! Users repository walkthrough.
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/demo cargo run -p pgrepo --example users
//! ```

use pgrepo::{DatabaseConfig, Mapper, OrmResult, Repo, create_pool_from_config};

#[derive(Debug, Clone, Default, Mapper)]
struct User {
    id: i64,
    name: String,
    email: String,
}

#[tokio::main]
async fn main() -> OrmResult<()> {
    let _ = dotenvy::dotenv();
    let config = DatabaseConfig::from_env()?;
    let users = Repo::<User, _>::with_db(create_pool_from_config(&config)?, "users", ["id"]);
    let client = users.db().get().await?;

    client
        .batch_execute(
            "CREATE TEMP TABLE users (
                 id BIGINT PRIMARY KEY,
                 name TEXT NOT NULL,
                 email TEXT NOT NULL UNIQUE
             )",
        )
        .await?;

    users
        .insert(
            &client,
            &User {
                id: 1,
                name: "A".into(),
                email: "a@x".into(),
            },
        )
        .await?;

    let found = users.select_one(&client, "WHERE id = $c1", &[&1_i64]).await?;
    println!("inserted: {found:?}");

    users
        .upsert(
            &client,
            &User {
                name: "B".into(),
                ..found
            },
            &["email"],
        )
        .await?;

    let all = users.select(&client, "ORDER BY id", &[]).await?;
    println!("after upsert: {all:?}");
    println!("count: {}", users.count(&client, "", &[]).await?);

    match users.upsert(&client, &all[0], &["name", "email"]).await {
        Err(e) if e.is_validation() => println!("rejected as expected: {e}"),
        other => println!("unexpected: {other:?}"),
    }

    users.delete(&client, "WHERE id = $c1", &[&1_i64]).await?;
    Ok(())
}
