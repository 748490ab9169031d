use super::*;
use crate::mapper::SqlMap;
use crate::accessor;
use std::sync::Mutex;

#[derive(Debug, Clone, Default, PartialEq)]
struct User {
    id: i64,
    name: String,
    email: String,
}

impl Mapper for User {
    fn mapper(&self) -> SqlMap<Self> {
        SqlMap::new()
            .column("id", accessor!(User, id))
            .column("name", accessor!(User, name))
            .column("email", accessor!(User, email))
    }
}

#[derive(Debug, Default)]
struct Empty;

impl Mapper for Empty {
    fn mapper(&self) -> SqlMap<Self> {
        SqlMap::new()
    }
}

/// Records every statement and answers with no rows.
#[derive(Default)]
struct RecordingClient {
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingClient {
    fn record(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) {
        let params = params.iter().map(|p| format!("{p:?}")).collect();
        self.calls.lock().unwrap().push((sql.to_string(), params));
    }

    fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl GenericClient for RecordingClient {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        self.record(sql, params);
        Ok(Vec::new())
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        self.record(sql, params);
        Ok(1)
    }
}

fn users() -> Repo<User> {
    Repo::new("users", ["id"])
}

fn alice() -> User {
    User {
        id: 1,
        name: "A".into(),
        email: "a@x".into(),
    }
}

#[test]
fn descriptor_follows_mapping_order() {
    let repo = users();
    assert_eq!(repo.table(), "users");
    assert_eq!(repo.primary_keys(), ["id".to_string()]);
    assert_eq!(repo.columns(), ["id", "name", "email"]);
    assert_eq!(repo.select_columns(), "id, name, email");
}

#[test]
fn descriptor_debug_lists_columns() {
    let dbg = format!("{:?}", users());
    assert!(dbg.contains("\"users\""));
    assert!(dbg.contains("\"email\""));
}

#[test]
fn repo_is_shareable_across_threads() {
    fn assert_send_sync<X: Send + Sync>() {}
    assert_send_sync::<Repo<User>>();
}

#[tokio::test]
async fn select_on_empty_relation_is_empty() {
    let client = RecordingClient::default();
    let rows = users().select(&client, "", &[]).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(
        client.calls(),
        vec![("SELECT id, name, email FROM users".to_string(), vec![])]
    );
}

#[tokio::test]
async fn select_rewrites_named_placeholders() {
    let client = RecordingClient::default();
    users()
        .select(&client, "WHERE name = $c1 OR email = $c2 ORDER BY id", &[&"A", &"a@x"])
        .await
        .unwrap();
    let (sql, params) = &client.calls()[0];
    assert_eq!(
        sql,
        "SELECT id, name, email FROM users WHERE name = $1 OR email = $2 ORDER BY id"
    );
    assert_eq!(params, &vec!["\"A\"".to_string(), "\"a@x\"".to_string()]);
}

#[tokio::test]
async fn zero_arg_clause_is_sent_verbatim() {
    let client = RecordingClient::default();
    let clause = "WHERE note = '$c1' AND id > 0";
    users().select(&client, clause, &[]).await.unwrap();
    users().delete(&client, clause, &[]).await.unwrap();
    let calls = client.calls();
    assert_eq!(calls[0].0, format!("SELECT id, name, email FROM users {clause}"));
    assert_eq!(calls[1].0, format!("DELETE FROM users {clause}"));
}

#[tokio::test]
async fn select_one_without_rows_is_not_found() {
    let client = RecordingClient::default();
    let err = users()
        .select_one(&client, "WHERE id = $c1", &[&1_i64])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        client.calls()[0].0,
        "SELECT id, name, email FROM users WHERE id = $1 LIMIT 1"
    );
}

#[tokio::test]
async fn count_sends_count_statement() {
    let client = RecordingClient::default();
    // No rows come back from the recorder, so the call itself fails.
    let err = users()
        .count(&client, "WHERE email = $c1", &[&"a@x"])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        client.calls()[0].0,
        "SELECT COUNT(*) FROM users WHERE email = $1"
    );
}

#[tokio::test]
async fn insert_binds_fields_in_column_order() {
    let client = RecordingClient::default();
    let affected = users().insert(&client, &alice()).await.unwrap();
    assert_eq!(affected, 1);
    let (sql, params) = &client.calls()[0];
    assert_eq!(sql, "INSERT INTO users (id, name, email) VALUES ($1, $2, $3)");
    assert_eq!(params, &vec!["1".to_string(), "\"A\"".into(), "\"a@x\"".into()]);
}

#[tokio::test]
async fn insert_many_sums_affected_rows() {
    let client = RecordingClient::default();
    let bob = User {
        id: 2,
        name: "B".into(),
        email: "b@x".into(),
    };
    let affected = users().insert_many(&client, &[alice(), bob]).await.unwrap();
    assert_eq!(affected, 2);
    assert_eq!(client.calls().len(), 2);
    assert_eq!(client.calls()[1].1[0], "2");
}

#[tokio::test]
async fn upsert_reuses_value_placeholders_in_set() {
    let client = RecordingClient::default();
    let record = User {
        name: "B".into(),
        ..alice()
    };
    users().upsert(&client, &record, &["email"]).await.unwrap();
    let (sql, params) = &client.calls()[0];
    assert_eq!(
        sql,
        "INSERT INTO users (id, name, email) VALUES ($1, $2, $3) \
         ON CONFLICT (id) DO UPDATE SET name = $2"
    );
    assert_eq!(params.len(), 3);
}

#[tokio::test]
async fn upsert_with_empty_set_never_reaches_the_store() {
    let client = RecordingClient::default();
    let err = users()
        .upsert(&client, &alice(), &["name", "email"])
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn update_and_delete_pass_clause_through() {
    let client = RecordingClient::default();
    let repo = users();
    repo.update(&client, "SET name = $c1 WHERE id = $c2", &[&"Z", &1_i64])
        .await
        .unwrap();
    repo.delete(&client, "WHERE id = $c1", &[&1_i64]).await.unwrap();
    let calls = client.calls();
    assert_eq!(calls[0].0, "UPDATE users SET name = $1 WHERE id = $2");
    assert_eq!(calls[1].0, "DELETE FROM users WHERE id = $1");
}

#[tokio::test]
async fn missing_argument_is_rejected_before_execution() {
    let client = RecordingClient::default();
    let err = users()
        .update(&client, "SET name = $c1 WHERE id = $c2", &[&"Z"])
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn empty_mapping_is_rejected_before_execution() {
    let client = RecordingClient::default();
    let repo: Repo<Empty> = Repo::new("t", ["id"]);
    assert!(repo.columns().is_empty());

    let err = repo.select(&client, "", &[]).await.unwrap_err();
    assert!(err.is_validation());
    let err = repo.select_one(&client, "WHERE id = $c1", &[&1_i64]).await.unwrap_err();
    assert!(err.is_validation());
    assert!(repo.insert(&client, &Empty).await.unwrap_err().is_validation());
    let err = repo.upsert(&client, &Empty, &[] as &[&str]).await.unwrap_err();
    assert!(err.is_validation());
    assert!(client.calls().is_empty());

    // Clause-only statements do not depend on the mapping.
    repo.delete(&client, "WHERE id = $c1", &[&1_i64]).await.unwrap();
    assert_eq!(client.calls()[0].0, "DELETE FROM t WHERE id = $1");
}

#[tokio::test]
async fn descriptor_keeps_its_store_handle() {
    let repo = Repo::<User, _>::with_db(RecordingClient::default(), "users", ["id"]);
    assert_eq!(repo.columns(), ["id", "name", "email"]);

    repo.insert(repo.db(), &alice()).await.unwrap();
    let rows = repo.select(repo.db(), "WHERE id = $c1", &[&1_i64]).await.unwrap();
    assert!(rows.is_empty());

    let calls = repo.db().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0, "SELECT id, name, email FROM users WHERE id = $1");
}

#[tokio::test]
async fn works_through_a_shared_reference() {
    let client = RecordingClient::default();
    let by_ref = &client;
    let rows = users().select(&by_ref, "WHERE id = $c1", &[&3_i64]).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(client.calls().len(), 1);
}
