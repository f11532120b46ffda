use cassmock_api::{Cluster, Parameters, Value};
use cassmock_test_utils::TestSession;
use uuid::Uuid;

#[test]
fn test_end_to_end_users() {
    let test = TestSession::with_fixtures();
    let alice = test.insert_user("Alice", 30);
    test.insert_user("Bob", 25);

    let rows = test.exec_with(
        "SELECT name, email, age, active FROM app.users WHERE id = ?",
        Parameters::positional(vec![alice]),
    );
    assert_eq!(rows.len(), 1);
    let row = rows.one().unwrap();
    assert_eq!(row.get_text("name"), Some("Alice"));
    assert_eq!(row.get_text("email"), Some("alice@example.com"));
    assert_eq!(row.get_i64("age"), Some(30));
    assert_eq!(row.get_bool("active"), Some(true));

    let all = test.exec("SELECT * FROM users");
    assert_eq!(all.len(), 2);
}

#[test]
fn test_uuid_stored_as_canonical_text() {
    let test = TestSession::with_fixtures();
    let id = test.insert_user("Carol", 41);

    let rows = test.exec("SELECT id FROM users");
    let stored = rows.one().unwrap().get(0).unwrap().clone();
    assert_eq!(stored, Value::Text(id.hyphenated().to_string()));
    assert_eq!(rows.one().unwrap().get_uuid("id"), Some(id));
}

#[test]
fn test_upsert_replaces_row() {
    let test = TestSession::with_fixtures();
    let id = Uuid::new_v4();

    for age in [20, 21, 22] {
        test.exec_with(
            "INSERT INTO users (id, name, age) VALUES (:id, :name, :age)",
            Parameters::named().bind("id", id).bind("name", "Dana").bind("age", age),
        );
    }

    assert_eq!(test.count("users"), 1);
    let rows = test.exec_with(
        "SELECT age FROM users WHERE id = %(id)s",
        Parameters::named().bind("id", id),
    );
    assert_eq!(rows.one().unwrap().get_i64("age"), Some(22));
}

#[test]
fn test_insert_if_not_exists_keeps_first_row() {
    let test = TestSession::with_fixtures();
    test.exec("INSERT INTO orders (id, status, total) VALUES (1, 'new', 9.5) IF NOT EXISTS");
    test.exec("INSERT INTO orders (id, status, total) VALUES (1, 'paid', 12.0) IF NOT EXISTS");

    let rows = test.exec("SELECT status, total FROM orders WHERE id = 1");
    assert_eq!(rows.one().unwrap().get_text("status"), Some("new"));
    assert_eq!(rows.one().unwrap().get_f64("total"), Some(9.5));
}

#[test]
fn test_composite_key_round_trip() {
    let test = TestSession::with_fixtures();
    let schema = test.session.schema("events").unwrap();
    assert_eq!(schema.partition_keys, vec!["tenant", "day"]);
    assert_eq!(schema.clustering_key.as_deref(), Some("ts"));

    for ts in 0..5 {
        test.exec_with(
            "INSERT INTO events (tenant, day, ts, kind) VALUES (%s, %s, %s, %s)",
            Parameters::positional(vec![
                Value::from("acme"),
                Value::from(20240101),
                Value::from(ts),
                Value::from("click"),
            ]),
        );
    }

    let rows = test.exec(
        "SELECT ts FROM events WHERE tenant = 'acme' AND day = 20240101 AND ts >= 2 ORDER BY ts DESC",
    );
    let seen: Vec<i64> = rows.iter().filter_map(|r| r.get_i64("ts")).collect();
    assert_eq!(seen, vec![4, 3, 2]);
}

#[test]
fn test_secondary_index_query() {
    let test = TestSession::with_fixtures();
    test.exec("INSERT INTO orders (id, status, total) VALUES (1, 'open', 10.0)");
    test.exec("INSERT INTO orders (id, status, total) VALUES (2, 'closed', 20.0)");
    test.exec("INSERT INTO orders (id, status, total) VALUES (3, 'open', 30.0)");

    let rows = test.exec_with(
        "SELECT id FROM orders WHERE status = ?",
        Parameters::positional(vec!["open"]),
    );
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_update_delete_truncate_passthrough() {
    let test = TestSession::with_fixtures();
    test.exec("INSERT INTO orders (id, status) VALUES (1, 'open')");
    test.exec("INSERT INTO orders (id, status) VALUES (2, 'open')");

    test.exec("UPDATE app.orders SET status = 'shipped' WHERE id = 1");
    let rows = test.exec("SELECT status FROM orders WHERE id = 1");
    assert_eq!(rows.one().unwrap().get_text("status"), Some("shipped"));

    test.exec("DELETE FROM app.orders WHERE id = 2");
    assert_eq!(test.count("orders"), 1);

    test.exec("TRUNCATE app.orders");
    assert_eq!(test.count("orders"), 0);
}

#[test]
fn test_prepared_statements() {
    let test = TestSession::with_fixtures();
    let insert = test
        .session
        .prepare("INSERT INTO orders (id, status, total) VALUES (?, ?, ?)")
        .unwrap();

    for i in 0..3 {
        test.session
            .execute_with(
                &insert,
                Parameters::positional(vec![Value::from(i), Value::from("it's new"), Value::from(1.5)]),
            )
            .unwrap();
    }
    assert_eq!(test.count("orders"), 3);

    let select = test.session.prepare("SELECT status FROM orders WHERE id = :id").unwrap();
    let bound = select.bind(Parameters::named().bind("id", 2)).unwrap();
    let rows = test.session.execute(bound).unwrap();
    assert_eq!(rows.one().unwrap().get_text("status"), Some("it's new"));
}

#[test]
fn test_liveness_probe_without_tables() {
    let session = Cluster::new().connect(None).unwrap();
    let rows = session
        .execute("SELECT cluster_name, release_version FROM System.Local WHERE key = 'local'")
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.one().unwrap().get(0), Some(&Value::Boolean(true)));
}

#[test]
fn test_keyspace_statements() {
    let test = TestSession::new();
    assert_eq!(test.session.keyspace().as_deref(), Some("app"));

    test.exec("CREATE KEYSPACE IF NOT EXISTS analytics WITH replication = {'class': 'SimpleStrategy', 'replication_factor': 1}");
    test.exec("USE analytics");
    assert_eq!(test.session.keyspace().as_deref(), Some("analytics"));
    test.exec("DROP KEYSPACE analytics");
}
