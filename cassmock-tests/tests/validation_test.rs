/// Key-predicate rules applied to filtered SELECTs

use cassmock_api::{Error, Parameters};
use cassmock_core::SessionConfig;
use cassmock_test_utils::TestSession;

fn invalid_query(test: &TestSession, cql: &str) -> String {
    match test.session.execute(cql) {
        Err(Error::InvalidQuery(msg)) => msg,
        other => panic!("Expected InvalidQuery for {}, got {:?}", cql, other),
    }
}

#[test]
fn test_full_scan_always_allowed() {
    let test = TestSession::with_fixtures();
    test.exec("SELECT * FROM users");
    test.exec("SELECT * FROM app.events LIMIT 10");
}

#[test]
fn test_single_partition_key() {
    let test = TestSession::with_fixtures();
    test.exec_with(
        "SELECT * FROM users WHERE id = ?",
        Parameters::positional(vec!["x"]),
    );

    assert_eq!(
        invalid_query(&test, "SELECT * FROM users WHERE name = 'x'"),
        "primary key(s) {id} missing from where clause"
    );
    assert_eq!(
        invalid_query(&test, "SELECT * FROM users WHERE id = 'a' AND name = 'x'"),
        "non-primary-key column present in where clause"
    );
}

#[test]
fn test_composite_key_requires_every_column() {
    let test = TestSession::with_fixtures();
    test.exec("SELECT * FROM events WHERE tenant = 'a' AND day = 1 AND ts = 5");
    test.exec("SELECT * FROM events WHERE ts > 5 AND day = 1 AND tenant = 'a'");

    assert_eq!(
        invalid_query(&test, "SELECT * FROM events WHERE tenant = 'a'"),
        "primary key(s) {day, ts} missing from where clause"
    );
    assert_eq!(
        invalid_query(
            &test,
            "SELECT * FROM events WHERE tenant = 'a' AND day = 1 AND ts = 5 AND kind = 'click'"
        ),
        "non-primary-key column present in where clause"
    );
}

#[test]
fn test_secondary_index_rules() {
    let test = TestSession::with_fixtures();
    test.exec("SELECT * FROM orders WHERE status = 'open'");

    assert_eq!(
        invalid_query(&test, "SELECT * FROM orders WHERE id = 1 AND status = 'open'"),
        "query requires explicit filtering"
    );
    // non-indexed, non-key column
    assert_eq!(
        invalid_query(&test, "SELECT * FROM orders WHERE total > 5"),
        "primary key(s) {id} missing from where clause"
    );
}

#[test]
fn test_column_names_match_exactly() {
    let test = TestSession::new();
    test.exec("CREATE TABLE flags (id int PRIMARY KEY, identity_ok boolean)");

    assert_eq!(
        invalid_query(&test, "SELECT * FROM flags WHERE identity_ok = true"),
        "primary key(s) {id} missing from where clause"
    );
    test.exec("SELECT * FROM flags WHERE ID = 1");
}

#[test]
fn test_implicit_joins_rejected() {
    let test = TestSession::with_fixtures();
    assert_eq!(
        invalid_query(&test, "SELECT * FROM users, orders"),
        "implicit joins not supported"
    );
    assert_eq!(
        invalid_query(&test, "SELECT * FROM users, orders WHERE users.id = orders.id"),
        "implicit joins not supported"
    );
}

#[test]
fn test_allow_filtering() {
    let test = TestSession::with_fixtures();
    test.exec("SELECT * FROM users WHERE name = 'x' ALLOW FILTERING");

    let strict = TestSession::with_config(SessionConfig::new().ignore_allow_filtering());
    strict.exec(cassmock_test_utils::USERS_DDL);
    assert_eq!(
        invalid_query(&strict, "SELECT * FROM users WHERE name = 'x' ALLOW FILTERING"),
        "primary key(s) {id} missing from where clause"
    );
}

#[test]
fn test_insert_requires_key_columns() {
    let test = TestSession::with_fixtures();
    let msg = invalid_query(&test, "INSERT INTO events (tenant, day, kind) VALUES ('a', 1, 'x')");
    assert!(msg.contains("ts"), "unexpected message: {}", msg);
}

#[test]
fn test_nested_boolean_structure_is_flattened() {
    let test = TestSession::with_fixtures();
    test.exec("SELECT * FROM events WHERE (tenant = 'a' AND day = 1) AND ts IN (1, 2, 3)");
}

#[test]
fn test_table_alias_cannot_bypass_key_rules() {
    let test = TestSession::with_fixtures();
    test.insert_user("Alice", 30);

    for cql in [
        "SELECT * FROM users u WHERE name = 'Alice'",
        "SELECT * FROM users AS u WHERE u.name = 'Alice'",
        "SELECT * FROM users u",
    ] {
        let err = test.session.execute(cql).unwrap_err();
        assert!(matches!(err, Error::Syntax(_)), "{}: {:?}", cql, err);
    }

    assert_eq!(
        invalid_query(&test, "SELECT * FROM users WHERE name = 'Alice'"),
        "primary key(s) {id} missing from where clause"
    );
}

#[test]
fn test_per_column_is_filtered_like_any_other() {
    let test = TestSession::new();
    test.exec("CREATE TABLE quotas (id int PRIMARY KEY, per text)");
    test.exec("INSERT INTO quotas (id, per) VALUES (1, 'day')");

    assert_eq!(
        invalid_query(&test, "SELECT * FROM quotas WHERE per = 'day'"),
        "primary key(s) {id} missing from where clause"
    );
    let rows = test.exec("SELECT per FROM quotas WHERE id = 1");
    assert_eq!(rows.one().unwrap().get_text("per"), Some("day"));
}
