use cassmock_api::{Error, Parameters};
use cassmock_test_utils::TestSession;
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn test_execute_async_resolves_immediately() {
    let test = TestSession::with_fixtures();
    let id = test.insert_user("Alice", 30);

    let future = test
        .session
        .execute_async_with(
            "SELECT name FROM users WHERE id = ?",
            Parameters::positional(vec![id]),
        )
        .unwrap();

    assert!(future.is_done());
    assert_eq!(future.result().len(), 1);

    let rows = future.await;
    assert_eq!(rows.one().unwrap().get_text("name"), Some("Alice"));
}

#[tokio::test]
async fn test_execute_async_errors_are_returned_directly() {
    let test = TestSession::with_fixtures();
    let result = test.session.execute_async("SELECT * FROM users WHERE name = 'x'");
    assert!(matches!(result, Err(Error::InvalidQuery(_))));
}

#[test]
fn test_callbacks_receive_rows() {
    let test = TestSession::with_fixtures();
    test.insert_user("A", 1);
    test.insert_user("B", 2);

    let names = Arc::new(Mutex::new(Vec::new()));
    let errors = Arc::new(Mutex::new(0));

    let future = test.session.execute_async("SELECT name FROM users").unwrap();
    future.add_callbacks(
        |rows| {
            let mut names = names.lock().unwrap();
            for row in rows {
                names.push(row.get_text("name").unwrap_or_default().to_string());
            }
            Ok(())
        },
        |_| *errors.lock().unwrap() += 1,
    );

    let mut names = names.lock().unwrap().clone();
    names.sort();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(*errors.lock().unwrap(), 0);
}

#[test]
fn test_callback_failure_reaches_errback() {
    let test = TestSession::with_fixtures();
    let captured = Arc::new(Mutex::new(None));

    let future = test.session.execute_async("SELECT * FROM orders").unwrap();
    future.add_callbacks(
        |rows| {
            if rows.is_empty() {
                anyhow::bail!("expected at least one order");
            }
            Ok(())
        },
        |err| *captured.lock().unwrap() = Some(err.to_string()),
    );

    assert_eq!(
        captured.lock().unwrap().as_deref(),
        Some("expected at least one order")
    );
}
