//! Request logging through a real listener.

use std::time::Duration;

mod common;

#[tokio::test]
async fn test_request_started_and_completed() {
    let server = common::start_server().await;

    let res = common::client()
        .get(server.url("/health"))
        .header("user-agent", "pytest-client/1.0")
        .send()
        .await
        .expect("API unreachable");
    assert_eq!(res.status(), 200);

    let process_time = res
        .headers()
        .get("x-process-time")
        .expect("missing X-Process-Time")
        .to_str()
        .unwrap();
    assert!(process_time.parse::<f64>().unwrap() >= 0.0);
    let request_id = res.headers().get("x-request-id").unwrap().to_str().unwrap().to_string();

    server.wait_for_records(2).await;

    let started = server.records_starting_with("Request started");
    assert_eq!(started.len(), 1);
    assert_eq!(started[0]["message"], "Request started: GET /health");
    assert_eq!(started[0]["level"], "INFO");
    assert_eq!(started[0]["method"], "GET");
    assert_eq!(started[0]["client_host"], "127.0.0.1");
    assert_eq!(started[0]["user_agent"], "pytest-client/1.0");
    assert_eq!(started[0]["url"], server.url("/health"));
    assert_eq!(started[0]["request_id"], request_id.as_str());

    let completed = server.records_starting_with("Request completed");
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["level"], "INFO");
    assert_eq!(completed[0]["status_code"], 200);
    assert!(completed[0]["process_time"].as_str().unwrap().ends_with('s'));
    assert!(completed[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Request completed: GET /health - 200 ("));

    server.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), server.handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_client_errors_logged_as_error() {
    let server = common::start_server().await;

    let res = common::client()
        .get(server.url("/elections/42"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    server.wait_for_records(2).await;
    let completed = server.records_starting_with("Request completed");
    assert_eq!(completed[0]["level"], "ERROR");
    assert_eq!(completed[0]["status_code"], 404);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_client_request_id_propagated() {
    let server = common::start_server().await;

    let res = common::client()
        .get(server.url("/"))
        .header("x-request-id", "req-7f3a")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "req-7f3a");

    server.wait_for_records(2).await;
    for record in server.sink.values() {
        assert_eq!(record["request_id"], "req-7f3a");
    }

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_every_line_is_a_contract_record() {
    let server = common::start_server().await;
    let client = common::client();

    for path in ["/", "/health", "/missing"] {
        client.get(server.url(path)).send().await.unwrap();
    }
    server.wait_for_records(6).await;

    for line in server.sink.lines() {
        let doc = elections_logs::index::to_document(&line).expect("line must be indexable");
        assert!(doc.level().is_some());
    }

    server.shutdown.trigger();
}
