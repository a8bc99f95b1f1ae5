//! Integration tests for the blocking client.
//!
//! wiremock needs a runtime, so each test starts its server on tokio and
//! drives the blocking client from `spawn_blocking`.

use apiclient::blocking::Client;
use apiclient::{ClientConfig, Error, Payload, RequestBody, RequestOptions};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Item {
    id: u32,
    name: String,
}

fn client_for(base_url: &str, retries: usize) -> Client {
    let config = ClientConfig::builder()
        .base_url(base_url)
        .unwrap()
        .retries(retries)
        .backoff(Duration::from_millis(10))
        .build()
        .unwrap();
    Client::new(config).unwrap()
}

fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blocking_verbs() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "a"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .and(body_json(json!({"name": "b"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2, "name": "b"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    for verb in ["PUT", "PATCH", "DELETE"] {
        Mock::given(method(verb))
            .and(path("/items/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verb": verb})))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("HEAD"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-total-count", "2"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("OPTIONS"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(204).insert_header("allow", "GET, POST"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    tokio::task::spawn_blocking(move || {
        let client = client_for(&uri, 3);

        let item = client.get::<Item>("/items/1").unwrap();
        assert_eq!(
            item.data,
            Payload::Data(Item {
                id: 1,
                name: "a".to_string()
            })
        );
        assert_eq!(item.attempts, 1);

        let created = client
            .post::<Item>("/items", json!({"name": "b"}))
            .unwrap();
        assert_eq!(created.status.as_u16(), 201);

        let put = client.put::<Value>("/items/2", json!({"name": "c"})).unwrap();
        assert_eq!(put.data, Payload::Data(json!({"verb": "PUT"})));

        let patch = client
            .patch::<Value>("/items/2", RequestBody::form([("name", "d")]))
            .unwrap();
        assert_eq!(patch.data, Payload::Data(json!({"verb": "PATCH"})));

        let delete = client.delete::<Value>("/items/2").unwrap();
        assert_eq!(delete.data, Payload::Data(json!({"verb": "DELETE"})));

        let head = client.head("/items").unwrap();
        assert_eq!(head.header("x-total-count"), Some("2"));

        let options = client.options("/items").unwrap();
        assert_eq!(options.status.as_u16(), 204);
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blocking_http_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let result = tokio::task::spawn_blocking(move || client_for(&uri, 3).get::<Value>("/missing"))
        .await
        .unwrap();

    match result {
        Err(Error::HttpStatus { status, body, .. }) => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, "Not found");
        }
        other => panic!("Expected HttpStatus, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blocking_processing_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wrong-shape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "not a number"})))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    tokio::task::spawn_blocking(move || {
        let client = client_for(&uri, 3);

        assert!(matches!(
            client.get::<Value>("/text"),
            Err(Error::MalformedResponse { .. })
        ));
        assert!(matches!(
            client.get::<Item>("/wrong-shape"),
            Err(Error::ResponseValidation { .. })
        ));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blocking_post_process_and_api_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "3"))
        .and(header("x-trace", "t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "a"}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    tokio::task::spawn_blocking(move || {
        let config = ClientConfig::builder()
            .base_url(&uri)
            .unwrap()
            .build()
            .unwrap();
        let client = Client::with_post_process(config, |body: Value| {
            json!({ "count": body.as_array().map(|items| items.len()).unwrap_or(0) })
        })
        .unwrap();

        let list_items = client.api_call::<Vec<Item>>("/items", "GET");
        let options = RequestOptions::new()
            .with_query_param("page", "3")
            .with_header("X-Trace", "t-1")
            .unwrap();
        let response = list_items(options).unwrap();

        assert_eq!(response.data, Payload::Processed(json!({"count": 1})));

        let unsupported = client.api_call::<Value>("/items", "options");
        assert!(matches!(
            unsupported(RequestOptions::new()),
            Err(Error::UnsupportedMethod(_))
        ));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blocking_timeout_then_success() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(move |_req: &wiremock::Request| {
            if attempt_count_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(200).set_delay(Duration::from_secs(2))
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
            }
        })
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let response = tokio::task::spawn_blocking(move || {
        let config = ClientConfig::builder()
            .base_url(&uri)
            .unwrap()
            .retries(3)
            .timeout(Duration::from_millis(200))
            .backoff(Duration::from_millis(10))
            .build()
            .unwrap();
        Client::new(config).unwrap().get::<Value>("/slow")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(response.data, Payload::Data(json!({"ok": true})));
    assert_eq!(response.attempts, 2);
    assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_blocking_transport_failure_exhausts_retries() {
    let client = client_for(&unreachable_base_url(), 3);

    let started = Instant::now();
    let err = client.get::<Value>("/test").unwrap_err();

    match err {
        Error::RetryExhausted {
            endpoint,
            attempts,
            last_error,
        } => {
            assert_eq!(endpoint, "/test");
            assert_eq!(attempts, 3);
            assert!(matches!(last_error.as_deref(), Some(Error::Transport(_))));
        }
        other => panic!("Expected RetryExhausted, got {:?}", other),
    }
    assert!(started.elapsed() >= Duration::from_millis(20));
}

#[test]
fn test_blocking_zero_retries() {
    let client = client_for(&unreachable_base_url(), 0);

    let err = client.get::<Value>("/test").unwrap_err();
    assert_eq!(err.attempts(), Some(0));
}

#[test]
fn test_blocking_close() {
    let client = client_for(&unreachable_base_url(), 3);
    let clone = client.clone();

    client.close();
    client.close();

    assert!(matches!(clone.get::<Value>("/test"), Err(Error::Closed)));
    assert!(matches!(clone.options("/test"), Err(Error::Closed)));
}
