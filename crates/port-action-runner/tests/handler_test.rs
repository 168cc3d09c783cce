// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Action-run reporter tests against a mocked Port API.

use port_action_runner::{NOT_DIRECTED_MESSAGE, handle_batch};
use port_client::{
    EncodedRecord, HandlerResponse, MismatchPolicy, Partitions, PortClient, PortConfig,
    RecordBatch,
};
use serde_json::{Value, json};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Collects JSON log lines written by the handler.
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::WARN)
            .with_writer(self.clone())
            .finish()
    }

    fn events(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn client_for(server: &MockServer) -> PortClient {
    PortClient::new(PortConfig::new("id", "secret").with_api_url(server.uri())).unwrap()
}

fn create_message(run_id: &str, title: &str) -> Value {
    json!({
        "context": {"runId": run_id},
        "payload": {
            "action": {"trigger": "CREATE"},
            "properties": {"title": title, "cpu": 2, "memory": 4, "storage": 50, "region": "eu"}
        }
    })
}

fn day2_message(run_id: &str) -> Value {
    json!({
        "context": {"runId": run_id},
        "payload": {"action": {"trigger": "DAY-2", "identifier": "restart"}, "properties": {}}
    })
}

fn batch(records: Vec<EncodedRecord>) -> RecordBatch {
    RecordBatch::new(Partitions(vec![("p0".to_string(), records)]))
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "tok"})))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_run_patch(server: &MockServer, run_id: &str, status: &str, expected_calls: u64) {
    Mock::given(method("PATCH"))
        .and(path(format!("/actions/runs/{}", run_id)))
        .and(body_json(json!({
            "status": status,
            "message": {"message": format!("The action status is {}", status)}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_batch_end_to_end() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;

    Mock::given(method("POST"))
        .and(path("/entities"))
        .and(query_param("run_id", "r1"))
        .and(body_json(json!({
            "identifier": "vm-a",
            "title": "VM A",
            "blueprint": "vm",
            "properties": {
                "cpu_cores": 2,
                "memory_size": 4,
                "storage_size": 50,
                "region": "eu",
                "deployed": "Deploying"
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    mount_run_patch(&server, "r1", "SUCCESS", 1).await;

    // Raw event exactly as the Kafka trigger delivers it.
    let encoded = EncodedRecord::from_json(&create_message("r1", "VM A"));
    let event: RecordBatch = serde_json::from_value(json!({
        "records": {"p0": [{"value": encoded.value}]}
    }))
    .unwrap();

    let response = handle_batch(&client_for(&server), MismatchPolicy::Skip, &event).await;
    assert_eq!(response, HandlerResponse::ok());
}

#[tokio::test]
async fn test_failed_creation_reports_failure() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;

    Mock::given(method("POST"))
        .and(path("/entities"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "exists"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_run_patch(&server, "r2", "FAILURE", 1).await;

    let records = vec![EncodedRecord::from_json(&create_message("r2", "VM B"))];
    let response = handle_batch(&client_for(&server), MismatchPolicy::Skip, &batch(records)).await;
    assert_eq!(response.message, "ok");
}

#[tokio::test]
async fn test_foreign_trigger_makes_no_calls_and_is_skipped() {
    let server = MockServer::start().await;
    // Only the CREATE message may talk to Port.
    mount_token(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/entities"))
        .and(query_param("run_id", "r-create"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    mount_run_patch(&server, "r-create", "SUCCESS", 1).await;
    mount_run_patch(&server, "r-day2", "SUCCESS", 0).await;

    let records = vec![
        EncodedRecord::from_json(&day2_message("r-day2")),
        EncodedRecord::from_json(&create_message("r-create", "VM C")),
    ];
    let response = handle_batch(&client_for(&server), MismatchPolicy::Skip, &batch(records)).await;
    assert_eq!(response, HandlerResponse::ok());
}

#[tokio::test]
async fn test_abort_policy_stops_the_whole_batch() {
    let server = MockServer::start().await;
    mount_token(&server, 0).await;

    let event = RecordBatch::new(Partitions(vec![
        (
            "p0".to_string(),
            vec![
                EncodedRecord::from_json(&day2_message("r-day2")),
                EncodedRecord::from_json(&create_message("r-late", "VM D")),
            ],
        ),
        (
            "p1".to_string(),
            vec![EncodedRecord::from_json(&create_message("r-other", "VM E"))],
        ),
    ]));

    let response = handle_batch(&client_for(&server), MismatchPolicy::Abort, &event).await;
    assert_eq!(response.message, NOT_DIRECTED_MESSAGE);
}

#[tokio::test]
async fn test_bad_messages_do_not_stop_the_batch() {
    let server = MockServer::start().await;
    // Two well-formed messages, two tokens each.
    mount_token(&server, 4).await;
    Mock::given(method("POST"))
        .and(path("/entities"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;
    mount_run_patch(&server, "r-ok-1", "SUCCESS", 1).await;
    mount_run_patch(&server, "r-ok-2", "SUCCESS", 1).await;

    let not_base64 = EncodedRecord {
        value: Some("%%%not-base64%%%".into()),
        ..Default::default()
    };
    let missing_inputs = EncodedRecord::from_json(&json!({
        "context": {"runId": "r-bad"},
        "payload": {"action": {"trigger": "CREATE"}, "properties": {"title": "No Inputs"}}
    }));
    let no_value = EncodedRecord::default();

    let records = vec![
        not_base64,
        EncodedRecord::from_json(&create_message("r-ok-1", "VM 1")),
        missing_inputs,
        no_value,
        EncodedRecord::from_json(&create_message("r-ok-2", "VM 2")),
    ];
    let response = handle_batch(&client_for(&server), MismatchPolicy::Skip, &batch(records)).await;
    assert_eq!(response, HandlerResponse::ok());
}

#[tokio::test]
async fn test_token_failure_skips_message_without_reporting() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/access_token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/entities"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let records = vec![EncodedRecord::from_json(&create_message("r1", "VM A"))];
    let response = handle_batch(&client_for(&server), MismatchPolicy::Skip, &batch(records)).await;
    assert_eq!(response, HandlerResponse::ok());
}

#[tokio::test]
async fn test_each_failed_message_is_logged_with_its_category() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/entities"))
        .and(query_param("run_id", "r-ok"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    mount_run_patch(&server, "r-ok", "SUCCESS", 1).await;

    let good = EncodedRecord::from_json(&create_message("r-ok", "VM OK"));
    let missing_inputs = EncodedRecord::from_json(&json!({
        "context": {"runId": "r-bad"},
        "payload": {"action": {"trigger": "CREATE"}, "properties": {"title": "No Inputs"}}
    }));
    // A non-string value must not reject the event as a whole.
    let event: RecordBatch = serde_json::from_value(json!({
        "records": {"p0": [
            {"value": 5, "offset": 0},
            {"value": good.value, "offset": 1},
            {"value": "%%%not-base64%%%", "offset": 2},
            {"value": missing_inputs.value, "offset": 3}
        ]}
    }))
    .unwrap();

    let logs = LogCapture::default();
    let _guard = tracing::subscriber::set_default(logs.subscriber());
    let response = handle_batch(&client_for(&server), MismatchPolicy::Skip, &event).await;
    assert_eq!(response, HandlerResponse::ok());

    let failures: Vec<Value> = logs
        .events()
        .into_iter()
        .filter(|e| e["fields"]["message"] == "Failed to process message")
        .collect();
    let offsets: Vec<&str> = failures
        .iter()
        .map(|e| e["fields"]["offset"].as_str().unwrap())
        .collect();
    assert_eq!(offsets, vec!["Some(0)", "Some(2)", "Some(3)"]);
    for failure in &failures {
        assert_eq!(failure["level"], "WARN");
        assert_eq!(failure["fields"]["partition"], "p0");
        assert_eq!(failure["fields"]["category"], "input");
    }
}

#[tokio::test]
async fn test_downstream_failure_is_logged_as_downstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/access_token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized"})))
        .expect(1)
        .mount(&server)
        .await;

    let logs = LogCapture::default();
    let _guard = tracing::subscriber::set_default(logs.subscriber());
    let records = vec![EncodedRecord::from_json(&create_message("r1", "VM A"))];
    handle_batch(&client_for(&server), MismatchPolicy::Skip, &batch(records)).await;

    let failures: Vec<Value> = logs
        .events()
        .into_iter()
        .filter(|e| e["fields"]["message"] == "Failed to process message")
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["fields"]["category"], "downstream");
}
