//! Integration tests for `POST /{version}/images/create`.
//!
//! Every pull response is a stream of concatenated JSON envelopes: an
//! acknowledgement, the engine's progress in order, then exactly one terminal
//! envelope.

mod common;

use std::io::Write;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use blobgate_core::command::CommandEngine;
use blobgate_core::engine::ProgressSender;
use blobgate_core::error::EngineError;
use blobgate_core::pull::PullParams;
use common::{body_bytes, body_envelopes, post};

const PULL_URI: &str = "/v1.41/images/create?fromImage=myimage:latest";

fn statuses(envelopes: &[serde_json::Value]) -> Vec<String> {
    envelopes
        .iter()
        .map(|e| e["status"].as_str().expect("status envelope").to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Test: successful pull streams ack, progress in order, then Done
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_pull_streams_five_status_envelopes() {
    let engine = |_: &PullParams, progress: &ProgressSender| {
        progress.send("layer 1/3");
        progress.send("layer 2/3");
        progress.send("layer 3/3");
        Ok::<(), EngineError>(())
    };
    let app = common::build_test_app(engine);

    let response = post(app, PULL_URI, &[]).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    let envelopes = body_envelopes(response).await;
    assert_eq!(
        statuses(&envelopes),
        vec![
            "Pulling myimage:latest from s3://images/...",
            "layer 1/3",
            "layer 2/3",
            "layer 3/3",
            "Done",
        ]
    );
}

#[tokio::test]
async fn final_envelope_is_exactly_done() {
    let app = common::build_test_app(|_: &PullParams, _: &ProgressSender| {
        Ok::<(), EngineError>(())
    });

    let bytes = body_bytes(post(app, PULL_URI, &[]).await).await;
    assert!(bytes.ends_with(br#"{"status":"Done"}"#));
}

// ---------------------------------------------------------------------------
// Test: engine failure ends the stream with one error envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn engine_failure_without_progress_yields_two_writes() {
    let app = common::build_test_app(|_: &PullParams, _: &ProgressSender| {
        Err::<(), EngineError>(EngineError::Failed("connection reset".to_string()))
    });

    let envelopes = body_envelopes(post(app, PULL_URI, &[]).await).await;

    assert_eq!(envelopes.len(), 2);
    assert!(envelopes[0]["status"].is_string());
    let message = envelopes[1]["error"].as_str().expect("error envelope");
    assert!(message.contains("connection reset"));
    assert!(message.starts_with("Blobgate server error: "));
    assert_eq!(envelopes[1]["errorDetail"]["message"], message);
}

#[tokio::test]
async fn engine_failure_after_progress_keeps_progress_order() {
    let app = common::build_test_app(|_: &PullParams, progress: &ProgressSender| {
        progress.send("layer 1/2");
        progress.send("layer 2/2");
        Err::<(), EngineError>(EngineError::Failed("access denied".to_string()))
    });

    let envelopes = body_envelopes(post(app, PULL_URI, &[]).await).await;

    assert_eq!(envelopes.len(), 4);
    assert_eq!(envelopes[1]["status"], "layer 1/2");
    assert_eq!(envelopes[2]["status"], "layer 2/2");
    assert_eq!(envelopes[3]["error"], "Blobgate server error: access denied");
    assert!(envelopes[3].get("status").is_none());
}

// ---------------------------------------------------------------------------
// Test: parameter errors produce exactly one error envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_from_image_is_single_error() {
    let app = common::build_test_app(|_: &PullParams, _: &ProgressSender| {
        Ok::<(), EngineError>(())
    });

    let envelopes = body_envelopes(post(app, "/v1.41/images/create", &[]).await).await;

    assert_eq!(envelopes.len(), 1);
    assert!(envelopes[0]["error"]
        .as_str()
        .unwrap()
        .contains("fromImage"));
}

#[tokio::test]
async fn malformed_registry_auth_is_single_error() {
    let app = common::build_test_app(|_: &PullParams, _: &ProgressSender| {
        Ok::<(), EngineError>(())
    });

    let response = post(app, PULL_URI, &[("X-Registry-Auth", "%%%garbage%%%")]).await;
    let envelopes = body_envelopes(response).await;

    assert_eq!(envelopes.len(), 1);
    assert!(envelopes[0]["error"]
        .as_str()
        .unwrap()
        .contains("X-Registry-Auth"));
}

// ---------------------------------------------------------------------------
// Test: request parameters reach the engine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tag_and_credentials_reach_engine() {
    let seen: Arc<Mutex<Option<PullParams>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let app = common::build_test_app(move |params: &PullParams, _: &ProgressSender| {
        *sink.lock().unwrap() = Some(params.clone());
        Ok::<(), EngineError>(())
    });
    let auth = URL_SAFE.encode(r#"{"username":"AKIA","password":"secret"}"#);

    let response = post(
        app,
        "/v1.41/images/create?fromImage=team/app&tag=v2",
        &[("X-Registry-Auth", auth.as_str())],
    )
    .await;
    let envelopes = body_envelopes(response).await;
    assert_eq!(envelopes.last().unwrap()["status"], "Done");

    let params = seen.lock().unwrap().clone().expect("engine was called");
    assert_eq!(params.image, "team/app:v2");
    assert_eq!(params.store_url, "s3://images/");
    assert_eq!(params.auth.username.as_deref(), Some("AKIA"));
    assert_eq!(params.auth.password.as_deref(), Some("secret"));
}

// ---------------------------------------------------------------------------
// Test: concurrent pulls are isolated
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_pulls_do_not_interfere() {
    let app = common::build_test_app(|params: &PullParams, progress: &ProgressSender| {
        progress.send(format!("fetching {}", params.image));
        if params.image.starts_with("broken") {
            Err(EngineError::Failed("not found".to_string()))
        } else {
            Ok(())
        }
    });

    let ok = tokio::spawn(post(app.clone(), "/v1/images/create?fromImage=good", &[]));
    let bad = tokio::spawn(post(app, "/v1/images/create?fromImage=broken", &[]));

    let ok = body_envelopes(ok.await.unwrap()).await;
    let bad = body_envelopes(bad.await.unwrap()).await;

    assert_eq!(ok[1]["status"], "fetching good");
    assert_eq!(ok.last().unwrap()["status"], "Done");
    assert_eq!(bad[1]["status"], "fetching broken");
    assert_eq!(bad.last().unwrap()["error"], "Blobgate server error: not found");
}

// ---------------------------------------------------------------------------
// Test: end to end through the command-backed engine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn command_engine_stdout_is_streamed() {
    let mut script = tempfile::Builder::new()
        .suffix(".sh")
        .tempfile()
        .expect("create script");
    writeln!(script, "#!/bin/bash").unwrap();
    writeln!(script, "echo \"downloading $3\"").unwrap();
    writeln!(script, "echo 'extracting'").unwrap();
    let script_path = script.path().to_str().unwrap().to_string();

    let (_guard, temp_dir) = common::scratch_dir();
    let mut config = common::test_config();
    config.temp_dir = temp_dir;
    let engine = CommandEngine::new("bash").with_args([script_path]);
    let app = common::build_test_app_with(config, engine);

    let envelopes = body_envelopes(post(app, PULL_URI, &[]).await).await;

    assert_eq!(
        statuses(&envelopes),
        vec![
            "Pulling myimage:latest from s3://images/...",
            "downloading myimage:latest",
            "extracting",
            "Done",
        ]
    );
}

#[tokio::test]
async fn command_engine_failure_reports_stderr() {
    let mut script = tempfile::Builder::new()
        .suffix(".sh")
        .tempfile()
        .expect("create script");
    writeln!(script, "#!/bin/bash").unwrap();
    writeln!(script, "echo 'connection reset' >&2").unwrap();
    writeln!(script, "exit 1").unwrap();
    let script_path = script.path().to_str().unwrap().to_string();

    let (_guard, temp_dir) = common::scratch_dir();
    let mut config = common::test_config();
    config.temp_dir = temp_dir;
    let engine = CommandEngine::new("bash").with_args([script_path]);
    let app = common::build_test_app_with(config, engine);

    let envelopes = body_envelopes(post(app, PULL_URI, &[]).await).await;

    assert_eq!(envelopes.len(), 2);
    assert_eq!(
        envelopes[1]["error"],
        "Blobgate server error: engine exited with code 1: connection reset"
    );
}
