use std::collections::HashMap;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde_json::{Value, json};

use trainerdeck_api::{
    ConsoleInputRequest, ExecuteAction, PathKind, SaveRequest, SelectPathRequest, SettingValue,
};
use trainerdeck_api_client::{ApiClient, ApiError};

async fn serve(router: Router) -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test backend");
    });
    ApiClient::new(&format!("http://{addr}/"), Duration::from_secs(5)).expect("build client")
}

#[tokio::test]
async fn task_status_reads_running_flag() {
    let router = Router::new().route(
        "/task_status",
        get(|| async { Json(json!({ "is_running": true, "task": "run1", "action": "train" })) }),
    );
    let client = serve(router).await;

    let status = client.task_status().await.expect("task status");
    assert!(status.is_running);
    assert_eq!(status.action.as_deref(), Some("train"));
}

#[tokio::test]
async fn execute_task_sends_task_and_action_query() {
    let router = Router::new().route(
        "/execute_task",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            let task = params.get("task").cloned().unwrap_or_default();
            let action = params.get("action").cloned().unwrap_or_default();
            Json(json!({ "status": "success", "message": format!("{task}:{action}") }))
        }),
    );
    let client = serve(router).await;

    let resp = client
        .execute_task("my run", ExecuteAction::Cache)
        .await
        .expect("execute");
    assert!(resp.is_success());
    assert_eq!(resp.message.as_deref(), Some("my run:cache"));
}

#[tokio::test]
async fn error_envelope_is_honoured_on_non_2xx() {
    let router = Router::new().route(
        "/execute_task",
        get(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": "Busy" })),
            )
        }),
    );
    let client = serve(router).await;

    let resp = client
        .execute_task("run1", ExecuteAction::Train)
        .await
        .expect("envelope parsed despite 400");
    assert!(!resp.is_success());
    assert_eq!(resp.failure_message(), "Busy");
}

#[tokio::test]
async fn non_json_error_body_is_http_error() {
    let router = Router::new().route(
        "/stop_task",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let client = serve(router).await;

    let err = client.stop_task().await.expect_err("plain text 500");
    match err {
        ApiError::Http { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client =
        ApiClient::new(&format!("http://{addr}"), Duration::from_secs(2)).expect("build client");
    let err = client.task_status().await.expect_err("nothing listening");
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn log_stream_yields_body_bytes() {
    let router = Router::new().route("/stream_logs", get(|| async { "epoch 1\nepoch 2\n" }));
    let client = serve(router).await;

    let mut stream = client.stream_logs().await.expect("open stream");
    let mut received = Vec::new();
    while let Some(chunk) = stream.next_chunk().await.expect("read chunk") {
        received.extend_from_slice(&chunk);
    }
    assert_eq!(received, b"epoch 1\nepoch 2\n");
}

#[tokio::test]
async fn log_stream_rejects_error_status() {
    let router = Router::new().route(
        "/stream_logs",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "starting") }),
    );
    let client = serve(router).await;

    let err = client.stream_logs().await.err().expect("503 on open");
    assert!(matches!(err, ApiError::Http { .. }));
}

#[tokio::test]
async fn save_posts_settings_and_document() {
    let router = Router::new().route(
        "/save",
        post(|Json(req): Json<SaveRequest>| async move {
            let name = match req.yaml_updates.get("qwen.output_name") {
                Some(SettingValue::Text(name)) => name.clone(),
                _ => String::new(),
            };
            let batch = req.json_data["general"]["batch_size"].clone();
            Json(json!({
                "status": "success",
                "message": format!("batch={batch}"),
                "new_task_id": name
            }))
        }),
    );
    let client = serve(router).await;

    let req = SaveRequest {
        task_name: "run1".into(),
        yaml_updates: [(
            "qwen.output_name".to_string(),
            SettingValue::Text("run2".into()),
        )]
        .into_iter()
        .collect(),
        json_data: json!({ "general": { "batch_size": 4 } }),
    };
    let resp = client.save(&req).await.expect("save");
    assert!(resp.envelope.is_success());
    assert_eq!(resp.envelope.message.as_deref(), Some("batch=4"));
    assert_eq!(resp.new_task_id.as_deref(), Some("run2"));
}

#[tokio::test]
async fn select_path_and_console_input_post_json() {
    let router = Router::new()
        .route(
            "/select_path",
            post(|Json(body): Json<Value>| async move {
                let path = format!("/picked/{}", body["type"].as_str().unwrap_or("none"));
                Json(json!({ "path": path }))
            }),
        )
        .route(
            "/console_input",
            post(|Json(body): Json<ConsoleInputRequest>| async move {
                let status = if body.cmd.is_empty() { "error" } else { "success" };
                Json(json!({ "status": status }))
            }),
        );
    let client = serve(router).await;

    let picked = client
        .select_path(&SelectPathRequest {
            kind: PathKind::Folder,
            extensions: Vec::new(),
        })
        .await
        .expect("select path");
    assert_eq!(picked.picked(), Some("/picked/folder"));

    let ack = client
        .console_input(&ConsoleInputRequest { cmd: "nvidia-smi".into() })
        .await
        .expect("console input");
    assert!(ack.is_success());
}
