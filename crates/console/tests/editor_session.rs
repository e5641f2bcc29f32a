mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde_json::{Value, json};

use trainerdeck_api::{SaveRequest, SettingValue};
use trainerdeck_console::{DocumentSource, EditorSession, PathPicker, SaveOutcome};
use trainerdeck_core::form::FieldPath;
use trainerdeck_core::settings::{MODEL_VERSION_KEY, OUTPUT_DIR_KEY, PROFILE_KEY};
use trainerdeck_core::{Profile, Shape, testing};

/// Backend holding one task named `run1` whose document is `document`.
fn backend(document: Value, profile: &str) -> (Router, Arc<Mutex<Vec<SaveRequest>>>, Arc<AtomicUsize>) {
    let saved = Arc::new(Mutex::new(Vec::new()));
    let config_fetches = Arc::new(AtomicUsize::new(0));
    let settings = testing::flat_settings(profile);

    let saved_in_handler = Arc::clone(&saved);
    let fetches_in_handler = Arc::clone(&config_fetches);
    let router = Router::new()
        .route(
            "/load_task",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let settings = settings.clone();
                async move {
                    match params.get("task").map(String::as_str) {
                        Some("run1") | Some("__NEW__") => (
                            StatusCode::OK,
                            Json(json!({ "status": "success", "config": settings })),
                        ),
                        _ => (
                            StatusCode::NOT_FOUND,
                            Json(json!({ "status": "error", "message": "Not found" })),
                        ),
                    }
                }
            }),
        )
        .route(
            "/get_json_config",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let document = document.clone();
                let fetches = Arc::clone(&fetches_in_handler);
                async move {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    if params.get("task").map(String::as_str) == Some("run1") {
                        (
                            StatusCode::OK,
                            Json(json!({ "status": "success", "data": document })),
                        )
                    } else {
                        (
                            StatusCode::NOT_FOUND,
                            Json(json!({ "status": "error", "message": "Not found" })),
                        )
                    }
                }
            }),
        )
        .route(
            "/save",
            post(move |Json(req): Json<SaveRequest>| {
                let saved = Arc::clone(&saved_in_handler);
                async move {
                    let name = match req.yaml_updates.get("qwen.output_name") {
                        Some(SettingValue::Text(name)) => name.clone(),
                        _ => String::new(),
                    };
                    saved.lock().expect("saved lock").push(req);
                    if name == "taken" {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "status": "error", "message": "Exists" })),
                        );
                    }
                    (
                        StatusCode::OK,
                        Json(json!({ "status": "success", "message": "SAVED", "new_task_id": name })),
                    )
                }
            }),
        )
        .route(
            "/select_path",
            post(|Json(body): Json<Value>| async move {
                let path = match body["type"].as_str() {
                    Some("folder") => "/srv/picked".to_string(),
                    _ => format!("/img/ref{}", body["extensions"][0].as_str().unwrap_or("")),
                };
                Json(json!({ "path": path }))
            }),
        );
    (router, saved, config_fetches)
}

fn field(raw: &str) -> FieldPath {
    FieldPath::parse(raw).expect("known field")
}

#[tokio::test]
async fn opens_persisted_document_for_named_profile() {
    let (router, _, fetches) = backend(testing::edit_json(), "Qwen-Image-Edit-2509");
    let api = common::serve(router).await;

    let session = EditorSession::open(api, "run1", Profile::default())
        .await
        .expect("open editor");

    assert_eq!(session.source(), DocumentSource::Persisted);
    assert_eq!(session.form().shape(), Shape::Edit);
    assert_eq!(
        session.form().text(field("datasets.control_directory")),
        Some("/data/ctrl")
    );
    assert_eq!(session.settings().text("qwen.dit"), Some(""));
    assert!(session.settings().get(PROFILE_KEY).is_none());
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn new_task_starts_from_template_without_fetching_document() {
    let (router, _, fetches) = backend(testing::standard_json(), "Z-Image-Turbo");
    let api = common::serve(router).await;

    let session = EditorSession::open(api, "__NEW__", Profile::default())
        .await
        .expect("open editor");

    assert_eq!(session.source(), DocumentSource::Template);
    assert_eq!(session.form().text(field("general.num_repeats")), Some("10"));
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_task_fails_to_open() {
    let (router, _, _) = backend(testing::standard_json(), "Qwen-Image");
    let api = common::serve(router).await;

    let err = EditorSession::open(api, "missing", Profile::default())
        .await
        .err()
        .expect("load_task 404");
    assert!(format!("{err:#}").contains("LOAD ERROR: Not found"));
}

#[tokio::test]
async fn non_object_document_falls_back_to_template() {
    let (router, _, _) = backend(json!(["not", "a", "document"]), "Qwen-Image");
    let api = common::serve(router).await;

    let session = EditorSession::open(api, "run1", Profile::default())
        .await
        .expect("open editor");
    assert_eq!(session.source(), DocumentSource::Template);
}

#[tokio::test]
async fn save_posts_settings_and_unchanged_document() {
    let (router, saved, _) = backend(testing::standard_json(), "Qwen-Image");
    let api = common::serve(router).await;
    let mut session = EditorSession::open(api, "run1", Profile::default())
        .await
        .expect("open editor");
    session
        .settings_mut()
        .set("qwen.output_name", "run1")
        .expect("known setting");

    let outcome = session.save().await.expect("save");
    assert_eq!(outcome, SaveOutcome::Saved);

    let saved = saved.lock().expect("saved lock");
    let req = saved.last().expect("one save");
    assert_eq!(req.task_name, "run1");
    assert_eq!(req.json_data, testing::standard_json());
    assert_eq!(
        req.yaml_updates.get(PROFILE_KEY),
        Some(&SettingValue::Text("Qwen-Image".into()))
    );
    assert_eq!(
        req.yaml_updates.get(MODEL_VERSION_KEY),
        Some(&SettingValue::Text("original".into()))
    );
    assert_eq!(
        req.yaml_updates.get("qwen.network_dim"),
        Some(&SettingValue::Number(16_i64.into()))
    );
    assert_eq!(
        req.yaml_updates.get("qwen.fp8_base"),
        Some(&SettingValue::Bool(true))
    );
}

#[tokio::test]
async fn save_under_new_name_retargets_session() {
    let (router, _, _) = backend(testing::standard_json(), "Qwen-Image");
    let api = common::serve(router).await;
    let mut session = EditorSession::open(api, "run1", Profile::default())
        .await
        .expect("open editor");
    session
        .settings_mut()
        .set("qwen.output_name", "run2")
        .expect("known setting");

    let outcome = session.save().await.expect("save");
    assert_eq!(
        outcome,
        SaveOutcome::Retargeted {
            from: "run1".into(),
            to: "run2".into()
        }
    );
    assert_eq!(session.task_id(), "run2");
}

#[tokio::test]
async fn failed_save_leaves_session_untouched() {
    let (router, _, _) = backend(testing::standard_json(), "Qwen-Image");
    let api = common::serve(router).await;
    let mut session = EditorSession::open(api, "run1", Profile::default())
        .await
        .expect("open editor");
    session
        .settings_mut()
        .set("qwen.output_name", "taken")
        .expect("known setting");
    session
        .form_mut()
        .set_text(field("general.batch_size"), "6")
        .expect("text field");
    let before = session.form().clone();

    let err = session.save().await.expect_err("backend rejects");
    assert!(format!("{err:#}").contains("Error: Exists"));
    assert_eq!(session.task_id(), "run1");
    assert_eq!(session.form(), &before);
}

#[tokio::test]
async fn picked_paths_land_in_their_fields() {
    let (router, _, _) = backend(testing::edit_json(), "Qwen-Image-Edit");
    let api = common::serve(router).await;
    let picker = PathPicker::new(api.clone());
    let mut session = EditorSession::open(api, "run1", Profile::default())
        .await
        .expect("open editor");

    let output_dir = session
        .pick_setting(&picker, OUTPUT_DIR_KEY)
        .await
        .expect("pick output dir");
    assert_eq!(output_dir.as_deref(), Some("/srv/picked/run1"));

    session
        .pick_field(&picker, field("datasets.image_directory"))
        .await
        .expect("pick dataset dir");
    assert_eq!(
        session.form().text(field("datasets.image_directory")),
        Some("/srv/picked")
    );

    session
        .pick_control_image(&picker, 0, 2)
        .await
        .expect("pick control image");
    assert_eq!(session.form().samples()[0].control_images()[2], "/img/ref.png");

    assert!(session.pick_control_image(&picker, 0, 3).await.is_err());
    assert!(session.pick_setting(&picker, "qwen.learning_rate").await.is_err());
}

#[tokio::test]
async fn switching_profile_resets_to_template() {
    let (router, _, _) = backend(testing::standard_json(), "Qwen-Image");
    let api = common::serve(router).await;
    let mut session = EditorSession::open(api, "run1", Profile::default())
        .await
        .expect("open editor");

    session
        .switch_profile(Profile::new("Qwen-Image-Edit"))
        .expect("switch profile");
    assert_eq!(session.source(), DocumentSource::Template);

    let payload = session.payload().expect("payload");
    assert_eq!(payload.json_data["general"]["batch_size"], json!(4));
    assert_eq!(payload.json_data["general"]["num_repeats"], json!(5));
    assert_eq!(
        payload.yaml_updates.get(MODEL_VERSION_KEY),
        Some(&SettingValue::Text("edit".into()))
    );
}
