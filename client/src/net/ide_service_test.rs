use super::*;
use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{post, put};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Recorded {
    saves: Arc<Mutex<Vec<(String, String, String)>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer secret")
}

async fn save(
    State(rec): State<Recorded>,
    Path((project, file)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    let content = body["content"].as_str().unwrap_or_default().to_owned();
    rec.saves.lock().expect("lock").push((project, file, content));
    StatusCode::NO_CONTENT
}

async fn run(Path(project): Path<String>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "nope"})));
    }
    if project == "broken" {
        return (StatusCode::OK, Json(json!({"stdout": 1})));
    }
    (StatusCode::OK, Json(json!({"stdout": format!("ran {project}\n"), "stderr": "", "exit_code": 0})))
}

async fn debug(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    let first = body["breakpoints"][0].clone();
    (
        StatusCode::OK,
        Json(json!({
            "session_id": "dbg-1",
            "paused_at": first,
            "frames": [{"name": "main", "file_id": first["file_id"], "line": first["line"]}],
            "variables": [{"name": "x", "value": "1", "type": "i32"}]
        })),
    )
}

async fn spawn_backend() -> (String, Recorded) {
    let rec = Recorded::default();
    let app = Router::new()
        .route("/api/projects/{id}/files/{file_id}", put(save))
        .route("/api/projects/{id}/run", post(run))
        .route("/api/projects/{id}/debug", post(debug))
        .with_state(rec.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("backend failed");
    });
    (format!("http://{addr}/"), rec)
}

#[tokio::test]
async fn save_file_puts_content_with_bearer_token() {
    let (base, rec) = spawn_backend().await;
    let service = HttpIdeService::new(&base, "secret").expect("client");

    service.save_file("p1", "src/main.rs", "fn main() {}").await.expect("save");

    let saves = rec.saves.lock().expect("lock").clone();
    assert_eq!(saves, vec![("p1".to_owned(), "src/main.rs".to_owned(), "fn main() {}".to_owned())]);
}

#[tokio::test]
async fn run_project_decodes_output() {
    let (base, _rec) = spawn_backend().await;
    let service = HttpIdeService::new(&base, "secret").expect("client");

    let output = service.run_project("p1").await.expect("run");
    assert_eq!(output, RunOutput { stdout: "ran p1\n".into(), stderr: String::new(), exit_code: 0 });
}

#[tokio::test]
async fn start_debug_session_sends_breakpoints() {
    let (base, _rec) = spawn_backend().await;
    let service = HttpIdeService::new(&base, "secret").expect("client");
    let breakpoints = vec![Breakpoint { file_id: "main.rs".into(), line: 7 }];

    let session = service.start_debug_session("p1", &breakpoints).await.expect("debug");
    assert_eq!(session.session_id, "dbg-1");
    assert_eq!(session.paused_at, Some(breakpoints[0].clone()));
    assert_eq!(session.frames[0].line, 7);
    assert_eq!(session.variables[0].type_name, "i32");
}

#[tokio::test]
async fn wrong_token_is_a_status_error() {
    let (base, _rec) = spawn_backend().await;
    let service = HttpIdeService::new(&base, "wrong").expect("client");

    let err = service.run_project("p1").await.unwrap_err();
    assert!(matches!(err, IdeServiceError::Status { status: 401, .. }), "got {err:?}");
}

#[tokio::test]
async fn bad_body_is_a_decode_error() {
    let (base, _rec) = spawn_backend().await;
    let service = HttpIdeService::new(&base, "secret").expect("client");

    let err = service.run_project("broken").await.unwrap_err();
    assert!(matches!(err, IdeServiceError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_backend_is_a_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let service = HttpIdeService::new(&format!("http://{addr}"), "secret").expect("client");

    let err = service.save_file("p1", "a", "b").await.unwrap_err();
    assert!(matches!(err, IdeServiceError::Request(_)), "got {err:?}");
}
