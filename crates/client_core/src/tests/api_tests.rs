use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{
    domain::{ProfileDraft, RequestId},
    error::Endpoint,
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    api::{AlumniApi, HttpAlumniApi},
    config::ClientSettings,
    error::ApiCallError,
    session::Credential,
    ActionOutcome, AlumniClient, CardView, ClientEvent, ProfileView,
};

const TOKEN: &str = "token-1";

#[derive(Clone, Default)]
struct ServerState {
    updates: Arc<Mutex<Vec<Value>>>,
    approve_hits: Arc<AtomicUsize>,
    reject_hits: Arc<AtomicUsize>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {TOKEN}").as_str())
}

fn profile_json(name: &str, address: &str, phone: &str) -> Value {
    json!({
        "name": name,
        "email": "ana@alumni.example",
        "address": address,
        "phone": phone,
        "graduation": 2019,
        "role": "alumni",
        "followers": 12,
        "following": 8,
        "birthDate": "1997-02-01",
        "photo": null
    })
}

async fn get_profile(headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthenticated"})));
    }
    (
        StatusCode::OK,
        Json(json!({ "data": profile_json("Ana", "Jakarta", "08123") })),
    )
}

async fn put_profile(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthenticated"})));
    }
    state.updates.lock().await.push(body.clone());
    let name = body["name"].as_str().unwrap_or_default();
    let address = body["address"].as_str().unwrap_or_default();
    let phone = body["phone"].as_str().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({ "data": profile_json(name, address, phone) })),
    )
}

async fn approve(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthenticated"})));
    }
    state.approve_hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        Json(json!({"status": "success", "message": format!("Approved {request_id}")})),
    )
}

async fn reject(State(state): State<ServerState>, headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthenticated"})));
    }
    state.reject_hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        Json(json!({"status": "failed", "message": "Already rejected"})),
    )
}

async fn spawn_api_server() -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/alumni/profile", get(get_profile).put(put_profile))
        .route("/api/mentee/requests/:request_id/approve", post(approve))
        .route("/api/mentee/request/:request_id/reject", post(reject))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

async fn spawn_garbage_server() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/api/alumni/profile", get(|| async { "<html>maintenance</html>" }))
        .route(
            "/api/mentee/requests/:request_id/approve",
            post(|| async { Json(json!({"message": "no status field"})) }),
        );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn fetch_profile_sends_bearer_and_unwraps_data() {
    let (base_url, _state) = spawn_api_server().await;
    let api = HttpAlumniApi::new(format!("{base_url}/"));

    let profile = api
        .fetch_profile(&Credential::new(TOKEN))
        .await
        .expect("profile");

    assert_eq!(profile.name, "Ana");
    assert_eq!(profile.birth_date.as_deref(), Some("1997-02-01"));
    assert!(profile.photo.is_none());
}

#[tokio::test]
async fn wrong_credential_maps_to_http_status() {
    let (base_url, _state) = spawn_api_server().await;
    let api = HttpAlumniApi::new(base_url);

    let err = api
        .fetch_profile(&Credential::new("stale"))
        .await
        .expect_err("unauthorized");

    assert!(matches!(
        err,
        ApiCallError::HttpStatus {
            endpoint: Endpoint::FetchProfile,
            status: 401
        }
    ));
}

#[tokio::test]
async fn update_profile_puts_only_editable_fields() {
    let (base_url, state) = spawn_api_server().await;
    let api = HttpAlumniApi::new(base_url);
    let draft = ProfileDraft {
        name: "Ana Putri".into(),
        address: "Bandung".into(),
        phone: "08999".into(),
    };

    let profile = api
        .update_profile(&Credential::new(TOKEN), &draft)
        .await
        .expect("update");

    assert_eq!(profile.address, "Bandung");
    assert_eq!(
        *state.updates.lock().await,
        vec![json!({"name": "Ana Putri", "address": "Bandung", "phone": "08999"})]
    );
}

#[tokio::test]
async fn approve_and_reject_use_their_distinct_paths() {
    let (base_url, state) = spawn_api_server().await;
    let api = HttpAlumniApi::new(base_url);
    let credential = Credential::new(TOKEN);
    let id = RequestId::new("abc-1");

    let approved = api.approve_request(&credential, &id).await.expect("approve");
    assert!(approved.is_success());
    assert_eq!(approved.message, "Approved abc-1");

    let rejected = api.reject_request(&credential, &id).await.expect("reject");
    assert!(!rejected.is_success());
    assert_eq!(rejected.message, "Already rejected");

    assert_eq!(state.approve_hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.reject_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_bodies_fail_with_parse_errors() {
    let base_url = spawn_garbage_server().await;
    let api = HttpAlumniApi::new(base_url);
    let credential = Credential::new(TOKEN);

    let err = api.fetch_profile(&credential).await.expect_err("html body");
    assert!(matches!(err, ApiCallError::Parse(ref parse) if parse.endpoint == Endpoint::FetchProfile));

    let err = api
        .approve_request(&credential, &RequestId::new("x"))
        .await
        .expect_err("missing status");
    assert!(matches!(err, ApiCallError::Parse(ref parse) if parse.endpoint == Endpoint::ApproveRequest));

    let err = api
        .reject_request(&credential, &RequestId::new("x"))
        .await
        .expect_err("no route");
    assert!(matches!(err, ApiCallError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let api = HttpAlumniApi::new(format!("http://{addr}"));

    let err = api
        .update_profile(&Credential::new(TOKEN), &ProfileDraft::default())
        .await
        .expect_err("closed port");
    assert!(matches!(err, ApiCallError::Transport(_)));
}

#[tokio::test]
async fn edit_submit_against_unreachable_server_keeps_editor_open() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let dead_addr = listener.local_addr().expect("addr");
    drop(listener);
    let dead = AlumniClient::with_api(
        ClientSettings::default(),
        Arc::new(HttpAlumniApi::new(format!("http://{dead_addr}"))),
    );
    dead.session().login(TOKEN);
    let mut events = dead.subscribe_events();
    let dead_screen = dead.profile_screen();
    dead_screen.open_editor().await;

    let outcome = dead_screen.submit_edit().await;

    assert_eq!(outcome, ActionOutcome::Failed("Failed to update profile".into()));
    assert!(dead_screen.is_editor_open().await);
    match events.try_recv().expect("notice") {
        ClientEvent::Notice(notice) => assert_eq!(notice.message, "Failed to update profile"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn client_drives_profile_and_card_end_to_end() {
    let (base_url, state) = spawn_api_server().await;
    let settings = ClientSettings {
        api_base_url: base_url,
        ..ClientSettings::default()
    };
    let client = AlumniClient::new(settings).expect("client");
    client.session().login(TOKEN);

    let screen = client.profile_screen();
    screen.load_profile().await;
    assert!(matches!(screen.view().await, ProfileView::Ready(ref p) if p.name == "Ana"));

    let refreshed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&refreshed);
    let request = serde_json::from_value(json!({
        "requestId": "req-7",
        "menteeName": "Budi",
        "mentorName": "Ana",
        "status": "pending",
        "question": "Backend careers",
        "graduation": "2023",
        "createdAt": "2024-05-01",
        "updatedAt": "2024-05-01"
    }))
    .expect("request snapshot");
    let card = client.request_card(request, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(card.approve().await.is_success());
    assert_eq!(refreshed.load(Ordering::SeqCst), 1);
    assert_eq!(card.view().await, CardView::AwaitingRefresh);
    assert_eq!(state.approve_hits.load(Ordering::SeqCst), 1);
}
