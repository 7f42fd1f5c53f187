//! Upstream client tests against local stub servers
//!
//! Each test starts an axum router on an ephemeral port that speaks just
//! enough of the Servarr v3 or Tautulli v2 API for the client under test.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Json;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use reclaimarr::app_mode::{LibraryMode, SectionType};
use reclaimarr::config::ServiceEndpoint;
use reclaimarr::error::AnalyzerError;
use reclaimarr::models::{LibrarySection, PlaybackEvent};
use reclaimarr::services::{
    AnalyzerSettings, HistoryService, HttpSession, LibraryManager, ServarrClient, TautulliClient,
    UnwatchedAnalyzer,
};

const API_KEY: &str = "test-key";

type Params = HashMap<String, String>;

#[derive(Clone, Default)]
struct StubState {
    deletes: Arc<Mutex<Vec<(i64, String)>>>,
    history_queries: Arc<Mutex<Vec<Params>>>,
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn session() -> HttpSession {
    HttpSession::with_timeout(Duration::from_secs(5)).unwrap()
}

fn endpoint(url: &str, api_key: &str) -> ServiceEndpoint {
    ServiceEndpoint {
        url: url.to_string(),
        api_key: api_key.to_string(),
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

// ============================================================================
// Servarr stubs
// ============================================================================

async fn list_series(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!([
        {"id": 1, "title": "Lost", "path": "/tv/Lost", "monitored": true},
        {"id": 2, "title": "Firefly", "path": "/tv/Firefly"},
        {"id": 3, "title": "Dexter"}
    ])))
}

async fn series_detail(
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    match id {
        1 => Ok(Json(json!({"id": 1, "title": "Lost", "statistics": {"sizeOnDisk": 5000}}))),
        2 => Ok(Json(json!({"id": 2, "title": "Firefly", "statistics": {"sizeOnDisk": 9000}}))),
        _ => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn delete_entry(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<Params>,
) -> StatusCode {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    match id {
        404 => StatusCode::NOT_FOUND,
        202 => StatusCode::ACCEPTED,
        _ => {
            let delete_files = params.get("deleteFiles").cloned().unwrap_or_default();
            state.deletes.lock().unwrap().push((id, delete_files));
            StatusCode::OK
        }
    }
}

async fn movie_detail(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({
        "id": id,
        "title": "Heat",
        "sizeOnDisk": 7_340_032,
        "statistics": {"sizeOnDisk": 1}
    }))
}

fn sonarr_stub(state: StubState) -> Router {
    Router::new()
        .route("/api/v3/series", get(list_series))
        .route("/api/v3/series/{id}", get(series_detail).delete(delete_entry))
        .with_state(state)
}

fn radarr_stub(state: StubState) -> Router {
    Router::new()
        .route("/api/v3/movie/{id}", get(movie_detail).delete(delete_entry))
        .with_state(state)
}

// ============================================================================
// Tautulli stub
// ============================================================================

fn envelope(data: Value) -> Json<Value> {
    Json(json!({"response": {"result": "success", "message": null, "data": data}}))
}

async fn tautulli_api(State(state): State<StubState>, Query(params): Query<Params>) -> Json<Value> {
    if params.get("apikey").map(String::as_str) != Some(API_KEY) {
        return Json(json!({
            "response": {"result": "error", "message": "Invalid apikey", "data": {}}
        }));
    }

    match params.get("cmd").map(String::as_str) {
        Some("get_libraries") => envelope(json!([
            {"section_id": "1", "section_type": "show", "section_name": "TV Shows", "count": "3"},
            {"section_id": 2, "section_type": "movie", "section_name": "Films"},
            {"section_id": "3", "section_type": "artist", "section_name": "Music"}
        ])),
        Some("get_history") => {
            state.history_queries.lock().unwrap().push(params.clone());
            let rows = match params.get("section_id").map(String::as_str) {
                Some("1") => json!([
                    {"grandparent_title": "Lost", "title": "Pilot", "date": 1_714_000_000},
                    {"grandparent_title": "Lost", "title": "Tabula Rasa", "date": 1_713_000_000}
                ]),
                _ => json!([
                    {"grandparent_title": "", "title": "Heat", "date": 1_712_000_000}
                ]),
            };
            envelope(json!({"recordsFiltered": 2, "recordsTotal": 40, "data": rows}))
        }
        _ => Json(json!({
            "response": {"result": "error", "message": "Invalid cmd", "data": {}}
        })),
    }
}

fn tautulli_stub(state: StubState) -> Router {
    Router::new()
        .route("/api/v2", get(tautulli_api))
        .with_state(state)
}

// ============================================================================
// Servarr client
// ============================================================================

#[tokio::test]
async fn test_servarr_lists_inventory_with_api_key_header() {
    let base = serve(sonarr_stub(StubState::default())).await;
    let session = session();
    let client = ServarrClient::new(&session, LibraryMode::Series, &endpoint(&base, API_KEY));

    let items = client.list_items().await.unwrap();

    assert_eq!(client.service_name(), "sonarr");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].title, "Lost");
    assert_eq!(items[0].path.as_deref(), Some("/tv/Lost"));
    assert_eq!(items[2].path, None);
}

#[tokio::test]
async fn test_servarr_rejected_key_is_an_error() {
    let base = serve(sonarr_stub(StubState::default())).await;
    let session = session();
    let client = ServarrClient::new(&session, LibraryMode::Series, &endpoint(&base, "wrong"));

    let err = client.list_items().await.unwrap_err();

    assert!(err.to_string().contains("401"), "unexpected error: {err:#}");
}

#[tokio::test]
async fn test_series_size_comes_from_statistics() {
    let base = serve(sonarr_stub(StubState::default())).await;
    let session = session();
    let client = ServarrClient::new(&session, LibraryMode::Series, &endpoint(&base, API_KEY));

    assert_eq!(client.item_size(2).await.unwrap(), 9000);
    assert!(client.item_size(3).await.is_err());
}

#[tokio::test]
async fn test_movie_size_is_top_level() {
    let base = serve(radarr_stub(StubState::default())).await;
    let session = session();
    let client = ServarrClient::new(&session, LibraryMode::Movies, &endpoint(&base, API_KEY));

    assert_eq!(client.service_name(), "radarr");
    assert_eq!(client.item_size(11).await.unwrap(), 7_340_032);
}

#[tokio::test]
async fn test_delete_passes_delete_files_flag() {
    let state = StubState::default();
    let base = serve(radarr_stub(state.clone())).await;
    let session = session();
    let client = ServarrClient::new(&session, LibraryMode::Movies, &endpoint(&base, API_KEY));

    client.delete_item(5, true).await.unwrap();
    client.delete_item(6, false).await.unwrap();

    assert_eq!(
        *state.deletes.lock().unwrap(),
        vec![(5, "true".to_string()), (6, "false".to_string())]
    );
}

#[tokio::test]
async fn test_delete_requires_status_ok() {
    let base = serve(sonarr_stub(StubState::default())).await;
    let session = session();
    let client = ServarrClient::new(&session, LibraryMode::Series, &endpoint(&base, API_KEY));

    assert!(client.delete_item(404, false).await.is_err());
    // Accepted is still not a confirmed delete.
    assert!(client.delete_item(202, false).await.is_err());
}

#[tokio::test]
async fn test_clients_outlive_closed_session() {
    let base = serve(sonarr_stub(StubState::default())).await;
    let session = session();
    let client = ServarrClient::new(&session, LibraryMode::Series, &endpoint(&base, API_KEY));
    session.close();

    assert_eq!(client.item_size(1).await.unwrap(), 5000);
}

// ============================================================================
// Tautulli client
// ============================================================================

#[tokio::test]
async fn test_tautulli_lists_sections() {
    let base = serve(tautulli_stub(StubState::default())).await;
    let session = session();
    let client = TautulliClient::new(&session, &endpoint(&base, API_KEY));

    let sections = client.list_sections().await.unwrap();

    assert_eq!(
        sections,
        vec![
            LibrarySection {
                section_id: 1,
                section_type: SectionType::Show,
                section_name: "TV Shows".to_string(),
            },
            LibrarySection {
                section_id: 2,
                section_type: SectionType::Movie,
                section_name: "Films".to_string(),
            },
            LibrarySection {
                section_id: 3,
                section_type: SectionType::Other,
                section_name: "Music".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_tautulli_error_envelope_carries_message() {
    let base = serve(tautulli_stub(StubState::default())).await;
    let session = session();
    let client = TautulliClient::new(&session, &endpoint(&base, "wrong"));

    let err = client.list_sections().await.unwrap_err();

    assert!(err.to_string().contains("Invalid apikey"), "unexpected error: {err:#}");
}

#[tokio::test]
async fn test_tautulli_history_query_parameters() {
    let state = StubState::default();
    let base = serve(tautulli_stub(state.clone())).await;
    let session = session();
    let client = TautulliClient::new(&session, &endpoint(&base, API_KEY));
    let section = LibrarySection {
        section_id: 1,
        section_type: SectionType::Show,
        section_name: "TV Shows".to_string(),
    };

    let events = client.query_history(&section, 1_700_000_000).await.unwrap();

    assert_eq!(
        events,
        vec![
            PlaybackEvent {
                subject_title: "Lost".to_string(),
                viewed_at: 1_714_000_000,
            },
            PlaybackEvent {
                subject_title: "Lost".to_string(),
                viewed_at: 1_713_000_000,
            },
        ]
    );

    let queries = state.history_queries.lock().unwrap();
    let params = &queries[0];
    assert_eq!(params["section_id"], "1");
    assert_eq!(params["length"], "10000");
    assert_eq!(params["order_column"], "date");
    assert_eq!(params["order_dir"], "desc");
    assert_eq!(params["after"], "1700000000");
}

#[tokio::test]
async fn test_movie_history_uses_item_title() {
    let base = serve(tautulli_stub(StubState::default())).await;
    let session = session();
    let client = TautulliClient::new(&session, &endpoint(&base, API_KEY));
    let section = LibrarySection {
        section_id: 2,
        section_type: SectionType::Movie,
        section_name: "Films".to_string(),
    };

    let events = client.query_history(&section, 0).await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].subject_title, "Heat");
}

// ============================================================================
// Full run over HTTP
// ============================================================================

fn series_settings() -> AnalyzerSettings {
    AnalyzerSettings {
        mode: LibraryMode::Series,
        library_name: "TV Shows".to_string(),
        default_limit: 100,
        max_concurrent: 4,
    }
}

#[tokio::test]
async fn test_full_run_against_stubs() {
    let state = StubState::default();
    let sonarr = serve(sonarr_stub(state.clone())).await;
    let tautulli = serve(tautulli_stub(state.clone())).await;
    let session = session();

    let library: Arc<dyn LibraryManager> = Arc::new(ServarrClient::new(
        &session,
        LibraryMode::Series,
        &endpoint(&sonarr, API_KEY),
    ));
    let history: Arc<dyn HistoryService> =
        Arc::new(TautulliClient::new(&session, &endpoint(&tautulli, API_KEY)));
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

    let outcome = UnwatchedAnalyzer::new(library, history, series_settings())
        .find_unwatched_at(None, 2, now)
        .await
        .unwrap();

    let titles: Vec<&str> = outcome.unwatched.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Firefly", "Dexter"]);
    assert_eq!(outcome.candidates_checked, 3);
    assert_eq!(outcome.unwatched[0].human_size, "8.79 KB");
    assert_eq!(outcome.unwatched[1].path, "Unknown");

    let expected_after = (now.timestamp() - 60 * 86_400).to_string();
    let queries = state.history_queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0]["after"], expected_after);

    session.close();
}

#[tokio::test]
async fn test_full_run_with_history_down_reports_everything() {
    let sonarr = serve(sonarr_stub(StubState::default())).await;
    let tautulli = serve(tautulli_stub(StubState::default())).await;
    let session = session();

    let library: Arc<dyn LibraryManager> = Arc::new(ServarrClient::new(
        &session,
        LibraryMode::Series,
        &endpoint(&sonarr, API_KEY),
    ));
    let history: Arc<dyn HistoryService> =
        Arc::new(TautulliClient::new(&session, &endpoint(&tautulli, "wrong")));

    let outcome = UnwatchedAnalyzer::new(library, history, series_settings())
        .find_unwatched(Some(2), 2)
        .await
        .unwrap();

    let titles: Vec<&str> = outcome.unwatched.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Firefly", "Lost"]);
}

#[tokio::test]
async fn test_unreachable_library_manager_is_fatal() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let tautulli = serve(tautulli_stub(StubState::default())).await;
    let session = session();

    let library: Arc<dyn LibraryManager> = Arc::new(ServarrClient::new(
        &session,
        LibraryMode::Series,
        &endpoint(&closed, API_KEY),
    ));
    let history: Arc<dyn HistoryService> =
        Arc::new(TautulliClient::new(&session, &endpoint(&tautulli, API_KEY)));

    let err = UnwatchedAnalyzer::new(library, history, series_settings())
        .find_unwatched(None, 2)
        .await
        .unwrap_err();

    assert_matches!(err, AnalyzerError::UpstreamUnavailable { ref service, .. } if service == "sonarr");
}
