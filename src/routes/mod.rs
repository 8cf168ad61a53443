//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers); tighten for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/normalize", post(http::http_post_normalize))
        .route("/api/v1/activities", post(http::http_post_activity))
        .route("/api/v1/activities/generate", post(http::http_post_generate))
        .route("/api/v1/activities/:id", get(http::http_get_activity))
        .route("/api/v1/activities/:id/matching", get(http::http_get_matching))
        .route("/api/v1/activities/:id/matching/grade", post(http::http_post_grade))
        .route("/api/v1/shuffle", post(http::http_post_shuffle))
        .route("/api/v1/word-search/build", post(http::http_post_word_search))
        .route("/api/v1/crossword/build", post(http::http_post_crossword))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::ActivityConfig;

    fn app() -> Router {
        build_router(Arc::new(AppState::with_parts(ActivityConfig::default(), None)))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req.header(CONTENT_TYPE, "application/json").body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = call(app(), "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn normalize_reports_legacy_crossword_shape() {
        let raw = json!({
            "type": "crossword",
            "data": {
                "grid": ["AB", "C#"],
                "pistas": [{ "num": 1, "tipo": "vertical", "texto": "Primera", "respuesta": "AC" }],
            },
        });
        let (status, body) = call(app(), "POST", "/api/v1/normalize", Some(raw)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "crossword");
        assert_eq!(body["data"]["grid"], json!([["A", "B"], ["C", "#"]]));
        assert_eq!(body["data"]["clues"][0]["direction"], "down");
        assert_eq!(body["data"]["clues"][0]["clue"], "Primera");
        assert_eq!(body["renderable"], true);
    }

    #[tokio::test]
    async fn normalize_of_garbage_is_degraded_not_an_error() {
        let raw = json!({ "type": "word_search", "data": "not an object" });
        let (status, body) = call(app(), "POST", "/api/v1/normalize", Some(raw)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["renderable"], false);
        assert_eq!(body["degraded"], true);
    }

    #[tokio::test]
    async fn stored_activity_round_trips_through_the_store() {
        let app = app();
        let raw = json!({ "type": "word_connection", "data": { "connections": [{ "word1": "sol", "connection": "estrella" }] } });
        let (status, stored) = call(app.clone(), "POST", "/api/v1/activities", Some(raw)).await;
        assert_eq!(status, StatusCode::OK);
        let id = stored["id"].as_str().unwrap().to_string();

        let (status, body) = call(app, "GET", &format!("/api/v1/activities/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["items"][0], json!({ "left": "sol", "right": "estrella" }));
    }

    #[tokio::test]
    async fn unknown_activity_is_404_with_message() {
        let (status, body) = call(app(), "GET", "/api/v1/activities/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn matching_on_wrong_kind_is_422() {
        let (status, _) = call(app(), "GET", "/api/v1/activities/sample-word-search/matching", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn matching_and_grading_sample_connection() {
        let app = app();
        let (status, body) = call(app.clone(), "GET", "/api/v1/activities/sample-word-connection/matching", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "ready");
        assert_eq!(body["exercise"]["definitions"].as_array().unwrap().len(), 3);

        let answers = json!({ "answers": [
            { "left": "seo", "right": "optimización en buscadores" },
            { "left": "SEM", "right": "Publicidad en buscadores" },
            { "left": "Branding", "right": "Gestión de marca" },
        ] });
        let (status, score) =
            call(app, "POST", "/api/v1/activities/sample-word-connection/matching/grade", Some(answers)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(score["correct"], 3);
        assert_eq!(score["total"], 3);
    }

    #[tokio::test]
    async fn label_choices_grade_against_the_seeded_layout() {
        let app = app();
        let (_, body) = call(app.clone(), "GET", "/api/v1/activities/sample-word-connection/matching?seed=7", None).await;
        assert_eq!(body["seed"], 7);
        let choices: Vec<Value> = body["exercise"]["answer_key"]
            .as_object()
            .unwrap()
            .iter()
            .map(|(n, l)| json!({ "number": n.parse::<usize>().unwrap(), "label": l }))
            .collect();

        let uri = "/api/v1/activities/sample-word-connection/matching/grade";
        let (status, score) = call(app.clone(), "POST", uri, Some(json!({ "seed": 7, "choices": choices }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(score["correct"], 3);

        let (status, _) = call(app, "POST", uri, Some(json!({ "choices": [{ "number": 1, "label": "A" }] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_falls_back_locally() {
        let (status, body) =
            call(app(), "POST", "/api/v1/activities/generate", Some(json!({ "type": "word_search", "pdfId": "doc-1" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["origin"], "local_fallback");
        assert_eq!(body["activity"]["renderable"], true);
    }

    #[tokio::test]
    async fn shuffle_defaults_to_derangement() {
        let (status, body) = call(app(), "POST", "/api/v1/shuffle", Some(json!({ "items": ["a", "a", "b", "b"] }))).await;
        assert_eq!(status, StatusCode::OK);
        let items: Vec<&str> = body["items"].as_array().unwrap().iter().filter_map(Value::as_str).collect();
        for (i, orig) in ["a", "a", "b", "b"].iter().enumerate() {
            assert_ne!(&items[i], orig);
        }
        assert!(body["method"].is_object());
    }

    #[tokio::test]
    async fn word_search_build_accepts_free_text() {
        let (status, body) =
            call(app(), "POST", "/api/v1/word-search/build", Some(json!({ "text": "sol, luna; marte" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"]["words"], json!(["SOL", "LUNA", "MARTE"]));

        let (status, _) = call(app(), "POST", "/api/v1/word-search/build", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn crossword_build_numbers_clues() {
        let entries = json!({ "entries": [
            { "clue": "Astro rey", "answer": "sol" },
            { "clue": "Planeta rojo", "answer": "marte" },
        ] });
        let (status, body) = call(app(), "POST", "/api/v1/crossword/build", Some(entries)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"]["clues"][0]["number"], 1);
        assert_eq!(body["model"]["clues"][0]["answer"], "MARTE");
    }
}
