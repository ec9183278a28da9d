use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use postscrape_core::{Busy, GateStatus, PostResult, Resolution, ScrapeResult};
use postscrape_engine::ScrapeService;
use postscrape_logging::{scrape_info, short_url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const BUSY_DETAIL: &str = "scraper is busy with another request, retry in a few seconds";

#[derive(Clone)]
pub struct AppState {
    service: Arc<ScrapeService>,
}

pub fn build_router(service: Arc<ScrapeService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/scrape", get(scrape_post_get).post(scrape_post_body))
        .route("/scrape/images-only", post(scrape_images_only))
        .route("/scrape/video", get(scrape_video_get).post(scrape_video_body))
        .route("/session/reset", post(reset_session))
        .layer(cors)
        .with_state(AppState { service })
}

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

/// Error body: `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<Busy> for ApiError {
    fn from(_: Busy) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, BUSY_DETAIL)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct StatusBody {
    #[serde(flatten)]
    gate: GateStatus,
    session_active: bool,
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ImagesBody {
    success: bool,
    url: String,
    total_images: usize,
    images: Vec<String>,
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "status": "online",
        "message": "Facebook post scraper API",
        "version": VERSION,
        "endpoints": {
            "POST /scrape": "scrape a post by URL",
            "GET /scrape?url=...": "scrape a post by URL",
            "POST /scrape/images-only": "image URLs of a post",
            "GET /scrape/video?url=...": "video URL of a post",
            "POST /scrape/video": "video URL of a post",
            "POST /session/reset": "discard the browser session",
            "GET /health": "health check",
            "GET /status": "admission and session state",
        }
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "version": VERSION }))
}

async fn status(State(state): State<AppState>) -> Json<StatusBody> {
    Json(StatusBody {
        gate: state.service.status(),
        session_active: state.service.session_active(),
        status: "online",
        version: VERSION,
    })
}

async fn scrape_post_get(
    State(state): State<AppState>,
    Query(request): Query<UrlRequest>,
) -> Result<Json<PostResult>, ApiError> {
    scrape_post(&state, &request.url).await.map(Json)
}

async fn scrape_post_body(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<PostResult>, ApiError> {
    scrape_post(&state, &request.url).await.map(Json)
}

async fn scrape_images_only(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<ImagesBody>, ApiError> {
    let result = scrape_post(&state, &request.url).await?;
    let images = result.post.map(|post| post.images).unwrap_or_default();
    Ok(Json(ImagesBody {
        success: true,
        url: request.url,
        total_images: images.len(),
        images,
    }))
}

async fn scrape_video_get(
    State(state): State<AppState>,
    Query(request): Query<UrlRequest>,
) -> Result<Json<ScrapeResult>, ApiError> {
    scrape_video(&state, &request.url).await.map(Json)
}

async fn scrape_video_body(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<ScrapeResult>, ApiError> {
    scrape_video(&state, &request.url).await.map(Json)
}

async fn reset_session(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.service.reset_session().await?;
    Ok(Json(json!({ "status": "reset" })))
}

async fn scrape_post(state: &AppState, url: &str) -> Result<PostResult, ApiError> {
    require_facebook_url(url)?;
    scrape_info!("post request for {}", short_url(url));
    let result = state.service.scrape_post(url).await?;
    if !result.success {
        let detail = result.error.unwrap_or_else(|| "post not found".to_string());
        return Err(ApiError::new(StatusCode::NOT_FOUND, detail));
    }
    Ok(result)
}

async fn scrape_video(state: &AppState, url: &str) -> Result<ScrapeResult, ApiError> {
    require_facebook_url(url)?;
    scrape_info!("video request for {}", short_url(url));
    let result = state.service.resolve_video(url).await?;
    match result.resolution {
        Resolution::Resolved | Resolution::Unvalidated => Ok(result),
        Resolution::NotFound => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            result.error.unwrap_or_else(|| "video not found".to_string()),
        )),
        Resolution::Failed => Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            result.error.unwrap_or_else(|| "video resolution failed".to_string()),
        )),
    }
}

fn require_facebook_url(url: &str) -> Result<(), ApiError> {
    if url.to_ascii_lowercase().contains("facebook.com") {
        Ok(())
    } else {
        Err(ApiError::new(StatusCode::BAD_REQUEST, "URL must be a facebook.com URL"))
    }
}
