//! Demo HTTP server standing in for the web front-end: upload a meal photo,
//! get nutrition JSON back, flip the sample-data toggle, run diagnostics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{media_type_for, AnalysisRequest, AnalysisResult, ClientConfiguration, UNKNOWN_MEDIA_TYPE};
use crate::services::{ConnectivityProbe, ConnectivityReport, MealAnalyzer};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub struct AppState {
    pub analyzer: Arc<dyn MealAnalyzer>,
    pub probe: Arc<ConnectivityProbe>,
    /// Process-level toggle; read once at the start of each analyze call.
    pub offline: AtomicBool,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("No image uploaded")]
    MissingImage,

    #[error("Unsupported media type: {0}")]
    NotAnImage(String),

    #[error("Malformed upload: {0}")]
    MalformedUpload(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self {
            ServerError::MissingImage => StatusCode::BAD_REQUEST,
            ServerError::NotAnImage(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::MalformedUpload(_) => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}

#[derive(Serialize)]
struct AnalyzeResponse {
    #[serde(flatten)]
    result: AnalysisResult,
    /// Mirrors the toggle state, not whether a fallback happened.
    sample_data: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeBody {
    pub offline: bool,
}

pub fn create_router(
    analyzer: Arc<dyn MealAnalyzer>,
    probe: Arc<ConnectivityProbe>,
    initial: ClientConfiguration,
) -> Router {
    let state = Arc::new(AppState {
        analyzer,
        probe,
        offline: AtomicBool::new(initial.use_offline_fallback),
    });

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/analyze", axum::routing::post(analyze_handler))
        .route("/api/mode", get(get_mode).post(set_mode))
        .route("/api/diagnostics", get(diagnostics_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ServerError> {
    let config = ClientConfiguration {
        use_offline_fallback: state.offline.load(Ordering::SeqCst),
    };

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::MalformedUpload(e.to_string()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let media_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| media_type_for(&file_name).map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_MEDIA_TYPE.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::MalformedUpload(e.to_string()))?;

        upload = Some(AnalysisRequest::new(bytes.to_vec(), media_type, file_name));
        break;
    }

    let request = upload.ok_or(ServerError::MissingImage)?;
    if !request.is_image() {
        log::warn!("⚠️ Rejected upload {} ({})", request.file_name(), request.media_type());
        return Err(ServerError::NotAnImage(request.media_type().to_string()));
    }

    log::info!("📸 Upload received: {} ({} bytes)", request.file_name(), request.len());
    let result = state.analyzer.analyze(&request, &config).await;

    Ok(Json(AnalyzeResponse {
        result,
        sample_data: config.use_offline_fallback,
    }))
}

async fn get_mode(State(state): State<Arc<AppState>>) -> Json<ModeBody> {
    Json(ModeBody {
        offline: state.offline.load(Ordering::SeqCst),
    })
}

async fn set_mode(State(state): State<Arc<AppState>>, Json(body): Json<ModeBody>) -> Json<ModeBody> {
    state.offline.store(body.offline, Ordering::SeqCst);
    log::info!(
        "{}",
        if body.offline {
            "🧪 Sample data mode enabled"
        } else {
            "🌐 Live webhook enabled"
        }
    );
    Json(body)
}

async fn diagnostics_handler(State(state): State<Arc<AppState>>) -> Json<ConnectivityReport> {
    Json(state.probe.run().await)
}

async fn root_handler() -> &'static str {
    "FoodSense AI demo server - POST an image to /api/analyze"
}

async fn health_check() -> &'static str {
    "OK"
}
