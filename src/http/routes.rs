use crate::calibration::PerformanceTrends;
use crate::core::config::{DetectionConfig, Preset};
use crate::error::DetectionError;
use crate::http::app::AppState;
use crate::io::csv_input;
use crate::pipeline;
use crate::result::DetectionResult;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

pub struct ApiError(DetectionError);

impl From<DetectionError> for ApiError {
    fn from(err: DetectionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            DetectionError::Validation { issues } => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": "validation", "issues": issues })))
                    .into_response()
            }
            DetectionError::Processing(msg) => {
                log::error!("processing error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "internal" })))
                    .into_response()
            }
        }
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError(DetectionError::validation(vec![err.to_string()]))
}

async fn extract_upload(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            let bytes = field.bytes().await.map_err(multipart_error)?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ApiError(DetectionError::validation(vec![
        "multipart request is missing a \"file\" field".to_string(),
    ])))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_config() -> Json<DetectionConfig> {
    Json(DetectionConfig::from_env())
}

pub async fn get_preset_config(Path(name): Path<String>) -> Result<Json<DetectionConfig>, StatusCode> {
    match Preset::parse(&name) {
        Some(preset) => Ok(Json(DetectionConfig::preset(preset))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

pub async fn get_metrics(
    State(state): State<AppState>,
) -> Result<Json<PerformanceTrends>, ApiError> {
    let trends = state.perf.get_trends(50)?;
    Ok(Json(trends))
}

pub async fn detect(mut multipart: Multipart) -> Result<Json<DetectionResult>, ApiError> {
    let bytes = extract_upload(&mut multipart).await?;
    let (edges, _issues) = csv_input::read_edges(bytes.as_slice())?;
    let result = pipeline::run(edges, DetectionConfig::from_env(), false).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct EnhancedParams {
    pub preset: Option<String>,
    pub min_score: Option<u32>,
    pub enable_validation: Option<bool>,
}

pub async fn detect_enhanced(
    State(state): State<AppState>,
    Query(params): Query<EnhancedParams>,
    mut multipart: Multipart,
) -> Result<Json<DetectionResult>, ApiError> {
    let mut config = match params.preset.as_deref().and_then(Preset::parse) {
        Some(preset) => DetectionConfig::preset(preset),
        None => DetectionConfig::from_env(),
    };
    config.enhanced = true;
    if let Some(min_score) = params.min_score {
        config.min_suspicion_score = min_score;
    }

    let bytes = extract_upload(&mut multipart).await?;
    let (edges, issues) = csv_input::read_edges(bytes.as_slice())?;
    if params.enable_validation.unwrap_or(false) && !issues.is_empty() {
        log::info!("enhanced detect: {} rows dropped during cleaning", issues.len());
    }

    let result = pipeline::run(edges, config, true).await?;

    state
        .perf
        .record_analysis(&crate::calibration::AnalysisMetrics {
            recorded_at: chrono::Utc::now(),
            total_nodes: result.summary.total_nodes,
            total_transactions: result.summary.total_transactions,
            suspicious_accounts_flagged: result.summary.suspicious_accounts_flagged,
            fraud_rings_detected: result.summary.fraud_rings_detected,
            processing_time_seconds: result.summary.processing_time_seconds,
        })?;

    Ok(Json(result))
}
