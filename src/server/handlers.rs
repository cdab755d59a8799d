//! axum handlers: request extraction, blocking offload and logging.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::api::{
    self, AnalyzeResponse, ApiError, CapacityRequest, CapacityResponse, DecodeForm,
    DecodeResponse, EncodeForm, EncodeResponse,
};
use super::AppState;

/// Handler for `POST /api/capacity`.
pub async fn capacity_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CapacityResponse>, ApiError> {
    let request: CapacityRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
        .map_err(|e| rejected("capacity", e))?;

    let engine = state.engine;
    run_blocking(move || api::capacity(&request, &engine))
        .await
        .map(Json)
        .map_err(|e| rejected("capacity", e))
}

/// Handler for `POST /api/encode`.
pub async fn encode_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<EncodeResponse>, ApiError> {
    let form = read_encode_form(multipart)
        .await
        .map_err(|e| rejected("encode", e))?;
    debug!(
        image_bytes = form.image.len(),
        message_len = form.message.len(),
        "encode request"
    );

    let engine = state.engine;
    run_blocking(move || api::encode(&form, &engine))
        .await
        .map(Json)
        .map_err(|e| rejected("encode", e))
}

/// Handler for `POST /api/decode`.
pub async fn decode_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DecodeResponse>, ApiError> {
    let form = read_decode_form(multipart)
        .await
        .map_err(|e| rejected("decode", e))?;
    debug!(image_bytes = form.image.len(), "decode request");

    let engine = state.engine;
    run_blocking(move || api::decode(&form, &engine))
        .await
        .map(Json)
        .map_err(|e| rejected("decode", e))
}

/// Handler for `POST /api/analyze`.
pub async fn analyze_handler(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let image = read_image_only(multipart)
        .await
        .map_err(|e| rejected("analyze", e))?;
    debug!(image_bytes = image.len(), "analyze request");

    run_blocking(move || api::analyze(&image))
        .await
        .map(Json)
        .map_err(|e| rejected("analyze", e))
}

/// Handler for `GET /health`.
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Runs an engine call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

fn rejected(route: &'static str, err: ApiError) -> ApiError {
    warn!(route, status = err.status().as_u16(), error = %err, "request rejected");
    err
}

async fn read_encode_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<EncodeForm, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut form = EncodeForm::default();

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => form.image = field_bytes(field).await?,
            "message" => form.message = field_text(field).await?,
            "password" => form.password = field_text(field).await?,
            "lsb_bits" => form.lsb_bits = Some(field_text(field).await?),
            "compression" => form.compression = Some(field_text(field).await?),
            _ => {}
        }
    }
    Ok(form)
}

async fn read_decode_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<DecodeForm, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut form = DecodeForm::default();

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => form.image = field_bytes(field).await?,
            "password" => form.password = field_text(field).await?,
            "lsb_bits" => form.lsb_bits = Some(field_text(field).await?),
            _ => {}
        }
    }
    Ok(form)
}

async fn read_image_only(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Vec<u8>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut image = Vec::new();

    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("image") {
            image = field_bytes(field).await?;
        }
    }
    Ok(image)
}

async fn next_field(
    multipart: &mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'_>>, ApiError> {
    multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

async fn field_bytes(field: axum::extract::multipart::Field<'_>) -> Result<Vec<u8>, ApiError> {
    field
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))
}
