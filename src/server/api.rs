//! Request and response shapes of the HTTP API and the operations behind
//! them.
//!
//! The functions here are synchronous and framework-free so they can run
//! inside `spawn_blocking` and be tested without a server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::{self, AnalysisReport};
use crate::config::EngineConfig;
use crate::error::{StegoError, DECODE_FAILED_MESSAGE};
use crate::stego::{image, BitDepth, CapacityResult};
use crate::{capacity_of, decoder, encoder};

/// Errors reported to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request itself is malformed or out of range.
    #[error("{0}")]
    BadRequest(String),

    /// The carrier holds no message readable with the given parameters.
    #[error("{}", DECODE_FAILED_MESSAGE)]
    DecodeFailed,

    /// A message was recovered but it is not UTF-8 text.
    #[error("Hidden data is not valid UTF-8 text")]
    NotText,

    /// Something went wrong on our side.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::DecodeFailed | Self::NotText => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
}

impl From<StegoError> for ApiError {
    fn from(err: StegoError) -> Self {
        if err.is_decode_failure() {
            return Self::DecodeFailed;
        }
        match err {
            StegoError::KeyDerivation(msg) => Self::Internal(msg),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Bit depth as sent by clients: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LsbBits {
    Number(i64),
    Text(String),
}

impl LsbBits {
    /// Validates the value as a bit depth.
    pub fn to_bit_depth(&self) -> Result<BitDepth, ApiError> {
        match self {
            Self::Number(n) => BitDepth::from_i64(*n).map_err(ApiError::from),
            Self::Text(s) => parse_bit_depth(s),
        }
    }
}

/// JSON body of `POST /api/capacity`.
#[derive(Debug, Clone, Deserialize)]
pub struct CapacityRequest {
    /// Carrier as a `data:` URL or bare base64.
    pub image: String,
    #[serde(default)]
    pub lsb_bits: Option<LsbBits>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapacityResponse {
    pub success: bool,
    pub capacity: CapacityResult,
}

/// Fields of the `POST /api/encode` form.
#[derive(Debug, Clone, Default)]
pub struct EncodeForm {
    pub image: Vec<u8>,
    pub message: String,
    pub password: String,
    pub lsb_bits: Option<String>,
    pub compression: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EncodeResponse {
    pub success: bool,
    /// Stego image as a PNG `data:` URL.
    pub image: String,
    pub security_score: f64,
}

/// Fields of the `POST /api/decode` form.
#[derive(Debug, Clone, Default)]
pub struct DecodeForm {
    pub image: Vec<u8>,
    pub password: String,
    pub lsb_bits: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecodeResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: AnalysisReport,
}

/// Computes the capacity of the carrier in `request`.
pub fn capacity(
    request: &CapacityRequest,
    engine: &EngineConfig,
) -> Result<CapacityResponse, ApiError> {
    let bit_depth = match &request.lsb_bits {
        Some(bits) => bits.to_bit_depth()?,
        None => engine.bit_depth(),
    };
    let buffer = image::load_from_data_url(&request.image)?;

    Ok(CapacityResponse {
        success: true,
        capacity: capacity_of(&buffer, bit_depth),
    })
}

/// Hides the form's message in the form's image.
pub fn encode(form: &EncodeForm, engine: &EngineConfig) -> Result<EncodeResponse, ApiError> {
    if form.image.is_empty() {
        return Err(ApiError::bad_request("No image provided"));
    }
    if form.message.is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }
    if form.password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }

    let bit_depth = optional_bit_depth(form.lsb_bits.as_deref())?;
    let compress = form
        .compression
        .as_deref()
        .map(parse_flag)
        .transpose()?;
    let config = engine.encoder(bit_depth, compress);

    let buffer = image::load_from_memory(&form.image)?;
    let encoded = encoder::encode(&buffer, form.message.as_bytes(), &form.password, &config)?;

    Ok(EncodeResponse {
        success: true,
        image: image::to_png_data_url(&encoded.pixels)?,
        security_score: encoded.report.security_score,
    })
}

/// Recovers the text message hidden in the form's image.
pub fn decode(form: &DecodeForm, engine: &EngineConfig) -> Result<DecodeResponse, ApiError> {
    if form.image.is_empty() {
        return Err(ApiError::bad_request("No image provided"));
    }
    if form.password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }

    let bit_depth = optional_bit_depth(form.lsb_bits.as_deref())?;
    let config = engine.decoder(bit_depth);

    let buffer = image::load_from_memory(&form.image)?;
    let bytes = decoder::decode(&buffer, &form.password, &config)?;
    let message = String::from_utf8(bytes).map_err(|_| ApiError::NotText)?;

    Ok(DecodeResponse {
        success: true,
        message,
    })
}

/// Scores how detectable hidden data in the image would be.
pub fn analyze(image_bytes: &[u8]) -> Result<AnalyzeResponse, ApiError> {
    if image_bytes.is_empty() {
        return Err(ApiError::bad_request("No image provided"));
    }
    let buffer = image::load_from_memory(image_bytes)?;

    Ok(AnalyzeResponse {
        success: true,
        report: analysis::analyze(&buffer),
    })
}

/// Parses a bit depth form field.
pub fn parse_bit_depth(value: &str) -> Result<BitDepth, ApiError> {
    let bits: i64 = value
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("lsb_bits must be an integer, got '{}'", value)))?;
    Ok(BitDepth::from_i64(bits)?)
}

/// Parses a boolean form field ("true"/"false", "on"/"off", "1"/"0", "yes"/"no").
pub fn parse_flag(value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" => Ok(false),
        other => Err(ApiError::bad_request(format!(
            "expected a boolean, got '{}'",
            other
        ))),
    }
}

fn optional_bit_depth(value: Option<&str>) -> Result<Option<BitDepth>, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => parse_bit_depth(v).map(Some),
        _ => Ok(None),
    }
}
