//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//! Stored records (`Report`, `Asset`, `Photo`, `PassiveItem`) and verdicts
//! (`Evaluation`, `AutosaveOutcome`) are sent as the core serializes them.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use base64::Engine;
use fieldkit_core::{
    AssetDraft, AssetId, AssetKind, AutosaveOutcome, Evaluation, FieldError, GeoPoint,
    PassiveKind, PhotoCategory, ReportId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// REPORT REQUESTS
// =============================================================================

/// Report creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReportRequest {
    pub name: String,
    pub node_name: String,
}

/// Query string of `GET /reports`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportListQuery {
    /// List the trash instead of active reports.
    #[serde(default)]
    pub trashed: bool,
}

/// Passive item creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePassiveRequest {
    pub address: String,
    pub kind: PassiveKind,
    #[serde(default)]
    pub observation: String,
}

// =============================================================================
// PHOTO UPLOAD
// =============================================================================

/// Photo upload body, image bytes in standard base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoUploadRequest {
    pub category: PhotoCategory,
    pub data: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

impl PhotoUploadRequest {
    /// Decode the image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, FieldError> {
        base64::engine::general_purpose::STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| FieldError::InvalidInput(format!("photo data is not base64: {}", e)))
    }
}

// =============================================================================
// DRAFT SESSIONS
// =============================================================================

/// Opens an autosave session on a new draft or on a saved asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpenDraftRequest {
    /// Edit an existing asset.
    Edit { asset_id: AssetId },
    /// Start an empty draft.
    New { report_id: ReportId, kind: AssetKind },
}

/// State of a draft session after opening it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftResponse {
    pub session: u64,
    pub draft: AssetDraft,
    pub evaluation: Evaluation,
}

/// State of a draft session after an edit or a photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftUpdateResponse {
    pub session: u64,
    pub draft: AssetDraft,
    pub outcome: AutosaveOutcome,
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded
    pub checksum: Option<u64>,
}

impl ExportResponse {
    pub fn success(data: &[u8], checksum: u64) -> Self {
        Self {
            success: true,
            data: Some(base64::engine::general_purpose::STANDARD.encode(data)),
            checksum: Some(checksum),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Handler error.
#[derive(Debug)]
pub enum ApiError {
    Field(FieldError),
    SessionNotFound(u64),
}

impl From<FieldError> for ApiError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::Field(e) => match e {
                FieldError::ReportNotFound(_)
                | FieldError::AssetNotFound(_)
                | FieldError::PhotoNotFound(_)
                | FieldError::PassiveNotFound(_) => StatusCode::NOT_FOUND,
                FieldError::DuplicatePort { .. } | FieldError::NodeAlreadyPresent(_) => {
                    StatusCode::CONFLICT
                }
                FieldError::Incomplete(_) | FieldError::PhotoLimitReached { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                FieldError::InvalidInput(_) | FieldError::DeserializationError(_) => {
                    StatusCode::BAD_REQUEST
                }
                FieldError::SerializationError(_) | FieldError::IoError(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            Self::SessionNotFound(id) => format!("Draft session not found: {}", id),
            // The technician sees the prioritized message as is.
            Self::Field(FieldError::Incomplete(message)) => message.text().to_string(),
            Self::Field(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.message());
        }
        let body = ErrorResponse {
            success: false,
            error: self.message(),
        };
        (status, Json(body)).into_response()
    }
}
