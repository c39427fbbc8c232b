//! Unit tests for API types serialization/deserialization.

#![allow(clippy::unwrap_used, clippy::panic)]

use fieldkit::api::{
    CreatePassiveRequest, CreateReportRequest, ErrorResponse, ExportResponse, HealthResponse,
    OpenDraftRequest, PhotoUploadRequest, ReportListQuery,
};
use fieldkit_core::{AssetId, AssetKind, AutosaveOutcome, PassiveKind, PhotoCategory, ReportId};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.4.2".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"version\":\"0.4.2\""));
}

// =============================================================================
// REPORT / PASSIVE REQUESTS
// =============================================================================

#[test]
fn test_create_report_request_deserialization() {
    let json = r#"{"name":"Zona Norte","node_name":"N-204"}"#;
    let request: CreateReportRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.name, "Zona Norte");
    assert_eq!(request.node_name, "N-204");
}

#[test]
fn test_report_list_query_defaults_to_active() {
    let query: ReportListQuery = serde_json::from_str("{}").unwrap();
    assert!(!query.trashed);
}

#[test]
fn test_passive_request_observation_optional() {
    let json = r#"{"address":"Av. Mitre 1200","kind":"POWER_INSERTER"}"#;
    let request: CreatePassiveRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.kind, PassiveKind::PowerInserter);
    assert!(request.observation.is_empty());
}

#[test]
fn test_passive_request_unknown_kind_rejected() {
    let json = r#"{"address":"Av. Mitre 1200","kind":"AMPLIFIER"}"#;
    assert!(serde_json::from_str::<CreatePassiveRequest>(json).is_err());
}

// =============================================================================
// PHOTO UPLOAD
// =============================================================================

#[test]
fn test_photo_upload_decodes_base64() {
    let json = r#"{"category":"OPTICS","data":"/9hqcGVn"}"#;
    let request: PhotoUploadRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.category, PhotoCategory::Optics);
    assert!(request.location.is_none());
    assert_eq!(request.decode().unwrap(), b"\xff\xd8jpeg");
}

#[test]
fn test_photo_upload_with_location() {
    let json = r#"{"category":"MODULE","data":"","location":{"latitude":-34.6,"longitude":-58.4}}"#;
    let request: PhotoUploadRequest = serde_json::from_str(json).unwrap();
    let location = request.location.unwrap();
    assert!(location.latitude < 0.0);
}

#[test]
fn test_photo_upload_invalid_base64() {
    let request = PhotoUploadRequest {
        category: PhotoCategory::Module,
        data: "%%%".to_string(),
        location: None,
    };
    assert!(request.decode().is_err());
}

// =============================================================================
// DRAFT SESSIONS
// =============================================================================

#[test]
fn test_open_draft_request_variants() {
    let edit: OpenDraftRequest = serde_json::from_str(r#"{"asset_id":12}"#).unwrap();
    assert!(matches!(
        edit,
        OpenDraftRequest::Edit {
            asset_id: AssetId(12)
        }
    ));

    let new: OpenDraftRequest =
        serde_json::from_str(r#"{"report_id":3,"kind":"NODE"}"#).unwrap();
    assert!(matches!(
        new,
        OpenDraftRequest::New {
            report_id: ReportId(3),
            kind: AssetKind::Node
        }
    ));

    assert!(serde_json::from_str::<OpenDraftRequest>(r#"{"kind":"NODE"}"#).is_err());
}

#[test]
fn test_autosave_outcome_is_tagged() {
    let outcome = AutosaveOutcome::Failed {
        message: "No se pudo guardar automáticamente".to_string(),
    };
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "failed");
    assert_eq!(json["message"], "No se pudo guardar automáticamente");
}

// =============================================================================
// EXPORT / ERROR RESPONSES
// =============================================================================

#[test]
fn test_export_response_encodes_base64() {
    let response = ExportResponse::success(b"{}", 42);
    assert!(response.success);
    assert_eq!(response.data.as_deref(), Some("e30="));
    assert_eq!(response.checksum, Some(42));
}

#[test]
fn test_error_response_serialization() {
    let body = ErrorResponse {
        success: false,
        error: "Report not found: 4".to_string(),
    };
    let json = serde_json::to_string(&body).unwrap();
    assert!(json.contains("\"success\":false"));
    assert!(json.contains("Report not found: 4"));
}
