//! # Report Export
//!
//! Serializes a report with everything hanging off it into one JSON
//! document that another installation (or an archive) can verify.
//!
//! ```text
//! {
//!   "checksum": <u64 over the bundle bytes>,
//!   "blake3": "<hex>",          // only with the `crypto-hash` feature
//!   "bundle": { report, assets[], passives[] }
//! }
//! ```
//!
//! The bundle is built from `BTreeMap`-backed listings and fixed struct field
//! order, so exporting the same state twice yields identical bytes.

use crate::validation::Evaluation;
use crate::workspace::Workspace;
use crate::{
    AmplifierAdjustment, Asset, FieldError, NodeAdjustment, PassiveItem, Photo, Report, ReportId,
};
use serde::{Deserialize, Serialize};

/// Format tag stored in every bundle.
pub const EXPORT_FORMAT: &str = "fieldkit-report";

/// Current bundle version.
pub const EXPORT_VERSION: u8 = 1;

/// One asset with its sub-records and current verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedAsset {
    pub asset: Asset,
    pub amplifier_adjustment: Option<AmplifierAdjustment>,
    pub node_adjustment: Option<NodeAdjustment>,
    pub photos: Vec<Photo>,
    pub evaluation: Evaluation,
}

/// A report and everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    pub format: String,
    pub version: u8,
    pub report: Report,
    pub assets: Vec<ExportedAsset>,
    pub passives: Vec<PassiveItem>,
}

/// Bundle plus integrity data, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub checksum: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blake3: Option<String>,
    pub bundle: ReportBundle,
}

/// Collect a report into a bundle.
pub fn export_report(ws: &Workspace, id: ReportId) -> Result<ReportBundle, FieldError> {
    let report = ws.report(id)?;
    let mut assets = Vec::new();
    for asset in ws.assets(id)? {
        let draft = ws.load_draft(asset.id)?;
        let evaluation = ws.evaluate_draft(&draft)?;
        assets.push(ExportedAsset {
            amplifier_adjustment: ws.repo().get_amplifier_adjustment(asset.id)?,
            node_adjustment: ws.repo().get_node_adjustment(asset.id)?,
            photos: ws.photos(asset.id)?,
            evaluation,
            asset,
        });
    }
    Ok(ReportBundle {
        format: EXPORT_FORMAT.to_string(),
        version: EXPORT_VERSION,
        report,
        passives: ws.passives(id)?,
        assets,
    })
}

/// Deterministic checksum over the bundle's compact JSON bytes.
///
/// Detects accidental corruption only; use the BLAKE3 digest where
/// tampering matters.
pub fn bundle_checksum(bundle: &ReportBundle) -> Result<u64, FieldError> {
    Ok(checksum_bytes(&bundle_bytes(bundle)?))
}

/// Export a report as a pretty-printed JSON document.
pub fn export_json(ws: &Workspace, id: ReportId) -> Result<Vec<u8>, FieldError> {
    let bundle = export_report(ws, id)?;
    let bytes = bundle_bytes(&bundle)?;
    let document = ExportDocument {
        checksum: checksum_bytes(&bytes),
        blake3: crypto_hash(&bytes),
        bundle,
    };
    serde_json::to_vec_pretty(&document).map_err(|e| FieldError::SerializationError(e.to_string()))
}

/// Parse an exported document and check its integrity data.
///
/// # Security Note
///
/// Error messages stay generic so a corrupted file does not echo its content.
pub fn verify_export(data: &[u8]) -> Result<ReportBundle, FieldError> {
    let document: ExportDocument = serde_json::from_slice(data)
        .map_err(|e| FieldError::DeserializationError(format!("Invalid export: {}", e)))?;
    if document.bundle.format != EXPORT_FORMAT || document.bundle.version > EXPORT_VERSION {
        return Err(FieldError::DeserializationError(
            "Unsupported export format".to_string(),
        ));
    }

    let bytes = bundle_bytes(&document.bundle)?;
    if checksum_bytes(&bytes) != document.checksum {
        return Err(FieldError::DeserializationError(
            "Checksum mismatch".to_string(),
        ));
    }
    if let (Some(expected), Some(actual)) = (&document.blake3, crypto_hash(&bytes)) {
        if *expected != actual {
            return Err(FieldError::DeserializationError(
                "Hash mismatch".to_string(),
            ));
        }
    }
    Ok(document.bundle)
}

fn bundle_bytes(bundle: &ReportBundle) -> Result<Vec<u8>, FieldError> {
    serde_json::to_vec(bundle).map_err(|e| FieldError::SerializationError(e.to_string()))
}

fn checksum_bytes(bytes: &[u8]) -> u64 {
    let mut hash: u64 = bytes.len() as u64;
    for byte in bytes {
        hash = hash.rotate_left(5) ^ u64::from(*byte);
        hash = hash.wrapping_mul(0x100_0000_01b3);
    }
    hash
}

/// BLAKE3 hex digest of `data`.
#[cfg(feature = "crypto-hash")]
fn crypto_hash(data: &[u8]) -> Option<String> {
    Some(blake3::hash(data).to_hex().to_string())
}

#[cfg(not(feature = "crypto-hash"))]
fn crypto_hash(_data: &[u8]) -> Option<String> {
    None
}

// =============================================================================
// TESTS
// =============================================================================
