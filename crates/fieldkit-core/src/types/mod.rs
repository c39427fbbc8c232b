//! # Core Type Definitions
//!
//! This module contains all core types for the fieldkit inspection engine:
//! - Record identifiers (`ReportId`, `AssetId`, `PhotoId`, `PassiveId`)
//! - Closed enumerations (`AssetKind`, `Frequency`, `Technology`, ...)
//! - Stored records (`Report`, `Asset`, adjustments, `Photo`, `PassiveItem`)
//! - User-facing validation messages (`ValidationMessage`)
//! - Error types (`FieldError`)
//!
//! Enumerations that arrive as free text from the field (technology names,
//! plan spreadsheets) are parsed once at the boundary and matched
//! exhaustively afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// RECORD IDENTIFIERS
// =============================================================================

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of an inspection report.
    ReportId
);
record_id!(
    /// Identifier of an inspected asset (node or amplifier).
    AssetId
);
record_id!(
    /// Identifier of a stored photo.
    PhotoId
);
record_id!(
    /// Identifier of a passive-equipment observation.
    PassiveId
);

// =============================================================================
// ASSET ENUMERATIONS
// =============================================================================

/// The kind of active equipment being inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetKind {
    Node,
    Amplifier,
}

impl AssetKind {
    /// Uppercase label used in exports and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "NODE",
            Self::Amplifier => "AMPLIFIER",
        }
    }

    /// Lowercase prefix used for the asset's storage directory.
    #[must_use]
    pub const fn dir_prefix(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Amplifier => "amplifier",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return-path split frequency of the plant, in MHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Frequency {
    Mhz42,
    Mhz85,
}

impl Frequency {
    /// The frequency in MHz.
    #[must_use]
    pub const fn mhz(self) -> u16 {
        match self {
            Self::Mhz42 => 42,
            Self::Mhz85 => 85,
        }
    }
}

impl TryFrom<u16> for Frequency {
    type Error = FieldError;

    fn try_from(mhz: u16) -> Result<Self, Self::Error> {
        match mhz {
            42 => Ok(Self::Mhz42),
            85 => Ok(Self::Mhz85),
            other => Err(FieldError::InvalidInput(format!(
                "frequency must be 42 or 85 MHz, got {}",
                other
            ))),
        }
    }
}

impl From<Frequency> for u16 {
    fn from(f: Frequency) -> Self {
        f.mhz()
    }
}

/// Node technology.
///
/// Parsed from free text with case, whitespace and punctuation ignored, so
/// `"R-PHY"`, `" rphy "` and `"RPHY"` are the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Technology {
    Legacy,
    Rphy,
    Vccap,
}

impl Technology {
    /// Canonical display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Legacy => "Legacy",
            Self::Rphy => "RPHY",
            Self::Vccap => "VCCAP",
        }
    }
}

impl FromStr for Technology {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "legacy" => Ok(Self::Legacy),
            "rphy" => Ok(Self::Rphy),
            "vccap" => Ok(Self::Vccap),
            _ => Err(FieldError::InvalidInput(format!(
                "unknown technology '{}'",
                s.trim()
            ))),
        }
    }
}

impl TryFrom<String> for Technology {
    type Error = FieldError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Technology> for String {
    fn from(t: Technology) -> Self {
        t.label().to_string()
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Amplifier operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AmplifierMode {
    Hgd,
    Hgdt,
    Le,
}

/// Port of the upstream node an amplifier hangs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Port {
    Main,
    Aux,
    Bridger,
    Express,
}

impl Port {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::Aux => "AUX",
            Self::Bridger => "BRIDGER",
            Self::Express => "EXPRESS",
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of an amplifier along its port, `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PortIndex(u8);

impl PortIndex {
    /// Lowest valid index.
    pub const MIN: u8 = 1;
    /// Highest valid index.
    pub const MAX: u8 = 4;

    /// Create a port index, rejecting values outside `1..=4`.
    pub fn new(index: u8) -> Result<Self, FieldError> {
        if (Self::MIN..=Self::MAX).contains(&index) {
            Ok(Self(index))
        } else {
            Err(FieldError::InvalidInput(format!(
                "port index must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                index
            )))
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PortIndex {
    type Error = FieldError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl From<PortIndex> for u8 {
    fn from(index: PortIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PortIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category a photo is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PhotoCategory {
    Module,
    Optics,
    Monitoring,
    Spectrum,
}

impl PhotoCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 4] = [Self::Module, Self::Optics, Self::Monitoring, Self::Spectrum];

    /// Lowercase name used in photo file names.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Optics => "optics",
            Self::Monitoring => "monitoring",
            Self::Spectrum => "spectrum",
        }
    }
}

impl fmt::Display for PhotoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Module => "MODULE",
            Self::Optics => "OPTICS",
            Self::Monitoring => "MONITORING",
            Self::Spectrum => "SPECTRUM",
        };
        f.write_str(label)
    }
}

/// Kind of non-powered plant hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassiveKind {
    Tap,
    Splitter,
    Coupler,
    PowerInserter,
    Terminator,
}

impl FromStr for PassiveKind {
    type Err = FieldError;

    /// Accepts the wire names in any case, with `-` or `_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "TAP" => Ok(Self::Tap),
            "SPLITTER" => Ok(Self::Splitter),
            "COUPLER" => Ok(Self::Coupler),
            "POWER_INSERTER" => Ok(Self::PowerInserter),
            "TERMINATOR" => Ok(Self::Terminator),
            _ => Err(FieldError::InvalidInput(format!("unknown passive kind '{}'", s))),
        }
    }
}

// =============================================================================
// STORED RECORDS
// =============================================================================

/// An inspection report. Owns assets and passive observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub name: String,
    /// Node site name, used as the plan lookup key.
    pub node_name: String,
    /// Filesystem-safe folder holding the report's files.
    pub folder_name: String,
    /// Soft-deleted reports stay in storage until purged.
    pub trashed: bool,
}

impl Report {
    /// Build an unsaved report. The id and folder name are assigned on create.
    #[must_use]
    pub fn new(name: impl Into<String>, node_name: impl Into<String>) -> Self {
        Self {
            id: ReportId(0),
            name: name.into(),
            node_name: node_name.into(),
            folder_name: String::new(),
            trashed: false,
        }
    }
}

/// Derive the folder name for a report: a slug of its name plus the id.
///
/// The id suffix keeps folders unique when two reports share a name.
#[must_use]
pub fn report_folder_name(name: &str, id: ReportId) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("report");
    }
    format!("{}-{}", slug, id.0)
}

/// A saved asset. Only drafts that passed validation become assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub report_id: ReportId,
    pub kind: AssetKind,
    pub frequency: Frequency,
    pub technology: Option<Technology>,
    pub amplifier_mode: Option<AmplifierMode>,
    pub port: Option<Port>,
    pub port_index: Option<PortIndex>,
}

impl Asset {
    /// Name of this asset's directory inside its report folder.
    #[must_use]
    pub fn dir_name(&self) -> String {
        format!("{}_{}", self.kind.dir_prefix(), self.id.0)
    }

    /// The amplifier position, when both parts are set.
    #[must_use]
    pub fn position(&self) -> Option<(Port, PortIndex)> {
        self.port.zip(self.port_index)
    }
}

/// Input/output level readings taken while adjusting an amplifier.
///
/// All readings are in dBmV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplifierAdjustment {
    pub input_low_dbmv: Option<f64>,
    pub input_high_dbmv: Option<f64>,
    /// Upper edge of the plan band, 750 or 870 MHz.
    pub input_high_freq_mhz: Option<u16>,
    pub plan_low_dbmv: Option<f64>,
    pub plan_high_dbmv: Option<f64>,
    pub output_ch50_dbmv: Option<f64>,
    pub output_ch70_dbmv: Option<f64>,
    pub output_ch110_dbmv: Option<f64>,
    pub output_ch116_dbmv: Option<f64>,
    pub output_ch136_dbmv: Option<f64>,
}

impl AmplifierAdjustment {
    /// True when every reading is present and the plan band is 750 or 870.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let readings = [
            self.input_low_dbmv,
            self.input_high_dbmv,
            self.plan_low_dbmv,
            self.plan_high_dbmv,
            self.output_ch50_dbmv,
            self.output_ch70_dbmv,
            self.output_ch110_dbmv,
            self.output_ch116_dbmv,
            self.output_ch136_dbmv,
        ];
        readings.iter().all(Option::is_some)
            && self
                .input_high_freq_mhz
                .is_some_and(|mhz| crate::primitives::PLAN_HIGH_FREQUENCIES_MHZ.contains(&mhz))
    }
}

/// Technology-specific confirmations recorded while adjusting a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeAdjustment {
    pub sfp_distance_km: Option<f64>,
    pub direct_power_confirmed: bool,
    pub return_power_confirmed: bool,
    pub spectrum_confirmed: bool,
    pub docsis_confirmed: bool,
    pub tx_1310_confirmed: bool,
    pub tx_1550_confirmed: bool,
    pub power_confirmed: bool,
    pub rx_pad: Option<String>,
    pub measurement_confirmed: bool,
    /// Single confirmation used when the node technology is unknown.
    pub non_legacy_confirmed: bool,
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A stored photo attached to an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub asset_id: AssetId,
    pub category: PhotoCategory,
    pub path: PathBuf,
    pub location: Option<GeoPoint>,
}

/// An observation about passive hardware, independent of asset validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveItem {
    pub id: PassiveId,
    pub report_id: ReportId,
    pub address: String,
    pub kind: PassiveKind,
    pub observation: String,
}

// =============================================================================
// VALIDATION MESSAGES
// =============================================================================

/// The single message shown when an asset cannot be saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMessage {
    NodeAlreadyPresent,
    AmplifierAdjustmentIncomplete,
    NodeAdjustmentIncomplete,
    MissingFieldsOrPhotos,
    DuplicatePort,
}

impl ValidationMessage {
    /// Text shown to the technician.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::NodeAlreadyPresent => "Ya existe un nodo en este reporte",
            Self::AmplifierAdjustmentIncomplete => "Completa el Ajuste de Amplificador",
            Self::NodeAdjustmentIncomplete => "Completa el Ajuste de Nodo",
            Self::MissingFieldsOrPhotos => "Faltan campos o fotos requeridas",
            Self::DuplicatePort => "Ya existe un activo en el mismo puerto e índice",
        }
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the fieldkit core.
///
/// - Validation itself never errors; `Incomplete` only comes from explicit saves
/// - Use `Result<T, FieldError>` for fallible operations
/// - The core should never panic; all errors must be recoverable
#[derive(Debug, Error)]
pub enum FieldError {
    /// The requested report does not exist.
    #[error("Report not found: {0}")]
    ReportNotFound(ReportId),

    /// The requested asset does not exist.
    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    /// The requested photo does not exist.
    #[error("Photo not found: {0}")]
    PhotoNotFound(PhotoId),

    /// The requested passive item does not exist.
    #[error("Passive item not found: {0}")]
    PassiveNotFound(PassiveId),

    /// Another amplifier of the report already sits at this position.
    #[error("Position {port} #{index} is already used by asset {existing}")]
    DuplicatePort {
        port: Port,
        index: PortIndex,
        existing: AssetId,
    },

    /// The report already holds a node asset.
    #[error("Report {0} already has a node")]
    NodeAlreadyPresent(ReportId),

    /// An explicit save was attempted on a draft that is not ready.
    #[error("Asset is not ready: {0}")]
    Incomplete(ValidationMessage),

    /// The photo category is full for this asset.
    #[error("At most {max} {category} photos are allowed")]
    PhotoLimitReached { category: PhotoCategory, max: u8 },

    /// Malformed input from a caller.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for FieldError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn technology_parse_normalizes() {
        assert_eq!("R-PHY".parse::<Technology>().ok(), Some(Technology::Rphy));
        assert_eq!(" vccap ".parse::<Technology>().ok(), Some(Technology::Vccap));
        assert_eq!("LEGACY".parse::<Technology>().ok(), Some(Technology::Legacy));
        assert!("docsis".parse::<Technology>().is_err());
    }

    #[test]
    fn frequency_accepts_only_plan_splits() {
        assert_eq!(Frequency::try_from(42).ok(), Some(Frequency::Mhz42));
        assert_eq!(Frequency::try_from(85).ok(), Some(Frequency::Mhz85));
        assert!(Frequency::try_from(65).is_err());
    }

    #[test]
    fn port_index_bounds() {
        assert!(PortIndex::new(0).is_err());
        assert!(PortIndex::new(1).is_ok());
        assert!(PortIndex::new(4).is_ok());
        assert!(PortIndex::new(5).is_err());
    }

    #[test]
    fn folder_name_is_slugged_and_unique_per_id() {
        assert_eq!(
            report_folder_name("Nodo  Centro / Calle 5", ReportId(7)),
            "nodo-centro-calle-5-7"
        );
        assert_eq!(report_folder_name("###", ReportId(2)), "report-2");
    }

    #[test]
    fn amplifier_adjustment_requires_known_band() {
        let mut adj = AmplifierAdjustment {
            input_low_dbmv: Some(10.0),
            input_high_dbmv: Some(12.0),
            input_high_freq_mhz: Some(750),
            plan_low_dbmv: Some(30.0),
            plan_high_dbmv: Some(42.0),
            output_ch50_dbmv: Some(35.0),
            output_ch70_dbmv: Some(36.0),
            output_ch110_dbmv: Some(38.0),
            output_ch116_dbmv: Some(39.0),
            output_ch136_dbmv: Some(40.0),
        };
        assert!(adj.is_complete());

        adj.input_high_freq_mhz = Some(860);
        assert!(!adj.is_complete());

        adj.input_high_freq_mhz = Some(870);
        adj.output_ch136_dbmv = None;
        assert!(!adj.is_complete());
    }

    #[test]
    fn technology_serde_uses_labels() {
        let json = serde_json::to_string(&Technology::Rphy).expect("serialize");
        assert_eq!(json, "\"RPHY\"");
        let parsed: Technology = serde_json::from_str("\"vccap\"").expect("deserialize");
        assert_eq!(parsed, Technology::Vccap);
    }

    #[test]
    fn passive_kind_parses_loose_names() {
        assert_eq!("power-inserter".parse::<PassiveKind>().ok(), Some(PassiveKind::PowerInserter));
        assert_eq!(" tap ".parse::<PassiveKind>().ok(), Some(PassiveKind::Tap));
        assert!("amplifier".parse::<PassiveKind>().is_err());
    }
}
