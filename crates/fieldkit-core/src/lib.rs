//! # fieldkit-core
//!
//! The inspection engine for fieldkit - THE RULES.
//!
//! Technicians record cable-network assets (nodes and amplifiers), their
//! adjustment measurements and photos. This crate decides when such a
//! record is complete, saves it as soon as it is, and keeps the records and
//! files in order.
//!
//! ## Layers
//!
//! - `validation`: pure decision table, never fails
//! - `draft` / `photos` / `plan`: the inputs it reads
//! - `repository` / `storage` / `files`: injected persistence
//! - `workspace` / `autosave` / `export`: the operations built on top
//!
//! ## Architectural Constraints
//!
//! - Synchronous, single-threaded; callers serialize access
//! - Has NO async, NO network dependencies (pure Rust)
//! - BTreeMap only, so listings and exports are deterministic

// =============================================================================
// MODULES
// =============================================================================

pub mod autosave;
pub mod draft;
pub mod export;
pub mod files;
pub mod photos;
pub mod plan;
pub mod primitives;
pub mod repository;
pub mod storage;
pub mod types;
pub mod validation;
pub mod workspace;

// =============================================================================
// RE-EXPORTS: Domain Types (from types module)
// =============================================================================

pub use types::{
    AmplifierAdjustment, AmplifierMode, Asset, AssetId, AssetKind, FieldError, Frequency,
    GeoPoint, NodeAdjustment, PassiveId, PassiveItem, PassiveKind, Photo, PhotoCategory, PhotoId,
    Port, PortIndex, Report, ReportId, Technology, ValidationMessage, report_folder_name,
};

// =============================================================================
// RE-EXPORTS: Rules
// =============================================================================

pub use draft::{AssetDraft, StagedPhoto};
pub use photos::{PhotoCounts, PhotoRequirement, photos_satisfied, requirement};
pub use plan::{PlanRow, PlanTable};
pub use validation::{
    Checks, Evaluation, ValidationContext, check_explicit_save, evaluate, resolve_technology,
};

// =============================================================================
// RE-EXPORTS: Storage & Operations
// =============================================================================

pub use autosave::{AUTOSAVE_FAILED_MESSAGE, AutosaveOutcome, AutosaveTrigger};
pub use export::{ExportDocument, ExportedAsset, ReportBundle, export_json, export_report, verify_export};
pub use files::FileStore;
pub use repository::{MemoryRepository, Repository};
pub use storage::RedbRepository;
pub use workspace::{SavedAsset, StorageBackend, Workspace, WorkspaceStatus};
