//! # Workspace
//!
//! High-level entry point combining a [`Repository`] backend, an optional
//! [`FileStore`] and the loaded [`PlanTable`]. All three are injected; the
//! workspace holds no global state.
//!
//! ## Storage Backends
//!
//! - `InMemory`: [`MemoryRepository`] (fast, volatile)
//! - `Persistent`: [`RedbRepository`] for disk-backed ACID storage
//!
//! Without a file store, photos are recorded with a relative path and no
//! bytes are written.

use crate::draft::{AssetDraft, StagedPhoto};
use crate::files::FileStore;
use crate::photos::{PhotoCounts, requirement};
use crate::plan::{PlanRow, PlanTable};
use crate::primitives::{MAX_NAME_LENGTH, MAX_OBSERVATION_LENGTH, MAX_PHOTO_BYTES};
use crate::repository::{MemoryRepository, Repository};
use crate::storage::RedbRepository;
use crate::validation::{
    Evaluation, ValidationContext, check_explicit_save, evaluate, find_port_conflict,
    resolve_technology,
};
use crate::{
    Asset, AssetId, AssetKind, FieldError, GeoPoint, PassiveId, PassiveItem, PassiveKind, Photo,
    PhotoCategory, PhotoId, Report, ReportId,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage backend for a Workspace.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory maps (fast, volatile).
    InMemory(MemoryRepository),
    /// Disk-backed tables using redb (ACID, persistent).
    Persistent(RedbRepository),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryRepository::new())
    }
}

impl StorageBackend {
    fn as_repo(&self) -> &dyn Repository {
        match self {
            Self::InMemory(repo) => repo,
            Self::Persistent(repo) => repo,
        }
    }

    fn as_repo_mut(&mut self) -> &mut dyn Repository {
        match self {
            Self::InMemory(repo) => repo,
            Self::Persistent(repo) => repo,
        }
    }
}

/// Result of persisting a ready draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAsset {
    pub asset: Asset,
    /// True when this save created the asset.
    pub created: bool,
    pub evaluation: Evaluation,
}

/// Counters reported by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceStatus {
    pub reports: usize,
    pub trashed_reports: usize,
    pub assets: usize,
    pub photos: usize,
    pub passives: usize,
    pub plan_rows: usize,
    pub persistent: bool,
}

/// Repository, files and plan behind one API.
#[derive(Debug, Default)]
pub struct Workspace {
    backend: StorageBackend,
    files: Option<FileStore>,
    plan: PlanTable,
}

impl Workspace {
    /// Create an empty in-memory workspace without file storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or create) a redb database at `path`.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, FieldError> {
        Ok(Self::with_backend(StorageBackend::Persistent(
            RedbRepository::open(path)?,
        )))
    }

    #[must_use]
    pub fn with_backend(backend: StorageBackend) -> Self {
        Self {
            backend,
            files: None,
            plan: PlanTable::new(),
        }
    }

    /// Attach file storage.
    #[must_use]
    pub fn with_files(mut self, files: FileStore) -> Self {
        self.files = Some(files);
        self
    }

    /// Attach a plan table.
    #[must_use]
    pub fn with_plan(mut self, plan: PlanTable) -> Self {
        self.plan = plan;
        self
    }

    /// Replace the loaded plan table.
    pub fn set_plan(&mut self, plan: PlanTable) {
        self.plan = plan;
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    #[must_use]
    pub fn repo(&self) -> &dyn Repository {
        self.backend.as_repo()
    }

    pub fn repo_mut(&mut self) -> &mut dyn Repository {
        self.backend.as_repo_mut()
    }

    #[must_use]
    pub fn files(&self) -> Option<&FileStore> {
        self.files.as_ref()
    }

    #[must_use]
    pub fn plan(&self) -> &PlanTable {
        &self.plan
    }

    // =========================================================================
    // REPORTS
    // =========================================================================

    /// Create a report. Both names must be non-blank and not too long.
    pub fn create_report(&mut self, name: &str, node_name: &str) -> Result<Report, FieldError> {
        let name = checked_text("report name", name, MAX_NAME_LENGTH, false)?;
        let node_name = checked_text("node name", node_name, MAX_NAME_LENGTH, false)?;
        let report = self.repo_mut().create_report(Report::new(name, node_name))?;
        tracing::info!(report = %report.id, folder = %report.folder_name, "Report created");
        Ok(report)
    }

    /// Fetch a report or fail with `ReportNotFound`.
    pub fn report(&self, id: ReportId) -> Result<Report, FieldError> {
        self.repo()
            .get_report(id)?
            .ok_or(FieldError::ReportNotFound(id))
    }

    /// Reports in or out of the trash.
    pub fn list_reports(&self, trashed: bool) -> Result<Vec<Report>, FieldError> {
        Ok(self
            .repo()
            .list_reports()?
            .into_iter()
            .filter(|r| r.trashed == trashed)
            .collect())
    }

    pub fn trash_report(&mut self, id: ReportId) -> Result<Report, FieldError> {
        self.set_trashed(id, true)
    }

    pub fn restore_report(&mut self, id: ReportId) -> Result<Report, FieldError> {
        self.set_trashed(id, false)
    }

    fn set_trashed(&mut self, id: ReportId, trashed: bool) -> Result<Report, FieldError> {
        let mut report = self.report(id)?;
        report.trashed = trashed;
        self.repo_mut().update_report(&report)?;
        Ok(report)
    }

    /// Permanently delete a report with its records and folder.
    pub fn purge_report(&mut self, id: ReportId) -> Result<(), FieldError> {
        let report = self.report(id)?;
        self.repo_mut().delete_report(id)?;
        if let Some(files) = &self.files {
            files.remove_report_dir(&report)?;
        }
        tracing::info!(report = %id, "Report purged");
        Ok(())
    }

    /// Plan row for the report's node, if the plan lists it.
    #[must_use]
    pub fn plan_row_for(&self, report: &Report) -> Option<&PlanRow> {
        self.plan.lookup(&report.node_name)
    }

    // =========================================================================
    // ASSETS
    // =========================================================================

    pub fn assets(&self, report: ReportId) -> Result<Vec<Asset>, FieldError> {
        self.repo().list_assets_by_report_id(report)
    }

    pub fn asset(&self, id: AssetId) -> Result<Asset, FieldError> {
        self.repo()
            .get_asset_by_id(id)?
            .ok_or(FieldError::AssetNotFound(id))
    }

    fn stored_photos(&self, draft: &AssetDraft) -> Result<Vec<Photo>, FieldError> {
        match draft.id {
            Some(id) => self.repo().list_photos_by_asset(id),
            None => Ok(Vec::new()),
        }
    }

    /// Run the completeness validator against the draft's current report.
    pub fn evaluate_draft(&self, draft: &AssetDraft) -> Result<Evaluation, FieldError> {
        let report = self.report(draft.report_id)?;
        let siblings = self.assets(report.id)?;
        let photos = PhotoCounts::for_draft(&self.stored_photos(draft)?, draft);
        Ok(evaluate(
            draft,
            &ValidationContext {
                siblings: &siblings,
                plan_row: self.plan_row_for(&report),
                photos,
            },
        ))
    }

    /// Another amplifier of the draft's report at the same position, if any.
    pub fn port_conflict(&self, draft: &AssetDraft) -> Result<Option<Asset>, FieldError> {
        let siblings = self.assets(draft.report_id)?;
        Ok(find_port_conflict(draft, &siblings).cloned())
    }

    /// Explicit save: validate strictly, then persist.
    ///
    /// Fails with `NodeAlreadyPresent`, `DuplicatePort` or `Incomplete`
    /// before anything is written.
    pub fn save_asset(&mut self, draft: &mut AssetDraft) -> Result<SavedAsset, FieldError> {
        self.check_draft_identity(draft)?;
        let report = self.report(draft.report_id)?;
        let siblings = self.assets(report.id)?;
        let photos = PhotoCounts::for_draft(&self.stored_photos(draft)?, draft);
        let evaluation = check_explicit_save(
            draft,
            &ValidationContext {
                siblings: &siblings,
                plan_row: self.plan_row_for(&report),
                photos,
            },
        )?;
        self.persist_draft(draft, evaluation)
    }

    /// Write a ready draft: create or update the asset, upsert the adjustment
    /// matching its kind, adopt staged photos and ensure the asset directory.
    ///
    /// On success the draft carries the asset id and has no staged photos.
    pub fn persist_draft(
        &mut self,
        draft: &mut AssetDraft,
        evaluation: Evaluation,
    ) -> Result<SavedAsset, FieldError> {
        self.check_draft_identity(draft)?;
        let report = self.report(draft.report_id)?;
        let missing_frequency = || FieldError::InvalidInput("frequency is required".to_string());

        let (asset, created) = match draft.id {
            Some(id) => {
                let asset = draft
                    .to_asset(id, evaluation.technology)
                    .ok_or_else(missing_frequency)?;
                self.repo_mut().update_asset(&asset)?;
                (asset, false)
            }
            None => {
                let asset = draft
                    .to_asset(AssetId(0), evaluation.technology)
                    .ok_or_else(missing_frequency)?;
                let asset = self.repo_mut().add_asset(asset)?;
                draft.id = Some(asset.id);
                (asset, true)
            }
        };

        match asset.kind {
            AssetKind::Amplifier => self
                .repo_mut()
                .upsert_amplifier_adjustment(asset.id, &draft.amplifier_adjustment)?,
            AssetKind::Node => self
                .repo_mut()
                .upsert_node_adjustment(asset.id, &draft.node_adjustment)?,
        }

        if let Some(files) = &self.files {
            files.ensure_asset_dir(&report, &asset)?;
        }

        let mut pending = std::mem::take(&mut draft.staged_photos).into_iter();
        while let Some(staged) = pending.next() {
            if let Err(e) = self.adopt_staged(&report, &asset, &staged) {
                draft.staged_photos.push(staged);
                draft.staged_photos.extend(pending);
                return Err(e);
            }
        }

        tracing::debug!(asset = %asset.id, created, "Asset persisted");
        Ok(SavedAsset {
            asset,
            created,
            evaluation,
        })
    }

    /// An editing draft must keep the report and kind of its stored asset.
    fn check_draft_identity(&self, draft: &AssetDraft) -> Result<(), FieldError> {
        let Some(id) = draft.id else {
            return Ok(());
        };
        let stored = self.asset(id)?;
        if stored.report_id != draft.report_id {
            return Err(FieldError::InvalidInput(format!(
                "asset {} belongs to report {}, not {}",
                id, stored.report_id, draft.report_id
            )));
        }
        if stored.kind != draft.kind {
            return Err(FieldError::InvalidInput(format!(
                "asset {} is a {}, cannot become a {}",
                id, stored.kind, draft.kind
            )));
        }
        Ok(())
    }

    fn adopt_staged(
        &mut self,
        report: &Report,
        asset: &Asset,
        staged: &StagedPhoto,
    ) -> Result<Photo, FieldError> {
        let (path, location) = match &self.files {
            Some(files) => {
                let (path, sidecar) =
                    files.adopt_staged(report, asset, staged.category, &staged.path)?;
                (path, staged.location.or(sidecar))
            }
            None => (staged.path.clone(), staged.location),
        };
        self.repo_mut().insert_photo(Photo {
            id: PhotoId(0),
            asset_id: asset.id,
            category: staged.category,
            path,
            location,
        })
    }

    /// Reopen a saved asset as an editing draft.
    pub fn load_draft(&self, id: AssetId) -> Result<AssetDraft, FieldError> {
        let asset = self.asset(id)?;
        let amplifier = self.repo().get_amplifier_adjustment(id)?;
        let node = self.repo().get_node_adjustment(id)?;
        Ok(AssetDraft::from_saved(&asset, amplifier, node))
    }

    /// Permanently delete an asset, its records and its directory.
    pub fn delete_asset(&mut self, id: AssetId) -> Result<(), FieldError> {
        let asset = self.asset(id)?;
        let report = self.report(asset.report_id)?;
        self.repo_mut().delete_asset(id)?;
        if let Some(files) = &self.files {
            files.remove_asset_dir(&report, &asset)?;
        }
        tracing::info!(asset = %id, "Asset deleted");
        Ok(())
    }

    // =========================================================================
    // PHOTOS
    // =========================================================================

    /// Attach a photo to a saved asset.
    ///
    /// Rejected with `PhotoLimitReached` once the category is full.
    pub fn add_photo(
        &mut self,
        asset_id: AssetId,
        category: PhotoCategory,
        bytes: &[u8],
        location: Option<GeoPoint>,
    ) -> Result<Photo, FieldError> {
        check_photo_size(bytes)?;
        let asset = self.asset(asset_id)?;
        let report = self.report(asset.report_id)?;
        let stored = self.repo().list_photos_by_asset(asset_id)?;
        let count = stored.iter().filter(|p| p.category == category).count();

        let req = requirement(asset.kind, asset.technology, category);
        if !req.accepts_another(count) {
            return Err(FieldError::PhotoLimitReached {
                category,
                max: req.max,
            });
        }

        let (path, location) = match &self.files {
            Some(files) => {
                let path = files.write_photo(&report, &asset, category, bytes)?;
                if let Some(point) = &location {
                    files.write_location(&path, point)?;
                }
                (path, location)
            }
            None => {
                let taken: Vec<&Path> = stored.iter().map(|p| p.path.as_path()).collect();
                let path = virtual_photo_path(Path::new(&asset.dir_name()), category, &taken);
                (path, location)
            }
        };

        self.repo_mut().insert_photo(Photo {
            id: PhotoId(0),
            asset_id,
            category,
            path,
            location,
        })
    }

    /// Stage a photo on an unsaved draft.
    ///
    /// The per-category maximum counts staged photos too.
    pub fn stage_photo(
        &self,
        session: u64,
        draft: &mut AssetDraft,
        category: PhotoCategory,
        bytes: &[u8],
        location: Option<GeoPoint>,
    ) -> Result<StagedPhoto, FieldError> {
        check_photo_size(bytes)?;
        let report = self.report(draft.report_id)?;
        let technology = match draft.kind {
            AssetKind::Node => resolve_technology(draft, self.plan_row_for(&report)),
            AssetKind::Amplifier => None,
        };
        let count = PhotoCounts::for_draft(&self.stored_photos(draft)?, draft).get(category);

        let req = requirement(draft.kind, technology, category);
        if !req.accepts_another(count) {
            return Err(FieldError::PhotoLimitReached {
                category,
                max: req.max,
            });
        }

        let path = match &self.files {
            Some(files) => {
                let path = files.stage_photo(session, category, bytes)?;
                if let Some(point) = &location {
                    files.write_location(&path, point)?;
                }
                path
            }
            None => {
                let taken: Vec<&Path> = draft
                    .staged_photos
                    .iter()
                    .map(|p| p.path.as_path())
                    .collect();
                let dir = PathBuf::from(format!("session_{}", session));
                virtual_photo_path(&dir, category, &taken)
            }
        };

        let staged = StagedPhoto {
            category,
            path,
            location,
        };
        draft.staged_photos.push(staged.clone());
        Ok(staged)
    }

    /// Remove whatever a draft session staged on disk.
    pub fn discard_staging(&self, session: u64) -> Result<(), FieldError> {
        match &self.files {
            Some(files) => files.discard_staging(session),
            None => Ok(()),
        }
    }

    pub fn photos(&self, asset: AssetId) -> Result<Vec<Photo>, FieldError> {
        self.repo().list_photos_by_asset(asset)
    }

    /// Delete a photo record and its file.
    pub fn remove_photo(&mut self, id: PhotoId) -> Result<(), FieldError> {
        let photo = self
            .repo()
            .get_photo(id)?
            .ok_or(FieldError::PhotoNotFound(id))?;
        self.repo_mut().delete_photo(id)?;
        if let Some(files) = &self.files {
            files.remove_photo(&photo.path)?;
        }
        Ok(())
    }

    // =========================================================================
    // PASSIVES
    // =========================================================================

    pub fn add_passive(
        &mut self,
        report: ReportId,
        address: &str,
        kind: PassiveKind,
        observation: &str,
    ) -> Result<PassiveItem, FieldError> {
        let address = checked_text("address", address, MAX_NAME_LENGTH, false)?;
        let observation = checked_text("observation", observation, MAX_OBSERVATION_LENGTH, true)?;
        self.repo_mut().add_passive(PassiveItem {
            id: PassiveId(0),
            report_id: report,
            address,
            kind,
            observation,
        })
    }

    pub fn passives(&self, report: ReportId) -> Result<Vec<PassiveItem>, FieldError> {
        self.repo().list_passives_by_report(report)
    }

    pub fn delete_passive(&mut self, id: PassiveId) -> Result<(), FieldError> {
        self.repo_mut().delete_passive(id)
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    pub fn status(&self) -> Result<WorkspaceStatus, FieldError> {
        let reports = self.repo().list_reports()?;
        let mut status = WorkspaceStatus {
            reports: 0,
            trashed_reports: 0,
            assets: 0,
            photos: 0,
            passives: 0,
            plan_rows: self.plan.len(),
            persistent: self.is_persistent(),
        };
        for report in &reports {
            if report.trashed {
                status.trashed_reports += 1;
            } else {
                status.reports += 1;
            }
            let assets = self.assets(report.id)?;
            for asset in &assets {
                status.photos += self.photos(asset.id)?.len();
            }
            status.assets += assets.len();
            status.passives += self.passives(report.id)?.len();
        }
        Ok(status)
    }
}

fn checked_text(
    field: &str,
    value: &str,
    max: usize,
    allow_empty: bool,
) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if !allow_empty && trimmed.is_empty() {
        return Err(FieldError::InvalidInput(format!("{} must not be empty", field)));
    }
    if trimmed.len() > max {
        return Err(FieldError::InvalidInput(format!(
            "{} exceeds {} bytes",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

fn check_photo_size(bytes: &[u8]) -> Result<(), FieldError> {
    if bytes.is_empty() {
        return Err(FieldError::InvalidInput("photo is empty".to_string()));
    }
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(FieldError::InvalidInput(format!(
            "photo exceeds {} bytes",
            MAX_PHOTO_BYTES
        )));
    }
    Ok(())
}

/// First `<dir>/<category>_<n>.jpg` not among `taken`.
fn virtual_photo_path(dir: &Path, category: PhotoCategory, taken: &[&Path]) -> PathBuf {
    let mut n: u32 = 1;
    loop {
        let candidate = dir.join(format!("{}_{}.jpg", category.file_stem(), n));
        if !taken.contains(&candidate.as_path()) {
            return candidate;
        }
        n = n.saturating_add(1);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Frequency, Technology, ValidationMessage};
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn rphy_node(report: ReportId) -> AssetDraft {
        let mut draft = AssetDraft::new(report, AssetKind::Node);
        draft.frequency = Some(Frequency::Mhz42);
        draft.technology = Some(Technology::Rphy);
        draft.node_adjustment.sfp_distance_km = Some(1.2);
        draft.node_adjustment.direct_power_confirmed = true;
        draft.node_adjustment.return_power_confirmed = true;
        draft
    }

    #[test]
    fn create_report_rejects_blank_names() {
        let mut ws = Workspace::new();
        assert!(matches!(
            ws.create_report("  ", "N1"),
            Err(FieldError::InvalidInput(_))
        ));
        let report = ws.create_report(" Centro ", "N1").expect("create");
        assert_eq!(report.name, "Centro");
    }

    #[test]
    fn trash_and_restore_move_between_lists() {
        let mut ws = Workspace::new();
        let report = ws.create_report("A", "N1").expect("create");
        ws.trash_report(report.id).expect("trash");
        assert!(ws.list_reports(false).expect("list").is_empty());
        assert_eq!(ws.list_reports(true).expect("list").len(), 1);
        ws.restore_report(report.id).expect("restore");
        assert_eq!(ws.list_reports(false).expect("list").len(), 1);
    }

    #[test]
    fn save_then_reload_round_trips_adjustment() {
        let mut ws = Workspace::new();
        let report = ws.create_report("A", "N1").expect("create");
        let mut draft = rphy_node(report.id);
        let saved = ws.save_asset(&mut draft).expect("save");
        assert!(saved.created);

        let reloaded = ws.load_draft(saved.asset.id).expect("load");
        assert_eq!(reloaded.node_adjustment, draft.node_adjustment);
        assert_eq!(reloaded.id, Some(saved.asset.id));

        let again = ws.save_asset(&mut draft).expect("update");
        assert!(!again.created);
        assert_eq!(ws.assets(report.id).expect("assets").len(), 1);
    }

    #[test]
    fn incomplete_save_writes_nothing() {
        let mut ws = Workspace::new();
        let report = ws.create_report("A", "N1").expect("create");
        let mut draft = rphy_node(report.id);
        draft.frequency = None;
        let result = ws.save_asset(&mut draft);
        assert!(matches!(
            result,
            Err(FieldError::Incomplete(ValidationMessage::MissingFieldsOrPhotos))
        ));
        assert!(ws.assets(report.id).expect("assets").is_empty());
    }

    #[test]
    fn photo_limit_is_enforced() {
        let mut ws = Workspace::new();
        let report = ws.create_report("A", "N1").expect("create");
        let mut draft = rphy_node(report.id);
        let saved = ws.save_asset(&mut draft).expect("save");

        for _ in 0..2 {
            ws.add_photo(saved.asset.id, PhotoCategory::Optics, b"x", None)
                .expect("photo");
        }
        let third = ws.add_photo(saved.asset.id, PhotoCategory::Optics, b"x", None);
        assert!(matches!(
            third,
            Err(FieldError::PhotoLimitReached { max: 2, .. })
        ));
    }

    #[test]
    fn staged_photos_are_adopted_on_save() {
        let dir = tempdir().expect("tempdir");
        let mut ws = Workspace::new().with_files(FileStore::new(dir.path()));
        let report = ws.create_report("Centro", "N1").expect("create");
        let mut draft = rphy_node(report.id);

        ws.stage_photo(7, &mut draft, PhotoCategory::Module, b"jpeg", None)
            .expect("stage");
        let saved = ws.save_asset(&mut draft).expect("save");

        assert!(draft.staged_photos.is_empty());
        let photos = ws.photos(saved.asset.id).expect("photos");
        assert_eq!(photos.len(), 1);
        assert!(photos[0].path.exists());
        assert!(
            ws.files()
                .expect("files")
                .asset_dir(&report, &saved.asset)
                .is_dir()
        );
    }

    #[test]
    fn purge_removes_records_and_folder() {
        let dir = tempdir().expect("tempdir");
        let mut ws = Workspace::new().with_files(FileStore::new(dir.path()));
        let report = ws.create_report("Centro", "N1").expect("create");
        let mut draft = rphy_node(report.id);
        let saved = ws.save_asset(&mut draft).expect("save");
        ws.add_photo(saved.asset.id, PhotoCategory::Module, b"jpeg", None)
            .expect("photo");
        ws.add_passive(report.id, "Calle 1", PassiveKind::Tap, "")
            .expect("passive");

        let folder = ws.files().expect("files").report_dir(&report);
        assert!(folder.is_dir());

        ws.purge_report(report.id).expect("purge");
        assert!(!folder.exists());
        let status = ws.status().expect("status");
        assert_eq!(status.reports + status.assets + status.photos + status.passives, 0);
    }

    #[test]
    fn photo_without_location_is_not_delayed() {
        let dir = tempdir().expect("tempdir");
        let mut ws = Workspace::new().with_files(FileStore::new(dir.path()));
        let report = ws.create_report("Centro", "N1").expect("create");
        let mut draft = rphy_node(report.id);
        let saved = ws.save_asset(&mut draft).expect("save");

        let started = Instant::now();
        let photo = ws
            .add_photo(saved.asset.id, PhotoCategory::Module, b"jpeg", None)
            .expect("photo");
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(photo.location, None);

        let other = ws.create_report("Sur", "N2").expect("create");
        let mut staged = rphy_node(other.id);
        ws.stage_photo(3, &mut staged, PhotoCategory::Optics, b"jpeg", None)
            .expect("stage");
        let started = Instant::now();
        let saved_b = ws.save_asset(&mut staged).expect("save");
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(ws.photos(saved_b.asset.id).expect("photos").len(), 1);
    }

    #[test]
    fn location_is_kept_with_photo() {
        let dir = tempdir().expect("tempdir");
        let mut ws = Workspace::new().with_files(FileStore::new(dir.path()));
        let report = ws.create_report("Centro", "N1").expect("create");
        let point = GeoPoint {
            latitude: -34.6,
            longitude: -58.4,
        };
        let mut draft = rphy_node(report.id);
        ws.stage_photo(4, &mut draft, PhotoCategory::Module, b"jpeg", Some(point))
            .expect("stage");
        let saved = ws.save_asset(&mut draft).expect("save");

        let photos = ws.photos(saved.asset.id).expect("photos");
        assert_eq!(photos[0].location, Some(point));
    }

    #[test]
    fn edit_draft_cannot_move_asset_to_another_report() {
        let mut ws = Workspace::new();
        let first = ws.create_report("A", "N1").expect("create");
        let second = ws.create_report("B", "N2").expect("create");
        let mut draft = rphy_node(first.id);
        let saved = ws.save_asset(&mut draft).expect("save");

        let mut moved = draft.clone();
        moved.report_id = second.id;
        assert!(matches!(
            ws.save_asset(&mut moved),
            Err(FieldError::InvalidInput(_))
        ));
        assert!(matches!(
            ws.persist_draft(&mut moved, saved.evaluation),
            Err(FieldError::InvalidInput(_))
        ));
        assert_eq!(ws.assets(first.id).expect("assets").len(), 1);
        assert!(ws.assets(second.id).expect("assets").is_empty());
    }

    #[test]
    fn edit_draft_cannot_change_kind() {
        let mut ws = Workspace::new();
        let report = ws.create_report("A", "N1").expect("create");
        let mut draft = rphy_node(report.id);
        let saved = ws.save_asset(&mut draft).expect("save");

        let mut changed = draft.clone();
        changed.kind = AssetKind::Amplifier;
        assert!(matches!(
            ws.save_asset(&mut changed),
            Err(FieldError::InvalidInput(_))
        ));
        assert_eq!(ws.asset(saved.asset.id).expect("asset").kind, AssetKind::Node);
        assert!(
            ws.repo()
                .get_node_adjustment(saved.asset.id)
                .expect("adjustment")
                .is_some()
        );
    }

    #[test]
    fn virtual_paths_stay_unique_after_delete() {
        let mut ws = Workspace::new();
        let report = ws.create_report("A", "N1").expect("create");
        let mut draft = rphy_node(report.id);
        let saved = ws.save_asset(&mut draft).expect("save");
        let asset = saved.asset.id;

        let first = ws
            .add_photo(asset, PhotoCategory::Module, b"x", None)
            .expect("photo");
        let second = ws
            .add_photo(asset, PhotoCategory::Module, b"x", None)
            .expect("photo");
        ws.remove_photo(first.id).expect("remove");
        let third = ws
            .add_photo(asset, PhotoCategory::Module, b"x", None)
            .expect("photo");

        assert_ne!(third.path, second.path);
        assert_eq!(third.path, first.path);
    }

    #[test]
    fn remove_photo_deletes_record() {
        let mut ws = Workspace::new();
        let report = ws.create_report("A", "N1").expect("create");
        let mut draft = rphy_node(report.id);
        let saved = ws.save_asset(&mut draft).expect("save");
        let photo = ws
            .add_photo(saved.asset.id, PhotoCategory::Spectrum, b"x", None)
            .expect("photo");
        ws.remove_photo(photo.id).expect("remove");
        assert!(matches!(
            ws.remove_photo(photo.id),
            Err(FieldError::PhotoNotFound(_))
        ));
    }
}
