//! # Repository
//!
//! The storage contract for reports, assets, adjustments, photos and passive
//! items, with a deterministic in-memory implementation.
//!
//! Ids are allocated from monotonic counters and never reused. Deleting a
//! report or an asset cascades to everything it owns.

use crate::{
    AmplifierAdjustment, Asset, AssetId, FieldError, NodeAdjustment, PassiveId, PassiveItem,
    Photo, PhotoId, Report, ReportId, report_folder_name,
};
use std::collections::BTreeMap;

// =============================================================================
// REPOSITORY TRAIT
// =============================================================================

/// Read/write operations over inspection records.
///
/// All fallible operations return `Result<T, FieldError>` so in-memory and
/// persistent backends are used uniformly. Lists come back in id order.
pub trait Repository {
    /// Store a new report. Its id and folder name are assigned here.
    fn create_report(&mut self, report: Report) -> Result<Report, FieldError>;

    fn get_report(&self, id: ReportId) -> Result<Option<Report>, FieldError>;

    fn list_reports(&self) -> Result<Vec<Report>, FieldError>;

    /// Overwrite an existing report.
    fn update_report(&mut self, report: &Report) -> Result<(), FieldError>;

    /// Permanently delete a report with its assets and passive items.
    fn delete_report(&mut self, id: ReportId) -> Result<(), FieldError>;

    fn get_asset_by_id(&self, id: AssetId) -> Result<Option<Asset>, FieldError>;

    /// Store a new asset. Any id on `asset` is replaced by a fresh one.
    fn add_asset(&mut self, asset: Asset) -> Result<Asset, FieldError>;

    /// Overwrite an existing asset.
    fn update_asset(&mut self, asset: &Asset) -> Result<(), FieldError>;

    /// Permanently delete an asset with its adjustments and photos.
    fn delete_asset(&mut self, id: AssetId) -> Result<(), FieldError>;

    fn list_assets_by_report_id(&self, report: ReportId) -> Result<Vec<Asset>, FieldError>;

    fn get_amplifier_adjustment(
        &self,
        asset: AssetId,
    ) -> Result<Option<AmplifierAdjustment>, FieldError>;

    fn upsert_amplifier_adjustment(
        &mut self,
        asset: AssetId,
        adjustment: &AmplifierAdjustment,
    ) -> Result<(), FieldError>;

    fn get_node_adjustment(&self, asset: AssetId) -> Result<Option<NodeAdjustment>, FieldError>;

    fn upsert_node_adjustment(
        &mut self,
        asset: AssetId,
        adjustment: &NodeAdjustment,
    ) -> Result<(), FieldError>;

    /// Store a new photo. Any id on `photo` is replaced by a fresh one.
    fn insert_photo(&mut self, photo: Photo) -> Result<Photo, FieldError>;

    fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>, FieldError>;

    fn delete_photo(&mut self, id: PhotoId) -> Result<(), FieldError>;

    fn list_photos_by_asset(&self, asset: AssetId) -> Result<Vec<Photo>, FieldError>;

    /// Store a new passive item. Any id on `item` is replaced by a fresh one.
    fn add_passive(&mut self, item: PassiveItem) -> Result<PassiveItem, FieldError>;

    fn delete_passive(&mut self, id: PassiveId) -> Result<(), FieldError>;

    fn list_passives_by_report(&self, report: ReportId) -> Result<Vec<PassiveItem>, FieldError>;
}

// =============================================================================
// IN-MEMORY IMPLEMENTATION
// =============================================================================

/// Volatile repository backed by `BTreeMap`s.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    reports: BTreeMap<ReportId, Report>,
    assets: BTreeMap<AssetId, Asset>,
    amplifier_adjustments: BTreeMap<AssetId, AmplifierAdjustment>,
    node_adjustments: BTreeMap<AssetId, NodeAdjustment>,
    photos: BTreeMap<PhotoId, Photo>,
    passives: BTreeMap<PassiveId, PassiveItem>,
    next_id: u64,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }

    fn purge_asset(&mut self, id: AssetId) {
        self.assets.remove(&id);
        self.amplifier_adjustments.remove(&id);
        self.node_adjustments.remove(&id);
        self.photos.retain(|_, p| p.asset_id != id);
    }
}

impl Repository for MemoryRepository {
    fn create_report(&mut self, mut report: Report) -> Result<Report, FieldError> {
        report.id = ReportId(self.allocate());
        report.folder_name = report_folder_name(&report.name, report.id);
        self.reports.insert(report.id, report.clone());
        Ok(report)
    }

    fn get_report(&self, id: ReportId) -> Result<Option<Report>, FieldError> {
        Ok(self.reports.get(&id).cloned())
    }

    fn list_reports(&self) -> Result<Vec<Report>, FieldError> {
        Ok(self.reports.values().cloned().collect())
    }

    fn update_report(&mut self, report: &Report) -> Result<(), FieldError> {
        let slot = self
            .reports
            .get_mut(&report.id)
            .ok_or(FieldError::ReportNotFound(report.id))?;
        *slot = report.clone();
        Ok(())
    }

    fn delete_report(&mut self, id: ReportId) -> Result<(), FieldError> {
        if self.reports.remove(&id).is_none() {
            return Err(FieldError::ReportNotFound(id));
        }
        let owned: Vec<AssetId> = self
            .assets
            .values()
            .filter(|a| a.report_id == id)
            .map(|a| a.id)
            .collect();
        for asset in owned {
            self.purge_asset(asset);
        }
        self.passives.retain(|_, p| p.report_id != id);
        Ok(())
    }

    fn get_asset_by_id(&self, id: AssetId) -> Result<Option<Asset>, FieldError> {
        Ok(self.assets.get(&id).cloned())
    }

    fn add_asset(&mut self, mut asset: Asset) -> Result<Asset, FieldError> {
        if !self.reports.contains_key(&asset.report_id) {
            return Err(FieldError::ReportNotFound(asset.report_id));
        }
        asset.id = AssetId(self.allocate());
        self.assets.insert(asset.id, asset.clone());
        Ok(asset)
    }

    fn update_asset(&mut self, asset: &Asset) -> Result<(), FieldError> {
        let slot = self
            .assets
            .get_mut(&asset.id)
            .ok_or(FieldError::AssetNotFound(asset.id))?;
        *slot = asset.clone();
        Ok(())
    }

    fn delete_asset(&mut self, id: AssetId) -> Result<(), FieldError> {
        if !self.assets.contains_key(&id) {
            return Err(FieldError::AssetNotFound(id));
        }
        self.purge_asset(id);
        Ok(())
    }

    fn list_assets_by_report_id(&self, report: ReportId) -> Result<Vec<Asset>, FieldError> {
        Ok(self
            .assets
            .values()
            .filter(|a| a.report_id == report)
            .cloned()
            .collect())
    }

    fn get_amplifier_adjustment(
        &self,
        asset: AssetId,
    ) -> Result<Option<AmplifierAdjustment>, FieldError> {
        Ok(self.amplifier_adjustments.get(&asset).cloned())
    }

    fn upsert_amplifier_adjustment(
        &mut self,
        asset: AssetId,
        adjustment: &AmplifierAdjustment,
    ) -> Result<(), FieldError> {
        if !self.assets.contains_key(&asset) {
            return Err(FieldError::AssetNotFound(asset));
        }
        self.amplifier_adjustments.insert(asset, adjustment.clone());
        Ok(())
    }

    fn get_node_adjustment(&self, asset: AssetId) -> Result<Option<NodeAdjustment>, FieldError> {
        Ok(self.node_adjustments.get(&asset).cloned())
    }

    fn upsert_node_adjustment(
        &mut self,
        asset: AssetId,
        adjustment: &NodeAdjustment,
    ) -> Result<(), FieldError> {
        if !self.assets.contains_key(&asset) {
            return Err(FieldError::AssetNotFound(asset));
        }
        self.node_adjustments.insert(asset, adjustment.clone());
        Ok(())
    }

    fn insert_photo(&mut self, mut photo: Photo) -> Result<Photo, FieldError> {
        if !self.assets.contains_key(&photo.asset_id) {
            return Err(FieldError::AssetNotFound(photo.asset_id));
        }
        photo.id = PhotoId(self.allocate());
        self.photos.insert(photo.id, photo.clone());
        Ok(photo)
    }

    fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>, FieldError> {
        Ok(self.photos.get(&id).cloned())
    }

    fn delete_photo(&mut self, id: PhotoId) -> Result<(), FieldError> {
        self.photos
            .remove(&id)
            .map(|_| ())
            .ok_or(FieldError::PhotoNotFound(id))
    }

    fn list_photos_by_asset(&self, asset: AssetId) -> Result<Vec<Photo>, FieldError> {
        Ok(self
            .photos
            .values()
            .filter(|p| p.asset_id == asset)
            .cloned()
            .collect())
    }

    fn add_passive(&mut self, mut item: PassiveItem) -> Result<PassiveItem, FieldError> {
        if !self.reports.contains_key(&item.report_id) {
            return Err(FieldError::ReportNotFound(item.report_id));
        }
        item.id = PassiveId(self.allocate());
        self.passives.insert(item.id, item.clone());
        Ok(item)
    }

    fn delete_passive(&mut self, id: PassiveId) -> Result<(), FieldError> {
        self.passives
            .remove(&id)
            .map(|_| ())
            .ok_or(FieldError::PassiveNotFound(id))
    }

    fn list_passives_by_report(&self, report: ReportId) -> Result<Vec<PassiveItem>, FieldError> {
        Ok(self
            .passives
            .values()
            .filter(|p| p.report_id == report)
            .cloned()
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
