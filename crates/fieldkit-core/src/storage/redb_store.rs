//! # redb-backed Repository
//!
//! A disk-backed repository using the redb embedded database, providing:
//! - ACID transactions (each operation commits once)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Records are stored as postcard bytes keyed by their numeric id. Cascading
//! deletes run inside a single write transaction.

use crate::repository::Repository;
use crate::{
    AmplifierAdjustment, Asset, AssetId, FieldError, NodeAdjustment, PassiveId, PassiveItem,
    Photo, PhotoId, Report, ReportId, report_folder_name,
};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::Path;

type RecordTable = TableDefinition<'static, u64, &'static [u8]>;

/// Table for reports: ReportId -> serialized Report
const REPORTS: RecordTable = TableDefinition::new("reports");

/// Table for assets: AssetId -> serialized Asset
const ASSETS: RecordTable = TableDefinition::new("assets");

/// Table for amplifier adjustments, keyed by AssetId
const AMPLIFIER_ADJUSTMENTS: RecordTable = TableDefinition::new("amplifier_adjustments");

/// Table for node adjustments, keyed by AssetId
const NODE_ADJUSTMENTS: RecordTable = TableDefinition::new("node_adjustments");

/// Table for photos: PhotoId -> serialized Photo
const PHOTOS: RecordTable = TableDefinition::new("photos");

/// Table for passive items: PassiveId -> serialized PassiveItem
const PASSIVES: RecordTable = TableDefinition::new("passives");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_ID_KEY: &str = "next_id";

fn io_err(e: impl std::fmt::Display) -> FieldError {
    FieldError::IoError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, FieldError> {
    postcard::to_allocvec(value).map_err(|e| FieldError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, FieldError> {
    postcard::from_bytes(bytes).map_err(|e| FieldError::DeserializationError(e.to_string()))
}

/// Keys of every record in `table` whose decoded value satisfies `keep`.
fn matching_keys<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    keep: impl Fn(&T) -> bool,
) -> Result<Vec<u64>, FieldError> {
    let mut keys = Vec::new();
    for entry in table.iter().map_err(io_err)? {
        let (key, value) = entry.map_err(io_err)?;
        let record: T = decode(value.value())?;
        if keep(&record) {
            keys.push(key.value());
        }
    }
    Ok(keys)
}

/// A disk-backed repository using redb.
pub struct RedbRepository {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbRepository").finish_non_exhaustive()
    }
}

impl RedbRepository {
    /// Open or create a repository database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FieldError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            for table in [
                REPORTS,
                ASSETS,
                AMPLIFIER_ADJUSTMENTS,
                NODE_ADJUSTMENTS,
                PHOTOS,
                PASSIVES,
            ] {
                let _ = write_txn.open_table(table).map_err(io_err)?;
            }
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), FieldError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, table: RecordTable, key: u64) -> Result<Option<T>, FieldError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let records = read_txn.open_table(table).map_err(io_err)?;
        let value = records.get(key).map_err(io_err)?;
        value.map(|v| decode(v.value())).transpose()
    }

    fn scan<T: DeserializeOwned>(
        &self,
        table: RecordTable,
        keep: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>, FieldError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let records = read_txn.open_table(table).map_err(io_err)?;
        let mut out = Vec::new();
        for entry in records.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            let record: T = decode(value.value())?;
            if keep(&record) {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Allocate an id and store the record built from it, in one transaction.
    ///
    /// When `parent` is given, the insert is rejected with its error unless
    /// the parent key exists.
    fn insert_new<T: Serialize>(
        &mut self,
        table: RecordTable,
        parent: Option<(RecordTable, u64, FieldError)>,
        build: impl FnOnce(u64) -> T,
    ) -> Result<T, FieldError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let record = {
            if let Some((parent_table, parent_key, missing)) = parent {
                let parents = write_txn.open_table(parent_table).map_err(io_err)?;
                if parents.get(parent_key).map_err(io_err)?.is_none() {
                    return Err(missing);
                }
            }

            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            let next_id = meta
                .get(NEXT_ID_KEY)
                .map_err(io_err)?
                .map(|v| v.value())
                .unwrap_or(0)
                .saturating_add(1);
            meta.insert(NEXT_ID_KEY, next_id).map_err(io_err)?;

            let record = build(next_id);
            let bytes = encode(&record)?;
            let mut records = write_txn.open_table(table).map_err(io_err)?;
            records.insert(next_id, bytes.as_slice()).map_err(io_err)?;
            record
        };
        write_txn.commit().map_err(io_err)?;
        Ok(record)
    }

    /// Overwrite `key`, failing with `missing` if it is absent.
    fn replace<T: Serialize>(
        &mut self,
        table: RecordTable,
        key: u64,
        value: &T,
        missing: FieldError,
    ) -> Result<(), FieldError> {
        let bytes = encode(value)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut records = write_txn.open_table(table).map_err(io_err)?;
            if records.get(key).map_err(io_err)?.is_none() {
                return Err(missing);
            }
            records.insert(key, bytes.as_slice()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    /// Write an adjustment for an existing asset.
    fn upsert_adjustment<T: Serialize>(
        &mut self,
        table: RecordTable,
        asset: AssetId,
        value: &T,
    ) -> Result<(), FieldError> {
        let bytes = encode(value)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let assets = write_txn.open_table(ASSETS).map_err(io_err)?;
            if assets.get(asset.0).map_err(io_err)?.is_none() {
                return Err(FieldError::AssetNotFound(asset));
            }
            let mut records = write_txn.open_table(table).map_err(io_err)?;
            records.insert(asset.0, bytes.as_slice()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn remove(&mut self, table: RecordTable, key: u64) -> Result<bool, FieldError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let removed = {
            let mut records = write_txn.open_table(table).map_err(io_err)?;
            let previous = records.remove(key).map_err(io_err)?;
            previous.is_some()
        };
        write_txn.commit().map_err(io_err)?;
        Ok(removed)
    }

    /// Delete assets (and what they own) inside an open write transaction.
    fn purge_assets(
        write_txn: &redb::WriteTransaction,
        asset_ids: &BTreeSet<u64>,
    ) -> Result<(), FieldError> {
        {
            let mut assets = write_txn.open_table(ASSETS).map_err(io_err)?;
            for id in asset_ids {
                assets.remove(*id).map_err(io_err)?;
            }
        }
        for table in [AMPLIFIER_ADJUSTMENTS, NODE_ADJUSTMENTS] {
            let mut adjustments = write_txn.open_table(table).map_err(io_err)?;
            for id in asset_ids {
                adjustments.remove(*id).map_err(io_err)?;
            }
        }
        let mut photos = write_txn.open_table(PHOTOS).map_err(io_err)?;
        let owned = matching_keys::<Photo>(&photos, |p| asset_ids.contains(&p.asset_id.0))?;
        for key in owned {
            photos.remove(key).map_err(io_err)?;
        }
        Ok(())
    }
}

// =============================================================================
// REPOSITORY TRAIT IMPLEMENTATION
// =============================================================================

impl Repository for RedbRepository {
    fn create_report(&mut self, report: Report) -> Result<Report, FieldError> {
        self.insert_new(REPORTS, None, |id| {
            let id = ReportId(id);
            Report {
                id,
                folder_name: report_folder_name(&report.name, id),
                ..report
            }
        })
    }

    fn get_report(&self, id: ReportId) -> Result<Option<Report>, FieldError> {
        self.get(REPORTS, id.0)
    }

    fn list_reports(&self) -> Result<Vec<Report>, FieldError> {
        self.scan(REPORTS, |_: &Report| true)
    }

    fn update_report(&mut self, report: &Report) -> Result<(), FieldError> {
        self.replace(
            REPORTS,
            report.id.0,
            report,
            FieldError::ReportNotFound(report.id),
        )
    }

    fn delete_report(&mut self, id: ReportId) -> Result<(), FieldError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut reports = write_txn.open_table(REPORTS).map_err(io_err)?;
            if reports.remove(id.0).map_err(io_err)?.is_none() {
                return Err(FieldError::ReportNotFound(id));
            }
        }
        let owned: BTreeSet<u64> = {
            let assets = write_txn.open_table(ASSETS).map_err(io_err)?;
            matching_keys::<Asset>(&assets, |a| a.report_id == id)?
                .into_iter()
                .collect()
        };
        Self::purge_assets(&write_txn, &owned)?;
        {
            let mut passives = write_txn.open_table(PASSIVES).map_err(io_err)?;
            let keys = matching_keys::<PassiveItem>(&passives, |p| p.report_id == id)?;
            for key in keys {
                passives.remove(key).map_err(io_err)?;
            }
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn get_asset_by_id(&self, id: AssetId) -> Result<Option<Asset>, FieldError> {
        self.get(ASSETS, id.0)
    }

    fn add_asset(&mut self, asset: Asset) -> Result<Asset, FieldError> {
        let parent = (
            REPORTS,
            asset.report_id.0,
            FieldError::ReportNotFound(asset.report_id),
        );
        self.insert_new(ASSETS, Some(parent), |id| Asset {
            id: AssetId(id),
            ..asset
        })
    }

    fn update_asset(&mut self, asset: &Asset) -> Result<(), FieldError> {
        self.replace(ASSETS, asset.id.0, asset, FieldError::AssetNotFound(asset.id))
    }

    fn delete_asset(&mut self, id: AssetId) -> Result<(), FieldError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let assets = write_txn.open_table(ASSETS).map_err(io_err)?;
            if assets.get(id.0).map_err(io_err)?.is_none() {
                return Err(FieldError::AssetNotFound(id));
            }
        }
        Self::purge_assets(&write_txn, &BTreeSet::from([id.0]))?;
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn list_assets_by_report_id(&self, report: ReportId) -> Result<Vec<Asset>, FieldError> {
        self.scan(ASSETS, |a: &Asset| a.report_id == report)
    }

    fn get_amplifier_adjustment(
        &self,
        asset: AssetId,
    ) -> Result<Option<AmplifierAdjustment>, FieldError> {
        self.get(AMPLIFIER_ADJUSTMENTS, asset.0)
    }

    fn upsert_amplifier_adjustment(
        &mut self,
        asset: AssetId,
        adjustment: &AmplifierAdjustment,
    ) -> Result<(), FieldError> {
        self.upsert_adjustment(AMPLIFIER_ADJUSTMENTS, asset, adjustment)
    }

    fn get_node_adjustment(&self, asset: AssetId) -> Result<Option<NodeAdjustment>, FieldError> {
        self.get(NODE_ADJUSTMENTS, asset.0)
    }

    fn upsert_node_adjustment(
        &mut self,
        asset: AssetId,
        adjustment: &NodeAdjustment,
    ) -> Result<(), FieldError> {
        self.upsert_adjustment(NODE_ADJUSTMENTS, asset, adjustment)
    }

    fn insert_photo(&mut self, photo: Photo) -> Result<Photo, FieldError> {
        let parent = (
            ASSETS,
            photo.asset_id.0,
            FieldError::AssetNotFound(photo.asset_id),
        );
        self.insert_new(PHOTOS, Some(parent), |id| Photo {
            id: PhotoId(id),
            ..photo
        })
    }

    fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>, FieldError> {
        self.get(PHOTOS, id.0)
    }

    fn delete_photo(&mut self, id: PhotoId) -> Result<(), FieldError> {
        if self.remove(PHOTOS, id.0)? {
            Ok(())
        } else {
            Err(FieldError::PhotoNotFound(id))
        }
    }

    fn list_photos_by_asset(&self, asset: AssetId) -> Result<Vec<Photo>, FieldError> {
        self.scan(PHOTOS, |p: &Photo| p.asset_id == asset)
    }

    fn add_passive(&mut self, item: PassiveItem) -> Result<PassiveItem, FieldError> {
        let parent = (
            REPORTS,
            item.report_id.0,
            FieldError::ReportNotFound(item.report_id),
        );
        self.insert_new(PASSIVES, Some(parent), |id| PassiveItem {
            id: PassiveId(id),
            ..item
        })
    }

    fn delete_passive(&mut self, id: PassiveId) -> Result<(), FieldError> {
        if self.remove(PASSIVES, id.0)? {
            Ok(())
        } else {
            Err(FieldError::PassiveNotFound(id))
        }
    }

    fn list_passives_by_report(&self, report: ReportId) -> Result<Vec<PassiveItem>, FieldError> {
        self.scan(PASSIVES, |p: &PassiveItem| p.report_id == report)
    }
}

// =============================================================================
// TESTS
// =============================================================================
