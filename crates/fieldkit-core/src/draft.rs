//! # Asset Form State
//!
//! The in-memory, possibly incomplete asset a technician is filling in.
//! A draft carries everything the completeness rules look at: the chosen
//! fields, both adjustment sub-records and photos captured before the asset
//! was first saved.

use crate::{
    AmplifierAdjustment, AmplifierMode, Asset, AssetId, AssetKind, Frequency, GeoPoint,
    NodeAdjustment, PhotoCategory, Port, PortIndex, ReportId, Technology,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A photo captured for a draft whose asset does not exist yet.
///
/// Staged photos live under the storage staging area and are moved into the
/// asset folder on the first successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedPhoto {
    pub category: PhotoCategory,
    pub path: PathBuf,
    pub location: Option<GeoPoint>,
}

/// Editable asset state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDraft {
    /// Set once the draft has been saved; editing drafts always carry it.
    #[serde(default)]
    pub id: Option<AssetId>,
    pub report_id: ReportId,
    pub kind: AssetKind,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub technology: Option<Technology>,
    #[serde(default)]
    pub amplifier_mode: Option<AmplifierMode>,
    #[serde(default)]
    pub port: Option<Port>,
    #[serde(default)]
    pub port_index: Option<PortIndex>,
    #[serde(default)]
    pub amplifier_adjustment: AmplifierAdjustment,
    #[serde(default)]
    pub node_adjustment: NodeAdjustment,
    #[serde(default)]
    pub staged_photos: Vec<StagedPhoto>,
}

impl AssetDraft {
    /// Start an empty draft of the given kind.
    #[must_use]
    pub fn new(report_id: ReportId, kind: AssetKind) -> Self {
        Self {
            id: None,
            report_id,
            kind,
            frequency: None,
            technology: None,
            amplifier_mode: None,
            port: None,
            port_index: None,
            amplifier_adjustment: AmplifierAdjustment::default(),
            node_adjustment: NodeAdjustment::default(),
            staged_photos: Vec::new(),
        }
    }

    /// Reopen a saved asset for editing.
    #[must_use]
    pub fn from_saved(
        asset: &Asset,
        amplifier_adjustment: Option<AmplifierAdjustment>,
        node_adjustment: Option<NodeAdjustment>,
    ) -> Self {
        Self {
            id: Some(asset.id),
            report_id: asset.report_id,
            kind: asset.kind,
            frequency: Some(asset.frequency),
            technology: asset.technology,
            amplifier_mode: asset.amplifier_mode,
            port: asset.port,
            port_index: asset.port_index,
            amplifier_adjustment: amplifier_adjustment.unwrap_or_default(),
            node_adjustment: node_adjustment.unwrap_or_default(),
            staged_photos: Vec::new(),
        }
    }

    /// Whether this draft edits an already saved asset.
    #[must_use]
    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    /// The amplifier position, when both parts are chosen.
    #[must_use]
    pub fn position(&self) -> Option<(Port, PortIndex)> {
        self.port.zip(self.port_index)
    }

    /// Number of staged photos in a category.
    #[must_use]
    pub fn staged_count(&self, category: PhotoCategory) -> usize {
        self.staged_photos
            .iter()
            .filter(|p| p.category == category)
            .count()
    }

    /// Take the user-editable fields from `edits`, keeping this draft's
    /// identity and staged photos. The kind only changes before first save.
    pub fn merge_edits(&mut self, edits: AssetDraft) {
        if self.id.is_none() {
            self.kind = edits.kind;
        }
        self.frequency = edits.frequency;
        self.technology = edits.technology;
        self.amplifier_mode = edits.amplifier_mode;
        self.port = edits.port;
        self.port_index = edits.port_index;
        self.amplifier_adjustment = edits.amplifier_adjustment;
        self.node_adjustment = edits.node_adjustment;
    }

    /// Project the draft onto a storable asset.
    ///
    /// Returns `None` while no frequency is chosen. Fields that do not apply
    /// to the kind are dropped; `technology` is the resolved value.
    #[must_use]
    pub fn to_asset(&self, id: AssetId, technology: Option<Technology>) -> Option<Asset> {
        let frequency = self.frequency?;
        let asset = match self.kind {
            AssetKind::Node => Asset {
                id,
                report_id: self.report_id,
                kind: AssetKind::Node,
                frequency,
                technology,
                amplifier_mode: None,
                port: None,
                port_index: None,
            },
            AssetKind::Amplifier => Asset {
                id,
                report_id: self.report_id,
                kind: AssetKind::Amplifier,
                frequency,
                technology: None,
                amplifier_mode: self.amplifier_mode,
                port: self.port,
                port_index: self.port_index,
            },
        };
        Some(asset)
    }
}
