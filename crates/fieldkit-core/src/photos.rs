//! # Photo Count Tracker
//!
//! Counts photos per category and states how many each category needs for a
//! given asset kind and technology.

use crate::draft::AssetDraft;
use crate::primitives::{
    MAX_MONITORING_PHOTOS, MAX_OPTICS_PHOTOS, MAX_SPECTRUM_PHOTOS, MAX_SPECTRUM_PHOTOS_EXTENDED,
    MODULE_PHOTOS,
};
use crate::{AssetKind, Photo, PhotoCategory, Technology};
use serde::{Deserialize, Serialize};

/// Live photo count per category for one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoCounts {
    pub module: usize,
    pub optics: usize,
    pub monitoring: usize,
    pub spectrum: usize,
}

impl PhotoCounts {
    /// Count a sequence of photo categories.
    pub fn tally(categories: impl IntoIterator<Item = PhotoCategory>) -> Self {
        let mut counts = Self::default();
        for category in categories {
            counts.increment(category);
        }
        counts
    }

    /// Counts for a draft: its saved photos plus the ones still staged.
    #[must_use]
    pub fn for_draft(stored: &[Photo], draft: &AssetDraft) -> Self {
        Self::tally(
            stored
                .iter()
                .map(|p| p.category)
                .chain(draft.staged_photos.iter().map(|p| p.category)),
        )
    }

    #[must_use]
    pub fn get(&self, category: PhotoCategory) -> usize {
        match category {
            PhotoCategory::Module => self.module,
            PhotoCategory::Optics => self.optics,
            PhotoCategory::Monitoring => self.monitoring,
            PhotoCategory::Spectrum => self.spectrum,
        }
    }

    fn increment(&mut self, category: PhotoCategory) {
        let slot = match category {
            PhotoCategory::Module => &mut self.module,
            PhotoCategory::Optics => &mut self.optics,
            PhotoCategory::Monitoring => &mut self.monitoring,
            PhotoCategory::Spectrum => &mut self.spectrum,
        };
        *slot = slot.saturating_add(1);
    }
}

/// How many photos of one category an asset takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRequirement {
    pub min: u8,
    pub max: u8,
    /// Informational categories never hold back a save.
    pub blocking: bool,
}

impl PhotoRequirement {
    /// Whether `count` photos meet the requirement.
    ///
    /// Non-blocking categories are always satisfied.
    #[must_use]
    pub fn is_satisfied(&self, count: usize) -> bool {
        !self.blocking || (count >= self.min as usize && count <= self.max as usize)
    }

    /// Whether one more photo still fits.
    #[must_use]
    pub fn accepts_another(&self, count: usize) -> bool {
        count < self.max as usize
    }
}

/// Photo requirement for a category on an asset of `kind` with `technology`.
#[must_use]
pub fn requirement(
    kind: AssetKind,
    technology: Option<Technology>,
    category: PhotoCategory,
) -> PhotoRequirement {
    let is_node = kind == AssetKind::Node;
    match category {
        PhotoCategory::Module => PhotoRequirement {
            min: if is_node && technology == Some(Technology::Rphy) {
                0
            } else {
                MODULE_PHOTOS
            },
            max: MODULE_PHOTOS,
            blocking: true,
        },
        PhotoCategory::Optics => {
            let needs_optics = is_node
                && !matches!(technology, Some(Technology::Rphy | Technology::Vccap));
            PhotoRequirement {
                min: u8::from(needs_optics),
                max: MAX_OPTICS_PHOTOS,
                blocking: true,
            }
        }
        PhotoCategory::Monitoring => PhotoRequirement {
            min: 0,
            max: MAX_MONITORING_PHOTOS,
            blocking: false,
        },
        PhotoCategory::Spectrum => {
            let extended = is_node
                && matches!(technology, Some(Technology::Legacy | Technology::Vccap));
            PhotoRequirement {
                min: 0,
                max: if extended {
                    MAX_SPECTRUM_PHOTOS_EXTENDED
                } else {
                    MAX_SPECTRUM_PHOTOS
                },
                blocking: false,
            }
        }
    }
}

/// Whether every blocking category is satisfied.
#[must_use]
pub fn photos_satisfied(
    kind: AssetKind,
    technology: Option<Technology>,
    counts: &PhotoCounts,
) -> bool {
    PhotoCategory::ALL
        .iter()
        .all(|&c| requirement(kind, technology, c).is_satisfied(counts.get(c)))
}
