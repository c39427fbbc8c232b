//! # File Storage
//!
//! Directory-per-asset layout for photos and measurement files:
//!
//! ```text
//! <root>/
//! ├── .staging/<session>/         photos captured before the asset exists
//! └── <report folder>/
//!     └── <kind>_<asset id>/
//!         ├── module_1.jpg
//!         └── module_1.geo.json   optional location sidecar
//! ```
//!
//! Location sidecars may land after the photo itself, so reads retry a
//! fixed number of times.

use crate::primitives::{LOCATION_READ_ATTEMPTS, LOCATION_READ_DELAY, STAGING_DIR};
use crate::{Asset, FieldError, GeoPoint, PhotoCategory, Report};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PHOTO_EXTENSION: &str = "jpg";
const LOCATION_EXTENSION: &str = "geo.json";

/// Filesystem side of a workspace.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Use `root` as the storage root. Nothing is created until needed.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn report_dir(&self, report: &Report) -> PathBuf {
        self.root.join(&report.folder_name)
    }

    #[must_use]
    pub fn asset_dir(&self, report: &Report, asset: &Asset) -> PathBuf {
        self.report_dir(report).join(asset.dir_name())
    }

    fn staging_dir(&self, session: u64) -> PathBuf {
        self.root.join(STAGING_DIR).join(session.to_string())
    }

    /// Create the asset's directory (and parents) if missing.
    pub fn ensure_asset_dir(&self, report: &Report, asset: &Asset) -> Result<PathBuf, FieldError> {
        let dir = self.asset_dir(report, asset);
        std::fs::create_dir_all(&dir)
            .map_err(|e| FieldError::IoError(format!("create {}: {}", dir.display(), e)))?;
        Ok(dir)
    }

    /// Write photo bytes into the asset directory under a fresh name.
    pub fn write_photo(
        &self,
        report: &Report,
        asset: &Asset,
        category: PhotoCategory,
        bytes: &[u8],
    ) -> Result<PathBuf, FieldError> {
        let dir = self.ensure_asset_dir(report, asset)?;
        let path = free_photo_path(&dir, category);
        std::fs::write(&path, bytes)
            .map_err(|e| FieldError::IoError(format!("write {}: {}", path.display(), e)))?;
        Ok(path)
    }

    /// Write photo bytes for a draft session that has no asset yet.
    pub fn stage_photo(
        &self,
        session: u64,
        category: PhotoCategory,
        bytes: &[u8],
    ) -> Result<PathBuf, FieldError> {
        let dir = self.staging_dir(session);
        std::fs::create_dir_all(&dir)
            .map_err(|e| FieldError::IoError(format!("create {}: {}", dir.display(), e)))?;
        let path = free_photo_path(&dir, category);
        std::fs::write(&path, bytes)
            .map_err(|e| FieldError::IoError(format!("write {}: {}", path.display(), e)))?;
        Ok(path)
    }

    /// Move a staged photo (and its sidecar, if any) into the asset directory.
    ///
    /// Returns the new path and the location from the moved sidecar. Without a
    /// staged sidecar the location is `None` and nothing is read.
    pub fn adopt_staged(
        &self,
        report: &Report,
        asset: &Asset,
        category: PhotoCategory,
        staged: &Path,
    ) -> Result<(PathBuf, Option<GeoPoint>), FieldError> {
        let dir = self.ensure_asset_dir(report, asset)?;
        let target = free_photo_path(&dir, category);
        std::fs::rename(staged, &target).map_err(|e| {
            FieldError::IoError(format!(
                "move {} -> {}: {}",
                staged.display(),
                target.display(),
                e
            ))
        })?;

        let sidecar = location_path(staged);
        if !sidecar.exists() {
            return Ok((target, None));
        }
        std::fs::rename(&sidecar, location_path(&target))?;
        let location = read_location_with_retry(&target, 1, Duration::ZERO);
        Ok((target, location))
    }

    /// Drop whatever a draft session left in the staging area.
    pub fn discard_staging(&self, session: u64) -> Result<(), FieldError> {
        remove_dir_if_present(&self.staging_dir(session))
    }

    /// Delete a photo file and its sidecar. Missing files are not an error.
    pub fn remove_photo(&self, path: &Path) -> Result<(), FieldError> {
        remove_file_if_present(path)?;
        remove_file_if_present(&location_path(path))
    }

    pub fn remove_asset_dir(&self, report: &Report, asset: &Asset) -> Result<(), FieldError> {
        remove_dir_if_present(&self.asset_dir(report, asset))
    }

    pub fn remove_report_dir(&self, report: &Report) -> Result<(), FieldError> {
        remove_dir_if_present(&self.report_dir(report))
    }

    /// Store the location sidecar next to a photo.
    pub fn write_location(&self, photo: &Path, location: &GeoPoint) -> Result<(), FieldError> {
        let data = serde_json::to_vec(location)
            .map_err(|e| FieldError::SerializationError(e.to_string()))?;
        std::fs::write(location_path(photo), data)?;
        Ok(())
    }

    /// Read a photo's location sidecar with the default retry policy.
    ///
    /// For sidecars written by another process, which may land late. Blocks
    /// the calling thread between attempts.
    #[must_use]
    pub fn read_location(&self, photo: &Path) -> Option<GeoPoint> {
        read_location_with_retry(photo, LOCATION_READ_ATTEMPTS, LOCATION_READ_DELAY)
    }
}

/// Read a location sidecar, trying `attempts` times with `delay` in between.
///
/// Returns `None` when no readable sidecar shows up. Location is best-effort
/// metadata and never fails the caller.
#[must_use]
pub fn read_location_with_retry(photo: &Path, attempts: u32, delay: Duration) -> Option<GeoPoint> {
    let sidecar = location_path(photo);
    for attempt in 1..=attempts {
        match std::fs::read(&sidecar) {
            Ok(data) => match serde_json::from_slice::<GeoPoint>(&data) {
                Ok(point) => return Some(point),
                Err(e) => {
                    tracing::debug!(attempt, path = %sidecar.display(), "Unreadable location sidecar: {}", e);
                }
            },
            Err(e) => {
                tracing::debug!(attempt, path = %sidecar.display(), "Location sidecar not available: {}", e);
            }
        }
        if attempt < attempts {
            std::thread::sleep(delay);
        }
    }
    None
}

fn location_path(photo: &Path) -> PathBuf {
    photo.with_extension(LOCATION_EXTENSION)
}

/// First `<category>_<n>.jpg` in `dir` that does not exist yet.
fn free_photo_path(dir: &Path, category: PhotoCategory) -> PathBuf {
    let mut n: u32 = 1;
    loop {
        let candidate = dir.join(format!("{}_{}.{}", category.file_stem(), n, PHOTO_EXTENSION));
        if !candidate.exists() {
            return candidate;
        }
        n = n.saturating_add(1);
    }
}

fn remove_file_if_present(path: &Path) -> Result<(), FieldError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FieldError::IoError(format!("remove {}: {}", path.display(), e))),
    }
}

fn remove_dir_if_present(path: &Path) -> Result<(), FieldError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FieldError::IoError(format!("remove {}: {}", path.display(), e))),
    }
}

// =============================================================================
// TESTS
// =============================================================================
