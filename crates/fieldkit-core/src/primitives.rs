//! # Fixed Rules and Limits
//!
//! Constants compiled into the engine. The field procedures they encode
//! change with a release, never at runtime.

use std::time::Duration;

/// Valid upper edges of an amplifier plan band, in MHz.
pub const PLAN_HIGH_FREQUENCIES_MHZ: [u16; 2] = [750, 870];

/// MODULE photos required (and allowed) for most assets.
pub const MODULE_PHOTOS: u8 = 2;

/// Maximum OPTICS photos per asset.
pub const MAX_OPTICS_PHOTOS: u8 = 2;

/// Maximum MONITORING photos per asset.
pub const MAX_MONITORING_PHOTOS: u8 = 2;

/// SPECTRUM photo cap for Legacy and VCCAP nodes.
pub const MAX_SPECTRUM_PHOTOS_EXTENDED: u8 = 4;

/// SPECTRUM photo cap for everything else.
pub const MAX_SPECTRUM_PHOTOS: u8 = 3;

/// Attempts made when reading a photo's location sidecar.
pub const LOCATION_READ_ATTEMPTS: u32 = 3;

/// Pause between location sidecar read attempts.
pub const LOCATION_READ_DELAY: Duration = Duration::from_millis(200);

/// Directory under the storage root where draft photos wait for their asset.
pub const STAGING_DIR: &str = ".staging";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of report names, node names and passive addresses.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length of a passive observation.
pub const MAX_OBSERVATION_LENGTH: usize = 4096;

/// Maximum size of a single photo.
pub const MAX_PHOTO_BYTES: usize = 12 * 1024 * 1024;

/// Maximum accepted plan CSV size.
pub const MAX_PLAN_FILE_SIZE: u64 = 32 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_caps_are_ordered() {
        assert!(MAX_SPECTRUM_PHOTOS < MAX_SPECTRUM_PHOTOS_EXTENDED);
    }

    #[test]
    fn plan_bands() {
        assert!(PLAN_HIGH_FREQUENCIES_MHZ.contains(&750));
        assert!(PLAN_HIGH_FREQUENCIES_MHZ.contains(&870));
    }
}
