//! # Culling Configuration
//!
//! All values are tunable at initialization. Loaded once, either built in
//! code or parsed from a TOML file:
//!
//! ```toml
//! check_interval = 0.2
//! culling_distance = 1000.0
//! ground_check_radius = 5.0
//! ground_check_height = 5.0
//! batch_size = 100
//! frustum_padding = 1.5
//! reference_object_tag = "Player"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sightline_shared::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_CULLING_DISTANCE,
    DEFAULT_FRUSTUM_PADDING, DEFAULT_GROUND_CHECK_HEIGHT, DEFAULT_GROUND_CHECK_RADIUS,
    DEFAULT_REFERENCE_TAG,
};

use crate::error::{ConfigError, ConfigResult};

/// Tuning parameters for the culling pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CullingConfig {
    /// Minimum time between ticks, in seconds.
    pub check_interval: f32,
    /// Maximum distance from the camera at which objects stay visible.
    pub culling_distance: f32,
    /// Horizontal radius of the ground proximity override.
    pub ground_check_radius: f32,
    /// Depth below the player of the ground proximity band.
    pub ground_check_height: f32,
    /// Objects per parallel batch.
    pub batch_size: usize,
    /// Frustum test margin multiplier.
    pub frustum_padding: f32,
    /// Tag used to locate the player anchor when none is supplied.
    pub reference_object_tag: String,
    /// Batch worker threads (0 = one per core).
    pub worker_threads: usize,
    /// Log a summary at info level every N ticks (0 = never).
    pub log_interval_ticks: u64,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL_SECS,
            culling_distance: DEFAULT_CULLING_DISTANCE,
            ground_check_radius: DEFAULT_GROUND_CHECK_RADIUS,
            ground_check_height: DEFAULT_GROUND_CHECK_HEIGHT,
            batch_size: DEFAULT_BATCH_SIZE,
            frustum_padding: DEFAULT_FRUSTUM_PADDING,
            reference_object_tag: DEFAULT_REFERENCE_TAG.to_owned(),
            worker_threads: 0,
            log_interval_ticks: 50,
        }
    }
}

impl CullingConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`CullingConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |field: &'static str, reason: &'static str| -> ConfigResult<()> {
            Err(ConfigError::InvalidValue { field, reason })
        };

        if !(self.check_interval.is_finite() && self.check_interval > 0.0) {
            return invalid("check_interval", "must be a positive number of seconds");
        }
        match Duration::try_from_secs_f32(self.check_interval) {
            Ok(interval) if interval.is_zero() => {
                return invalid("check_interval", "is shorter than a nanosecond");
            }
            Ok(_) => {}
            Err(_) => return invalid("check_interval", "is too large"),
        }
        if !(self.culling_distance.is_finite() && self.culling_distance > 0.0) {
            return invalid("culling_distance", "must be positive");
        }
        if !(self.ground_check_radius.is_finite() && self.ground_check_radius >= 0.0) {
            return invalid("ground_check_radius", "must not be negative");
        }
        if !(self.ground_check_height.is_finite() && self.ground_check_height >= 0.0) {
            return invalid("ground_check_height", "must not be negative");
        }
        if self.batch_size == 0 {
            return invalid("batch_size", "must be at least 1");
        }
        if !(self.frustum_padding.is_finite() && self.frustum_padding > 0.0) {
            return invalid("frustum_padding", "must be positive");
        }
        Ok(())
    }

    /// Minimum time between ticks.
    ///
    /// Saturates for values [`CullingConfig::validate`] would reject.
    #[must_use]
    pub fn check_interval_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.check_interval).unwrap_or(Duration::MAX)
    }
}
