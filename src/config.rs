use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Secondary hue band that catches red hues wrapping past 1.0.
pub const WRAP_HUE_MIN: f32 = 0.59;
pub const WRAP_HUE_MAX: f32 = 1.0;

/// Open-interval HSV bounds for the primary skin band.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HsvFilterConfig {
    pub hue_min: f32,
    pub hue_max: f32,
    pub sat_min: f32,
    pub sat_max: f32,
    pub val_min: f32,
    pub val_max: f32,
}

impl Default for HsvFilterConfig {
    fn default() -> Self {
        Self {
            hue_min: 0.0,
            hue_max: 0.1,
            sat_min: 0.0,
            sat_max: 1.0,
            val_min: 0.4,
            val_max: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionThresholds {
    /// Summed |ΔR|+|ΔG|+|ΔB| above which a pixel counts as changed.
    pub rgb_delta: u32,
    /// Minimum centroid displacement, in pixels, for a swipe.
    pub move_margin: u32,
    /// Changed-pixel burst above the moving average that arms a gesture.
    pub brightness_delta: u32,
}

impl Default for MotionThresholds {
    fn default() -> Self {
        Self {
            rgb_delta: 150,
            move_margin: 2,
            brightness_delta: 300,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub hsv: HsvFilterConfig,
    pub thresholds: MotionThresholds,
    /// Integer factor the source resolution is divided by before processing.
    pub downsample: u32,
    /// Flip frames horizontally so swipes read as the user sees them.
    pub mirror: bool,
    /// Publish raw, skin and edge frames alongside swipe events.
    pub emit_frames: bool,
    pub tick_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hsv: HsvFilterConfig::default(),
            thresholds: MotionThresholds::default(),
            downsample: 5,
            mirror: false,
            emit_frames: false,
            tick_interval_ms: 40,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        log::info!("loaded pipeline config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let hsv = &self.hsv;
        for (name, min, max) in [
            ("hue", hsv.hue_min, hsv.hue_max),
            ("sat", hsv.sat_min, hsv.sat_max),
            ("val", hsv.val_min, hsv.val_max),
        ] {
            if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) {
                return Err(ConfigError::Invalid(format!(
                    "{name} bounds must lie in [0, 1], got ({min}, {max})"
                )));
            }
            if min > max {
                return Err(ConfigError::Invalid(format!(
                    "{name}_min {min} exceeds {name}_max {max}"
                )));
            }
        }

        if self.downsample == 0 {
            return Err(ConfigError::Invalid(
                "downsample factor must be at least 1".to_string(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
