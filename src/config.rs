use std::time::Duration;

use camino::Utf8Path;
use config::{Config, File, FileFormat, Source};
use serde::Deserialize;

use crate::error::{QuirkError, QuirkResult};

/// Quiet period used by motion clusters that do not pin their own
pub const DEFAULT_RESET_S: u64 = 30;

pub const DEFAULT_MIN_VOLTS: f64 = 2.1;
pub const DEFAULT_MAX_VOLTS: f64 = 3.2;

#[derive(Debug, Clone, Deserialize)]
pub struct MotionConfig {
    pub default_reset_s: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BatteryConfig {
    pub min_volts: f64,
    pub max_volts: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuirkConfig {
    pub motion: MotionConfig,
    pub battery: BatteryConfig,
}

impl MotionConfig {
    #[must_use]
    pub const fn default_reset(&self) -> Duration {
        Duration::from_secs(self.default_reset_s)
    }
}

impl Default for QuirkConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig {
                default_reset_s: DEFAULT_RESET_S,
            },
            battery: BatteryConfig {
                min_volts: DEFAULT_MIN_VOLTS,
                max_volts: DEFAULT_MAX_VOLTS,
            },
        }
    }
}

impl QuirkConfig {
    fn validate(self) -> QuirkResult<Self> {
        let BatteryConfig {
            min_volts: min,
            max_volts: max,
        } = self.battery;

        if !(min.is_finite() && max.is_finite() && min >= 0.0 && min < max) {
            return Err(QuirkError::InvalidVoltageRange { min, max });
        }

        Ok(self)
    }
}

fn build(source: impl Source + Send + Sync + 'static) -> QuirkResult<QuirkConfig> {
    let settings = Config::builder()
        .set_default("motion.default_reset_s", DEFAULT_RESET_S)?
        .set_default("battery.min_volts", DEFAULT_MIN_VOLTS)?
        .set_default("battery.max_volts", DEFAULT_MAX_VOLTS)?
        .add_source(source)
        .build()?;

    let conf: QuirkConfig = settings.try_deserialize()?;
    conf.validate()
}

/// Load configuration from a yaml file. A missing file gives the defaults.
pub fn parse(filename: &Utf8Path) -> QuirkResult<QuirkConfig> {
    log::debug!("Loading quirk configuration from [{filename}]");
    build(File::new(filename.as_str(), FileFormat::Yaml).required(false))
}

/// Load configuration from an in-memory yaml document.
pub fn parse_str(yaml: &str) -> QuirkResult<QuirkConfig> {
    build(File::from_str(yaml, FileFormat::Yaml))
}
