use crate::Error;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Number of roughness levels rendered into the prefiltered cubemap.
pub const PREFILTER_LEVELS: usize = 5;

/// Output resolutions and sampling quality of the precompute pipeline.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, SmartDefault, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PrecomputeConfig {
    #[default(1024)]
    pub environment_size: usize,

    #[default(32)]
    pub irradiance_size: usize,

    #[default(128)]
    pub prefilter_size: usize,

    #[default(512)]
    pub brdf_lut_size: usize,

    #[default(1024)]
    pub prefilter_samples: u32,

    #[default(1024)]
    pub brdf_samples: u32,

    /// Angular step in radians of the irradiance hemisphere integral.
    #[default(0.025)]
    pub irradiance_sample_delta: f32,
}

impl PrecomputeConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let sizes = [
            ("environment-size", self.environment_size),
            ("irradiance-size", self.irradiance_size),
            ("prefilter-size", self.prefilter_size),
            ("brdf-lut-size", self.brdf_lut_size),
        ];

        for &(name, size) in &sizes {
            if !size.is_power_of_two() {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a non-zero power of two, got {}",
                    name, size
                )));
            }
        }

        if self.prefilter_size < 1 << (PREFILTER_LEVELS - 1) {
            return Err(Error::InvalidConfig(format!(
                "prefilter-size must be at least {} to hold {} levels",
                1 << (PREFILTER_LEVELS - 1),
                PREFILTER_LEVELS
            )));
        }

        if self.prefilter_samples == 0 || self.brdf_samples == 0 {
            return Err(Error::InvalidConfig(String::from(
                "sample counts must be non-zero",
            )));
        }

        if !(self.irradiance_sample_delta > 0.0 && self.irradiance_sample_delta < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "irradiance-sample-delta must lie in (0, 1), got {}",
                self.irradiance_sample_delta
            )));
        }

        Ok(())
    }
}
