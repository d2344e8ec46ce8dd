//! Runtime configuration for the armrest pipeline.
//!
//! These are the structs `ArmrestCore` is built from. They are separate from
//! the TOML-deserialized config in `armrest_config`; see `conversions`.

use crate::calibration::CalibrationModel;
use crate::cop::Geometry;
use crate::error::BuildError;

/// Analog-to-digital conversion parameters.
#[derive(Debug, Clone, Copy)]
pub struct AdcCfg {
    /// Reference supply voltage (V).
    pub vref: f32,
    /// Full-scale count; `max_count` reads as `vref` volts.
    pub max_count: u16,
}

impl Default for AdcCfg {
    fn default() -> Self {
        Self {
            vref: 3.3,
            max_count: 4095,
        }
    }
}

/// Smoothing stage configuration.
#[derive(Debug, Clone, Copy)]
pub struct FilterCfg {
    /// EMA weight of the newest sample, in (0, 1).
    pub ema_alpha: f32,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { ema_alpha: 0.15 }
    }
}

/// Startup noise-floor estimation.
#[derive(Debug, Clone, Copy)]
pub struct ZeroingCfg {
    /// Samples averaged per channel.
    pub samples: u32,
    /// Delay between samples (ms).
    pub delay_ms: u64,
}

impl Default for ZeroingCfg {
    fn default() -> Self {
        Self {
            samples: 200,
            delay_ms: 10,
        }
    }
}

/// Rest detection and dead-zone classification.
#[derive(Debug, Clone, Copy)]
pub struct ControlCfg {
    /// Total force (N) that must be exceeded for the arm to count as rested.
    pub rest_threshold_n: f32,
    /// Dead-zone radius around the sensor centroid.
    pub dead_zone_radius: f32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            rest_threshold_n: 3.5,
            dead_zone_radius: 2.0,
        }
    }
}

/// Output cadence.
#[derive(Debug, Clone, Copy)]
pub struct EmitCfg {
    /// Minimum spacing between emitted records (ms).
    pub interval_ms: u64,
}

impl Default for EmitCfg {
    fn default() -> Self {
        Self { interval_ms: 50 }
    }
}

/// Everything the pipeline needs, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineCfg {
    pub adc: AdcCfg,
    pub filter: FilterCfg,
    pub calibration: CalibrationModel,
    pub geometry: Geometry,
    pub zeroing: ZeroingCfg,
    pub control: ControlCfg,
    pub emit: EmitCfg,
}

impl PipelineCfg {
    pub fn validate(&self) -> Result<(), BuildError> {
        if !(self.adc.vref.is_finite() && self.adc.vref > 0.0) {
            return Err(BuildError::InvalidConfig("adc vref must be > 0"));
        }
        if self.adc.max_count == 0 {
            return Err(BuildError::InvalidConfig("adc max_count must be >= 1"));
        }
        let alpha = self.filter.ema_alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(BuildError::InvalidConfig("ema_alpha must be in (0, 1)"));
        }
        self.calibration.validate()?;
        // highest voltage any u16 reading can convert to
        let v_max =
            f64::from(self.adc.vref) * f64::from(u16::MAX) / f64::from(self.adc.max_count);
        if self.calibration.total_force_bound(v_max) > f64::from(f32::MAX) {
            return Err(BuildError::InvalidConfig(
                "calibration overflows the force range at full-scale input",
            ));
        }
        if !self.geometry.is_valid() {
            return Err(BuildError::InvalidConfig(
                "sensor positions must be finite and non-collinear",
            ));
        }
        if self.zeroing.samples == 0 {
            return Err(BuildError::InvalidConfig("zeroing samples must be >= 1"));
        }
        if !(self.control.rest_threshold_n.is_finite() && self.control.rest_threshold_n >= 0.0) {
            return Err(BuildError::InvalidConfig("rest_threshold_n must be >= 0"));
        }
        if !(self.control.dead_zone_radius.is_finite() && self.control.dead_zone_radius >= 0.0) {
            return Err(BuildError::InvalidConfig("dead_zone_radius must be >= 0"));
        }
        if self.emit.interval_ms == 0 {
            return Err(BuildError::InvalidConfig("emit interval_ms must be >= 1"));
        }
        Ok(())
    }
}
