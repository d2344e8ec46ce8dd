//! Voltage -> Newtons: the transfer function and the two-stage calibration.
//!
//! Stage 1 (relative sensitivity) evens out gain differences between the
//! three load cells and carries over to any rig of the same mechanical design.
//! Stage 2 (global scale) turns corrected raw units into Newtons and is
//! re-derived for every physical assembly.

use armrest_traits::Channel;

use crate::error::BuildError;
use crate::frame::ChannelForces;

/// Pre-fit quadratic transfer function from absolute filtered voltage to raw units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferFn {
    pub p1: f32,
    pub p2: f32,
    pub p3: f32,
}

impl Default for TransferFn {
    fn default() -> Self {
        Self {
            p1: -2.139_716_8,
            p2: 18.968_569,
            p3: -25.610_223,
        }
    }
}

impl TransferFn {
    /// Evaluate `p1*v^2 + p2*v + p3` without any clamping.
    #[inline]
    pub fn eval(&self, volts: f32) -> f32 {
        self.p1 * volts * volts + self.p2 * volts + self.p3
    }

    /// Nonnegative raw-unit force proxy for one channel.
    ///
    /// Readings at or below the rest baseline are noise and map to 0. Above it
    /// the polynomial is applied to the absolute voltage (not the delta) and
    /// negative results are clamped to 0.
    #[inline]
    pub fn raw_units(&self, filtered_v: f32, rest_v: f32) -> f32 {
        if filtered_v <= rest_v {
            return 0.0;
        }
        // f32::max drops a NaN operand, so a NaN reading also lands on 0
        self.eval(filtered_v).max(0.0)
    }
}

/// Per-channel relative-sensitivity coefficients; the reference channel is 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    pub coefficients: [f32; 3],
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            coefficients: [1.0, 23.0 / 26.0, 23.0 / 32.4],
        }
    }
}

impl Sensitivity {
    pub const fn new(left: f32, right: f32, vtc: f32) -> Self {
        Self {
            coefficients: [left, right, vtc],
        }
    }

    #[inline]
    pub fn get(&self, channel: Channel) -> f32 {
        self.coefficients[channel.index()]
    }
}

/// Immutable calibration model: transfer function + both calibration stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationModel {
    pub transfer: TransferFn,
    pub sensitivity: Sensitivity,
    /// Newtons per sensitivity-corrected raw unit.
    pub newtons_per_unit: f32,
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self {
            transfer: TransferFn::default(),
            sensitivity: Sensitivity::default(),
            newtons_per_unit: 5.91,
        }
    }
}

impl CalibrationModel {
    pub fn validate(&self) -> Result<(), BuildError> {
        let t = &self.transfer;
        if ![t.p1, t.p2, t.p3].iter().all(|c| c.is_finite()) {
            return Err(BuildError::InvalidConfig(
                "transfer coefficients must be finite",
            ));
        }
        if !self
            .sensitivity
            .coefficients
            .iter()
            .all(|c| c.is_finite() && *c > 0.0)
        {
            return Err(BuildError::InvalidConfig(
                "sensitivity coefficients must be > 0",
            ));
        }
        if (self.sensitivity.get(Channel::Left) - 1.0).abs() > 1e-6 {
            return Err(BuildError::InvalidConfig(
                "reference (left) sensitivity must be 1.0",
            ));
        }
        if !(self.newtons_per_unit.is_finite() && self.newtons_per_unit > 0.0) {
            return Err(BuildError::InvalidConfig("newtons_per_unit must be > 0"));
        }
        Ok(())
    }

    /// Upper bound on the total force for channel voltages in `[0, v_max]`.
    ///
    /// Every intermediate of `to_newtons` and the channel sum is bounded by
    /// this value, so the pipeline stays finite while it fits in an `f32`.
    pub fn total_force_bound(&self, v_max: f64) -> f64 {
        let t = &self.transfer;
        let raw = f64::from(t.p1).abs() * v_max * v_max
            + f64::from(t.p2).abs() * v_max
            + f64::from(t.p3).abs();
        let gain: f64 = self
            .sensitivity
            .coefficients
            .iter()
            .map(|c| f64::from(*c))
            .sum();
        raw * gain * f64::from(self.newtons_per_unit)
    }

    /// Raw units for all three channels from filtered and rest voltages.
    #[inline]
    pub fn raw_units(&self, filtered_v: [f32; 3], rest_v: [f32; 3]) -> [f32; 3] {
        [
            self.transfer.raw_units(filtered_v[0], rest_v[0]),
            self.transfer.raw_units(filtered_v[1], rest_v[1]),
            self.transfer.raw_units(filtered_v[2], rest_v[2]),
        ]
    }

    /// Stage 1: relative-sensitivity correction.
    #[inline]
    pub fn correct(&self, raw: [f32; 3]) -> [f32; 3] {
        let c = &self.sensitivity.coefficients;
        [raw[0] * c[0], raw[1] * c[1], raw[2] * c[2]]
    }

    /// Stage 2: global scale into Newtons.
    #[inline]
    pub fn scale(&self, corrected: [f32; 3]) -> ChannelForces {
        let k = self.newtons_per_unit;
        ChannelForces::from_array([corrected[0] * k, corrected[1] * k, corrected[2] * k])
    }

    /// Both stages: raw units -> per-channel Newtons.
    #[inline]
    pub fn to_newtons(&self, raw: [f32; 3]) -> ChannelForces {
        self.scale(self.correct(raw))
    }
}
