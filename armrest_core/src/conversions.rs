//! `From` implementations bridging `armrest_config` types to runtime types.

use crate::calibration::{CalibrationModel, Sensitivity, TransferFn};
use crate::config::{AdcCfg, ControlCfg, EmitCfg, FilterCfg, PipelineCfg, ZeroingCfg};
use crate::cop::Geometry;

impl From<&armrest_config::AdcCfg> for AdcCfg {
    fn from(c: &armrest_config::AdcCfg) -> Self {
        Self {
            vref: c.vref,
            max_count: c.max_count,
        }
    }
}

impl From<&armrest_config::FilterCfg> for FilterCfg {
    fn from(c: &armrest_config::FilterCfg) -> Self {
        Self {
            ema_alpha: c.ema_alpha,
        }
    }
}

impl From<&armrest_config::TransferCfg> for TransferFn {
    fn from(c: &armrest_config::TransferCfg) -> Self {
        Self {
            p1: c.p1,
            p2: c.p2,
            p3: c.p3,
        }
    }
}

impl From<&armrest_config::SensitivityCfg> for Sensitivity {
    fn from(c: &armrest_config::SensitivityCfg) -> Self {
        Self::new(c.left, c.right, c.vtc)
    }
}

impl From<&armrest_config::GeometryCfg> for Geometry {
    fn from(c: &armrest_config::GeometryCfg) -> Self {
        Self::new([c.left.into(), c.right.into(), c.vtc.into()])
    }
}

impl From<&armrest_config::ZeroingCfg> for ZeroingCfg {
    fn from(c: &armrest_config::ZeroingCfg) -> Self {
        Self {
            samples: c.samples,
            delay_ms: c.delay_ms,
        }
    }
}

impl From<&armrest_config::ControlCfg> for ControlCfg {
    fn from(c: &armrest_config::ControlCfg) -> Self {
        Self {
            rest_threshold_n: c.rest_threshold_n,
            dead_zone_radius: c.dead_zone_radius,
        }
    }
}

impl From<&armrest_config::EmitCfg> for EmitCfg {
    fn from(c: &armrest_config::EmitCfg) -> Self {
        Self {
            interval_ms: c.interval_ms,
        }
    }
}

impl From<&armrest_config::Config> for PipelineCfg {
    fn from(c: &armrest_config::Config) -> Self {
        Self {
            adc: (&c.adc).into(),
            filter: (&c.filter).into(),
            calibration: CalibrationModel {
                transfer: (&c.transfer).into(),
                sensitivity: (&c.sensitivity).into(),
                newtons_per_unit: c.scale.newtons_per_unit,
            },
            geometry: (&c.geometry).into(),
            zeroing: (&c.zeroing).into(),
            control: (&c.control).into(),
            emit: (&c.emit).into(),
        }
    }
}
