#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::must_use_candidate
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Armrest signal pipeline (hardware-agnostic).
//!
//! All sensor access goes through `armrest_traits::AnalogFrontEnd`; time goes
//! through `armrest_traits::Clock`.
//!
//! ## Pipeline
//!
//! - **Sampling**: ADC counts to volts (`sampler`)
//! - **Zeroing**: one-time rest-voltage estimate at startup (`zeroing`)
//! - **Smoothing**: per-channel EMA seeded at the rest voltage (`filter`)
//! - **Calibration**: transfer function, relative sensitivity, global scale (`calibration`)
//! - **Centre of pressure**: force-weighted centroid while rested (`cop`)
//! - **Dead zone**: three-state occupancy with edge-triggered change flag (`zone`)
//! - **Emission**: interval gate and CSV wire format (`emitter`)

pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod cop;
pub mod emitter;
pub mod error;
pub mod filter;
pub mod frame;
pub mod hw_error;
pub mod mocks;
pub mod pipeline;
pub mod runner;
pub mod sampler;
pub mod status;
pub mod zeroing;
pub mod zone;

pub use crate::builder::{build_armrest, Armrest, ArmrestBuilder, ArmrestG, Missing, Set};
pub use crate::calibration::{CalibrationModel, Sensitivity, TransferFn};
pub use crate::config::{AdcCfg, ControlCfg, EmitCfg, FilterCfg, PipelineCfg, ZeroingCfg};
pub use crate::cop::{is_rested, Geometry};
pub use crate::emitter::{
    format_record, parse_record, CsvRecordWriter, EmitGate, Record, RecordSink, CSV_HEADER,
};
pub use crate::error::{ArmrestError, BuildError, Report, Result};
pub use crate::filter::{ema_step, SmoothingFilter};
pub use crate::frame::{ChannelForces, Point2, SampleFrame};
pub use crate::pipeline::{ArmrestCore, PipelineState};
pub use crate::runner::{run, RunParams, RunSummary};
pub use crate::sampler::ChannelSampler;
pub use crate::status::StepStatus;
pub use crate::zeroing::estimate_rest_voltages;
pub use crate::zone::{DeadZone, ZoneState, ZoneTracker};
