//! The armrest pipeline (`ArmrestCore`).
//!
//! One iteration: sample -> smooth -> convert -> calibrate -> CoP -> zone ->
//! emission gate. All mutable pipeline memory lives in `PipelineState`, owned
//! by the core and touched only from the single sampling loop.

use std::sync::Arc;
use std::time::Instant;

use armrest_traits::{AnalogFrontEnd, Clock};
use eyre::WrapErr;

use crate::config::PipelineCfg;
use crate::cop::is_rested;
use crate::emitter::EmitGate;
use crate::error::{ArmrestError, Result};
use crate::filter::SmoothingFilter;
use crate::frame::SampleFrame;
use crate::sampler::ChannelSampler;
use crate::status::StepStatus;
use crate::zeroing::estimate_rest_voltages;
use crate::zone::{DeadZone, ZoneState, ZoneTracker};

/// Persistent per-run state: rest baseline, filter memory, zone history.
#[derive(Debug, Clone, Copy)]
pub struct PipelineState {
    rest_v: [f32; 3],
    filter: SmoothingFilter,
    zone: ZoneTracker,
}

impl PipelineState {
    /// Fresh state with the filter seeded at the rest voltages.
    pub fn new(cfg: &PipelineCfg, rest_v: [f32; 3]) -> Self {
        Self {
            rest_v,
            filter: SmoothingFilter::new(cfg.filter.ema_alpha, rest_v),
            zone: ZoneTracker::new(DeadZone {
                center: cfg.geometry.centroid(),
                radius: cfg.control.dead_zone_radius,
            }),
        }
    }

    pub fn rest_voltages(&self) -> [f32; 3] {
        self.rest_v
    }

    pub fn filtered_voltages(&self) -> [f32; 3] {
        self.filter.state()
    }

    pub fn zone_state(&self) -> ZoneState {
        self.zone.state()
    }

    /// Smooth one raw sample and run the rest of the pipeline on it.
    pub fn process(&mut self, cfg: &PipelineCfg, raw_v: [f32; 3], timestamp_ms: u64) -> SampleFrame {
        let filtered = self.filter.update(raw_v);
        self.evaluate(cfg, filtered, timestamp_ms)
    }

    /// Everything downstream of the smoothing filter, from filtered voltages.
    pub fn evaluate(
        &mut self,
        cfg: &PipelineCfg,
        filtered_v: [f32; 3],
        timestamp_ms: u64,
    ) -> SampleFrame {
        let raw_units = cfg.calibration.raw_units(filtered_v, self.rest_v);
        let forces = cfg.calibration.to_newtons(raw_units);
        let rested = is_rested(forces.total(), cfg.control.rest_threshold_n);
        // validated configs keep the total finite, so a rested frame always has a CoP
        let cop = rested
            .then(|| cfg.geometry.center_of_pressure(&forces))
            .flatten();
        let zone_changed = self.zone.observe(cop);
        match cop {
            Some(p) => SampleFrame::rested(timestamp_ms, forces, p, zone_changed),
            None => SampleFrame::unrested(timestamp_ms, forces),
        }
    }
}

/// Single-threaded pipeline over a concrete front end.
pub struct ArmrestCore<A: AnalogFrontEnd> {
    pub(crate) sampler: ChannelSampler<A>,
    pub(crate) cfg: PipelineCfg,
    pub(crate) state: PipelineState,
    pub(crate) gate: EmitGate,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) started: bool,
}

impl<A: AnalogFrontEnd> core::fmt::Debug for ArmrestCore<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArmrestCore")
            .field("started", &self.started)
            .field("rest_v", &self.state.rest_v)
            .field("zone", &self.state.zone_state())
            .field("last_emit_ms", &self.gate.last_emit_ms())
            .finish()
    }
}

impl<A: AnalogFrontEnd> ArmrestCore<A> {
    pub(crate) fn new(
        front_end: A,
        cfg: PipelineCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let epoch = clock.now();
        Self {
            sampler: ChannelSampler::new(front_end, cfg.adc),
            state: PipelineState::new(&cfg, [0.0; 3]),
            gate: EmitGate::new(cfg.emit.interval_ms),
            cfg,
            clock,
            epoch,
            started: false,
        }
    }

    /// Run startup zeroing, then reset state with the measured baseline.
    pub fn begin(&mut self) -> Result<()> {
        let rest = estimate_rest_voltages(&mut self.sampler, &*self.clock, &self.cfg.zeroing)
            .wrap_err("startup zeroing")?;
        self.begin_with_rest(rest);
        Ok(())
    }

    /// Start a run with a known rest baseline, skipping zeroing.
    pub fn begin_with_rest(&mut self, rest_v: [f32; 3]) {
        self.state = PipelineState::new(&self.cfg, rest_v);
        self.gate.reset();
        self.epoch = self.clock.now();
        self.started = true;
        tracing::info!("sampling loop ready");
    }

    /// One iteration: read all channels and process them.
    pub fn step(&mut self) -> Result<StepStatus> {
        self.ensure_started()?;
        let raw = self.sampler.read_volts().wrap_err("sampling channels")?;
        self.step_from_volts(raw)
    }

    /// Process externally sampled channel voltages.
    pub fn step_from_volts(&mut self, raw_v: [f32; 3]) -> Result<StepStatus> {
        self.ensure_started()?;
        let now = self.clock.ms_since(self.epoch);
        let frame = self.state.process(&self.cfg, raw_v, now);
        if self.gate.should_emit(now) {
            tracing::debug!(
                timestamp_ms = now,
                total_n = frame.total_n(),
                rested = frame.is_rested(),
                "record emitted"
            );
            Ok(StepStatus::Emitted(frame))
        } else {
            Ok(StepStatus::Held(frame))
        }
    }

    /// One read of every channel, outside the pipeline.
    pub fn sample_volts(&mut self) -> Result<[f32; 3]> {
        self.sampler.read_volts()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn rest_voltages(&self) -> Option<[f32; 3]> {
        self.started.then(|| self.state.rest_voltages())
    }

    pub fn zone_state(&self) -> ZoneState {
        self.state.zone_state()
    }

    pub fn config(&self) -> &PipelineCfg {
        &self.cfg
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    fn ensure_started(&self) -> Result<()> {
        if self.started {
            Ok(())
        } else {
            Err(eyre::Report::new(ArmrestError::State(
                "begin() must be called before stepping".into(),
            )))
        }
    }
}
