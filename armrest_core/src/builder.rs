//! Type-state builder for `Armrest` and generic `build_armrest` constructor.
//!
//! `build()` is only available once a front end has been supplied;
//! `try_build()` is always available and checks dynamically.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use armrest_traits::clock::{Clock, MonotonicClock};
use armrest_traits::AnalogFrontEnd;

use crate::calibration::CalibrationModel;
use crate::config::*;
use crate::cop::Geometry;
use crate::emitter::RecordSink;
use crate::error::{BuildError, Result};
use crate::pipeline::ArmrestCore;
use crate::runner::{RunParams, RunSummary};
use crate::status::StepStatus;
use crate::zone::ZoneState;

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Boxed pipeline, independent of the concrete front-end type.
pub struct Armrest {
    pub(crate) inner: ArmrestCore<Box<dyn AnalogFrontEnd>>,
}

impl core::fmt::Debug for Armrest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Armrest").field("core", &self.inner).finish()
    }
}

impl Armrest {
    pub fn builder() -> ArmrestBuilder<Missing> {
        ArmrestBuilder::default()
    }

    /// Startup zeroing, then reset per-run state.
    pub fn begin(&mut self) -> Result<()> {
        self.inner.begin()
    }

    pub fn begin_with_rest(&mut self, rest_v: [f32; 3]) {
        self.inner.begin_with_rest(rest_v);
    }

    pub fn step(&mut self) -> Result<StepStatus> {
        self.inner.step()
    }

    pub fn step_from_volts(&mut self, raw_v: [f32; 3]) -> Result<StepStatus> {
        self.inner.step_from_volts(raw_v)
    }

    pub fn sample_volts(&mut self) -> Result<[f32; 3]> {
        self.inner.sample_volts()
    }

    pub fn rest_voltages(&self) -> Option<[f32; 3]> {
        self.inner.rest_voltages()
    }

    pub fn zone_state(&self) -> ZoneState {
        self.inner.zone_state()
    }

    pub fn config(&self) -> &PipelineCfg {
        self.inner.config()
    }

    /// Zeroing, header, then the sampling loop until shutdown or the iteration cap.
    pub fn run<S: RecordSink>(
        &mut self,
        sink: S,
        shutdown: &AtomicBool,
        params: RunParams,
    ) -> Result<RunSummary> {
        crate::runner::run(&mut self.inner, sink, shutdown, params)
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct ArmrestBuilder<F> {
    front_end: Option<Box<dyn AnalogFrontEnd>>,
    cfg: PipelineCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _f: PhantomData<F>,
}

impl Default for ArmrestBuilder<Missing> {
    fn default() -> Self {
        Self {
            front_end: None,
            cfg: PipelineCfg::default(),
            clock: None,
            _f: PhantomData,
        }
    }
}

/// Validate configuration and construct an `ArmrestCore`.
///
/// Shared by `ArmrestBuilder::try_build()` and `build_armrest()`.
fn validate_and_build<A: AnalogFrontEnd>(
    front_end: A,
    cfg: PipelineCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<ArmrestCore<A>> {
    cfg.validate().map_err(eyre::Report::new)?;

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };

    Ok(ArmrestCore::new(front_end, cfg, clock))
}

impl<F> ArmrestBuilder<F> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<Armrest> {
        let front_end = self
            .front_end
            .ok_or_else(|| eyre::Report::new(BuildError::MissingFrontEnd))?;
        let inner = validate_and_build(front_end, self.cfg, self.clock)?;
        Ok(Armrest { inner })
    }
}

/// Chainable setters that do not affect type-state.
impl<F> ArmrestBuilder<F> {
    pub fn with_config(mut self, cfg: PipelineCfg) -> Self {
        self.cfg = cfg;
        self
    }
    pub fn with_adc(mut self, adc: AdcCfg) -> Self {
        self.cfg.adc = adc;
        self
    }
    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.cfg.filter = filter;
        self
    }
    pub fn with_calibration(mut self, calibration: CalibrationModel) -> Self {
        self.cfg.calibration = calibration;
        self
    }
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.cfg.geometry = geometry;
        self
    }
    pub fn with_zeroing(mut self, zeroing: ZeroingCfg) -> Self {
        self.cfg.zeroing = zeroing;
        self
    }
    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.cfg.control = control;
        self
    }
    pub fn with_emit(mut self, emit: EmitCfg) -> Self {
        self.cfg.emit = emit;
        self
    }
    /// Take every pipeline setting from a loaded config file.
    pub fn apply_config(mut self, src: &armrest_config::Config) -> Self {
        self.cfg = PipelineCfg::from(src);
        self
    }
    /// Custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

impl ArmrestBuilder<Missing> {
    pub fn with_front_end(
        self,
        front_end: impl AnalogFrontEnd + 'static,
    ) -> ArmrestBuilder<Set> {
        ArmrestBuilder {
            front_end: Some(Box::new(front_end)),
            cfg: self.cfg,
            clock: self.clock,
            _f: PhantomData,
        }
    }
}

impl ArmrestBuilder<Set> {
    /// Validate and build. Only available once a front end is set.
    pub fn build(self) -> Result<Armrest> {
        self.try_build()
    }
}

/// Statically dispatched pipeline.
pub type ArmrestG<A> = ArmrestCore<A>;

/// Build a statically dispatched `ArmrestG` from a concrete front end.
pub fn build_armrest<A>(
    front_end: A,
    cfg: PipelineCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<ArmrestG<A>>
where
    A: AnalogFrontEnd + 'static,
{
    validate_and_build(front_end, cfg, clock)
}
