//! Front-end assembly and the stream / self-check / calibrate commands.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use armrest_core::error::{ArmrestError, Result as CoreResult};
use armrest_core::{Armrest, CsvRecordWriter, RecordSink, RunParams, RunSummary, SampleFrame};
use armrest_traits::{AnalogFrontEnd, Channel};
use eyre::WrapErr;
use serde_json::json;

use crate::cli::{OutputFormat, RtLock};

/// Loaded channel voltages "l,r,v" applied by the simulator once zeroing is done.
pub const SIM_LOAD_ENV: &str = "ARMREST_SIM_LOAD_VOLTS";

/// One JSON object per record; CoP is `null` while not rested.
pub struct JsonlRecordWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonlRecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

/// `v` rounded through the same fixed-point text the CSV writer emits.
fn fixed(v: f32, places: usize) -> f64 {
    format!("{v:.places$}").parse().unwrap_or(f64::NAN)
}

pub fn frame_json(frame: &SampleFrame) -> serde_json::Value {
    let f = frame.forces();
    let cop = frame
        .cop()
        .map(|p| json!({ "x": fixed(p.x, 2), "y": fixed(p.y, 2) }));
    json!({
        "timestamp_ms": frame.timestamp_ms(),
        "force_left": fixed(f.left, 3),
        "force_right": fixed(f.right, 3),
        "force_vtc": fixed(f.vtc, 3),
        "force_total": fixed(frame.total_n(), 3),
        "is_rested": frame.is_rested(),
        "zone_changed": frame.zone_changed(),
        "cop": cop,
    })
}

impl<W: Write> RecordSink for JsonlRecordWriter<W> {
    fn header(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn record(&mut self, frame: &SampleFrame) -> io::Result<()> {
        writeln!(self.out, "{}", frame_json(frame))?;
        self.out.flush()
    }
}

#[cfg_attr(all(feature = "hardware", target_os = "linux"), allow(dead_code))]
fn parse_sim_load(raw: &str) -> CoreResult<[f32; 3]> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let bad = || {
        eyre::Report::new(ArmrestError::Config(format!(
            "{SIM_LOAD_ENV} must be three comma-separated volts, got {raw:?}"
        )))
    };
    if parts.len() != 3 {
        return Err(bad());
    }
    let mut out = [0.0f32; 3];
    for (slot, p) in out.iter_mut().zip(parts) {
        *slot = p.parse::<f32>().map_err(|_| bad())?;
    }
    Ok(out)
}

/// Build the analog front end for this binary: the MCP3208 on hardware
/// builds, the deterministic simulator otherwise.
pub fn make_front_end(cfg: &armrest_config::Config) -> CoreResult<Box<dyn AnalogFrontEnd>> {
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        use armrest_hardware::mcp3208::{ChannelMap, Mcp3208};
        let p = &cfg.pins;
        let adc = Mcp3208::open(
            p.spi_bus,
            p.spi_ss,
            ChannelMap {
                left: p.left,
                right: p.right,
                vtc: p.vtc,
            },
        )
        .map_err(|e| eyre::Report::new(armrest_core::hw_error::map_hw_error(&e)))
        .wrap_err("open MCP3208")?;
        tracing::info!(bus = p.spi_bus, ss = p.spi_ss, "MCP3208 front end ready");
        Ok(Box::new(adc))
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    {
        use armrest_hardware::SimulatedArmrest;
        const DITHER: &[i16] = &[0, 1, -1, 2, 0, -2, 1, -1];

        let vref = cfg.adc.vref;
        let max = cfg.adc.max_count;
        let mut sim = SimulatedArmrest::default().with_dither(DITHER);
        if let Ok(raw) = std::env::var(SIM_LOAD_ENV) {
            let volts = parse_sim_load(&raw)?;
            let counts = volts.map(|v| SimulatedArmrest::counts_for_volts(v, vref, max));
            sim = sim.with_load(counts, cfg.zeroing.samples);
            tracing::info!(?volts, "simulated load after zeroing");
        }
        tracing::info!("simulated front end (no hardware feature)");
        Ok(Box::new(sim))
    }
}

pub fn build_armrest(cfg: &armrest_config::Config) -> CoreResult<Armrest> {
    let front_end = make_front_end(cfg)?;
    Armrest::builder()
        .with_front_end(front_end)
        .apply_config(cfg)
        .build()
}

#[allow(clippy::too_many_arguments)]
pub fn run_stream(
    cfg: &armrest_config::Config,
    iterations: Option<u64>,
    format: OutputFormat,
    pace_ms: Option<u64>,
    rt: bool,
    rt_prio: Option<i32>,
    rt_lock: Option<RtLock>,
    rt_cpu: Option<usize>,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<RunSummary> {
    #[cfg(target_os = "linux")]
    crate::rt::setup_rt_once(rt, rt_prio, rt_lock.unwrap_or(RtLock::Current), rt_cpu);
    #[cfg(not(target_os = "linux"))]
    {
        let _ = (rt_prio, rt_lock, rt_cpu);
        if rt {
            tracing::warn!("--rt is only supported on Linux; ignoring");
        }
    }

    let mut armrest = build_armrest(cfg)?;
    let params = RunParams {
        max_iterations: iterations,
        pace: pace_ms.map(Duration::from_millis),
        ..RunParams::default()
    };

    let stdout = io::stdout();
    let out = stdout.lock();
    let summary = match format {
        OutputFormat::Csv => armrest.run(CsvRecordWriter::new(out), &shutdown, params)?,
        OutputFormat::Jsonl => armrest.run(JsonlRecordWriter::new(out), &shutdown, params)?,
    };
    if shutdown.load(Ordering::Relaxed) {
        tracing::info!("stopped by signal");
    }
    Ok(summary)
}

pub fn self_check(cfg: &armrest_config::Config) -> CoreResult<()> {
    let mut armrest = build_armrest(cfg)?;
    let volts = armrest.sample_volts().wrap_err("self-check read")?;
    for ch in Channel::ALL {
        println!("{:<5} {:.4} V", ch.name(), volts[ch.index()]);
    }
    println!("OK");
    Ok(())
}

pub fn calibrate(
    sensitivity: &Path,
    known_kg: Option<f32>,
    corrected_raw_total: Option<f32>,
) -> eyre::Result<()> {
    let sens = armrest_config::load_sensitivity_csv(sensitivity)?;
    print!("{}", sens.to_toml());
    if let (Some(kg), Some(total)) = (known_kg, corrected_raw_total) {
        let k = armrest_config::derive_global_scale(kg, total)?;
        println!("\n[scale]\nnewtons_per_unit = {k:.6}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use armrest_core::{ChannelForces, Point2};

    #[test]
    fn sim_load_parses_three_volts() {
        assert_eq!(parse_sim_load("2.0, 1.6,1.7").unwrap(), [2.0, 1.6, 1.7]);
        assert!(parse_sim_load("2.0,1.6").is_err());
        assert!(parse_sim_load("a,b,c").is_err());
    }

    #[test]
    fn unrested_json_has_null_cop() {
        let v = frame_json(&SampleFrame::unrested(5, ChannelForces::default()));
        assert!(v["cop"].is_null());
        assert_eq!(v["is_rested"], false);
    }

    #[test]
    fn rested_json_carries_cop() {
        let frame = SampleFrame::rested(
            50,
            ChannelForces::from_array([10.0, 0.0, 0.0]),
            Point2::new(0.0, 0.0),
            true,
        );
        let v = frame_json(&frame);
        assert_eq!(v["cop"]["x"], 0.0);
        assert_eq!(v["zone_changed"], true);
    }

    #[test]
    fn json_numbers_match_csv_precision() {
        let frame = SampleFrame::rested(
            50,
            ChannelForces::from_array([59.1, 0.0, 0.0]),
            Point2::new(3.456, 7.0),
            false,
        );
        let v = frame_json(&frame);
        assert_eq!(v["force_left"].to_string(), "59.1");
        assert_eq!(v["force_total"].to_string(), "59.1");
        assert_eq!(v["cop"]["x"].to_string(), "3.46");

        let csv = armrest_core::format_record(&frame);
        let fields: Vec<&str> = csv.split(',').collect();
        assert_eq!(fields[1].parse::<f64>().ok(), v["force_left"].as_f64());
        assert_eq!(fields[7].parse::<f64>().ok(), v["cop"]["x"].as_f64());
    }
}
