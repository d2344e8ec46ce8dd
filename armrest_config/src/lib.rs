#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and reference-load calibration parsing for the armrest.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section defaults to the values the rig was characterised with,
//!   so an empty document is a usable config.
//! - The sensitivity CSV loader turns per-channel responses to one known
//!   load into relative-sensitivity coefficients.
use armrest_traits::Channel;
use serde::Deserialize;

/// Gravitational acceleration used to turn a reference mass into Newtons.
pub const STANDARD_GRAVITY: f32 = 9.81;

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct AdcCfg {
    /// Reference supply voltage of the converter (V).
    pub vref: f32,
    /// Full-scale count (4095 for a 12-bit converter).
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

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct FilterCfg {
    /// EMA smoothing factor in (0, 1). Lower is smoother and slower.
    pub ema_alpha: f32,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { ema_alpha: 0.15 }
    }
}

/// Quadratic voltage -> raw-unit transfer function: p1*v^2 + p2*v + p3.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct TransferCfg {
    pub p1: f32,
    pub p2: f32,
    pub p3: f32,
}

impl Default for TransferCfg {
    fn default() -> Self {
        Self {
            p1: -2.139_716_8,
            p2: 18.968_569,
            p3: -25.610_223,
        }
    }
}

/// Relative sensitivity per channel; `left` is the reference and must be 1.0.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SensitivityCfg {
    pub left: f32,
    pub right: f32,
    pub vtc: f32,
}

impl Default for SensitivityCfg {
    fn default() -> Self {
        Self {
            left: 1.0,
            right: 23.0 / 26.0,
            vtc: 23.0 / 32.4,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ScaleCfg {
    /// Newtons per sensitivity-corrected raw unit for this assembled rig.
    pub newtons_per_unit: f32,
}

impl Default for ScaleCfg {
    fn default() -> Self {
        Self {
            newtons_per_unit: 5.91,
        }
    }
}

/// Sensor positions in the armrest plane (cm).
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct GeometryCfg {
    pub left: [f32; 2],
    pub right: [f32; 2],
    pub vtc: [f32; 2],
}

impl Default for GeometryCfg {
    fn default() -> Self {
        Self {
            left: [0.0, 0.0],
            right: [7.0, 0.0],
            vtc: [3.5, 22.0],
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ZeroingCfg {
    /// Number of unloaded samples averaged per channel at startup.
    pub samples: u32,
    /// Delay between zeroing samples (ms).
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

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ControlCfg {
    /// Total force (N) above which the arm counts as rested.
    pub rest_threshold_n: f32,
    /// Dead-zone radius around the sensor centroid (same unit as geometry).
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

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct EmitCfg {
    /// Minimum spacing between emitted records (ms).
    pub interval_ms: u64,
}

impl Default for EmitCfg {
    fn default() -> Self {
        Self { interval_ms: 50 }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// SPI wiring of the ADC (hardware builds only).
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Pins {
    pub spi_bus: u8,
    pub spi_ss: u8,
    pub left: u8,
    pub right: u8,
    pub vtc: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            spi_ss: 0,
            left: 0,
            right: 1,
            vtc: 2,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub adc: AdcCfg,
    pub filter: FilterCfg,
    pub transfer: TransferCfg,
    pub sensitivity: SensitivityCfg,
    pub scale: ScaleCfg,
    pub geometry: GeometryCfg,
    pub zeroing: ZeroingCfg,
    pub control: ControlCfg,
    pub emit: EmitCfg,
    pub logging: Logging,
    pub pins: Pins,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // ADC
        if !(self.adc.vref.is_finite() && self.adc.vref > 0.0) {
            eyre::bail!("adc.vref must be > 0");
        }
        if self.adc.max_count == 0 {
            eyre::bail!("adc.max_count must be >= 1");
        }

        // Filter
        let alpha = self.filter.ema_alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            eyre::bail!("filter.ema_alpha must be in (0.0, 1.0)");
        }

        // Transfer function
        let t = &self.transfer;
        if ![t.p1, t.p2, t.p3].iter().all(|c| c.is_finite()) {
            eyre::bail!("transfer coefficients must be finite");
        }

        // Two-stage calibration
        let s = &self.sensitivity;
        for (name, c) in [("left", s.left), ("right", s.right), ("vtc", s.vtc)] {
            if !(c.is_finite() && c > 0.0) {
                eyre::bail!("sensitivity.{name} must be > 0");
            }
        }
        if (s.left - 1.0).abs() > 1e-6 {
            eyre::bail!("sensitivity.left is the reference channel and must be 1.0");
        }
        if !(self.scale.newtons_per_unit.is_finite() && self.scale.newtons_per_unit > 0.0) {
            eyre::bail!("scale.newtons_per_unit must be > 0");
        }

        // Geometry
        let g = &self.geometry;
        let pts = [g.left, g.right, g.vtc];
        if !pts.iter().flatten().all(|v| v.is_finite()) {
            eyre::bail!("geometry positions must be finite");
        }
        let twice_area = (g.right[0] - g.left[0]) * (g.vtc[1] - g.left[1])
            - (g.vtc[0] - g.left[0]) * (g.right[1] - g.left[1]);
        if twice_area.abs() < 1e-6 {
            eyre::bail!("geometry positions must not be collinear");
        }

        // Zeroing
        if self.zeroing.samples == 0 {
            eyre::bail!("zeroing.samples must be >= 1");
        }
        if self.zeroing.delay_ms > 60 * 1000 {
            eyre::bail!("zeroing.delay_ms is unreasonably large (>60s)");
        }

        // Control
        if !(self.control.rest_threshold_n.is_finite() && self.control.rest_threshold_n >= 0.0) {
            eyre::bail!("control.rest_threshold_n must be >= 0");
        }
        if !(self.control.dead_zone_radius.is_finite() && self.control.dead_zone_radius >= 0.0) {
            eyre::bail!("control.dead_zone_radius must be >= 0");
        }

        // Emission
        if self.emit.interval_ms == 0 {
            eyre::bail!("emit.interval_ms must be >= 1");
        }

        // Pins
        for (name, input) in [
            ("left", self.pins.left),
            ("right", self.pins.right),
            ("vtc", self.pins.vtc),
        ] {
            if input > 7 {
                eyre::bail!("pins.{name} must be an ADC input in 0..=7");
            }
        }

        Ok(())
    }
}

/// Sensitivity CSV schema.
///
/// One row per channel: the raw-unit response of that channel with the same
/// known load placed directly on it.
///
/// Expected headers:
/// channel,raw_units
///
/// Example:
/// channel,raw_units
/// left,23.0
/// right,26.0
/// vtc,32.4
#[derive(Debug, Deserialize, Clone)]
pub struct SensitivityRow {
    pub channel: String,
    pub raw_units: f32,
}

/// Relative-sensitivity coefficients derived from a reference load.
#[derive(Debug, Clone, Copy)]
pub struct SensitivityCalibration {
    pub left: f32,
    pub right: f32,
    pub vtc: f32,
}

impl SensitivityCalibration {
    /// Normalize each channel's response to the left (reference) channel:
    /// c_i = raw_left / raw_i, so c_left is exactly 1.0.
    pub fn from_rows(rows: &[SensitivityRow]) -> eyre::Result<Self> {
        let mut responses: [Option<f32>; 3] = [None; 3];
        for (idx, row) in rows.iter().enumerate() {
            let Some(ch) = Channel::from_name(&row.channel) else {
                eyre::bail!("unknown channel '{}' in row {}", row.channel, idx + 2);
            };
            if !(row.raw_units.is_finite() && row.raw_units > 0.0) {
                eyre::bail!("channel {ch} response must be > 0, got {}", row.raw_units);
            }
            let slot = &mut responses[ch.index()];
            if slot.is_some() {
                eyre::bail!("duplicate row for channel {ch}");
            }
            *slot = Some(row.raw_units);
        }

        let [Some(left), Some(right), Some(vtc)] = responses else {
            let missing: Vec<&str> = Channel::ALL
                .iter()
                .filter(|ch| responses[ch.index()].is_none())
                .map(|ch| ch.name())
                .collect();
            eyre::bail!("sensitivity table is missing channel(s): {}", missing.join(","));
        };

        let (right, vtc) = (left / right, left / vtc);
        if !(right.is_finite() && vtc.is_finite()) {
            eyre::bail!("channel responses differ too much to normalize (overflow)");
        }
        Ok(Self {
            left: 1.0,
            right,
            vtc,
        })
    }

    /// Render as a `[sensitivity]` TOML section.
    pub fn to_toml(&self) -> String {
        format!(
            "[sensitivity]\nleft = {:.6}\nright = {:.6}\nvtc = {:.6}\n",
            self.left, self.right, self.vtc
        )
    }
}

impl TryFrom<&[SensitivityRow]> for SensitivityCalibration {
    type Error = eyre::Report;
    fn try_from(rows: &[SensitivityRow]) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

/// Global scale factor from a known mass placed at the rig centre:
/// `known_kg * g / corrected_raw_total` (Newtons per corrected raw unit).
pub fn derive_global_scale(known_kg: f32, corrected_raw_total: f32) -> eyre::Result<f32> {
    if !(known_kg.is_finite() && known_kg > 0.0) {
        eyre::bail!("reference load must be > 0 kg, got {known_kg}");
    }
    if !(corrected_raw_total.is_finite() && corrected_raw_total > 0.0) {
        eyre::bail!("corrected raw total must be > 0, got {corrected_raw_total}");
    }
    Ok(known_kg * STANDARD_GRAVITY / corrected_raw_total)
}

pub fn load_sensitivity_csv(path: &std::path::Path) -> eyre::Result<SensitivityCalibration> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open sensitivity CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["channel", "raw_units"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "sensitivity CSV must have headers 'channel,raw_units', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<SensitivityRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    SensitivityCalibration::try_from(rows.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_a_valid_config() {
        let cfg = load_toml("").unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.zeroing.samples, 200);
        assert_eq!(cfg.emit.interval_ms, 50);
        assert!((cfg.filter.ema_alpha - 0.15).abs() < 1e-6);
    }

    #[test]
    fn global_scale_matches_reference_procedure() {
        // 3 kg at the centre read as 4.98 corrected raw units -> ~5.91 N/unit
        let k = derive_global_scale(3.0, 4.98).unwrap();
        assert!((k - 5.9096).abs() < 1e-3);
        assert!(derive_global_scale(0.0, 4.98).is_err());
        assert!(derive_global_scale(3.0, f32::NAN).is_err());
    }
}
