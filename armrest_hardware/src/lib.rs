//! Analog front ends for the sensorized armrest.
//!
//! The simulated front end is always available; the MCP3208 SPI driver is
//! compiled in with the `hardware` feature on Linux.
pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod mcp3208;

use armrest_traits::{AnalogFrontEnd, Channel};

/// Deterministic front end used when no ADC is attached.
///
/// Every channel reports its rest count for the first `unloaded_reads`
/// reads of that channel, then switches to its loaded count. A small
/// repeating dither can be layered on top to exercise the smoothing stage.
#[derive(Debug, Clone)]
pub struct SimulatedArmrest {
    rest_counts: [u16; 3],
    loaded_counts: [u16; 3],
    unloaded_reads: u32,
    reads: [u32; 3],
    dither: &'static [i16],
}

impl Default for SimulatedArmrest {
    fn default() -> Self {
        Self::new([1985, 1985, 1985])
    }
}

impl SimulatedArmrest {
    /// Rig that stays at rest forever.
    pub fn new(rest_counts: [u16; 3]) -> Self {
        Self {
            rest_counts,
            loaded_counts: rest_counts,
            unloaded_reads: 0,
            reads: [0; 3],
            dither: &[],
        }
    }

    /// Apply `loaded_counts` once each channel has been read `after_reads` times.
    pub fn with_load(mut self, loaded_counts: [u16; 3], after_reads: u32) -> Self {
        self.loaded_counts = loaded_counts;
        self.unloaded_reads = after_reads;
        self
    }

    /// Add a repeating count offset pattern to every reading.
    pub fn with_dither(mut self, pattern: &'static [i16]) -> Self {
        self.dither = pattern;
        self
    }

    /// Convert a voltage to counts for the given reference; clamps to the ADC range.
    pub fn counts_for_volts(volts: f32, vref: f32, max_count: u16) -> u16 {
        if !(volts.is_finite() && vref > 0.0) {
            return 0;
        }
        let c = (volts / vref * f32::from(max_count)).round();
        c.clamp(0.0, f32::from(max_count)) as u16
    }

    /// Number of reads served so far on `channel`.
    pub fn reads(&self, channel: Channel) -> u32 {
        self.reads[channel.index()]
    }
}

impl AnalogFrontEnd for SimulatedArmrest {
    fn read_counts(
        &mut self,
        channel: Channel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        let i = channel.index();
        let n = self.reads[i];
        self.reads[i] = n.saturating_add(1);
        let base = if n < self.unloaded_reads {
            self.rest_counts[i]
        } else {
            self.loaded_counts[i]
        };
        let offset = if self.dither.is_empty() {
            0
        } else {
            self.dither[(n as usize) % self.dither.len()]
        };
        let counts = (i32::from(base) + i32::from(offset)).clamp(0, i32::from(u16::MAX)) as u16;
        tracing::trace!(channel = channel.name(), counts, "simulated read");
        Ok(counts)
    }
}
