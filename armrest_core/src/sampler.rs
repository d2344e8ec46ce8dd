//! ChannelSampler: raw ADC counts to volts, all three channels in fixed order.

use armrest_traits::{AnalogFrontEnd, Channel};
use eyre::WrapErr;

use crate::config::AdcCfg;
use crate::error::Result;
use crate::hw_error::map_hw_error;

pub struct ChannelSampler<A: AnalogFrontEnd> {
    front_end: A,
    adc: AdcCfg,
}

impl<A: AnalogFrontEnd> ChannelSampler<A> {
    pub fn new(front_end: A, adc: AdcCfg) -> Self {
        Self { front_end, adc }
    }

    /// `counts * vref / max_count`.
    #[inline]
    pub fn counts_to_volts(&self, counts: u16) -> f32 {
        f32::from(counts) * self.adc.vref / f32::from(self.adc.max_count)
    }

    /// Read one channel and convert to volts.
    pub fn read_channel(&mut self, channel: Channel) -> Result<f32> {
        let counts = self
            .front_end
            .read_counts(channel)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("reading {channel} channel"))?;
        let volts = self.counts_to_volts(counts);
        tracing::trace!(%channel, counts, volts, "adc read");
        Ok(volts)
    }

    /// Read left, right and vtc, in that order.
    pub fn read_volts(&mut self) -> Result<[f32; 3]> {
        let mut out = [0.0f32; 3];
        for ch in Channel::ALL {
            out[ch.index()] = self.read_channel(ch)?;
        }
        Ok(out)
    }

    pub fn adc(&self) -> &AdcCfg {
        &self.adc
    }

    pub fn front_end_mut(&mut self) -> &mut A {
        &mut self.front_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ConstantFrontEnd;

    #[test]
    fn full_scale_reads_as_vref() {
        let s = ChannelSampler::new(ConstantFrontEnd::new([4095, 0, 2048]), AdcCfg::default());
        assert!((s.counts_to_volts(4095) - 3.3).abs() < 1e-6);
        assert_eq!(s.counts_to_volts(0), 0.0);
    }

    #[test]
    fn reads_channels_in_order() {
        let mut s = ChannelSampler::new(
            ConstantFrontEnd::new([4095, 0, 2048]),
            AdcCfg {
                vref: 4.095,
                max_count: 4095,
            },
        );
        let v = s.read_volts().unwrap();
        assert!((v[0] - 4.095).abs() < 1e-5);
        assert_eq!(v[1], 0.0);
        assert!((v[2] - 2.048).abs() < 1e-5);
    }
}
