//! Startup noise-floor estimation (per-channel rest voltage).
//!
//! Blocking and run once, before the sampling loop. The rig is assumed
//! unloaded for the whole window; nothing here can tell otherwise.

use std::time::Duration;

use armrest_traits::{AnalogFrontEnd, Clock};
use eyre::WrapErr;

use crate::config::ZeroingCfg;
use crate::error::Result;
use crate::sampler::ChannelSampler;

/// Arithmetic mean of `cfg.samples` readings per channel, sleeping
/// `cfg.delay_ms` after every sample. A read failure aborts zeroing.
pub fn estimate_rest_voltages<A: AnalogFrontEnd>(
    sampler: &mut ChannelSampler<A>,
    clock: &dyn Clock,
    cfg: &ZeroingCfg,
) -> Result<[f32; 3]> {
    let n = cfg.samples.max(1);
    let delay = Duration::from_millis(cfg.delay_ms);
    let mut acc = [0.0f64; 3];

    tracing::info!(samples = n, delay_ms = cfg.delay_ms, "estimating rest voltages");
    for i in 0..n {
        let v = sampler
            .read_volts()
            .wrap_err_with(|| format!("zeroing sample {}/{n}", i + 1))?;
        for (a, x) in acc.iter_mut().zip(v) {
            *a += f64::from(x);
        }
        clock.sleep(delay);
    }

    let rest = acc.map(|a| (a / f64::from(n)) as f32);
    tracing::info!(
        left = %format_args!("{:.4}", rest[0]),
        right = %format_args!("{:.4}", rest[1]),
        vtc = %format_args!("{:.4}", rest[2]),
        "rest voltages"
    );
    Ok(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdcCfg;
    use crate::mocks::{ConstantFrontEnd, FailingFrontEnd};
    use armrest_traits::clock::test_clock::TestClock;

    #[test]
    fn averages_and_advances_clock() {
        let clock = TestClock::new();
        let mut s = ChannelSampler::new(
            ConstantFrontEnd::new([1000, 2000, 3000]),
            AdcCfg {
                vref: 4.095,
                max_count: 4095,
            },
        );
        let cfg = ZeroingCfg {
            samples: 20,
            delay_ms: 10,
        };
        let rest = estimate_rest_voltages(&mut s, &clock, &cfg).unwrap();
        assert!((rest[0] - 1.0).abs() < 1e-5);
        assert!((rest[1] - 2.0).abs() < 1e-5);
        assert!((rest[2] - 3.0).abs() < 1e-5);
        assert_eq!(clock.elapsed(), Duration::from_millis(200));
    }

    #[test]
    fn read_failure_is_fatal() {
        let clock = TestClock::new();
        let mut s = ChannelSampler::new(FailingFrontEnd, AdcCfg::default());
        let err = estimate_rest_voltages(&mut s, &clock, &ZeroingCfg::default()).unwrap_err();
        assert!(format!("{err:#}").contains("zeroing sample 1/200"));
    }
}
