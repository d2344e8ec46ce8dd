//! Recursive exponential smoothing of the channel voltages.

/// One EMA update: `alpha * raw + (1 - alpha) * prev`.
#[inline]
pub fn ema_step(prev: f32, raw: f32, alpha: f32) -> f32 {
    alpha * raw + (1.0 - alpha) * prev
}

/// Filter memory for the three channels.
///
/// The state must be seeded from the rest voltages before the first update
/// so the first reading does not produce a step transient.
#[derive(Debug, Clone, Copy)]
pub struct SmoothingFilter {
    alpha: f32,
    state: [f32; 3],
}

impl SmoothingFilter {
    pub fn new(alpha: f32, seed: [f32; 3]) -> Self {
        Self { alpha, state: seed }
    }

    /// Overwrite the filter memory (used right after zeroing).
    pub fn seed(&mut self, values: [f32; 3]) {
        self.state = values;
    }

    /// Fold one raw sample per channel into the filter and return the new state.
    #[inline]
    pub fn update(&mut self, raw: [f32; 3]) -> [f32; 3] {
        for (s, r) in self.state.iter_mut().zip(raw) {
            *s = ema_step(*s, r, self.alpha);
        }
        self.state
    }

    pub fn state(&self) -> [f32; 3] {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_filter_has_no_startup_transient() {
        let mut f = SmoothingFilter::new(0.15, [1.6, 1.7, 1.8]);
        let out = f.update([1.6, 1.7, 1.8]);
        for (o, e) in out.iter().zip([1.6, 1.7, 1.8]) {
            assert!((o - e).abs() < 1e-6);
        }
    }

    #[test]
    fn single_step_matches_formula() {
        let y = ema_step(1.0, 2.0, 0.25);
        assert!((y - 1.25).abs() < 1e-6);
    }

    #[test]
    fn channels_are_independent() {
        let mut f = SmoothingFilter::new(0.5, [0.0; 3]);
        let out = f.update([2.0, 0.0, -2.0]);
        assert_eq!(out, [1.0, 0.0, -1.0]);
    }
}
