//! Front ends for tests and for driving the pipeline without hardware.

use armrest_traits::{AnalogFrontEnd, Channel};

/// Returns the same counts for every read.
#[derive(Debug, Clone, Copy)]
pub struct ConstantFrontEnd {
    counts: [u16; 3],
}

impl ConstantFrontEnd {
    pub fn new(counts: [u16; 3]) -> Self {
        Self { counts }
    }
}

impl AnalogFrontEnd for ConstantFrontEnd {
    fn read_counts(
        &mut self,
        channel: Channel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.counts[channel.index()])
    }
}

/// A front end whose every read fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingFrontEnd;

impl AnalogFrontEnd for FailingFrontEnd {
    fn read_counts(
        &mut self,
        _channel: Channel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("adc not responding")))
    }
}
