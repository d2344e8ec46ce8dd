pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// One of the three load cells under the armrest.
///
/// `Left` is the reference channel for relative-sensitivity correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Left,
    Right,
    Vtc,
}

impl Channel {
    /// Fixed read/report order used everywhere in the pipeline.
    pub const ALL: [Channel; 3] = [Channel::Left, Channel::Right, Channel::Vtc];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Channel::Left => 0,
            Channel::Right => 1,
            Channel::Vtc => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Left => "left",
            Channel::Right => "right",
            Channel::Vtc => "vtc",
        }
    }

    /// Parse a channel name as written in config files and CSV tables.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Channel::Left),
            "right" => Some(Channel::Right),
            "vtc" => Some(Channel::Vtc),
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Source of raw ADC counts for the three analog channels.
pub trait AnalogFrontEnd {
    fn read_counts(
        &mut self,
        channel: Channel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: AnalogFrontEnd + ?Sized> AnalogFrontEnd for Box<T> {
    fn read_counts(
        &mut self,
        channel: Channel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_counts(channel)
    }
}
