use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("spi error: {0}")]
    Spi(String),
    #[error("adc channel {0} out of range (0..=7)")]
    ChannelOutOfRange(u8),
}

pub type Result<T> = std::result::Result<T, HwError>;
