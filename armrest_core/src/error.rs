use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ArmrestError {
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("sensor fault: {0}")]
    SensorFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("malformed record: {0}")]
    Record(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing analog front end")]
    MissingFrontEnd,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
