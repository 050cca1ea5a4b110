use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShadeError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unknown parameter: {0}")]
    UnknownParam(String),
    #[error("invalid value {value:?} for parameter {key}")]
    InvalidParam { key: String, value: String },
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing encoder")]
    MissingEncoder,
    #[error("missing motor")]
    MissingMotor,
    #[error("missing motion sensor")]
    MissingMotionSensor,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
