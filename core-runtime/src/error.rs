use thiserror::Error;

/// Errors raised while wiring the core to its host.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration value or logging setup failure.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required host bridge was not injected.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
