use thiserror::Error;

/// Failure reported by a host bridge implementation.
///
/// Engines report media failures through signals, not through this type;
/// it covers the auxiliary bridges (log sinks) whose calls can fail.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host pipeline rejected or dropped the request.
    #[error("Host rejected request: {0}")]
    Rejected(String),

    /// The host pipeline is gone (process shutting down, channel closed).
    #[error("Host bridge closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let err: BridgeError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, BridgeError::Io(_)));
        assert_eq!(BridgeError::Closed.to_string(), "Host bridge closed");
    }
}
