use thiserror::Error;

/// Failure reported by a [`GraphicsBackend`](super::GraphicsBackend)
/// resource call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid size {width}x{height} for {what}")]
    InvalidSize {
        what: &'static str,
        width: u32,
        height: u32,
    },

    #[error("{what} data is {actual} bytes, expected {expected}")]
    DataSize {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0} handle table is full")]
    HandlesExhausted(&'static str),

    #[error("failed to create {what}: {reason}")]
    Creation { what: &'static str, reason: String },

    #[error("injected failure: {0}")]
    Injected(&'static str),
}
