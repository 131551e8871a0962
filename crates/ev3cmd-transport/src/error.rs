/// Errors that can occur while exchanging direct commands with the brick.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the underlying link.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link was closed before a complete reply was received.
    #[error("connection closed (incomplete reply)")]
    ConnectionClosed,

    /// The brick answered with a direct-reply error status.
    #[error("direct command {counter} rejected by the brick")]
    Rejected { counter: u16 },

    /// The reply belongs to a different request.
    #[error("reply counter mismatch (expected {expected}, got {actual})")]
    CounterMismatch { expected: u16, actual: u16 },

    /// The reply envelope could not be parsed.
    #[error("malformed reply: {0}")]
    Malformed(String),

    /// The channel has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
