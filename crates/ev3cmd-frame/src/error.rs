/// Errors that can occur while encoding or decoding direct commands.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A parameter or message ended before all of its bytes were present.
    #[error("truncated input ({available} bytes, need {needed})")]
    Truncated { needed: usize, available: usize },

    /// A parameter lead byte does not describe a known encoding.
    #[error("unknown parameter encoding 0x{0:02X}")]
    UnknownParam(u8),

    /// The memory reservation exceeds what the brick can hold.
    #[error("{kind} memory too large ({size} bytes, max {max})")]
    MemoryTooLarge {
        kind: &'static str,
        size: usize,
        max: usize,
    },

    /// The message exceeds the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The envelope type/status byte is not recognised.
    #[error("invalid message type 0x{0:02X}")]
    InvalidMessageType(u8),

    /// The reply payload does not have the shape the request declared.
    #[error("unexpected reply length (expected {expected} bytes, got {actual})")]
    ReplyLength { expected: usize, actual: usize },

    /// An I/O error occurred while reading or writing messages.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete message was received.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
