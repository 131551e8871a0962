use ev3cmd_frame::FrameError;
use ev3cmd_transport::TransportError;

use crate::port::PortId;

/// Errors that can occur in sensor operations.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The port byte is not one of the four sensor ports.
    #[error("invalid port 0x{0:02X} (expected PORT_1, PORT_2, PORT_3 or PORT_4)")]
    InvalidPort(u8),

    /// Another handle already owns the port.
    #[error("{port} of {host} already in use")]
    PortInUse { port: PortId, host: String },

    /// The reply did not have the shape the request declared.
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] FrameError),

    /// The command channel failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The handle has already given its port back.
    #[error("sensor at {0} already released")]
    Released(PortId),

    /// The session the handle was created from no longer exists.
    #[error("session for sensor at {0} has been dropped")]
    SessionClosed(PortId),

    /// The introspection provider could not produce a sensor map.
    #[error("introspection failed: {0}")]
    Introspection(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SensorError>;
