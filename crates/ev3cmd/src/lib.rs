//! EV3 direct commands: UART sensor access over any transport.
//!
//! # Crate Structure
//!
//! - [`transport`]: The command channel abstraction every link implements
//! - [`frame`]: Parameter encoding, reply decoding and the message envelope
//! - [`sensor`]: Sessions and exclusive UART sensor handles (behind `sensor` feature)

/// Re-export transport types.
pub mod transport {
    pub use ev3cmd_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ev3cmd_frame::*;
}

/// Re-export sensor types (requires `sensor` feature).
#[cfg(feature = "sensor")]
pub mod sensor {
    pub use ev3cmd_sensor::*;
}
