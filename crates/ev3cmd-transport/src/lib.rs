//! Transport-agnostic command channel abstraction.
//!
//! The EV3 brick can be reached over Bluetooth, USB or WiFi. Whatever the
//! link, the rest of ev3cmd only needs one thing from it: send a block of
//! direct-command operations, reserve some global memory for the answer,
//! and get the reply bytes back.
//!
//! This is the lowest layer of ev3cmd. Everything else builds on top of
//! the [`CommandChannel`] trait provided here.

pub mod error;
pub mod traits;

pub use error::{Result, TransportError};
pub use traits::CommandChannel;
