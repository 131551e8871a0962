//! Typed views over a reply's global memory.

use bytes::Buf;

use crate::error::{FrameError, Result};

/// Check that a reply holds exactly `expected` bytes.
pub fn expect_len(reply: &[u8], expected: usize) -> Result<()> {
    if reply.len() != expected {
        return Err(FrameError::ReplyLength {
            expected,
            actual: reply.len(),
        });
    }
    Ok(())
}

/// Decode a reply holding one little-endian signed 32-bit integer.
pub fn decode_i32(mut reply: &[u8]) -> Result<i32> {
    expect_len(reply, 4)?;
    Ok(reply.get_i32_le())
}
