use std::io::{self, ErrorKind, Write};

use bytes::BytesMut;

use crate::error::{FrameError, Result};
use crate::message::{encode_command, encode_reply, DirectCommand, Reply};

/// Writes direct-command messages to any `Write` stream.
///
/// Each message is encoded in full before the first byte goes out, so a
/// message rejected by the encoder never leaves a partial envelope on the
/// wire.
pub struct MessageWriter<T> {
    inner: T,
}

impl<T: Write> MessageWriter<T> {
    /// Create a new message writer.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Encode and send a command (blocking).
    pub fn send_command(&mut self, cmd: &DirectCommand) -> Result<()> {
        let mut wire = BytesMut::with_capacity(cmd.wire_size());
        encode_command(cmd, &mut wire)?;
        self.put(&wire)
    }

    /// Encode and send a reply (blocking). Used on the brick side.
    pub fn send_reply(&mut self, reply: &Reply) -> Result<()> {
        let mut wire = BytesMut::with_capacity(reply.wire_size());
        encode_reply(reply, &mut wire)?;
        self.put(&wire)
    }

    /// Flush the underlying stream, retrying on `Interrupted`.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                other => return other.map_err(stream_error),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    // `write_all` already retries `Interrupted`.
    fn put(&mut self, wire: &[u8]) -> Result<()> {
        self.inner.write_all(wire).map_err(stream_error)?;
        self.flush()
    }
}

fn stream_error(err: io::Error) -> FrameError {
    match err.kind() {
        ErrorKind::WriteZero | ErrorKind::BrokenPipe => FrameError::ConnectionClosed,
        _ => FrameError::Io(err),
    }
}
