use std::io::{self, ErrorKind, Read};

use bytes::BytesMut;

use crate::error::{FrameError, Result};
use crate::message::{
    decode_command, decode_reply, DirectCommand, FrameConfig, Reply, LENGTH_SIZE,
};

/// Reads direct-command messages from any `Read` stream.
///
/// The length prefix is read first and checked against
/// [`FrameConfig::max_message_size`] before the body is buffered. A message
/// that fails the check is skipped on the stream, so the next read starts
/// at the following envelope.
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            config,
        }
    }

    /// Read the next reply (blocking).
    ///
    /// EOF anywhere inside a message, or before it, is
    /// [`FrameError::ConnectionClosed`].
    pub fn read_reply(&mut self) -> Result<Reply> {
        self.next(decode_reply)
    }

    /// Read the next command (blocking). Used on the brick side.
    pub fn read_command(&mut self) -> Result<DirectCommand> {
        self.next(decode_command)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn next<M>(&mut self, decode: fn(&mut BytesMut, usize) -> Result<Option<M>>) -> Result<M> {
        let max = self.config.max_message_size;

        self.buf.clear();
        self.buf.resize(LENGTH_SIZE, 0);
        self.inner.read_exact(&mut self.buf).map_err(stream_error)?;

        let body = usize::from(u16::from_le_bytes([self.buf[0], self.buf[1]]));

        // Validates the declared length; the body is not here yet.
        match decode(&mut self.buf, max) {
            Ok(Some(message)) => return Ok(message),
            Ok(None) => {}
            Err(err) => {
                self.skip(body)?;
                return Err(err);
            }
        }

        self.buf.resize(LENGTH_SIZE + body, 0);
        self.inner
            .read_exact(&mut self.buf[LENGTH_SIZE..])
            .map_err(stream_error)?;

        decode(&mut self.buf, max)?.ok_or(FrameError::Truncated {
            needed: LENGTH_SIZE + body,
            available: self.buf.len(),
        })
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        let mut body = (&mut self.inner).take(len as u64);
        let skipped = io::copy(&mut body, &mut io::sink()).map_err(stream_error)?;
        if skipped < len as u64 {
            return Err(FrameError::ConnectionClosed);
        }
        Ok(())
    }
}

fn stream_error(err: io::Error) -> FrameError {
    match err.kind() {
        ErrorKind::UnexpectedEof => FrameError::ConnectionClosed,
        _ => FrameError::Io(err),
    }
}
