use std::io::{Read, Write};

use bytes::Bytes;
use ev3cmd_transport::{CommandChannel, TransportError};
use tracing::{debug, trace, warn};

use crate::error::FrameError;
use crate::message::{DirectCommand, FrameConfig, ReplyStatus};
use crate::opcodes::opcode_name;
use crate::reader::MessageReader;
use crate::writer::MessageWriter;

/// Configuration for a [`DirectChannel`].
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Reader limits.
    pub frame: FrameConfig,
    /// Counter assigned to the first command.
    pub start_counter: u16,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            start_counter: 42,
        }
    }
}

/// A [`CommandChannel`] speaking the direct-command envelope over a pair of
/// blocking byte streams.
///
/// The link itself (Bluetooth serial, USB HID, WiFi socket) must already be
/// open; this type only frames requests and matches replies to them.
pub struct DirectChannel<R, W> {
    reader: MessageReader<R>,
    writer: MessageWriter<W>,
    counter: u16,
}

impl<R: Read, W: Write> DirectChannel<R, W> {
    /// Create a channel with default configuration.
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, ChannelConfig::default())
    }

    /// Create a channel with explicit configuration.
    pub fn with_config(reader: R, writer: W, config: ChannelConfig) -> Self {
        Self {
            reader: MessageReader::with_config(reader, config.frame),
            writer: MessageWriter::new(writer),
            counter: config.start_counter,
        }
    }

    /// Counter that the next command will carry.
    pub fn next_counter(&self) -> u16 {
        self.counter
    }

    /// Consume the channel and return the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        (self.reader.into_inner(), self.writer.into_inner())
    }

    fn take_counter(&mut self) -> u16 {
        let counter = self.counter;
        self.counter = self.counter.wrapping_add(1);
        counter
    }
}

impl<R: Read, W: Write> CommandChannel for DirectChannel<R, W> {
    fn send(&mut self, ops: &[u8], global_mem: u16) -> ev3cmd_transport::Result<Bytes> {
        let counter = self.take_counter();
        let cmd = DirectCommand::new(counter, global_mem, Bytes::copy_from_slice(ops));
        debug!(
            counter,
            global_mem,
            op = ops.first().map(|op| opcode_name(*op)).unwrap_or("EMPTY"),
            "sending direct command"
        );

        self.writer
            .send_command(&cmd)
            .map_err(frame_to_transport_error)?;
        let reply = loop {
            let reply = self
                .reader
                .read_reply()
                .map_err(frame_to_transport_error)?;
            if reply.counter == counter {
                break reply;
            }
            if is_stale(reply.counter, counter) {
                warn!(expected = counter, stale = reply.counter, "dropping stale reply");
                continue;
            }
            warn!(expected = counter, actual = reply.counter, "reply ahead of request");
            return Err(TransportError::CounterMismatch {
                expected: counter,
                actual: reply.counter,
            });
        };
        if reply.status == ReplyStatus::Error {
            return Err(TransportError::Rejected { counter });
        }

        trace!(counter, len = reply.data.len(), "direct reply");
        Ok(reply.data)
    }

    fn transport_name(&self) -> &'static str {
        "direct-stream"
    }
}

/// Whether `actual` was issued before `expected`, in wrapping counter order.
fn is_stale(actual: u16, expected: u16) -> bool {
    let behind = expected.wrapping_sub(actual);
    behind != 0 && behind <= u16::MAX / 2
}

fn frame_to_transport_error(err: FrameError) -> TransportError {
    match err {
        FrameError::Io(io) => TransportError::Io(io),
        FrameError::ConnectionClosed => TransportError::ConnectionClosed,
        other => TransportError::Malformed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::message::{decode_command, encode_reply, Reply, DEFAULT_MAX_MESSAGE};

    fn canned(replies: &[Reply]) -> Cursor<Vec<u8>> {
        let mut wire = BytesMut::new();
        for reply in replies {
            encode_reply(reply, &mut wire).unwrap();
        }
        Cursor::new(wire.to_vec())
    }

    #[test]
    fn round_trip_returns_global_memory() {
        let reader = canned(&[Reply::ok(42, vec![0x0A, 0, 0, 0])]);
        let mut channel = DirectChannel::new(reader, Vec::<u8>::new());

        let data = channel.send(&[0x99, 0x1C], 4).unwrap();
        assert_eq!(data.as_ref(), &[0x0A, 0, 0, 0]);
        assert_eq!(channel.next_counter(), 43);

        let (_, written) = channel.into_inner();
        let mut wire = BytesMut::from(written.as_slice());
        let cmd = decode_command(&mut wire, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .unwrap();
        assert_eq!(cmd.counter, 42);
        assert_eq!(cmd.global_mem, 4);
        assert!(cmd.reply);
        assert_eq!(cmd.ops.as_ref(), &[0x99, 0x1C]);
    }

    #[test]
    fn counters_advance_per_command() {
        let reader = canned(&[Reply::ok(7, Vec::<u8>::new()), Reply::ok(8, Vec::<u8>::new())]);
        let config = ChannelConfig {
            start_counter: 7,
            ..ChannelConfig::default()
        };
        let mut channel = DirectChannel::with_config(reader, Vec::<u8>::new(), config);

        channel.send(&[0x01], 0).unwrap();
        channel.send(&[0x01], 0).unwrap();
        assert_eq!(channel.next_counter(), 9);
    }

    #[test]
    fn counter_wraps() {
        let reader = canned(&[Reply::ok(u16::MAX, Vec::<u8>::new())]);
        let config = ChannelConfig {
            start_counter: u16::MAX,
            ..ChannelConfig::default()
        };
        let mut channel = DirectChannel::with_config(reader, Vec::<u8>::new(), config);

        channel.send(&[0x01], 0).unwrap();
        assert_eq!(channel.next_counter(), 0);
    }

    #[test]
    fn error_reply_is_rejected() {
        let reader = canned(&[Reply::error(42, vec![0, 0, 0, 0])]);
        let mut channel = DirectChannel::new(reader, Vec::<u8>::new());

        let err = channel.send(&[0x99], 4).unwrap_err();
        assert!(matches!(err, TransportError::Rejected { counter: 42 }));
    }

    #[test]
    fn reply_ahead_of_request_is_rejected() {
        let reader = canned(&[Reply::ok(50, vec![0, 0, 0, 0])]);
        let mut channel = DirectChannel::new(reader, Vec::<u8>::new());

        let err = channel.send(&[0x99], 4).unwrap_err();
        assert!(matches!(
            err,
            TransportError::CounterMismatch {
                expected: 42,
                actual: 50
            }
        ));
    }

    #[test]
    fn stale_replies_are_skipped() {
        let reader = canned(&[
            Reply::ok(7, vec![0xEE; 4]),
            Reply::ok(42, vec![1, 0, 0, 0]),
            Reply::ok(43, vec![2, 0, 0, 0]),
        ]);
        let mut channel = DirectChannel::new(reader, Vec::<u8>::new());

        assert_eq!(channel.send(&[0x99], 4).unwrap().as_ref(), &[1, 0, 0, 0]);
        assert_eq!(channel.send(&[0x99], 4).unwrap().as_ref(), &[2, 0, 0, 0]);
    }

    #[test]
    fn stale_reply_across_counter_wrap() {
        let reader = canned(&[Reply::ok(u16::MAX, Vec::<u8>::new()), Reply::ok(1, vec![9])]);
        let config = ChannelConfig {
            start_counter: 1,
            ..ChannelConfig::default()
        };
        let mut channel = DirectChannel::with_config(reader, Vec::<u8>::new(), config);

        assert_eq!(channel.send(&[0x01], 1).unwrap().as_ref(), &[9]);
    }

    #[test]
    fn only_stale_replies_then_eof_is_connection_closed() {
        let reader = canned(&[Reply::ok(40, Vec::<u8>::new()), Reply::ok(41, Vec::<u8>::new())]);
        let mut channel = DirectChannel::new(reader, Vec::<u8>::new());

        let err = channel.send(&[0x01], 0).unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed));
    }

    #[test]
    fn oversized_reply_does_not_desync_the_stream() {
        let reader = canned(&[Reply::ok(42, vec![0xAB; 64]), Reply::ok(43, vec![7, 0, 0, 0])]);
        let config = ChannelConfig {
            frame: FrameConfig {
                max_message_size: 16,
            },
            ..ChannelConfig::default()
        };
        let mut channel = DirectChannel::with_config(reader, Vec::<u8>::new(), config);

        let err = channel.send(&[0x99], 64).unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
        assert_eq!(channel.send(&[0x99], 4).unwrap().as_ref(), &[7, 0, 0, 0]);
    }

    #[test]
    fn closed_link_maps_to_connection_closed() {
        let mut channel = DirectChannel::new(Cursor::new(Vec::<u8>::new()), Vec::<u8>::new());
        let err = channel.send(&[0x99], 4).unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed));
    }

    #[test]
    fn oversized_reservation_is_malformed() {
        let mut channel = DirectChannel::new(Cursor::new(Vec::<u8>::new()), Vec::<u8>::new());
        let err = channel.send(&[0x99], 2000).unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
    }

    #[test]
    fn short_reply_passes_through_unchanged() {
        let reader = canned(&[Reply::ok(42, vec![0x0A, 0])]);
        let mut channel = DirectChannel::new(reader, Vec::<u8>::new());

        let data = channel.send(&[0x99], 4).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(channel.transport_name(), "direct-stream");
    }
}
