use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Size of the length prefix in front of every message.
pub const LENGTH_SIZE: usize = 2;

/// Command header after the length prefix: counter (2) + type (1) + memory (2).
pub const COMMAND_HEADER_SIZE: usize = 5;

/// Reply header after the length prefix: counter (2) + status (1).
pub const REPLY_HEADER_SIZE: usize = 3;

/// Command type: execute and send a reply.
pub const DIRECT_COMMAND_REPLY: u8 = 0x00;
/// Command type: execute silently.
pub const DIRECT_COMMAND_NO_REPLY: u8 = 0x80;
/// Reply status: command executed.
pub const DIRECT_REPLY: u8 = 0x02;
/// Reply status: command failed on the brick.
pub const DIRECT_REPLY_ERROR: u8 = 0x04;

/// Largest global memory reservation the brick accepts.
pub const MAX_GLOBAL_MEM: u16 = 1019;
/// Largest local memory reservation the brick accepts.
pub const MAX_LOCAL_MEM: u8 = 63;

/// Default maximum message body size accepted by readers.
pub const DEFAULT_MAX_MESSAGE: usize = 1024;

const LOCAL_MEM_SHIFT: u16 = 10;
const GLOBAL_MEM_MASK: u16 = 0x03FF;

/// A direct command envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectCommand {
    /// Message counter, echoed back by the reply.
    pub counter: u16,
    /// Whether the brick should answer.
    pub reply: bool,
    /// Bytes of global memory reserved for the reply.
    pub global_mem: u16,
    /// Bytes of local scratch memory reserved on the brick.
    pub local_mem: u8,
    /// The operation block.
    pub ops: Bytes,
}

impl DirectCommand {
    /// Create a command that expects a reply of `global_mem` bytes.
    pub fn new(counter: u16, global_mem: u16, ops: impl Into<Bytes>) -> Self {
        Self {
            counter,
            reply: true,
            global_mem,
            local_mem: 0,
            ops: ops.into(),
        }
    }

    /// Reserve local scratch memory.
    pub fn with_local_mem(mut self, local_mem: u8) -> Self {
        self.local_mem = local_mem;
        self
    }

    /// Ask the brick not to answer.
    pub fn without_reply(mut self) -> Self {
        self.reply = false;
        self
    }

    /// The total wire size of this command.
    pub fn wire_size(&self) -> usize {
        LENGTH_SIZE + COMMAND_HEADER_SIZE + self.ops.len()
    }
}

/// Status of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// The brick executed the command (`0x02`).
    Ok,
    /// The brick rejected or failed the command (`0x04`).
    Error,
}

/// A direct reply envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Counter of the command this answers.
    pub counter: u16,
    /// Whether the brick executed the command.
    pub status: ReplyStatus,
    /// Contents of the global memory after execution.
    pub data: Bytes,
}

impl Reply {
    /// Create a successful reply.
    pub fn ok(counter: u16, data: impl Into<Bytes>) -> Self {
        Self {
            counter,
            status: ReplyStatus::Ok,
            data: data.into(),
        }
    }

    /// Create an error reply.
    pub fn error(counter: u16, data: impl Into<Bytes>) -> Self {
        Self {
            counter,
            status: ReplyStatus::Error,
            data: data.into(),
        }
    }

    /// The total wire size of this reply.
    pub fn wire_size(&self) -> usize {
        LENGTH_SIZE + REPLY_HEADER_SIZE + self.data.len()
    }
}

/// Configuration for message readers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum message body size in bytes. Default: 1024.
    pub max_message_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE,
        }
    }
}

/// Encode a direct command into the wire format.
///
/// Wire format (all fields little-endian):
/// ```text
/// ┌────────────┬─────────────┬──────────┬──────────────────────┬─────────────┐
/// │ Length     │ Counter     │ Type     │ Memory               │ Operations  │
/// │ (2B)       │ (2B)        │ (1B)     │ global | local << 10 │             │
/// └────────────┴─────────────┴──────────┴──────────────────────┴─────────────┘
/// ```
/// Length counts every byte after the length field itself.
pub fn encode_command(cmd: &DirectCommand, dst: &mut BytesMut) -> Result<()> {
    if cmd.global_mem > MAX_GLOBAL_MEM {
        return Err(FrameError::MemoryTooLarge {
            kind: "global",
            size: usize::from(cmd.global_mem),
            max: usize::from(MAX_GLOBAL_MEM),
        });
    }
    if cmd.local_mem > MAX_LOCAL_MEM {
        return Err(FrameError::MemoryTooLarge {
            kind: "local",
            size: usize::from(cmd.local_mem),
            max: usize::from(MAX_LOCAL_MEM),
        });
    }
    let body = COMMAND_HEADER_SIZE + cmd.ops.len();
    if body > usize::from(u16::MAX) {
        return Err(FrameError::MessageTooLarge {
            size: body,
            max: usize::from(u16::MAX),
        });
    }

    let kind = if cmd.reply {
        DIRECT_COMMAND_REPLY
    } else {
        DIRECT_COMMAND_NO_REPLY
    };
    dst.reserve(LENGTH_SIZE + body);
    dst.put_u16_le(body as u16);
    dst.put_u16_le(cmd.counter);
    dst.put_u8(kind);
    dst.put_u16_le(cmd.global_mem | (u16::from(cmd.local_mem) << LOCAL_MEM_SHIFT));
    dst.put_slice(&cmd.ops);
    Ok(())
}

/// Decode a direct command from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete command yet.
/// On success, consumes the command bytes from the buffer.
pub fn decode_command(src: &mut BytesMut, max_message: usize) -> Result<Option<DirectCommand>> {
    let Some(body) = complete_body(src, COMMAND_HEADER_SIZE, max_message)? else {
        return Ok(None);
    };

    let reply = match src[LENGTH_SIZE + 2] {
        DIRECT_COMMAND_REPLY => true,
        DIRECT_COMMAND_NO_REPLY => false,
        other => return Err(FrameError::InvalidMessageType(other)),
    };

    src.advance(LENGTH_SIZE);
    let counter = src.get_u16_le();
    src.advance(1);
    let memory = src.get_u16_le();
    let ops = src.split_to(body - COMMAND_HEADER_SIZE).freeze();

    Ok(Some(DirectCommand {
        counter,
        reply,
        global_mem: memory & GLOBAL_MEM_MASK,
        local_mem: (memory >> LOCAL_MEM_SHIFT) as u8,
        ops,
    }))
}

/// Encode a reply into the wire format.
///
/// Wire format: length (2B LE), counter (2B LE), status (1B), global memory.
pub fn encode_reply(reply: &Reply, dst: &mut BytesMut) -> Result<()> {
    let body = REPLY_HEADER_SIZE + reply.data.len();
    if body > usize::from(u16::MAX) {
        return Err(FrameError::MessageTooLarge {
            size: body,
            max: usize::from(u16::MAX),
        });
    }

    let status = match reply.status {
        ReplyStatus::Ok => DIRECT_REPLY,
        ReplyStatus::Error => DIRECT_REPLY_ERROR,
    };
    dst.reserve(LENGTH_SIZE + body);
    dst.put_u16_le(body as u16);
    dst.put_u16_le(reply.counter);
    dst.put_u8(status);
    dst.put_slice(&reply.data);
    Ok(())
}

/// Decode a reply from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete reply yet.
/// On success, consumes the reply bytes from the buffer.
pub fn decode_reply(src: &mut BytesMut, max_message: usize) -> Result<Option<Reply>> {
    let Some(body) = complete_body(src, REPLY_HEADER_SIZE, max_message)? else {
        return Ok(None);
    };

    let status = match src[LENGTH_SIZE + 2] {
        DIRECT_REPLY => ReplyStatus::Ok,
        DIRECT_REPLY_ERROR => ReplyStatus::Error,
        other => return Err(FrameError::InvalidMessageType(other)),
    };

    src.advance(LENGTH_SIZE);
    let counter = src.get_u16_le();
    src.advance(1);
    let data = src.split_to(body - REPLY_HEADER_SIZE).freeze();

    Ok(Some(Reply {
        counter,
        status,
        data,
    }))
}

/// Length of the message body at the front of `src`, once all of it is
/// buffered.
fn complete_body(src: &BytesMut, header: usize, max_message: usize) -> Result<Option<usize>> {
    if src.len() < LENGTH_SIZE {
        return Ok(None); // Need more data
    }

    let body = usize::from(u16::from_le_bytes([src[0], src[1]]));
    if body < header {
        return Err(FrameError::Truncated {
            needed: header,
            available: body,
        });
    }
    if body > max_message {
        return Err(FrameError::MessageTooLarge {
            size: body,
            max: max_message,
        });
    }
    if src.len() < LENGTH_SIZE + body {
        return Ok(None); // Need more data
    }

    Ok(Some(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_wire_layout() {
        let cmd = DirectCommand::new(0x002A, 4, vec![0x99, 0x1C]);
        let mut buf = BytesMut::new();
        encode_command(&cmd, &mut buf).unwrap();

        assert_eq!(buf.len(), cmd.wire_size());
        assert_eq!(
            buf.as_ref(),
            &[0x07, 0x00, 0x2A, 0x00, 0x00, 0x04, 0x00, 0x99, 0x1C]
        );
    }

    #[test]
    fn command_memory_header_packs_local() {
        let cmd = DirectCommand::new(1, 0x0105, vec![0x01])
            .with_local_mem(3)
            .without_reply();
        let mut buf = BytesMut::new();
        encode_command(&cmd, &mut buf).unwrap();

        assert_eq!(buf[4], DIRECT_COMMAND_NO_REPLY);
        assert_eq!(u16::from_le_bytes([buf[5], buf[6]]), 0x0105 | (3 << 10));

        let decoded = decode_command(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, cmd);
        assert!(buf.is_empty());
    }

    #[test]
    fn global_memory_limit() {
        let cmd = DirectCommand::new(1, MAX_GLOBAL_MEM + 1, vec![0x01]);
        let err = encode_command(&cmd, &mut BytesMut::new()).unwrap_err();
        assert!(matches!(
            err,
            FrameError::MemoryTooLarge { kind: "global", .. }
        ));
    }

    #[test]
    fn local_memory_limit() {
        let cmd = DirectCommand::new(1, 0, vec![0x01]).with_local_mem(MAX_LOCAL_MEM + 1);
        let err = encode_command(&cmd, &mut BytesMut::new()).unwrap_err();
        assert!(matches!(err, FrameError::MemoryTooLarge { kind: "local", .. }));
    }

    #[test]
    fn reply_wire_layout() {
        let reply = Reply::ok(7, vec![0x0A, 0x00, 0x00, 0x00]);
        let mut buf = BytesMut::new();
        encode_reply(&reply, &mut buf).unwrap();
        assert_eq!(buf.len(), reply.wire_size());
        assert_eq!(
            buf.as_ref(),
            &[0x07, 0x00, 0x07, 0x00, 0x02, 0x0A, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn decode_error_reply() {
        let mut buf = BytesMut::from(&[0x03, 0x00, 0x09, 0x00, 0x04][..]);
        let reply = decode_reply(&mut buf, DEFAULT_MAX_MESSAGE).unwrap().unwrap();
        assert_eq!(reply.counter, 9);
        assert_eq!(reply.status, ReplyStatus::Error);
        assert!(reply.data.is_empty());
    }

    #[test]
    fn decode_incomplete_reply() {
        let mut buf = BytesMut::from(&[0x07, 0x00, 0x01][..]);
        assert!(decode_reply(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .is_none());

        let mut buf = BytesMut::from(&[0x07, 0x00, 0x01, 0x00, 0x02, 0xAA][..]);
        assert!(decode_reply(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .is_none());
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn decode_reply_invalid_status() {
        let mut buf = BytesMut::from(&[0x03, 0x00, 0x01, 0x00, 0x7E][..]);
        let err = decode_reply(&mut buf, DEFAULT_MAX_MESSAGE).unwrap_err();
        assert!(matches!(err, FrameError::InvalidMessageType(0x7E)));
    }

    #[test]
    fn decode_reply_body_shorter_than_header() {
        let mut buf = BytesMut::from(&[0x01, 0x00, 0x01][..]);
        let err = decode_reply(&mut buf, DEFAULT_MAX_MESSAGE).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { .. }));
    }

    #[test]
    fn decode_reply_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u16_le(2000);
        let err = decode_reply(&mut buf, DEFAULT_MAX_MESSAGE).unwrap_err();
        assert!(matches!(
            err,
            FrameError::MessageTooLarge {
                size: 2000,
                max: DEFAULT_MAX_MESSAGE
            }
        ));
    }

    #[test]
    fn back_to_back_replies() {
        let mut buf = BytesMut::new();
        encode_reply(&Reply::ok(1, vec![1]), &mut buf).unwrap();
        encode_reply(&Reply::ok(2, vec![2, 2]), &mut buf).unwrap();

        let r1 = decode_reply(&mut buf, DEFAULT_MAX_MESSAGE).unwrap().unwrap();
        let r2 = decode_reply(&mut buf, DEFAULT_MAX_MESSAGE).unwrap().unwrap();
        assert_eq!((r1.counter, r1.data.as_ref()), (1, [1u8].as_ref()));
        assert_eq!((r2.counter, r2.data.as_ref()), (2, [2u8, 2].as_ref()));
        assert!(buf.is_empty());
    }
}
