use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

// Lead byte layout.
//
// Short form (bit 7 clear):
//   00vv_vvvv  constant, 6-bit two's complement
//   010i_iiii  local variable at offset i
//   011i_iiii  global variable at offset i
//
// Long form (bit 7 set), payload width in the low three bits:
//   1000_0sss  constant
//   1100_0sss  local variable
//   1110_0sss  global variable
const LONG: u8 = 0x80;
const VARIABLE: u8 = 0x40;
const GLOBAL: u8 = 0x20;
const SHORT_VALUE_MASK: u8 = 0x3F;
const SHORT_INDEX_MASK: u8 = 0x1F;
const KIND_MASK: u8 = 0x60;
const RESERVED_MASK: u8 = 0x18;
const WIDTH_MASK: u8 = 0x07;

const FOLLOWS_1: u8 = 0x01;
const FOLLOWS_2: u8 = 0x02;
const FOLLOWS_4: u8 = 0x03;

/// One encoded operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Immediate signed constant (LCX).
    Constant(i32),
    /// Offset into the command's local memory (LVX).
    Local(u32),
    /// Offset into the command's global memory, i.e. the reply (GVX).
    Global(u32),
}

impl Param {
    /// Append the smallest encoding of this parameter to `dst`.
    pub fn encode(self, dst: &mut BytesMut) {
        match self {
            Param::Constant(value) => put_constant(value, dst),
            Param::Local(offset) => put_variable(VARIABLE, offset, dst),
            Param::Global(offset) => put_variable(VARIABLE | GLOBAL, offset, dst),
        }
    }

    /// Encode this parameter into a fresh buffer.
    pub fn to_bytes(self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Number of bytes [`Param::encode`] will write.
    pub fn encoded_len(self) -> usize {
        match self {
            Param::Constant(-32..=31) => 1,
            Param::Constant(-127..=127) => 2,
            Param::Constant(-32767..=32767) => 3,
            Param::Constant(_) => 5,
            Param::Local(offset) | Param::Global(offset) => match offset {
                0..=31 => 1,
                32..=0xFF => 2,
                0x100..=0xFFFF => 3,
                _ => 5,
            },
        }
    }
}

fn put_constant(value: i32, dst: &mut BytesMut) {
    match value {
        -32..=31 => dst.put_u8(value as u8 & SHORT_VALUE_MASK),
        -127..=127 => {
            dst.put_u8(LONG | FOLLOWS_1);
            dst.put_i8(value as i8);
        }
        -32767..=32767 => {
            dst.put_u8(LONG | FOLLOWS_2);
            dst.put_i16_le(value as i16);
        }
        _ => {
            dst.put_u8(LONG | FOLLOWS_4);
            dst.put_i32_le(value);
        }
    }
}

fn put_variable(kind: u8, offset: u32, dst: &mut BytesMut) {
    match offset {
        0..=31 => dst.put_u8(kind | offset as u8),
        32..=0xFF => {
            dst.put_u8(LONG | kind | FOLLOWS_1);
            dst.put_u8(offset as u8);
        }
        0x100..=0xFFFF => {
            dst.put_u8(LONG | kind | FOLLOWS_2);
            dst.put_u16_le(offset as u16);
        }
        _ => {
            dst.put_u8(LONG | kind | FOLLOWS_4);
            dst.put_u32_le(offset);
        }
    }
}

/// Decode one parameter from the front of `src`.
///
/// Returns the parameter and the number of bytes it occupied.
pub fn decode_param(src: &[u8]) -> Result<(Param, usize)> {
    let lead = *src.first().ok_or(FrameError::Truncated {
        needed: 1,
        available: 0,
    })?;

    if lead & LONG == 0 {
        let param = if lead & VARIABLE == 0 {
            // Sign-extend the 6-bit payload.
            Param::Constant(i32::from(((lead << 2) as i8) >> 2))
        } else if lead & GLOBAL == 0 {
            Param::Local(u32::from(lead & SHORT_INDEX_MASK))
        } else {
            Param::Global(u32::from(lead & SHORT_INDEX_MASK))
        };
        return Ok((param, 1));
    }

    if lead & RESERVED_MASK != 0 {
        return Err(FrameError::UnknownParam(lead));
    }
    let width = match lead & WIDTH_MASK {
        FOLLOWS_1 => 1,
        FOLLOWS_2 => 2,
        FOLLOWS_4 => 4,
        _ => return Err(FrameError::UnknownParam(lead)),
    };
    if src.len() < 1 + width {
        return Err(FrameError::Truncated {
            needed: 1 + width,
            available: src.len(),
        });
    }

    let mut body = &src[1..1 + width];
    let param = match lead & KIND_MASK {
        0 => Param::Constant(match width {
            1 => i32::from(body.get_i8()),
            2 => i32::from(body.get_i16_le()),
            _ => body.get_i32_le(),
        }),
        kind if kind & VARIABLE != 0 => {
            let offset = match width {
                1 => u32::from(body.get_u8()),
                2 => u32::from(body.get_u16_le()),
                _ => body.get_u32_le(),
            };
            if kind & GLOBAL != 0 {
                Param::Global(offset)
            } else {
                Param::Local(offset)
            }
        }
        // Labels are not valid in direct commands.
        _ => return Err(FrameError::UnknownParam(lead)),
    };

    Ok((param, 1 + width))
}
