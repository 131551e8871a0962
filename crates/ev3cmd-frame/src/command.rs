use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::Param;
use crate::opcodes::{INPUT_READY_RAW, OP_INPUT_DEVICE};

const INITIAL_CAPACITY: usize = 32;

/// Builds the operation block of a direct command.
///
/// Operations are appended in order; several may be chained into one
/// command with [`OpBuilder::op`].
#[derive(Debug, Clone)]
pub struct OpBuilder {
    buf: BytesMut,
}

impl OpBuilder {
    /// Start a block with its first opcode.
    pub fn new(opcode: u8) -> Self {
        let mut buf = BytesMut::with_capacity(INITIAL_CAPACITY);
        buf.put_u8(opcode);
        Self { buf }
    }

    /// Append another opcode.
    pub fn op(mut self, opcode: u8) -> Self {
        self.buf.put_u8(opcode);
        self
    }

    /// Append a sub-command byte. Sub-commands are written verbatim.
    pub fn subcommand(mut self, cmd: u8) -> Self {
        self.buf.put_u8(cmd);
        self
    }

    /// Append an encoded parameter.
    pub fn param(mut self, param: Param) -> Self {
        param.encode(&mut self.buf);
        self
    }

    /// Append a constant parameter (LCX).
    pub fn constant(self, value: i32) -> Self {
        self.param(Param::Constant(value))
    }

    /// Append a global memory reference (GVX).
    pub fn global(self, offset: u32) -> Self {
        self.param(Param::Global(offset))
    }

    /// Append a local memory reference (LVX).
    pub fn local(self, offset: u32) -> Self {
        self.param(Param::Local(offset))
    }

    /// Length of the block so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether no bytes have been written. A builder created with `new` is never empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Freeze the block.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// `opInput_Device READY_RAW`: wait for the device on `port` to be ready and
/// write `values` raw 32-bit readings to global memory at `output`.
pub fn input_device_ready_raw(
    layer: i32,
    port: u8,
    device_type: i32,
    mode: i32,
    values: i32,
    output: u32,
) -> Bytes {
    OpBuilder::new(OP_INPUT_DEVICE)
        .subcommand(INPUT_READY_RAW)
        .constant(layer)
        .constant(i32::from(port))
        .constant(device_type)
        .constant(mode)
        .constant(values)
        .global(output)
        .finish()
}
