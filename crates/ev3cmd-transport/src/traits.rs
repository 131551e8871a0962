use bytes::Bytes;

use crate::error::Result;

/// A synchronous request/reply channel to one EV3 brick.
///
/// `send` blocks the calling thread until the brick answers or the link
/// fails. Timeouts and retries are the implementor's business; callers
/// receive whatever error the link produced.
pub trait CommandChannel {
    /// Send a block of operations and return the reply's global memory.
    ///
    /// `global_mem` is the number of bytes reserved on the brick for the
    /// answer. A well-behaved brick returns exactly that many bytes, but the
    /// channel does not enforce it; checking the reply shape is the caller's
    /// job.
    fn send(&mut self, ops: &[u8], global_mem: u16) -> Result<Bytes>;

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str {
        "unknown"
    }
}

impl<C: CommandChannel + ?Sized> CommandChannel for Box<C> {
    fn send(&mut self, ops: &[u8], global_mem: u16) -> Result<Bytes> {
        (**self).send(ops, global_mem)
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

impl<C: CommandChannel + ?Sized> CommandChannel for &mut C {
    fn send(&mut self, ops: &[u8], global_mem: u16) -> Result<Bytes> {
        (**self).send(ops, global_mem)
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
