//! EV3 direct-command encoding, reply decoding and message framing.
//!
//! A direct command is a block of byte-code operations the brick executes
//! immediately. Each operation is an opcode followed by its parameters,
//! and every parameter carries its own encoding:
//! - constants are written in the smallest width that holds them
//! - global memory references point into the reply buffer reserved for
//!   the command
//!
//! Commands travel inside a small length-prefixed envelope carrying a
//! message counter and the memory reservation. [`DirectChannel`] runs that
//! envelope over any blocking byte stream.

pub mod codec;
pub mod command;
pub mod direct;
pub mod error;
pub mod message;
pub mod opcodes;
pub mod reader;
pub mod reply;
pub mod writer;

pub use codec::{decode_param, Param};
pub use command::{input_device_ready_raw, OpBuilder};
pub use direct::{ChannelConfig, DirectChannel};
pub use error::{FrameError, Result};
pub use message::{
    decode_command, decode_reply, encode_command, encode_reply, DirectCommand, FrameConfig, Reply,
    ReplyStatus, DEFAULT_MAX_MESSAGE, MAX_GLOBAL_MEM, MAX_LOCAL_MEM,
};
pub use opcodes::{input_subcommand_name, opcode_name, PORT_1, PORT_2, PORT_3, PORT_4};
pub use reader::MessageReader;
pub use reply::{decode_i32, expect_len};
pub use writer::MessageWriter;
