//! Opcodes, sub-commands and port numbers used by the sensor layer.
//!
//! Only the input-device family is covered. Sub-command values share the
//! byte space with the opcode that precedes them, so they are namespaced
//! by prefix.

/// Input device operation (sensor access).
pub const OP_INPUT_DEVICE: u8 = 0x99;

/// `opInput_Device` sub-command: read type and mode of a port.
pub const INPUT_GET_TYPEMODE: u8 = 0x05;

/// `opInput_Device` sub-command: wait until ready, then read percent values.
pub const INPUT_READY_PCT: u8 = 0x1B;

/// `opInput_Device` sub-command: wait until ready, then read raw values.
pub const INPUT_READY_RAW: u8 = 0x1C;

/// `opInput_Device` sub-command: wait until ready, then read SI values.
pub const INPUT_READY_SI: u8 = 0x1D;

/// Sensor port 1.
pub const PORT_1: u8 = 0x00;
/// Sensor port 2.
pub const PORT_2: u8 = 0x01;
/// Sensor port 3.
pub const PORT_3: u8 = 0x02;
/// Sensor port 4.
pub const PORT_4: u8 = 0x03;

/// Returns a human-readable name for an opcode.
pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        OP_INPUT_DEVICE => "opInput_Device",
        _ => "UNKNOWN",
    }
}

/// Returns a human-readable name for an `opInput_Device` sub-command.
pub fn input_subcommand_name(cmd: u8) -> &'static str {
    match cmd {
        INPUT_GET_TYPEMODE => "GET_TYPEMODE",
        INPUT_READY_PCT => "READY_PCT",
        INPUT_READY_RAW => "READY_RAW",
        INPUT_READY_SI => "READY_SI",
        _ => "UNKNOWN",
    }
}
