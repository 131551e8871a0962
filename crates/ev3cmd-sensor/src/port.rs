use std::fmt;

use ev3cmd_frame::{PORT_1, PORT_2, PORT_3, PORT_4};
use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// Number of sensor ports on a brick.
pub const PORT_COUNT: usize = 4;

/// One of the four sensor ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PortId {
    #[serde(rename = "PORT_1")]
    Port1,
    #[serde(rename = "PORT_2")]
    Port2,
    #[serde(rename = "PORT_3")]
    Port3,
    #[serde(rename = "PORT_4")]
    Port4,
}

impl PortId {
    /// All ports in order.
    pub const ALL: [PortId; PORT_COUNT] =
        [PortId::Port1, PortId::Port2, PortId::Port3, PortId::Port4];

    /// Wire value of the port.
    pub fn as_byte(self) -> u8 {
        match self {
            PortId::Port1 => PORT_1,
            PortId::Port2 => PORT_2,
            PortId::Port3 => PORT_3,
            PortId::Port4 => PORT_4,
        }
    }

    /// Port number as printed on the brick (1-based).
    pub fn number(self) -> u8 {
        self.as_byte() + 1
    }

    pub(crate) fn index(self) -> usize {
        usize::from(self.as_byte())
    }
}

impl TryFrom<u8> for PortId {
    type Error = SensorError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            PORT_1 => Ok(PortId::Port1),
            PORT_2 => Ok(PortId::Port2),
            PORT_3 => Ok(PortId::Port3),
            PORT_4 => Ok(PortId::Port4),
            other => Err(SensorError::InvalidPort(other)),
        }
    }
}

impl From<PortId> for u8 {
    fn from(port: PortId) -> Self {
        port.as_byte()
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PORT_{}", self.number())
    }
}
