use std::fmt;
use std::sync::{Arc, Weak};

use ev3cmd_frame::opcodes::INPUT_READY_RAW;
use ev3cmd_frame::{decode_i32, input_device_ready_raw, input_subcommand_name};
use tracing::{debug, info, trace};

use crate::error::{Result, SensorError};
use crate::port::PortId;
use crate::registry::OwnerId;
use crate::session::Session;

/// Daisy-chain layer addressed by reads. Only the directly connected brick.
pub const LAYER: i32 = 0;

/// Device type passed with raw reads for this sensor family.
pub const UART_DEVICE_TYPE: i32 = 5;

/// Sensor mode used for raw reads.
pub const RAW_MODE: i32 = 0;

const VALUE_COUNT: i32 = 1;
const OUTPUT_OFFSET: u32 = 0;
const REPLY_SIZE: u16 = 4;

/// Exclusive handle to a UART sensor on one port.
///
/// Construction claims the port in the session's registry and fails with
/// [`SensorError::PortInUse`] if another handle holds it. The claim is given
/// back exactly once: by [`UartSensor::release`] or, failing that, when the
/// handle is dropped.
pub struct UartSensor {
    port: PortId,
    owner: OwnerId,
    session: Weak<Session>,
    host: String,
    claimed: bool,
}

impl UartSensor {
    /// Claim the port given as a raw byte (`PORT_1` .. `PORT_4`).
    ///
    /// An invalid byte fails before the session is touched.
    pub fn new(port: u8, session: &Arc<Session>) -> Result<Self> {
        let port = PortId::try_from(port)?;
        Self::on_port(port, session)
    }

    /// Claim `port`.
    pub fn on_port(port: PortId, session: &Arc<Session>) -> Result<Self> {
        let owner = session.allocate_owner();
        session.claim(port, owner)?;
        info!(%port, %owner, host = session.host(), "uart sensor attached");

        Ok(Self {
            port,
            owner,
            session: Arc::downgrade(session),
            host: session.host().to_string(),
            claimed: true,
        })
    }

    /// The port this handle owns.
    pub fn port(&self) -> PortId {
        self.port
    }

    /// Owner token recorded in the registry for this handle.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Whether the handle still holds its port.
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Device type the session's sensor map records for this port.
    pub fn sensor_type(&self) -> Result<Option<u8>> {
        let session = self.session()?;
        let map = session.sensor_map()?;
        Ok(map.get(&self.port).and_then(|info| info.sensor_type))
    }

    /// Read one raw value from the sensor.
    ///
    /// The brick answers with a little-endian `i32`; any other reply length
    /// is a [`SensorError::ProtocolViolation`]. Channel failures come back
    /// as [`SensorError::Transport`] untouched.
    pub fn read_value(&self) -> Result<f64> {
        let session = self.session()?;
        let ops = input_device_ready_raw(
            LAYER,
            self.port.as_byte(),
            UART_DEVICE_TYPE,
            RAW_MODE,
            VALUE_COUNT,
            OUTPUT_OFFSET,
        );
        trace!(port = %self.port, cmd = input_subcommand_name(INPUT_READY_RAW), "reading");

        let reply = session.send_direct_cmd(&ops, REPLY_SIZE)?;
        let raw = decode_i32(&reply)?;
        Ok(f64::from(raw))
    }

    /// Give the port back early. Later calls, and the drop, do nothing.
    pub fn release(&mut self) {
        if !std::mem::replace(&mut self.claimed, false) {
            return;
        }
        match self.session.upgrade() {
            Some(session) => {
                session.release(self.port, self.owner);
            }
            None => debug!(port = %self.port, host = %self.host, "session gone"),
        }
    }

    fn session(&self) -> Result<Arc<Session>> {
        if !self.claimed {
            return Err(SensorError::Released(self.port));
        }
        self.session
            .upgrade()
            .ok_or(SensorError::SessionClosed(self.port))
    }
}

impl Drop for UartSensor {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Display for UartSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.session.upgrade() {
            Some(session) => write!(f, "EV3_UART at {} of {}", self.port, session),
            None => write!(f, "EV3_UART at {} of EV3 {}", self.port, self.host),
        }
    }
}

impl fmt::Debug for UartSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UartSensor")
            .field("port", &self.port)
            .field("owner", &self.owner)
            .field("host", &self.host)
            .field("claimed", &self.claimed)
            .finish()
    }
}
