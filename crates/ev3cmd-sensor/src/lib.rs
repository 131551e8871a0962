//! Exclusive-access UART sensor handles for EV3 bricks.
//!
//! A [`Session`] bundles one brick's command channel with the record of
//! which handle owns which sensor port. A [`UartSensor`] claims its port on
//! construction, reads raw values through the session's channel, and gives
//! the port back when it is released or dropped.
//!
//! ```rust,ignore
//! use ev3cmd_sensor::{PortId, Session, StaticIntrospection, UartSensor};
//!
//! let session = Session::new("00:16:53:42:2B:99", channel, StaticIntrospection::default());
//! let sensor = UartSensor::on_port(PortId::Port1, &session)?;
//! println!("{sensor}: {}", sensor.read_value()?);
//! ```

pub mod error;
pub mod introspection;
pub mod port;
pub mod registry;
pub mod session;
pub mod uart;

pub use error::{Result, SensorError};
pub use introspection::{IntrospectionProvider, StaticIntrospection};
pub use port::{PortId, PORT_COUNT};
pub use registry::{OwnerId, PortInUse, PortRegistry, SensorInfo, SensorMap};
pub use session::Session;
pub use uart::{UartSensor, LAYER, RAW_MODE, UART_DEVICE_TYPE};
