use ev3cmd_transport::CommandChannel;

use crate::error::Result;
use crate::port::PortId;
use crate::registry::{SensorInfo, SensorMap};

/// Source of the per-session sensor map.
///
/// Called at most once per [`Session`](crate::Session), under the session
/// lock, the first time a handle needs the map. Implementations may use the
/// channel to query the brick.
pub trait IntrospectionProvider: Send + Sync {
    fn sensor_map(&self, channel: &mut dyn CommandChannel) -> Result<SensorMap>;
}

impl<F> IntrospectionProvider for F
where
    F: Fn(&mut dyn CommandChannel) -> Result<SensorMap> + Send + Sync,
{
    fn sensor_map(&self, channel: &mut dyn CommandChannel) -> Result<SensorMap> {
        self(channel)
    }
}

/// A fixed sensor map, for setups whose wiring is known in advance.
#[derive(Debug, Clone, Default)]
pub struct StaticIntrospection {
    map: SensorMap,
}

impl StaticIntrospection {
    /// Use `map` as the sensor map.
    pub fn new(map: SensorMap) -> Self {
        Self { map }
    }

    /// Parse a map such as `{"PORT_1": {"type": 33}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Record a device type for `port`.
    pub fn with_sensor(mut self, port: PortId, sensor_type: u8) -> Self {
        self.map.entry(port).or_default().sensor_type = Some(sensor_type);
        self
    }
}

impl IntrospectionProvider for StaticIntrospection {
    fn sensor_map(&self, _channel: &mut dyn CommandChannel) -> Result<SensorMap> {
        Ok(self.map.clone())
    }
}

impl From<SensorMap> for StaticIntrospection {
    fn from(map: SensorMap) -> Self {
        Self::new(map)
    }
}

impl FromIterator<(PortId, SensorInfo)> for StaticIntrospection {
    fn from_iter<I: IntoIterator<Item = (PortId, SensorInfo)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
