use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::port::{PortId, PORT_COUNT};

/// Opaque token identifying the handle that owns a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Wrap a raw owner number.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw owner number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// What is known about one port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorInfo {
    /// Device type reported for the port, if any.
    #[serde(rename = "type", default)]
    pub sensor_type: Option<u8>,
    /// Handle currently owning the port.
    #[serde(default)]
    pub used_by: Option<OwnerId>,
}

/// Port-keyed view of a brick's sensors.
pub type SensorMap = BTreeMap<PortId, SensorInfo>;

/// The port was already owned when a claim was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{port} already claimed by {owner}")]
pub struct PortInUse {
    pub port: PortId,
    pub owner: OwnerId,
}

/// Who owns which port.
///
/// At most one owner per port. The registry performs no locking of its own;
/// [`Session`](crate::Session) keeps it behind the session lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortRegistry {
    slots: [SensorInfo; PORT_COUNT],
}

impl PortRegistry {
    /// Create a registry with every port free and no type information.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from an introspection result.
    ///
    /// Ports missing from the map start out free with no type.
    pub fn from_sensor_map(map: &SensorMap) -> Self {
        let mut registry = Self::new();
        for (port, info) in map {
            registry.slots[port.index()] = *info;
        }
        registry
    }

    /// Mark `port` as owned by `owner`.
    ///
    /// Fails without touching the registry if the port is already owned,
    /// including by `owner` itself.
    pub fn claim(&mut self, port: PortId, owner: OwnerId) -> Result<(), PortInUse> {
        let slot = &mut self.slots[port.index()];
        if let Some(current) = slot.used_by {
            return Err(PortInUse {
                port,
                owner: current,
            });
        }
        slot.used_by = Some(owner);
        Ok(())
    }

    /// Mark `port` as free. No effect if it already is.
    pub fn release(&mut self, port: PortId) {
        self.slots[port.index()].used_by = None;
    }

    /// Mark `port` as free only if `owner` holds it.
    ///
    /// Returns whether the port was released.
    pub fn release_owned(&mut self, port: PortId, owner: OwnerId) -> bool {
        let slot = &mut self.slots[port.index()];
        if slot.used_by == Some(owner) {
            slot.used_by = None;
            true
        } else {
            false
        }
    }

    /// Current owner of `port`.
    pub fn owner(&self, port: PortId) -> Option<OwnerId> {
        self.slots[port.index()].used_by
    }

    /// Device type recorded for `port`.
    pub fn sensor_type(&self, port: PortId) -> Option<u8> {
        self.slots[port.index()].sensor_type
    }

    /// Copy of the registry as a port-keyed map.
    pub fn snapshot(&self) -> SensorMap {
        PortId::ALL
            .into_iter()
            .map(|port| (port, self.slots[port.index()]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_each_free_port() {
        let mut registry = PortRegistry::new();
        for (n, port) in PortId::ALL.into_iter().enumerate() {
            let owner = OwnerId::new(n as u64);
            registry.claim(port, owner).unwrap();
            assert_eq!(registry.owner(port), Some(owner));
        }
    }

    #[test]
    fn second_claim_fails_and_leaves_registry_unchanged() {
        let mut registry = PortRegistry::new();
        registry.claim(PortId::Port2, OwnerId::new(1)).unwrap();
        let before = registry.clone();

        let err = registry.claim(PortId::Port2, OwnerId::new(2)).unwrap_err();
        assert_eq!(
            err,
            PortInUse {
                port: PortId::Port2,
                owner: OwnerId::new(1)
            }
        );
        assert_eq!(registry, before);
    }

    #[test]
    fn same_owner_cannot_claim_twice() {
        let mut registry = PortRegistry::new();
        registry.claim(PortId::Port1, OwnerId::new(7)).unwrap();
        assert!(registry.claim(PortId::Port1, OwnerId::new(7)).is_err());
    }

    #[test]
    fn release_is_idempotent() {
        let mut once = PortRegistry::new();
        once.claim(PortId::Port4, OwnerId::new(1)).unwrap();
        let mut twice = once.clone();

        once.release(PortId::Port4);
        twice.release(PortId::Port4);
        twice.release(PortId::Port4);

        assert_eq!(once, twice);
        assert_eq!(twice.owner(PortId::Port4), None);
    }

    #[test]
    fn release_owned_ignores_other_owners() {
        let mut registry = PortRegistry::new();
        registry.claim(PortId::Port3, OwnerId::new(1)).unwrap();

        assert!(!registry.release_owned(PortId::Port3, OwnerId::new(2)));
        assert_eq!(registry.owner(PortId::Port3), Some(OwnerId::new(1)));
        assert!(registry.release_owned(PortId::Port3, OwnerId::new(1)));
        assert!(!registry.release_owned(PortId::Port3, OwnerId::new(1)));
    }

    #[test]
    fn from_sensor_map_keeps_types_and_owners() {
        let mut map = SensorMap::new();
        map.insert(
            PortId::Port1,
            SensorInfo {
                sensor_type: Some(33),
                used_by: None,
            },
        );
        map.insert(
            PortId::Port2,
            SensorInfo {
                sensor_type: Some(29),
                used_by: Some(OwnerId::new(99)),
            },
        );

        let mut registry = PortRegistry::from_sensor_map(&map);
        assert_eq!(registry.sensor_type(PortId::Port1), Some(33));
        assert_eq!(registry.sensor_type(PortId::Port3), None);
        assert!(registry.claim(PortId::Port2, OwnerId::new(1)).is_err());

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot[&PortId::Port2].used_by, Some(OwnerId::new(99)));
    }

    #[test]
    fn sensor_info_json_shape() {
        let info = SensorInfo {
            sensor_type: Some(33),
            used_by: None,
        };
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json, serde_json::json!({ "type": 33, "used_by": null }));

        let parsed: SensorInfo = serde_json::from_str(r#"{ "type": 16 }"#).unwrap();
        assert_eq!(parsed.sensor_type, Some(16));
        assert_eq!(parsed.used_by, None);
    }
}
