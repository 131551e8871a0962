use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use ev3cmd_transport::CommandChannel;
use tracing::{debug, info};

use crate::error::{Result, SensorError};
use crate::introspection::IntrospectionProvider;
use crate::port::PortId;
use crate::registry::{OwnerId, PortRegistry, SensorMap};

/// One brick, as seen by the sensor handles created from it.
///
/// Holds the command channel, the introspection provider and the port
/// registry. The registry is populated lazily and guarded by a single
/// session lock, so claims made from different threads never race.
/// Handles keep only a weak reference; the session lives as long as its
/// `Arc`.
pub struct Session {
    host: String,
    transport: &'static str,
    channel: Mutex<Box<dyn CommandChannel + Send>>,
    introspection: Box<dyn IntrospectionProvider>,
    registry: Mutex<Option<PortRegistry>>,
    next_owner: AtomicU64,
}

impl Session {
    /// Create a session for the brick identified by `host`.
    pub fn new<C, P>(host: impl Into<String>, channel: C, introspection: P) -> Arc<Self>
    where
        C: CommandChannel + Send + 'static,
        P: IntrospectionProvider + 'static,
    {
        let host = host.into();
        let transport = channel.transport_name();
        debug!(%host, transport, "session created");
        Arc::new(Self {
            host,
            transport,
            channel: Mutex::new(Box::new(channel)),
            introspection: Box::new(introspection),
            registry: Mutex::new(None),
            next_owner: AtomicU64::new(1),
        })
    }

    /// Identity of the brick (e.g. its MAC address).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Name of the underlying transport.
    pub fn transport_name(&self) -> &'static str {
        self.transport
    }

    /// Send a block of operations and wait for the reply's global memory.
    ///
    /// One request is in flight per session; concurrent callers queue on the
    /// channel lock.
    pub fn send_direct_cmd(&self, ops: &[u8], global_mem: u16) -> Result<Bytes> {
        let mut channel = lock(&self.channel);
        Ok(channel.send(ops, global_mem)?)
    }

    /// The sensor map, fetched from the introspection provider on first use.
    pub fn sensor_map(&self) -> Result<SensorMap> {
        let mut slot = lock(&self.registry);
        Ok(self.populated(&mut slot)?.snapshot())
    }

    /// Whether the sensor map has been fetched yet.
    pub fn is_introspected(&self) -> bool {
        lock(&self.registry).is_some()
    }

    /// Current owner of `port`, if the map has been fetched and the port is
    /// claimed.
    pub fn owner_of(&self, port: PortId) -> Option<OwnerId> {
        lock(&self.registry)
            .as_ref()
            .and_then(|registry| registry.owner(port))
    }

    pub(crate) fn allocate_owner(&self) -> OwnerId {
        OwnerId::new(self.next_owner.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn claim(&self, port: PortId, owner: OwnerId) -> Result<()> {
        let mut slot = lock(&self.registry);
        let registry = self.populated(&mut slot)?;
        registry.claim(port, owner).map_err(|in_use| {
            debug!(%port, holder = %in_use.owner, host = %self.host, "port already claimed");
            SensorError::PortInUse {
                port,
                host: self.host.clone(),
            }
        })?;
        debug!(%port, %owner, host = %self.host, "port claimed");
        Ok(())
    }

    /// Give `port` back if `owner` still holds it. Never fails.
    pub(crate) fn release(&self, port: PortId, owner: OwnerId) -> bool {
        let mut slot = lock(&self.registry);
        let released = slot
            .as_mut()
            .is_some_and(|registry| registry.release_owned(port, owner));
        debug!(%port, %owner, released, "port released");
        released
    }

    fn populated<'a>(&self, slot: &'a mut Option<PortRegistry>) -> Result<&'a mut PortRegistry> {
        let registry = match slot.take() {
            Some(registry) => registry,
            None => {
                // Lock order: registry, then channel.
                let map = {
                    let mut channel = lock(&self.channel);
                    self.introspection.sensor_map(&mut **channel)?
                };
                info!(host = %self.host, ports = map.len(), "sensor map populated");
                PortRegistry::from_sensor_map(&map)
            }
        };
        Ok(slot.insert(registry))
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} connected EV3 {}", self.transport, self.host)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("transport", &self.transport)
            .field("introspected", &self.is_introspected())
            .finish_non_exhaustive()
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
