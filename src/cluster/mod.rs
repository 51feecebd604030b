pub mod illuminance;
pub mod motion;
pub mod occupancy;
pub mod power;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast::Sender;

use zcl::attr::{ZclAttr, ZclAttrValue};
use zcl::cluster::{ias_zone, id};
use zcl::frame::ZclFrame;

use crate::bus::OccupancyBus;
use crate::cluster::illuminance::IlluminanceTransform;
use crate::cluster::motion::MotionReset;
use crate::cluster::power::BatteryTransform;
use crate::config::QuirkConfig;
use crate::error::QuirkResult;

/// Stored attribute change, as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEvent {
    pub endpoint: u8,
    pub cluster: u16,
    pub attr: ZclAttr,
}

/// Attribute cache of a single cluster, plus its notify path.
///
/// Clones share the same cache, which lets deferred actions and bus
/// subscribers write attributes of the cluster that created them.
#[derive(Clone)]
pub struct AttributeStore {
    endpoint: u8,
    cluster: u16,
    attrs: Arc<Mutex<BTreeMap<u16, ZclAttrValue>>>,
    events: Sender<AttributeEvent>,
}

impl AttributeStore {
    #[must_use]
    pub fn new(endpoint: u8, cluster: u16, events: Sender<AttributeEvent>) -> Self {
        Self {
            endpoint,
            cluster,
            attrs: Arc::new(Mutex::new(BTreeMap::new())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u16, ZclAttrValue>> {
        self.attrs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub const fn endpoint(&self) -> u8 {
        self.endpoint
    }

    #[must_use]
    pub const fn cluster(&self) -> u16 {
        self.cluster
    }

    /// Store a value without notifying anyone. Used for constant attributes
    /// set up at construction.
    pub fn seed(&self, attr: ZclAttr) {
        self.lock().insert(attr.key, attr.value);
    }

    /// Store a value and notify subscribers of the device event stream.
    pub fn update(&self, attr: ZclAttr) {
        log::trace!(
            "[ep {} / {:04x}] update {:?}",
            self.endpoint,
            self.cluster,
            attr
        );

        self.lock().insert(attr.key, attr.value.clone());

        let evt = AttributeEvent {
            endpoint: self.endpoint,
            cluster: self.cluster,
            attr,
        };

        if let Err(err) = self.events.send(evt) {
            log::trace!("No listeners for attribute event: {err}");
        }
    }

    #[must_use]
    pub fn get(&self, key: u16) -> Option<ZclAttrValue> {
        self.lock().get(&key).cloned()
    }

    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<u16, ZclAttrValue> {
        self.lock().clone()
    }
}

/// Rewrites one incoming attribute update into the updates that get stored.
pub trait AttributeTransform: Send + Sync {
    fn apply(&self, attr: ZclAttr) -> Vec<ZclAttr>;
}

/// Cluster implementation references, as listed in a replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterImpl {
    /// The host's standard implementation of this cluster id
    Standard(u16),
    /// Power configuration deriving battery percentage from voltage
    PowerConfiguration,
    /// Illuminance measurement with log-scaled measured value
    Illuminance,
    /// Occupancy sensing driven by the device occupancy bus
    Occupancy,
    /// IAS zone with motion auto-reset. `None` uses the configured default.
    Motion { reset_s: Option<u64> },
}

impl ClusterImpl {
    #[must_use]
    pub const fn cluster_id(self) -> u16 {
        match self {
            Self::Standard(id) => id,
            Self::PowerConfiguration => id::POWER_CONFIGURATION,
            Self::Illuminance => id::ILLUMINANCE_MEASUREMENT,
            Self::Occupancy => id::OCCUPANCY_SENSING,
            Self::Motion { .. } => id::IAS_ZONE,
        }
    }

    #[must_use]
    pub fn build(self, store: AttributeStore, bus: &OccupancyBus, conf: &QuirkConfig) -> Cluster {
        match self {
            Self::Standard(_) => Cluster::new(store),
            Self::PowerConfiguration => {
                Cluster::new(store).with_transform(BatteryTransform::new(conf.battery))
            }
            Self::Illuminance => Cluster::new(store).with_transform(IlluminanceTransform),
            Self::Occupancy => {
                occupancy::attach(&store, bus);
                Cluster::new(store)
            }
            Self::Motion { reset_s } => {
                let reset = reset_s.map_or_else(
                    || conf.motion.default_reset(),
                    std::time::Duration::from_secs,
                );
                let motion = MotionReset::new(reset, store.clone(), bus.clone());
                Cluster::new(store).with_motion(motion)
            }
        }
    }
}

/// A cluster instance on a quirked device.
///
/// Enhanced behavior is added by composition: an optional attribute
/// transform, and an optional motion reset timer.
pub struct Cluster {
    store: AttributeStore,
    transform: Option<Box<dyn AttributeTransform>>,
    motion: Option<MotionReset>,
}

impl Cluster {
    #[must_use]
    pub fn new(store: AttributeStore) -> Self {
        Self {
            store,
            transform: None,
            motion: None,
        }
    }

    #[must_use]
    pub fn with_transform(mut self, transform: impl AttributeTransform + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    #[must_use]
    pub fn with_motion(mut self, motion: MotionReset) -> Self {
        self.motion = Some(motion);
        self
    }

    #[must_use]
    pub const fn id(&self) -> u16 {
        self.store.cluster()
    }

    #[must_use]
    pub const fn store(&self) -> &AttributeStore {
        &self.store
    }

    #[must_use]
    pub const fn motion(&self) -> Option<&MotionReset> {
        self.motion.as_ref()
    }

    #[must_use]
    pub fn attribute(&self, key: u16) -> Option<ZclAttrValue> {
        self.store.get(key)
    }

    /// Entry point for every incoming attribute report.
    pub fn update_attribute(&self, attr: ZclAttr) -> QuirkResult<()> {
        if let Some(motion) = &self.motion {
            if attr.key == ias_zone::ZONE_STATUS {
                match attr.value.as_u32().map(u16::try_from) {
                    Some(Ok(bits)) => {
                        motion.zone_status(ias_zone::ZoneStatus::from_bits_retain(bits))?;
                    }
                    _ => log::warn!("Ignoring malformed zone status {:?}", attr.value),
                }
                return Ok(());
            }
        }

        match &self.transform {
            Some(transform) => {
                for attr in transform.apply(attr) {
                    self.store.update(attr);
                }
            }
            None => self.store.update(attr),
        }

        Ok(())
    }

    /// Entry point for cluster-specific commands.
    pub fn handle_command(&self, frame: &ZclFrame, body: &[u8]) -> QuirkResult<()> {
        match &self.motion {
            Some(motion)
                if frame.cmd == ias_zone::CMD_ZONE_STATUS_CHANGE_NOTIFICATION
                    && frame.from_server()
                    && !frame.manufacturer_specific() =>
            {
                let chg = ias_zone::ZoneStatusChange::parse(body)?;
                motion.zone_status(chg.zone_status)?;
            }
            _ => {
                log::debug!(
                    "[ep {} / {:04x}] Unhandled command {:02x}",
                    self.store.endpoint(),
                    self.id(),
                    frame.cmd
                );
            }
        }

        Ok(())
    }

    /// Stop any pending deferred action owned by this cluster.
    pub fn shutdown(&self) {
        if let Some(motion) = &self.motion {
            motion.cancel();
        }
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("endpoint", &self.store.endpoint())
            .field("id", &format_args!("{:#06x}", self.id()))
            .field("transform", &self.transform.is_some())
            .field("motion", &self.motion.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::Sender;

    use zcl::attr::{ZclAttr, ZclAttrValue};
    use zcl::cluster::id;

    use crate::bus::OccupancyBus;
    use crate::cluster::{AttributeEvent, AttributeStore, ClusterImpl};
    use crate::config::QuirkConfig;

    fn store(cluster: u16) -> (AttributeStore, Sender<AttributeEvent>) {
        let events = Sender::new(16);
        (AttributeStore::new(1, cluster, events.clone()), events)
    }

    #[test]
    fn standard_cluster_passes_through() {
        let (store, events) = store(id::KONKE_MANUFACTURER);
        let mut rx = events.subscribe();
        let cluster = ClusterImpl::Standard(id::KONKE_MANUFACTURER).build(
            store,
            &OccupancyBus::new(),
            &QuirkConfig::default(),
        );

        cluster
            .update_attribute(ZclAttr::new(0x00f7, ZclAttrValue::Bytes(vec![1, 2])))
            .unwrap();

        assert_eq!(cluster.id(), id::KONKE_MANUFACTURER);
        assert_eq!(
            cluster.attribute(0x00f7),
            Some(ZclAttrValue::Bytes(vec![1, 2]))
        );

        let evt = rx.try_recv().unwrap();
        assert_eq!(evt.endpoint, 1);
        assert_eq!(evt.cluster, id::KONKE_MANUFACTURER);
        assert_eq!(evt.attr.key, 0x00f7);
    }

    #[test]
    fn seed_does_not_notify() {
        let (store, events) = store(id::BASIC);
        let mut rx = events.subscribe();

        store.seed(ZclAttr::new(0x0000, ZclAttrValue::U8(3)));

        assert_eq!(store.get(0x0000), Some(ZclAttrValue::U8(3)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cluster_ids_of_implementations() {
        assert_eq!(ClusterImpl::Standard(0x0b05).cluster_id(), 0x0b05);
        assert_eq!(ClusterImpl::PowerConfiguration.cluster_id(), 0x0001);
        assert_eq!(ClusterImpl::Illuminance.cluster_id(), 0x0400);
        assert_eq!(ClusterImpl::Occupancy.cluster_id(), 0x0406);
        assert_eq!(ClusterImpl::Motion { reset_s: None }.cluster_id(), 0x0500);
    }

    #[test]
    fn illuminance_cluster_transforms_reports() {
        let (store, _events) = store(id::ILLUMINANCE_MEASUREMENT);
        let cluster =
            ClusterImpl::Illuminance.build(store, &OccupancyBus::new(), &QuirkConfig::default());

        cluster
            .update_attribute(ZclAttr::new(0x0000, ZclAttrValue::U16(1000)))
            .unwrap();

        let Some(ZclAttrValue::F64(value)) = cluster.attribute(0x0000) else {
            panic!("expected transformed value");
        };
        assert!((value - 30001.0).abs() < 1e-6);
    }
}
