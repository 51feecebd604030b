use std::collections::{BTreeMap, BTreeSet};

use packed_struct::PrimitiveEnum;
use tokio::sync::broadcast::{Receiver, Sender};

use zcl::attr::{ZclAttr, ZclAttrValue, ZclCommand, ZclReadAttrResp, ZclReportAttr};
use zcl::frame::ZclFrame;

use crate::bus::OccupancyBus;
use crate::catalog::QuirkEntry;
use crate::cluster::{AttributeEvent, AttributeStore, Cluster, ClusterImpl};
use crate::cluster::motion::MotionReset;
use crate::config::QuirkConfig;
use crate::error::{QuirkError, QuirkResult};
use crate::signature::DiscoveredDevice;

const EVENT_CAPACITY: usize = 32;

#[derive(Debug)]
pub struct Endpoint {
    pub id: u8,
    pub profile_id: u16,
    pub device_type: u16,
    pub input_clusters: Vec<Cluster>,
    pub output_clusters: Vec<Cluster>,
}

impl Endpoint {
    #[must_use]
    pub fn input_cluster(&self, id: u16) -> Option<&Cluster> {
        self.input_clusters.iter().find(|cl| cl.id() == id)
    }

    #[must_use]
    pub fn output_cluster(&self, id: u16) -> Option<&Cluster> {
        self.output_clusters.iter().find(|cl| cl.id() == id)
    }

    fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.input_clusters.iter().chain(&self.output_clusters)
    }
}

/// A device with its quirk applied.
///
/// Owns the occupancy bus shared by its clusters, and the event stream
/// carrying every stored attribute update.
#[derive(Debug)]
pub struct QuirkDevice {
    quirk: &'static str,
    manufacturer: String,
    model: String,
    endpoints: BTreeMap<u8, Endpoint>,
    bus: OccupancyBus,
    events: Sender<AttributeEvent>,
}

impl QuirkDevice {
    pub fn new(
        entry: &'static QuirkEntry,
        dev: &DiscoveredDevice,
        conf: &QuirkConfig,
    ) -> QuirkResult<Self> {
        let bus = OccupancyBus::new();
        let events = Sender::new(EVENT_CAPACITY);

        let build = |ep: u8, imps: &[ClusterImpl]| -> Vec<Cluster> {
            imps.iter()
                .map(|imp| {
                    let store = AttributeStore::new(ep, imp.cluster_id(), events.clone());
                    imp.build(store, &bus, conf)
                })
                .collect()
        };

        let mut endpoints = BTreeMap::new();
        for (&id, desc) in &dev.endpoints {
            let (input_clusters, output_clusters) = match entry.replacement.endpoint(id) {
                Some(repl) => (
                    build(id, repl.input_clusters),
                    build(id, repl.output_clusters),
                ),
                None => {
                    let standard = |ids: &BTreeSet<u16>| -> Vec<ClusterImpl> {
                        ids.iter().copied().map(ClusterImpl::Standard).collect()
                    };
                    (
                        build(id, &standard(&desc.input_clusters)),
                        build(id, &standard(&desc.output_clusters)),
                    )
                }
            };

            // profile and device type are never replaced
            let endpoint = Endpoint {
                id,
                profile_id: desc.profile_id,
                device_type: desc.device_type,
                input_clusters,
                output_clusters,
            };
            endpoints.insert(id, endpoint);
        }

        for (id, _) in entry.replacement.endpoints {
            if !endpoints.contains_key(id) {
                return Err(QuirkError::EndpointNotFound(*id));
            }
        }

        log::info!(
            "Applied quirk {} to [{}] [{}]",
            entry.name,
            dev.manufacturer,
            dev.model
        );

        Ok(Self {
            quirk: entry.name,
            manufacturer: dev.manufacturer.clone(),
            model: dev.model.clone(),
            endpoints,
            bus,
            events,
        })
    }

    #[must_use]
    pub const fn quirk(&self) -> &'static str {
        self.quirk
    }

    #[must_use]
    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub const fn bus(&self) -> &OccupancyBus {
        &self.bus
    }

    /// Stream of stored attribute updates, for forwarding to the host.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<AttributeEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn endpoint(&self, id: u8) -> Option<&Endpoint> {
        self.endpoints.get(&id)
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    /// Look up a server (input) cluster, falling back to client clusters.
    pub fn cluster(&self, endpoint: u8, cluster: u16) -> QuirkResult<&Cluster> {
        let ep = self
            .endpoints
            .get(&endpoint)
            .ok_or(QuirkError::EndpointNotFound(endpoint))?;

        ep.input_cluster(cluster)
            .or_else(|| ep.output_cluster(cluster))
            .ok_or(QuirkError::ClusterNotFound { endpoint, cluster })
    }

    /// The motion interpretation of this device, if its quirk has one.
    #[must_use]
    pub fn motion(&self) -> Option<&MotionReset> {
        self.endpoints
            .values()
            .flat_map(Endpoint::clusters)
            .find_map(Cluster::motion)
    }

    #[must_use]
    pub fn attribute(&self, endpoint: u8, cluster: u16, key: u16) -> Option<ZclAttrValue> {
        self.cluster(endpoint, cluster).ok()?.attribute(key)
    }

    /// Deliver one already-decoded attribute report.
    pub fn update_attribute(&self, endpoint: u8, cluster: u16, attr: ZclAttr) -> QuirkResult<()> {
        self.cluster(endpoint, cluster)?.update_attribute(attr)
    }

    /// Deliver one raw zcl payload (header and body) received on
    /// `endpoint` / `cluster`.
    pub fn handle_zcl(&self, endpoint: u8, cluster: u16, data: &[u8]) -> QuirkResult<()> {
        let (frame, body) = ZclFrame::split(data)?;
        let target = self.cluster(endpoint, cluster)?;

        if log::log_enabled!(log::Level::Trace) {
            match zcl::cluster::describe(cluster, &frame, body) {
                Ok(Some(desc)) => log::trace!("[ep {endpoint} / {cluster:04x}] {:?} {desc}", frame.flags),
                Ok(None) => log::trace!(
                    "[ep {endpoint} / {cluster:04x}] {:?} cmd {:02x} {}",
                    frame.flags,
                    frame.cmd,
                    hex::encode(body)
                ),
                Err(err) => log::trace!("[ep {endpoint} / {cluster:04x}] undecodable: {err}"),
            }
        }

        if frame.cluster_specific() {
            return target.handle_command(&frame, body);
        }

        match ZclCommand::from_primitive(frame.cmd) {
            Some(ZclCommand::ReportAttrib) => {
                for attr in ZclReportAttr::parse(body)?.attr {
                    target.update_attribute(attr)?;
                }
            }
            Some(ZclCommand::ReadAttribResp) => {
                ZclReadAttrResp::parse(body)?
                    .attr
                    .into_iter()
                    .filter(|attr| attr.value != ZclAttrValue::Unsupported)
                    .try_for_each(|attr| target.update_attribute(attr))?;
            }
            cmd => {
                log::debug!(
                    "[ep {endpoint} / {cluster:04x}] Ignoring global command {cmd:?} ({:02x})",
                    frame.cmd
                );
            }
        }

        Ok(())
    }

    /// Cancel every pending deferred action. Called on drop.
    pub fn shutdown(&self) {
        self.endpoints
            .values()
            .flat_map(Endpoint::clusters)
            .for_each(Cluster::shutdown);
    }
}

impl Drop for QuirkDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}
