use crate::cluster::ClusterImpl;
use crate::config::QuirkConfig;
use crate::device::QuirkDevice;
use crate::error::QuirkResult;
use crate::signature::{DeviceSignature, DiscoveredDevice};

/// Replacement cluster implementations for one endpoint, in the order the
/// host should expose them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointReplacement {
    pub input_clusters: &'static [ClusterImpl],
    pub output_clusters: &'static [ClusterImpl],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplacementSpec {
    pub endpoints: &'static [(u8, EndpointReplacement)],
}

impl ReplacementSpec {
    #[must_use]
    pub fn endpoint(&self, id: u8) -> Option<&EndpointReplacement> {
        self.endpoints
            .iter()
            .find_map(|(ep, repl)| (*ep == id).then_some(repl))
    }
}

/// A signature, and what to build when a device matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuirkEntry {
    pub name: &'static str,
    pub signature: DeviceSignature,
    pub replacement: ReplacementSpec,
}

impl QuirkEntry {
    /// Build the quirked device. The caller is expected to have matched
    /// `dev` against this entry first.
    pub fn build(&'static self, dev: &DiscoveredDevice, conf: &QuirkConfig) -> QuirkResult<QuirkDevice> {
        QuirkDevice::new(self, dev, conf)
    }
}

/// Static registry of quirks, consulted once per discovered device.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    entries: &'static [QuirkEntry],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(crate::konke::QUIRKS)
    }
}

impl Catalog {
    #[must_use]
    pub const fn new(entries: &'static [QuirkEntry]) -> Self {
        Self { entries }
    }

    #[must_use]
    pub const fn entries(&self) -> &'static [QuirkEntry] {
        self.entries
    }

    /// Find the entry matching `dev`, if any.
    ///
    /// Entries sharing a model must differ in their cluster sets, so at most
    /// one can match. Should the table break that rule, the first entry
    /// wins.
    #[must_use]
    pub fn resolve(&self, dev: &DiscoveredDevice) -> Option<&'static QuirkEntry> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.signature.matches(dev));

        match entry {
            Some(entry) => log::debug!(
                "Device [{}] [{}] matches quirk {}",
                dev.manufacturer,
                dev.model,
                entry.name
            ),
            None => log::trace!(
                "No quirk for device [{}] [{}]",
                dev.manufacturer,
                dev.model
            ),
        }

        entry
    }

    /// Resolve and build in one step. `Ok(None)` means the device is not
    /// quirked, and should be left as discovered.
    pub fn instantiate(
        &self,
        dev: &DiscoveredDevice,
        conf: &QuirkConfig,
    ) -> QuirkResult<Option<QuirkDevice>> {
        self.resolve(dev)
            .map(|entry| entry.build(dev, conf))
            .transpose()
    }
}
