use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

/// Simple descriptor of one endpoint, as reported by a device during
/// discovery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimpleDescriptor {
    pub profile_id: u16,
    pub device_type: u16,
    #[serde(default)]
    pub input_clusters: BTreeSet<u16>,
    #[serde(default)]
    pub output_clusters: BTreeSet<u16>,
}

/// A device as seen by the host after discovery, before any quirk is
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscoveredDevice {
    pub manufacturer: String,
    pub model: String,
    pub endpoints: BTreeMap<u8, SimpleDescriptor>,
}

/// Expected fingerprint of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSignature {
    pub profile_id: u16,
    pub device_type: u16,
    pub input_clusters: &'static [u16],
    pub output_clusters: &'static [u16],
}

/// Expected fingerprint of a whole device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSignature {
    /// Accepted `(manufacturer, model)` pairs
    pub models: &'static [(&'static str, &'static str)],
    pub endpoints: &'static [(u8, EndpointSignature)],
}

fn same_set(expected: &[u16], actual: &BTreeSet<u16>) -> bool {
    expected.iter().copied().collect::<BTreeSet<u16>>() == *actual
}

impl EndpointSignature {
    /// Exact match: profile, device type, and both cluster sets must be
    /// equal. A device with fewer (or more) clusters does not match.
    #[must_use]
    pub fn matches(&self, desc: &SimpleDescriptor) -> bool {
        self.profile_id == desc.profile_id
            && self.device_type == desc.device_type
            && same_set(self.input_clusters, &desc.input_clusters)
            && same_set(self.output_clusters, &desc.output_clusters)
    }
}

impl DeviceSignature {
    #[must_use]
    pub fn accepts_model(&self, manufacturer: &str, model: &str) -> bool {
        self.models
            .iter()
            .any(|(mf, md)| *mf == manufacturer && *md == model)
    }

    #[must_use]
    pub fn endpoint(&self, id: u8) -> Option<&EndpointSignature> {
        self.endpoints
            .iter()
            .find_map(|(ep, sig)| (*ep == id).then_some(sig))
    }

    #[must_use]
    pub fn matches(&self, dev: &DiscoveredDevice) -> bool {
        if !self.accepts_model(&dev.manufacturer, &dev.model) {
            return false;
        }

        let ids: BTreeSet<u8> = self.endpoints.iter().map(|(ep, _)| *ep).collect();
        if !ids.iter().eq(dev.endpoints.keys()) {
            return false;
        }

        self.endpoints.iter().all(|(ep, sig)| {
            dev.endpoints
                .get(ep)
                .is_some_and(|desc| sig.matches(desc))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use maplit::{btreemap, btreeset};

    use crate::signature::{DeviceSignature, DiscoveredDevice, EndpointSignature, SimpleDescriptor};

    const SIG: DeviceSignature = DeviceSignature {
        models: &[("Acme", "M1"), ("Acme", "M2")],
        endpoints: &[(
            1,
            EndpointSignature {
                profile_id: 0x0104,
                device_type: 0x0402,
                input_clusters: &[0x0000, 0x0001, 0x0500],
                output_clusters: &[0x0003],
            },
        )],
    };

    fn device(model: &str, endpoints: BTreeMap<u8, SimpleDescriptor>) -> DiscoveredDevice {
        DiscoveredDevice {
            manufacturer: "Acme".into(),
            model: model.into(),
            endpoints,
        }
    }

    fn desc(input: &[u16], output: &[u16]) -> SimpleDescriptor {
        SimpleDescriptor {
            profile_id: 0x0104,
            device_type: 0x0402,
            input_clusters: input.iter().copied().collect(),
            output_clusters: output.iter().copied().collect(),
        }
    }

    #[test]
    fn exact_match() {
        let dev = device("M2", btreemap! { 1 => desc(&[0x0500, 0x0001, 0x0000], &[0x0003]) });
        assert!(SIG.matches(&dev));
    }

    #[test]
    fn unknown_model() {
        let dev = device("M3", btreemap! { 1 => desc(&[0x0000, 0x0001, 0x0500], &[0x0003]) });
        assert!(!SIG.matches(&dev));
    }

    #[test]
    fn manufacturer_must_pair_with_model() {
        let mut dev = device("M1", btreemap! { 1 => desc(&[0x0000, 0x0001, 0x0500], &[0x0003]) });
        dev.manufacturer = "Other".into();
        assert!(!SIG.matches(&dev));
    }

    #[test]
    fn strict_subset_does_not_match() {
        let dev = device("M1", btreemap! { 1 => desc(&[0x0000, 0x0500], &[0x0003]) });
        assert!(!SIG.matches(&dev));

        let dev = device("M1", btreemap! { 1 => desc(&[0x0000, 0x0001, 0x0500], &[]) });
        assert!(!SIG.matches(&dev));
    }

    #[test]
    fn superset_does_not_match() {
        let dev = device(
            "M1",
            btreemap! { 1 => desc(&[0x0000, 0x0001, 0x0500, 0xfcc0], &[0x0003]) },
        );
        assert!(!SIG.matches(&dev));
    }

    #[test]
    fn profile_and_device_type_must_match() {
        let mut ep = desc(&[0x0000, 0x0001, 0x0500], &[0x0003]);
        ep.device_type = 0x0107;
        assert!(!SIG.matches(&device("M1", btreemap! { 1 => ep })));

        let mut ep = desc(&[0x0000, 0x0001, 0x0500], &[0x0003]);
        ep.profile_id = 0xc05e;
        assert!(!SIG.matches(&device("M1", btreemap! { 1 => ep })));
    }

    #[test]
    fn endpoint_ids_must_match() {
        let ep = desc(&[0x0000, 0x0001, 0x0500], &[0x0003]);

        let dev = device("M1", btreemap! { 2 => ep.clone() });
        assert!(!SIG.matches(&dev));

        let dev = device("M1", btreemap! { 1 => ep.clone(), 2 => ep });
        assert!(!SIG.matches(&dev));
    }

    #[test]
    fn endpoint_lookup() {
        assert_eq!(SIG.endpoint(1).map(|ep| ep.device_type), Some(0x0402));
        assert!(SIG.endpoint(2).is_none());
    }

    #[test]
    fn descriptor_sets_ignore_order() {
        let a = desc(&[0x0500, 0x0000], &[]);
        let b = SimpleDescriptor {
            input_clusters: btreeset! { 0x0000, 0x0500 },
            ..a.clone()
        };
        assert_eq!(a, b);
    }
}
