use zcl::cluster::{device_type, id, profile};

use crate::catalog::{EndpointReplacement, QuirkEntry, ReplacementSpec};
use crate::cluster::ClusterImpl::{self, Illuminance, Motion, Occupancy, PowerConfiguration, Standard};
use crate::signature::{DeviceSignature, EndpointSignature};

pub const KONKE: &str = "Konke";

const BASIC: ClusterImpl = Standard(id::BASIC);
const IDENTIFY: ClusterImpl = Standard(id::IDENTIFY);
const OTA: ClusterImpl = Standard(id::OTA);
const IAS_ZONE: ClusterImpl = Standard(id::IAS_ZONE);
const DIAGNOSTIC: ClusterImpl = Standard(id::DIAGNOSTIC);
const KONKE_CLUSTER: ClusterImpl = Standard(id::KONKE_MANUFACTURER);

/// Motion cluster of the first generation sensors, using the configured reset
const MOTION: ClusterImpl = Motion { reset_s: None };

/// Motion cluster of the `3AFE08010402100D` sensor
const MOTION_C: ClusterImpl = Motion { reset_s: Some(60) };

const MODELS_GEN1: &[(&str, &str)] = &[
    (KONKE, "3AFE28010402000D"),
    (KONKE, "3AFE14010402000D"),
    (KONKE, "3AFE27010402000D"),
];

const fn ias_zone_endpoint(
    input_clusters: &'static [u16],
    output_clusters: &'static [u16],
) -> EndpointSignature {
    EndpointSignature {
        profile_id: profile::ZHA,
        device_type: device_type::IAS_ZONE,
        input_clusters,
        output_clusters,
    }
}

pub const KONKE_MOTION: QuirkEntry = QuirkEntry {
    name: "KonkeMotion",
    signature: DeviceSignature {
        models: MODELS_GEN1,
        endpoints: &[(
            1,
            ias_zone_endpoint(
                &[
                    id::BASIC,
                    id::POWER_CONFIGURATION,
                    id::IDENTIFY,
                    id::IAS_ZONE,
                    id::KONKE_MANUFACTURER,
                ],
                &[id::IDENTIFY, id::KONKE_MANUFACTURER],
            ),
        )],
    },
    replacement: ReplacementSpec {
        endpoints: &[(
            1,
            EndpointReplacement {
                input_clusters: &[
                    BASIC,
                    PowerConfiguration,
                    IDENTIFY,
                    Occupancy,
                    MOTION,
                    KONKE_CLUSTER,
                ],
                output_clusters: &[IDENTIFY, KONKE_CLUSTER],
            },
        )],
    },
};

pub const KONKE_MOTION_B: QuirkEntry = QuirkEntry {
    name: "KonkeMotionB",
    signature: DeviceSignature {
        models: MODELS_GEN1,
        endpoints: &[(
            1,
            ias_zone_endpoint(
                &[
                    id::BASIC,
                    id::POWER_CONFIGURATION,
                    id::IDENTIFY,
                    id::IAS_ZONE,
                ],
                &[id::IDENTIFY],
            ),
        )],
    },
    replacement: ReplacementSpec {
        endpoints: &[(
            1,
            EndpointReplacement {
                input_clusters: &[BASIC, PowerConfiguration, IDENTIFY, Occupancy, MOTION],
                output_clusters: &[IDENTIFY],
            },
        )],
    },
};

pub const KONKE_MOTION_C: QuirkEntry = QuirkEntry {
    name: "KonkeMotionC",
    signature: DeviceSignature {
        models: &[(KONKE, "3AFE08010402100D")],
        endpoints: &[(
            1,
            ias_zone_endpoint(
                &[
                    id::BASIC,
                    id::POWER_CONFIGURATION,
                    id::IDENTIFY,
                    id::IAS_ZONE,
                    id::DIAGNOSTIC,
                    id::KONKE_MANUFACTURER,
                ],
                &[id::OTA, id::KONKE_MANUFACTURER],
            ),
        )],
    },
    replacement: ReplacementSpec {
        endpoints: &[(
            1,
            EndpointReplacement {
                input_clusters: &[
                    BASIC,
                    PowerConfiguration,
                    IDENTIFY,
                    MOTION_C,
                    DIAGNOSTIC,
                    KONKE_CLUSTER,
                ],
                output_clusters: &[OTA, KONKE_CLUSTER],
            },
        )],
    },
};

pub const KONKE_MOTION_D: QuirkEntry = QuirkEntry {
    name: "KonkeMotionD",
    signature: DeviceSignature {
        models: &[(KONKE, "3AFE13010402020D")],
        endpoints: &[(
            1,
            ias_zone_endpoint(
                &[
                    id::BASIC,
                    id::IDENTIFY,
                    id::ILLUMINANCE_MEASUREMENT,
                    id::IAS_ZONE,
                    id::DIAGNOSTIC,
                    id::KONKE_MANUFACTURER,
                ],
                &[id::BASIC, id::OTA, id::KONKE_MANUFACTURER],
            ),
        )],
    },
    replacement: ReplacementSpec {
        endpoints: &[(
            1,
            EndpointReplacement {
                input_clusters: &[
                    BASIC,
                    IDENTIFY,
                    Illuminance,
                    IAS_ZONE,
                    DIAGNOSTIC,
                    KONKE_CLUSTER,
                ],
                output_clusters: &[BASIC, OTA, KONKE_CLUSTER],
            },
        )],
    },
};

pub const QUIRKS: &[QuirkEntry] = &[KONKE_MOTION, KONKE_MOTION_B, KONKE_MOTION_C, KONKE_MOTION_D];
