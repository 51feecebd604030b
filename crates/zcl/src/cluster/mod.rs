pub mod ias_zone;
pub mod standard;

use crate::error::ZclResult;
use crate::frame::ZclFrame;

/// Cluster ids
pub mod id {
    pub const BASIC: u16 = 0x0000;
    pub const POWER_CONFIGURATION: u16 = 0x0001;
    pub const IDENTIFY: u16 = 0x0003;
    pub const OTA: u16 = 0x0019;
    pub const ILLUMINANCE_MEASUREMENT: u16 = 0x0400;
    pub const OCCUPANCY_SENSING: u16 = 0x0406;
    pub const IAS_ZONE: u16 = 0x0500;
    pub const DIAGNOSTIC: u16 = 0x0B05;

    /// Manufacturer specific cluster used by Konke (and Xiaomi/Aqara) devices
    pub const KONKE_MANUFACTURER: u16 = 0xFCC0;
}

/// Profile ids
pub mod profile {
    pub const ZHA: u16 = 0x0104;
}

/// Home automation device types
pub mod device_type {
    pub const IAS_ZONE: u16 = 0x0402;
}

pub mod power_configuration {
    /// Battery voltage, in units of 100mV
    pub const BATTERY_VOLTAGE: u16 = 0x0020;
    /// Remaining battery, in units of 0.5%
    pub const BATTERY_PERCENTAGE_REMAINING: u16 = 0x0021;
}

pub mod illuminance {
    /// `10000 * log10(lux) + 1`
    pub const MEASURED_VALUE: u16 = 0x0000;
}

pub mod occupancy {
    pub const OCCUPANCY: u16 = 0x0000;
    pub const OCCUPANCY_SENSOR_TYPE: u16 = 0x0001;

    pub const SENSOR_TYPE_PIR: u8 = 0x00;
}

/// Short human-readable description of a frame, for trace logging.
///
/// Returns `Ok(None)` for frames this crate knows nothing about.
pub fn describe(cluster: u16, frame: &ZclFrame, data: &[u8]) -> ZclResult<Option<String>> {
    if !frame.cluster_specific() {
        return standard::describe(frame, data);
    }

    match cluster {
        id::IAS_ZONE => ias_zone::describe(frame, data),
        _ => Ok(None),
    }
}
