use std::io::Cursor;

use bitflags::bitflags;
use byteorder::{LittleEndian as LE, ReadBytesExt};

use crate::error::{ZclError, ZclResult};
use crate::frame::ZclFrame;

pub const ZONE_STATE: u16 = 0x0000;
pub const ZONE_TYPE: u16 = 0x0001;
pub const ZONE_STATUS: u16 = 0x0002;

pub const ZONE_TYPE_MOTION_SENSOR: u16 = 0x000d;

/// Server to client command ids
pub const CMD_ZONE_STATUS_CHANGE_NOTIFICATION: u8 = 0x00;
pub const CMD_ZONE_ENROLL_REQUEST: u8 = 0x01;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ZoneStatus: u16 {
        const ALARM1               = 1 << 0;
        const ALARM2               = 1 << 1;
        const TAMPER               = 1 << 2;
        const BATTERY              = 1 << 3;
        const SUPERVISION_REPORTS  = 1 << 4;
        const RESTORE_REPORTS      = 1 << 5;
        const TROUBLE              = 1 << 6;
        const AC_MAINS             = 1 << 7;
        const TEST                 = 1 << 8;
        const BATTERY_DEFECT       = 1 << 9;
    }
}

impl ZoneStatus {
    /// Motion sensors signal detected motion on the first alarm bit
    #[must_use]
    pub const fn motion(self) -> bool {
        self.contains(Self::ALARM1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneStatusChange {
    pub zone_status: ZoneStatus,
    pub extended_status: u8,
    pub zone_id: u8,
    /// Quarter-seconds
    pub delay: u16,
}

impl ZoneStatusChange {
    pub const MIN_SIZE: usize = 4;

    pub fn parse(data: &[u8]) -> ZclResult<Self> {
        if data.len() < Self::MIN_SIZE {
            return Err(ZclError::Truncated {
                expected: Self::MIN_SIZE,
                actual: data.len(),
            });
        }

        let mut rdr = Cursor::new(data);
        let zone_status = ZoneStatus::from_bits_retain(rdr.read_u16::<LE>()?);
        let extended_status = rdr.read_u8()?;
        let zone_id = rdr.read_u8()?;

        // older firmware omits the delay field
        let delay = rdr.read_u16::<LE>().unwrap_or_default();

        Ok(Self {
            zone_status,
            extended_status,
            zone_id,
            delay,
        })
    }
}

pub fn describe(frame: &ZclFrame, data: &[u8]) -> ZclResult<Option<String>> {
    if !frame.from_server() || frame.manufacturer_specific() {
        return Ok(None);
    }

    match frame.cmd {
        CMD_ZONE_STATUS_CHANGE_NOTIFICATION => {
            let chg = ZoneStatusChange::parse(data)?;
            Ok(Some(format!(
                "ZoneStatusChange {:?} zone:{} delay:{}",
                chg.zone_status, chg.zone_id, chg.delay
            )))
        }
        CMD_ZONE_ENROLL_REQUEST => Ok(Some(format!("ZoneEnrollRequest {}", hex::encode(data)))),
        _ => Ok(None),
    }
}
