use std::fmt::Debug;
use std::io::{Cursor, Read};

use byteorder::{LittleEndian as LE, ReadBytesExt};
use packed_struct::prelude::*;

use crate::error::ZclResult;

#[derive(PrimitiveEnum_u8, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ZclFrameType {
    ProfileWide = 0x00,
    ClusterSpecific = 0x01,
}

#[derive(PrimitiveEnum_u8, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ZclFrameDirection {
    ClientToServer = 0x00,
    ServerToClient = 0x01,
}

#[derive(PackedStruct, Clone, Copy)]
#[packed_struct(size_bytes = "1", bit_numbering = "lsb0")]
pub struct ZclFrameFlags {
    #[packed_field(bits = "0..2", ty = "enum")]
    pub frame_type: ZclFrameType,

    #[packed_field(bits = "2")]
    pub manufacturer_specific: bool,

    #[packed_field(bits = "3", ty = "enum")]
    pub direction: ZclFrameDirection,

    #[packed_field(bits = "4")]
    pub disable_default_response: bool,
}

impl Debug for ZclFrameFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ft = match self.frame_type {
            ZclFrameType::ProfileWide => "PW",
            ZclFrameType::ClusterSpecific => "CS",
        };
        let dir = match self.direction {
            ZclFrameDirection::ClientToServer => "C2S",
            ZclFrameDirection::ServerToClient => "S2C",
        };
        write!(
            f,
            "[ ft:{ft}, ms:{}, dir:{dir}, ddr:{} ]",
            u8::from(self.manufacturer_specific),
            u8::from(self.disable_default_response)
        )
    }
}

/// ZCL frame header, as delivered by the host stack in front of every
/// cluster payload.
#[derive(Debug, Clone, Copy)]
pub struct ZclFrame {
    pub flags: ZclFrameFlags,
    pub mfcode: Option<u16>,
    pub seqnr: u8,
    pub cmd: u8,
}

impl ZclFrame {
    pub fn parse(data: &mut impl Read) -> ZclResult<Self> {
        let flags = ZclFrameFlags::unpack(&[data.read_u8()?])?;

        // manufacturer code is little endian on the wire, like every other
        // multi-byte zcl field
        let mfcode = if flags.manufacturer_specific {
            Some(data.read_u16::<LE>()?)
        } else {
            None
        };

        let seqnr = data.read_u8()?;
        let cmd = data.read_u8()?;

        Ok(Self {
            flags,
            mfcode,
            seqnr,
            cmd,
        })
    }

    /// Parse the header from the front of `data`, returning the header and
    /// the remaining command body.
    #[allow(clippy::cast_possible_truncation)]
    pub fn split(data: &[u8]) -> ZclResult<(Self, &[u8])> {
        let mut cur = Cursor::new(data);
        let frame = Self::parse(&mut cur)?;
        let body = &data[cur.position() as usize..];
        Ok((frame, body))
    }

    #[must_use]
    pub fn cluster_specific(&self) -> bool {
        self.flags.frame_type == ZclFrameType::ClusterSpecific
    }

    #[must_use]
    pub const fn manufacturer_specific(&self) -> bool {
        self.flags.manufacturer_specific
    }

    #[must_use]
    pub fn from_server(&self) -> bool {
        self.flags.direction == ZclFrameDirection::ServerToClient
    }
}
