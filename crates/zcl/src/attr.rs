use std::fmt::Debug;
use std::io::{Cursor, Read};

use byteorder::{LE, ReadBytesExt};
use packed_struct::prelude::*;

use crate::error::{ZclError, ZclResult};

/// Profile-wide (global) command ids
#[derive(PrimitiveEnum_u8, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ZclCommand {
    ReadAttrib = 0x00,
    ReadAttribResp = 0x01,
    WriteAttrib = 0x02,
    WriteAttribUndiv = 0x03,
    WriteAttribResp = 0x04,
    WriteAttribNoResp = 0x05,
    ConfigReport = 0x06,
    ConfigReportResp = 0x07,
    ReadReportCfg = 0x08,
    ReadReportCfgResp = 0x09,
    ReportAttrib = 0x0a,
    DefaultResp = 0x0b,
    DiscAttrib = 0x0c,
    DiscAttribResp = 0x0d,
}

#[derive(PrimitiveEnum_u8, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ZclDataType {
    /** Null data type */
    Null = 0x00,

    /** 8-bit value data type */
    Zcl8bit = 0x08,

    /** 16-bit value data type */
    Zcl16bit = 0x09,

    /** 32-bit value data type */
    Zcl32bit = 0x0b,

    /** Boolean data type */
    ZclBool = 0x10,

    /** 8-bit bitmap data type */
    Zcl8bitmap = 0x18,

    /** 16-bit bitmap data type */
    Zcl16bitmap = 0x19,

    /** 32-bit bitmap data type */
    Zcl32bitmap = 0x1b,

    /** Unsigned 8-bit value data type */
    ZclU8 = 0x20,

    /** Unsigned 16-bit value data type */
    ZclU16 = 0x21,

    /** Unsigned 32-bit value data type */
    ZclU32 = 0x23,

    /** Signed 8-bit value data type */
    ZclI8 = 0x28,

    /** Signed 16-bit value data type */
    ZclI16 = 0x29,

    /** Signed 32-bit value data type */
    ZclI32 = 0x2b,

    /** 8-bit enumeration data type */
    ZclE8 = 0x30,

    /** 16-bit enumeration data type */
    ZclE16 = 0x31,

    /** Single precision float data type */
    ZclF32 = 0x39,

    /** Double precision float data type */
    ZclF64 = 0x3a,

    /** Byte array data type */
    ZclBytearray = 0x41,

    /** Character string data type */
    ZclCharstring = 0x42,
}

#[derive(Clone, PartialEq)]
pub enum ZclAttrValue {
    Null,
    X8(i8),
    X16(i16),
    X32(i32),
    Bool(bool),
    B8(u8),
    B16(u16),
    B32(u32),
    U8(u8),
    U16(u16),
    U32(u32),
    I8(i8),
    I16(i16),
    I32(i32),
    E8(u8),
    E16(u16),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
    String(String),
    Unsupported,
}

impl ZclAttrValue {
    /// Numeric view of the value, for the types where that makes sense.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        let val = match self {
            Self::X8(val) | Self::I8(val) => f64::from(*val),
            Self::X16(val) | Self::I16(val) => f64::from(*val),
            Self::X32(val) | Self::I32(val) => f64::from(*val),
            Self::B8(val) | Self::U8(val) | Self::E8(val) => f64::from(*val),
            Self::B16(val) | Self::U16(val) | Self::E16(val) => f64::from(*val),
            Self::B32(val) | Self::U32(val) => f64::from(*val),
            Self::F32(val) => f64::from(*val),
            Self::F64(val) => *val,
            Self::Bool(val) => f64::from(u8::from(*val)),
            Self::Null | Self::Bytes(_) | Self::String(_) | Self::Unsupported => return None,
        };
        Some(val)
    }

    /// Integer view of bitmap/unsigned values, used for flag fields.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::B8(val) | Self::U8(val) | Self::E8(val) => Some(u32::from(*val)),
            Self::B16(val) | Self::U16(val) | Self::E16(val) => Some(u32::from(*val)),
            Self::B32(val) | Self::U32(val) => Some(*val),
            _ => None,
        }
    }
}

impl Debug for ZclAttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::X8(val) => write!(f, "x8:{val}"),
            Self::X16(val) => write!(f, "x16:{val}"),
            Self::X32(val) => write!(f, "x32:{val}"),
            Self::Bool(val) => write!(f, "bool:{val}"),
            Self::B8(val) => write!(f, "b8:{val:02X}"),
            Self::B16(val) => write!(f, "b16:{val:04X}"),
            Self::B32(val) => write!(f, "b32:{val:08X}"),
            Self::U8(val) => write!(f, "u8:{val}"),
            Self::U16(val) => write!(f, "u16:{val}"),
            Self::U32(val) => write!(f, "u32:{val}"),
            Self::I8(val) => write!(f, "i8:{val}"),
            Self::I16(val) => write!(f, "i16:{val}"),
            Self::I32(val) => write!(f, "i32:{val}"),
            Self::E8(val) => write!(f, "e8:{val:02X}"),
            Self::E16(val) => write!(f, "e16:{val:04X}"),
            Self::F32(val) => write!(f, "f32:{val}"),
            Self::F64(val) => write!(f, "f64:{val}"),
            Self::Bytes(val) => write!(f, "hex:{}", hex::encode(val)),
            Self::String(val) => write!(f, "str:{val}"),
            Self::Unsupported => write!(f, "Unsupported"),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct ZclAttr {
    pub key: u16,
    pub value: ZclAttrValue,
}

impl Debug for ZclAttr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}:{:?}", self.key, self.value)
    }
}

impl ZclAttr {
    #[must_use]
    pub const fn new(key: u16, value: ZclAttrValue) -> Self {
        Self { key, value }
    }

    fn from_reader(rdr: &mut impl Read, check_status: bool) -> ZclResult<Self> {
        let key = rdr.read_u16::<LE>()?;

        if check_status {
            let status = rdr.read_u8()?;
            if status != 0 {
                return Ok(Self {
                    key,
                    value: ZclAttrValue::Unsupported,
                });
            }
        }

        let raw = rdr.read_u8()?;
        let dtype = ZclDataType::from_primitive(raw).ok_or(ZclError::UnsupportedDataType(raw))?;

        let value = match dtype {
            ZclDataType::Null => ZclAttrValue::Null,
            ZclDataType::Zcl8bit => ZclAttrValue::X8(rdr.read_i8()?),
            ZclDataType::Zcl16bit => ZclAttrValue::X16(rdr.read_i16::<LE>()?),
            ZclDataType::Zcl32bit => ZclAttrValue::X32(rdr.read_i32::<LE>()?),
            ZclDataType::ZclBool => ZclAttrValue::Bool(rdr.read_u8()? != 0),
            ZclDataType::Zcl8bitmap => ZclAttrValue::B8(rdr.read_u8()?),
            ZclDataType::Zcl16bitmap => ZclAttrValue::B16(rdr.read_u16::<LE>()?),
            ZclDataType::Zcl32bitmap => ZclAttrValue::B32(rdr.read_u32::<LE>()?),
            ZclDataType::ZclU8 => ZclAttrValue::U8(rdr.read_u8()?),
            ZclDataType::ZclU16 => ZclAttrValue::U16(rdr.read_u16::<LE>()?),
            ZclDataType::ZclU32 => ZclAttrValue::U32(rdr.read_u32::<LE>()?),
            ZclDataType::ZclI8 => ZclAttrValue::I8(rdr.read_i8()?),
            ZclDataType::ZclI16 => ZclAttrValue::I16(rdr.read_i16::<LE>()?),
            ZclDataType::ZclI32 => ZclAttrValue::I32(rdr.read_i32::<LE>()?),
            ZclDataType::ZclE8 => ZclAttrValue::E8(rdr.read_u8()?),
            ZclDataType::ZclE16 => ZclAttrValue::E16(rdr.read_u16::<LE>()?),
            ZclDataType::ZclF32 => ZclAttrValue::F32(rdr.read_f32::<LE>()?),
            ZclDataType::ZclF64 => ZclAttrValue::F64(rdr.read_f64::<LE>()?),
            ZclDataType::ZclBytearray => {
                let len = rdr.read_u8()?;
                let mut buf = vec![0; len as usize];
                rdr.read_exact(&mut buf)?;
                ZclAttrValue::Bytes(buf)
            }
            ZclDataType::ZclCharstring => {
                let len = rdr.read_u8()?;
                let mut buf = vec![0; len as usize];
                rdr.read_exact(&mut buf)?;
                ZclAttrValue::String(String::from_utf8(buf)?)
            }
        };

        Ok(Self { key, value })
    }

    pub fn readattr_from_reader(rdr: &mut impl Read) -> ZclResult<Self> {
        Self::from_reader(rdr, true)
    }

    pub fn reportattr_from_reader(rdr: &mut impl Read) -> ZclResult<Self> {
        Self::from_reader(rdr, false)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_records(
    data: &[u8],
    read: impl Fn(&mut Cursor<&[u8]>) -> ZclResult<ZclAttr>,
) -> ZclResult<Vec<ZclAttr>> {
    let mut attr = vec![];

    let mut cur = Cursor::new(data);
    while (cur.position() as usize) < data.len() {
        attr.push(read(&mut cur)?);
    }

    Ok(attr)
}

#[derive(Debug, Clone)]
pub struct ZclReadAttrResp {
    pub attr: Vec<ZclAttr>,
}

impl ZclReadAttrResp {
    pub fn parse(data: &[u8]) -> ZclResult<Self> {
        let attr = parse_records(data, |cur| ZclAttr::readattr_from_reader(cur))?;
        Ok(Self { attr })
    }
}

#[derive(Debug, Clone)]
pub struct ZclReportAttr {
    pub attr: Vec<ZclAttr>,
}

impl ZclReportAttr {
    pub fn parse(data: &[u8]) -> ZclResult<Self> {
        let attr = parse_records(data, |cur| ZclAttr::reportattr_from_reader(cur))?;
        Ok(Self { attr })
    }
}

#[cfg(test)]
mod tests {
    use crate::attr::{ZclAttr, ZclAttrValue, ZclReadAttrResp, ZclReportAttr};
    use crate::error::ZclError;

    #[test]
    fn report_multiple_records() {
        let data = [
            0x00, 0x00, 0x21, 0xe8, 0x03, // 0x0000 u16 1000
            0x20, 0x00, 0x20, 0x1e, // 0x0020 u8 30
        ];
        let rep = ZclReportAttr::parse(&data).unwrap();

        assert_eq!(
            rep.attr,
            vec![
                ZclAttr::new(0x0000, ZclAttrValue::U16(1000)),
                ZclAttr::new(0x0020, ZclAttrValue::U8(30)),
            ]
        );
    }

    #[test]
    fn report_bitmap_and_string() {
        let data = [
            0x02, 0x00, 0x19, 0x01, 0x00, // 0x0002 b16 0x0001
            0x05, 0x00, 0x42, 0x02, b'h', b'i', // 0x0005 "hi"
        ];
        let rep = ZclReportAttr::parse(&data).unwrap();

        assert_eq!(rep.attr[0].value, ZclAttrValue::B16(0x0001));
        assert_eq!(rep.attr[1].value, ZclAttrValue::String("hi".into()));
    }

    #[test]
    fn read_response_failed_status() {
        let data = [
            0x21, 0x00, 0x86, // 0x0021 unsupported attribute
            0x20, 0x00, 0x00, 0x20, 0x1f, // 0x0020 ok u8 31
        ];
        let rsp = ZclReadAttrResp::parse(&data).unwrap();

        assert_eq!(rsp.attr[0].value, ZclAttrValue::Unsupported);
        assert_eq!(rsp.attr[1], ZclAttr::new(0x0020, ZclAttrValue::U8(31)));
    }

    #[test]
    fn unknown_data_type() {
        let res = ZclReportAttr::parse(&[0x00, 0x00, 0xf0, 0x00]);
        assert!(matches!(res, Err(ZclError::UnsupportedDataType(0xf0))));
    }

    #[test]
    fn truncated_value() {
        let res = ZclReportAttr::parse(&[0x00, 0x00, 0x21, 0xe8]);
        assert!(matches!(res, Err(ZclError::IOError(_))));
    }

    #[test]
    fn numeric_views() {
        assert_eq!(ZclAttrValue::U16(1000).as_f64(), Some(1000.0));
        assert_eq!(ZclAttrValue::I16(-5).as_f64(), Some(-5.0));
        assert_eq!(ZclAttrValue::F64(2.5).as_f64(), Some(2.5));
        assert_eq!(ZclAttrValue::String("x".into()).as_f64(), None);
        assert_eq!(ZclAttrValue::B16(0x0021).as_u32(), Some(0x21));
        assert_eq!(ZclAttrValue::I8(1).as_u32(), None);
    }
}
