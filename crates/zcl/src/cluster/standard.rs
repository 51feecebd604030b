use packed_struct::PrimitiveEnum;

use crate::attr::{ZclCommand, ZclReadAttrResp, ZclReportAttr};
use crate::error::ZclResult;
use crate::frame::ZclFrame;

pub fn describe(frame: &ZclFrame, data: &[u8]) -> ZclResult<Option<String>> {
    let cmd = ZclCommand::from_primitive(frame.cmd);
    let desc = match cmd {
        Some(ZclCommand::ReadAttrib) => {
            let attr: Vec<u16> = data
                .chunks_exact(2)
                .map(|v| u16::from_le_bytes([v[0], v[1]]))
                .collect();
            Some(format!("Attr rd  -> {attr:04x?}"))
        }
        Some(ZclCommand::ReadAttribResp) => {
            let req = ZclReadAttrResp::parse(data)?;
            Some(format!("Attr rd <-  {:?}", req.attr))
        }
        Some(ZclCommand::ReportAttrib) => {
            let req = ZclReportAttr::parse(data)?;
            Some(format!("Attr rp <-  {:?}", req.attr))
        }
        Some(ZclCommand::DefaultResp) => Some(format!("Default rsp {}", hex::encode(data))),
        _ => None,
    };

    Ok(desc)
}

#[cfg(test)]
mod tests {
    use crate::cluster::describe;
    use crate::cluster::id;
    use crate::frame::ZclFrame;

    #[test]
    fn describe_report() {
        let data = [0x18, 0x01, 0x0a, 0x00, 0x00, 0x21, 0xe8, 0x03];
        let (frame, body) = ZclFrame::split(&data).unwrap();
        let desc = describe(id::ILLUMINANCE_MEASUREMENT, &frame, body).unwrap();

        assert_eq!(desc.as_deref(), Some("Attr rp <-  [0000:u16:1000]"));
    }

    #[test]
    fn describe_unknown_global_command() {
        let data = [0x10, 0x01, 0x0c];
        let (frame, body) = ZclFrame::split(&data).unwrap();

        assert_eq!(describe(id::BASIC, &frame, body).unwrap(), None);
    }
}
