use zcl::attr::{ZclAttr, ZclAttrValue};
use zcl::cluster::illuminance::MEASURED_VALUE;

use crate::cluster::AttributeTransform;

/// The sensor reports plain lux, while consumers expect the measured value
/// encoded as `10000 * log10(lux) + 1`.
///
/// Non-positive readings have no logarithm, and are passed through as-is,
/// as are all other attributes.
#[must_use]
pub fn transform(attribute_id: u16, raw_value: f64) -> f64 {
    if attribute_id == MEASURED_VALUE && raw_value > 0.0 {
        10000.0f64.mul_add(raw_value.log10(), 1.0)
    } else {
        raw_value
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IlluminanceTransform;

impl AttributeTransform for IlluminanceTransform {
    fn apply(&self, attr: ZclAttr) -> Vec<ZclAttr> {
        if attr.key != MEASURED_VALUE {
            return vec![attr];
        }

        match attr.value.as_f64() {
            Some(raw) if raw > 0.0 => {
                let value = ZclAttrValue::F64(transform(attr.key, raw));
                vec![ZclAttr::new(attr.key, value)]
            }
            _ => vec![attr],
        }
    }
}

#[cfg(test)]
mod tests {
    use zcl::attr::{ZclAttr, ZclAttrValue};

    use crate::cluster::AttributeTransform;
    use crate::cluster::illuminance::{IlluminanceTransform, transform};
    use crate::{compare, compare_float};

    #[test]
    fn known_values() {
        compare!(transform(0x0000, 1000.0), 30001.0);
        compare!(transform(0x0000, 1.0), 1.0);
        compare!(transform(0x0000, 10.0), 10001.0);
        compare!(transform(0x0000, 0.5), 10000.0 * 0.5f64.log10() + 1.0);
    }

    #[test]
    fn positive_values_follow_formula() {
        for raw in [0.001, 0.1, 2.0, 37.0, 500.0, 4_096.0, 65_535.0, 1e6] {
            compare!(transform(0x0000, raw), 10000.0 * raw.log10() + 1.0);
        }
    }

    #[test]
    fn non_positive_values_pass_through() {
        for raw in [0.0, -0.0, -1.0, -1000.0, f64::NEG_INFINITY] {
            assert_eq!(transform(0x0000, raw).to_bits(), raw.to_bits());
        }
        assert!(transform(0x0000, f64::NAN).is_nan());
    }

    #[test]
    fn other_attributes_pass_through() {
        assert_eq!(transform(0x0001, 1000.0), 1000.0);
        assert_eq!(transform(0x0004, 55.0), 55.0);
    }

    #[test]
    fn apply_rewrites_measured_value() {
        let out = IlluminanceTransform.apply(ZclAttr::new(0x0000, ZclAttrValue::U16(1000)));

        assert_eq!(out.len(), 1);
        let ZclAttrValue::F64(value) = out[0].value else {
            panic!("expected float value, got {:?}", out[0].value);
        };
        compare!(value, 30001.0);
    }

    #[test]
    fn apply_keeps_zero_reading() {
        let attr = ZclAttr::new(0x0000, ZclAttrValue::U16(0));
        assert_eq!(IlluminanceTransform.apply(attr.clone()), vec![attr]);
    }

    #[test]
    fn apply_keeps_other_attributes() {
        let attr = ZclAttr::new(0x0002, ZclAttrValue::U16(1000));
        assert_eq!(IlluminanceTransform.apply(attr.clone()), vec![attr]);
    }
}
