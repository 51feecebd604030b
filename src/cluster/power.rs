use zcl::attr::{ZclAttr, ZclAttrValue};
use zcl::cluster::power_configuration::{BATTERY_PERCENTAGE_REMAINING, BATTERY_VOLTAGE};

use crate::cluster::AttributeTransform;
use crate::config::BatteryConfig;

/// Derives `BatteryPercentageRemaining` from `BatteryVoltage`, for devices
/// that only report the latter.
#[derive(Debug, Clone, Copy)]
pub struct BatteryTransform {
    range: BatteryConfig,
}

impl BatteryTransform {
    #[must_use]
    pub const fn new(range: BatteryConfig) -> Self {
        Self { range }
    }

    /// Percentage in zcl units (0.5%), so a full battery is 200.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percentage(&self, raw_voltage: f64) -> u8 {
        let BatteryConfig {
            min_volts,
            max_volts,
        } = self.range;

        let volts = (raw_voltage / 10.0).clamp(min_volts, max_volts);
        let fraction = (volts - min_volts) / (max_volts - min_volts);

        (fraction * 200.0).round().clamp(0.0, 200.0) as u8
    }
}

impl AttributeTransform for BatteryTransform {
    fn apply(&self, attr: ZclAttr) -> Vec<ZclAttr> {
        if attr.key != BATTERY_VOLTAGE {
            return vec![attr];
        }

        match attr.value.as_f64() {
            // 0 and 0xff are "invalid" markers
            Some(raw) if raw != 0.0 && raw != 255.0 => {
                let pct = ZclAttrValue::U8(self.percentage(raw));
                vec![attr, ZclAttr::new(BATTERY_PERCENTAGE_REMAINING, pct)]
            }
            _ => vec![attr],
        }
    }
}

#[cfg(test)]
mod tests {
    use zcl::attr::{ZclAttr, ZclAttrValue};

    use crate::cluster::AttributeTransform;
    use crate::cluster::power::BatteryTransform;
    use crate::config::QuirkConfig;

    fn battery() -> BatteryTransform {
        BatteryTransform::new(QuirkConfig::default().battery)
    }

    #[test]
    fn percentage_range() {
        let bt = battery();

        assert_eq!(bt.percentage(21.0), 0);
        assert_eq!(bt.percentage(32.0), 200);
        assert_eq!(bt.percentage(30.0), 164);
        assert_eq!(bt.percentage(26.0), 91);
    }

    #[test]
    fn percentage_clamped() {
        let bt = battery();

        assert_eq!(bt.percentage(10.0), 0);
        assert_eq!(bt.percentage(40.0), 200);
    }

    #[test]
    fn voltage_report_adds_percentage() {
        let out = battery().apply(ZclAttr::new(0x0020, ZclAttrValue::U8(30)));

        assert_eq!(
            out,
            vec![
                ZclAttr::new(0x0020, ZclAttrValue::U8(30)),
                ZclAttr::new(0x0021, ZclAttrValue::U8(164)),
            ]
        );
    }

    #[test]
    fn invalid_voltage_markers_ignored() {
        for raw in [0, 255] {
            let attr = ZclAttr::new(0x0020, ZclAttrValue::U8(raw));
            assert_eq!(battery().apply(attr.clone()), vec![attr]);
        }
    }

    #[test]
    fn other_attributes_pass_through() {
        let attr = ZclAttr::new(0x0021, ZclAttrValue::U8(50));
        assert_eq!(battery().apply(attr.clone()), vec![attr]);
    }
}
