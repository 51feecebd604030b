use zcl::attr::{ZclAttr, ZclAttrValue};
use zcl::cluster::occupancy::{OCCUPANCY, OCCUPANCY_SENSOR_TYPE, SENSOR_TYPE_PIR};

use crate::bus::{OccupancyBus, Topic};
use crate::cluster::AttributeStore;

/// Wire an occupancy sensing cluster to the device bus.
///
/// The cluster has no input of its own: its `Occupancy` attribute mirrors
/// whatever the motion interpretation publishes.
pub fn attach(store: &AttributeStore, bus: &OccupancyBus) {
    store.seed(ZclAttr::new(
        OCCUPANCY_SENSOR_TYPE,
        ZclAttrValue::E8(SENSOR_TYPE_PIR),
    ));
    store.seed(ZclAttr::new(OCCUPANCY, ZclAttrValue::B8(0)));

    let store = store.clone();
    bus.subscribe(Topic::Occupancy, move |state| {
        let occupied = ZclAttrValue::B8(u8::from(state.active));
        store.update(ZclAttr::new(OCCUPANCY, occupied));
    });
}
