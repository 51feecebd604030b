use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use zcl::attr::{ZclAttr, ZclAttrValue};
use zcl::cluster::ias_zone::{self, ZoneStatus};

use crate::bus::{OccupancyBus, OccupancyState, Topic};
use crate::cluster::AttributeStore;
use crate::error::QuirkResult;

#[derive(Debug)]
struct Timer {
    state: OccupancyState,
    pending: Option<JoinHandle<()>>,
    /// Bumped on every motion signal. A deferred reset only applies if
    /// no newer signal arrived since it was scheduled.
    generation: u64,
}

impl Timer {
    fn cancel(&mut self) {
        if let Some(job) = self.pending.take() {
            job.abort();
        }
    }
}

/// Motion interpretation of an IAS zone cluster, with automatic reset.
///
/// The sensor only ever reports "motion detected". The alarm is cleared
/// here, once no further motion has been reported for the reset period.
/// The `ZoneStatus` alarm bit of the owning cluster follows the state, and
/// every transition is published on the device occupancy bus.
///
/// Transitions and their publishes are serialized, so subscribers see them
/// in order on any runtime flavor. Bus handlers must not feed motion
/// signals back into the same instance.
#[derive(Clone)]
pub struct MotionReset {
    reset: Duration,
    timer: Arc<Mutex<Timer>>,
    order: Arc<Mutex<()>>,
    store: AttributeStore,
    bus: OccupancyBus,
}

impl MotionReset {
    #[must_use]
    pub fn new(reset: Duration, store: AttributeStore, bus: OccupancyBus) -> Self {
        store.seed(ZclAttr::new(
            ias_zone::ZONE_TYPE,
            ZclAttrValue::E16(ias_zone::ZONE_TYPE_MOTION_SENSOR),
        ));
        store.seed(ZclAttr::new(
            ias_zone::ZONE_STATUS,
            ZclAttrValue::B16(ZoneStatus::empty().bits()),
        ));

        let timer = Timer {
            state: OccupancyState::idle(),
            pending: None,
            generation: 0,
        };

        Self {
            reset,
            timer: Arc::new(Mutex::new(timer)),
            order: Arc::new(Mutex::new(())),
            store,
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Timer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn serialize(&self) -> MutexGuard<'_, ()> {
        self.order.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub const fn reset(&self) -> Duration {
        self.reset
    }

    #[must_use]
    pub fn state(&self) -> OccupancyState {
        self.lock().state
    }

    /// True while a deferred reset is scheduled and has not fired yet.
    #[must_use]
    pub fn pending(&self) -> bool {
        self.lock()
            .pending
            .as_ref()
            .is_some_and(|job| !job.is_finished())
    }

    /// Handle a zone status reported by the device.
    ///
    /// The alarm bit means motion. A cleared alarm bit is not a signal:
    /// the reset timer owns the transition back to idle. Other status bits
    /// (tamper, battery) are stored as reported, with the alarm bit forced
    /// to the current state.
    ///
    /// Fails without touching any state when no tokio runtime is available
    /// to run the deferred reset.
    pub fn zone_status(&self, status: ZoneStatus) -> QuirkResult<()> {
        if status.motion() {
            return self.signal(status);
        }

        let _order = self.serialize();
        let active = self.lock().state.active;
        log::trace!("Zone status {status:?} without alarm, keeping active={active}");
        self.write_status(status, active);
        Ok(())
    }

    /// Feed one motion-detected signal into the state machine, keeping the
    /// other stored status bits.
    pub fn motion_detected(&self) -> QuirkResult<()> {
        self.signal(self.stored_status())
    }

    fn signal(&self, reported: ZoneStatus) -> QuirkResult<()> {
        let rt = Handle::try_current()?;
        let _order = self.serialize();

        let (generation, activated) = {
            let mut timer = self.lock();
            timer.cancel();
            timer.generation += 1;

            let activated = !timer.state.active;
            timer.state = OccupancyState {
                active: true,
                last_set_at: Utc::now(),
            };

            (timer.generation, activated.then_some(timer.state))
        };

        if let Some(state) = activated {
            log::debug!(
                "[ep {}] Motion detected, resetting in {:?}",
                self.store.endpoint(),
                self.reset
            );
            self.announce(reported, &state);
        } else {
            log::trace!("[ep {}] Motion still present, extending", self.store.endpoint());
            let flags = reported.difference(ZoneStatus::ALARM1);
            if flags != self.stored_status().difference(ZoneStatus::ALARM1) {
                self.write_status(reported, true);
            }
        }

        let this = self.clone();
        let job = rt.spawn(async move {
            tokio::time::sleep(this.reset).await;
            this.expire(generation);
        });

        let mut timer = self.lock();
        if timer.generation == generation {
            timer.pending = Some(job);
        } else {
            job.abort();
        }

        Ok(())
    }

    /// Cancel the pending reset, if any. Cancelling twice is harmless.
    pub fn cancel(&self) {
        self.lock().cancel();
    }

    fn expire(&self, generation: u64) {
        let _order = self.serialize();

        let state = {
            let mut timer = self.lock();
            if timer.generation != generation || !timer.state.active {
                log::trace!("Ignoring stale motion reset #{generation}");
                return;
            }

            timer.pending = None;
            timer.state = OccupancyState {
                active: false,
                last_set_at: Utc::now(),
            };
            timer.state
        };

        log::debug!("[ep {}] No motion for {:?}, clearing", self.store.endpoint(), self.reset);
        self.announce(self.stored_status(), &state);
    }

    fn stored_status(&self) -> ZoneStatus {
        self.store
            .get(ias_zone::ZONE_STATUS)
            .and_then(|val| val.as_u32())
            .and_then(|bits| u16::try_from(bits).ok())
            .map_or_else(ZoneStatus::empty, ZoneStatus::from_bits_retain)
    }

    fn announce(&self, status: ZoneStatus, state: &OccupancyState) {
        self.write_status(status, state.active);
        self.bus.publish(Topic::Occupancy, state);
    }

    fn write_status(&self, mut status: ZoneStatus, active: bool) {
        status.set(ZoneStatus::ALARM1, active);
        self.store.update(ZclAttr::new(
            ias_zone::ZONE_STATUS,
            ZclAttrValue::B16(status.bits()),
        ));
    }
}

impl std::fmt::Debug for MotionReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionReset")
            .field("reset", &self.reset)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
