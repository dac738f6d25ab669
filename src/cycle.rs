// SomnoWatch — Power Cycle Controller
//
// One wake, start to finish. Every wake is a cold start: all intent is
// reconstructed here from the clock and flash contents, nothing is
// carried in memory across sleep. The hardware entry point in main.rs
// wires real drivers into the context; tests wire fakes.

use std::time::Duration;

use crate::acquire;
use crate::clock::Clock;
use crate::hal::{
    Connectivity, HapticActuator, InertialSensor, NonVolatileStore, PulseOximeter, ThermalProbe,
};
use crate::posture;
use crate::store::{LogStore, SampleSink};
use crate::sync::{self, SyncOutcome};

/// Everything one wake needs, constructed fresh each boot.
pub struct WakeContext<'a> {
    pub clock: &'a dyn Clock,
    pub conn: &'a mut dyn Connectivity,
    pub store: &'a LogStore,
    pub nvs: &'a mut dyn NonVolatileStore,
    pub sink: &'a mut dyn SampleSink,
    pub oximeter: &'a mut dyn PulseOximeter,
    pub probe: &'a mut dyn ThermalProbe,
    pub imu: &'a mut dyn InertialSensor,
    pub haptic: &'a mut dyn HapticActuator,
}

/// What this wake actually did, for the boot log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeReport {
    pub sync: SyncOutcome,
    pub recorded: bool,
    pub corrected: bool,
}

/// Run the wake sequence: (one-time) clock bootstrap → sync decision →
/// acquisition + append → posture check. Each step's failure is logged
/// and contained; the caller arms the sleep timer no matter what comes
/// back.
pub fn run_wake(cx: &mut WakeContext<'_>, sample_period: Duration) -> WakeReport {
    if !cx.clock.is_set() {
        log::info!("clock not set — bootstrapping from network time");
        if let Err(e) = cx.conn.bootstrap_clock() {
            log::warn!("clock bootstrap failed, retrying next wake: {e}");
        }
    }

    let now = cx.clock.now();
    log::info!(
        "wake at {:02}:{:02}:{:02} (day {})",
        now.hour,
        now.minute,
        now.second,
        now.day
    );

    let sync = match sync::maybe_sync(now, cx.store, cx.conn, cx.sink, cx.nvs) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("sync failed, store preserved for retry: {e}");
            SyncOutcome::Offline
        }
    };

    let recorded = match acquire::acquire(cx.oximeter, cx.probe, now, sample_period) {
        Ok(record) => match cx.store.append(&record) {
            Ok(()) => true,
            Err(e) => {
                // Accepted loss boundary: this one record is gone.
                log::warn!("append failed, record dropped: {e}");
                false
            }
        },
        Err(e) => {
            log::warn!("acquisition failed, no record this wake: {e}");
            false
        }
    };

    let corrected = posture::check_and_correct(cx.imu, cx.haptic).unwrap_or_else(|e| {
        log::warn!("posture check failed: {e}");
        false
    });

    WakeReport { sync, recorded, corrected }
}
