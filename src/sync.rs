// SomnoWatch — Upload Sync Task
//
// Once-per-day drain of the log store to the collector. The gate is a
// pure function of durable state (hour-of-day + the persisted last-sync
// day stamp), because nothing in memory survives deep sleep.

use crate::clock::WallTime;
use crate::config::{LAST_SYNC_DAY_KEY, SYNC_HOUR};
use crate::error::Result;
use crate::hal::{Connectivity, NonVolatileStore};
use crate::store::{LogStore, SampleSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Before the morning threshold; nothing touched.
    NotDue,
    /// Already uploaded today; radio stays off.
    AlreadySynced,
    /// Association failed; store untouched, retried next eligible wake.
    Offline,
    /// Batch of `n` records delivered and cleared.
    Uploaded(usize),
}

/// Evaluated once per wake. Eligible iff the hour has reached
/// `SYNC_HOUR` and no sync has been stamped for today. The stamp is
/// written only after confirmed delivery, so any failure path leaves
/// both the store and the gate ready to retry.
pub fn maybe_sync(
    now: WallTime,
    store: &LogStore,
    conn: &mut dyn Connectivity,
    sink: &mut dyn SampleSink,
    nvs: &mut dyn NonVolatileStore,
) -> Result<SyncOutcome> {
    if now.hour < SYNC_HOUR {
        return Ok(SyncOutcome::NotDue);
    }
    if nvs.get_u32(LAST_SYNC_DAY_KEY)? == Some(now.day) {
        return Ok(SyncOutcome::AlreadySynced);
    }

    if !conn.try_connect() {
        log::warn!("collector unreachable — sync retried next eligible wake");
        return Ok(SyncOutcome::Offline);
    }

    // Radio-on time must stay bounded: disconnect on every path out.
    let drained = store.drain_and_clear(sink);
    conn.disconnect();

    let count = drained?;
    nvs.set_u32(LAST_SYNC_DAY_KEY, now.day)?;
    log::info!("uploaded {count} records");
    Ok(SyncOutcome::Uploaded(count))
}
