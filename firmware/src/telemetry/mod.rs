//! Console mirror for the core event ring.
//!
//! The dispatcher records events into its in-memory ring; this module drains
//! anything new after each poll and mirrors it to defmt (or stdout when built
//! for the host) so bring-up does not need a debugger attached.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use sense_core::telemetry::{EventId, EventKind, EventRecord, EventRecorder};

/// Outcome of one drain pass.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Drained {
    /// Number of records logged by this pass.
    pub new_records: usize,
    /// Set when a pulse completion was among them.
    pub hold_confirmed: bool,
}

/// Cursor over the event ring that logs each record exactly once.
pub struct EventLogger {
    last_seen: Option<EventId>,
}

impl EventLogger {
    pub const fn new() -> Self {
        Self { last_seen: None }
    }

    /// Logs every record newer than the previous pass.
    ///
    /// Event ids are monotonic, so a simple high-water mark survives the
    /// ring dropping old records between passes.
    pub fn drain(&mut self, events: &EventRecorder) -> Drained {
        let mut drained = Drained::default();
        for record in events.oldest_first() {
            if let Some(last) = self.last_seen
                && record.id <= last
            {
                continue;
            }
            self.last_seen = Some(record.id);
            drained.new_records += 1;
            if record.event == EventKind::HoldConfirmed {
                drained.hold_confirmed = true;
            }
            emit(record);
        }
        drained
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "none")]
fn emit(record: &EventRecord) {
    defmt::info!(
        "event {=str} code={=u16:04x} cycle={=u32}",
        record.event.label(),
        record.event.to_raw(),
        record.cycle
    );
}

#[cfg(not(target_os = "none"))]
fn emit(record: &EventRecord) {
    println!(
        "event {} code={:#06x} cycle={}",
        record.event,
        record.event.to_raw(),
        record.cycle
    );
}
