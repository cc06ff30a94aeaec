//! Telemetry event catalog and ring recorder shared by firmware and host
//! targets.
//!
//! Every state transition the detectors make is recorded here: line drives,
//! timer ownership changes, checkpoint aborts, and confirmed outcomes. The
//! ring keeps a bounded history so the firmware log task and the host
//! emulator can drain events without the detectors knowing who is listening.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::lines::{LineDrive, OutputLine, output_info};
use crate::timer::TimerOwner;

/// Identifier handed out for each recorded event, monotonically increasing.
pub type EventId = u32;

/// Total number of telemetry records retained in memory.
pub const EVENT_RING_CAPACITY: usize = 64;

/// Discriminated telemetry events emitted by the detectors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EventKind {
    /// An output line changed drive.
    LineDriven(OutputLine, LineDrive),
    /// A detector claimed the shared timer.
    TimerClaimed(TimerOwner),
    /// A detector released the shared timer.
    TimerReleased(TimerOwner),
    /// The clock source was found stopped mid-claim and forced back on.
    TimerRearmed(TimerOwner),
    /// Button hold confirmed; the pulse action fired.
    HoldConfirmed,
    /// Button hold cancelled at the given tick checkpoint.
    HoldAborted(u16),
    /// Presence confirmed at the terminal checkpoint.
    PresenceConnected,
    /// Terminal checkpoint found the status line deasserted.
    PresenceRejected,
    /// Presence sampling cancelled at the given tick checkpoint.
    PresenceAborted(u16),
    /// Instant disconnect: the status line dropped while connected.
    PresenceLost,
}

impl EventKind {
    const LINE_DRIVEN_BASE: u16 = 0x0000;
    const TIMER_CLAIMED_BASE: u16 = 0x0010;
    const TIMER_RELEASED_BASE: u16 = 0x0012;
    const TIMER_REARMED_BASE: u16 = 0x0014;
    const HOLD_CONFIRMED_CODE: u16 = 0x0020;
    const HOLD_ABORTED_CODE: u16 = 0x0021;
    const PRESENCE_CONNECTED_CODE: u16 = 0x0030;
    const PRESENCE_REJECTED_CODE: u16 = 0x0031;
    const PRESENCE_ABORTED_CODE: u16 = 0x0032;
    const PRESENCE_LOST_CODE: u16 = 0x0033;

    /// Encodes the event kind into a compact log-friendly discriminant.
    ///
    /// Checkpoint tick payloads are not part of the code; they travel in the
    /// structured record instead.
    #[must_use]
    pub const fn to_raw(self) -> u16 {
        match self {
            EventKind::LineDriven(line, drive) => {
                Self::LINE_DRIVEN_BASE + (line.as_index() as u16) * 3 + drive_index(drive)
            }
            EventKind::TimerClaimed(owner) => Self::TIMER_CLAIMED_BASE + owner_index(owner),
            EventKind::TimerReleased(owner) => Self::TIMER_RELEASED_BASE + owner_index(owner),
            EventKind::TimerRearmed(owner) => Self::TIMER_REARMED_BASE + owner_index(owner),
            EventKind::HoldConfirmed => Self::HOLD_CONFIRMED_CODE,
            EventKind::HoldAborted(_) => Self::HOLD_ABORTED_CODE,
            EventKind::PresenceConnected => Self::PRESENCE_CONNECTED_CODE,
            EventKind::PresenceRejected => Self::PRESENCE_REJECTED_CODE,
            EventKind::PresenceAborted(_) => Self::PRESENCE_ABORTED_CODE,
            EventKind::PresenceLost => Self::PRESENCE_LOST_CODE,
        }
    }

    /// Static label used by logging on both firmware and host targets.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            EventKind::LineDriven(..) => "line-driven",
            EventKind::TimerClaimed(_) => "timer-claimed",
            EventKind::TimerReleased(_) => "timer-released",
            EventKind::TimerRearmed(_) => "timer-rearmed",
            EventKind::HoldConfirmed => "hold-confirmed",
            EventKind::HoldAborted(_) => "hold-aborted",
            EventKind::PresenceConnected => "presence-connected",
            EventKind::PresenceRejected => "presence-rejected",
            EventKind::PresenceAborted(_) => "presence-aborted",
            EventKind::PresenceLost => "presence-lost",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::LineDriven(line, drive) => {
                write!(f, "line-driven {} {drive}", output_info(*line).name)
            }
            EventKind::TimerClaimed(owner) => write!(f, "timer-claimed {owner}"),
            EventKind::TimerReleased(owner) => write!(f, "timer-released {owner}"),
            EventKind::TimerRearmed(owner) => write!(f, "timer-rearmed {owner}"),
            EventKind::HoldAborted(tick) => write!(f, "hold-aborted @{tick}"),
            EventKind::PresenceAborted(tick) => write!(f, "presence-aborted @{tick}"),
            other => f.write_str(other.label()),
        }
    }
}

const fn drive_index(drive: LineDrive) -> u16 {
    match drive {
        LineDrive::Floating => 0,
        LineDrive::Low => 1,
        LineDrive::High => 2,
    }
}

const fn owner_index(owner: TimerOwner) -> u16 {
    match owner {
        TimerOwner::Buttons => 0,
        TimerOwner::Presence => 1,
    }
}

/// Telemetry record stored in the ring buffer.
///
/// `cycle` is the dispatcher poll cycle the event occurred in; the core stays
/// clock-agnostic, so wall-time stamping lives with the firmware log.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EventRecord {
    pub id: EventId,
    pub cycle: u32,
    pub event: EventKind,
}

/// Records detector events into a fixed-size ring buffer.
pub struct EventRecorder {
    ring: HistoryBuf<EventRecord, EVENT_RING_CAPACITY>,
    next_id: EventId,
}

impl EventRecorder {
    /// Creates a recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_id: 0,
        }
    }

    /// Appends an event, returning its identifier.
    pub fn record(&mut self, cycle: u32, event: EventKind) -> EventId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.ring.write(EventRecord { id, cycle, event });
        id
    }

    /// Returns the most recent record, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&EventRecord> {
        self.ring.recent()
    }

    /// Returns the number of records currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no records are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Iterates over retained records in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, EventRecord> {
        self.ring.oldest_ordered()
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}
