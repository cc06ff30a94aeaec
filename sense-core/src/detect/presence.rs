//! Presence detector.
//!
//! Watches the downstream status line and decides whether a device is
//! attached. The line blinks on its own while the downstream device idles, so
//! a single edge proves nothing: the detector samples the line at five
//! staggered tick checkpoints whose irregular spacing cannot alias with a
//! periodic blink. Only a line that stays asserted through every checkpoint
//! is treated as a stable connection.

use crate::lines::{InputLine, LineDrive, LineDriver, LineSampler, OutputLine};
use crate::telemetry::{EventKind, EventRecorder};
use crate::timer::{OverflowTimer, SharedTimer, TimerOwner};

/// Early-abort checkpoints.
///
/// Calibration data: the irregular spacing is deliberate anti-aliasing
/// against the status line's natural blink cadence. Preserve exactly.
pub const PRESENCE_CHECKPOINTS: [u16; 4] = [100, 293, 345, 598];

/// Terminal checkpoint that confirms the connection.
pub const PRESENCE_CONFIRM_TICKS: u16 = 612;

/// Observable detector states.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum PresenceState {
    #[default]
    Idle,
    Sampling,
}

/// State machine that watches the status line and owns the connected flag.
#[derive(Debug, Default)]
pub struct PresenceDetector {
    state: PresenceState,
    connected: bool,
}

impl PresenceDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: PresenceState::Idle,
            connected: false,
        }
    }

    /// Returns the current detector state.
    #[must_use]
    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// Last-confirmed presence state; persists across polling cycles.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Runs one poll cycle.
    pub fn poll<T, S, D>(
        &mut self,
        timer: &mut SharedTimer<T>,
        sampler: &S,
        driver: &mut D,
        events: &mut EventRecorder,
        cycle: u32,
    ) where
        T: OverflowTimer,
        S: LineSampler,
        D: LineDriver,
    {
        let asserted = sampler.is_asserted(InputLine::Status);

        // Instant disconnect outranks any in-progress sampling: no debounce
        // on the way out.
        if self.connected && !asserted {
            self.connected = false;
            drive_disconnected(driver, events, cycle);
            events.record(cycle, EventKind::PresenceLost);
        }

        if asserted
            && !self.connected
            && !timer.is_claimed_by(TimerOwner::Presence)
            && timer.claim(TimerOwner::Presence).is_ok()
        {
            self.state = PresenceState::Sampling;
            events.record(cycle, EventKind::TimerClaimed(TimerOwner::Presence));
        }

        // A button sequence may have left the clock source switched off;
        // sampling must not silently stall.
        if timer.ensure_running(TimerOwner::Presence) {
            events.record(cycle, EventKind::TimerRearmed(TimerOwner::Presence));
        }

        if !timer.is_claimed_by(TimerOwner::Presence) {
            return;
        }

        let Some(ticks) = timer.poll_tick(TimerOwner::Presence) else {
            return;
        };

        if PRESENCE_CHECKPOINTS.contains(&ticks) && !asserted {
            let _ = timer.release(TimerOwner::Presence);
            self.state = PresenceState::Idle;
            events.record(cycle, EventKind::PresenceAborted(ticks));
            events.record(cycle, EventKind::TimerReleased(TimerOwner::Presence));
            return;
        }

        if ticks >= PRESENCE_CONFIRM_TICKS {
            if asserted {
                self.connected = true;
                driver.drive(OutputLine::Indicator, LineDrive::High);
                events.record(
                    cycle,
                    EventKind::LineDriven(OutputLine::Indicator, LineDrive::High),
                );
                // Sense switches to output mode and asserts low.
                driver.drive(OutputLine::Sense, LineDrive::Low);
                events.record(
                    cycle,
                    EventKind::LineDriven(OutputLine::Sense, LineDrive::Low),
                );
                events.record(cycle, EventKind::PresenceConnected);
            } else {
                self.connected = false;
                drive_disconnected(driver, events, cycle);
                events.record(cycle, EventKind::PresenceRejected);
            }

            let _ = timer.release(TimerOwner::Presence);
            self.state = PresenceState::Idle;
            events.record(cycle, EventKind::TimerReleased(TimerOwner::Presence));
        }
    }
}

fn drive_disconnected<D: LineDriver>(driver: &mut D, events: &mut EventRecorder, cycle: u32) {
    driver.drive(OutputLine::Indicator, LineDrive::Low);
    events.record(
        cycle,
        EventKind::LineDriven(OutputLine::Indicator, LineDrive::Low),
    );
    driver.drive(OutputLine::Sense, LineDrive::Floating);
    events.record(
        cycle,
        EventKind::LineDriven(OutputLine::Sense, LineDrive::Floating),
    );
}
