//! Button-hold detector.
//!
//! Both volume buttons held through the confirm threshold trigger a momentary
//! low pulse on the direction-switched pulse line. The hold is re-verified
//! only at two early checkpoints, not on every tick; a release between
//! checkpoints goes unnoticed until the next one.

use core::time::Duration;

use crate::lines::{InputLine, LineDrive, LineDriver, LineSampler, OutputLine};
use crate::telemetry::{EventKind, EventRecorder};
use crate::timer::{OverflowTimer, SharedTimer, TimerOwner};

use super::PulseDelay;

/// Early-release checkpoints, roughly a third and two thirds of the hold.
pub const HOLD_CHECKPOINTS: [u16; 2] = [100, 200];

/// Tick count that confirms the hold and fires the pulse action.
pub const HOLD_CONFIRM_TICKS: u16 = 300;

/// Duration the pulse line is driven low.
///
/// The delay blocks the single thread of control; nothing else polls while
/// the pulse is active.
pub const PULSE_HOLD: Duration = Duration::from_millis(1_000);

/// Observable detector states.
///
/// There is no distinct arming state: claiming the shared timer is the
/// transition into `Counting`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum HoldState {
    #[default]
    Idle,
    Counting,
}

/// State machine that watches the two volume buttons.
#[derive(Debug, Default)]
pub struct ButtonHoldDetector {
    state: HoldState,
    /// Set after a pulse fires; a new hold cannot arm until both buttons
    /// have been seen released.
    await_release: bool,
}

impl ButtonHoldDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: HoldState::Idle,
            await_release: false,
        }
    }

    /// Returns the current detector state.
    #[must_use]
    pub fn state(&self) -> HoldState {
        self.state
    }

    /// Runs one poll cycle.
    ///
    /// Claims the shared timer when both buttons read asserted, counts
    /// acknowledged overflow ticks against the checkpoints, and performs or
    /// cancels the pulse action at the confirm threshold.
    pub fn poll<T, S, D, W>(
        &mut self,
        timer: &mut SharedTimer<T>,
        sampler: &S,
        driver: &mut D,
        delay: &mut W,
        events: &mut EventRecorder,
        cycle: u32,
    ) where
        T: OverflowTimer,
        S: LineSampler,
        D: LineDriver,
        W: PulseDelay,
    {
        let both_held =
            sampler.is_asserted(InputLine::VolUp) && sampler.is_asserted(InputLine::VolDown);

        if self.await_release {
            if both_held {
                return;
            }
            self.await_release = false;
        }

        if both_held
            && !timer.is_claimed_by(TimerOwner::Buttons)
            && timer.claim(TimerOwner::Buttons).is_ok()
        {
            self.state = HoldState::Counting;
            events.record(cycle, EventKind::TimerClaimed(TimerOwner::Buttons));
        }

        if !timer.is_claimed_by(TimerOwner::Buttons) {
            return;
        }

        let Some(ticks) = timer.poll_tick(TimerOwner::Buttons) else {
            return;
        };

        if HOLD_CHECKPOINTS.contains(&ticks) && !both_held {
            self.abort(timer, events, cycle, ticks);
            return;
        }

        if ticks >= HOLD_CONFIRM_TICKS {
            if both_held {
                self.fire_pulse(driver, delay, events, cycle);
            } else {
                // Restore the pulse line without pulsing.
                driver.drive(OutputLine::Pulse, LineDrive::Floating);
                events.record(
                    cycle,
                    EventKind::LineDriven(OutputLine::Pulse, LineDrive::Floating),
                );
                events.record(cycle, EventKind::HoldAborted(ticks));
            }

            let _ = timer.release(TimerOwner::Buttons);
            self.state = HoldState::Idle;
            events.record(cycle, EventKind::TimerReleased(TimerOwner::Buttons));
        }
    }

    fn abort<T: OverflowTimer>(
        &mut self,
        timer: &mut SharedTimer<T>,
        events: &mut EventRecorder,
        cycle: u32,
        ticks: u16,
    ) {
        let _ = timer.release(TimerOwner::Buttons);
        self.state = HoldState::Idle;
        events.record(cycle, EventKind::HoldAborted(ticks));
        events.record(cycle, EventKind::TimerReleased(TimerOwner::Buttons));
    }

    fn fire_pulse<D: LineDriver, W: PulseDelay>(
        &mut self,
        driver: &mut D,
        delay: &mut W,
        events: &mut EventRecorder,
        cycle: u32,
    ) {
        driver.drive(OutputLine::Pulse, LineDrive::Low);
        events.record(
            cycle,
            EventKind::LineDriven(OutputLine::Pulse, LineDrive::Low),
        );

        // Nothing else samples or drives lines while the pulse is held.
        delay.block(PULSE_HOLD);

        driver.drive(OutputLine::Pulse, LineDrive::Floating);
        events.record(
            cycle,
            EventKind::LineDriven(OutputLine::Pulse, LineDrive::Floating),
        );
        events.record(cycle, EventKind::HoldConfirmed);

        // A second pulse needs a fresh press: both buttons must be seen
        // released before the detector arms again.
        self.await_release = true;
    }
}
