//! Detector state machines and the cooperative dispatcher.
//!
//! Scheduling is single-threaded cooperative polling: the dispatcher invokes
//! the button-hold detector every cycle, then the presence detector only when
//! the buttons do not hold the shared timer. That ordering is the mutual
//! exclusion mechanism: button detection has strict priority, and presence
//! sampling is starved for the duration of a button hold sequence. Button
//! holds are rare and short, and the presence detector's re-arm check
//! recovers any clock-source state the interruption left behind.

pub mod buttons;
pub mod presence;

pub use buttons::{ButtonHoldDetector, HOLD_CHECKPOINTS, HOLD_CONFIRM_TICKS, HoldState, PULSE_HOLD};
pub use presence::{
    PRESENCE_CHECKPOINTS, PRESENCE_CONFIRM_TICKS, PresenceDetector, PresenceState,
};

use core::time::Duration;

use crate::lines::{LineDriver, LineSampler};
use crate::telemetry::EventRecorder;
use crate::timer::{OverflowTimer, SharedTimer, TimerOwner};

/// Blocks the single thread of control for the duration of the pulse action.
///
/// Firmware implements this with a busy-wait on the monotonic clock; tests
/// and the emulator record the request instead of sleeping.
pub trait PulseDelay {
    fn block(&mut self, duration: Duration);
}

/// Top-level poll loop state: the shared timer, both detectors, and the
/// hardware seams they operate through.
pub struct Dispatcher<T, S, D, W> {
    timer: SharedTimer<T>,
    buttons: ButtonHoldDetector,
    presence: PresenceDetector,
    sampler: S,
    driver: D,
    delay: W,
    events: EventRecorder,
    cycle: u32,
}

impl<T, S, D, W> Dispatcher<T, S, D, W>
where
    T: OverflowTimer,
    S: LineSampler,
    D: LineDriver,
    W: PulseDelay,
{
    /// Builds the dispatcher and puts every output at its idle drive.
    pub fn new(counter: T, sampler: S, mut driver: D, delay: W) -> Self {
        driver.release_all();
        Self {
            timer: SharedTimer::new(counter),
            buttons: ButtonHoldDetector::new(),
            presence: PresenceDetector::new(),
            sampler,
            driver,
            delay,
            events: EventRecorder::new(),
            cycle: 0,
        }
    }

    /// Runs one dispatch cycle.
    pub fn poll(&mut self) {
        self.cycle = self.cycle.wrapping_add(1);

        self.buttons.poll(
            &mut self.timer,
            &self.sampler,
            &mut self.driver,
            &mut self.delay,
            &mut self.events,
            self.cycle,
        );

        if !self.timer.is_claimed_by(TimerOwner::Buttons) {
            self.presence.poll(
                &mut self.timer,
                &self.sampler,
                &mut self.driver,
                &mut self.events,
                self.cycle,
            );
        }
    }

    /// Number of dispatch cycles run so far.
    #[must_use]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Last-confirmed presence state.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.presence.connected()
    }

    /// Current button-hold detector state.
    #[must_use]
    pub fn button_state(&self) -> HoldState {
        self.buttons.state()
    }

    /// Current presence detector state.
    #[must_use]
    pub fn presence_state(&self) -> PresenceState {
        self.presence.state()
    }

    /// Read-only view of the shared timer.
    pub fn timer(&self) -> &SharedTimer<T> {
        &self.timer
    }

    /// Mutable access to the raw counter, for hosts that script overflows.
    pub fn counter_mut(&mut self) -> &mut T {
        self.timer.counter_mut()
    }

    /// Read-only view of the input sampler.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Read-only view of the line driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Read-only view of the pulse delay.
    pub fn delay(&self) -> &W {
        &self.delay
    }

    /// Telemetry recorded by the detectors.
    pub fn events(&self) -> &EventRecorder {
        &self.events
    }
}
