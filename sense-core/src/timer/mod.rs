//! Shared countdown timer resource.
//!
//! The board carries a single hardware countdown counter that both detectors
//! depend on for their tick cadence. [`SharedTimer`] wraps the raw counter
//! with an explicit claim/release protocol so the single-claimant invariant
//! lives in the type instead of in convention: at most one detector owns the
//! counter at any instant, and claim transitions reset the count and clear the
//! overflow flag together with the ownership change.

use core::fmt;

/// Detector that may claim the shared timer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimerOwner {
    Buttons,
    Presence,
}

impl TimerOwner {
    /// Static label used by logging on both firmware and host targets.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            TimerOwner::Buttons => "buttons",
            TimerOwner::Presence => "presence",
        }
    }
}

impl fmt::Display for TimerOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw countdown counter with an overflow flag and a clock-source switch.
///
/// Implementations must report each hardware overflow at most once:
/// [`take_overflow`](OverflowTimer::take_overflow) reads and acknowledges the
/// flag in one step, so an overflow that piled up while unserviced is never
/// observed twice.
pub trait OverflowTimer {
    /// Switches the counter's clock source on or off.
    fn set_running(&mut self, running: bool);

    /// Returns `true` while the clock source is switched on.
    fn is_running(&self) -> bool;

    /// Resets the hardware count and clears any pending overflow.
    fn reset(&mut self);

    /// Consumes a pending overflow event, clearing the flag.
    fn take_overflow(&mut self) -> bool;
}

/// Failure reported when a claim is refused.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ClaimError {
    /// The timer is already held by the other detector.
    Held(TimerOwner),
}

/// Failure reported when a release is refused.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReleaseError {
    /// Nothing currently holds the timer.
    NotClaimed,
    /// The timer is held by the other detector.
    HeldByOther(TimerOwner),
}

/// Countdown resource time-shared between the two detectors.
pub struct SharedTimer<T> {
    counter: T,
    owner: Option<TimerOwner>,
    ticks: u16,
}

impl<T: OverflowTimer> SharedTimer<T> {
    /// Wraps the raw counter in an unclaimed, stopped state.
    pub fn new(mut counter: T) -> Self {
        counter.set_running(false);
        counter.reset();
        Self {
            counter,
            owner: None,
            ticks: 0,
        }
    }

    /// Returns the current claimant, if any.
    #[must_use]
    pub fn owner(&self) -> Option<TimerOwner> {
        self.owner
    }

    /// Returns `true` when `owner` holds the claim.
    #[must_use]
    pub fn is_claimed_by(&self, owner: TimerOwner) -> bool {
        self.owner == Some(owner)
    }

    /// Number of overflow ticks consumed since the claim began.
    #[must_use]
    pub fn ticks(&self) -> u16 {
        self.ticks
    }

    /// Claims the counter, zeroing the count and starting the clock source.
    ///
    /// A claim while the other detector holds the timer fails without
    /// touching the count.
    pub fn claim(&mut self, owner: TimerOwner) -> Result<(), ClaimError> {
        if let Some(current) = self.owner
            && current != owner
        {
            return Err(ClaimError::Held(current));
        }

        self.owner = Some(owner);
        self.ticks = 0;
        self.counter.reset();
        self.counter.set_running(true);
        Ok(())
    }

    /// Releases the counter and stops the clock source.
    ///
    /// Only the current owner may release; a refused release leaves all state
    /// untouched.
    pub fn release(&mut self, owner: TimerOwner) -> Result<(), ReleaseError> {
        match self.owner {
            None => Err(ReleaseError::NotClaimed),
            Some(current) if current != owner => Err(ReleaseError::HeldByOther(current)),
            Some(_) => {
                self.owner = None;
                self.ticks = 0;
                self.counter.set_running(false);
                self.counter.reset();
                Ok(())
            }
        }
    }

    /// Consumes one pending overflow on behalf of the owning detector.
    ///
    /// Returns the incremented tick count when an overflow was pending. The
    /// flag is cleared within the same call, so a tick is observed exactly
    /// once and only by the claimant.
    pub fn poll_tick(&mut self, owner: TimerOwner) -> Option<u16> {
        if self.owner != Some(owner) {
            return None;
        }

        if self.counter.take_overflow() {
            self.ticks = self.ticks.saturating_add(1);
            Some(self.ticks)
        } else {
            None
        }
    }

    /// Forces the clock source back on if an interruption left it stopped
    /// while a claim is active.
    ///
    /// Returns `true` when a re-arm was necessary.
    pub fn ensure_running(&mut self, owner: TimerOwner) -> bool {
        if self.owner == Some(owner) && !self.counter.is_running() {
            self.counter.set_running(true);
            true
        } else {
            false
        }
    }

    /// Provides access to the raw counter.
    pub fn counter(&self) -> &T {
        &self.counter
    }

    /// Provides mutable access to the raw counter.
    pub fn counter_mut(&mut self) -> &mut T {
        &mut self.counter
    }
}
