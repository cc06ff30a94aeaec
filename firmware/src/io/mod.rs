//! Hardware bindings for the sense-core trait seams.
//!
//! The tick cadence, level sampling, and line driving all live here;
//! everything above this module is target-independent.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use embassy_time::{Duration, Instant};

#[cfg(target_os = "none")]
use embassy_stm32::gpio::{Flex, Input, Level, Output, Pull, Speed};

#[cfg(target_os = "none")]
use sense_core::detect::PulseDelay;
#[cfg(target_os = "none")]
use sense_core::lines::{
    InputLine, LineDrive, LineDriver, LineSampler, OutputLine, Polarity, input_info,
};
#[cfg(target_os = "none")]
use sense_core::timer::OverflowTimer;

/// Emulated counter overflow period.
///
/// Matches the original sense board's 8-bit counter: a 1 MHz instruction
/// clock through a 1:16 prescaler wraps every 4096 cycles.
pub const TICK_PERIOD: Duration = Duration::from_micros(4_096);

/// Advances `epoch` past every whole tick period elapsed by `now`.
///
/// Returns `None` when less than one period has elapsed. Multiple periods
/// that piled up unserviced collapse into a single observable overflow, the
/// way a one-bit hardware flag would.
fn advance_epoch(epoch: Instant, now: Instant) -> Option<Instant> {
    let elapsed = now.saturating_duration_since(epoch);
    let periods = elapsed.as_micros() / TICK_PERIOD.as_micros();
    if periods == 0 {
        None
    } else {
        Some(epoch + Duration::from_micros(periods * TICK_PERIOD.as_micros()))
    }
}

/// Converts a detector-facing duration into the embassy time domain.
fn core_duration_to_embassy(duration: core::time::Duration) -> Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    Duration::from_micros(micros)
}

/// Overflow counter backed by the system timebase.
///
/// The original part exposes a real prescaled counter with an overflow flag;
/// here the flag is derived from elapsed wall time against a period epoch.
/// Stopping the clock source freezes the epoch so no ticks accrue.
#[cfg(target_os = "none")]
pub struct SysTickTimer {
    running: bool,
    epoch: Instant,
}

#[cfg(target_os = "none")]
impl SysTickTimer {
    pub fn new() -> Self {
        Self {
            running: false,
            epoch: Instant::now(),
        }
    }
}

#[cfg(target_os = "none")]
impl OverflowTimer for SysTickTimer {
    fn set_running(&mut self, running: bool) {
        if running && !self.running {
            self.epoch = Instant::now();
        }
        self.running = running;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn reset(&mut self) {
        self.epoch = Instant::now();
    }

    fn take_overflow(&mut self) -> bool {
        if !self.running {
            return false;
        }
        match advance_epoch(self.epoch, Instant::now()) {
            Some(epoch) => {
                self.epoch = epoch;
                true
            }
            None => false,
        }
    }
}

/// Input pins sampled by the detectors.
#[cfg(target_os = "none")]
pub struct InputLines<'d> {
    vol_up: Input<'d>,
    vol_down: Input<'d>,
    status: Input<'d>,
}

#[cfg(target_os = "none")]
impl<'d> InputLines<'d> {
    pub fn new(vol_up: Input<'d>, vol_down: Input<'d>, status: Input<'d>) -> Self {
        Self {
            vol_up,
            vol_down,
            status,
        }
    }

    fn pin(&self, line: InputLine) -> &Input<'d> {
        match line {
            InputLine::VolUp => &self.vol_up,
            InputLine::VolDown => &self.vol_down,
            InputLine::Status => &self.status,
        }
    }
}

#[cfg(target_os = "none")]
impl LineSampler for InputLines<'_> {
    fn is_asserted(&self, line: InputLine) -> bool {
        let high = self.pin(line).is_high();
        match input_info(line).polarity {
            Polarity::ActiveHigh => high,
            Polarity::ActiveLow => !high,
        }
    }
}

/// Output pins driven by the detectors.
///
/// The pulse and sense lines switch pin direction at runtime, so they are
/// held as [`Flex`]. The indicator is a plain push-pull output; a floating
/// drive request maps to its idle low level.
#[cfg(target_os = "none")]
pub struct OutputLines<'d> {
    pulse: Flex<'d>,
    indicator: Output<'d>,
    sense: Flex<'d>,
}

#[cfg(target_os = "none")]
impl<'d> OutputLines<'d> {
    pub fn new(mut pulse: Flex<'d>, indicator: Output<'d>, mut sense: Flex<'d>) -> Self {
        pulse.set_as_input(Pull::None);
        sense.set_as_input(Pull::None);
        Self {
            pulse,
            indicator,
            sense,
        }
    }
}

#[cfg(target_os = "none")]
fn drive_flex(pin: &mut Flex<'_>, drive: LineDrive) {
    match drive {
        LineDrive::Floating => pin.set_as_input(Pull::None),
        LineDrive::Low => {
            // Level is latched before the direction flips to output.
            pin.set_low();
            pin.set_as_output(Speed::Low);
        }
        LineDrive::High => {
            pin.set_high();
            pin.set_as_output(Speed::Low);
        }
    }
}

#[cfg(target_os = "none")]
impl LineDriver for OutputLines<'_> {
    fn drive(&mut self, line: OutputLine, drive: LineDrive) {
        match line {
            OutputLine::Pulse => drive_flex(&mut self.pulse, drive),
            OutputLine::Indicator => match drive {
                LineDrive::High => self.indicator.set_level(Level::High),
                LineDrive::Low | LineDrive::Floating => self.indicator.set_level(Level::Low),
            },
            OutputLine::Sense => drive_flex(&mut self.sense, drive),
        }
    }
}

/// Busy-wait delay used for the pulse hold.
///
/// The dispatch loop is single-threaded on purpose: nothing samples or
/// drives lines while the pulse is held.
#[cfg(target_os = "none")]
pub struct BlockingDelay;

#[cfg(target_os = "none")]
impl PulseDelay for BlockingDelay {
    fn block(&mut self, duration: core::time::Duration) {
        embassy_time::block_for(core_duration_to_embassy(duration));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn micros(value: u64) -> Instant {
        Instant::from_micros(value)
    }

    #[test]
    fn no_overflow_before_one_period() {
        assert_eq!(advance_epoch(micros(0), micros(4_095)), None);
    }

    #[test]
    fn epoch_advances_by_exactly_one_period() {
        let epoch = advance_epoch(micros(0), micros(4_096)).unwrap();
        assert_eq!(epoch, micros(4_096));
    }

    #[test]
    fn piled_up_periods_collapse_into_one_overflow() {
        // A full second of backlog, as left behind by the pulse hold.
        let epoch = advance_epoch(micros(0), micros(1_000_000)).unwrap();
        assert_eq!(epoch, micros(244 * 4_096));
        assert_eq!(advance_epoch(epoch, micros(1_000_000)), None);
    }

    #[test]
    fn epoch_later_than_now_is_not_an_overflow() {
        assert_eq!(advance_epoch(micros(10_000), micros(5_000)), None);
    }

    #[test]
    fn pulse_hold_duration_converts_losslessly() {
        let converted = core_duration_to_embassy(core::time::Duration::from_millis(1_000));
        assert_eq!(converted.as_micros(), 1_000_000);
    }
}
