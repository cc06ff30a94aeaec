#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! Lightweight atomics mirror the dispatcher's state so the periodic status
//! log can build a [`StatusSnapshot`] without reaching into the dispatch
//! loop's shared mutable state.

use core::time::Duration;

use embassy_time::Instant;
use portable_atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, Ordering};
use sense_core::timer::TimerOwner;

const OWNER_NONE: u8 = 0;
const OWNER_BUTTONS: u8 = 1;
const OWNER_PRESENCE: u8 = 2;

/// Last-confirmed presence state.
static CONNECTED: AtomicBool = AtomicBool::new(false);
/// Encoded current timer claimant.
static TIMER_OWNER: AtomicU8 = AtomicU8::new(OWNER_NONE);
/// Tick count of the active claim (0 while unclaimed).
static TICK_COUNT: AtomicU16 = AtomicU16::new(0);
/// Dispatch cycle counter.
static POLL_CYCLE: AtomicU32 = AtomicU32::new(0);
/// Timestamp (µs, +1) of the last completed pulse.
static LAST_PULSE_MICROS: AtomicU32 = AtomicU32::new(0);

/// Point-in-time view of the dispatch loop.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusSnapshot {
    pub connected: bool,
    pub owner: Option<TimerOwner>,
    pub ticks: u16,
    pub cycle: u32,
    pub since_last_pulse: Option<Duration>,
}

fn owner_code(owner: Option<TimerOwner>) -> u8 {
    match owner {
        None => OWNER_NONE,
        Some(TimerOwner::Buttons) => OWNER_BUTTONS,
        Some(TimerOwner::Presence) => OWNER_PRESENCE,
    }
}

fn owner_from_code(code: u8) -> Option<TimerOwner> {
    match code {
        OWNER_BUTTONS => Some(TimerOwner::Buttons),
        OWNER_PRESENCE => Some(TimerOwner::Presence),
        _ => None,
    }
}

fn encode_micros(micros: u32) -> u32 {
    micros.wrapping_add(1)
}

fn decode_micros(raw: u32) -> Option<u32> {
    if raw == 0 { None } else { Some(raw.wrapping_sub(1)) }
}

fn micros_from_instant(instant: Instant) -> u32 {
    let micros = instant.as_micros();
    if micros >= u64::from(u32::MAX) {
        u32::MAX - 1
    } else {
        micros as u32
    }
}

fn duration_since(now: Instant, raw: u32) -> Option<Duration> {
    let stored = decode_micros(raw)?;
    let delta = micros_from_instant(now).wrapping_sub(stored);
    Some(Duration::from_micros(u64::from(delta)))
}

/// Publishes the dispatcher state observed after a poll cycle.
pub fn record_poll(connected: bool, owner: Option<TimerOwner>, ticks: u16, cycle: u32) {
    CONNECTED.store(connected, Ordering::Relaxed);
    TIMER_OWNER.store(owner_code(owner), Ordering::Relaxed);
    TICK_COUNT.store(ticks, Ordering::Relaxed);
    POLL_CYCLE.store(cycle, Ordering::Relaxed);
}

/// Records the completion timestamp of a pulse.
pub fn record_pulse(timestamp: Instant) {
    let micros = micros_from_instant(timestamp);
    LAST_PULSE_MICROS.store(encode_micros(micros), Ordering::Relaxed);
}

/// Builds a [`StatusSnapshot`] from the stored state.
pub fn snapshot(now: Instant) -> StatusSnapshot {
    StatusSnapshot {
        connected: CONNECTED.load(Ordering::Relaxed),
        owner: owner_from_code(TIMER_OWNER.load(Ordering::Relaxed)),
        ticks: TICK_COUNT.load(Ordering::Relaxed),
        cycle: POLL_CYCLE.load(Ordering::Relaxed),
        since_last_pulse: duration_since(now, LAST_PULSE_MICROS.load(Ordering::Relaxed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_codes_round_trip() {
        for owner in [None, Some(TimerOwner::Buttons), Some(TimerOwner::Presence)] {
            assert_eq!(owner_from_code(owner_code(owner)), owner);
        }
    }

    #[test]
    fn zero_raw_micros_means_never() {
        assert_eq!(decode_micros(0), None);
        assert_eq!(duration_since(Instant::from_micros(500), 0), None);
    }

    #[test]
    fn duration_since_decodes_stored_timestamp() {
        let raw = encode_micros(1_000);
        let elapsed = duration_since(Instant::from_micros(4_000), raw).unwrap();
        assert_eq!(elapsed.as_micros(), 3_000);
    }
}
