//! Presence detector scenarios driven through the dispatcher.

mod common;

use sense_core::detect::{PRESENCE_CHECKPOINTS, PresenceState};
use sense_core::lines::{LineDrive, OutputLine};
use sense_core::telemetry::EventKind;
use sense_core::timer::{OverflowTimer, TimerOwner};

#[test]
fn stable_status_confirms_a_connection() {
    let mut d = common::dispatcher();
    d.sampler().set_status(true);

    d.poll();
    assert_eq!(d.presence_state(), PresenceState::Sampling);
    assert_eq!(d.timer().owner(), Some(TimerOwner::Presence));

    common::run_ticks(&mut d, 612);

    assert!(d.connected());
    assert_eq!(d.presence_state(), PresenceState::Idle);
    assert_eq!(d.timer().owner(), None);
    assert_eq!(d.driver().current_drive(OutputLine::Indicator), LineDrive::High);
    assert_eq!(d.driver().current_drive(OutputLine::Sense), LineDrive::Low);
    assert!(
        d.events()
            .oldest_first()
            .any(|r| r.event == EventKind::PresenceConnected)
    );

    // A confirmed connection does not restart sampling while it lasts.
    common::run_ticks(&mut d, 100);
    assert_eq!(d.timer().owner(), None);
    assert!(d.connected());
}

#[test]
fn deassertion_aborts_at_every_checkpoint() {
    for &checkpoint in &PRESENCE_CHECKPOINTS {
        let mut d = common::dispatcher();
        d.sampler().set_status(true);
        d.poll();
        common::run_ticks(&mut d, u32::from(checkpoint) - 1);

        d.sampler().set_status(false);
        common::run_ticks(&mut d, 1);

        assert!(!d.connected(), "confirmed despite drop at {checkpoint}");
        assert_eq!(d.presence_state(), PresenceState::Idle);
        assert_eq!(d.timer().owner(), None);
        assert!(
            d.events()
                .oldest_first()
                .any(|r| r.event == EventKind::PresenceAborted(checkpoint))
        );
    }
}

#[test]
fn drop_between_checkpoints_is_caught_at_the_next() {
    let mut d = common::dispatcher();
    d.sampler().set_status(true);
    d.poll();
    common::run_ticks(&mut d, 400);

    d.sampler().set_status(false);
    // 401..=597 are not checkpoints; sampling runs on.
    common::run_ticks(&mut d, 197);
    assert_eq!(d.presence_state(), PresenceState::Sampling);

    common::run_ticks(&mut d, 1);
    assert_eq!(d.presence_state(), PresenceState::Idle);
    assert!(!d.connected());
    assert!(
        d.events()
            .oldest_first()
            .any(|r| r.event == EventKind::PresenceAborted(598))
    );
}

#[test]
fn deassertion_at_terminal_check_rejects() {
    let mut d = common::dispatcher();
    d.sampler().set_status(true);
    d.poll();
    common::run_ticks(&mut d, 611);

    d.sampler().set_status(false);
    common::run_ticks(&mut d, 1);

    assert!(!d.connected());
    assert_eq!(d.timer().owner(), None);
    assert_eq!(d.driver().current_drive(OutputLine::Indicator), LineDrive::Low);
    assert_eq!(d.driver().current_drive(OutputLine::Sense), LineDrive::Floating);
    assert!(
        d.events()
            .oldest_first()
            .any(|r| r.event == EventKind::PresenceRejected)
    );
}

#[test]
fn disconnect_takes_effect_in_one_cycle() {
    let mut d = common::dispatcher();
    d.sampler().set_status(true);
    d.poll();
    common::run_ticks(&mut d, 612);
    assert!(d.connected());

    d.sampler().set_status(false);
    d.poll();

    assert!(!d.connected());
    assert_eq!(d.driver().current_drive(OutputLine::Indicator), LineDrive::Low);
    assert_eq!(d.driver().current_drive(OutputLine::Sense), LineDrive::Floating);
    assert!(
        d.events()
            .oldest_first()
            .any(|r| r.event == EventKind::PresenceLost)
    );
}

#[test]
fn reconnect_requires_a_full_confirmation() {
    let mut d = common::dispatcher();
    d.sampler().set_status(true);
    d.poll();
    common::run_ticks(&mut d, 612);
    d.sampler().set_status(false);
    d.poll();
    assert!(!d.connected());

    d.sampler().set_status(true);
    d.poll();
    assert_eq!(d.presence_state(), PresenceState::Sampling);
    common::run_ticks(&mut d, 611);
    assert!(!d.connected());
    common::run_ticks(&mut d, 1);
    assert!(d.connected());
}

#[test]
fn stopped_clock_source_is_rearmed() {
    let mut d = common::dispatcher();
    d.sampler().set_status(true);
    d.poll();
    common::run_ticks(&mut d, 10);

    // Models the leftover state a completed button sequence leaves behind.
    d.counter_mut().set_running(false);
    d.poll();

    assert!(d.counter_mut().is_running());
    assert!(
        d.events()
            .oldest_first()
            .any(|r| r.event == EventKind::TimerRearmed(TimerOwner::Presence))
    );

    common::run_ticks(&mut d, 602);
    assert!(d.connected());
}

#[test]
fn periodic_blink_never_confirms() {
    let mut d = common::dispatcher();
    for i in 0..2000u32 {
        // 100 ticks asserted, 100 ticks deasserted.
        d.sampler().set_status((i / 100) % 2 == 0);
        d.counter_mut().raise_overflow();
        d.poll();
        assert!(!d.connected());
    }
    assert_eq!(
        d.driver().current_drive(OutputLine::Indicator),
        LineDrive::Low
    );
}
