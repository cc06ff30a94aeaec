use embassy_time::{Duration, Instant, Timer};
use sense_core::detect::Dispatcher;
use sense_core::timer::TimerOwner;

use crate::io::{BlockingDelay, InputLines, OutputLines, SysTickTimer};
use crate::status;
use crate::telemetry::EventLogger;

/// Poll cadence of the dispatch loop.
///
/// Well under the 4 ms tick period, so every overflow is consumed the cycle
/// it occurs and the instant-disconnect path reacts within a millisecond.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Cycles between periodic status log lines, roughly five seconds.
const STATUS_LOG_CYCLES: u32 = 5_000;

#[embassy_executor::task]
pub async fn run(
    mut dispatcher: Dispatcher<SysTickTimer, InputLines<'static>, OutputLines<'static>, BlockingDelay>,
) -> ! {
    let mut logger = EventLogger::new();

    loop {
        dispatcher.poll();

        let drained = logger.drain(dispatcher.events());
        if drained.hold_confirmed {
            status::record_pulse(Instant::now());
        }

        status::record_poll(
            dispatcher.connected(),
            dispatcher.timer().owner(),
            dispatcher.timer().ticks(),
            dispatcher.cycle(),
        );

        if dispatcher.cycle() % STATUS_LOG_CYCLES == 0 {
            log_status();
        }

        Timer::after(POLL_INTERVAL).await;
    }
}

fn log_status() {
    let snapshot = status::snapshot(Instant::now());
    defmt::info!(
        "status connected={=bool} owner={=str} ticks={=u16} cycle={=u32}",
        snapshot.connected,
        owner_label(snapshot.owner),
        snapshot.ticks,
        snapshot.cycle
    );
}

fn owner_label(owner: Option<TimerOwner>) -> &'static str {
    match owner {
        Some(owner) => owner.label(),
        None => "free",
    }
}
