//! Scripted hardware mocks shared by the integration suites.

use core::cell::Cell;
use core::time::Duration;

use sense_core::detect::{Dispatcher, PulseDelay};
use sense_core::lines::{InputLine, LineDrive, LineDriver, LineSampler, OutputLine};
use sense_core::timer::OverflowTimer;

/// Counter whose overflows are raised by the test script.
#[derive(Default)]
pub struct ScriptedCounter {
    running: bool,
    pending: bool,
}

impl ScriptedCounter {
    /// Models a hardware overflow; ignored while the clock source is off.
    pub fn raise_overflow(&mut self) {
        if self.running {
            self.pending = true;
        }
    }
}

impl OverflowTimer for ScriptedCounter {
    fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn reset(&mut self) {
        self.pending = false;
    }

    fn take_overflow(&mut self) -> bool {
        core::mem::take(&mut self.pending)
    }
}

/// Input sampler whose levels the test script sets between polls.
#[derive(Default)]
pub struct ScriptedSampler {
    vol_up: Cell<bool>,
    vol_down: Cell<bool>,
    status: Cell<bool>,
}

impl ScriptedSampler {
    pub fn press_both(&self) {
        self.vol_up.set(true);
        self.vol_down.set(true);
    }

    pub fn release_both(&self) {
        self.vol_up.set(false);
        self.vol_down.set(false);
    }

    pub fn set_vol_up(&self, pressed: bool) {
        self.vol_up.set(pressed);
    }

    pub fn set_vol_down(&self, pressed: bool) {
        self.vol_down.set(pressed);
    }

    pub fn set_status(&self, asserted: bool) {
        self.status.set(asserted);
    }
}

impl LineSampler for ScriptedSampler {
    fn is_asserted(&self, line: InputLine) -> bool {
        match line {
            InputLine::VolUp => self.vol_up.get(),
            InputLine::VolDown => self.vol_down.get(),
            InputLine::Status => self.status.get(),
        }
    }
}

/// Driver that records every drive transition for later assertions.
pub struct RecordingDriver {
    pub log: Vec<(OutputLine, LineDrive)>,
    pub current: [LineDrive; 3],
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self {
            log: Vec::new(),
            current: [LineDrive::Floating; 3],
        }
    }

    /// Drive transitions applied to one line, oldest first.
    pub fn drives_of(&self, line: OutputLine) -> Vec<LineDrive> {
        self.log
            .iter()
            .filter(|(l, _)| *l == line)
            .map(|(_, d)| *d)
            .collect()
    }

    /// Most recently applied drive for the line.
    pub fn current_drive(&self, line: OutputLine) -> LineDrive {
        self.current[line.as_index()]
    }
}

impl LineDriver for RecordingDriver {
    fn drive(&mut self, line: OutputLine, drive: LineDrive) {
        self.log.push((line, drive));
        self.current[line.as_index()] = drive;
    }
}

/// Delay that records requested pulse durations instead of sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    pub blocks: Vec<Duration>,
}

impl PulseDelay for RecordingDelay {
    fn block(&mut self, duration: Duration) {
        self.blocks.push(duration);
    }
}

pub type TestDispatcher =
    Dispatcher<ScriptedCounter, ScriptedSampler, RecordingDriver, RecordingDelay>;

/// Dispatcher wired to scripted mocks with everything idle.
pub fn dispatcher() -> TestDispatcher {
    Dispatcher::new(
        ScriptedCounter::default(),
        ScriptedSampler::default(),
        RecordingDriver::new(),
        RecordingDelay::default(),
    )
}

/// Raises `n` overflows, polling once after each so every tick is consumed
/// the same cycle it occurs, matching the dispatch loop's cadence.
pub fn run_ticks(dispatcher: &mut TestDispatcher, n: u32) {
    for _ in 0..n {
        dispatcher.counter_mut().raise_overflow();
        dispatcher.poll();
    }
}
