//! Interactive session wrapping the dispatch loop with scripted hardware.
//!
//! Inputs are set by commands instead of pins, counter overflows are raised
//! by `tick`, and every handled command reports the telemetry it produced.

use std::cell::Cell;
use std::time::Duration;

use sense_core::detect::{Dispatcher, PulseDelay};
use sense_core::lines::{
    ALL_INPUTS, ALL_OUTPUTS, InputLine, LineDrive, LineDriver, LineSampler, OutputLine,
};
use sense_core::telemetry::{EventId, EventRecord};
use sense_core::timer::OverflowTimer;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "press",
        "press <up|down|both>     - assert volume button inputs",
    ),
    (
        "release",
        "release <up|down|both>   - release volume button inputs",
    ),
    (
        "status",
        "status <on|off>          - drive the downstream status line",
    ),
    (
        "tick",
        "tick [n]                 - raise n counter overflows (default 1), polling after each",
    ),
    (
        "poll",
        "poll                     - run one dispatch cycle without an overflow",
    ),
    (
        "state",
        "state                    - display detector, timer, and line state",
    ),
    (
        "events",
        "events                   - dump the retained telemetry ring",
    ),
    ("help", "help [topic]             - show help for a command"),
];

/// Overflow counter whose ticks come from the `tick` command.
#[derive(Default)]
struct HostCounter {
    running: bool,
    pending: bool,
}

impl HostCounter {
    fn raise_overflow(&mut self) {
        if self.running {
            self.pending = true;
        }
    }
}

impl OverflowTimer for HostCounter {
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
        std::mem::take(&mut self.pending)
    }
}

/// Input levels owned by the session commands.
#[derive(Default)]
struct HostSampler {
    vol_up: Cell<bool>,
    vol_down: Cell<bool>,
    status: Cell<bool>,
}

impl HostSampler {
    fn set(&self, line: InputLine, asserted: bool) {
        match line {
            InputLine::VolUp => self.vol_up.set(asserted),
            InputLine::VolDown => self.vol_down.set(asserted),
            InputLine::Status => self.status.set(asserted),
        }
    }
}

impl LineSampler for HostSampler {
    fn is_asserted(&self, line: InputLine) -> bool {
        match line {
            InputLine::VolUp => self.vol_up.get(),
            InputLine::VolDown => self.vol_down.get(),
            InputLine::Status => self.status.get(),
        }
    }
}

/// Virtual output pins; only the latest drive per line is retained.
struct HostDriver {
    drives: [LineDrive; 3],
}

impl Default for HostDriver {
    fn default() -> Self {
        Self {
            drives: [LineDrive::Floating; 3],
        }
    }
}

impl LineDriver for HostDriver {
    fn drive(&mut self, line: OutputLine, drive: LineDrive) {
        self.drives[line.as_index()] = drive;
    }
}

/// Pulse holds complete instantly; the requested duration is kept for
/// display instead of actually sleeping.
#[derive(Default)]
struct HostDelay {
    last_hold: Option<Duration>,
}

impl PulseDelay for HostDelay {
    fn block(&mut self, duration: core::time::Duration) {
        self.last_hold = Some(duration);
    }
}

pub struct Session {
    dispatcher: Dispatcher<HostCounter, HostSampler, HostDriver, HostDelay>,
    last_reported: Option<EventId>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            dispatcher: Dispatcher::new(
                HostCounter::default(),
                HostSampler::default(),
                HostDriver::default(),
                HostDelay::default(),
            ),
            last_reported: None,
        }
    }

    pub fn handle_command(&mut self, line: &str) -> Vec<String> {
        let mut tokens = line.split_whitespace();
        let Some(command) = tokens.next() else {
            return Vec::new();
        };
        let argument = tokens.next();

        if tokens.next().is_some() {
            return vec![format!("ERR trailing input after `{command}`")];
        }

        match command {
            "help" => handle_help(argument),
            "press" => self.handle_buttons(argument, true),
            "release" => self.handle_buttons(argument, false),
            "status" => self.handle_status(argument),
            "tick" => self.handle_tick(argument),
            "poll" if argument.is_none() => {
                self.dispatcher.poll();
                self.report_events()
            }
            "state" if argument.is_none() => self.describe_state(),
            "events" if argument.is_none() => self.list_events(),
            _ => vec![format!("ERR unknown command `{line}` (try `help`)")],
        }
    }

    fn handle_buttons(&mut self, argument: Option<&str>, pressed: bool) -> Vec<String> {
        let lines: &[InputLine] = match argument {
            Some("up" | "u") => &[InputLine::VolUp],
            Some("down" | "d") => &[InputLine::VolDown],
            Some("both") => &[InputLine::VolUp, InputLine::VolDown],
            _ => return vec!["ERR expected `up`, `down`, or `both`".to_string()],
        };

        for &line in lines {
            self.dispatcher.sampler().set(line, pressed);
        }
        self.dispatcher.poll();
        self.report_events()
    }

    fn handle_status(&mut self, argument: Option<&str>) -> Vec<String> {
        let asserted = match argument {
            Some("on") => true,
            Some("off") => false,
            _ => return vec!["ERR expected `on` or `off`".to_string()],
        };

        self.dispatcher.sampler().set(InputLine::Status, asserted);
        self.dispatcher.poll();
        self.report_events()
    }

    fn handle_tick(&mut self, argument: Option<&str>) -> Vec<String> {
        let count: u32 = match argument {
            None => 1,
            Some(raw) => match raw.parse() {
                Ok(count) if count > 0 => count,
                _ => return vec![format!("ERR invalid tick count `{raw}`")],
            },
        };

        for _ in 0..count {
            self.dispatcher.counter_mut().raise_overflow();
            self.dispatcher.poll();
        }
        self.report_events()
    }

    fn describe_state(&self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(format!(
            "cycle {}  connected {}",
            self.dispatcher.cycle(),
            self.dispatcher.connected()
        ));
        lines.push(format!(
            "buttons {:?}  presence {:?}",
            self.dispatcher.button_state(),
            self.dispatcher.presence_state()
        ));
        match self.dispatcher.timer().owner() {
            Some(owner) => lines.push(format!(
                "timer held by {owner}, {} ticks",
                self.dispatcher.timer().ticks()
            )),
            None => lines.push("timer free".to_string()),
        }
        for info in &ALL_INPUTS {
            let asserted = self.dispatcher.sampler().is_asserted(info.line);
            lines.push(format!("in  {:<9} {:<4} asserted={asserted}", info.name, info.mcu_pin));
        }
        for info in &ALL_OUTPUTS {
            let drive = self.dispatcher.driver().drives[info.line.as_index()];
            lines.push(format!("out {:<9} {:<4} {drive}", info.name, info.mcu_pin));
        }
        if let Some(hold) = self.dispatcher.delay().last_hold {
            lines.push(format!("last pulse hold {} ms", hold.as_millis()));
        }
        lines
    }

    /// Formats the full retained ring without advancing the report cursor.
    fn list_events(&self) -> Vec<String> {
        if self.dispatcher.events().is_empty() {
            return vec!["no events recorded".to_string()];
        }
        self.dispatcher
            .events()
            .oldest_first()
            .map(format_record)
            .collect()
    }

    /// Formats every telemetry record newer than the previous report.
    fn report_events(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        for record in self.dispatcher.events().oldest_first() {
            if let Some(last) = self.last_reported
                && record.id <= last
            {
                continue;
            }
            self.last_reported = Some(record.id);
            lines.push(format_record(record));
        }
        if lines.is_empty() {
            lines.push("ok".to_string());
        }
        lines
    }
}

fn format_record(record: &EventRecord) -> String {
    format!(
        "[{:>6}] {} (code {:#06x})",
        record.cycle,
        record.event,
        record.event.to_raw()
    )
}

fn handle_help(topic: Option<&str>) -> Vec<String> {
    match topic {
        None => HELP_TOPICS
            .iter()
            .map(|(_, description)| (*description).to_string())
            .collect(),
        Some(topic) => match HELP_TOPICS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(topic))
        {
            Some((_, description)) => vec![(*description).to_string()],
            None => vec![format!("ERR no help for `{topic}`")],
        },
    }
}
