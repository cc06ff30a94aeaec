//! Line catalog and tri-state drive model for the dock interface.
//!
//! Inputs are sampled as logical assertions (polarity applied at the
//! sampler); outputs carry an explicit tri-state drive because two of them
//! switch direction at runtime. The catalog mirrors how the lines are routed
//! on the board and feeds logging on both targets.

use core::fmt;

/// Input lines sampled every poll cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputLine {
    /// Volume-up button, active low.
    VolUp,
    /// Volume-down button, active low.
    VolDown,
    /// Downstream status line, active high.
    Status,
}

impl InputLine {
    /// Deterministic index for lookups into [`ALL_INPUTS`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            InputLine::VolUp => 0,
            InputLine::VolDown => 1,
            InputLine::Status => 2,
        }
    }
}

/// Output lines driven by the detectors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputLine {
    /// Momentary-pulse line; floats when idle, driven low during the pulse.
    Pulse,
    /// Presence indicator, plain push-pull output.
    Indicator,
    /// Sense/enable line; floats until presence is confirmed, then driven low.
    Sense,
}

impl OutputLine {
    /// Deterministic index for lookups into [`ALL_OUTPUTS`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            OutputLine::Pulse => 0,
            OutputLine::Indicator => 1,
            OutputLine::Sense => 2,
        }
    }
}

/// Electrical polarity of an input line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Polarity {
    ActiveLow,
    ActiveHigh,
}

/// Tri-state drive applied to an output line.
///
/// Direction-switched pins move between `Floating` (input / high impedance)
/// and a driven level; the model is deliberately not a plain boolean.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineDrive {
    Floating,
    Low,
    High,
}

impl LineDrive {
    /// Static label used by logging on both firmware and host targets.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            LineDrive::Floating => "floating",
            LineDrive::Low => "low",
            LineDrive::High => "high",
        }
    }
}

impl fmt::Display for LineDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metadata describing how an input line is routed on the board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct InputInfo {
    pub line: InputLine,
    pub name: &'static str,
    pub mcu_pin: &'static str,
    pub polarity: Polarity,
}

/// Metadata describing how an output line is routed on the board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OutputInfo {
    pub line: OutputLine,
    pub name: &'static str,
    pub mcu_pin: &'static str,
    /// Drive applied at startup and whenever the line is released.
    pub idle: LineDrive,
}

/// Compile-time catalog of every sampled line.
pub const ALL_INPUTS: [InputInfo; 3] = [
    InputInfo {
        line: InputLine::VolUp,
        name: "VOL-UP*",
        mcu_pin: "PA0",
        polarity: Polarity::ActiveLow,
    },
    InputInfo {
        line: InputLine::VolDown,
        name: "VOL-DOWN*",
        mcu_pin: "PA1",
        polarity: Polarity::ActiveLow,
    },
    InputInfo {
        line: InputLine::Status,
        name: "STATUS",
        mcu_pin: "PB0",
        polarity: Polarity::ActiveHigh,
    },
];

/// Compile-time catalog of every driven line.
pub const ALL_OUTPUTS: [OutputInfo; 3] = [
    OutputInfo {
        line: OutputLine::Pulse,
        name: "PULSE",
        mcu_pin: "PA4",
        idle: LineDrive::Floating,
    },
    OutputInfo {
        line: OutputLine::Indicator,
        name: "IND",
        mcu_pin: "PA5",
        idle: LineDrive::Low,
    },
    OutputInfo {
        line: OutputLine::Sense,
        name: "SENSE",
        mcu_pin: "PB1",
        idle: LineDrive::Floating,
    },
];

/// Retrieves input metadata by identifier.
#[must_use]
pub const fn input_info(line: InputLine) -> InputInfo {
    ALL_INPUTS[line.as_index()]
}

/// Retrieves output metadata by identifier.
#[must_use]
pub const fn output_info(line: OutputLine) -> OutputInfo {
    ALL_OUTPUTS[line.as_index()]
}

/// Samples the input lines.
///
/// Implementations apply polarity, so `true` always means "asserted"
/// regardless of how the line is wired.
pub trait LineSampler {
    fn is_asserted(&self, line: InputLine) -> bool;
}

/// Applies tri-state drives to the output lines.
pub trait LineDriver {
    /// Applies the requested drive to the line.
    fn drive(&mut self, line: OutputLine, drive: LineDrive);

    /// Returns every output to its idle drive.
    fn release_all(&mut self) {
        for info in &ALL_OUTPUTS {
            self.drive(info.line, info.idle);
        }
    }
}

/// Driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopLineDriver;

impl NoopLineDriver {
    /// Creates a new no-op line driver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LineDriver for NoopLineDriver {
    fn drive(&mut self, _: OutputLine, _: LineDrive) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_lookup_returns_expected_metadata() {
        let status = input_info(InputLine::Status);
        assert_eq!(status.name, "STATUS");
        assert_eq!(status.mcu_pin, "PB0");
        assert_eq!(status.polarity, Polarity::ActiveHigh);

        let vol_up = input_info(InputLine::VolUp);
        assert_eq!(vol_up.polarity, Polarity::ActiveLow);
        assert_eq!(vol_up.mcu_pin, "PA0");
    }

    #[test]
    fn output_lookup_returns_expected_idle_drives() {
        assert_eq!(output_info(OutputLine::Pulse).idle, LineDrive::Floating);
        assert_eq!(output_info(OutputLine::Indicator).idle, LineDrive::Low);
        assert_eq!(output_info(OutputLine::Sense).idle, LineDrive::Floating);
    }

    #[test]
    fn release_all_applies_catalog_idle_drives() {
        struct Recording([Option<LineDrive>; 3]);

        impl LineDriver for Recording {
            fn drive(&mut self, line: OutputLine, drive: LineDrive) {
                self.0[line.as_index()] = Some(drive);
            }
        }

        let mut driver = Recording([None; 3]);
        driver.release_all();
        assert_eq!(driver.0[0], Some(LineDrive::Floating));
        assert_eq!(driver.0[1], Some(LineDrive::Low));
        assert_eq!(driver.0[2], Some(LineDrive::Floating));
    }
}
