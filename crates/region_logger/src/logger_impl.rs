use std::{fmt::Arguments, fs::OpenOptions, io::Write};

use crate::{
    escape_sequence, log_errors::LogError, log_level::LogLevel, TerminalEscapeSequence, RESET,
};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogTarget {
    Stdout,
    Stderr,
    File(String),
}

impl LogTarget {
    /// Terminal targets split by severity: errors and worse go to stderr,
    /// everything else to stdout. Files receive every record.
    pub fn accepts(&self, level: LogLevel) -> bool {
        match self {
            LogTarget::Stdout => level < LogLevel::Error,
            LogTarget::Stderr => level >= LogLevel::Error,
            LogTarget::File(_) => true,
        }
    }
}

const TIME_FORMAT: &str = "%H:%M:%S%.3f";

#[derive(Debug)]
pub struct Logger {
    pub min_level: LogLevel,
    pub label: &'static str,
    pub targets: Vec<LogTarget>,
    pub timestamps: bool,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Debug,
            label: "System",
            targets: vec![LogTarget::Stdout, LogTarget::Stderr],
            timestamps: true,
        }
    }
}

impl Logger {
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn log(&self, level: LogLevel, msg: Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }

        let line = self.format_line(level, msg);

        for target in self.targets.iter().filter(|t| t.accepts(level)) {
            if let Err(e) = self.log_to_target(target, level, &line) {
                eprintln!("{e}");
            }
        }
    }

    /// Renders a record without color codes.
    pub fn format_line(&self, level: LogLevel, msg: Arguments<'_>) -> String {
        if self.timestamps {
            let time = chrono::Local::now().format(TIME_FORMAT);
            format!("{} - {} [{}]: {}", time, self.label, level, msg)
        } else {
            format!("{} [{}]: {}", self.label, level, msg)
        }
    }

    fn log_to_target(
        &self,
        target: &LogTarget,
        level: LogLevel,
        line: &str,
    ) -> Result<(), LogError> {
        match target {
            LogTarget::Stdout => {
                println!(
                    "{}{}{}",
                    TerminalEscapeSequence::from(level),
                    line,
                    escape_sequence!(RESET)
                );
                Ok(())
            }
            LogTarget::Stderr => {
                eprintln!(
                    "{}{}{}",
                    TerminalEscapeSequence::from(level),
                    line,
                    escape_sequence!(RESET)
                );
                Ok(())
            }
            LogTarget::File(path) => {
                let mut file = OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(path)
                    .map_err(|source| LogError::CouldNotOpenFile {
                        path: path.clone(),
                        source,
                    })?;

                writeln!(file, "{line}").map_err(|source| LogError::CouldNotPrintToFile {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

#[derive(Debug)]
pub struct LoggerBuilder {
    min_level: LogLevel,
    label: &'static str,
    targets: Vec<LogTarget>,
    timestamps: bool,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerBuilder {
    pub fn new() -> Self {
        let Logger {
            min_level,
            label,
            targets,
            timestamps,
        } = Logger::default();
        Self {
            min_level,
            label,
            targets,
            timestamps,
        }
    }

    pub fn min_level(mut self, min_level: LogLevel) -> Self {
        self.min_level = min_level;
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn targets(mut self, targets: Vec<LogTarget>) -> Self {
        self.targets = targets;
        self
    }

    pub fn timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            min_level: self.min_level,
            label: self.label,
            targets: self.targets,
            timestamps: self.timestamps,
        }
    }
}
