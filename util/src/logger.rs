//! # Logger
//!
//! Log lines go to two sinks: the terminal, with the level tag coloured, and the session's log
//! file, which gets the same line with a plain tag so it stays readable in an editor.
//!
//! Every line is stamped with the number of seconds since the session epoch. Debug and trace
//! lines also carry their target (the emitting module path).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::fmt;

// External
use colored::Colorize;
use log::{info, Level, Record};
use thiserror::Error;

// Internal
use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The log level must be at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not open the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise logging to stdout and to the session's log file.
///
/// `min_level` must be `Info` or more verbose. Only the first call in a process can succeed.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let terminal = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", Line::new(record, message, true)))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", Line::new(record, message, false)))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .chain(terminal)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised at {:?}", min_level);
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log file: {:?}", session.log_file_path);

    Ok(())
}

/// Three letter tag for a level.
fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single formatted log line.
struct Line<'a> {
    elapsed_s: f64,
    level: Level,
    target: Option<&'a str>,
    message: &'a fmt::Arguments<'a>,
    coloured: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a> Line<'a> {
    fn new(record: &'a Record, message: &'a fmt::Arguments<'a>, coloured: bool) -> Self {
        Self {
            elapsed_s: session::get_elapsed_seconds(),
            level: record.level(),
            target: if record.level() > Level::Info {
                Some(record.target())
            }
            else {
                None
            },
            message,
            coloured,
        }
    }
}

impl<'a> fmt::Display for Line<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = level_tag(self.level);

        write!(f, "[{:10.6} ", self.elapsed_s)?;

        if self.coloured {
            let tag = match self.level {
                Level::Trace => tag.dimmed().italic(),
                Level::Debug => tag.dimmed(),
                Level::Info => tag.normal(),
                Level::Warn => tag.yellow(),
                Level::Error => tag.red().bold(),
            };
            write!(f, "{}]", tag)?;
        }
        else {
            write!(f, "{}]", tag)?;
        }

        match self.target {
            Some(target) => write!(f, " {}: {}", target, self.message),
            None => write!(f, " {}", self.message),
        }
    }
}
