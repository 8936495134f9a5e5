// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Verbosity of everything that gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Level {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Off => LevelFilter::OFF,
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Info => LevelFilter::INFO,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
        }
    }
}

/// Either a plain [Level], or per-target directives such as `"info,ethers_providers=warn"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Level(Level),
    Directives(String),
}

impl LogLevel {
    /// [EnvFilter] isn't `Clone`, so it is built on demand.
    pub fn to_filter(&self) -> anyhow::Result<EnvFilter> {
        let filter = match self {
            LogLevel::Level(level) => {
                EnvFilter::default().add_directive(LevelFilter::from(*level).into())
            }
            LogLevel::Directives(directives) => EnvFilter::try_new(directives)?,
        };
        Ok(filter)
    }
}

/// Accept a level name in any case, otherwise anything that [EnvFilter] can parse.
pub fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    if let Ok(level) = Level::from_str(s, true) {
        return Ok(LogLevel::Level(level));
    }

    EnvFilter::try_new(s)
        .map(|_| LogLevel::Directives(s.to_owned()))
        .map_err(|e| format!("invalid log level or filter {s:?}: {e}"))
}
