use std::{fmt::Arguments, sync::OnceLock};

use cfg_if::cfg_if;

use crate::{
    log_errors::LogError,
    logger_impl::{LogTarget, Logger},
    LogLevel,
};

pub const ARENA_LOGGER_NAME: &str = "arena";
pub const APP_LOGGER_NAME: &str = "app";

static ARENA_LOGGER: OnceLock<Logger> = OnceLock::new();
static APP_LOGGER: OnceLock<Logger> = OnceLock::new();

cfg_if! {
    if #[cfg(debug_assertions)] {
        const ARENA_DEFAULT_LEVEL: LogLevel = LogLevel::Debug;
    } else {
        const ARENA_DEFAULT_LEVEL: LogLevel = LogLevel::Info;
    }
}

impl Logger {
    pub fn default_arena() -> Self {
        Self {
            min_level: ARENA_DEFAULT_LEVEL,
            label: "Arena",
            targets: vec![LogTarget::Stdout, LogTarget::Stderr],
            ..Default::default()
        }
    }

    pub fn default_app() -> Self {
        Self {
            label: "App",
            ..Default::default()
        }
    }
}

/// Installs the logger used by the allocation engine. Without a call to this
/// function [`Logger::default_arena`] is installed on first use.
pub fn arena_logger_init(logger: Option<Logger>) -> Result<(), LogError> {
    ARENA_LOGGER
        .set(logger.unwrap_or_else(Logger::default_arena))
        .map_err(|_| LogError::AlreadyInitialized(ARENA_LOGGER_NAME))
}

pub fn app_logger_init(logger: Option<Logger>) -> Result<(), LogError> {
    APP_LOGGER
        .set(logger.unwrap_or_else(Logger::default_app))
        .map_err(|_| LogError::AlreadyInitialized(APP_LOGGER_NAME))
}

pub fn global_logger(logger_name: &str) -> Option<&'static Logger> {
    match logger_name {
        ARENA_LOGGER_NAME => Some(ARENA_LOGGER.get_or_init(Logger::default_arena)),
        APP_LOGGER_NAME => Some(APP_LOGGER.get_or_init(Logger::default_app)),
        _ => None,
    }
}

pub fn log_to_global(logger_name: &str, level: LogLevel, msg: Arguments<'_>) {
    match global_logger(logger_name) {
        Some(logger) => logger.log(level, msg),
        None => eprintln!("Logger with name \"{}\" does not exist", logger_name),
    }
}
