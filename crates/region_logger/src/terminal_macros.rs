#[macro_export]
macro_rules! escape_sequence {
    ($($code:expr),*) => {
        $crate::TerminalEscapeSequence(vec![$($code),*])
    };
}

#[macro_export]
macro_rules! log_to_global {
    ($logger_name: expr, $log_level: expr, $($args: tt)+) => {
        $crate::global_loggers::log_to_global($logger_name, $log_level, format_args!($($args)+))
    };
}

// arena logger, used by the allocation engine

#[macro_export]
macro_rules! arena_debug {
    ($($args: tt)+) => {
        $crate::log_to_global!($crate::global_loggers::ARENA_LOGGER_NAME, $crate::LogLevel::Debug, $($args)+)
    };
}

#[macro_export]
macro_rules! arena_info {
    ($($args: tt)+) => {
        $crate::log_to_global!($crate::global_loggers::ARENA_LOGGER_NAME, $crate::LogLevel::Info, $($args)+)
    };
}

#[macro_export]
macro_rules! arena_warn {
    ($($args: tt)+) => {
        $crate::log_to_global!($crate::global_loggers::ARENA_LOGGER_NAME, $crate::LogLevel::Warn, $($args)+)
    };
}

#[macro_export]
macro_rules! arena_error {
    ($($args: tt)+) => {
        $crate::log_to_global!($crate::global_loggers::ARENA_LOGGER_NAME, $crate::LogLevel::Error, $($args)+)
    };
}

#[macro_export]
macro_rules! arena_critical {
    ($($args: tt)+) => {
        $crate::log_to_global!($crate::global_loggers::ARENA_LOGGER_NAME, $crate::LogLevel::Critical, $($args)+)
    };
}

// app logger

#[macro_export]
macro_rules! debug {
    ($($args: tt)+) => {
        $crate::log_to_global!($crate::global_loggers::APP_LOGGER_NAME, $crate::LogLevel::Debug, $($args)+)
    };
}

#[macro_export]
macro_rules! info {
    ($($args: tt)+) => {
        $crate::log_to_global!($crate::global_loggers::APP_LOGGER_NAME, $crate::LogLevel::Info, $($args)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($($args: tt)+) => {
        $crate::log_to_global!($crate::global_loggers::APP_LOGGER_NAME, $crate::LogLevel::Warn, $($args)+)
    };
}

#[macro_export]
macro_rules! error {
    ($($args: tt)+) => {
        $crate::log_to_global!($crate::global_loggers::APP_LOGGER_NAME, $crate::LogLevel::Error, $($args)+)
    };
}

#[macro_export]
macro_rules! critical {
    ($($args: tt)+) => {
        $crate::log_to_global!($crate::global_loggers::APP_LOGGER_NAME, $crate::LogLevel::Critical, $($args)+)
    };
}
