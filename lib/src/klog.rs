use core::fmt;
use core::str::FromStr;

/// Target every runtime message is logged under
pub const KLOG_TARGET: &str = "opal";

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum KlogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl KlogLevel {
    fn to_log(self) -> log::Level {
        match self {
            KlogLevel::Error => log::Level::Error,
            KlogLevel::Warn => log::Level::Warn,
            KlogLevel::Info => log::Level::Info,
            KlogLevel::Debug => log::Level::Debug,
            KlogLevel::Trace => log::Level::Trace,
        }
    }

    fn from_filter(filter: log::LevelFilter) -> Self {
        match filter {
            log::LevelFilter::Off | log::LevelFilter::Error => KlogLevel::Error,
            log::LevelFilter::Warn => KlogLevel::Warn,
            log::LevelFilter::Info => KlogLevel::Info,
            log::LevelFilter::Debug => KlogLevel::Debug,
            log::LevelFilter::Trace => KlogLevel::Trace,
        }
    }
}

impl FromStr for KlogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(KlogLevel::Error),
            "warn" | "warning" => Ok(KlogLevel::Warn),
            "info" => Ok(KlogLevel::Info),
            "debug" => Ok(KlogLevel::Debug),
            "trace" => Ok(KlogLevel::Trace),
            _ => Err(()),
        }
    }
}

#[inline(always)]
fn is_enabled(level: KlogLevel) -> bool {
    log::log_enabled!(target: KLOG_TARGET, level.to_log())
}

pub fn log_args(level: KlogLevel, args: fmt::Arguments<'_>) {
    if !is_enabled(level) {
        return;
    }
    log::log!(target: KLOG_TARGET, level.to_log(), "{}", args);
}

pub fn klog_set_level(level: KlogLevel) {
    log::set_max_level(level.to_log().to_level_filter());
}

pub fn klog_get_level() -> KlogLevel {
    KlogLevel::from_filter(log::max_level())
}

#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {{
        $crate::klog::log_args($level, ::core::format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! klog_error {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Error, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_warn {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Warn, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_info {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Info, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_debug {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Debug, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_trace {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Trace, ::core::format_args!($($arg)*))
    };
}
