//! Ambient helpers shared by every runtime crate: logging and configuration.

#![forbid(unsafe_code)]

pub mod config;
pub mod klog;

pub use config::{KeyEventMode, RuntimeConfig, config_from_cmdline};
pub use klog::{KlogLevel, klog_get_level, klog_set_level};
