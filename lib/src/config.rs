//! Runtime configuration parsed from a `key=value` command line.

use core::time::Duration;

use opal_abi::{BitmapMode, Size};

use crate::klog::KlogLevel;
use crate::klog_warn;

pub const RUNTIME_DEFAULT_SCREEN: Size = Size::new(640, 240);
pub const RUNTIME_DEFAULT_SPRITE_TICK_MS: u64 = 50;
pub const RUNTIME_DEFAULT_MIN_FRAME_MS: u64 = 100;
pub const RUNTIME_DEFAULT_CURSOR_FLASH_MS: u64 = 500;
pub const RUNTIME_DEFAULT_INFO_DISMISS_MS: u64 = 2000;

/// How physical key transitions reach the interpreter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeyEventMode {
    /// Key-down and key-up are delivered alongside key presses
    #[default]
    DownUp,
    /// Only synthesized key presses are delivered
    PressOnly,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub screen: Size,
    pub root_mode: BitmapMode,
    pub sprite_tick: Duration,
    /// Shortest sprite frame the hardware could show
    pub min_frame: Duration,
    pub cursor_flash: Duration,
    pub info_dismiss: Duration,
    pub key_events: KeyEventMode,
    pub utc_offset_minutes: i32,
    pub fs_writable: bool,
    pub log_level: KlogLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            screen: RUNTIME_DEFAULT_SCREEN,
            root_mode: BitmapMode::Gray4,
            sprite_tick: Duration::from_millis(RUNTIME_DEFAULT_SPRITE_TICK_MS),
            min_frame: Duration::from_millis(RUNTIME_DEFAULT_MIN_FRAME_MS),
            cursor_flash: Duration::from_millis(RUNTIME_DEFAULT_CURSOR_FLASH_MS),
            info_dismiss: Duration::from_millis(RUNTIME_DEFAULT_INFO_DISMISS_MS),
            key_events: KeyEventMode::DownUp,
            utc_offset_minutes: 0,
            fs_writable: true,
            log_level: KlogLevel::Info,
        }
    }
}

fn parse_screen(value: &str) -> Option<Size> {
    let (w, h) = value.split_once(['x', 'X'])?;
    let size = Size::new(w.parse().ok()?, h.parse().ok()?);
    (!size.is_empty()).then_some(size)
}

fn parse_millis(value: &str) -> Option<Duration> {
    value
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

fn parse_key_mode(value: &str) -> Option<KeyEventMode> {
    if value.eq_ignore_ascii_case("downup") {
        Some(KeyEventMode::DownUp)
    } else if value.eq_ignore_ascii_case("press") {
        Some(KeyEventMode::PressOnly)
    } else {
        None
    }
}

fn parse_fs_mode(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("rw") {
        Some(true)
    } else if value.eq_ignore_ascii_case("ro") {
        Some(false)
    } else {
        None
    }
}

fn process_token(config: &mut RuntimeConfig, token: &str) {
    let Some((key, value)) = token.split_once('=') else {
        klog_warn!("config: ignoring token without value: {}", token);
        return;
    };

    let applied = match key {
        "log" => value.parse().ok().map(|level| config.log_level = level),
        "screen" => parse_screen(value).map(|size| config.screen = size),
        "keys" => parse_key_mode(value).map(|mode| config.key_events = mode),
        "sprite_tick" => parse_millis(value).map(|d| config.sprite_tick = d),
        "cursor_flash" => parse_millis(value).map(|d| config.cursor_flash = d),
        "info_dismiss" => parse_millis(value).map(|d| config.info_dismiss = d),
        "utc_offset" => value
            .parse::<i32>()
            .ok()
            .map(|mins| config.utc_offset_minutes = mins),
        "fs" => parse_fs_mode(value).map(|rw| config.fs_writable = rw),
        _ => {
            klog_warn!("config: unknown key '{}'", key);
            return;
        }
    };

    if applied.is_none() {
        klog_warn!("config: bad value '{}' for '{}'", value, key);
    }
}

/// Parse whitespace-separated `key=value` tokens on top of the defaults.
pub fn config_from_cmdline(cmdline: &str) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    for token in cmdline.split_whitespace() {
        process_token(&mut config, token);
    }
    config
}
