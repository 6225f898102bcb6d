//! Asynchronous sources that complete scheduler requests: input, sound and
//! the file-system gate.

#![forbid(unsafe_code)]

pub mod fs;
pub mod input_event;
pub mod keyboard;
pub mod sound;

pub use fs::FsGate;
pub use input_event::{EventBridge, PenAction};
pub use keyboard::modified_keycode;
pub use sound::SoundRequest;
