//! Pixel surfaces, the graphics command engine and the window server.

#![forbid(unsafe_code)]

pub mod blit;
pub mod border;
pub mod canvas;
pub mod codec;
pub mod compositor;
pub mod graphics;
pub mod palette;
pub mod text;

pub use canvas::{Canvas, Image};
pub use compositor::WindowServer;
pub use compositor::api::{Presenter, PresenterHandle};
pub use compositor::timers::TimerKind;
