//! Opal shared types
//!
//! This crate provides the canonical definitions for all types shared between
//! the runtime crates and the interpreter that drives them. Having a single
//! source of truth keeps the scheduler, window server and input bridge from
//! depending on each other directly.

#![forbid(unsafe_code)]

pub mod bitmap;
pub mod draw;
pub mod error;
pub mod fs;
pub mod geometry;
pub mod input;
pub mod sched_traits;
pub mod video_traits;
pub mod window;

pub use bitmap::*;
pub use draw::*;
pub use error::*;
pub use fs::*;
pub use geometry::*;
pub use input::*;
pub use sched_traits::*;
pub use video_traits::*;
pub use window::*;
