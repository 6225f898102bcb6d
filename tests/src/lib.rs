//! Cross-crate scenarios for the Opal runtime and the fixtures they share.
//!
//! Fixtures stand in for the embedder's collaborators: a fixed block font,
//! a sound player that finishes only when told to, and an in-memory file
//! system.

pub mod fixtures;

#[cfg(test)]
mod bridge_tests;
#[cfg(test)]
mod request_tests;
#[cfg(test)]
mod window_tests;
