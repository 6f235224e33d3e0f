//! The simulation core: rules, the SWAR generation step, overlays, bounded
//! undo history, the viewport projector, and the [World] facade tying them
//! together.
//!
//! Everything here is single-ownership and synchronous; the engine crate
//! wraps a [World] in a worker thread and talks messages.
pub mod generator;
pub mod history;
pub mod overlay;
pub mod render;
pub mod rule;
mod world;

pub use rule::{Rule, RuleParseError};
pub use world::*;
