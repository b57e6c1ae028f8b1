//! Match-3 engine - selection, cascade resolution and the player-facing facade
//!
//! Builds on [`match3_core`]: the core crate knows what a board is, this crate
//! knows what a turn is.
//!
//! # Module Structure
//!
//! - [`selection`]: click decision table and swap commit/revert
//! - [`cascade`]: detect -> clear -> collapse -> refill state machine
//! - [`game`]: [`Match3Engine`], which owns everything and runs whole turns
//!
//! # Example
//!
//! ```
//! use match3_engine::{ClickOutcome, Match3Engine};
//! use match3_engine::types::EngineConfig;
//!
//! let mut engine = Match3Engine::new(EngineConfig::seeded(8, 8, 5, 1)).unwrap();
//! let outcome = engine.on_tile_clicked(0, 0).unwrap();
//! assert!(matches!(outcome, ClickOutcome::Selected { .. }));
//! ```

pub mod cascade;
pub mod game;
pub mod selection;

pub use match3_core as core;
pub use match3_types as types;

pub use cascade::{CascadeReport, CascadeResolver, CascadeState};
pub use game::{ClickOutcome, EngineSnapshot, Match3Engine};
pub use selection::{
    attempt_swap, decide, Selected, SelectionAction, SelectionController, SelectionOutcome,
    SwapOutcome,
};
