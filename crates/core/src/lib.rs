//! Core grid logic - pure, deterministic, and testable
//!
//! This crate holds the board and the rules that read it. It has **zero
//! dependencies** on I/O, timing, or presentation:
//!
//! - **Deterministic**: tile kinds come from an injected [`TileSource`]; the
//!   same seed always produces the same board and the same refills
//! - **Observable**: every spawn, move and removal is recorded as an
//!   [`EngineEvent`](types::EngineEvent) for a presentation layer
//!
//! # Module Structure
//!
//! - [`grid`]: width x height board, generation, swap/revert, clear, gravity, refill
//! - [`matcher`]: run detection (rows and columns, length >= 3)
//! - [`rng`]: LCG and tile sources (seeded and scripted)
//! - [`snapshot`]: flat grid snapshot with a stable board hash
//!
//! # Example
//!
//! ```
//! use match3_core::{find_all_matches, Grid, SeededTileSource};
//!
//! let mut source = SeededTileSource::new(5, 12345);
//! let grid = Grid::generate(8, 8, &mut source);
//!
//! // Generation never leaves a run of three.
//! assert!(grid.is_full());
//! assert!(find_all_matches(&grid).is_empty());
//! ```

pub mod grid;
pub mod matcher;
pub mod rng;
pub mod snapshot;

pub use match3_types as types;

// Re-export commonly used types for convenience
pub use grid::{Grid, SwapRecord, Tile};
pub use matcher::{find_all_matches, find_matches, find_matches_pair, MatchSet};
pub use rng::{ScriptedTileSource, SeededTileSource, SimpleRng, TileSource};
pub use snapshot::GridSnapshot;
