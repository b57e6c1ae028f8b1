//! Core types module - shared data structures and constants
//!
//! This crate defines the fundamental types used throughout the engine.
//! Everything here is plain data: the core grid, the cascade engine and the
//! JSON adapter all speak in these types. Wire serialization is available
//! behind the `serde` feature.
//!
//! # Grid Dimensions
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_WIDTH` | 8 | Columns in a default grid |
//! | `DEFAULT_HEIGHT` | 8 | Rows in a default grid |
//! | `DEFAULT_TILE_KINDS` | 5 | Size of the default tile alphabet |
//! | `MAX_GRID_DIM` | 64 | Largest accepted width/height |
//! | `MAX_TILE_KINDS` | 16 | Largest accepted tile alphabet |
//! | `MIN_MATCH_LEN` | 3 | Shortest run that counts as a match |
//!
//! # Coordinates
//!
//! Positions are `(row, col)`. Row 0 is the **bottom** row and gravity pulls
//! tiles toward it; col 0 is the leftmost column.
//!
//! # Examples
//!
//! ```
//! use match3_types::{Position, TileKind};
//!
//! let a = Position::new(2, 3);
//! let b = Position::new(2, 4);
//! assert!(a.is_adjacent(b));
//! assert!(!a.is_adjacent(Position::new(3, 4)));
//!
//! assert_eq!(TileKind::new(4).index(), 4);
//! ```

pub mod config;
pub mod error;

pub use config::EngineConfig;
pub use error::{ConfigError, EngineError};

/// Default grid width in cells (8 columns)
pub const DEFAULT_WIDTH: u8 = 8;

/// Default grid height in cells (8 rows)
pub const DEFAULT_HEIGHT: u8 = 8;

/// Default number of distinct tile kinds
pub const DEFAULT_TILE_KINDS: u8 = 5;

/// Largest accepted grid width or height
pub const MAX_GRID_DIM: u8 = 64;

/// Largest accepted tile alphabet
pub const MAX_TILE_KINDS: usize = 16;

/// Shortest run (along one axis) that counts as a match
pub const MIN_MATCH_LEN: usize = 3;

/// Tile type identifier in `[0, K)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TileKind(pub u8);

impl TileKind {
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stable identity of a tile instance.
///
/// Ids are handed out monotonically by the grid and are never reused within a
/// session, so a presentation layer can key sprites on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TileId(pub u32);

/// A cell coordinate on the grid.
///
/// Ordering is row-major (bottom row first), which gives match sets a
/// deterministic iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub row: i16,
    pub col: i16,
}

impl Position {
    pub const fn new(row: i16, col: i16) -> Self {
        Self { row, col }
    }

    /// Position shifted by `(dr, dc)`. May fall outside any grid.
    pub const fn offset(self, dr: i16, dc: i16) -> Self {
        Self {
            row: self.row + dr,
            col: self.col + dc,
        }
    }

    pub fn manhattan(self, other: Position) -> u32 {
        (self.row - other.row).unsigned_abs() as u32 + (self.col - other.col).unsigned_abs() as u32
    }

    /// Orthogonal neighbours only; diagonals are not adjacent.
    ///
    /// ```
    /// use match3_types::Position;
    ///
    /// let p = Position::new(0, 0);
    /// assert!(p.is_adjacent(Position::new(1, 0)));
    /// assert!(!p.is_adjacent(Position::new(1, 1)));
    /// assert!(!p.is_adjacent(p));
    /// ```
    pub fn is_adjacent(self, other: Position) -> bool {
        self.manhattan(other) == 1
    }
}

/// Outbound grid mutation consumed by a presentation layer.
///
/// Events are emitted in the exact order the engine applied them, so replaying
/// the stream against an empty board reproduces the engine's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum EngineEvent {
    /// A new tile entered the grid. `initial` is true for tiles created by
    /// generation, false for cascade refills.
    TileSpawned {
        id: TileId,
        row: i16,
        col: i16,
        kind: TileKind,
        initial: bool,
    },
    /// A tile was relocated (swap, revert or gravity).
    TileMoved {
        id: TileId,
        from_row: i16,
        from_col: i16,
        to_row: i16,
        to_col: i16,
    },
    /// A tile was cleared from the grid and destroyed.
    TileRemoved { id: TileId },
    /// The cascade reached idle; the grid is stable until the next input.
    CascadeSettled,
}

impl EngineEvent {
    pub fn moved(id: TileId, from: Position, to: Position) -> Self {
        EngineEvent::TileMoved {
            id,
            from_row: from.row,
            from_col: from.col,
            to_row: to.row,
            to_col: to.col,
        }
    }

    pub fn spawned(id: TileId, at: Position, kind: TileKind, initial: bool) -> Self {
        EngineEvent::TileSpawned {
            id,
            row: at.row,
            col: at.col,
            kind,
            initial,
        }
    }
}
