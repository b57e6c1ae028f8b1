//! Grid module - owns the tiles of a match-3 board
//!
//! The grid is a `width x height` array of optional tiles stored flat in
//! row-major order (`row * width + col`). Row 0 is the bottom row; gravity
//! pulls tiles toward it.
//!
//! The grid is the only owner of [`Tile`] values. Every mutation that a
//! presentation layer could animate (spawn, move, removal) is recorded in an
//! event outbox, drained with [`Grid::take_events`].

use std::fmt;

use arrayvec::ArrayVec;

use crate::rng::TileSource;
use crate::types::{
    EngineError, EngineEvent, Position, TileId, TileKind, MAX_TILE_KINDS,
};

/// A tile on the grid
///
/// Fields are read-only from outside: a tile's position changes only when the
/// grid relocates it, so `position()` always equals the cell holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    id: TileId,
    pos: Position,
    kind: TileKind,
}

impl Tile {
    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn row(&self) -> i16 {
        self.pos.row
    }

    pub fn col(&self) -> i16 {
        self.pos.col
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }
}

/// Record of a performed swap, sufficient to undo it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRecord {
    pub first: TileId,
    pub second: TileId,
    /// Where `first` stood before the swap (now occupied by `second`).
    pub first_from: Position,
    /// Where `second` stood before the swap (now occupied by `first`).
    pub second_from: Position,
}

/// The game grid
#[derive(Debug, Clone)]
pub struct Grid {
    width: u8,
    height: u8,
    kinds: u8,
    /// Flat array of cells, row-major order (row * width + col)
    cells: Vec<Option<Tile>>,
    /// Last tile id handed out.
    last_id: u32,
    /// Pending presentation events, oldest first.
    events: Vec<EngineEvent>,
}

impl PartialEq for Grid {
    // The event outbox is not grid state.
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.kinds == other.kinds
            && self.cells == other.cells
    }
}

impl Eq for Grid {}

impl Grid {
    /// Create an empty grid
    pub fn new(width: u8, height: u8, kinds: u8) -> Self {
        Self {
            width,
            height,
            kinds,
            cells: vec![None; width as usize * height as usize],
            last_id: 0,
            events: Vec::new(),
        }
    }

    /// Fill a fresh grid so that no run of three or more exists.
    ///
    /// Cells are filled column by column, bottom to top, each with
    /// [`safe_kind_for`](Self::safe_kind_for). Emits an initial
    /// `TileSpawned` per tile in that order.
    pub fn generate<S: TileSource + ?Sized>(width: u8, height: u8, source: &mut S) -> Self {
        let mut grid = Self::new(width, height, source.kinds());
        for col in 0..width as i16 {
            for row in 0..height as i16 {
                let pos = Position::new(row, col);
                let kind = grid.safe_kind_for(pos, source);
                grid.spawn(pos, kind, true);
            }
        }
        grid
    }

    /// Build a grid from a picture, top row first.
    ///
    /// Each row is a string of hex digits (`0`-`9`, `a`-`f`) naming tile kinds,
    /// or `.` for an empty cell. Returns `None` for ragged rows, unknown
    /// characters, kinds `>= kinds`, or dimensions that don't fit a `u8`.
    ///
    /// ```
    /// use match3_core::Grid;
    /// use match3_types::{Position, TileKind};
    ///
    /// let grid = Grid::from_rows(3, &["01.", "120"]).unwrap();
    /// assert_eq!(grid.width(), 3);
    /// assert_eq!(grid.kind_at(Position::new(0, 0)), Some(TileKind(1)));
    /// assert_eq!(grid.kind_at(Position::new(1, 2)), None);
    /// ```
    pub fn from_rows(kinds: u8, rows: &[&str]) -> Option<Self> {
        let height = u8::try_from(rows.len()).ok()?;
        let width = u8::try_from(rows.first()?.chars().count()).ok()?;
        let mut grid = Self::new(width, height, kinds);

        // Spawn column-major, bottom-up, matching generation order.
        let parsed: Vec<Vec<Option<u8>>> = rows
            .iter()
            .map(|line| {
                line.chars()
                    .map(|c| match c {
                        '.' => Some(None),
                        c => c.to_digit(16).map(|d| Some(d as u8)),
                    })
                    .collect::<Option<Vec<_>>>()
            })
            .collect::<Option<Vec<_>>>()?;
        if parsed.iter().any(|r| r.len() != width as usize) {
            return None;
        }

        for col in 0..width as usize {
            for row in 0..height as usize {
                let line = &parsed[height as usize - 1 - row];
                if let Some(k) = line[col] {
                    if k >= kinds {
                        return None;
                    }
                    grid.spawn(Position::new(row as i16, col as i16), TileKind(k), true);
                }
            }
        }
        Some(grid)
    }

    /// Calculate flat index from a position
    #[inline(always)]
    fn index(&self, pos: Position) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(pos.row as usize * self.width as usize + pos.col as usize)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Size K of the tile alphabet
    pub fn kinds(&self) -> u8 {
        self.kinds
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && pos.row < self.height as i16
            && pos.col < self.width as i16
    }

    /// Tile at `pos`; `None` for empty or out-of-bounds cells.
    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.index(pos).and_then(|idx| self.cells[idx].as_ref())
    }

    pub fn kind_at(&self, pos: Position) -> Option<TileKind> {
        self.tile(pos).map(|t| t.kind)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.tile(pos).is_some()
    }

    /// Current position of the tile with `id`, if it is still on the grid.
    pub fn position_of(&self, id: TileId) -> Option<Position> {
        self.tiles().find(|t| t.id == id).map(|t| t.pos)
    }

    /// All tiles, row-major (bottom row first).
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.cells.iter().flatten()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    /// Orthogonal adjacency between two tile coordinates.
    pub fn are_adjacent(a: Position, b: Position) -> bool {
        a.is_adjacent(b)
    }

    /// Kind for `pos` that cannot complete a run with the two placed tiles to
    /// its left or the two placed tiles below it.
    ///
    /// Only left and below are inspected: generation runs column by column,
    /// bottom to top, so right and above are still empty. When every kind is
    /// excluded (possible only for K <= 2) this falls back to kind 0, which
    /// may admit a match.
    pub fn safe_kind_for<S: TileSource + ?Sized>(&self, pos: Position, source: &mut S) -> TileKind {
        let mut candidates: ArrayVec<TileKind, MAX_TILE_KINDS> = (0..self.kinds)
            .take(MAX_TILE_KINDS)
            .map(TileKind)
            .collect();

        for (d1, d2) in [
            (pos.offset(0, -1), pos.offset(0, -2)),
            (pos.offset(-1, 0), pos.offset(-2, 0)),
        ] {
            if let (Some(a), Some(b)) = (self.kind_at(d1), self.kind_at(d2)) {
                if a == b {
                    candidates.retain(|k| *k != a);
                }
            }
        }

        source.pick(&candidates).unwrap_or_default()
    }

    /// Exchange the tiles at `a` and `b`.
    ///
    /// Both cells must be in bounds and occupied; otherwise nothing changes.
    /// The swap is committed to the grid as-is. Deciding whether to keep it
    /// is the caller's job; undo it with [`revert`](Self::revert).
    pub fn swap(&mut self, a: Position, b: Position) -> Result<SwapRecord, EngineError> {
        let ia = self.occupied_index(a)?;
        let ib = self.occupied_index(b)?;

        let (first, second) = self.exchange(ia, ib, a, b);
        Ok(SwapRecord {
            first,
            second,
            first_from: a,
            second_from: b,
        })
    }

    /// Undo a [`swap`](Self::swap). Exact inverse when applied right after it.
    pub fn revert(&mut self, record: &SwapRecord) -> Result<(), EngineError> {
        // After the swap, `first` sits at `second_from` and vice versa.
        let ia = self.occupied_index(record.second_from)?;
        let ib = self.occupied_index(record.first_from)?;

        let found_first = self.cells[ia].map(|t| t.id);
        let found_second = self.cells[ib].map(|t| t.id);
        if found_first != Some(record.first) {
            return Err(empty_cell(record.second_from));
        }
        if found_second != Some(record.second) {
            return Err(empty_cell(record.first_from));
        }

        self.exchange(ia, ib, record.second_from, record.first_from);
        Ok(())
    }

    /// Remove and destroy every tile in `cells`, emitting `TileRemoved`.
    ///
    /// Empty or out-of-bounds positions are skipped. Returns the number of
    /// tiles removed.
    pub fn clear_cells(&mut self, cells: impl IntoIterator<Item = Position>) -> usize {
        let mut removed = 0;
        for pos in cells {
            let Some(idx) = self.index(pos) else {
                continue;
            };
            if let Some(tile) = self.cells[idx].take() {
                self.events.push(EngineEvent::TileRemoved { id: tile.id });
                removed += 1;
            }
        }
        removed
    }

    /// Apply gravity to one column.
    ///
    /// Scans bottom to top; each empty cell pulls down the nearest tile above
    /// it. A single pass closes any number of gaps. Returns the number of
    /// tiles moved.
    pub fn collapse_column(&mut self, col: i16) -> usize {
        if col < 0 || col >= self.width as i16 {
            return 0;
        }

        let height = self.height as i16;
        let mut moved = 0;
        for row in 0..height {
            let target = Position::new(row, col);
            if self.is_occupied(target) {
                continue;
            }
            let source = (row + 1..height)
                .map(|r| Position::new(r, col))
                .find(|&p| self.is_occupied(p));
            let Some(source) = source else {
                // Nothing left above this gap.
                break;
            };
            self.relocate(source, target);
            moved += 1;
        }
        moved
    }

    /// Apply gravity to every column. Columns never interact.
    pub fn collapse_all(&mut self) -> usize {
        (0..self.width as i16).map(|c| self.collapse_column(c)).sum()
    }

    /// Spawn a fresh tile into every empty cell.
    ///
    /// Kinds are drawn uniformly with no safety constraint; new matches are
    /// expected and feed the cascade. Spawn order is column-major, bottom to
    /// top. Returns the number of tiles spawned.
    pub fn refill_empties<S: TileSource + ?Sized>(&mut self, source: &mut S) -> usize {
        let mut spawned = 0;
        for col in 0..self.width as i16 {
            for row in 0..self.height as i16 {
                let pos = Position::new(row, col);
                if self.is_occupied(pos) {
                    continue;
                }
                // Sources outside this crate may ignore the alphabet.
                let kind = TileKind(source.next_kind().0 % self.kinds.max(1));
                self.spawn(pos, kind, false);
                spawned += 1;
            }
        }
        spawned
    }

    /// Drain pending events, oldest first.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Render as hex digits, top row first (`.` for empty).
    pub fn to_rows(&self) -> Vec<String> {
        (0..self.height as i16)
            .rev()
            .map(|row| {
                (0..self.width as i16)
                    .map(|col| match self.kind_at(Position::new(row, col)) {
                        Some(k) => std::char::from_digit(k.0 as u32, 16).unwrap_or('?'),
                        None => '.',
                    })
                    .collect()
            })
            .collect()
    }

    fn occupied_index(&self, pos: Position) -> Result<usize, EngineError> {
        let idx = self.index(pos).ok_or(EngineError::InvalidCoordinates {
            row: pos.row as i32,
            col: pos.col as i32,
        })?;
        if self.cells[idx].is_none() {
            return Err(empty_cell(pos));
        }
        Ok(idx)
    }

    /// Swap two occupied cells and rebind the tiles' positions.
    /// Returns the ids now at `b` and `a` respectively (the movers).
    fn exchange(&mut self, ia: usize, ib: usize, a: Position, b: Position) -> (TileId, TileId) {
        self.cells.swap(ia, ib);
        let mut ids = (TileId(0), TileId(0));
        if let Some(t) = self.cells[ib].as_mut() {
            t.pos = b;
            ids.0 = t.id;
        }
        if let Some(t) = self.cells[ia].as_mut() {
            t.pos = a;
            ids.1 = t.id;
        }
        if ia != ib {
            self.events.push(EngineEvent::moved(ids.0, a, b));
            self.events.push(EngineEvent::moved(ids.1, b, a));
        }
        ids
    }

    /// Move the tile at `from` into the empty cell `to`.
    fn relocate(&mut self, from: Position, to: Position) {
        let (Some(src), Some(dst)) = (self.index(from), self.index(to)) else {
            return;
        };
        if self.cells[dst].is_some() {
            return;
        }
        if let Some(mut tile) = self.cells[src].take() {
            tile.pos = to;
            self.cells[dst] = Some(tile);
            self.events.push(EngineEvent::moved(tile.id, from, to));
        }
    }

    fn spawn(&mut self, pos: Position, kind: TileKind, initial: bool) {
        let Some(idx) = self.index(pos) else {
            return;
        };
        self.last_id = self.last_id.wrapping_add(1);
        let id = TileId(self.last_id);
        self.cells[idx] = Some(Tile { id, pos, kind });
        self.events.push(EngineEvent::spawned(id, pos, kind, initial));
    }
}

fn empty_cell(pos: Position) -> EngineError {
    EngineError::EmptyCellOperation {
        row: pos.row as i32,
        col: pos.col as i32,
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_rows() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
