//! Grid snapshots for observers
//!
//! A [`GridSnapshot`] is a flat, owned copy of the board kinds and tile ids. Its
//! [`board_hash`](GridSnapshot::board_hash) is stable across processes, so
//! two engines driven by the same seed and clicks can be compared by hash.

use crate::grid::Grid;
use crate::types::{Position, TileId, TileKind};

/// Stable 64-bit FNV-1a over a byte stream.
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions, and
/// board hashes are compared across processes.
pub fn fnv1a64(bytes: impl IntoIterator<Item = u8>) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(0x00000100000001B3);
    }
    h
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridSnapshot {
    pub width: u8,
    pub height: u8,
    /// Row-major, bottom row first. `None` is an empty cell.
    pub cells: Vec<Option<TileKind>>,
    /// Tile ids in the same layout as `cells`.
    pub ids: Vec<Option<TileId>>,
    pub board_hash: u64,
}

impl GridSnapshot {
    pub fn kind_at(&self, pos: Position) -> Option<TileKind> {
        if pos.row < 0 || pos.col < 0 || pos.row >= self.height as i16 || pos.col >= self.width as i16
        {
            return None;
        }
        self.cells[pos.row as usize * self.width as usize + pos.col as usize]
    }

    /// Rows as kind bytes (`kind + 1`, `0` for empty), top row first.
    pub fn rows_u8(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.width.max(1) as usize)
            .rev()
            .map(|row| row.iter().map(|c| cell_byte(*c)).collect())
            .collect()
    }

    /// Tile ids per cell, top row first, matching [`rows_u8`](Self::rows_u8).
    pub fn id_rows(&self) -> Vec<Vec<Option<TileId>>> {
        self.ids
            .chunks(self.width.max(1) as usize)
            .rev()
            .map(<[_]>::to_vec)
            .collect()
    }
}

fn cell_byte(cell: Option<TileKind>) -> u8 {
    cell.map(|k| k.0.wrapping_add(1)).unwrap_or(0)
}

impl Grid {
    pub fn snapshot(&self) -> GridSnapshot {
        let area = self.width() as usize * self.height() as usize;
        let mut cells = Vec::with_capacity(area);
        let mut ids = Vec::with_capacity(area);
        for row in 0..self.height() as i16 {
            for col in 0..self.width() as i16 {
                let tile = self.tile(Position::new(row, col));
                cells.push(tile.map(|t| t.kind()));
                ids.push(tile.map(|t| t.id()));
            }
        }

        let dims = [self.width(), self.height()];
        let board_hash = fnv1a64(dims.into_iter().chain(cells.iter().map(|c| cell_byte(*c))));

        GridSnapshot {
            width: self.width(),
            height: self.height(),
            cells,
            ids,
            board_hash,
        }
    }
}
