//! Match detection - pure functions over grid state
//!
//! A match is a run of at least [`MIN_MATCH_LEN`] same-kind tiles along a row
//! or a column. Detection never mutates the grid.

use std::collections::BTreeSet;

use crate::grid::Grid;
use crate::types::{Position, MIN_MATCH_LEN};

/// Set of tile positions found by one detection pass.
///
/// Set semantics: a tile that matches on both axes appears once. Iteration is
/// row-major (bottom row first) regardless of how the set was built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    cells: BTreeSet<Position>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains(&pos)
    }

    pub fn insert(&mut self, pos: Position) -> bool {
        self.cells.insert(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.iter().copied()
    }

    /// Add every position of `other` into `self`.
    pub fn union_with(&mut self, other: &MatchSet) {
        self.cells.extend(other.cells.iter().copied());
    }
}

impl FromIterator<Position> for MatchSet {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Extend<Position> for MatchSet {
    fn extend<I: IntoIterator<Item = Position>>(&mut self, iter: I) {
        self.cells.extend(iter);
    }
}

impl IntoIterator for MatchSet {
    type Item = Position;
    type IntoIter = std::collections::btree_set::IntoIter<Position>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

/// The contiguous same-kind run through `pos` along one axis, seed included.
///
/// The run stops at the grid edge, an empty cell, or a different kind. An
/// empty or out-of-bounds seed yields an empty run.
fn axis_run(grid: &Grid, pos: Position, dr: i16, dc: i16) -> Vec<Position> {
    let Some(kind) = grid.kind_at(pos) else {
        return Vec::new();
    };

    let mut run = vec![pos];
    for sign in [-1i16, 1] {
        let mut cur = pos.offset(dr * sign, dc * sign);
        while grid.kind_at(cur) == Some(kind) {
            run.push(cur);
            cur = cur.offset(dr * sign, dc * sign);
        }
    }
    run
}

/// Tiles matched through the tile at `pos`.
///
/// The horizontal and vertical runs through `pos` are each kept only when
/// they reach [`MIN_MATCH_LEN`]; the result is their union.
pub fn find_matches(grid: &Grid, pos: Position) -> MatchSet {
    let mut set = MatchSet::new();
    for (dr, dc) in [(0, 1), (1, 0)] {
        let run = axis_run(grid, pos, dr, dc);
        if run.len() >= MIN_MATCH_LEN {
            set.extend(run);
        }
    }
    set
}

/// Union of [`find_matches`] over every occupied cell.
///
/// This is the authority for cascade re-checks. Because the result is a set
/// built from per-cell runs, scan order cannot change it.
pub fn find_all_matches(grid: &Grid) -> MatchSet {
    let mut set = MatchSet::new();
    for tile in grid.tiles() {
        set.union_with(&find_matches(grid, tile.position()));
    }
    set
}

/// Union of the matches through two cells, as checked after a swap.
pub fn find_matches_pair(grid: &Grid, a: Position, b: Position) -> MatchSet {
    let mut set = find_matches(grid, a);
    set.union_with(&find_matches(grid, b));
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededTileSource;

    fn p(row: i16, col: i16) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_no_match_for_pairs() {
        let grid = Grid::from_rows(4, &["0011", "1100"]).unwrap();
        assert!(find_all_matches(&grid).is_empty());
        assert!(find_matches(&grid, p(0, 0)).is_empty());
    }

    #[test]
    fn test_horizontal_run_of_three() {
        let grid = Grid::from_rows(4, &["2000", "1312"]).unwrap();
        let set = find_matches(&grid, p(1, 2));
        assert_eq!(set, [p(1, 1), p(1, 2), p(1, 3)].into_iter().collect());

        // The seed at the end of the run finds the same run.
        assert_eq!(find_matches(&grid, p(1, 3)), set);
    }

    #[test]
    fn test_vertical_run_stops_at_mismatch() {
        let grid = Grid::from_rows(4, &["1", "2", "2", "2", "3"]).unwrap();
        let set = find_matches(&grid, p(2, 0));
        assert_eq!(set.len(), 3);
        assert!(!set.contains(p(0, 0)));
        assert!(!set.contains(p(4, 0)));
    }

    #[test]
    fn test_run_stops_at_empty_cell() {
        let grid = Grid::from_rows(2, &["11.11"]).unwrap();
        assert!(find_all_matches(&grid).is_empty());
    }

    #[test]
    fn test_cross_shape_is_deduplicated() {
        // Seed (1,1) sits in both a row run and a column run.
        let grid = Grid::from_rows(3, &[".1.", "111", ".1."]).unwrap();
        let set = find_matches(&grid, p(1, 1));
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn test_empty_and_out_of_bounds_seed() {
        let grid = Grid::from_rows(2, &["0.", "00"]).unwrap();
        assert!(find_matches(&grid, p(1, 1)).is_empty());
        assert!(find_matches(&grid, p(-1, 0)).is_empty());
        assert!(find_matches(&grid, p(0, 5)).is_empty());
    }

    #[test]
    fn test_long_run_included_fully() {
        let grid = Grid::from_rows(2, &["1111", "0101"]).unwrap();
        let all = find_all_matches(&grid);
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|pos| pos.row == 1));
    }

    #[test]
    fn test_find_all_matches_two_separate_runs() {
        let grid = Grid::from_rows(3, &["000", "121", "222"]).unwrap();
        let all = find_all_matches(&grid);
        // Row 2 (top) and row 0 (bottom) runs, plus nothing from the middle.
        assert_eq!(all.len(), 6);
        assert!(!all.contains(p(1, 0)));
    }

    #[test]
    fn test_find_all_matches_equals_union_of_cells() {
        let mut source = SeededTileSource::new(3, 2024);
        let mut grid = Grid::generate(7, 7, &mut source);
        grid.clear_cells([p(3, 3), p(4, 4)]);
        grid.refill_empties(&mut source);

        let mut by_hand = MatchSet::new();
        let positions: Vec<Position> = grid.tiles().map(|t| t.position()).collect();
        for pos in positions.iter().rev() {
            by_hand.union_with(&find_matches(&grid, *pos));
        }
        assert_eq!(find_all_matches(&grid), by_hand);
    }

    #[test]
    fn test_iteration_is_row_major() {
        let grid = Grid::from_rows(3, &["0..", "0..", "0.."]).unwrap();
        let order: Vec<Position> = find_all_matches(&grid).iter().collect();
        assert_eq!(order, vec![p(0, 0), p(1, 0), p(2, 0)]);
    }
}
