//! Player selection handling
//!
//! At most one tile is selected at a time. A click is resolved against the
//! current selection with a fixed table:
//!
//! | selection | clicked                 | action                          |
//! |-----------|-------------------------|---------------------------------|
//! | none      | T                       | select T                        |
//! | T         | T                       | deselect                        |
//! | T         | U, adjacent to T        | attempt swap(T, U); deselect    |
//! | T         | U, not adjacent         | select U                        |

use tracing::debug;

use crate::core::{find_matches_pair, Grid, MatchSet};
use crate::types::{EngineError, Position, TileId, MIN_MATCH_LEN};

/// Non-owning reference to the selected tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selected {
    pub id: TileId,
    pub pos: Position,
}

/// Decision for one click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionAction {
    Select(Position),
    Deselect,
    AttemptSwap(Position, Position),
    Reselect(Position),
}

/// Pure decision table: `(current selection, clicked cell) -> action`.
pub fn decide(current: Option<Position>, clicked: Position) -> SelectionAction {
    match current {
        None => SelectionAction::Select(clicked),
        Some(sel) if sel == clicked => SelectionAction::Deselect,
        Some(sel) if Grid::are_adjacent(sel, clicked) => SelectionAction::AttemptSwap(sel, clicked),
        Some(_) => SelectionAction::Reselect(clicked),
    }
}

/// Result of a swap attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The swap stands; the set is the union of matches through both moved tiles.
    Committed(MatchSet),
    /// No run formed; the grid is back to its pre-swap state.
    Reverted,
}

/// Swap `a` and `b`, keep the swap if it forms a match, revert otherwise.
///
/// Only the two moved tiles are checked: on a settled grid a swap cannot
/// create a run that avoids both of them.
pub fn attempt_swap(grid: &mut Grid, a: Position, b: Position) -> Result<SwapOutcome, EngineError> {
    let record = grid.swap(a, b)?;
    let matches = find_matches_pair(grid, a, b);

    if matches.len() >= MIN_MATCH_LEN {
        debug!(?a, ?b, matched = matches.len(), "swap committed");
        return Ok(SwapOutcome::Committed(matches));
    }

    grid.revert(&record)?;
    debug!(?a, ?b, "swap reverted");
    Ok(SwapOutcome::Reverted)
}

/// What a click did to the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected(Position),
    Deselected,
    Reselected(Position),
    Swapped(SwapOutcome),
}

/// Holds the pending selection
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selected: Option<Selected>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<Selected> {
        self.selected
    }

    /// Position of the selected tile, if it is still where it was selected.
    pub fn selected_position(&self, grid: &Grid) -> Option<Position> {
        let sel = self.selected?;
        let tile = grid.tile(sel.pos)?;
        (tile.id() == sel.id).then_some(sel.pos)
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Resolve a click on `clicked`.
    ///
    /// Out-of-bounds and empty cells are rejected without touching the
    /// selection or the grid. An adjacent click always clears the selection,
    /// whether the swap commits or reverts.
    pub fn on_click(
        &mut self,
        grid: &mut Grid,
        clicked: Position,
    ) -> Result<SelectionOutcome, EngineError> {
        if !grid.in_bounds(clicked) {
            return Err(EngineError::InvalidCoordinates {
                row: clicked.row as i32,
                col: clicked.col as i32,
            });
        }
        let Some(tile) = grid.tile(clicked) else {
            return Err(EngineError::EmptyCellOperation {
                row: clicked.row as i32,
                col: clicked.col as i32,
            });
        };
        let target = Selected {
            id: tile.id(),
            pos: clicked,
        };

        let current = self.selected_position(grid);
        match decide(current, clicked) {
            SelectionAction::Select(_) => {
                self.selected = Some(target);
                Ok(SelectionOutcome::Selected(clicked))
            }
            SelectionAction::Deselect => {
                self.selected = None;
                Ok(SelectionOutcome::Deselected)
            }
            SelectionAction::Reselect(_) => {
                self.selected = Some(target);
                Ok(SelectionOutcome::Reselected(clicked))
            }
            SelectionAction::AttemptSwap(a, b) => {
                self.selected = None;
                attempt_swap(grid, a, b).map(SelectionOutcome::Swapped)
            }
        }
    }
}
