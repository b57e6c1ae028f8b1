//! End-to-end engine behaviour: clicks in, events out

use std::collections::HashMap;

use match3::core::{find_all_matches, Grid, SimpleRng};
use match3::engine::{ClickOutcome, Match3Engine};
use match3::types::{EngineConfig, EngineError, EngineEvent, Position, TileId, TileKind};

/// Rebuilds a board purely from the event stream.
#[derive(Default)]
struct Replay {
    tiles: HashMap<TileId, (Position, TileKind)>,
    cells: HashMap<Position, TileId>,
    settled: usize,
}

impl Replay {
    fn apply(&mut self, event: &EngineEvent) {
        match *event {
            EngineEvent::TileSpawned { id, row, col, kind, .. } => {
                let pos = Position::new(row, col);
                assert!(self.cells.insert(pos, id).is_none(), "spawn onto occupied {:?}", pos);
                assert!(self.tiles.insert(id, (pos, kind)).is_none(), "id {:?} reused", id);
            }
            EngineEvent::TileMoved { id, from_row, from_col, to_row, to_col } => {
                let from = Position::new(from_row, from_col);
                let to = Position::new(to_row, to_col);
                let entry = self.tiles.get_mut(&id).expect("move of unknown tile");
                assert_eq!(entry.0, from);
                entry.0 = to;
                // Swaps move two tiles through each other's cells.
                if self.cells.get(&from) == Some(&id) {
                    self.cells.remove(&from);
                }
                self.cells.insert(to, id);
            }
            EngineEvent::TileRemoved { id } => {
                let (pos, _) = self.tiles.remove(&id).expect("removal of unknown tile");
                assert_eq!(self.cells.remove(&pos), Some(id));
            }
            EngineEvent::CascadeSettled => self.settled += 1,
        }
    }

    fn assert_matches(&self, grid: &Grid) {
        assert_eq!(self.tiles.len(), grid.tiles().count());
        for tile in grid.tiles() {
            assert_eq!(
                self.tiles.get(&tile.id()),
                Some(&(tile.position(), tile.kind())),
                "tile {:?}",
                tile.id()
            );
        }
    }
}

#[test]
fn test_event_stream_replays_to_engine_grid() {
    let mut engine = Match3Engine::new(EngineConfig::seeded(8, 8, 5, 2024)).unwrap();
    let mut replay = Replay::default();
    let mut rng = SimpleRng::new(99);
    let mut commits = 0;

    for _ in 0..400 {
        let row = rng.next_range(8) as i32;
        let col = rng.next_range(8) as i32;
        let (dr, dc) = [(0, 1), (1, 0), (0, -1), (-1, 0)][rng.next_range(4) as usize];

        engine.on_tile_clicked(row, col).unwrap();
        match engine.on_tile_clicked(row + dr, col + dc) {
            Ok(ClickOutcome::Committed(report)) => {
                commits += 1;
                assert!(report.passes >= 1);
                assert!(report.cleared >= 3);
            }
            Ok(_) => {}
            Err(EngineError::InvalidCoordinates { .. }) => engine.on_tile_clicked(row, col).map(|_| ()).unwrap(),
            Err(e) => panic!("unexpected error {}", e),
        }

        for event in engine.take_events() {
            replay.apply(&event);
        }
        replay.assert_matches(engine.grid());
        assert!(engine.grid().is_full());
        if engine.last_fault().is_none() {
            assert!(find_all_matches(engine.grid()).is_empty());
        }
    }

    assert!(commits > 0);
    assert_eq!(replay.settled, commits);
}

#[test]
fn test_committed_turn_ends_with_settle_marker() {
    let grid = Grid::from_rows(3, &["1202", "2120", "0100"]).unwrap();
    let source = match3::core::ScriptedTileSource::new(3, [2, 0, 1]);
    let mut engine = Match3Engine::from_grid(EngineConfig::default(), grid, source).unwrap();
    engine.take_events();

    engine.on_tile_clicked(0, 1).unwrap();
    let outcome = engine.on_tile_clicked(0, 0).unwrap();
    assert!(matches!(outcome, ClickOutcome::Committed(_)));

    let events = engine.take_events();
    assert_eq!(events.last(), Some(&EngineEvent::CascadeSettled));
    assert_eq!(
        events.iter().filter(|e| **e == EngineEvent::CascadeSettled).count(),
        1
    );
    assert_eq!(engine.grid().to_rows(), vec!["1201", "2202", "1120"]);
}

#[test]
fn test_selection_survives_rejected_click() {
    let mut engine = Match3Engine::new(EngineConfig::seeded(6, 6, 5, 8)).unwrap();
    engine.on_tile_clicked(2, 2).unwrap();
    assert_eq!(
        engine.on_tile_clicked(6, 2),
        Err(EngineError::InvalidCoordinates { row: 6, col: 2 })
    );
    assert_eq!(engine.selection(), Some(Position::new(2, 2)));
}

#[test]
fn test_diagonal_click_moves_selection() {
    let mut engine = Match3Engine::new(EngineConfig::seeded(6, 6, 5, 8)).unwrap();
    let before = engine.grid().clone();
    engine.on_tile_clicked(2, 2).unwrap();
    assert_eq!(
        engine.on_tile_clicked(3, 3),
        Ok(ClickOutcome::Reselected {
            at: Position::new(3, 3)
        })
    );
    assert_eq!(engine.selection(), Some(Position::new(3, 3)));
    assert_eq!(engine.grid(), &before);
}

#[test]
fn test_snapshot_hash_follows_board() {
    let a = Match3Engine::new(EngineConfig::seeded(8, 8, 5, 1)).unwrap();
    let b = Match3Engine::new(EngineConfig::seeded(8, 8, 5, 2)).unwrap();
    assert_eq!(a.snapshot().grid, a.grid().snapshot());
    assert_ne!(a.snapshot().grid.board_hash, b.snapshot().grid.board_hash);
}
