//! Swap commit and cascade resolution

use match3::core::{find_all_matches, Grid, ScriptedTileSource, SeededTileSource};
use match3::engine::{attempt_swap, CascadeResolver, CascadeState, SwapOutcome};
use match3::types::{EngineEvent, Position};

fn p(row: i16, col: i16) -> Position {
    Position::new(row, col)
}

// Bottom row reads [A, B, A, A]; swapping the first two completes A A A.
const ABAA: [&str; 3] = ["1202", "2120", "0100"];

#[test]
fn test_abaa_swap_commits_and_settles() {
    let mut grid = Grid::from_rows(3, &ABAA).unwrap();
    assert!(find_all_matches(&grid).is_empty());
    grid.take_events();

    let SwapOutcome::Committed(matched) = attempt_swap(&mut grid, p(0, 0), p(0, 1)).unwrap() else {
        panic!("swap should commit");
    };
    assert_eq!(matched, [p(0, 1), p(0, 2), p(0, 3)].into_iter().collect());

    let mut source = ScriptedTileSource::new(3, [2, 0, 1]);
    let report = CascadeResolver::new(12).resolve(&mut grid, &mut source);

    assert_eq!(report.passes, 1);
    assert_eq!(report.cleared, 3);
    assert_eq!(report.fault, None);
    assert_eq!(grid.to_rows(), vec!["1201", "2202", "1120"]);
    assert!(find_all_matches(&grid).is_empty());

    let events = grid.take_events();
    let count = |f: fn(&EngineEvent) -> bool| events.iter().filter(|e| f(e)).count();
    // Swap (2 moves) + collapse (6 moves).
    assert_eq!(count(|e| matches!(e, EngineEvent::TileMoved { .. })), 8);
    assert_eq!(count(|e| matches!(e, EngineEvent::TileRemoved { .. })), 3);
    assert_eq!(count(|e| matches!(e, EngineEvent::TileSpawned { initial: false, .. })), 3);
}

#[test]
fn test_no_match_swap_leaves_grid_identical() {
    let mut grid = Grid::from_rows(3, &ABAA).unwrap();
    let before = grid.clone();

    // Top row [1,2,0,2]: swapping the middle pair gives [1,0,2,2].
    assert_eq!(attempt_swap(&mut grid, p(2, 1), p(2, 2)).unwrap(), SwapOutcome::Reverted);
    assert_eq!(grid, before);
}

#[test]
fn test_commit_set_equals_full_recompute() {
    let mut committed = 0;
    for seed in 0..60u32 {
        let mut source = SeededTileSource::new(4, seed);
        let grid = Grid::generate(7, 7, &mut source);

        for row in 0..7i16 {
            for col in 0..6i16 {
                let mut trial = grid.clone();
                if let SwapOutcome::Committed(set) =
                    attempt_swap(&mut trial, p(row, col), p(row, col + 1)).unwrap()
                {
                    assert_eq!(find_all_matches(&trial), set, "seed {} at ({}, {})", seed, row, col);
                    committed += 1;
                }
            }
        }
    }
    assert!(committed > 0);
}

#[test]
fn test_resolver_always_ends_match_free() {
    for seed in 0..50u32 {
        let mut source = SeededTileSource::new(3, seed);
        let mut grid = Grid::generate(8, 8, &mut source);

        let mut resolver = CascadeResolver::new(64);
        for row in 0..8i16 {
            for col in 0..7i16 {
                if let SwapOutcome::Committed(_) =
                    attempt_swap(&mut grid, p(row, col), p(row, col + 1)).unwrap()
                {
                    let report = resolver.resolve(&mut grid, &mut source);
                    if report.fault.is_none() {
                        assert!(find_all_matches(&grid).is_empty(), "seed {}", seed);
                    }
                    assert!(grid.is_full());
                    assert_eq!(resolver.state(), CascadeState::Idle);
                }
            }
        }
    }
}
