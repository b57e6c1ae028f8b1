//! Engine facade - owns the grid and drives a whole player turn
//!
//! One click runs to completion: selection, swap evaluation and, on commit,
//! the full cascade. Events pile up in the engine's outbox until the caller
//! drains them with [`Match3Engine::take_events`].

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::cascade::{CascadeReport, CascadeResolver};
use crate::core::{find_all_matches, Grid, GridSnapshot, SeededTileSource, TileSource};
use crate::selection::{SelectionController, SelectionOutcome, SwapOutcome};
use crate::types::{ConfigError, EngineConfig, EngineError, EngineEvent, Position};

/// Result of one accepted click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Nothing was selected; the clicked tile now is.
    Selected { at: Position },
    /// The selected tile was clicked again.
    Deselected,
    /// A non-adjacent tile replaced the selection.
    Reselected { at: Position },
    /// Adjacent swap formed no run and was undone.
    Reverted,
    /// Adjacent swap formed a run; the cascade ran to idle.
    Committed(CascadeReport),
}

impl ClickOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClickOutcome::Selected { .. } => "selected",
            ClickOutcome::Deselected => "deselected",
            ClickOutcome::Reselected { .. } => "reselected",
            ClickOutcome::Reverted => "reverted",
            ClickOutcome::Committed(_) => "committed",
        }
    }
}

/// Point-in-time view of the engine for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub grid: GridSnapshot,
    pub selected: Option<Position>,
    /// No run of three remains on the board.
    pub settled: bool,
    pub committed_swaps: u32,
}

/// Deterministic match-3 engine.
#[derive(Debug, Clone)]
pub struct Match3Engine<S: TileSource = SeededTileSource> {
    config: EngineConfig,
    grid: Grid,
    source: S,
    selection: SelectionController,
    resolver: CascadeResolver,
    events: Vec<EngineEvent>,
    last_fault: Option<EngineError>,
    committed_swaps: u32,
}

impl Match3Engine<SeededTileSource> {
    /// Build an engine with the default seeded source.
    ///
    /// Without `config.seed` the source is seeded from the system clock.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(clock_seed);
        debug!(seed, "seeding tile source");
        let source = SeededTileSource::new(config.tile_kinds, seed);
        Self::with_source(config, source)
    }
}

impl<S: TileSource> Match3Engine<S> {
    /// Build an engine around any tile source; generates a fresh grid.
    pub fn with_source(config: EngineConfig, mut source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        check_source(&config, &source)?;
        let grid = Grid::generate(config.width, config.height, &mut source);
        Ok(Self::assemble(config, grid, source))
    }

    /// Build an engine around an existing grid.
    ///
    /// The grid's dimensions and alphabet override the ones in `config`.
    pub fn from_grid(mut config: EngineConfig, grid: Grid, source: S) -> Result<Self, ConfigError> {
        config.width = grid.width();
        config.height = grid.height();
        config.tile_kinds = grid.kinds();
        config.validate()?;
        check_source(&config, &source)?;
        Ok(Self::assemble(config, grid, source))
    }

    fn assemble(config: EngineConfig, mut grid: Grid, source: S) -> Self {
        let events = grid.take_events();
        let resolver = CascadeResolver::new(config.cascade_limit());
        let mut engine = Self {
            config,
            grid,
            source,
            selection: SelectionController::new(),
            resolver,
            events,
            last_fault: None,
            committed_swaps: 0,
        };

        if engine.config.settle_initial_matches && !find_all_matches(&engine.grid).is_empty() {
            debug!("clearing matches left by generation");
            engine.run_cascade();
        }
        engine
    }

    /// Handle a click on `(row, col)`.
    ///
    /// Out-of-bounds and empty cells are rejected with no state change.
    /// A cascade that hits its pass bound still returns `Committed`; the
    /// fault is in the report and in [`last_fault`](Self::last_fault).
    pub fn on_tile_clicked(&mut self, row: i32, col: i32) -> Result<ClickOutcome, EngineError> {
        let pos = self.checked_position(row, col)?;
        let outcome = self.selection.on_click(&mut self.grid, pos)?;

        let click = match outcome {
            SelectionOutcome::Selected(at) => ClickOutcome::Selected { at },
            SelectionOutcome::Deselected => ClickOutcome::Deselected,
            SelectionOutcome::Reselected(at) => ClickOutcome::Reselected { at },
            SelectionOutcome::Swapped(SwapOutcome::Reverted) => {
                self.collect_grid_events();
                ClickOutcome::Reverted
            }
            SelectionOutcome::Swapped(SwapOutcome::Committed(matched)) => {
                debug!(matched = matched.len(), "running cascade");
                self.committed_swaps += 1;
                ClickOutcome::Committed(self.run_cascade())
            }
        };
        Ok(click)
    }

    fn checked_position(&self, row: i32, col: i32) -> Result<Position, EngineError> {
        let invalid = EngineError::InvalidCoordinates { row, col };
        let r = i16::try_from(row).map_err(|_| invalid)?;
        let c = i16::try_from(col).map_err(|_| invalid)?;
        let pos = Position::new(r, c);
        if !self.grid.in_bounds(pos) {
            return Err(invalid);
        }
        Ok(pos)
    }

    fn run_cascade(&mut self) -> CascadeReport {
        let report = self.resolver.resolve(&mut self.grid, &mut self.source);
        self.collect_grid_events();
        self.events.push(EngineEvent::CascadeSettled);

        if let Some(fault) = report.fault {
            warn!(%fault, "cascade force-settled");
            self.last_fault = Some(fault);
        }
        report
    }

    fn collect_grid_events(&mut self) {
        self.events.extend(self.grid.take_events());
    }

    /// Drain every event produced since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        self.collect_grid_events();
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<Position> {
        self.selection.selected_position(&self.grid)
    }

    /// Most recent cascade fault, if any cascade ever hit its bound.
    pub fn last_fault(&self) -> Option<EngineError> {
        self.last_fault
    }

    pub fn committed_swaps(&self) -> u32 {
        self.committed_swaps
    }

    pub fn is_settled(&self) -> bool {
        self.resolver.is_idle() && find_all_matches(&self.grid).is_empty()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            grid: self.grid.snapshot(),
            selected: self.selection(),
            settled: self.is_settled(),
            committed_swaps: self.committed_swaps,
        }
    }
}

fn check_source<S: TileSource>(config: &EngineConfig, source: &S) -> Result<(), ConfigError> {
    if source.kinds() != config.tile_kinds {
        return Err(ConfigError::SourceKinds {
            expected: config.tile_kinds,
            actual: source.kinds(),
        });
    }
    Ok(())
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(1)
}
