//! Cascade resolution state machine
//!
//! ```text
//! Idle -> Detecting -> Clearing -> Collapsing -> Refilling -> Detecting ... -> Idle
//! ```
//!
//! Each call to [`CascadeResolver::step`] advances exactly one phase, and the
//! grid is fully consistent at every phase boundary. A presentation layer may
//! pause between steps to animate; [`CascadeResolver::run_to_idle`] simply
//! loops until the machine settles.

use tracing::{debug, warn};

use crate::core::{find_all_matches, Grid, MatchSet, TileSource};
use crate::types::EngineError;

/// Phase of the cascade loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeState {
    /// No work pending; the grid is stable.
    Idle,
    /// Next step scans the full grid for matches.
    Detecting,
    /// Next step removes the matched tiles.
    Clearing,
    /// Next step applies gravity to every column.
    Collapsing,
    /// Next step spawns tiles into the emptied cells.
    Refilling,
}

impl CascadeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeState::Idle => "idle",
            CascadeState::Detecting => "detecting",
            CascadeState::Clearing => "clearing",
            CascadeState::Collapsing => "collapsing",
            CascadeState::Refilling => "refilling",
        }
    }
}

/// Summary of one cascade run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Detection passes that found matches (one per clear/collapse/refill cycle).
    pub passes: u32,
    /// Total tiles removed across all passes.
    pub cleared: u32,
    /// Set when the pass bound was hit and the grid was force-settled.
    pub fault: Option<EngineError>,
}

/// Drives detect -> clear -> collapse -> refill until no match remains.
#[derive(Debug, Clone)]
pub struct CascadeResolver {
    state: CascadeState,
    limit: u32,
    pending: MatchSet,
    report: CascadeReport,
}

impl CascadeResolver {
    /// `limit` bounds the number of matching detection passes per cascade.
    pub fn new(limit: u32) -> Self {
        Self {
            state: CascadeState::Idle,
            limit: limit.max(1),
            pending: MatchSet::new(),
            report: CascadeReport::default(),
        }
    }

    pub fn state(&self) -> CascadeState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == CascadeState::Idle
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Report of the current (or last finished) cascade.
    pub fn report(&self) -> CascadeReport {
        self.report
    }

    /// Matches queued for the next clearing step.
    pub fn pending(&self) -> &MatchSet {
        &self.pending
    }

    /// Enter `Detecting` with a fresh report. No effect while a cascade runs.
    pub fn begin(&mut self) {
        if self.state != CascadeState::Idle {
            return;
        }
        self.state = CascadeState::Detecting;
        self.pending = MatchSet::new();
        self.report = CascadeReport::default();
    }

    /// Advance one phase and return the new state.
    pub fn step<S: TileSource + ?Sized>(&mut self, grid: &mut Grid, source: &mut S) -> CascadeState {
        let next = match self.state {
            CascadeState::Idle => CascadeState::Idle,
            CascadeState::Detecting => self.detect(grid),
            CascadeState::Clearing => {
                let matched = std::mem::take(&mut self.pending);
                let removed = grid.clear_cells(matched);
                self.report.cleared += removed as u32;
                CascadeState::Collapsing
            }
            CascadeState::Collapsing => {
                let moved = grid.collapse_all();
                debug!(moved, "collapsed columns");
                CascadeState::Refilling
            }
            CascadeState::Refilling => {
                let spawned = grid.refill_empties(source);
                debug!(spawned, "refilled empty cells");
                CascadeState::Detecting
            }
        };
        self.state = next;
        next
    }

    fn detect(&mut self, grid: &Grid) -> CascadeState {
        let matches = find_all_matches(grid);
        if matches.is_empty() {
            debug!(
                passes = self.report.passes,
                cleared = self.report.cleared,
                "cascade settled"
            );
            return CascadeState::Idle;
        }

        if self.report.passes >= self.limit {
            let fault = EngineError::CascadeIterationLimitExceeded { limit: self.limit };
            warn!(
                limit = self.limit,
                remaining = matches.len(),
                "cascade pass limit reached; forcing settle"
            );
            self.report.fault = Some(fault);
            return CascadeState::Idle;
        }

        self.report.passes += 1;
        debug!(pass = self.report.passes, matched = matches.len(), "matches detected");
        self.pending = matches;
        CascadeState::Clearing
    }

    /// Step until `Idle` and return the report.
    pub fn run_to_idle<S: TileSource + ?Sized>(
        &mut self,
        grid: &mut Grid,
        source: &mut S,
    ) -> CascadeReport {
        while self.step(grid, source) != CascadeState::Idle {}
        self.report
    }

    /// `begin` followed by `run_to_idle`.
    pub fn resolve<S: TileSource + ?Sized>(&mut self, grid: &mut Grid, source: &mut S) -> CascadeReport {
        self.begin();
        self.run_to_idle(grid, source)
    }
}
