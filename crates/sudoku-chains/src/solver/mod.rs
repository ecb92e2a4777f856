//! Solver orchestrator.
//!
//! `ChainSolver` fills the implication tables of a board, expands them and
//! mines nice loops, AICs, forcing chains and forcing nets from them. Filled
//! tables are cached per board version and fill mode; an idle cache is
//! released by [`ChainSolver::evict_idle`].

mod types;
pub(crate) mod fabric;
pub(crate) mod explain;
pub(crate) mod backtrack;
mod scratch;
mod group_nodes;
mod als_engine;
pub(crate) mod table_engine;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::Grid;
use explain::StepCollector;
use fabric::CandidateFabric;
use table_engine::{find_forcing_steps, find_loops, FillMode, Universe, Walker};

pub use explain::{ChainStep, ForcingSource, InferenceResult, StepSource};
pub use types::{ChainConfig, Hint, HintType, Technique};

/// Steps found by one search, in presentation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub steps: Vec<ChainStep>,
    /// Some implication log hit `max_table_size`; deductions needing the
    /// dropped entries were not found.
    pub truncated: bool,
}

impl SearchResult {
    pub fn first(&self) -> Option<&ChainStep> {
        self.steps.first()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

struct CachedTables {
    version: u64,
    universe: Universe,
}

struct EngineState {
    cache: HashMap<FillMode, CachedTables>,
    last_used: Instant,
}

/// Chaining solver. All searches on one instance are serialized by an
/// internal lock, so a shared `Arc<ChainSolver>` is safe to use from
/// several threads.
pub struct ChainSolver {
    config: ChainConfig,
    state: Mutex<EngineState>,
}

impl Default for ChainSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainSolver {
    /// Create a solver with group and locked-set nodes enabled.
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default())
    }

    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            config,
            state: Mutex::new(EngineState {
                cache: HashMap::new(),
                last_used: Instant::now(),
            }),
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Simplest nice loop or AIC, if any.
    pub fn find_loops_and_chains(&self, grid: &Grid) -> Option<ChainStep> {
        self.find_all_loops_and_chains(grid).steps.into_iter().next()
    }

    /// Every nice loop and AIC, best first.
    pub fn find_all_loops_and_chains(&self, grid: &Grid) -> SearchResult {
        self.search(grid, FillMode::Chains, |walker, fab, collector| {
            find_loops(walker, fab, collector)
        })
    }

    /// Contradiction and verity forcing chains.
    pub fn find_forcing_chains(&self, grid: &Grid) -> SearchResult {
        self.search(grid, FillMode::Chains, |walker, fab, collector| {
            find_forcing_steps(walker, fab, collector)
        })
    }

    /// Contradiction and verity forcing nets (singles look-ahead).
    pub fn find_forcing_nets(&self, grid: &Grid) -> SearchResult {
        self.search(grid, FillMode::Nets, |walker, fab, collector| {
            find_forcing_steps(walker, fab, collector)
        })
    }

    /// First conclusion of the simplest step: loops and AICs before forcing
    /// chains before forcing nets.
    pub fn get_hint(&self, grid: &Grid) -> Option<Hint> {
        let step = self
            .find_loops_and_chains(grid)
            .or_else(|| self.find_forcing_chains(grid).steps.into_iter().next())
            .or_else(|| self.find_forcing_nets(grid).steps.into_iter().next())?;
        step.to_hints().into_iter().next()
    }

    /// Solve the puzzle, returning the solved grid if successful.
    pub fn solve(&self, grid: &Grid) -> Option<Grid> {
        let mut working = grid.deep_clone();
        working.recalculate_candidates();
        if backtrack::solve_recursive(&mut working) {
            Some(working)
        } else {
            None
        }
    }

    /// Check if the puzzle has exactly one solution.
    pub fn has_unique_solution(&self, grid: &Grid) -> bool {
        backtrack::count_solutions(grid, 2) == 1
    }

    /// Drop the cached tables if the solver has been idle for longer than
    /// `idle_timeout`. Returns whether anything was released.
    pub fn evict_idle(&self) -> bool {
        let mut state = self.lock();
        if state.cache.is_empty() || state.last_used.elapsed() < self.config.idle_timeout {
            return false;
        }
        state.cache.clear();
        tracing::debug!("idle implication tables released");
        true
    }

    pub fn clear_cache(&self) {
        self.lock().cache.clear();
    }

    /// Start a background thread calling [`ChainSolver::evict_idle`] every
    /// `period`. The thread ends once the last `Arc` to the solver is
    /// dropped.
    pub fn spawn_idle_eviction(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let solver = Arc::downgrade(self);
        thread::spawn(move || loop {
            thread::sleep(period);
            match solver.upgrade() {
                Some(solver) => {
                    solver.evict_idle();
                }
                None => break,
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn search<F>(&self, grid: &Grid, mode: FillMode, mine: F) -> SearchResult
    where
        F: FnOnce(&Walker<'_>, &CandidateFabric, &mut StepCollector),
    {
        let mut state = self.lock();
        state.last_used = Instant::now();
        let fab = CandidateFabric::from_grid(grid);
        let version = grid.version();

        let mut universe = match state.cache.get(&mode) {
            Some(cached) if cached.version == version => {
                tracing::trace!(version, ?mode, "implication table cache hit");
                cached.universe.clone()
            }
            _ => {
                tracing::trace!(version, ?mode, "implication table cache miss");
                let universe = Universe::build(&fab, &self.config, mode);
                state.cache.insert(
                    mode,
                    CachedTables {
                        version,
                        universe: universe.clone(),
                    },
                );
                universe
            }
        };
        universe.expand();

        let walker = Walker::new(&universe, &self.config);
        let mut collector = StepCollector::new();
        mine(&walker, &fab, &mut collector);
        let truncated = universe.is_truncated();
        let steps = collector.into_sorted();
        tracing::debug!(?mode, steps = steps.len(), truncated, "chain search finished");
        SearchResult { steps, truncated }
    }
}
