//! Implication-table chaining for classic Sudoku.
//!
//! For every candidate of a board the engine records what follows from
//! setting it (`=`) and from removing it (`<>`), expands those records
//! transitively and mines them for nice loops, alternating inference chains,
//! forcing chains and forcing nets. Every step comes with the chains proving
//! it.
//!
//! ```no_run
//! use sudoku_chains::{ChainSolver, Grid};
//!
//! let grid = Grid::from_string(
//!     "000704005020010070000080002090006250600070008053200010400090000030060090200301000",
//! )
//! .unwrap();
//! let solver = ChainSolver::new();
//! for step in solver.find_all_loops_and_chains(&grid).steps {
//!     println!("{}", step.render_explanation());
//! }
//! ```

mod bitset;
mod error;
mod grid;
mod solver;

pub use bitset::{BitSet, CellSet};
pub use error::{ChainError, Result};
pub use grid::{Cell, Grid, Position};
pub use solver::table_engine::{Chain, Entry, Node, Polarity, TableId};
pub use solver::{
    ChainConfig, ChainSolver, ChainStep, ForcingSource, Hint, HintType, InferenceResult,
    SearchResult, StepSource, Technique,
};
