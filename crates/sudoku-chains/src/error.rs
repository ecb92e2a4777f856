//! Error types for chain reconstruction.

use thiserror::Error;

use crate::solver::table_engine::{Entry, TableId};

/// Result type for chain reconstruction.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Internal inconsistencies found while walking implication tables.
///
/// None of these abort a search: the affected step is logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// A back-reference points outside its table's log.
    #[error("missing back-reference: {table} has no entry {index}")]
    MissingBackref { table: TableId, index: usize },

    /// An imported entry names a table that does not exist.
    #[error("no implication table for {node}")]
    DanglingTable { node: Entry },

    /// The walk did not reach a premise within the step limit.
    #[error("chain walk exceeded {limit} steps")]
    WalkLimit { limit: usize },

    /// A non-premise entry carries no back-reference at all.
    #[error("chain has no links")]
    EmptyChain,
}
