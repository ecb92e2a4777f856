//! Logical nodes of the implication tables and their signed form (`Entry`).
//!
//! Identity is structural: two entries are equal when they name the same
//! cells, the same candidate and the same polarity, no matter how they were
//! derived. That makes `Entry` usable as a hash key in every table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::solver::fabric::cell_name;
use crate::CellSet;

/// Polarity of a node: the fact holds (`On`) or is excluded (`Off`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Polarity {
    On,
    Off,
}

impl Polarity {
    pub fn flip(self) -> Self {
        match self {
            Polarity::On => Polarity::Off,
            Polarity::Off => Polarity::On,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Node {
    /// Candidate `cand` in one cell.
    Normal { cell: u8, cand: u8 },
    /// Candidate `cand` somewhere in 2-3 cells of one block/line intersection.
    Group { cells: CellSet, cand: u8 },
    /// Almost locked set `cells`, entered through `cand`. `entry_cell` is the
    /// lowest member holding `cand`. Only the `Off` polarity ("`cand` is
    /// absent from the set, so the rest is locked") is ever used.
    LockedSet { cells: CellSet, entry_cell: u8, cand: u8 },
}

impl Node {
    pub fn normal(cell: usize, cand: u8) -> Self {
        Node::Normal {
            cell: cell as u8,
            cand,
        }
    }

    pub fn cand(&self) -> u8 {
        match *self {
            Node::Normal { cand, .. } | Node::Group { cand, .. } | Node::LockedSet { cand, .. } => {
                cand
            }
        }
    }

    /// The cell of a normal node.
    pub fn cell(&self) -> Option<usize> {
        match *self {
            Node::Normal { cell, .. } => Some(cell as usize),
            _ => None,
        }
    }

    /// Cells occupied by the node.
    pub fn footprint(&self) -> CellSet {
        match *self {
            Node::Normal { cell, .. } => CellSet::single(cell as usize),
            Node::Group { cells, .. } | Node::LockedSet { cells, .. } => cells,
        }
    }

    /// Simpler kinds rank lower: Normal < Group < LockedSet.
    pub fn kind_rank(&self) -> u8 {
        match self {
            Node::Normal { .. } => 0,
            Node::Group { .. } => 1,
            Node::LockedSet { .. } => 2,
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Node::Normal { .. })
    }
}

fn cells_name(cells: &CellSet) -> String {
    let names: Vec<String> = cells.iter().map(cell_name).collect();
    names.join(",")
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Normal { cell, .. } => write!(f, "{}", cell_name(*cell as usize)),
            Node::Group { cells, .. } => write!(f, "[{}]", cells_name(cells)),
            Node::LockedSet { cells, .. } => write!(f, "ALS[{}]", cells_name(cells)),
        }
    }
}

/// A signed node: one premise or conclusion of an implication table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entry {
    pub node: Node,
    pub polarity: Polarity,
}

impl Entry {
    pub fn new(node: Node, polarity: Polarity) -> Self {
        Self { node, polarity }
    }

    pub fn on(cell: usize, cand: u8) -> Self {
        Self::new(Node::normal(cell, cand), Polarity::On)
    }

    pub fn off(cell: usize, cand: u8) -> Self {
        Self::new(Node::normal(cell, cand), Polarity::Off)
    }

    pub fn is_on(&self) -> bool {
        self.polarity == Polarity::On
    }

    pub fn complement(&self) -> Self {
        Self::new(self.node, self.polarity.flip())
    }

    pub fn is_complement_of(&self, other: &Entry) -> bool {
        self.node == other.node && self.polarity != other.polarity
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.is_on() { "=" } else { "<>" };
        write!(f, "{}{}{}", self.node, op, self.node.cand())
    }
}
