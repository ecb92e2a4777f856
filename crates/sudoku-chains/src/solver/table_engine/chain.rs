//! Chain reconstruction: walk back-references from a conclusion to the
//! premise of its table, jumping through imported entries with a return
//! stack, then reverse the walk into reading order.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::Entry;
use super::table::{Origin, TableId};
use super::{FillMode, Universe};
use crate::error::{ChainError, Result};
use crate::{CellSet, ChainConfig};

/// A reconstructed chain in reading order: `entries[0]` is the premise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub entries: Vec<Entry>,
    /// Side chains of a net, each ending at an entry of the main chain or
    /// an earlier branch.
    pub branches: Vec<Chain>,
}

impl Chain {
    pub fn start(&self) -> Option<&Entry> {
        self.entries.first()
    }

    pub fn end(&self) -> Option<&Entry> {
        self.entries.last()
    }

    /// Links of the main chain.
    pub fn links(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    /// Links of the main chain plus all branches.
    pub fn length(&self) -> usize {
        self.links() + self.branches.iter().map(Chain::length).sum::<usize>()
    }

    /// Uses group or locked-set nodes anywhere.
    pub fn is_grouped(&self) -> bool {
        self.entries.iter().any(|e| !e.node.is_normal())
            || self.branches.iter().any(Chain::is_grouped)
    }

    /// Every cell touched by the chain and its branches.
    pub fn cells(&self) -> CellSet {
        let own = self
            .entries
            .iter()
            .fold(CellSet::empty(), |acc, e| acc.union(&e.node.footprint()));
        self.branches.iter().fold(own, |acc, b| acc.union(&b.cells()))
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main: Vec<String> = self.entries.iter().map(Entry::to_string).collect();
        write!(f, "{}", main.join(" -> "))?;
        for branch in &self.branches {
            write!(f, " [{branch}]")?;
        }
        Ok(())
    }
}

/// Backward walk result: entries from the conclusion back to the premise.
struct Walk {
    entries: Vec<Entry>,
    branch_points: Vec<(TableId, usize)>,
}

pub(crate) struct Walker<'a> {
    universe: &'a Universe,
    max_steps: usize,
    max_branches: usize,
    reject_lassos: bool,
}

impl<'a> Walker<'a> {
    pub fn new(universe: &'a Universe, config: &ChainConfig) -> Self {
        Self {
            universe,
            max_steps: config.max_walk_steps,
            max_branches: config.max_branches,
            reject_lassos: universe.mode() == FillMode::Chains,
        }
    }

    pub fn universe(&self) -> &'a Universe {
        self.universe
    }

    /// Chain from the premise of `table` to its entry `index`.
    ///
    /// `closing` allows the last node to return to the premise's cell (loops
    /// and self-contradictions). `Ok(None)` means the walk revisited a node
    /// and was dropped.
    pub fn chain_to(&self, table: TableId, index: usize, closing: bool) -> Result<Option<Chain>> {
        let walk = self.walk(table, index, None)?;
        let mut entries = walk.entries;
        entries.reverse();
        if self.reject_lassos && is_lasso(&entries, closing) {
            return Ok(None);
        }
        let branches = self.branches(&entries, walk.branch_points)?;
        Ok(Some(Chain { entries, branches }))
    }

    fn branches(&self, main: &[Entry], points: Vec<(TableId, usize)>) -> Result<Vec<Chain>> {
        let mut known: HashSet<Entry> = main.iter().copied().collect();
        let mut visited: HashSet<(TableId, usize)> = HashSet::new();
        let mut queue: VecDeque<(TableId, usize)> = points.into();
        let mut branches = Vec::new();

        while let Some((table, index)) = queue.pop_front() {
            if branches.len() >= self.max_branches {
                break;
            }
            if !visited.insert((table, index)) {
                continue;
            }
            let walk = self.walk(table, index, Some(&known))?;
            let mut entries = walk.entries;
            if entries.len() < 2 {
                continue;
            }
            entries.reverse();
            known.extend(entries.iter().copied());
            queue.extend(walk.branch_points);
            branches.push(Chain {
                entries,
                branches: Vec::new(),
            });
        }
        Ok(branches)
    }

    /// Walk back from `table[index]` until the outermost premise, or until an
    /// entry of `stop` is reached.
    fn walk(&self, table: TableId, index: usize, stop: Option<&HashSet<Entry>>) -> Result<Walk> {
        let mut entries = Vec::new();
        let mut branch_points = Vec::new();
        let mut returns: Vec<(TableId, usize)> = Vec::new();
        let (mut t, mut i) = (table, index);
        // set after an import: the source slot holds the entry just pushed
        let mut jumped = false;

        for _ in 0..self.max_steps {
            let slot = self
                .universe
                .table(t)
                .and_then(|tab| tab.get(i))
                .ok_or(ChainError::MissingBackref { table: t, index: i })?;

            if slot.origin == Origin::Premise {
                // an inner premise equals the entry we jumped from
                if let Some((outer, via)) = returns.pop() {
                    t = outer;
                    i = via;
                    jumped = false;
                    continue;
                }
                entries.push(slot.entry);
                return Ok(Walk {
                    entries,
                    branch_points,
                });
            }

            if !jumped {
                entries.push(slot.entry);
                if stop.is_some_and(|s| s.contains(&slot.entry)) {
                    return Ok(Walk {
                        entries,
                        branch_points,
                    });
                }
            }
            jumped = false;

            match &slot.origin {
                Origin::Direct(refs) => {
                    let (&first, rest) = refs.split_first().ok_or(ChainError::EmptyChain)?;
                    branch_points.extend(rest.iter().map(|&r| (t, r)));
                    i = first;
                }
                Origin::Imported { table: src, index, via } => {
                    if self.universe.table(*src).is_none() {
                        return Err(ChainError::DanglingTable { node: slot.entry });
                    }
                    returns.push((t, *via));
                    t = *src;
                    i = *index;
                    jumped = true;
                }
                Origin::Premise => {}
            }
        }
        Err(ChainError::WalkLimit {
            limit: self.max_steps,
        })
    }
}

/// Node `k` must not overlap the footprints of nodes `0..k-1` (its direct
/// predecessor may share a cell). With `closing`, the last node may return
/// to the premise's cell.
fn is_lasso(entries: &[Entry], closing: bool) -> bool {
    let footprints: Vec<CellSet> = entries.iter().map(|e| e.node.footprint()).collect();
    let last = footprints.len().saturating_sub(1);
    let mut used = CellSet::empty();
    for k in 2..footprints.len() {
        used = used.union(&footprints[k - 2]);
        let forbidden = if closing && k == last {
            used.difference(&footprints[0])
        } else {
            used
        };
        if footprints[k].intersects(&forbidden) {
            return true;
        }
    }
    false
}
