//! Implication-table engine.
//!
//! For every candidate of every empty cell two tables are built: one for the
//! premise "cell = cand" (ON) and one for "cell <> cand" (OFF). Each table
//! logs what its premise forces, with back-references that let a chain be
//! walked back to the premise. Group and locked-set nodes get their own
//! extended tables and are cross-linked into the normal ones.
//!
//! Pipeline:
//!   1. fill      - direct consequences (chain mode) or singles look-ahead (net mode)
//!   2. augment   - group nodes and almost locked sets
//!   3. expand    - import the tables of every implied entry (transitive closure)
//!   4. mine      - loops/AICs, contradictions and verities
//!   5. rebuild   - walk back-references into printable chains

mod augment;
mod chain;
mod expand;
mod fill;
mod loops;
mod mining;
mod node;
mod table;

use std::collections::HashMap;

pub use chain::Chain;
pub use node::{Entry, Node, Polarity};
pub use table::TableId;

use table::TableEntry;

pub(crate) use chain::Walker;
pub(crate) use loops::find_loops;
pub(crate) use mining::find_forcing_steps;

use super::fabric::CandidateFabric;
use crate::ChainConfig;

/// How premise tables are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    /// Direct strong/weak links only.
    Chains,
    /// Singles look-ahead on a scratch board.
    Nets,
}

/// All implication tables of one board state.
#[derive(Debug, Clone)]
pub struct Universe {
    mode: FillMode,
    on: Vec<Option<TableEntry>>,
    off: Vec<Option<TableEntry>>,
    extended: Vec<Option<TableEntry>>,
    extended_index: HashMap<Entry, usize>,
    expanded: bool,
}

impl Universe {
    fn empty(mode: FillMode) -> Self {
        Self {
            mode,
            on: vec![None; 810],
            off: vec![None; 810],
            extended: Vec::new(),
            extended_index: HashMap::new(),
            expanded: false,
        }
    }

    /// Fill and augment the tables for `fab`. Expansion is a separate step so
    /// the unexpanded universe can be cached.
    pub fn build(fab: &CandidateFabric, config: &ChainConfig, mode: FillMode) -> Self {
        let mut universe = Self::empty(mode);
        match mode {
            FillMode::Chains => fill::fill_chain_tables(&mut universe, fab, config.max_table_size),
            FillMode::Nets => fill::fill_net_tables(
                &mut universe,
                fab,
                config.max_table_size,
                config.look_ahead_rounds,
            ),
        }
        if config.with_group_nodes {
            augment::add_group_nodes(&mut universe, fab, config.max_table_size);
        }
        if config.with_als_nodes {
            augment::add_als_nodes(&mut universe, fab, config);
        }
        tracing::debug!(
            ?mode,
            extended = universe.extended.len(),
            "implication tables filled"
        );
        universe
    }

    pub fn mode(&self) -> FillMode {
        self.mode
    }

    #[cfg(test)]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn table(&self, id: TableId) -> Option<&TableEntry> {
        match id {
            TableId::On(k) => self.on.get(k)?.as_ref(),
            TableId::Off(k) => self.off.get(k)?.as_ref(),
            TableId::Extended(i) => self.extended.get(i)?.as_ref(),
        }
    }

    pub fn table_mut(&mut self, id: TableId) -> Option<&mut TableEntry> {
        match id {
            TableId::On(k) => self.on.get_mut(k)?.as_mut(),
            TableId::Off(k) => self.off.get_mut(k)?.as_mut(),
            TableId::Extended(i) => self.extended.get_mut(i)?.as_mut(),
        }
    }

    #[cfg(test)]
    pub fn on_table(&self, cell: usize, cand: u8) -> Option<&TableEntry> {
        self.table(TableId::On(TableId::key(cell, cand)))
    }

    #[cfg(test)]
    pub fn off_table(&self, cell: usize, cand: u8) -> Option<&TableEntry> {
        self.table(TableId::Off(TableId::key(cell, cand)))
    }

    /// The table whose premise is `entry`.
    pub fn table_for(&self, entry: &Entry) -> Option<TableId> {
        let id = match entry.node {
            Node::Normal { cell, cand } => {
                let key = TableId::key(cell as usize, cand);
                if entry.is_on() {
                    TableId::On(key)
                } else {
                    TableId::Off(key)
                }
            }
            _ => TableId::Extended(*self.extended_index.get(entry)?),
        };
        self.table(id).map(|_| id)
    }

    /// Every table id, normal tables first (ON then OFF, ascending key),
    /// then the extended tables in creation order.
    pub fn table_ids(&self) -> Vec<TableId> {
        let on = (0..self.on.len()).filter(|&k| self.on[k].is_some()).map(TableId::On);
        let off = (0..self.off.len()).filter(|&k| self.off[k].is_some()).map(TableId::Off);
        let ext = (0..self.extended.len()).map(TableId::Extended);
        on.chain(off).chain(ext).collect()
    }

    /// True when any table dropped entries because it was full.
    pub fn is_truncated(&self) -> bool {
        self.on
            .iter()
            .chain(self.off.iter())
            .chain(self.extended.iter())
            .flatten()
            .any(TableEntry::is_truncated)
    }

    fn insert_normal(&mut self, table: TableEntry) {
        let premise = table.premise();
        if let Node::Normal { cell, cand } = premise.node {
            let key = TableId::key(cell as usize, cand);
            let slot = if premise.is_on() {
                &mut self.on[key]
            } else {
                &mut self.off[key]
            };
            *slot = Some(table);
        }
    }

    fn insert_extended(&mut self, table: TableEntry) -> usize {
        let premise = table.premise();
        if let Some(&existing) = self.extended_index.get(&premise) {
            return existing;
        }
        let index = self.extended.len();
        self.extended_index.insert(premise, index);
        self.extended.push(Some(table));
        index
    }

    fn take(&mut self, id: TableId) -> Option<TableEntry> {
        match id {
            TableId::On(k) => self.on.get_mut(k)?.take(),
            TableId::Off(k) => self.off.get_mut(k)?.take(),
            TableId::Extended(i) => self.extended.get_mut(i)?.take(),
        }
    }

    fn restore(&mut self, id: TableId, table: TableEntry) {
        let slot = match id {
            TableId::On(k) => self.on.get_mut(k),
            TableId::Off(k) => self.off.get_mut(k),
            TableId::Extended(i) => self.extended.get_mut(i),
        };
        if let Some(slot) = slot {
            *slot = Some(table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Grid;

    const EASY: &str =
        "530070000600195000098000060800060003400803001700020006060000280000419005000080079";

    #[test]
    fn test_one_table_pair_per_candidate() {
        let grid = Grid::from_string(EASY).unwrap();
        let fab = CandidateFabric::from_grid(&grid);
        let universe = Universe::build(&fab, &ChainConfig::chains_only(), FillMode::Chains);
        let expected: usize = fab
            .empty_cells
            .iter()
            .map(|c| fab.cell_cands[c].count() as usize)
            .sum();
        let ids = universe.table_ids();
        assert_eq!(ids.len(), expected * 2);
        for cell in fab.empty_cells.iter() {
            for cand in fab.cell_cands[cell].iter() {
                let on = universe.on_table(cell, cand).unwrap();
                let off = universe.off_table(cell, cand).unwrap();
                assert_eq!(on.premise(), Entry::on(cell, cand));
                assert_eq!(off.premise(), Entry::off(cell, cand));
            }
        }
        assert!(universe.on_table(0, 5).is_none());
    }

    #[test]
    fn test_table_for_resolves_extended_premises() {
        let grid = Grid::from_string(EASY).unwrap();
        let fab = CandidateFabric::from_grid(&grid);
        let universe = Universe::build(&fab, &ChainConfig::default(), FillMode::Chains);
        for id in universe.table_ids() {
            let premise = universe.table(id).unwrap().premise();
            assert_eq!(universe.table_for(&premise), Some(id));
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let grid = Grid::from_string(EASY).unwrap();
        let fab = CandidateFabric::from_grid(&grid);
        for mode in [FillMode::Chains, FillMode::Nets] {
            let a = Universe::build(&fab, &ChainConfig::default(), mode);
            let b = Universe::build(&fab, &ChainConfig::default(), mode);
            assert_eq!(a.table_ids(), b.table_ids());
            for id in a.table_ids() {
                let (ta, tb) = (a.table(id).unwrap(), b.table(id).unwrap());
                assert_eq!(ta.entries(), tb.entries());
                for d in 1..=9 {
                    assert_eq!(ta.on_set(d), tb.on_set(d));
                    assert_eq!(ta.off_set(d), tb.off_set(d));
                }
            }
        }
    }
}
