//! One implication table: everything a single premise forces.
//!
//! The log is append-only apart from [`TableEntry::replace`], which swaps the
//! derivation of an existing entry for a shorter one found during expansion.
//! Normal entries are mirrored into per-candidate `on_sets`/`off_sets` so the
//! miners can intersect tables with plain set operations.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::{Entry, Node};
use crate::solver::fabric::cell_name;
use crate::CellSet;

/// Maximum number of direct back-references kept per entry.
pub const MAX_BACKREFS: usize = 5;

/// Address of a table inside the table universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TableId {
    /// Premise `cell = cand`, keyed `cell * 10 + cand`.
    On(usize),
    /// Premise `cell <> cand`, keyed `cell * 10 + cand`.
    Off(usize),
    /// Group or locked-set premise, index into the extended list.
    Extended(usize),
}

impl TableId {
    pub fn key(cell: usize, cand: u8) -> usize {
        cell * 10 + cand as usize
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TableId::On(k) => write!(f, "on-table {}={}", cell_name(k / 10), k % 10),
            TableId::Off(k) => write!(f, "off-table {}<>{}", cell_name(k / 10), k % 10),
            TableId::Extended(i) => write!(f, "extended table #{i}"),
        }
    }
}

/// How an entry got into its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Index 0 of every table.
    Premise,
    /// Derived inside this table from the listed entries (1..=MAX_BACKREFS).
    /// More than one reference makes the derivation a net branch point.
    Direct(Vec<usize>),
    /// Copied from `table[index]` while expanding this table's entry `via`,
    /// whose node is the premise of `table`.
    Imported { table: TableId, index: usize, via: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub entry: Entry,
    pub origin: Origin,
    /// Number of links from the premise.
    pub distance: usize,
    /// Set once this entry's own table has been merged in.
    pub expanded: bool,
}

#[derive(Debug, Clone)]
pub struct TableEntry {
    log: Vec<LogEntry>,
    index_of: HashMap<Entry, usize>,
    on_sets: [CellSet; 10],
    off_sets: [CellSet; 10],
    capacity: usize,
    truncated: bool,
    closed: bool,
}

impl TableEntry {
    pub fn new(premise: Entry, capacity: usize) -> Self {
        let mut table = Self {
            log: Vec::new(),
            index_of: HashMap::new(),
            on_sets: [CellSet::empty(); 10],
            off_sets: [CellSet::empty(); 10],
            capacity: capacity.max(1),
            truncated: false,
            closed: false,
        };
        table.push(LogEntry {
            entry: premise,
            origin: Origin::Premise,
            distance: 0,
            expanded: true,
        });
        table
    }

    pub fn premise(&self) -> Entry {
        self.log[0].entry
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.log.get(index)
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn index_of(&self, entry: &Entry) -> Option<usize> {
        self.index_of.get(entry).copied()
    }

    pub fn contains(&self, entry: &Entry) -> bool {
        self.index_of.contains_key(entry)
    }

    pub fn distance(&self, index: usize) -> usize {
        self.log.get(index).map_or(usize::MAX, |e| e.distance)
    }

    /// Cells set to `cand` under this premise.
    pub fn on_set(&self, cand: u8) -> CellSet {
        self.on_sets[cand as usize]
    }

    /// Cells where `cand` is excluded under this premise.
    pub fn off_set(&self, cand: u8) -> CellSet {
        self.off_sets[cand as usize]
    }

    pub fn is_full(&self) -> bool {
        self.log.len() >= self.capacity
    }

    /// Set once an entry was dropped because the log was full.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Append a derived entry. Returns its index, or `None` when the entry is
    /// already present or the log is full.
    pub fn add(&mut self, entry: Entry, origin: Origin, distance: usize) -> Option<usize> {
        if self.index_of.contains_key(&entry) {
            return None;
        }
        if self.is_full() {
            self.truncated = true;
            return None;
        }
        Some(self.push(LogEntry {
            entry,
            origin,
            distance,
            expanded: false,
        }))
    }

    /// Append with back-references into this table, keeping at most
    /// `MAX_BACKREFS` of them.
    pub fn add_direct(
        &mut self,
        entry: Entry,
        mut refs: Vec<usize>,
        distance: usize,
    ) -> Option<usize> {
        refs.truncate(MAX_BACKREFS);
        self.add(entry, Origin::Direct(refs), distance)
    }

    /// Swap the derivation of an existing entry. The premise is never replaced.
    pub fn replace(&mut self, index: usize, origin: Origin, distance: usize) {
        if index == 0 {
            return;
        }
        if let Some(slot) = self.log.get_mut(index) {
            slot.origin = origin;
            slot.distance = distance;
        }
    }

    pub fn mark_expanded(&mut self, index: usize) {
        if let Some(slot) = self.log.get_mut(index) {
            slot.expanded = true;
        }
    }

    /// True once every entry of the log has been expanded.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    fn push(&mut self, log_entry: LogEntry) -> usize {
        let index = self.log.len();
        let entry = log_entry.entry;
        if let Node::Normal { cell, cand } = entry.node {
            let sets = if entry.is_on() {
                &mut self.on_sets
            } else {
                &mut self.off_sets
            };
            sets[cand as usize].insert(cell as usize);
        }
        self.index_of.insert(entry, index);
        self.log.push(log_entry);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premise_is_first_entry() {
        let table = TableEntry::new(Entry::on(4, 2), 10);
        assert_eq!(table.len(), 1);
        assert_eq!(table.premise(), Entry::on(4, 2));
        assert_eq!(table.distance(0), 0);
        assert!(table.on_set(2).contains(4));
    }

    #[test]
    fn test_add_mirrors_sets_and_skips_duplicates() {
        let mut table = TableEntry::new(Entry::on(0, 1), 10);
        let i = table.add_direct(Entry::off(1, 1), vec![0], 1);
        assert_eq!(i, Some(1));
        assert_eq!(table.add_direct(Entry::off(1, 1), vec![0], 1), None);
        assert!(table.off_set(1).contains(1));
        assert_eq!(table.index_of(&Entry::off(1, 1)), Some(1));
        assert!(!table.is_truncated());
    }

    #[test]
    fn test_capacity_sets_truncated() {
        let mut table = TableEntry::new(Entry::on(0, 1), 2);
        assert!(table.add_direct(Entry::off(1, 1), vec![0], 1).is_some());
        assert!(table.add_direct(Entry::off(2, 1), vec![0], 1).is_none());
        assert!(table.is_truncated());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_backrefs_capped() {
        let mut table = TableEntry::new(Entry::off(0, 1), 10);
        let i = table
            .add_direct(Entry::on(9, 3), vec![0, 0, 0, 0, 0, 0, 0], 1)
            .unwrap();
        match &table.get(i).unwrap().origin {
            Origin::Direct(refs) => assert_eq!(refs.len(), MAX_BACKREFS),
            other => panic!("unexpected origin {other:?}"),
        }
    }

    #[test]
    fn test_replace_keeps_premise() {
        let mut table = TableEntry::new(Entry::on(0, 1), 10);
        table.add_direct(Entry::off(1, 1), vec![0], 3);
        let imported = Origin::Imported {
            table: TableId::Off(12),
            index: 4,
            via: 0,
        };
        table.replace(0, imported.clone(), 5);
        assert_eq!(table.get(0).unwrap().origin, Origin::Premise);
        table.replace(1, imported.clone(), 2);
        let slot = table.get(1).unwrap();
        assert_eq!(slot.origin, imported);
        assert_eq!(slot.distance, 2);
        assert!(!slot.expanded);
    }
}
