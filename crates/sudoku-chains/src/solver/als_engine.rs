//! ALS catalog: Almost Locked Sets enumerated per sector.
//!
//! The chaining engine treats every ALS of size >= 2 as a potential
//! locked-set node. This module only enumerates the sets and precomputes the
//! per-candidate views the augmentation step needs.

use std::collections::HashSet;

use super::fabric::{sector_cells, CandidateFabric};
use crate::{BitSet, CellSet};

/// An Almost Locked Set: N cells with N+1 candidates in a single sector.
#[derive(Debug, Clone)]
pub struct Als {
    pub cells: CellSet,
    /// Union of the member candidates
    pub candidates: BitSet,
    /// cand_cells[d] = member cells holding `d`
    pub cand_cells: [CellSet; 10],
    /// buddies_per_cand[d] = unset non-member cells seeing every member holding `d`
    pub buddies_per_cand: [CellSet; 10],
    /// Extra chain length charged when a chain passes through the set
    pub penalty: usize,
}

impl Als {
    fn new(fab: &CandidateFabric, cells: CellSet, candidates: BitSet) -> Self {
        let mut cand_cells = [CellSet::empty(); 10];
        let mut buddies_per_cand = [CellSet::empty(); 10];
        for d in candidates.iter() {
            let holders = cells.intersection(&fab.candidate_cells[d as usize]);
            cand_cells[d as usize] = holders;
            buddies_per_cand[d as usize] = fab
                .common_buddies(&holders)
                .intersection(&fab.empty_cells)
                .difference(&cells);
        }
        Als {
            cells,
            candidates,
            cand_cells,
            buddies_per_cand,
            penalty: cells.len().saturating_sub(1),
        }
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }
}

/// Enumerate all ALS in the grid (sizes 1..=max_size cells), deduplicated by
/// cell set and ordered by sector, then size, then subset order.
pub fn enumerate_als(fab: &CandidateFabric, max_size: usize) -> Vec<Als> {
    let mut result = Vec::new();
    let mut seen: HashSet<CellSet> = HashSet::new();

    for sector in 0..27 {
        let empty: Vec<usize> = sector_cells(sector)
            .iter()
            .filter(|&&c| fab.values[c].is_none())
            .copied()
            .collect();

        // ALS of size 1: bivalue cell
        for &c in &empty {
            if fab.cell_cands[c].count() == 2 && seen.insert(CellSet::single(c)) {
                result.push(Als::new(fab, CellSet::single(c), fab.cell_cands[c]));
            }
        }

        // ALS of size 2..=max_size using Gosper's hack for subset enumeration
        for n in 2..=empty.len().min(max_size) {
            let mask_limit = 1u32 << empty.len();
            let mut set = (1u32 << n) - 1;
            while set < mask_limit {
                let mut cells = CellSet::empty();
                let mut union = BitSet::empty();
                for (bit, &empty_cell) in empty.iter().enumerate() {
                    if set & (1 << bit) != 0 {
                        cells.insert(empty_cell);
                        union = union.union(&fab.cell_cands[empty_cell]);
                    }
                }

                if union.count() == (n + 1) as u32 && seen.insert(cells) {
                    result.push(Als::new(fab, cells, union));
                }

                // Gosper's hack: next subset of same size
                let c = set & (!set).wrapping_add(1);
                let r = set + c;
                set = (((r ^ set) >> 2) / c) | r;
            }
        }
    }
    result
}
