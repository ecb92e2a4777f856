//! Scratch board for net-mode look-ahead.
//!
//! A `ScratchBoard` is an owned copy of the candidate state that one premise
//! may freely mutate. It only knows the two single techniques (naked and
//! hidden single); everything smarter belongs to the implication tables.

use super::fabric::CandidateFabric;
use crate::BitSet;

/// A single found on the scratch board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Single {
    /// Only one candidate left in `cell`.
    Naked { cell: usize, digit: u8 },
    /// `digit` has only one place left in `sector`.
    Hidden { cell: usize, digit: u8, sector: usize },
}

impl Single {
    pub fn cell(&self) -> usize {
        match *self {
            Single::Naked { cell, .. } | Single::Hidden { cell, .. } => cell,
        }
    }

    pub fn digit(&self) -> u8 {
        match *self {
            Single::Naked { digit, .. } | Single::Hidden { digit, .. } => digit,
        }
    }
}

/// Owned, mutable copy of values and candidates; topology comes from the fabric.
#[derive(Clone)]
pub struct ScratchBoard<'a> {
    fab: &'a CandidateFabric,
    values: [u8; 81],
    cands: [BitSet; 81],
}

impl<'a> ScratchBoard<'a> {
    pub fn new(fab: &'a CandidateFabric) -> Self {
        Self {
            fab,
            values: std::array::from_fn(|i| fab.values[i].unwrap_or(0)),
            cands: fab.cell_cands,
        }
    }

    pub fn value(&self, cell: usize) -> u8 {
        self.values[cell]
    }

    pub fn candidates(&self, cell: usize) -> BitSet {
        self.cands[cell]
    }

    /// Place `digit` in `cell`. Returns every (cell, digit) candidate removed
    /// by the placement: the other candidates of the cell first, then the
    /// digit from all peers, in ascending cell order.
    pub fn set_value(&mut self, cell: usize, digit: u8) -> Vec<(usize, u8)> {
        let mut removed = Vec::new();
        for d in self.cands[cell].iter() {
            if d != digit {
                removed.push((cell, d));
            }
        }
        self.cands[cell] = BitSet::empty();
        self.values[cell] = digit;
        for peer in self.fab.buddies[cell].iter() {
            if self.values[peer] == 0 && self.cands[peer].contains(digit) {
                self.cands[peer].remove(digit);
                removed.push((peer, digit));
            }
        }
        removed
    }

    /// Remove a candidate; false if it was not present.
    pub fn remove_candidate(&mut self, cell: usize, digit: u8) -> bool {
        if self.values[cell] != 0 || !self.cands[cell].contains(digit) {
            return false;
        }
        self.cands[cell].remove(digit);
        true
    }

    pub fn naked_singles(&self) -> Vec<Single> {
        (0..81)
            .filter(|&c| self.values[c] == 0 && self.cands[c].count() == 1)
            .filter_map(|c| {
                self.cands[c]
                    .first()
                    .map(|digit| Single::Naked { cell: c, digit })
            })
            .collect()
    }

    pub fn hidden_singles(&self) -> Vec<Single> {
        let mut found = Vec::new();
        for sector in 0..27 {
            let cells = self.fab.sector_sets[sector];
            for digit in 1..=9u8 {
                if cells.iter().any(|c| self.values[c] == digit) {
                    continue;
                }
                let mut holders = cells
                    .iter()
                    .filter(|&c| self.values[c] == 0 && self.cands[c].contains(digit));
                if let (Some(cell), None) = (holders.next(), holders.next()) {
                    if self.cands[cell].count() > 1 {
                        found.push(Single::Hidden { cell, digit, sector });
                    }
                }
            }
        }
        found
    }

    /// A cell without candidates, a digit without a place in a house, or the
    /// same digit twice in a house.
    pub fn has_contradiction(&self) -> bool {
        if (0..81).any(|c| self.values[c] == 0 && self.cands[c].is_empty()) {
            return true;
        }
        for sector in 0..27 {
            let cells = self.fab.sector_sets[sector];
            for digit in 1..=9u8 {
                let placed = cells.iter().filter(|&c| self.values[c] == digit).count();
                if placed > 1 {
                    return true;
                }
                let open = cells
                    .iter()
                    .any(|c| self.values[c] == 0 && self.cands[c].contains(digit));
                if placed == 0 && !open {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Grid;

    const EASY: &str =
        "530070000600195000098000060800060003400803001700020006060000280000419005000080079";

    #[test]
    fn test_set_value_reports_removals() {
        let grid = Grid::from_string(EASY).unwrap();
        let fab = CandidateFabric::from_grid(&grid);
        let mut board = ScratchBoard::new(&fab);
        let cell = 2; // r1c3
        let digit = fab.cell_cands[cell].first().unwrap();
        let removed = board.set_value(cell, digit);
        assert_eq!(board.value(cell), digit);
        let own = fab.cell_cands[cell].count() as usize - 1;
        assert!(removed[..own].iter().all(|&(c, d)| c == cell && d != digit));
        assert!(removed[own..].iter().all(|&(c, d)| d == digit && fab.sees(c, cell)));
    }

    #[test]
    fn test_singles_on_fresh_board() {
        let grid = Grid::from_string(EASY).unwrap();
        let fab = CandidateFabric::from_grid(&grid);
        let board = ScratchBoard::new(&fab);
        // This puzzle starts with naked singles available
        assert!(!board.naked_singles().is_empty());
        assert!(!board.has_contradiction());
        for single in board.hidden_singles() {
            assert!(fab.has_cand(single.cell(), single.digit()));
        }
    }

    #[test]
    fn test_contradiction_detected() {
        let grid = Grid::from_string(EASY).unwrap();
        let fab = CandidateFabric::from_grid(&grid);
        let mut board = ScratchBoard::new(&fab);
        let cell = 2;
        for d in fab.cell_cands[cell].iter() {
            board.remove_candidate(cell, d);
        }
        assert!(board.has_contradiction());
    }
}
