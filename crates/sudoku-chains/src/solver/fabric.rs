//! CandidateFabric: read-only, multiply-indexed candidate state built from a Grid.
//!
//! The chaining engine never touches the `Grid` directly. Everything it needs
//! (values, candidate masks, "which cells hold digit d", house sets and
//! buddy sets) is answered here in O(1) from precomputed `CellSet`s.

use crate::{BitSet, CellSet, Grid, Position};

/// Sector index convention: 0..8 = rows, 9..17 = columns, 18..26 = boxes.
pub const SECTOR_ROW_BASE: usize = 0;
pub const SECTOR_COL_BASE: usize = 9;
pub const SECTOR_BOX_BASE: usize = 18;

/// Dual-indexed candidate state, built once per search call.
#[derive(Debug, Clone)]
pub struct CandidateFabric {
    /// Per-cell candidates (empty for placed cells)
    pub cell_cands: [BitSet; 81],
    /// Placed values (None if empty)
    pub values: [Option<u8>; 81],
    /// candidate_cells[d] = unset cells that still hold `d` (index 0 unused)
    pub candidate_cells: [CellSet; 10],
    /// Which 3 sectors each cell belongs to: [row_sector, col_sector, box_sector]
    pub cell_sectors: [[usize; 3]; 81],
    /// The 9 cells of every sector as a set
    pub sector_sets: [CellSet; 27],
    /// The 20 peers of every cell
    pub buddies: [CellSet; 81],
    /// Unset cells
    pub empty_cells: CellSet,
}

/// Convert (row, col) to linear cell index
#[inline]
pub fn cell_index(row: usize, col: usize) -> usize {
    row * 9 + col
}

/// Convert linear cell index back to (row, col)
#[inline]
pub fn cell_pos(idx: usize) -> (usize, usize) {
    (idx / 9, idx % 9)
}

/// Convert linear cell index to Position
#[inline]
pub fn idx_to_pos(idx: usize) -> Position {
    let (r, c) = cell_pos(idx);
    Position::new(r, c)
}

/// Get the 9 cell indices belonging to a sector
pub fn sector_cells(sector: usize) -> [usize; 9] {
    if sector < 9 {
        let row = sector;
        std::array::from_fn(|col| cell_index(row, col))
    } else if sector < 18 {
        let col = sector - 9;
        std::array::from_fn(|row| cell_index(row, col))
    } else {
        let box_idx = sector - 18;
        let box_row = (box_idx / 3) * 3;
        let box_col = (box_idx % 3) * 3;
        std::array::from_fn(|i| cell_index(box_row + i / 3, box_col + i % 3))
    }
}

/// Short house name used in explanations: r1..r9, c1..c9, b1..b9.
pub fn sector_name(sector: usize) -> String {
    if sector < 9 {
        format!("r{}", sector + 1)
    } else if sector < 18 {
        format!("c{}", sector - 9 + 1)
    } else {
        format!("b{}", sector - 18 + 1)
    }
}

/// `r{row}c{col}` notation for a linear cell index.
pub fn cell_name(idx: usize) -> String {
    let (r, c) = cell_pos(idx);
    format!("r{}c{}", r + 1, c + 1)
}

fn compute_cell_sectors(idx: usize) -> [usize; 3] {
    let (row, col) = cell_pos(idx);
    let box_idx = (row / 3) * 3 + col / 3;
    [
        SECTOR_ROW_BASE + row,
        SECTOR_COL_BASE + col,
        SECTOR_BOX_BASE + box_idx,
    ]
}

impl CandidateFabric {
    /// Build the fabric from a Grid snapshot.
    pub fn from_grid(grid: &Grid) -> Self {
        let mut fab = CandidateFabric {
            cell_cands: [BitSet::empty(); 81],
            values: [None; 81],
            candidate_cells: [CellSet::empty(); 10],
            cell_sectors: [[0; 3]; 81],
            sector_sets: [CellSet::empty(); 27],
            buddies: [CellSet::empty(); 81],
            empty_cells: CellSet::empty(),
        };

        // Static topology
        for (sector, set) in fab.sector_sets.iter_mut().enumerate() {
            *set = sector_cells(sector).iter().copied().collect();
        }
        for idx in 0..81 {
            let sectors = compute_cell_sectors(idx);
            fab.cell_sectors[idx] = sectors;
            let mut peers = CellSet::empty();
            for &sec in &sectors {
                peers = peers.union(&fab.sector_sets[sec]);
            }
            peers.remove(idx);
            fab.buddies[idx] = peers;
        }

        for idx in 0..81 {
            let pos = idx_to_pos(idx);
            if let Some(v) = grid.get(pos) {
                fab.values[idx] = Some(v);
                continue;
            }
            fab.empty_cells.insert(idx);
            let cands = grid.get_candidates(pos);
            fab.cell_cands[idx] = cands;
            for d in cands.iter() {
                fab.candidate_cells[d as usize].insert(idx);
            }
        }

        fab
    }

    /// Check if two distinct cells see each other (same row, col, or box)
    #[inline]
    pub fn sees(&self, a: usize, b: usize) -> bool {
        self.buddies[a].contains(b)
    }

    /// Cells that see every cell of `cells` (the cells themselves excluded).
    pub fn common_buddies(&self, cells: &CellSet) -> CellSet {
        let mut iter = cells.iter();
        let Some(first) = iter.next() else {
            return CellSet::empty();
        };
        iter.fold(self.buddies[first], |acc, c| acc.intersection(&self.buddies[c]))
            .difference(cells)
    }

    #[inline]
    pub fn has_cand(&self, idx: usize, digit: u8) -> bool {
        self.cell_cands[idx].contains(digit)
    }

    /// Cells of `sector` that still hold `digit`.
    #[inline]
    pub fn sector_candidates(&self, sector: usize, digit: u8) -> CellSet {
        self.sector_sets[sector].intersection(&self.candidate_cells[digit as usize])
    }

    #[cfg(test)]
    pub fn sector_cand_count(&self, sector: usize, digit: u8) -> u8 {
        sector_cells(sector)
            .iter()
            .filter(|&&c| self.cell_cands[c].contains(digit))
            .count() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EASY: &str =
        "530070000600195000098000060800060003400803001700020006060000280000419005000080079";

    #[test]
    fn test_cell_index_roundtrip() {
        for row in 0..9 {
            for col in 0..9 {
                let idx = cell_index(row, col);
                assert_eq!(cell_pos(idx), (row, col));
                assert_eq!(idx_to_pos(idx), Position::new(row, col));
            }
        }
    }

    #[test]
    fn test_sector_cells() {
        assert_eq!(sector_cells(0), [0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(sector_cells(9), [0, 9, 18, 27, 36, 45, 54, 63, 72]);
        assert_eq!(sector_cells(18), [0, 1, 2, 9, 10, 11, 18, 19, 20]);
        assert_eq!(sector_name(20), "b3");
        assert_eq!(cell_name(10), "r2c2");
    }

    #[test]
    fn test_fabric_from_grid() {
        let grid = Grid::from_string(EASY).unwrap();
        let fab = CandidateFabric::from_grid(&grid);

        assert_eq!(fab.values[0], Some(5));
        let idx = cell_index(0, 2);
        assert!(fab.values[idx].is_none());
        assert!(!fab.cell_cands[idx].is_empty());
        assert!(!fab.cell_cands[idx].contains(5));

        for d in 1..=9u8 {
            for sector in 0..27 {
                assert_eq!(
                    fab.sector_candidates(sector, d).len(),
                    fab.sector_cand_count(sector, d) as usize
                );
            }
        }
    }

    #[test]
    fn test_sees_and_common_buddies() {
        let grid = Grid::from_string(EASY).unwrap();
        let fab = CandidateFabric::from_grid(&grid);

        assert!(fab.sees(0, 5));
        assert!(fab.sees(0, 9));
        assert!(fab.sees(0, 10));
        assert!(!fab.sees(0, 40));
        assert!(!fab.sees(0, 0));

        // r1c1 and r1c2 share row 1 and box 1: 7 + 6 common peers
        let common = fab.common_buddies(&CellSet::from_cells(&[0, 1]));
        assert_eq!(common.len(), 13);
        assert!(!common.contains(0) && !common.contains(1));
    }
}
