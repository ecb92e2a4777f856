//! Board model: positions, cells with candidate masks, and the 9x9 grid.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::BitSet;

/// Source of board versions. Every mutation draws a fresh value so that two
/// different board states never share a version.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// A cell coordinate (0-based row and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn box_index(&self) -> usize {
        (self.row / 3) * 3 + self.col / 3
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}c{}", self.row + 1, self.col + 1)
    }
}

/// A single cell: placed value (if any), given flag and pencil-mark candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    value: Option<u8>,
    given: bool,
    candidates: BitSet,
}

impl Cell {
    pub fn value(&self) -> Option<u8> {
        self.value
    }

    pub fn is_given(&self) -> bool {
        self.given
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }

    pub fn candidates(&self) -> BitSet {
        self.candidates
    }

    pub fn has_candidate(&self, digit: u8) -> bool {
        self.candidates.contains(digit)
    }

    pub fn set_candidates(&mut self, candidates: BitSet) {
        self.candidates = candidates;
    }

    pub fn remove_candidate(&mut self, digit: u8) {
        self.candidates.remove(digit);
    }
}

/// A classic 9x9 Sudoku grid.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: [Cell; 81],
    version: u64,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new_classic()
    }
}

impl Grid {
    /// Empty grid with every candidate open.
    pub fn new_classic() -> Self {
        let cell = Cell {
            value: None,
            given: false,
            candidates: BitSet::all_9(),
        };
        Self {
            cells: [cell; 81],
            version: next_version(),
        }
    }

    /// Parse an 81-character puzzle string; `0` or `.` marks an empty cell.
    /// Candidates are computed from the givens.
    pub fn from_string(s: &str) -> Option<Self> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() != 81 {
            return None;
        }
        let mut grid = Self::new_classic();
        for (idx, ch) in chars.iter().enumerate() {
            match ch {
                '0' | '.' => {}
                '1'..='9' => {
                    let cell = &mut grid.cells[idx];
                    cell.value = Some(*ch as u8 - b'0');
                    cell.given = true;
                    cell.candidates = BitSet::empty();
                }
                _ => return None,
            }
        }
        grid.recalculate_candidates();
        Some(grid)
    }

    /// Monotonic version stamp of the current board state.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn cell(&self, pos: Position) -> &Cell {
        &self.cells[pos.row * 9 + pos.col]
    }

    /// Mutable access to a cell. Counts as a mutation of the board.
    pub fn cell_mut(&mut self, pos: Position) -> &mut Cell {
        self.version = next_version();
        &mut self.cells[pos.row * 9 + pos.col]
    }

    pub fn get(&self, pos: Position) -> Option<u8> {
        self.cell(pos).value
    }

    /// Candidates of an empty cell (empty set for filled cells).
    pub fn get_candidates(&self, pos: Position) -> BitSet {
        let cell = self.cell(pos);
        if cell.value.is_some() {
            BitSet::empty()
        } else {
            cell.candidates
        }
    }

    /// Place or clear a value without validity checks. Candidates of peers are
    /// left untouched; call [`Grid::recalculate_candidates`] or
    /// [`Grid::place`] when they should follow.
    pub fn set_cell_unchecked(&mut self, pos: Position, value: Option<u8>) {
        let cell = self.cell_mut(pos);
        cell.value = value;
        cell.candidates = match value {
            Some(_) => BitSet::empty(),
            None => BitSet::all_9(),
        };
    }

    /// Place a value and remove it from the candidates of all peers, keeping
    /// any earlier eliminations intact.
    pub fn place(&mut self, pos: Position, value: u8) {
        self.set_cell_unchecked(pos, Some(value));
        let idx = pos.row * 9 + pos.col;
        for peer in peers_of(idx) {
            self.cells[peer].candidates.remove(value);
        }
    }

    pub fn remove_candidate(&mut self, pos: Position, digit: u8) {
        self.cell_mut(pos).remove_candidate(digit);
    }

    /// Recompute every empty cell's candidates from the placed values.
    pub fn recalculate_candidates(&mut self) {
        self.version = next_version();
        for idx in 0..81 {
            if self.cells[idx].value.is_some() {
                self.cells[idx].candidates = BitSet::empty();
                continue;
            }
            let mut cands = BitSet::all_9();
            for peer in peers_of(idx) {
                if let Some(v) = self.cells[peer].value {
                    cands.remove(v);
                }
            }
            self.cells[idx].candidates = cands;
        }
    }

    pub fn empty_positions(&self) -> Vec<Position> {
        (0..81)
            .filter(|&i| self.cells[i].value.is_none())
            .map(|i| Position::new(i / 9, i % 9))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|c| c.value.is_some())
    }

    /// Placed values by linear index (0 for empty).
    pub fn values(&self) -> [u8; 81] {
        std::array::from_fn(|i| self.cells[i].value.unwrap_or(0))
    }

    /// Independent copy of the board (same version, same content).
    pub fn deep_clone(&self) -> Self {
        self.clone()
    }

    pub fn to_string_compact(&self) -> String {
        self.cells
            .iter()
            .map(|c| match c.value {
                Some(v) => (b'0' + v) as char,
                None => '.',
            })
            .collect()
    }
}

/// The 20 peers of a linear cell index.
pub(crate) fn peers_of(idx: usize) -> impl Iterator<Item = usize> {
    let (row, col) = (idx / 9, idx % 9);
    (0..81).filter(move |&other| {
        let (r, c) = (other / 9, other % 9);
        other != idx && (r == row || c == col || (r / 3 == row / 3 && c / 3 == col / 3))
    })
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..9 {
            if row > 0 && row % 3 == 0 {
                writeln!(f, "------+-------+------")?;
            }
            for col in 0..9 {
                if col > 0 && col % 3 == 0 {
                    write!(f, "| ")?;
                }
                match self.cells[row * 9 + col].value {
                    Some(v) => write!(f, "{} ", v)?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EASY: &str =
        "530070000600195000098000060800060003400803001700020006060000280000419005000080079";

    #[test]
    fn test_from_string() {
        let grid = Grid::from_string(EASY).unwrap();
        assert_eq!(grid.get(Position::new(0, 0)), Some(5));
        assert!(grid.cell(Position::new(0, 0)).is_given());
        assert!(grid.get(Position::new(0, 2)).is_none());
        assert!(!grid.get_candidates(Position::new(0, 2)).contains(5));
        assert_eq!(grid.to_string_compact().len(), 81);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Grid::from_string("123").is_none());
        assert!(Grid::from_string(&"x".repeat(81)).is_none());
    }

    #[test]
    fn test_version_changes_on_mutation() {
        let mut grid = Grid::from_string(EASY).unwrap();
        let before = grid.version();
        let clone = grid.deep_clone();
        assert_eq!(clone.version(), before);
        grid.remove_candidate(Position::new(0, 2), 1);
        assert!(grid.version() > before);
    }

    #[test]
    fn test_place_keeps_eliminations() {
        let mut grid = Grid::from_string(EASY).unwrap();
        let target = Position::new(0, 2);
        grid.remove_candidate(Position::new(0, 3), 6);
        grid.place(target, 4);
        assert_eq!(grid.get(target), Some(4));
        assert!(!grid.get_candidates(Position::new(0, 3)).contains(4));
        assert!(!grid.get_candidates(Position::new(0, 3)).contains(6));
    }

    #[test]
    fn test_peers_count() {
        for idx in [0, 40, 80] {
            assert_eq!(peers_of(idx).count(), 20);
        }
    }
}
