//! Compact sets used throughout the engine.
//!
//! `BitSet` is a 9-bit candidate mask (bit `d` set means digit `d` is still
//! possible). `CellSet` is an 81-bit set of linear cell indices backed by a
//! `u128`, used wherever the engine needs O(1) membership or intersection over
//! cells: implication `onSets/offSets`, buddy sets and node footprints.

use serde::{Deserialize, Serialize};

/// Set of candidate digits 1..=9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BitSet(u16);

const ALL_DIGITS: u16 = 0b11_1111_1110;

impl BitSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all_9() -> Self {
        Self(ALL_DIGITS)
    }

    pub fn single(digit: u8) -> Self {
        Self(1 << digit)
    }

    pub fn from_slice(digits: &[u8]) -> Self {
        digits.iter().fold(Self::empty(), |acc, &d| acc.with(d))
    }

    /// Build from a raw mask; bits outside 1..=9 are dropped.
    pub fn from_raw(raw: u16) -> Self {
        Self(raw & ALL_DIGITS)
    }

    pub fn raw(&self) -> u16 {
        self.0
    }

    #[inline]
    pub fn contains(&self, digit: u8) -> bool {
        (1..=9).contains(&digit) && self.0 & (1 << digit) != 0
    }

    pub fn insert(&mut self, digit: u8) {
        if (1..=9).contains(&digit) {
            self.0 |= 1 << digit;
        }
    }

    pub fn remove(&mut self, digit: u8) {
        self.0 &= !(1 << digit);
    }

    fn with(mut self, digit: u8) -> Self {
        self.insert(digit);
        self
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(&self, other: &BitSet) -> BitSet {
        BitSet(self.0 | other.0)
    }

    pub fn intersection(&self, other: &BitSet) -> BitSet {
        BitSet(self.0 & other.0)
    }

    pub fn difference(&self, other: &BitSet) -> BitSet {
        BitSet(self.0 & !other.0)
    }

    /// Smallest digit in the set.
    pub fn first(&self) -> Option<u8> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as u8)
        }
    }

    /// Digits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> {
        let raw = self.0;
        (1..=9u8).filter(move |d| raw & (1 << d) != 0)
    }
}

/// Set of linear cell indices 0..81.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CellSet(u128);

impl CellSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn single(cell: usize) -> Self {
        Self(1 << cell)
    }

    pub fn from_cells(cells: &[usize]) -> Self {
        let mut set = Self::empty();
        for &c in cells {
            set.insert(c);
        }
        set
    }

    #[inline]
    pub fn contains(&self, cell: usize) -> bool {
        cell < 81 && self.0 & (1 << cell) != 0
    }

    #[inline]
    pub fn insert(&mut self, cell: usize) {
        debug_assert!(cell < 81);
        self.0 |= 1 << cell;
    }

    #[inline]
    pub fn remove(&mut self, cell: usize) {
        self.0 &= !(1 << cell);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(&self, other: &CellSet) -> CellSet {
        CellSet(self.0 | other.0)
    }

    pub fn intersection(&self, other: &CellSet) -> CellSet {
        CellSet(self.0 & other.0)
    }

    pub fn difference(&self, other: &CellSet) -> CellSet {
        CellSet(self.0 & !other.0)
    }

    pub fn intersects(&self, other: &CellSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_subset(&self, other: &CellSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn first(&self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    /// Cell indices in ascending order.
    pub fn iter(&self) -> CellSetIter {
        CellSetIter(self.0)
    }
}

pub struct CellSetIter(u128);

impl Iterator for CellSetIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let idx = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(idx)
    }
}

impl FromIterator<usize> for CellSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = CellSet::empty();
        for c in iter {
            set.insert(c);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitset_basics() {
        let mut s = BitSet::from_slice(&[1, 5, 9]);
        assert_eq!(s.count(), 3);
        assert!(s.contains(5));
        assert!(!s.contains(0));
        s.remove(5);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![1, 9]);
        assert_eq!(s.first(), Some(1));
        assert_eq!(BitSet::all_9().count(), 9);
        assert_eq!(BitSet::from_raw(0xFFFF), BitSet::all_9());
    }

    #[test]
    fn test_cellset_iteration_is_ascending() {
        let s = CellSet::from_cells(&[80, 3, 64, 0]);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![0, 3, 64, 80]);
        assert_eq!(s.len(), 4);
        assert!(s.contains(80));
        assert!(!s.contains(81));
    }

    #[test]
    fn test_cellset_algebra() {
        let a = CellSet::from_cells(&[1, 2, 3]);
        let b = CellSet::from_cells(&[3, 4]);
        assert_eq!(a.intersection(&b), CellSet::single(3));
        assert_eq!(a.union(&b).len(), 4);
        assert_eq!(a.difference(&b), CellSet::from_cells(&[1, 2]));
        assert!(CellSet::single(2).is_subset(&a));
        assert!(a.intersects(&b));
    }
}
