//! Plain backtracking. Not a human technique: used to verify results and to
//! finish a grid when no chain applies.

use super::fabric::idx_to_pos;
use crate::grid::peers_of;
use crate::{BitSet, Grid};

fn allowed(values: &[u8; 81], idx: usize) -> BitSet {
    let mut cands = BitSet::all_9();
    for peer in peers_of(idx) {
        if values[peer] != 0 {
            cands.remove(values[peer]);
        }
    }
    cands
}

/// Pick the empty cell with the fewest options (None when the grid is full).
fn most_constrained(values: &[u8; 81]) -> Option<(usize, BitSet)> {
    let mut best: Option<(usize, BitSet)> = None;
    for idx in 0..81 {
        if values[idx] != 0 {
            continue;
        }
        let cands = allowed(values, idx);
        if best.map_or(true, |(_, b)| cands.count() < b.count()) {
            best = Some((idx, cands));
            if cands.count() <= 1 {
                break;
            }
        }
    }
    best
}

fn search(values: &mut [u8; 81], count: &mut usize, limit: usize) {
    let Some((idx, cands)) = most_constrained(values) else {
        *count += 1;
        return;
    };
    for v in cands.iter() {
        values[idx] = v;
        search(values, count, limit);
        if *count >= limit {
            return;
        }
    }
    values[idx] = 0;
}

fn first_solution(values: &mut [u8; 81]) -> bool {
    let Some((idx, cands)) = most_constrained(values) else {
        return true;
    };
    for v in cands.iter() {
        values[idx] = v;
        if first_solution(values) {
            return true;
        }
    }
    values[idx] = 0;
    false
}

/// Fill `grid` with its first solution. Returns false if none exists.
pub(crate) fn solve_recursive(grid: &mut Grid) -> bool {
    let mut values = grid.values();
    if !first_solution(&mut values) {
        return false;
    }
    for (idx, &v) in values.iter().enumerate() {
        let pos = idx_to_pos(idx);
        if grid.get(pos).is_none() {
            grid.set_cell_unchecked(pos, Some(v));
        }
    }
    true
}

/// Count solutions, stopping once `limit` is reached.
pub(crate) fn count_solutions(grid: &Grid, limit: usize) -> usize {
    let mut values = grid.values();
    let mut count = 0;
    search(&mut values, &mut count, limit);
    count
}
