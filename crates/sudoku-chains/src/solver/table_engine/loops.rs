//! Nice loops and alternating inference chains mined from the expanded
//! chain-mode tables.
//!
//! A loop is a table entry that returns to the premise's cell. Loops that
//! come back on the premise's own candidate cannot end on the premise itself
//! (it is logged once, at index 0), so they are closed through one extra
//! link from the last entry back to the premise.

use std::collections::BTreeMap;

use super::chain::{Chain, Walker};
use super::mining::assemble;
use super::node::{Entry, Node};
use super::table::TableId;
use crate::solver::explain::{eliminations, InferenceResult, StepCollector, StepSource};
use crate::solver::fabric::CandidateFabric;
use crate::solver::types::Technique;
use crate::{BitSet, CellSet};

/// Shortest loop or chain that can eliminate anything.
const MIN_LINKS: usize = 3;

pub(crate) fn find_loops(
    walker: &Walker<'_>,
    fab: &CandidateFabric,
    collector: &mut StepCollector,
) {
    let universe = walker.universe();
    for id in universe.table_ids() {
        if matches!(id, TableId::Extended(_)) {
            continue;
        }
        let Some(table) = universe.table(id) else {
            continue;
        };
        let premise = table.premise();
        let Some(start) = premise.node.cell() else {
            continue;
        };
        let cand = premise.node.cand();

        for (j, slot) in table.entries().iter().enumerate().skip(1) {
            if slot.distance + 1 < MIN_LINKS {
                continue;
            }
            let Node::Normal { cell, cand: d } = slot.entry.node else {
                continue;
            };
            let cell = cell as usize;
            if cell == start {
                check_nice_loop(walker, fab, id, j, false, collector);
            } else if d == cand && closes_on_premise(fab, &premise, &slot.entry) {
                check_nice_loop(walker, fab, id, j, true, collector);
            } else if !premise.is_on() && slot.entry.is_on() {
                check_aic(walker, fab, id, j, collector);
            }
        }
    }
}

/// True when `end` links straight back to `premise` (same candidate):
/// a conjugate mate turned off forces an ON premise, and a peer turned on
/// excludes an OFF premise.
fn closes_on_premise(fab: &CandidateFabric, premise: &Entry, end: &Entry) -> bool {
    let (Some(a), Some(z)) = (premise.node.cell(), end.node.cell()) else {
        return false;
    };
    if !fab.sees(a, z) || premise.is_on() == end.is_on() {
        return false;
    }
    if premise.is_on() {
        let cand = premise.node.cand();
        fab.cell_sectors[a].iter().any(|&sector| {
            let holders = fab.sector_candidates(sector, cand);
            holders.len() == 2 && holders.contains(z)
        })
    } else {
        true
    }
}

fn check_nice_loop(
    walker: &Walker<'_>,
    fab: &CandidateFabric,
    id: TableId,
    j: usize,
    wrap: bool,
    collector: &mut StepCollector,
) {
    let Some(table) = walker.universe().table(id) else {
        return;
    };
    let premise = table.premise();
    let Some(end) = table.get(j).map(|s| s.entry) else {
        return;
    };
    let Some(start) = premise.node.cell() else {
        return;
    };
    let (c, d) = (premise.node.cand(), end.node.cand());
    let first_strong = !premise.is_on();
    // a wrapped loop ends on the premise itself: its last link goes the
    // other way from the premise's polarity
    let last_strong = if wrap { premise.is_on() } else { end.is_on() };
    let same = wrap || c == d;

    let technique = Technique::DiscontinuousNiceLoop;
    let evidence = [(id, j)];
    let Some(mut step) = assemble(walker, technique, Vec::new(), &evidence, StepSource::Loop)
    else {
        return;
    };
    let Some(chain) = step.chains.first_mut() else {
        return;
    };
    if wrap {
        chain.entries.push(premise);
    }
    if chain.links() < MIN_LINKS {
        return;
    }
    let grouped = chain.is_grouped();

    let discontinuous = match (first_strong, last_strong, same) {
        (false, false, true) | (false, true, false) => Some(elimination(start, c)),
        (true, true, true) => Some(InferenceResult::Placement { cell: start, value: c }),
        (true, false, false) => Some(elimination(start, d)),
        _ => None,
    };

    if let Some(inference) = discontinuous {
        step.inferences = vec![inference];
    } else {
        // both weak on different candidates only closes through a bivalue cell
        let both_weak = (first_strong, last_strong, same) == (false, false, false);
        if both_weak && fab.cell_cands[start].count() != 2 {
            return;
        }
        let Some(elims) = continuous_eliminations(fab, chain) else {
            return;
        };
        step.inferences = eliminations(&elims);
        step.technique = if grouped {
            Technique::GroupedContinuousNiceLoop
        } else {
            Technique::ContinuousNiceLoop
        };
    }
    if step.inferences.is_empty() {
        return;
    }
    collector.add(step);
}

fn elimination(cell: usize, value: u8) -> InferenceResult {
    InferenceResult::Elimination {
        cell,
        values: vec![value],
    }
}

/// Cells of `entry` that hold `digit` (the whole footprint for plain nodes
/// and groups, the holders of `digit` for a locked set).
fn holders(fab: &CandidateFabric, entry: &Entry, digit: u8) -> CellSet {
    match entry.node {
        Node::LockedSet { cells, .. } => cells.intersection(&fab.candidate_cells[digit as usize]),
        node => node.footprint(),
    }
}

/// True when `x` and `y` cannot both be false: a bivalue cell, or the only
/// two holders of a digit in some house.
fn is_strong_link(fab: &CandidateFabric, x: &Entry, y: &Entry) -> bool {
    match (x.node, y.node) {
        (Node::Normal { cell: a, cand: p }, Node::Normal { cell: b, cand: q }) if a == b => {
            p != q && fab.cell_cands[a as usize].count() == 2
        }
        (Node::LockedSet { .. }, _) | (_, Node::LockedSet { .. }) => false,
        _ if x.node.cand() == y.node.cand() => {
            let digit = x.node.cand();
            let (hx, hy) = (holders(fab, x, digit), holders(fab, y, digit));
            if hx.is_empty() || hy.is_empty() || hx.intersects(&hy) {
                return false;
            }
            let both = hx.union(&hy);
            fab.sector_sets.iter().enumerate().any(|(sector, cells)| {
                both.is_subset(cells) && fab.sector_candidates(sector, digit).is_subset(&both)
            })
        }
        _ => false,
    }
}

/// Eliminations of a continuous loop: every weak link turns strong.
/// `None` when the loop does not alternate, or when one of its OFF -> ON
/// links is not a strong link on the board (a locked set's forced single).
fn continuous_eliminations(
    fab: &CandidateFabric,
    chain: &Chain,
) -> Option<BTreeMap<usize, BitSet>> {
    let mut nodes = chain.entries.clone();
    if nodes.first() == nodes.last() {
        nodes.pop();
    }
    let loop_cells = chain.cells();
    let start = chain.start()?.node.footprint();
    // the start cell carries at most one link of the loop
    let in_start = nodes
        .iter()
        .filter(|e| e.node.footprint().intersects(&start))
        .count();
    if in_start > 2 {
        return None;
    }

    let mut elims: BTreeMap<usize, BitSet> = BTreeMap::new();
    let remove = |elims: &mut BTreeMap<usize, BitSet>, cells: CellSet, digit: u8| {
        let targets = cells
            .difference(&loop_cells)
            .intersection(&fab.candidate_cells[digit as usize]);
        for cell in targets.iter() {
            elims.entry(cell).or_default().insert(digit);
        }
    };

    let n = nodes.len();
    for i in 0..n {
        let x = nodes[i];
        let y = nodes[(i + 1) % n];
        match (x.is_on(), y.is_on()) {
            (false, true) => {
                if !is_strong_link(fab, &x, &y) {
                    return None;
                }
            }
            (true, false) => match (x.node, y.node) {
                (Node::Normal { cell: a, cand: p }, Node::Normal { cell: b, cand: q })
                    if a == b =>
                {
                    let a = a as usize;
                    for other in fab.cell_cands[a].iter().filter(|&v| v != p && v != q) {
                        elims.entry(a).or_default().insert(other);
                    }
                }
                _ if x.node.cand() == y.node.cand() => {
                    let digit = x.node.cand();
                    let both = holders(fab, &x, digit).union(&holders(fab, &y, digit));
                    remove(&mut elims, fab.common_buddies(&both), digit);
                }
                _ => return None,
            },
            (false, false) => {
                let Node::LockedSet { cells, cand: entry, .. } = x.node else {
                    return None;
                };
                let exit = y.node.cand();
                let both = holders(fab, &x, exit).union(&holders(fab, &y, exit));
                remove(&mut elims, fab.common_buddies(&both), exit);
                let digits = cells
                    .iter()
                    .fold(BitSet::empty(), |acc, c| acc.union(&fab.cell_cands[c]));
                for w in digits.iter().filter(|&w| w != entry && w != exit) {
                    let members = cells.intersection(&fab.candidate_cells[w as usize]);
                    remove(&mut elims, fab.common_buddies(&members), w);
                }
            }
            (true, true) => return None,
        }
    }
    Some(elims)
}

fn check_aic(
    walker: &Walker<'_>,
    fab: &CandidateFabric,
    id: TableId,
    j: usize,
    collector: &mut StepCollector,
) {
    let Some(table) = walker.universe().table(id) else {
        return;
    };
    let premise = table.premise();
    let Some(end) = table.get(j).map(|s| s.entry) else {
        return;
    };
    let (Some(a), Some(b)) = (premise.node.cell(), end.node.cell()) else {
        return;
    };
    let (c, d) = (premise.node.cand(), end.node.cand());

    let mut elims: BTreeMap<usize, BitSet> = BTreeMap::new();
    if c == d {
        let targets = fab
            .common_buddies(&CellSet::from_cells(&[a, b]))
            .intersection(&fab.candidate_cells[c as usize]);
        for cell in targets.iter() {
            elims.entry(cell).or_default().insert(c);
        }
    } else if fab.sees(a, b) {
        if fab.has_cand(b, c) {
            elims.entry(b).or_default().insert(c);
        }
        if fab.has_cand(a, d) {
            elims.entry(a).or_default().insert(d);
        }
    }
    if elims.is_empty() {
        return;
    }

    let inferences = eliminations(&elims);
    let evidence = [(id, j)];
    let Some(step) = assemble(walker, Technique::Aic, inferences, &evidence, StepSource::Aic)
    else {
        return;
    };
    if step.chains.first().map_or(0, Chain::links) < MIN_LINKS {
        return;
    }
    collector.add(step);
}
