//! Initial table filling.
//!
//! Chain mode records only the direct links of each premise. Net mode plays
//! the premise out on a scratch board and records every single it triggers,
//! with back-references to the exclusions the single depends on.

use super::node::Entry;
use super::table::TableEntry;
use super::Universe;
use crate::solver::fabric::CandidateFabric;
use crate::solver::scratch::{ScratchBoard, Single};
use crate::CellSet;

pub(super) fn fill_chain_tables(universe: &mut Universe, fab: &CandidateFabric, capacity: usize) {
    for cell in fab.empty_cells.iter() {
        let cands = fab.cell_cands[cell];
        for cand in cands.iter() {
            // cell = cand: every other candidate of the cell and every peer
            // holding cand are excluded (weak links)
            let mut on = TableEntry::new(Entry::on(cell, cand), capacity);
            for other in cands.iter().filter(|&d| d != cand) {
                on.add_direct(Entry::off(cell, other), vec![0], 1);
            }
            let peers = fab.buddies[cell].intersection(&fab.candidate_cells[cand as usize]);
            for peer in peers.iter() {
                on.add_direct(Entry::off(peer, cand), vec![0], 1);
            }

            // cell <> cand: bivalue partner and conjugate mates (strong links)
            let mut off = TableEntry::new(Entry::off(cell, cand), capacity);
            if cands.count() == 2 {
                if let Some(other) = cands.iter().find(|&d| d != cand) {
                    off.add_direct(Entry::on(cell, other), vec![0], 1);
                }
            }
            for &sector in &fab.cell_sectors[cell] {
                let mates = fab
                    .sector_candidates(sector, cand)
                    .difference(&CellSet::single(cell));
                if mates.len() == 1 {
                    if let Some(mate) = mates.first() {
                        off.add_direct(Entry::on(mate, cand), vec![0], 1);
                    }
                }
            }

            universe.insert_normal(on);
            universe.insert_normal(off);
        }
    }
}

pub(super) fn fill_net_tables(
    universe: &mut Universe,
    fab: &CandidateFabric,
    capacity: usize,
    rounds: usize,
) {
    for cell in fab.empty_cells.iter() {
        for cand in fab.cell_cands[cell].iter() {
            universe.insert_normal(net_table(fab, Entry::on(cell, cand), capacity, rounds));
            universe.insert_normal(net_table(fab, Entry::off(cell, cand), capacity, rounds));
        }
    }
}

/// Play `premise` out on a scratch board for up to `rounds` rounds of singles.
fn net_table(fab: &CandidateFabric, premise: Entry, capacity: usize, rounds: usize) -> TableEntry {
    let mut table = TableEntry::new(premise, capacity);
    let Some(cell) = premise.node.cell() else {
        return table;
    };
    let cand = premise.node.cand();
    let mut board = ScratchBoard::new(fab);

    if premise.is_on() {
        for (c, d) in board.set_value(cell, cand) {
            table.add_direct(Entry::off(c, d), vec![0], 1);
        }
    } else {
        board.remove_candidate(cell, cand);
    }

    for _ in 0..rounds {
        if board.has_contradiction() || table.is_full() {
            break;
        }
        let mut singles = board.naked_singles();
        singles.extend(board.hidden_singles());

        let mut progressed = false;
        for single in singles {
            let (c, d) = (single.cell(), single.digit());
            // an earlier single of this round may have taken the cell or digit
            if board.value(c) != 0 || !board.candidates(c).contains(d) {
                continue;
            }
            let Some(mut refs) = single_reasons(fab, &table, single) else {
                continue;
            };
            if refs.is_empty() {
                // already a single before the premise
                refs.push(0);
            }
            refs.sort_by_key(|&i| std::cmp::Reverse(table.distance(i)));
            let distance = 1 + refs.iter().map(|&i| table.distance(i)).max().unwrap_or(0);
            let Some(on_index) = table.add_direct(Entry::on(c, d), refs, distance) else {
                break;
            };
            for (pc, pd) in board.set_value(c, d) {
                table.add_direct(Entry::off(pc, pd), vec![on_index], distance + 1);
            }
            progressed = true;
        }
        if !progressed {
            break;
        }
    }
    table
}

/// Indices of the OFF entries a single depends on: the removed candidates of
/// the cell (naked) or the removed positions of the digit in its house
/// (hidden). `None` when a reason is not in the table.
fn single_reasons(fab: &CandidateFabric, table: &TableEntry, single: Single) -> Option<Vec<usize>> {
    match single {
        Single::Naked { cell, digit } => fab.cell_cands[cell]
            .iter()
            .filter(|&d| d != digit)
            .map(|d| table.index_of(&Entry::off(cell, d)))
            .collect(),
        Single::Hidden { cell, digit, sector } => fab
            .sector_candidates(sector, digit)
            .iter()
            .filter(|&c| c != cell)
            .map(|c| table.index_of(&Entry::off(c, digit)))
            .collect(),
    }
}
