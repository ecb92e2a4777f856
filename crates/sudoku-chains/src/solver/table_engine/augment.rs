//! Group-node and locked-set augmentation of the normal tables.

use std::collections::HashMap;

use super::node::{Entry, Node, Polarity};
use super::table::TableEntry;
use super::Universe;
use crate::solver::als_engine::{enumerate_als, Als};
use crate::solver::fabric::CandidateFabric;
use crate::solver::group_nodes::{find_group_nodes, GroupNode};
use crate::{ChainConfig, CellSet};

fn group_node(group: &GroupNode) -> Node {
    Node::Group {
        cells: group.cells,
        cand: group.cand,
    }
}

/// Add ON/OFF tables for every group node and link them with the normal
/// tables of the cells sharing a house with the group.
pub(super) fn add_group_nodes(universe: &mut Universe, fab: &CandidateFabric, capacity: usize) {
    let groups = find_group_nodes(fab);
    let mut by_house: HashMap<(usize, u8), Vec<usize>> = HashMap::new();
    for (i, group) in groups.iter().enumerate() {
        for house in group.houses() {
            by_house.entry((house, group.cand)).or_default().push(i);
        }
    }

    for (i, group) in groups.iter().enumerate() {
        let node = group_node(group);
        let cand = group.cand;
        let mut on = TableEntry::new(Entry::new(node, Polarity::On), capacity);
        let mut off = TableEntry::new(Entry::new(node, Polarity::Off), capacity);

        for house in group.houses() {
            let rest = fab.sector_candidates(house, cand).difference(&group.cells);
            let neighbours = by_house.get(&(house, cand)).map_or(&[][..], Vec::as_slice);

            for cell in rest.iter() {
                on.add_direct(Entry::off(cell, cand), vec![0], 1);
            }
            for &j in neighbours {
                let other = &groups[j];
                if j != i && !other.cells.intersects(&group.cells) {
                    on.add_direct(Entry::new(group_node(other), Polarity::Off), vec![0], 1);
                }
            }

            if rest.len() == 1 {
                if let Some(mate) = rest.first() {
                    off.add_direct(Entry::on(mate, cand), vec![0], 1);
                    if let Some(t) = universe.table_for(&Entry::off(mate, cand)) {
                        if let Some(table) = universe.table_mut(t) {
                            table.add_direct(Entry::new(node, Polarity::On), vec![0], 1);
                        }
                    }
                }
            } else if let Some(&j) = neighbours.iter().find(|&&j| groups[j].cells == rest) {
                off.add_direct(Entry::new(group_node(&groups[j]), Polarity::On), vec![0], 1);
            }

            for cell in rest.iter() {
                if let Some(t) = universe.table_for(&Entry::on(cell, cand)) {
                    if let Some(table) = universe.table_mut(t) {
                        table.add_direct(Entry::new(node, Polarity::Off), vec![0], 1);
                    }
                }
            }
        }

        universe.insert_extended(on);
        universe.insert_extended(off);
    }
}

/// One locked-set node: `als` without `cand`.
struct LockedSetNode<'a> {
    als: &'a Als,
    cand: u8,
    node: Node,
    /// elims[z] = cells losing `z` once the set is locked without `cand`
    elims: [CellSet; 10],
}

/// Add an OFF table for every (ALS, entry candidate) that eliminates
/// something, and link it from the cells and groups that can enter it.
pub(super) fn add_als_nodes(universe: &mut Universe, fab: &CandidateFabric, config: &ChainConfig) {
    let capacity = config.max_table_size;
    let catalog = enumerate_als(fab, config.max_als_size);
    let groups = if config.with_group_nodes {
        find_group_nodes(fab)
    } else {
        Vec::new()
    };

    let mut nodes = Vec::new();
    for als in catalog.iter().filter(|a| a.size() >= 2) {
        for cand in als.candidates.iter() {
            let mut elims = [CellSet::empty(); 10];
            for z in als.candidates.iter().filter(|&z| z != cand) {
                elims[z as usize] = als.buddies_per_cand[z as usize]
                    .intersection(&fab.candidate_cells[z as usize]);
            }
            if elims.iter().all(CellSet::is_empty) {
                continue;
            }
            let Some(entry_cell) = als.cand_cells[cand as usize].first() else {
                continue;
            };
            nodes.push(LockedSetNode {
                als,
                cand,
                node: Node::LockedSet {
                    cells: als.cells,
                    entry_cell: entry_cell as u8,
                    cand,
                },
                elims,
            });
        }
    }

    for locked in &nodes {
        let table = locked_set_table(fab, locked, &nodes, &groups, capacity);
        universe.insert_extended(table);
        link_entries(universe, fab, locked, &groups);
    }
    tracing::trace!(nodes = nodes.len(), "locked-set nodes added");
}

fn locked_set_table(
    fab: &CandidateFabric,
    locked: &LockedSetNode<'_>,
    nodes: &[LockedSetNode<'_>],
    groups: &[GroupNode],
    capacity: usize,
) -> TableEntry {
    let mut table = TableEntry::new(Entry::new(locked.node, Polarity::Off), capacity);
    let elims = &locked.elims;

    let mut touched = CellSet::empty();
    for z in 1..=9u8 {
        for cell in elims[z as usize].iter() {
            table.add_direct(Entry::off(cell, z), vec![0], 1);
        }
        touched = touched.union(&elims[z as usize]);
    }

    for group in groups {
        let covered = elims[group.cand as usize];
        if !covered.is_empty() && group.cells.is_subset(&covered) {
            table.add_direct(Entry::new(group_node(group), Polarity::Off), vec![0], 1);
        }
    }

    // another set loses every holder of its entry candidate: it is locked too
    for other in nodes {
        if other.als.cells.intersects(&locked.als.cells) {
            continue;
        }
        let covered = elims[other.cand as usize];
        let holders = other.als.cand_cells[other.cand as usize];
        if !covered.is_empty() && holders.is_subset(&covered) {
            table.add_direct(
                Entry::new(other.node, Polarity::Off),
                vec![0],
                1 + other.als.penalty,
            );
        }
    }

    // cells left with a single candidate
    for cell in touched.iter() {
        let mut left = fab.cell_cands[cell];
        let mut refs = Vec::new();
        for z in 1..=9u8 {
            if elims[z as usize].contains(cell) {
                left.remove(z);
                refs.extend(table.index_of(&Entry::off(cell, z)));
            }
        }
        if left.count() == 1 {
            if let Some(value) = left.first() {
                table.add_direct(Entry::on(cell, value), refs, 2);
            }
        }
    }
    table
}

/// ON tables of cells and groups that exclude the entry candidate from the set.
fn link_entries(
    universe: &mut Universe,
    fab: &CandidateFabric,
    locked: &LockedSetNode<'_>,
    groups: &[GroupNode],
) {
    let als = locked.als;
    let x = locked.cand as usize;
    let entry = Entry::new(locked.node, Polarity::Off);
    let distance = 1 + als.penalty;

    let entry_cells = als.buddies_per_cand[x].intersection(&fab.candidate_cells[x]);
    for cell in entry_cells.iter() {
        if let Some(t) = universe.table_for(&Entry::on(cell, locked.cand)) {
            if let Some(table) = universe.table_mut(t) {
                table.add_direct(entry, vec![0], distance);
            }
        }
    }

    for group in groups.iter().filter(|g| g.cand == locked.cand) {
        if group.cells.intersects(&als.cells)
            || !als.cand_cells[x].is_subset(&fab.common_buddies(&group.cells))
        {
            continue;
        }
        let premise = Entry::new(group_node(group), Polarity::On);
        if let Some(t) = universe.table_for(&premise) {
            if let Some(table) = universe.table_mut(t) {
                table.add_direct(entry, vec![0], distance);
            }
        }
    }
}
