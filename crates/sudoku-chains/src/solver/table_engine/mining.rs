//! Forcing chains and nets: contradictions and verities mined from the
//! expanded tables.

use super::chain::{Chain, Walker};
use super::node::Entry;
use super::table::{TableEntry, TableId};
use super::FillMode;
use crate::solver::explain::{ChainStep, ForcingSource, InferenceResult, StepCollector, StepSource};
use crate::solver::fabric::CandidateFabric;
use crate::solver::types::Technique;
use crate::CellSet;

/// Reconstruct the chains for `evidence` and wrap them into a step.
///
/// A lasso drops the step silently; a broken back-reference is logged and
/// drops it too.
pub(super) fn assemble(
    walker: &Walker<'_>,
    technique: Technique,
    inferences: Vec<InferenceResult>,
    evidence: &[(TableId, usize)],
    source: StepSource,
) -> Option<ChainStep> {
    let mut chains = Vec::with_capacity(evidence.len());
    for &(id, index) in evidence {
        let table = walker.universe().table(id)?;
        let start = table.premise().node.footprint();
        let closing = table.get(index)?.entry.node.footprint().intersects(&start);
        match walker.chain_to(id, index, closing) {
            Ok(Some(chain)) => {
                if chain.links() > 0 {
                    chains.push(chain);
                }
            }
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(%err, %technique, "dropping step with a broken chain");
                return None;
            }
        }
    }
    let technique = if chains.iter().any(Chain::is_grouped) {
        technique.grouped()
    } else {
        technique
    };
    Some(ChainStep {
        technique,
        inferences,
        chains,
        source,
    })
}

/// Mine every normal table for contradictions and every premise, cell and
/// house for verities.
pub(crate) fn find_forcing_steps(
    walker: &Walker<'_>,
    fab: &CandidateFabric,
    collector: &mut StepCollector,
) {
    let nets = walker.universe().mode() == FillMode::Nets;
    let (contradiction, verity) = if nets {
        (Technique::ForcingNetContradiction, Technique::ForcingNetVerity)
    } else {
        (Technique::ForcingChainContradiction, Technique::ForcingChainVerity)
    };

    for cell in fab.empty_cells.iter() {
        for cand in fab.cell_cands[cell].iter() {
            let key = TableId::key(cell, cand);
            for id in [TableId::On(key), TableId::Off(key)] {
                check_contradiction(walker, fab, id, contradiction, collector);
            }
            check_two_chains(walker, fab, cell, cand, verity, collector);
        }
    }
    for sector in 0..27 {
        for digit in 1..=9u8 {
            let positions = fab.sector_candidates(sector, digit);
            if positions.len() < 2 {
                continue;
            }
            let ids: Vec<TableId> = positions
                .iter()
                .map(|c| TableId::On(TableId::key(c, digit)))
                .collect();
            let source = ForcingSource::Region { sector, digit };
            check_all_agree(walker, fab, &ids, source, verity, collector);
        }
    }
    for cell in fab.empty_cells.iter() {
        if fab.cell_cands[cell].count() < 2 {
            continue;
        }
        let ids: Vec<TableId> = fab.cell_cands[cell]
            .iter()
            .map(|d| TableId::On(TableId::key(cell, d)))
            .collect();
        check_all_agree(walker, fab, &ids, ForcingSource::Cell(cell), verity, collector);
    }
}

/// Cheapest proof that the premise of `table` leads to a contradiction.
fn cheapest_contradiction(table: &TableEntry, fab: &CandidateFabric) -> Option<Vec<usize>> {
    let premise = table.premise();
    let mut best: Option<(usize, Vec<usize>)> = None;
    let mut consider = |entries: Vec<Entry>| {
        let indices: Option<Vec<usize>> = entries.iter().map(|e| table.index_of(e)).collect();
        if let Some(indices) = indices {
            let cost = indices.iter().map(|&i| table.distance(i)).sum();
            if best.as_ref().map_or(true, |(c, _)| cost < *c) {
                best = Some((cost, indices));
            }
        }
    };

    // the premise implies its own negation
    if table.contains(&premise.complement()) {
        consider(vec![premise.complement()]);
    }

    for d in 1..=9u8 {
        // a candidate both set and excluded
        for cell in table.on_set(d).intersection(&table.off_set(d)).iter() {
            let both = [Entry::on(cell, d), Entry::off(cell, d)];
            if !both.contains(&premise) {
                consider(both.to_vec());
            }
        }
        // two values set in one cell
        for e in d + 1..=9 {
            for cell in table.on_set(d).intersection(&table.on_set(e)).iter() {
                consider(vec![Entry::on(cell, d), Entry::on(cell, e)]);
            }
        }
        for sector in 0..27 {
            // one value set twice in a house
            let placed = table.on_set(d).intersection(&fab.sector_sets[sector]);
            if placed.len() >= 2 {
                consider(placed.iter().take(2).map(|c| Entry::on(c, d)).collect());
            }
            // no place left for a value in a house
            let positions = fab.sector_candidates(sector, d);
            if !positions.is_empty() && positions.is_subset(&table.off_set(d)) {
                consider(positions.iter().map(|c| Entry::off(c, d)).collect());
            }
        }
    }

    // no candidate left in a cell
    for cell in fab.empty_cells.iter() {
        let cands = fab.cell_cands[cell];
        if cands.iter().all(|d| table.off_set(d).contains(cell)) {
            consider(cands.iter().map(|d| Entry::off(cell, d)).collect());
        }
    }

    best.map(|(_, indices)| indices)
}

fn check_contradiction(
    walker: &Walker<'_>,
    fab: &CandidateFabric,
    id: TableId,
    technique: Technique,
    collector: &mut StepCollector,
) {
    let Some(table) = walker.universe().table(id) else {
        return;
    };
    let Some(indices) = cheapest_contradiction(table, fab) else {
        return;
    };
    let premise = table.premise();
    let Some(cell) = premise.node.cell() else {
        return;
    };
    let cand = premise.node.cand();
    let inference = if premise.is_on() {
        InferenceResult::Elimination {
            cell,
            values: vec![cand],
        }
    } else {
        InferenceResult::Placement { cell, value: cand }
    };
    let evidence: Vec<(TableId, usize)> = indices.into_iter().map(|i| (id, i)).collect();
    let source = StepSource::Contradiction { premise };
    if let Some(step) = assemble(walker, technique, vec![inference], &evidence, source) {
        collector.add(step);
    }
}

/// Conclusions forced by both `cell = cand` and `cell <> cand`.
fn check_two_chains(
    walker: &Walker<'_>,
    fab: &CandidateFabric,
    cell: usize,
    cand: u8,
    technique: Technique,
    collector: &mut StepCollector,
) {
    let key = TableId::key(cell, cand);
    let ids = [TableId::On(key), TableId::Off(key)];
    check_all_agree(
        walker,
        fab,
        &ids,
        ForcingSource::Candidate { cell, digit: cand },
        technique,
        collector,
    );
}

/// Conclusions shared by every table in `ids`.
fn check_all_agree(
    walker: &Walker<'_>,
    fab: &CandidateFabric,
    ids: &[TableId],
    source: ForcingSource,
    technique: Technique,
    collector: &mut StepCollector,
) {
    let universe = walker.universe();
    let tables: Option<Vec<&TableEntry>> = ids.iter().map(|&id| universe.table(id)).collect();
    let Some(tables) = tables else {
        return;
    };
    if tables.len() < 2 {
        return;
    }

    for d in 1..=9u8 {
        let mut on = fab.candidate_cells[d as usize];
        let mut off = fab.candidate_cells[d as usize];
        for table in &tables {
            on = on.intersection(&table.on_set(d));
            off = off.intersection(&table.off_set(d));
        }
        emit_agreements(walker, &tables, ids, on, d, true, source, technique, collector);
        emit_agreements(walker, &tables, ids, off, d, false, source, technique, collector);
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_agreements(
    walker: &Walker<'_>,
    tables: &[&TableEntry],
    ids: &[TableId],
    cells: CellSet,
    digit: u8,
    set: bool,
    source: ForcingSource,
    technique: Technique,
    collector: &mut StepCollector,
) {
    for cell in cells.iter() {
        let target = if set {
            Entry::on(cell, digit)
        } else {
            Entry::off(cell, digit)
        };
        let evidence: Option<Vec<(TableId, usize)>> = tables
            .iter()
            .zip(ids)
            .map(|(table, &id)| table.index_of(&target).map(|i| (id, i)))
            .collect();
        let Some(evidence) = evidence else {
            continue;
        };
        let inference = if set {
            InferenceResult::Placement { cell, value: digit }
        } else {
            InferenceResult::Elimination {
                cell,
                values: vec![digit],
            }
        };
        let from = StepSource::Verity(source);
        if let Some(step) = assemble(walker, technique, vec![inference], &evidence, from) {
            collector.add(step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Universe;
    use super::*;
    use crate::solver::backtrack::{count_solutions, solve_recursive};
    use crate::{ChainConfig, Grid};

    const ARTO: &str =
        "800000000003600000070090200050007000000045700000100030001000068008500010090000400";
    const HARD: &str =
        "000000010400000000020000000000050407008000300001090000300400200050100000000806000";

    fn universe(
        puzzle: &str,
        config: &ChainConfig,
        mode: FillMode,
    ) -> (Grid, CandidateFabric, Universe) {
        let grid = Grid::from_string(puzzle).unwrap();
        let fab = CandidateFabric::from_grid(&grid);
        let mut universe = Universe::build(&fab, config, mode);
        universe.expand();
        (grid, fab, universe)
    }

    fn steps(puzzle: &str, mode: FillMode) -> (Grid, Vec<ChainStep>) {
        let config = ChainConfig::chains_only();
        let (grid, fab, universe) = universe(puzzle, &config, mode);
        let walker = Walker::new(&universe, &config);
        let mut collector = StepCollector::new();
        find_forcing_steps(&walker, &fab, &mut collector);
        (grid, collector.into_sorted())
    }

    fn assert_sound(grid: &Grid, found: &[ChainStep]) {
        assert_eq!(count_solutions(grid, 2), 1);
        let mut solved = grid.deep_clone();
        assert!(solve_recursive(&mut solved));
        let solution = solved.values();
        for step in found {
            for inference in &step.inferences {
                match inference {
                    InferenceResult::Placement { cell, value } => {
                        assert_eq!(solution[*cell], *value, "{}", step.render_explanation())
                    }
                    InferenceResult::Elimination { cell, values } => {
                        assert!(
                            !values.contains(&solution[*cell]),
                            "{}",
                            step.render_explanation()
                        )
                    }
                }
            }
        }
    }

    #[test]
    fn test_forcing_chains_are_sound() {
        for puzzle in [ARTO, HARD] {
            let (grid, found) = steps(puzzle, FillMode::Chains);
            assert_sound(&grid, &found);
        }
        let (_, found) = steps(HARD, FillMode::Chains);
        assert!(!found.is_empty());
    }

    #[test]
    fn test_contradiction_chains_start_at_premise() {
        let (_, found) = steps(HARD, FillMode::Chains);
        for step in &found {
            if let StepSource::Contradiction { premise } = step.source {
                for chain in &step.chains {
                    assert_eq!(chain.start(), Some(&premise));
                }
            }
        }
    }

    #[test]
    fn test_forcing_nets_are_sound() {
        let (grid, found) = steps(ARTO, FillMode::Nets);
        assert!(found.iter().all(|s| s.technique.is_net()));
        assert_sound(&grid, &found);
    }

    #[test]
    fn test_verity_keeps_shortest_justification() {
        let config = ChainConfig::chains_only();
        let (_, fab, universe) = universe(HARD, &config, FillMode::Chains);
        let walker = Walker::new(&universe, &config);
        let mut collector = StepCollector::new();
        find_forcing_steps(&walker, &fab, &mut collector);
        let kept = collector.into_sorted();

        // every exclusion forced by both X=d and X<>d, proven on its own
        let mut checked = 0;
        for cell in fab.empty_cells.iter() {
            for cand in fab.cell_cands[cell].iter() {
                let key = TableId::key(cell, cand);
                let (on, off) = (TableId::On(key), TableId::Off(key));
                let (Some(on_table), Some(off_table)) = (universe.table(on), universe.table(off))
                else {
                    continue;
                };
                for d in 1..=9u8 {
                    let shared = on_table
                        .off_set(d)
                        .intersection(&off_table.off_set(d))
                        .intersection(&fab.candidate_cells[d as usize]);
                    for target in shared.iter() {
                        let entry = Entry::off(target, d);
                        let evidence = [
                            (on, on_table.index_of(&entry).unwrap()),
                            (off, off_table.index_of(&entry).unwrap()),
                        ];
                        let inference = InferenceResult::Elimination {
                            cell: target,
                            values: vec![d],
                        };
                        let source =
                            StepSource::Verity(ForcingSource::Candidate { cell, digit: cand });
                        let Some(alone) = assemble(
                            &walker,
                            Technique::ForcingChainVerity,
                            vec![inference],
                            &evidence,
                            source,
                        ) else {
                            continue;
                        };
                        let best = kept
                            .iter()
                            .find(|s| s.key() == alone.key())
                            .expect("verity conclusion is kept");
                        assert!(best.length() <= alone.length());
                        checked += 1;
                    }
                }
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_complements_only_in_contradictory_tables() {
        let config = ChainConfig::chains_only();
        let (_, fab, universe) = universe(HARD, &config, FillMode::Chains);
        for id in universe.table_ids() {
            let table = universe.table(id).unwrap();
            let clashing = table
                .entries()
                .iter()
                .any(|e| e.entry.node.is_normal() && table.contains(&e.entry.complement()));
            if clashing {
                assert!(cheapest_contradiction(table, &fab).is_some(), "{id}");
            }
        }
    }
}
