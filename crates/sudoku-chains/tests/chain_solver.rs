//! End-to-end tests of the chaining solver on reference puzzles.
//!
//! Every conclusion the solver draws is checked against the backtracking
//! solution of a uniquely solvable puzzle.

use std::sync::Arc;
use std::time::Duration;

use sudoku_chains::{
    ChainConfig, ChainSolver, ChainStep, Grid, HintType, InferenceResult, Polarity, Position,
    SearchResult, StepSource, Technique,
};

const HARD: &str =
    "000000010400000000020000000000050407008000300001090000300400200050100000000806000";
const ARTO: &str =
    "800000000003600000070090200050007000000045700000100030001000068008500010090000400";

fn puzzle(s: &str) -> Grid {
    Grid::from_string(s).expect("valid puzzle string")
}

fn solution(grid: &Grid) -> [u8; 81] {
    let solver = ChainSolver::new();
    assert!(solver.has_unique_solution(grid));
    solver.solve(grid).expect("puzzle is solvable").values()
}

fn assert_sound(step: &ChainStep, solution: &[u8; 81]) {
    for inference in &step.inferences {
        match inference {
            InferenceResult::Placement { cell, value } => {
                assert_eq!(solution[*cell], *value, "{}", step.render_explanation())
            }
            InferenceResult::Elimination { cell, values } => {
                assert!(!values.contains(&solution[*cell]), "{}", step.render_explanation())
            }
        }
    }
}

fn assert_sorted(result: &SearchResult) {
    for pair in result.steps.windows(2) {
        assert!(pair[0].technique <= pair[1].technique);
        if pair[0].technique == pair[1].technique {
            assert!(pair[0].length() <= pair[1].length());
        }
    }
}

#[test]
fn test_loops_and_aics_are_sound() {
    let grid = puzzle(HARD);
    let solution = solution(&grid);
    let result = ChainSolver::new().find_all_loops_and_chains(&grid);
    assert!(!result.is_empty());
    assert_sorted(&result);
    for step in &result.steps {
        assert!(matches!(step.source, StepSource::Loop | StepSource::Aic));
        assert!(!step.technique.is_net());
        assert!(!step.chains.is_empty());
        assert_sound(step, &solution);
    }
}

#[test]
fn test_each_conclusion_surfaces_once() {
    let grid = puzzle(HARD);
    let steps = ChainSolver::new().find_all_loops_and_chains(&grid).steps;
    let mut keys: Vec<_> = steps.iter().map(ChainStep::key).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), steps.len());
}

#[test]
fn test_naked_pair_becomes_continuous_loop() {
    // r5c4 and r5c6 hold only {3,7}; the rest of the board is open
    let mut grid = Grid::new_classic();
    for d in [1, 2, 4, 5, 6, 8, 9] {
        grid.remove_candidate(Position::new(4, 3), d);
        grid.remove_candidate(Position::new(4, 5), d);
    }
    let solver = ChainSolver::with_config(ChainConfig::chains_only());
    let result = solver.find_all_loops_and_chains(&grid);
    let pair = result
        .steps
        .iter()
        .find(|s| s.technique == Technique::ContinuousNiceLoop)
        .expect("the pair closes a continuous loop");
    // 3 and 7 leave the rest of row 5 and box 5
    for cell in [36, 40, 44, 30, 50] {
        assert!(pair.inferences.contains(&InferenceResult::Elimination {
            cell,
            values: vec![3, 7],
        }));
    }
    // neither cell of the pair is decided
    for step in &result.steps {
        assert!(step.inferences.iter().all(|i| i.cell() != 39 && i.cell() != 41));
    }
}

#[test]
fn test_plain_chains_use_no_grouped_techniques() {
    let grid = puzzle(HARD);
    let solver = ChainSolver::with_config(ChainConfig::chains_only());
    for step in solver.find_all_loops_and_chains(&grid).steps {
        assert!(matches!(
            step.technique,
            Technique::DiscontinuousNiceLoop | Technique::ContinuousNiceLoop | Technique::Aic
        ));
        assert!(step.chains.iter().all(|c| !c.is_grouped()));
    }
}

#[test]
fn test_first_step_is_best_of_all() {
    let grid = puzzle(HARD);
    let solver = ChainSolver::new();
    let all = solver.find_all_loops_and_chains(&grid);
    assert_eq!(solver.find_loops_and_chains(&grid).as_ref(), all.first());
}

#[test]
fn test_aic_ends_are_strong() {
    let grid = puzzle(HARD);
    for step in ChainSolver::new().find_all_loops_and_chains(&grid).steps {
        if step.source != StepSource::Aic {
            continue;
        }
        let chain = &step.chains[0];
        assert_eq!(chain.start().map(|e| e.polarity), Some(Polarity::Off));
        assert_eq!(chain.end().map(|e| e.polarity), Some(Polarity::On));
        assert!(chain.links() >= 3);
    }
}

#[test]
fn test_forcing_chains_are_sound() {
    for board in [HARD, ARTO] {
        let grid = puzzle(board);
        let solution = solution(&grid);
        let result = ChainSolver::new().find_forcing_chains(&grid);
        assert_sorted(&result);
        for step in &result.steps {
            assert!(matches!(
                step.technique,
                Technique::ForcingChainContradiction | Technique::ForcingChainVerity
            ));
            assert_sound(step, &solution);
        }
    }
    let solver = ChainSolver::with_config(ChainConfig::chains_only());
    assert!(!solver.find_forcing_chains(&puzzle(HARD)).is_empty());
}

#[test]
fn test_forcing_nets_are_sound() {
    let grid = puzzle(ARTO);
    let solution = solution(&grid);
    let result = ChainSolver::with_config(ChainConfig::chains_only()).find_forcing_nets(&grid);
    for step in &result.steps {
        assert!(step.technique.is_net());
        assert_sound(step, &solution);
    }
}

#[test]
fn test_truncated_tables_stay_sound() {
    let grid = puzzle(HARD);
    let solution = solution(&grid);
    let config = ChainConfig {
        max_table_size: 8,
        ..ChainConfig::chains_only()
    };
    let result = ChainSolver::with_config(config).find_forcing_chains(&grid);
    assert!(result.truncated);
    for step in &result.steps {
        assert_sound(step, &solution);
    }
}

#[test]
fn test_hint_matches_solution() {
    let grid = puzzle(HARD);
    let solution = solution(&grid);
    let hint = ChainSolver::new().get_hint(&grid).expect("a chaining hint exists");
    assert!(!hint.explanation.is_empty());
    match hint.hint_type {
        HintType::SetValue { pos, value } => assert_eq!(solution[pos.row * 9 + pos.col], value),
        HintType::EliminateCandidates { pos, values } => {
            assert!(!values.contains(&solution[pos.row * 9 + pos.col]))
        }
    }
}

#[test]
fn test_applying_steps_keeps_the_solution() {
    let mut grid = puzzle(HARD);
    let solution = solution(&grid);
    let solver = ChainSolver::new();
    for _ in 0..5 {
        let Some(step) = solver.find_loops_and_chains(&grid) else {
            break;
        };
        let version = grid.version();
        step.apply(&mut grid);
        assert_ne!(grid.version(), version);
        for (cell, &digit) in solution.iter().enumerate() {
            let pos = Position::new(cell / 9, cell % 9);
            match grid.get(pos) {
                Some(value) => assert_eq!(value, digit),
                None => assert!(grid.get_candidates(pos).contains(digit)),
            }
        }
    }
}

#[test]
fn test_repeated_search_uses_cache_and_agrees() {
    let grid = puzzle(HARD);
    let solver = ChainSolver::with_config(ChainConfig::chains_only());
    let first = solver.find_forcing_chains(&grid);
    let second = solver.find_forcing_chains(&grid);
    assert_eq!(first, second);
    solver.clear_cache();
    assert_eq!(solver.find_forcing_chains(&grid), first);
}

#[test]
fn test_search_result_serde_roundtrip() {
    let grid = puzzle(HARD);
    let solver = ChainSolver::with_config(ChainConfig::chains_only());
    let result = solver.find_all_loops_and_chains(&grid);
    let json = serde_json::to_string(&result).unwrap();
    let back: SearchResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn test_idle_eviction_thread_stops_with_solver() {
    let config = ChainConfig {
        idle_timeout: Duration::ZERO,
        ..ChainConfig::chains_only()
    };
    let solver = Arc::new(ChainSolver::with_config(config));
    let handle = solver.spawn_idle_eviction(Duration::from_millis(5));
    solver.find_all_loops_and_chains(&puzzle(HARD));
    std::thread::sleep(Duration::from_millis(100));
    assert!(!solver.evict_idle());
    drop(solver);
    handle.join().unwrap();
}
