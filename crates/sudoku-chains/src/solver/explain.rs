//! ChainStep -> Hint conversion and explanation generation.
//!
//! Miners return `ChainStep`s. This module deduplicates and orders them and
//! converts them to `Hint`s with human-readable explanation strings.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::fabric::{cell_name, idx_to_pos, sector_name};
use super::table_engine::{Chain, Entry};
use super::types::{Hint, HintType, Technique};
use crate::{BitSet, Grid, Position};

/// What a step concludes: either place a value or eliminate candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InferenceResult {
    /// Place a value in a cell
    Placement { cell: usize, value: u8 },
    /// Eliminate candidates from a cell
    Elimination { cell: usize, values: Vec<u8> },
}

impl InferenceResult {
    pub fn cell(&self) -> usize {
        match self {
            InferenceResult::Placement { cell, .. }
            | InferenceResult::Elimination { cell, .. } => *cell,
        }
    }
}

/// Premises that all force the same verity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForcingSource {
    /// Both `cell = digit` and `cell <> digit`.
    Candidate { cell: usize, digit: u8 },
    /// Every candidate of a cell.
    Cell(usize),
    /// Every position of a digit in a house.
    Region { sector: usize, digit: u8 },
}

/// Why a step holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepSource {
    /// Closed loop through the chain's start cell.
    Loop,
    /// Open chain between two strongly linked ends.
    Aic,
    /// The premise forces a contradiction and is therefore false.
    Contradiction { premise: Entry },
    /// Every premise of the source forces the conclusion.
    Verity(ForcingSource),
}

/// A deduction of the chaining engine with the chains proving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStep {
    pub technique: Technique,
    pub inferences: Vec<InferenceResult>,
    pub chains: Vec<Chain>,
    pub source: StepSource,
}

/// Identity of a step's conclusions, independent of how they were proven.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepKey(Vec<(usize, u8, bool)>);

impl ChainStep {
    /// Total links over all chains and branches.
    pub fn length(&self) -> usize {
        self.chains.iter().map(Chain::length).sum()
    }

    pub fn key(&self) -> StepKey {
        let mut parts = Vec::new();
        for inference in &self.inferences {
            match inference {
                InferenceResult::Placement { cell, value } => parts.push((*cell, *value, true)),
                InferenceResult::Elimination { cell, values } => {
                    parts.extend(values.iter().map(|&v| (*cell, v, false)));
                }
            }
        }
        parts.sort_unstable();
        parts.dedup();
        StepKey(parts)
    }

    /// Removed candidates, a placement counting as one.
    pub fn elimination_count(&self) -> usize {
        self.inferences
            .iter()
            .map(|i| match i {
                InferenceResult::Placement { .. } => 1,
                InferenceResult::Elimination { values, .. } => values.len(),
            })
            .sum()
    }

    pub fn first_cell(&self) -> usize {
        self.inferences.iter().map(InferenceResult::cell).min().unwrap_or(usize::MAX)
    }

    pub fn involved_cells(&self) -> Vec<usize> {
        let cells = self
            .chains
            .iter()
            .fold(crate::CellSet::empty(), |acc, c| acc.union(&c.cells()));
        cells.iter().collect()
    }

    /// Apply every conclusion to the grid.
    pub fn apply(&self, grid: &mut Grid) {
        for inference in &self.inferences {
            match inference {
                InferenceResult::Placement { cell, value } => grid.place(idx_to_pos(*cell), *value),
                InferenceResult::Elimination { cell, values } => {
                    for &v in values {
                        grid.remove_candidate(idx_to_pos(*cell), v);
                    }
                }
            }
        }
    }

    /// One hint per conclusion, all sharing the step's explanation.
    pub fn to_hints(&self) -> Vec<Hint> {
        let explanation = self.render_explanation();
        let involved_cells: Vec<Position> =
            self.involved_cells().into_iter().map(idx_to_pos).collect();
        self.inferences
            .iter()
            .map(|inference| {
                let hint_type = match inference {
                    InferenceResult::Placement { cell, value } => HintType::SetValue {
                        pos: idx_to_pos(*cell),
                        value: *value,
                    },
                    InferenceResult::Elimination { cell, values } => HintType::EliminateCandidates {
                        pos: idx_to_pos(*cell),
                        values: values.clone(),
                    },
                };
                Hint {
                    technique: self.technique,
                    hint_type,
                    explanation: explanation.clone(),
                    involved_cells: involved_cells.clone(),
                }
            })
            .collect()
    }

    fn render_conclusions(&self) -> String {
        let parts: Vec<String> = self
            .inferences
            .iter()
            .map(|i| match i {
                InferenceResult::Placement { cell, value } => {
                    format!("{}={}", cell_name(*cell), value)
                }
                InferenceResult::Elimination { cell, values } => {
                    let digits: Vec<String> = values.iter().map(u8::to_string).collect();
                    format!("{}<>{}", cell_name(*cell), digits.join(""))
                }
            })
            .collect();
        parts.join(", ")
    }

    pub fn render_explanation(&self) -> String {
        let conclusions = self.render_conclusions();
        let chains: Vec<String> = self.chains.iter().map(Chain::to_string).collect();
        let proof = chains.join("; ");
        match &self.source {
            StepSource::Loop | StepSource::Aic => {
                format!("{}: {} => {}", self.technique, proof, conclusions)
            }
            StepSource::Contradiction { premise } => format!(
                "{}: {} leads to a contradiction ({}) => {}",
                self.technique, premise, proof, conclusions
            ),
            StepSource::Verity(source) => {
                let from = match *source {
                    ForcingSource::Candidate { cell, digit } => {
                        let name = cell_name(cell);
                        format!("both {name}={digit} and {name}<>{digit}")
                    }
                    ForcingSource::Cell(cell) => format!("every candidate of {}", cell_name(cell)),
                    ForcingSource::Region { sector, digit } => {
                        format!("every position of {} in {}", digit, sector_name(sector))
                    }
                };
                format!("{}: {} lead to {} ({})", self.technique, from, conclusions, proof)
            }
        }
    }
}

/// Turn per-cell elimination masks into inference results, ascending by cell.
pub fn eliminations(map: &BTreeMap<usize, BitSet>) -> Vec<InferenceResult> {
    map.iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(&cell, values)| InferenceResult::Elimination {
            cell,
            values: values.iter().collect(),
        })
        .collect()
}

/// Collects steps, keeping the shortest proof of every distinct conclusion.
#[derive(Debug, Default)]
pub struct StepCollector {
    steps: Vec<ChainStep>,
    by_key: HashMap<StepKey, usize>,
}

impl StepCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, step: ChainStep) {
        if step.inferences.is_empty() {
            return;
        }
        let key = step.key();
        match self.by_key.get(&key) {
            Some(&i) => {
                let current = &self.steps[i];
                if (step.length(), step.technique) < (current.length(), current.technique) {
                    self.steps[i] = step;
                }
            }
            None => {
                self.by_key.insert(key, self.steps.len());
                self.steps.push(step);
            }
        }
    }

    /// Steps ordered by technique, chain length, eliminations (more first)
    /// and first affected cell.
    pub fn into_sorted(self) -> Vec<ChainStep> {
        let mut steps = self.steps;
        steps.sort_by(|a, b| {
            a.technique
                .cmp(&b.technique)
                .then(a.length().cmp(&b.length()))
                .then(b.elimination_count().cmp(&a.elimination_count()))
                .then(a.first_cell().cmp(&b.first_cell()))
        });
        steps
    }
}
