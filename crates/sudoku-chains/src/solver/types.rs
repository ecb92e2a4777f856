use std::time::Duration;

use crate::Position;
use serde::{Deserialize, Serialize};

/// Chaining technique that produced a step (ordered by difficulty)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Technique {
    // Nice loops and AICs (chain mode)
    DiscontinuousNiceLoop,
    ContinuousNiceLoop,
    Aic,
    GroupedDiscontinuousNiceLoop,
    GroupedContinuousNiceLoop,
    GroupedAic,

    // Forcing chains (chain mode) and nets (look-ahead mode)
    ForcingChainContradiction,
    ForcingChainVerity,
    ForcingNetContradiction,
    ForcingNetVerity,
}

impl Technique {
    /// Sudoku Explainer (SE) base rating for this technique.
    pub fn se_rating(&self) -> f32 {
        match self {
            Technique::ContinuousNiceLoop => 6.5,
            Technique::DiscontinuousNiceLoop => 6.6,
            Technique::Aic => 6.6,
            Technique::GroupedContinuousNiceLoop => 7.0,
            Technique::GroupedDiscontinuousNiceLoop => 7.0,
            Technique::GroupedAic => 7.0,
            Technique::ForcingChainContradiction => 7.5,
            Technique::ForcingChainVerity => 7.5,
            Technique::ForcingNetContradiction => 8.5,
            Technique::ForcingNetVerity => 8.5,
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            Technique::DiscontinuousNiceLoop
                | Technique::ContinuousNiceLoop
                | Technique::GroupedDiscontinuousNiceLoop
                | Technique::GroupedContinuousNiceLoop
        )
    }

    pub fn is_net(&self) -> bool {
        matches!(
            self,
            Technique::ForcingNetContradiction | Technique::ForcingNetVerity
        )
    }

    /// Grouped counterpart of a loop/AIC technique.
    pub fn grouped(self) -> Self {
        match self {
            Technique::DiscontinuousNiceLoop => Technique::GroupedDiscontinuousNiceLoop,
            Technique::ContinuousNiceLoop => Technique::GroupedContinuousNiceLoop,
            Technique::Aic => Technique::GroupedAic,
            other => other,
        }
    }
}

impl std::fmt::Display for Technique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Technique::DiscontinuousNiceLoop => write!(f, "Discontinuous Nice Loop"),
            Technique::ContinuousNiceLoop => write!(f, "Continuous Nice Loop"),
            Technique::Aic => write!(f, "AIC"),
            Technique::GroupedDiscontinuousNiceLoop => write!(f, "Grouped Discontinuous Nice Loop"),
            Technique::GroupedContinuousNiceLoop => write!(f, "Grouped Continuous Nice Loop"),
            Technique::GroupedAic => write!(f, "Grouped AIC"),
            Technique::ForcingChainContradiction => write!(f, "Forcing Chain Contradiction"),
            Technique::ForcingChainVerity => write!(f, "Forcing Chain Verity"),
            Technique::ForcingNetContradiction => write!(f, "Forcing Net Contradiction"),
            Technique::ForcingNetVerity => write!(f, "Forcing Net Verity"),
        }
    }
}

/// Type of hint provided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintType {
    /// Place this value in this cell
    SetValue { pos: Position, value: u8 },
    /// Remove these candidates from this cell
    EliminateCandidates { pos: Position, values: Vec<u8> },
}

/// A hint for the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hint {
    /// The technique used to find this hint
    pub technique: Technique,
    /// The type of hint
    pub hint_type: HintType,
    /// Explanation of the hint
    pub explanation: String,
    /// Cells involved in the reasoning
    pub involved_cells: Vec<Position>,
}

/// Configuration for the chaining engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Maximum number of entries in one implication log
    pub max_table_size: usize,
    /// Rounds of singles applied per premise in net mode
    pub look_ahead_rounds: usize,
    /// Largest almost locked set used as a node
    pub max_als_size: usize,
    /// Use group nodes in loops and chains
    pub with_group_nodes: bool,
    /// Use almost locked sets in loops and chains
    pub with_als_nodes: bool,
    /// Maximum number of net branches reconstructed per chain
    pub max_branches: usize,
    /// Upper bound on back-pointer hops while reconstructing one chain
    pub max_walk_steps: usize,
    /// Idle period after which cached tables are released
    pub idle_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_table_size: 1000,
            look_ahead_rounds: 4,
            max_als_size: 5,
            with_group_nodes: true,
            with_als_nodes: true,
            max_branches: 30,
            max_walk_steps: 10_000,
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl ChainConfig {
    /// Plain cell/candidate nodes only.
    pub fn chains_only() -> Self {
        Self {
            with_group_nodes: false,
            with_als_nodes: false,
            ..Self::default()
        }
    }

    /// Group and locked-set nodes enabled (the default).
    pub fn grouped() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technique_order_follows_rating() {
        assert!(Technique::Aic < Technique::GroupedAic);
        assert!(Technique::ForcingChainVerity < Technique::ForcingNetContradiction);
        assert!(Technique::Aic.se_rating() <= Technique::GroupedAic.se_rating());
        assert_eq!(Technique::Aic.grouped(), Technique::GroupedAic);
        assert_eq!(Technique::ForcingNetVerity.grouped(), Technique::ForcingNetVerity);
    }

    #[test]
    fn test_config_presets() {
        let plain = ChainConfig::chains_only();
        assert!(!plain.with_group_nodes && !plain.with_als_nodes);
        assert_eq!(ChainConfig::grouped(), ChainConfig::default());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = ChainConfig {
            max_table_size: 50,
            ..ChainConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ChainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
