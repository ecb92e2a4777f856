//! Group nodes: a candidate confined to 2 or 3 cells of one block/line
//! intersection, used as a single node in grouped chains.

use super::fabric::{CandidateFabric, SECTOR_BOX_BASE};
use crate::CellSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub cells: CellSet,
    pub cand: u8,
    /// Row or column sector the cells share.
    pub line: usize,
    /// Box sector the cells share.
    pub block: usize,
}

impl GroupNode {
    /// The two houses that contain every cell of the group.
    pub fn houses(&self) -> [usize; 2] {
        [self.block, self.line]
    }
}

/// All group nodes of the current board, ordered by (candidate, block, line).
pub fn find_group_nodes(fab: &CandidateFabric) -> Vec<GroupNode> {
    let mut nodes = Vec::new();
    for cand in 1..=9u8 {
        for b in 0..9 {
            let block = SECTOR_BOX_BASE + b;
            let in_block = fab.sector_candidates(block, cand);
            if in_block.len() < 2 {
                continue;
            }
            let rows = (b / 3) * 3..(b / 3) * 3 + 3;
            let cols = 9 + (b % 3) * 3..9 + (b % 3) * 3 + 3;
            for line in rows.chain(cols) {
                let cells = in_block.intersection(&fab.sector_sets[line]);
                if cells.len() >= 2 {
                    nodes.push(GroupNode {
                        cells,
                        cand,
                        line,
                        block,
                    });
                }
            }
        }
    }
    nodes
}
