//! Table expansion: every entry of a table pulls in the table of its own
//! node, so each log ends up holding the transitive consequences of its
//! premise (bounded by the table capacity).

use super::table::{Origin, TableEntry, TableId};
use super::Universe;

impl Universe {
    /// Expand every table in `table_ids` order. Idempotent.
    pub fn expand(&mut self) {
        if self.expanded {
            return;
        }
        for id in self.table_ids() {
            let Some(mut dest) = self.take(id) else {
                continue;
            };
            expand_table(self, id, &mut dest);
            dest.close();
            self.restore(id, dest);
        }
        self.expanded = true;
        tracing::debug!(truncated = self.is_truncated(), "implication tables expanded");
    }
}

/// Rank of the node an entry was derived through; direct derivations rank
/// like normal nodes.
fn derivation_rank(table: &TableEntry, index: usize) -> u8 {
    match table.get(index).map(|e| &e.origin) {
        Some(Origin::Imported { via, .. }) => table
            .get(*via)
            .map_or(0, |v| v.entry.node.kind_rank()),
        _ => 0,
    }
}

fn expand_table(universe: &Universe, id: TableId, dest: &mut TableEntry) {
    let mut j = 1;
    while j < dest.len() {
        let Some(slot) = dest.get(j) else {
            break;
        };
        if slot.expanded {
            j += 1;
            continue;
        }
        let (via_entry, base) = (slot.entry, slot.distance);
        dest.mark_expanded(j);

        // `dest` itself is taken out of the universe, so a self-reference
        // resolves to no table
        let Some(src_id) = universe.table_for(&via_entry) else {
            j += 1;
            continue;
        };
        let Some(src) = universe.table(src_id) else {
            j += 1;
            continue;
        };
        let via_rank = via_entry.node.kind_rank();

        for (k, imported) in src.entries().iter().enumerate().skip(1) {
            let distance = base + imported.distance;
            let origin = Origin::Imported {
                table: src_id,
                index: k,
                via: j,
            };
            match dest.index_of(&imported.entry) {
                None => match dest.add(imported.entry, origin, distance) {
                    // a closed source already holds its own closure
                    Some(new) if src.is_closed() || imported.expanded => dest.mark_expanded(new),
                    Some(_) => {}
                    None => {
                        tracing::trace!(table = %id, "table full during expansion");
                        return;
                    }
                },
                Some(0) => {}
                Some(m) => {
                    let existing = dest.distance(m);
                    let better = distance < existing
                        || (distance == existing && via_rank < derivation_rank(dest, m));
                    if better {
                        dest.replace(m, origin, distance);
                    }
                }
            }
        }
        j += 1;
    }
}
