use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use petgraph::Direction;

use crate::dag::builder::{ConversionGraph, GraphNode};
use crate::error::ConvertError;

/// Visit every node in dependency order, invoking `emit` as each becomes
/// ready. Within one round, ready nodes are visited in registration order,
/// so identical inputs produce identical emission order.
///
/// A round that makes no progress while nodes remain pending means the
/// remaining nodes form (or depend on) a cycle; the error carries them.
pub fn emit_ordered<F>(cg: &ConversionGraph, mut emit: F) -> Result<(), ConvertError>
where
    F: FnMut(&GraphNode) -> Result<(), ConvertError>,
{
    let mut pending: HashSet<NodeIndex> = cg.graph.node_indices().collect();

    while !pending.is_empty() {
        let mut ready: Vec<NodeIndex> = cg
            .graph
            .node_indices()
            .filter(|idx| pending.contains(idx))
            .filter(|&idx| {
                cg.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .all(|pred| !pending.contains(&pred))
            })
            .collect();

        if ready.is_empty() {
            let mut unvisited: Vec<String> = pending
                .iter()
                .map(|&idx| cg.graph[idx].id.clone())
                .collect();
            unvisited.sort();
            return Err(ConvertError::CycleDetected { unvisited });
        }

        // NodeIndex order is registration order.
        ready.sort();
        for idx in ready {
            emit(&cg.graph[idx])?;
            pending.remove(&idx);
        }
    }

    Ok(())
}
