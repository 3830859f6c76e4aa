use std::{cmp::Ordering, collections::BinaryHeap};

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::{graph::NodeIndex, visit::EdgeRef};

use crate::model::RoadGraph;

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: NodeIndex,
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra's algorithm between two nodes of the road graph.
///
/// Edges without a weight are never relaxed, so they behave as infinitely
/// expensive. Returns the total cost and the node sequence from `start` to
/// `target`, or `None` when `target` is unreachable.
pub(crate) fn shortest_path(
    graph: &RoadGraph,
    start: NodeIndex,
    target: NodeIndex,
) -> Option<(f64, Vec<NodeIndex>)> {
    let graph = &graph.graph;
    let mut distances: HashMap<NodeIndex, f64> = HashMap::new();
    let mut predecessors: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut settled = FixedBitSet::with_capacity(graph.node_count());
    let mut heap = BinaryHeap::new();

    // Start node has distance 0
    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            return Some((cost, trace_back(&predecessors, start, target)));
        }

        // Stale heap entry
        if settled.put(node.index()) {
            continue;
        }

        for edge in graph.edges(node) {
            let Some(weight) = edge.weight().weight.filter(|w| w.is_finite() && *w >= 0.0)
            else {
                continue;
            };
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            if settled.contains(next.index()) {
                continue;
            }
            let next_cost = cost + weight;

            // Add or update distance if better using Entry API
            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                    predecessors.insert(next, node);
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                        predecessors.insert(next, node);
                    }
                }
            }
        }
    }

    None
}

fn trace_back(
    predecessors: &HashMap<NodeIndex, NodeIndex>,
    start: NodeIndex,
    target: NodeIndex,
) -> Vec<NodeIndex> {
    let mut path = vec![target];
    let mut current = target;
    while current != start {
        match predecessors.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
