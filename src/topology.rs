//! Execution ordering for strategy graphs.
//!
//! Nodes are addressed by their position in `strategy.nodes`; when two nodes share an
//! id, edges bind to the first one. Edges naming unknown nodes are ignored here and
//! reported by the graph validator instead.

use crate::error::CycleError;
use crate::strategy::{Node, NodeType, Strategy};
use ahash::{AHashMap, AHashSet};
use std::collections::{BTreeSet, VecDeque};

/// Kahn's algorithm over a strategy's edges, plus graph-traversal queries.
pub struct TopologicalSort;

struct Adjacency<'a> {
    nodes: &'a [Node],
    forward: Vec<Vec<usize>>,
    backward: Vec<Vec<usize>>,
}

impl<'a> Adjacency<'a> {
    fn new(strategy: &'a Strategy) -> Self {
        let mut positions: AHashMap<&str, usize> = AHashMap::new();
        for (i, node) in strategy.nodes.iter().enumerate() {
            positions.entry(node.id.as_str()).or_insert(i);
        }

        let mut forward = vec![Vec::new(); strategy.nodes.len()];
        let mut backward = vec![Vec::new(); strategy.nodes.len()];
        for edge in &strategy.edges {
            if let (Some(&s), Some(&t)) = (
                positions.get(edge.source.as_str()),
                positions.get(edge.target.as_str()),
            ) {
                forward[s].push(t);
                backward[t].push(s);
            }
        }
        Self {
            nodes: &strategy.nodes,
            forward,
            backward,
        }
    }

    fn position(&self, node_id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == node_id)
    }

    /// Kahn's algorithm. Among ready nodes, the lowest `rank(position)` goes first,
    /// ties broken by document position.
    fn kahn(&self, rank: impl Fn(usize) -> u8) -> (Vec<usize>, Vec<usize>) {
        let mut in_degree: Vec<usize> = self.backward.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<(u8, usize)> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| (rank(i), i))
            .collect();

        let mut sorted = Vec::with_capacity(self.nodes.len());
        while let Some((_, current)) = ready.pop_first() {
            sorted.push(current);
            for &next in &self.forward[current] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert((rank(next), next));
                }
            }
        }

        let remainder = (0..self.nodes.len())
            .filter(|i| in_degree[*i] > 0)
            .collect();
        (sorted, remainder)
    }

    fn reachable(&self, start: usize, edges: &[Vec<usize>]) -> AHashSet<usize> {
        let mut seen = AHashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &next in &edges[current] {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Shortest path from `start` back to itself, staying inside `allowed`.
    fn shortest_cycle_through(&self, start: usize, allowed: &AHashSet<usize>) -> Option<Vec<usize>> {
        let mut parent: AHashMap<usize, usize> = AHashMap::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &next in &self.forward[current] {
                if next == start {
                    let mut path = vec![current];
                    let mut cursor = current;
                    while cursor != start {
                        cursor = parent[&cursor];
                        path.push(cursor);
                    }
                    path.reverse();
                    return Some(path);
                }
                if allowed.contains(&next) && !parent.contains_key(&next) {
                    parent.insert(next, current);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    fn collect(&self, positions: impl IntoIterator<Item = usize>) -> Vec<&'a Node> {
        positions.into_iter().map(|i| &self.nodes[i]).collect()
    }
}

impl TopologicalSort {
    /// Orders nodes so every edge's source precedes its target.
    ///
    /// When several nodes are ready at once they are emitted in document order, so the
    /// result is deterministic and a graph without edges keeps its input order.
    pub fn order(strategy: &Strategy) -> Result<Vec<&Node>, CycleError> {
        Self::order_by(strategy, |_| 0)
    }

    /// Like [`TopologicalSort::order`], but among ready nodes FLASH_BORROW goes first.
    /// This only reorders ties; it never violates an edge.
    pub fn order_with_priority(strategy: &Strategy) -> Result<Vec<&Node>, CycleError> {
        Self::order_by(strategy, |node| match node.node_type {
            NodeType::FlashBorrow => 0,
            _ => 1,
        })
    }

    fn order_by(strategy: &Strategy, rank: impl Fn(&Node) -> u8) -> Result<Vec<&Node>, CycleError> {
        let graph = Adjacency::new(strategy);
        let (sorted, remainder) = graph.kahn(|i| rank(&strategy.nodes[i]));
        if remainder.is_empty() {
            Ok(graph.collect(sorted))
        } else {
            Err(CycleError {
                remainder: remainder
                    .into_iter()
                    .map(|i| strategy.nodes[i].id.clone())
                    .collect(),
            })
        }
    }

    pub fn has_cycle(strategy: &Strategy) -> bool {
        Self::order(strategy).is_err()
    }

    /// The shortest cycle in the graph as a list of node ids, first node not repeated.
    pub fn find_cycle(strategy: &Strategy) -> Option<Vec<String>> {
        let graph = Adjacency::new(strategy);
        let (_, remainder) = graph.kahn(|_| 0);
        let allowed: AHashSet<usize> = remainder.iter().copied().collect();

        let mut best: Option<Vec<usize>> = None;
        for &start in &remainder {
            if let Some(cycle) = graph.shortest_cycle_through(start, &allowed) {
                if best.as_ref().is_none_or(|b| cycle.len() < b.len()) {
                    best = Some(cycle);
                }
            }
        }
        best.map(|cycle| {
            cycle
                .into_iter()
                .map(|i| strategy.nodes[i].id.clone())
                .collect()
        })
    }

    /// Every node reachable from `node_id` along edges, in document order.
    pub fn dependents<'a>(strategy: &'a Strategy, node_id: &str) -> Vec<&'a Node> {
        let graph = Adjacency::new(strategy);
        let Some(start) = graph.position(node_id) else {
            return Vec::new();
        };
        let seen = graph.reachable(start, &graph.forward);
        graph.collect((0..strategy.nodes.len()).filter(|i| seen.contains(i)))
    }

    /// Every node `node_id` transitively depends on, in document order.
    pub fn dependencies<'a>(strategy: &'a Strategy, node_id: &str) -> Vec<&'a Node> {
        let graph = Adjacency::new(strategy);
        let Some(start) = graph.position(node_id) else {
            return Vec::new();
        };
        let seen = graph.reachable(start, &graph.backward);
        graph.collect((0..strategy.nodes.len()).filter(|i| seen.contains(i)))
    }
}
