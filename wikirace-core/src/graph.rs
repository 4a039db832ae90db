//! In-memory article link graph rebuilt from expansion records.

use crate::data::ExpansionRecord;
use crate::error::GraphError;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, VecDeque};

/// Directed graph of article titles. A derived cache of the persisted
/// expansion records, never a source of truth.
#[derive(Debug, Default, Clone)]
pub struct GraphIndex {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

/// Breadth-first tree from one source; successors are visited in title
/// order so parents (and therefore paths) are lexicographically minimal.
pub(crate) struct BfsTree {
    pub(crate) order: Vec<NodeIndex>,
    pub(crate) depth: HashMap<NodeIndex, usize>,
    pub(crate) parent: HashMap<NodeIndex, NodeIndex>,
}

impl GraphIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &[ExpansionRecord]) -> Self {
        let mut index = Self::new();
        index.rebuild(records);
        index
    }

    /// Clears the graph and replays every record as edges.
    pub fn rebuild(&mut self, records: &[ExpansionRecord]) {
        self.graph.clear();
        self.index.clear();
        for record in records {
            self.add_links(&record.title, &record.links);
        }
    }

    pub fn add_node(&mut self, title: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(title) {
            return idx;
        }
        let idx = self.graph.add_node(title.to_string());
        self.index.insert(title.to_string(), idx);
        idx
    }

    pub fn add_edge(&mut self, src: &str, dst: &str) {
        let a = self.add_node(src);
        let b = self.add_node(dst);
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, ());
        }
    }

    pub fn add_links(&mut self, src: &str, links: &[String]) {
        self.add_node(src);
        for link in links {
            self.add_edge(src, link);
        }
    }

    pub fn contains(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    pub fn successors(&self, title: &str) -> Result<impl Iterator<Item = &str>, GraphError> {
        let idx = self.node(title)?;
        Ok(self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(move |n| self.graph[n].as_str()))
    }

    pub fn predecessors(&self, title: &str) -> Result<impl Iterator<Item = &str>, GraphError> {
        let idx = self.node(title)?;
        Ok(self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(move |n| self.graph[n].as_str()))
    }

    pub fn out_degree(&self, title: &str) -> usize {
        self.degree(title, Direction::Outgoing)
    }

    pub fn in_degree(&self, title: &str) -> usize {
        self.degree(title, Direction::Incoming)
    }

    /// An article counts as expanded once it has outbound edges.
    pub fn is_expanded(&self, title: &str) -> bool {
        self.out_degree(title) > 0
    }

    pub fn has_path(&self, src: &str, dst: &str) -> bool {
        match (self.index.get(src), self.index.get(dst)) {
            (Some(&a), Some(&b)) => petgraph::algo::has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    /// A minimum-hop path from `src` to `dst`. Among equally short paths the
    /// lexicographically smallest sequence of titles is returned.
    pub fn shortest_path(&self, src: &str, dst: &str) -> Result<Vec<String>, GraphError> {
        let no_path = || GraphError::NoPath {
            from: src.to_string(),
            to: dst.to_string(),
        };
        let (Some(&from), Some(&to)) = (self.index.get(src), self.index.get(dst)) else {
            return Err(no_path());
        };

        let tree = self.bfs_tree(from, None, Some(to));
        if !tree.depth.contains_key(&to) {
            return Err(no_path());
        }

        let mut path = vec![self.graph[to].clone()];
        let mut current = to;
        while let Some(&p) = tree.parent.get(&current) {
            path.push(self.graph[p].clone());
            current = p;
        }
        path.reverse();
        Ok(path)
    }

    /// Titles reachable from `src` in at most `max_hops`, `src` included,
    /// in breadth-first discovery order. Empty if `src` is unknown.
    pub fn reachable_within(&self, src: &str, max_hops: usize) -> Vec<&str> {
        let Some(&from) = self.index.get(src) else {
            return Vec::new();
        };
        self.bfs_tree(from, Some(max_hops), None)
            .order
            .into_iter()
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    pub(crate) fn bfs_tree(
        &self,
        from: NodeIndex,
        max_depth: Option<usize>,
        stop_at: Option<NodeIndex>,
    ) -> BfsTree {
        let mut tree = BfsTree {
            order: vec![from],
            depth: HashMap::from([(from, 0)]),
            parent: HashMap::new(),
        };
        let mut queue = VecDeque::from([from]);

        while let Some(node) = queue.pop_front() {
            if Some(node) == stop_at {
                break;
            }
            let depth = tree.depth[&node];
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            for next in self.sorted_successors(node) {
                if tree.depth.contains_key(&next) {
                    continue;
                }
                tree.depth.insert(next, depth + 1);
                tree.parent.insert(next, node);
                tree.order.push(next);
                queue.push_back(next);
            }
        }

        tree
    }

    pub(crate) fn sorted_successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        next.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        next
    }

    pub(crate) fn index_of(&self, title: &str) -> Option<NodeIndex> {
        self.index.get(title).copied()
    }

    pub(crate) fn title(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    fn node(&self, title: &str) -> Result<NodeIndex, GraphError> {
        self.index
            .get(title)
            .copied()
            .ok_or_else(|| GraphError::NodeUnknown(title.to_string()))
    }

    fn degree(&self, title: &str, direction: Direction) -> usize {
        self.index
            .get(title)
            .map(|&idx| self.graph.neighbors_directed(idx, direction).count())
            .unwrap_or(0)
    }
}
