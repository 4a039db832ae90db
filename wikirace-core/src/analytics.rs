// Read-only statistics over the loaded link graph

use crate::data::{Database, EdgeStore};
use crate::error::StoreError;
use crate::graph::GraphIndex;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const TOP_N: usize = 5;
pub const MAX_ROUTES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeEntry {
    pub title: String,
    pub degree: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbSummary {
    pub records: usize,
    pub nodes: usize,
    pub edges: usize,
    pub last_expanded_at: Option<i64>,
    /// Articles linking out the most.
    pub top_out: Vec<DegreeEntry>,
    /// Articles linked to the most.
    pub top_in: Vec<DegreeEntry>,
}

/// Replays every stored record into a fresh graph.
pub fn load_graph<E: EdgeStore>(store: &E) -> Result<GraphIndex, StoreError> {
    Ok(GraphIndex::from_records(&store.read_all()?))
}

pub struct Analytics<'a> {
    graph: &'a GraphIndex,
}

impl<'a> Analytics<'a> {
    pub fn new(graph: &'a GraphIndex) -> Self {
        Self { graph }
    }

    pub fn top_out_degree(&self, n: usize) -> Vec<DegreeEntry> {
        self.top_by(n, |title| self.graph.out_degree(title))
    }

    pub fn top_in_degree(&self, n: usize) -> Vec<DegreeEntry> {
        self.top_by(n, |title| self.graph.in_degree(title))
    }

    /// Average number of second-level descendants per first-level article
    /// that leads to them. Zero when the article is unknown or nothing sits
    /// two hops away.
    pub fn average_second_level(&self, article: &str) -> f64 {
        let Some(root) = self.graph.index_of(article) else {
            return 0.0;
        };
        let tree = self.graph.bfs_tree(root, Some(2), None);

        let second_level: Vec<NodeIndex> = tree
            .order
            .iter()
            .copied()
            .filter(|n| tree.depth.get(n) == Some(&2))
            .collect();
        let parents: HashSet<NodeIndex> = second_level
            .iter()
            .filter_map(|n| tree.parent.get(n).copied())
            .collect();

        if parents.is_empty() {
            return 0.0;
        }
        second_level.len() as f64 / parents.len() as f64
    }

    /// Up to `limit` simple paths of exactly `hops` links, in the order they
    /// are found. Sources and successors are walked in title order.
    pub fn routes(&self, hops: usize, limit: usize) -> Vec<Vec<String>> {
        let mut routes = Vec::new();
        if hops == 0 || limit == 0 {
            return routes;
        }

        let mut sources: Vec<&str> = self.graph.nodes().collect();
        sources.sort_unstable();

        for title in sources {
            let Some(src) = self.graph.index_of(title) else {
                continue;
            };
            let mut path = vec![src];
            let mut on_path = HashSet::from([src]);
            self.walk(&mut path, &mut on_path, hops, limit, &mut routes);
            if routes.len() >= limit {
                break;
            }
        }

        routes
    }

    fn walk(
        &self,
        path: &mut Vec<NodeIndex>,
        on_path: &mut HashSet<NodeIndex>,
        hops: usize,
        limit: usize,
        routes: &mut Vec<Vec<String>>,
    ) {
        if path.len() - 1 == hops {
            routes.push(
                path.iter()
                    .map(|&n| self.graph.title(n).to_string())
                    .collect(),
            );
            return;
        }

        let Some(&last) = path.last() else {
            return;
        };
        for next in self.graph.sorted_successors(last) {
            if routes.len() >= limit {
                return;
            }
            if !on_path.insert(next) {
                continue;
            }
            path.push(next);
            self.walk(path, on_path, hops, limit, routes);
            path.pop();
            on_path.remove(&next);
        }
    }

    fn top_by<F>(&self, n: usize, degree: F) -> Vec<DegreeEntry>
    where
        F: Fn(&str) -> usize,
    {
        let mut entries: Vec<DegreeEntry> = self
            .graph
            .nodes()
            .map(|title| DegreeEntry {
                title: title.to_string(),
                degree: degree(title),
            })
            .collect();
        entries.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.title.cmp(&b.title)));
        entries.truncate(n);
        entries
    }
}

pub fn summarize(db: &Database) -> Result<DbSummary, StoreError> {
    let graph = load_graph(db)?;
    let analytics = Analytics::new(&graph);

    Ok(DbSummary {
        records: db.record_count()?,
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        last_expanded_at: db.last_expanded_at()?,
        top_out: analytics.top_out_degree(TOP_N),
        top_in: analytics.top_in_degree(TOP_N),
    })
}
