//! Cache-aware, depth-bounded shortest path search that grows the persisted
//! link graph on demand.

use crate::data::EdgeStore;
use crate::error::{EndpointFault, PathError, Result, StoreError};
use crate::graph::GraphIndex;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};
use wikirace_source::{FetchOutcome, LinkSource, normalize_links};

pub const DEFAULT_MAX_DEPTH: usize = 4;
pub const DEFAULT_LINKS_PER_PAGE: usize = 200;
pub const DEFAULT_WORKERS: usize = 1;

/// Callback for reporting search progress
pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Per-query search limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum number of expansion rounds.
    pub max_depth: usize,
    /// Per-page link cap (K).
    pub links_per_page: usize,
    /// Fetches kept in flight within one round.
    pub workers: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            links_per_page: DEFAULT_LINKS_PER_PAGE,
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PathOutcome {
    Found(Vec<String>),
    NoPathFound,
}

impl PathOutcome {
    pub fn path(&self) -> Option<&[String]> {
        match self {
            PathOutcome::Found(path) => Some(path),
            PathOutcome::NoPathFound => None,
        }
    }
}

/// Result of one query together with what it cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub start: String,
    pub finish: String,
    pub outcome: PathOutcome,
    /// Expansion rounds performed.
    pub rounds: usize,
    /// Calls made to the link source, endpoint validation included. Fetches
    /// started in a round that exits early count even though their result
    /// is discarded.
    pub fetches: usize,
    /// Titles whose links were persisted by this query.
    pub expanded: usize,
    /// Answered without touching the link source.
    pub cache_hit: bool,
}

impl SearchReport {
    fn new(start: &str, finish: &str) -> Self {
        Self {
            start: start.to_string(),
            finish: finish.to_string(),
            outcome: PathOutcome::NoPathFound,
            rounds: 0,
            fetches: 0,
            expanded: 0,
            cache_hit: false,
        }
    }

    pub fn path(&self) -> Option<&[String]> {
        self.outcome.path()
    }

    pub fn hops(&self) -> Option<usize> {
        self.path().map(|p| p.len().saturating_sub(1))
    }
}

/// Titles queued for one round. Insertion ordered; a title pushed twice
/// keeps its first position.
#[derive(Debug, Default, Clone)]
pub struct Frontier {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the title was already queued.
    pub fn push(&mut self, title: impl Into<String>) -> bool {
        let title = title.into();
        if self.seen.contains(&title) {
            return false;
        }
        self.seen.insert(title.clone());
        self.order.push(title);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl<S: Into<String>> Extend<S> for Frontier {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for title in iter {
            self.push(title);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Frontier {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut frontier = Frontier::new();
        frontier.extend(iter);
        frontier
    }
}

impl IntoIterator for Frontier {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

pub struct PathFinder<S, E> {
    source: S,
    store: E,
    graph: GraphIndex,
    options: SearchOptions,
    progress_callback: Option<ProgressCallback>,
}

impl<S: LinkSource, E: EdgeStore> PathFinder<S, E> {
    pub fn new(source: S, store: E) -> Self {
        Self {
            source,
            store,
            graph: GraphIndex::new(),
            options: SearchOptions::default(),
            progress_callback: None,
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    /// Shortest known-or-discoverable path within `max_depth` rounds, using
    /// the finder's configured link cap and worker count.
    pub async fn find_shortest_path(
        &mut self,
        start: &str,
        finish: &str,
        max_depth: usize,
    ) -> Result<PathOutcome> {
        let options = SearchOptions {
            max_depth,
            ..self.options.clone()
        };
        Ok(self.search(start, finish, &options).await?.outcome)
    }

    pub async fn search(
        &mut self,
        start: &str,
        finish: &str,
        options: &SearchOptions,
    ) -> Result<SearchReport> {
        info!(
            "Searching path '{}' -> '{}' (max depth {}, {} links per page)",
            start, finish, options.max_depth, options.links_per_page
        );
        let mut report = SearchReport::new(start, finish);

        if start == finish {
            report.outcome = PathOutcome::Found(vec![start.to_string()]);
            report.cache_hit = true;
            return Ok(report);
        }

        let records = self.store.read_all()?;
        self.graph.rebuild(&records);
        self.notify(format!(
            "Loaded {} expansion records ({} articles, {} links)",
            records.len(),
            self.graph.node_count(),
            self.graph.edge_count()
        ));

        if self.graph.has_path(start, finish) {
            let path = self.graph.shortest_path(start, finish)?;
            info!("Cache hit: {} hops from stored links", path.len() - 1);
            report.outcome = PathOutcome::Found(path);
            report.cache_hit = true;
            return Ok(report);
        }
        debug!("No stored path, expanding");

        let prefetched = self
            .validate_endpoints(start, finish, options.links_per_page, &mut report)
            .await?;

        let mut frontier = self.seed_frontier(start, options.max_depth);
        let mut dead_ends: HashSet<String> = HashSet::new();
        let cap = options.links_per_page;

        for round in 1..=options.max_depth {
            let pending: Vec<String> = frontier
                .into_iter()
                .filter(|t| !self.graph.is_expanded(t) && !dead_ends.contains(t))
                .collect();
            if pending.is_empty() {
                debug!("Frontier exhausted before round {}", round);
                break;
            }

            report.rounds = round;
            info!("Round {}: {} articles to expand", round, pending.len());
            self.notify(format!("Round {}: expanding {} articles", round, pending.len()));

            let source = &self.source;
            let prefetched = &prefetched;
            let started = AtomicUsize::new(0);
            let started = &started;
            let mut fetches = stream::iter(pending)
                .map(move |title| async move {
                    let result = match prefetched.get(&title) {
                        Some(links) => Ok(FetchOutcome::Links(links.clone())),
                        None => {
                            started.fetch_add(1, Ordering::Relaxed);
                            source.fetch(&title, cap).await
                        }
                    };
                    (title, result)
                })
                .buffered(options.workers.max(1));

            let mut next = Frontier::new();

            while let Some((title, result)) = fetches.next().await {
                if self.graph.is_expanded(&title) {
                    continue;
                }

                let links = match result {
                    Ok(outcome) => normalize_links(&title, &[], outcome.into_links(), cap),
                    Err(e) => {
                        warn!("Link source unavailable for '{}': {}", title, e);
                        continue;
                    }
                };
                if links.is_empty() {
                    debug!("'{}' is a dead end", title);
                    dead_ends.insert(title);
                    continue;
                }

                let links = persist(&self.store, &title, links)?;
                self.graph.add_links(&title, &links);
                report.expanded += 1;
                debug!("Expanded '{}' with {} links", title, links.len());
                self.notify(format!("Expanded '{}' ({} links)", title, links.len()));

                if links.iter().any(|l| l == finish) {
                    report.fetches += started.load(Ordering::Relaxed);
                    let path = self.graph.shortest_path(start, finish)?;
                    info!(
                        "Found '{}' in round {} ({} hops)",
                        finish,
                        round,
                        path.len() - 1
                    );
                    report.outcome = PathOutcome::Found(path);
                    return Ok(report);
                }

                next.extend(links);
            }

            report.fetches += started.load(Ordering::Relaxed);
            frontier = next;
        }

        info!(
            "No path '{}' -> '{}' within {} rounds",
            start, finish, options.max_depth
        );
        Ok(report)
    }

    /// Rejects endpoints the source does not know before anything is
    /// expanded. Already expanded titles are known to exist and are not
    /// fetched. Returns the links fetched along the way so they are not
    /// requested twice.
    async fn validate_endpoints(
        &self,
        start: &str,
        finish: &str,
        cap: usize,
        report: &mut SearchReport,
    ) -> Result<HashMap<String, Vec<String>>> {
        let mut prefetched = HashMap::new();

        for title in [start, finish] {
            if self.graph.is_expanded(title) {
                continue;
            }
            report.fetches += 1;
            let reason = match self.source.fetch(title, cap).await? {
                FetchOutcome::Links(links) => {
                    prefetched.insert(title.to_string(), links);
                    continue;
                }
                FetchOutcome::NotFound => EndpointFault::NotFound,
                FetchOutcome::Ambiguous => EndpointFault::Ambiguous,
            };
            warn!("Rejecting '{}': {}", title, reason.as_str());
            return Err(PathError::InvalidEndpoint {
                title: title.to_string(),
                reason,
            });
        }

        Ok(prefetched)
    }

    /// The unexpanded boundary of what is known around `start`.
    fn seed_frontier(&self, start: &str, max_depth: usize) -> Frontier {
        if !self.graph.contains(start) {
            return Frontier::from_iter([start]);
        }
        self.graph
            .reachable_within(start, max_depth)
            .into_iter()
            .filter(|t| !self.graph.is_expanded(t))
            .collect()
    }

    fn notify(&self, message: String) {
        if let Some(ref callback) = self.progress_callback {
            callback(message);
        }
    }
}

/// Writes the record, or adopts the one already stored for `title`, so the
/// graph only ever holds persisted edges.
fn persist<E: EdgeStore>(
    store: &E,
    title: &str,
    links: Vec<String>,
) -> std::result::Result<Vec<String>, StoreError> {
    if store.write(title, &links)? {
        return Ok(links);
    }
    debug!("'{}' already has a stored record", title);
    Ok(store.read(title)?.map(|r| r.links).unwrap_or_default())
}
