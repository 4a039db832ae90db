use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What the link source knows about a single title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    /// Outbound link titles, self-link removed, deduplicated and capped.
    Links(Vec<String>),
    /// No article exists under this title.
    NotFound,
    /// The title resolves to a disambiguation page.
    Ambiguous,
}

impl FetchOutcome {
    /// Links usable for expansion. `NotFound` and `Ambiguous` both fold into
    /// an empty list.
    pub fn usable_links(&self) -> &[String] {
        match self {
            FetchOutcome::Links(links) => links,
            FetchOutcome::NotFound | FetchOutcome::Ambiguous => &[],
        }
    }

    pub fn into_links(self) -> Vec<String> {
        match self {
            FetchOutcome::Links(links) => links,
            FetchOutcome::NotFound | FetchOutcome::Ambiguous => Vec::new(),
        }
    }

    pub fn is_valid_article(&self) -> bool {
        matches!(self, FetchOutcome::Links(_))
    }
}

/// Removes links pointing back at `title` (or any of its aliases), drops
/// duplicates keeping the first occurrence, then truncates to `cap`.
///
/// Self-links are stripped before truncation so the cap always counts
/// distinct titles other than the page itself.
pub fn normalize_links<I, S>(title: &str, aliases: &[&str], links: I, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for link in links {
        if out.len() >= cap {
            break;
        }
        let link = link.into();
        if link == title || aliases.contains(&link.as_str()) {
            continue;
        }
        if seen.insert(link.clone()) {
            out.push(link);
        }
    }

    out
}
