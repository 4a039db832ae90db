// Report rendering for query results and database statistics

use crate::analytics::{DbSummary, DegreeEntry};
use crate::pathfind::{PathOutcome, SearchReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Branch factor of one article, as printed by `average`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageReport {
    pub article: String,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutesReport {
    pub hops: usize,
    pub routes: Vec<Vec<String>>,
}

pub fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub fn format_path(path: &[String]) -> String {
    path.join(" → ")
}

fn header(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push('\n');
    report.push_str(title);
    report.push('\n');
    report.push_str(RULE);
    report.push_str("\n\n");
}

pub fn generate_path_text(data: &SearchReport) -> String {
    let mut report = String::new();
    header(&mut report, "SHORTEST PATH");

    report.push_str(&format!("From:         {}\n", data.start));
    report.push_str(&format!("To:           {}\n", data.finish));

    match &data.outcome {
        PathOutcome::Found(path) => {
            report.push_str(&format!("Hops:         {}\n\n", path.len().saturating_sub(1)));
            report.push_str(&format!("  {}\n\n", format_path(path)));
        }
        PathOutcome::NoPathFound => {
            report.push_str("\n  No path found within the depth budget\n\n");
        }
    }

    if data.cache_hit {
        report.push_str("Answered from stored links\n");
    } else {
        report.push_str(&format!("Rounds:       {}\n", data.rounds));
        report.push_str(&format!("Fetches:      {}\n", data.fetches));
        report.push_str(&format!("Expanded:     {}\n", data.expanded));
    }

    report
}

fn push_degree_table(report: &mut String, entries: &[DegreeEntry]) {
    if entries.is_empty() {
        report.push_str("  (none)\n");
    }
    for (idx, entry) in entries.iter().enumerate() {
        report.push_str(&format!("  {}. {} ({})\n", idx + 1, entry.title, entry.degree));
    }
    report.push('\n');
}

pub fn generate_summary_text(data: &DbSummary) -> String {
    let mut report = String::new();
    header(&mut report, "LINK DATABASE");

    report.push_str(&format!("Expanded:     {}\n", data.records));
    report.push_str(&format!("Articles:     {}\n", data.nodes));
    report.push_str(&format!("Links:        {}\n", data.edges));
    if let Some(ts) = data.last_expanded_at {
        report.push_str(&format!("Last update:  {}\n", format_timestamp(ts)));
    }
    report.push('\n');

    report.push_str("Most outbound links:\n");
    push_degree_table(&mut report, &data.top_out);
    report.push_str("Most linked to:\n");
    push_degree_table(&mut report, &data.top_in);

    report
}

pub fn generate_average_text(data: &AverageReport) -> String {
    format!(
        "Average second-level descendants of '{}': {:.2}\n",
        data.article, data.average
    )
}

pub fn generate_routes_text(data: &RoutesReport) -> String {
    let mut report = String::new();
    header(&mut report, &format!("ROUTES OF {} HOPS", data.hops));

    if data.routes.is_empty() {
        report.push_str("  No routes found\n");
    }
    for (idx, route) in data.routes.iter().enumerate() {
        report.push_str(&format!("  [{}] {}\n", idx + 1, format_path(route)));
    }

    report
}

/// Wraps any report payload with generator metadata.
pub fn generate_json<T: Serialize>(kind: &str, data: &T) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "wikirace",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": Utc::now().to_rfc3339(),
                "kind": kind,
            },
            "data": data,
        }
    });
    serde_json::to_string_pretty(&json_report)
}
