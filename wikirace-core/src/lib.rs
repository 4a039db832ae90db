pub mod analytics;
pub mod data;
pub mod error;
pub mod graph;
pub mod pathfind;
pub mod report;

use colored::Colorize;

pub use analytics::{Analytics, DbSummary, DegreeEntry};
pub use data::{Database, EdgeStore, ExpansionRecord};
pub use error::{EndpointFault, GraphError, PathError, StoreError};
pub use graph::GraphIndex;
pub use pathfind::{Frontier, PathFinder, PathOutcome, ProgressCallback, SearchOptions, SearchReport};

pub fn print_banner() {
    let banner = r#"
            _ _    _
 __      __(_) | _(_)_ __ __ _  ___ ___
 \ \ /\ / /| | |/ / | '__/ _` |/ __/ _ \
  \ V  V / | |   <| | | | (_| | (_|  __/
   \_/\_/  |_|_|\_\_|_|  \__,_|\___\___|
"#;
    println!("{}", banner.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "shortest link paths between articles".white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
