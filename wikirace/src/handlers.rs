use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use url::Url;
use wikirace_core::analytics::{Analytics, load_graph, summarize};
use wikirace_core::data::Database;
use wikirace_core::error::PathError;
use wikirace_core::pathfind::{PathFinder, ProgressCallback, SearchOptions, SearchReport};
use wikirace_core::report::{
    AverageReport, ReportFormat, RoutesReport, generate_average_text, generate_json,
    generate_path_text, generate_routes_text, generate_summary_text,
};
use wikirace_source::{SourceConfig, WikipediaSource};

pub const DEFAULT_DB_PATH: &str = "~/.config/wikirace/wikirace.db";
pub const DB_FILE_NAME: &str = "wikirace.db";

/// Process exit code for a start or finish article that does not exist or
/// is a disambiguation page.
pub const EXIT_INVALID_ENDPOINT: i32 = 2;

/// Sends log output to stderr so reports on stdout stay machine readable.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

pub fn resolve_db_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn parse_format(raw: Option<&String>) -> Result<ReportFormat> {
    let raw = raw.map(String::as_str).unwrap_or("text");
    ReportFormat::from_str(raw).with_context(|| format!("Unsupported report format '{}'", raw))
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<PathError>() {
        Some(PathError::InvalidEndpoint { .. }) => EXIT_INVALID_ENDPOINT,
        _ => 1,
    }
}

/// Opens an existing database; refuses to create one implicitly.
pub fn open_database(path: &Path) -> Result<Database> {
    if !Database::exists(path) {
        bail!(
            "No database at {} (run `wikirace init` first)",
            path.display()
        );
    }
    Database::new(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Creates `config_dir` and the database inside it. An existing database is
/// kept unless `overwrite` is set. Returns the database path.
pub fn init_database(config_dir: &Path, overwrite: bool) -> Result<PathBuf> {
    fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;

    let db_path = config_dir.join(DB_FILE_NAME);
    if overwrite && Database::exists(&db_path) {
        Database::drop(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
    }
    Database::new(&db_path)
        .with_context(|| format!("Failed to create database {}", db_path.display()))?;
    Ok(db_path)
}

pub fn search_options(args: &ArgMatches) -> Result<SearchOptions> {
    let options = SearchOptions {
        max_depth: *args.get_one::<usize>("max-depth").unwrap_or(&4),
        links_per_page: *args.get_one::<usize>("links-per-page").unwrap_or(&200),
        workers: *args.get_one::<usize>("workers").unwrap_or(&1),
    };
    if options.workers == 0 {
        bail!("--workers must be at least 1");
    }
    if options.links_per_page == 0 {
        bail!("--links-per-page must be at least 1");
    }
    Ok(options)
}

pub fn source_config(args: &ArgMatches) -> SourceConfig {
    let defaults = SourceConfig::default();
    SourceConfig {
        lang: args
            .get_one::<String>("lang")
            .cloned()
            .unwrap_or(defaults.lang),
        api_url: args.get_one::<Url>("api-url").map(|u| u.to_string()),
        requests_per_minute: args
            .get_one::<u32>("rpm")
            .copied()
            .unwrap_or(defaults.requests_per_minute),
        timeout_secs: defaults.timeout_secs,
    }
}

pub fn render<T, F>(kind: &str, data: &T, format: ReportFormat, text: F) -> Result<String>
where
    T: Serialize,
    F: Fn(&T) -> String,
{
    match format {
        ReportFormat::Text => Ok(text(data)),
        ReportFormat::Json => Ok(generate_json(kind, data)?),
    }
}

pub fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    let raw_dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or("~/.config/wikirace/");
    let force = args.get_flag("force");
    let config_dir = resolve_db_path(raw_dir);
    let db_path = config_dir.join(DB_FILE_NAME);

    print_divider();
    println!("{}", "  WIKIRACE INITIALIZATION".bright_white().bold());
    print_divider();
    println!();
    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    let mut overwrite = force;
    if Database::exists(&db_path) && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("Database already exists at:");
        println!(
            "  {} {}",
            "•".yellow(),
            db_path.display().to_string().bright_white()
        );
        println!();

        let response = print_prompt("Discard its stored links and start over? [y/N]:")?;
        println!();
        overwrite = response == "y" || response == "yes";
        if !overwrite {
            println!("{} Keeping existing database", "→".blue());
        }
    }

    let db_path = init_database(&config_dir, overwrite)?;

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    println!();
    Ok(())
}

/// Runs one query against the stored graph, expanding through `source`.
pub async fn run_search<S>(
    db: &Database,
    source: S,
    start: &str,
    finish: &str,
    options: &SearchOptions,
    progress: Option<ProgressCallback>,
) -> Result<SearchReport, PathError>
where
    S: wikirace_source::LinkSource,
{
    let mut finder = PathFinder::new(source, db).with_options(options.clone());
    if let Some(callback) = progress {
        finder = finder.with_progress_callback(callback);
    }
    finder.search(start, finish, options).await
}

pub async fn handle_path(args: &ArgMatches, db_path: &Path, quiet: bool) -> Result<()> {
    let start = args
        .get_one::<String>("START")
        .context("START is required")?;
    let finish = args
        .get_one::<String>("FINISH")
        .context("FINISH is required")?;
    let format = parse_format(args.get_one::<String>("format"))?;
    let options = search_options(args)?;
    let config = source_config(args);

    let db = open_database(db_path)?;
    let source = WikipediaSource::new(&config)?;

    let bar = spinner(quiet);
    bar.set_message(format!("Searching '{}' → '{}'", start, finish));
    let progress_bar = bar.clone();
    let progress: ProgressCallback = Arc::new(move |msg: String| progress_bar.set_message(msg));

    let outcome = run_search(&db, source, start, finish, &options, Some(progress)).await;
    bar.finish_and_clear();
    let report = outcome?;

    print!(
        "{}",
        render("path", &report, format, generate_path_text)?
    );
    Ok(())
}

pub fn handle_stats(args: &ArgMatches, db_path: &Path) -> Result<()> {
    let format = parse_format(args.get_one::<String>("format"))?;
    let db = open_database(db_path)?;
    let summary = summarize(&db)?;

    print!(
        "{}",
        render("stats", &summary, format, generate_summary_text)?
    );
    Ok(())
}

pub fn handle_average(args: &ArgMatches, db_path: &Path) -> Result<()> {
    let format = parse_format(args.get_one::<String>("format"))?;
    let article = args
        .get_one::<String>("ARTICLE")
        .context("ARTICLE is required")?;
    let db = open_database(db_path)?;
    let graph = load_graph(&db)?;

    let report = AverageReport {
        article: article.clone(),
        average: Analytics::new(&graph).average_second_level(article),
    };
    print!(
        "{}",
        render("average", &report, format, generate_average_text)?
    );
    Ok(())
}

pub fn handle_routes(args: &ArgMatches, db_path: &Path) -> Result<()> {
    let format = parse_format(args.get_one::<String>("format"))?;
    let hops = *args.get_one::<usize>("HOPS").context("HOPS is required")?;
    let limit = *args.get_one::<usize>("limit").unwrap_or(&5);
    let db = open_database(db_path)?;
    let graph = load_graph(&db)?;

    let report = RoutesReport {
        hops,
        routes: Analytics::new(&graph).routes(hops, limit),
    };
    print!(
        "{}",
        render("routes", &report, format, generate_routes_text)?
    );
    Ok(())
}
