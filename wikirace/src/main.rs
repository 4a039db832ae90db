use colored::Colorize;
use commands::command_argument_builder;
use wikirace::handlers::{
    DEFAULT_DB_PATH, exit_code, handle_average, handle_init, handle_path, handle_routes,
    handle_stats, init_logging, resolve_db_path,
};
use wikirace_core::print_banner;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_logging(chosen_command.get_flag("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let db_path = resolve_db_path(
        chosen_command
            .get_one::<String>("db")
            .map(String::as_str)
            .unwrap_or(DEFAULT_DB_PATH),
    );

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("path", primary_command)) => handle_path(primary_command, &db_path, quiet).await,
        Some(("stats", primary_command)) => handle_stats(primary_command, &db_path),
        Some(("average", primary_command)) => handle_average(primary_command, &db_path),
        Some(("routes", primary_command)) => handle_routes(primary_command, &db_path),
        // No subcommand provided, just show the banner
        _ => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(exit_code(&e));
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
