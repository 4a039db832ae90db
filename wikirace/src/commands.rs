use crate::CLAP_STYLING;
use clap::{arg, command};
use wikirace::handlers::DEFAULT_DB_PATH;
use wikirace_source::wikipedia::DEFAULT_LANG;

fn format_arg() -> clap::Arg {
    arg!(--"format" <FORMAT>)
        .required(false)
        .help("Report format: text, json")
        .value_parser(["text", "txt", "json"])
        .default_value("text")
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikirace")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikirace")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log every fetch and expansion")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"db" <PATH>)
                .required(false)
                .help("Location of the link database")
                .default_value(DEFAULT_DB_PATH)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the wikirace link database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to store the wikirace database in")
                        .default_value("~/.config/wikirace/"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help(
                            "Forces the overwriting of any existing database at the specified \
                        location.",
                        )
                        .required(false),
                ),
        )
        .subcommand(
            command!("path")
                .about(
                    "Finds the shortest chain of links between two articles, fetching and \
                storing links only where the stored graph is not enough.",
                )
                .arg(arg!(<START> "The article to start from"))
                .arg(arg!(<FINISH> "The article to reach"))
                .arg(
                    arg!(-d --"max-depth" <ROUNDS>)
                        .required(false)
                        .help("Maximum number of expansion rounds")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                )
                .arg(
                    arg!(-k --"links-per-page" <COUNT>)
                        .required(false)
                        .help("Maximum number of links kept per expanded article")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("200"),
                )
                .arg(
                    arg!(--"rpm" <REQUESTS>)
                        .required(false)
                        .help("Requests per minute sent to the link source (0 disables the limit)")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("100"),
                )
                .arg(
                    arg!(-t --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of fetches kept in flight within one round")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(-l --"lang" <LANG>)
                        .required(false)
                        .help("Wikipedia language edition")
                        .default_value(DEFAULT_LANG),
                )
                .arg(
                    arg!(--"api-url" <URL>)
                        .required(false)
                        .help("Use this MediaWiki API endpoint instead of the language edition")
                        .value_parser(clap::value_parser!(url::Url)),
                )
                .arg(format_arg()),
        )
        .subcommand(
            command!("stats")
                .about("Shows counts and the most connected articles in the database")
                .arg(format_arg()),
        )
        .subcommand(
            command!("average")
                .about("Average number of second-level descendants per first-level link")
                .arg(arg!(<ARTICLE> "The article to measure"))
                .arg(format_arg()),
        )
        .subcommand(
            command!("routes")
                .about("Lists stored routes of exactly N hops")
                .arg(
                    arg!(<HOPS> "Number of links in each route")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"limit" <COUNT>)
                        .required(false)
                        .help("Maximum number of routes to list")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("5"),
                )
                .arg(format_arg()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikirace_core::analytics::MAX_ROUTES;
    use wikirace_core::pathfind::{DEFAULT_LINKS_PER_PAGE, DEFAULT_MAX_DEPTH, DEFAULT_WORKERS};
    use wikirace_source::wikipedia::DEFAULT_REQUESTS_PER_MINUTE;

    #[test]
    fn test_command_definition_is_valid() {
        command_argument_builder().debug_assert();
    }

    #[test]
    fn test_path_defaults() {
        let matches = command_argument_builder()
            .try_get_matches_from(["wikirace", "path", "Дружба", "Рим"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "path");
        assert_eq!(sub.get_one::<String>("START").unwrap(), "Дружба");
        assert_eq!(*sub.get_one::<usize>("max-depth").unwrap(), DEFAULT_MAX_DEPTH);
        assert_eq!(
            *sub.get_one::<usize>("links-per-page").unwrap(),
            DEFAULT_LINKS_PER_PAGE
        );
        assert_eq!(*sub.get_one::<usize>("workers").unwrap(), DEFAULT_WORKERS);
        assert_eq!(
            *sub.get_one::<u32>("rpm").unwrap(),
            DEFAULT_REQUESTS_PER_MINUTE
        );
        assert_eq!(sub.get_one::<String>("lang").unwrap(), DEFAULT_LANG);
        assert_eq!(matches.get_one::<String>("db").unwrap(), DEFAULT_DB_PATH);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = command_argument_builder()
            .try_get_matches_from(["wikirace", "stats", "-q", "--db", "/tmp/links.db"])
            .unwrap();
        assert!(matches.get_flag("quiet"));
        assert_eq!(matches.get_one::<String>("db").unwrap(), "/tmp/links.db");
    }

    #[test]
    fn test_routes_default_limit() {
        let matches = command_argument_builder()
            .try_get_matches_from(["wikirace", "routes", "3"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(*sub.get_one::<usize>("HOPS").unwrap(), 3);
        assert_eq!(*sub.get_one::<usize>("limit").unwrap(), MAX_ROUTES);
    }

    #[test]
    fn test_routes_requires_numeric_hops() {
        let result =
            command_argument_builder().try_get_matches_from(["wikirace", "routes", "three"]);
        assert!(result.is_err());
    }
}
