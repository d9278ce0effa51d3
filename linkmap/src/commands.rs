use crate::CLAP_STYLING;
use clap::{arg, command};
use linkmap::config::{DEFAULT_ADDR, DEFAULT_DB_PATH};
use std::path::PathBuf;

fn format_arg() -> clap::Arg {
    arg!(-f --"format" <FORMAT>)
        .required(false)
        .help("Output format: text, json, dot")
        .value_parser(["text", "json", "dot"])
        .default_value("text")
}

fn output_arg() -> clap::Arg {
    arg!(-o --"output" <PATH>)
        .required(false)
        .help("Save the rendered graph to a file (default: print to screen)")
        .value_parser(clap::value_parser!(PathBuf))
}

fn owner_arg() -> clap::Arg {
    arg!(--"owner" <UUID>)
        .required(true)
        .help("Owner identity of the graph card")
        .value_parser(clap::value_parser!(uuid::Uuid))
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkmap")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkmap")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" ... "Increase log verbosity (-v debug, -vv trace)")
                .required(false),
        )
        .arg(
            arg!(--"db" <PATH>)
                .required(false)
                .global(true)
                .env("LINKMAP_DB")
                .help("Location of the linkmap database")
                .default_value(DEFAULT_DB_PATH),
        )
        .subcommand_required(true)
        .subcommand(
            command!("init")
                .about("Initializes the linkmap database on your filesystem")
                .arg(
                    arg!(-f - -"force")
                        .help("Overwrites any existing database at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("ingest")
                .about("Folds a file of crawler link observations (JSON lines) into the database")
                .arg(
                    arg!(<FILE>)
                        .required(true)
                        .help("Newline-delimited JSON link observations")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                ),
        )
        .subcommand(
            command!("search")
                .about("Finds pages whose url or title contains the text")
                .arg(arg!(<TEXT>).required(true).help("Text to look for")),
        )
        .subcommand(
            command!("graph")
                .about("Renders the neighborhood graph around a page")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("Seed page by url"),
                )
                .arg(
                    arg!(-i --"id" <ID>)
                        .required(false)
                        .help("Seed page by id")
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    arg!(--"full")
                        .required(false)
                        .help("Render every significant link instead of one neighborhood")
                        .action(clap::ArgAction::SetTrue),
                )
                .group(
                    clap::ArgGroup::new("seed")
                        .args(["url", "id", "full"])
                        .required(true),
                )
                .arg(format_arg())
                .arg(output_arg()),
        )
        .subcommand(
            command!("card")
                .about("Manage saved graph cards")
                .subcommand_required(true)
                .subcommand(
                    command!("save")
                        .about("Saves an ordered list of pages as a graph card")
                        .arg(owner_arg())
                        .arg(
                            arg!(--"id" <UUID>)
                                .required(false)
                                .help("Card id (default: a new random id)")
                                .value_parser(clap::value_parser!(uuid::Uuid)),
                        )
                        .arg(
                            arg!(-d --"description" <TEXT>)
                                .required(false)
                                .help("Free-form description")
                                .default_value(""),
                        )
                        .arg(
                            arg!(-n --"nodes" <IDS>)
                                .required(true)
                                .help("Comma-separated page ids, in card order (e.g. 1,2,3)"),
                        ),
                )
                .subcommand(
                    command!("list")
                        .about("Lists the owner's graph cards, most recent first")
                        .arg(owner_arg()),
                )
                .subcommand(
                    command!("delete")
                        .about("Deletes one of the owner's graph cards")
                        .arg(owner_arg())
                        .arg(
                            arg!(--"id" <UUID>)
                                .required(true)
                                .help("Card id")
                                .value_parser(clap::value_parser!(uuid::Uuid)),
                        ),
                )
                .subcommand(
                    command!("recall")
                        .about("Rebuilds and renders the graph stored in a card")
                        .arg(
                            arg!(--"id" <UUID>)
                                .required(true)
                                .help("Card id")
                                .value_parser(clap::value_parser!(uuid::Uuid)),
                        )
                        .arg(format_arg())
                        .arg(output_arg()),
                ),
        )
        .subcommand(
            command!("serve")
                .about("Serves the graph and card API over HTTP")
                .arg(
                    arg!(-a --"addr" <ADDR>)
                        .required(false)
                        .env("LINKMAP_ADDR")
                        .help("Listen address")
                        .value_parser(clap::value_parser!(std::net::SocketAddr))
                        .default_value(DEFAULT_ADDR),
                )
                .arg(
                    arg!(-s --"styles" <PATH>)
                        .required(false)
                        .env("LINKMAP_STYLES")
                        .help("JSON file overriding the node role styles")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"allowed-origins" <ORIGINS>)
                        .required(false)
                        .env("LINKMAP_ALLOWED_ORIGINS")
                        .help("Comma-separated CORS origins (default: any)"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_definition_is_valid() {
        command_argument_builder().debug_assert();
    }

    #[test]
    fn test_graph_requires_a_seed() {
        let result = command_argument_builder().try_get_matches_from(["linkmap", "graph"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_graph_seed_flags_conflict() {
        let result = command_argument_builder()
            .try_get_matches_from(["linkmap", "graph", "--url", "https://a/", "--id", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_db_flag_is_global() {
        let matches = command_argument_builder()
            .try_get_matches_from(["linkmap", "search", "docs", "--db", "/tmp/x.db"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("db").unwrap(), "/tmp/x.db");
    }
}
