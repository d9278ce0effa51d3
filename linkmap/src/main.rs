use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use linkmap::handlers::{
    db_path_from, handle_card_delete, handle_card_list, handle_card_recall, handle_card_save,
    handle_graph, handle_ingest, handle_init, handle_search, handle_serve,
};
use tracing_subscriber::EnvFilter;

mod commands;

fn init_tracing(matches: &ArgMatches) {
    let level = if matches.get_flag("quiet") {
        "warn"
    } else {
        match matches.get_count("verbose") {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    // RUST_LOG wins over the command-line verbosity
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();
    init_tracing(&chosen_command);

    let db_path = db_path_from(&chosen_command);

    let result = match chosen_command.subcommand() {
        Some(("init", args)) => handle_init(&db_path, args),
        Some(("ingest", args)) => handle_ingest(&db_path, args).await,
        Some(("search", args)) => handle_search(&db_path, args),
        Some(("graph", args)) => handle_graph(&db_path, args),
        Some(("card", primary_command)) => match primary_command.subcommand() {
            Some(("save", args)) => handle_card_save(&db_path, args),
            Some(("list", args)) => handle_card_list(&db_path, args),
            Some(("delete", args)) => handle_card_delete(&db_path, args),
            Some(("recall", args)) => handle_card_recall(&db_path, args),
            _ => unreachable!("clap should ensure we don't get here"),
        },
        Some(("serve", args)) => handle_serve(&db_path, args).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
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
