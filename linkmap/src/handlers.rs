use crate::config::{DEFAULT_DB_PATH, ServerConfig, expand_path};
use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use linkmap_core::model::{CardMember, GraphCardSummary, NewCard, SearchHit, Seed};
use linkmap_core::report::{ReportFormat, render_card, render_graph, save_report};
use linkmap_core::{Database, GraphAssembler, GraphPersistence, SearchIndex};
use linkmap_ingest::IngestPipeline;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

// Helper functions

/// Database location from the global `--db` flag (or `LINKMAP_DB`).
pub fn db_path_from(args: &ArgMatches) -> PathBuf {
    let raw = args
        .get_one::<String>("db")
        .map(String::as_str)
        .unwrap_or(DEFAULT_DB_PATH);
    expand_path(raw)
}

/// Parses `1,2,3` into card members numbered in the given order.
pub fn parse_node_list(value: &str) -> Result<Vec<CardMember>, String> {
    let mut members = Vec::new();
    for (ordinal, part) in value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
    {
        let node_id = part
            .parse::<i64>()
            .map_err(|_| format!("'{}' is not a page id", part))?;
        members.push(CardMember {
            node_id,
            ordinal: ordinal as i64,
        });
    }

    if members.is_empty() {
        return Err("At least one page id is required".to_string());
    }
    Ok(members)
}

pub fn parse_format(value: &str) -> Result<ReportFormat, String> {
    ReportFormat::from_str(value).ok_or_else(|| format!("Unknown format '{}'", value))
}

pub fn seed_from_args(args: &ArgMatches) -> Option<Seed> {
    if let Some(url) = args.get_one::<String>("url") {
        Some(Seed::Url(url.clone()))
    } else {
        args.get_one::<i64>("id").map(|id| Seed::Id(*id))
    }
}

fn open_existing(db_path: &Path) -> Result<Database> {
    if !Database::exists(db_path) {
        bail!(
            "No database at {}. Run `linkmap init` first.",
            db_path.display()
        );
    }
    Database::new(db_path).with_context(|| format!("failed to open {}", db_path.display()))
}

fn emit(content: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            save_report(content, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "{} Saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn print_card(card: &GraphCardSummary) {
    println!(
        "  {} {}  {} nodes  {}",
        "•".blue(),
        card.card_id.to_string().bright_white(),
        card.member_count,
        card.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    if !card.description.is_empty() {
        println!("    {}", card.description);
    }
}

fn print_hits(hits: &[SearchHit]) {
    for hit in hits {
        println!(
            "{:>8}  {}  {}",
            hit.id.to_string().bright_white(),
            hit.url,
            hit.title.dimmed()
        );
    }
}

// Command handlers

pub fn handle_init(db_path: &Path, args: &ArgMatches) -> Result<()> {
    let force = args.get_flag("force");

    print_divider();
    println!("{}", "  LINKMAP INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    if Database::exists(db_path) {
        let overwrite = force || {
            println!("{}", "⚠ WARNING".yellow().bold());
            println!(
                "Database already exists at: {}",
                db_path.display().to_string().bright_white()
            );
            let response = print_prompt("Would you like to overwrite it? [y/N]:")?;
            response == "y" || response == "yes"
        };

        if !overwrite {
            println!("{} Keeping existing database", "→".blue());
            return Ok(());
        }
        Database::drop(db_path)
            .with_context(|| format!("failed to remove {}", db_path.display()))?;
        println!("{} Existing database removed", "✓".green().bold());
    }

    Database::new(db_path)?;
    println!(
        "{} Database initialized: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    Ok(())
}

pub async fn handle_ingest(db_path: &Path, args: &ArgMatches) -> Result<()> {
    let file = args
        .get_one::<PathBuf>("FILE")
        .ok_or_else(|| anyhow!("an observation file is required"))?;
    let threads = args.get_one::<usize>("threads").copied().unwrap_or(4).max(1);
    let db = open_existing(db_path)?;

    println!(
        "{} Ingesting {} with {} workers",
        "→".blue(),
        file.display().to_string().bright_white(),
        threads
    );

    let m = MultiProgress::new();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} Worker {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let mut bars = HashMap::new();
    for i in 0..threads {
        let pb = m.add(ProgressBar::new_spinner());
        pb.set_style(style.clone());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("{}: idle", i));
        bars.insert(i, pb);
    }
    let worker_bars = Arc::new(Mutex::new(bars));

    let worker_bars_clone = worker_bars.clone();
    let pipeline = IngestPipeline::new().with_progress_callback(Arc::new(
        move |worker_id: usize, url: String| {
            if let Ok(bars) = worker_bars_clone.try_lock()
                && let Some(pb) = bars.get(&worker_id)
            {
                pb.set_message(format!("{}: {}", worker_id, url));
            }
        },
    ));

    let result = pipeline.ingest_file(file, threads).await;

    if let Ok(bars) = worker_bars.lock() {
        for pb in bars.values() {
            pb.finish_and_clear();
        }
    }
    let _ = m.clear();

    let outcome = result?;
    outcome.persist(&db)?;

    let summary = &outcome.summary;
    println!("{} Ingest complete", "✓".green().bold());
    println!("  Accepted observations: {}", summary.accepted);
    if summary.rejected > 0 {
        println!(
            "  {} {}",
            "Rejected observations:".yellow(),
            summary.rejected
        );
    }
    println!("  Pages: {}", summary.nodes);
    println!("  Links: {}", summary.edges);
    Ok(())
}

pub fn handle_search(db_path: &Path, args: &ArgMatches) -> Result<()> {
    let text = args
        .get_one::<String>("TEXT")
        .ok_or_else(|| anyhow!("search text is required"))?;
    let db = open_existing(db_path)?;

    let hits = SearchIndex::new(&db).search(text)?;
    if hits.is_empty() {
        println!("{} No pages match '{}'", "✗".red().bold(), text);
    } else {
        print_hits(&hits);
    }
    Ok(())
}

pub fn handle_graph(db_path: &Path, args: &ArgMatches) -> Result<()> {
    let format = parse_format(args.get_one::<String>("format").map_or("text", String::as_str))
        .map_err(|e| anyhow!(e))?;
    let db = open_existing(db_path)?;
    let assembler = GraphAssembler::new(&db);

    let graph = if args.get_flag("full") {
        assembler.full_graph()?
    } else {
        let seed = seed_from_args(args).ok_or_else(|| anyhow!("--url, --id or --full is required"))?;
        assembler.expand(&seed)?
    };

    let content = render_graph(&graph, format)?;
    emit(&content, args.get_one::<PathBuf>("output"))
}

pub fn handle_card_save(db_path: &Path, args: &ArgMatches) -> Result<()> {
    let owner = *args
        .get_one::<Uuid>("owner")
        .ok_or_else(|| anyhow!("--owner is required"))?;
    let card_id = args.get_one::<Uuid>("id").copied().unwrap_or_else(Uuid::new_v4);
    let description = args
        .get_one::<String>("description")
        .cloned()
        .unwrap_or_default();
    let nodes = args
        .get_one::<String>("nodes")
        .ok_or_else(|| anyhow!("--nodes is required"))?;
    let members = parse_node_list(nodes).map_err(|e| anyhow!(e))?;

    let db = open_existing(db_path)?;
    let summary = GraphPersistence::new(&db).save(
        owner,
        NewCard {
            card_id,
            description,
            members,
        },
    )?;

    println!("{} Saved graph card", "✓".green().bold());
    print_card(&summary);
    Ok(())
}

pub fn handle_card_list(db_path: &Path, args: &ArgMatches) -> Result<()> {
    let owner = *args
        .get_one::<Uuid>("owner")
        .ok_or_else(|| anyhow!("--owner is required"))?;
    let db = open_existing(db_path)?;

    let cards = GraphPersistence::new(&db).list(owner)?;
    if cards.is_empty() {
        println!("{} No graph cards", "→".blue());
    }
    for card in &cards {
        print_card(card);
    }
    Ok(())
}

pub fn handle_card_delete(db_path: &Path, args: &ArgMatches) -> Result<()> {
    let owner = *args
        .get_one::<Uuid>("owner")
        .ok_or_else(|| anyhow!("--owner is required"))?;
    let card_id = *args
        .get_one::<Uuid>("id")
        .ok_or_else(|| anyhow!("--id is required"))?;
    let db = open_existing(db_path)?;

    let remaining = GraphPersistence::new(&db).soft_delete(owner, card_id)?;
    println!("{} Deleted graph card {}", "✓".green().bold(), card_id);
    println!("  {} cards remaining", remaining.len());
    Ok(())
}

pub fn handle_card_recall(db_path: &Path, args: &ArgMatches) -> Result<()> {
    let card_id = *args
        .get_one::<Uuid>("id")
        .ok_or_else(|| anyhow!("--id is required"))?;
    let format = parse_format(args.get_one::<String>("format").map_or("text", String::as_str))
        .map_err(|e| anyhow!(e))?;
    let db = open_existing(db_path)?;

    let card = GraphPersistence::new(&db).recall(card_id)?;
    let content = render_card(&card, format)?;
    emit(&content, args.get_one::<PathBuf>("output"))
}

pub async fn handle_serve(db_path: &Path, args: &ArgMatches) -> Result<()> {
    let config = ServerConfig::from_matches(db_path, args)?;

    print_divider();
    println!("{}", "  LINKMAP SERVER".bright_white().bold());
    print_divider();
    println!(
        "{} Database: {}",
        "→".blue(),
        config.db_path.display().to_string().bright_white()
    );
    println!(
        "{} Listening on http://{}",
        "→".blue(),
        config.addr.to_string().bright_white()
    );
    println!();

    crate::server::serve(config).await
}
