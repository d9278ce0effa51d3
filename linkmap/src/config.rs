// Resolved runtime configuration for the HTTP server

use anyhow::{Context, Result};
use clap::ArgMatches;
use linkmap_core::RoleStyles;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = "~/.config/linkmap/linkmap.db";
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub styles: RoleStyles,
    /// Empty means any origin is accepted.
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn new(db_path: PathBuf, addr: SocketAddr) -> Self {
        Self {
            db_path,
            addr,
            styles: RoleStyles::default(),
            allowed_origins: Vec::new(),
        }
    }

    /// Builds the config from the `serve` subcommand. `db_path` is already
    /// expanded. clap has applied the environment fallbacks, with flags
    /// taking priority.
    pub fn from_matches(db_path: &Path, args: &ArgMatches) -> Result<Self> {
        let addr = args
            .get_one::<SocketAddr>("addr")
            .copied()
            .context("listen address is required")?;

        let mut config = Self::new(db_path.to_path_buf(), addr);

        if let Some(path) = args.get_one::<PathBuf>("styles") {
            config.styles = RoleStyles::load(path)
                .with_context(|| format!("failed to load styles from {}", path.display()))?;
        }
        if let Some(origins) = args.get_one::<String>("allowed-origins") {
            config.allowed_origins = parse_origins(origins);
        }

        Ok(config)
    }
}

/// Expands a leading `~` and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| shellexpand::tilde(path).into_owned());
    Path::new(&expanded).to_path_buf()
}

pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
