use crate::error::{GraphError, Result};
use crate::model::{CardMember, GraphCardSummary, LinkEdge, NewCard, PageNode, SearchHit};
use crate::source::LinkSource;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

// Keeps IN (...) lists well under SQLite's bound-parameter limit.
const ID_CHUNK: usize = 500;

pub struct Database {
    conn: Connection,
}

/// A page as written by the ingest path. `title` may be unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub weight: i32,
}

/// Lower-cased match text for a page: url without scheme or leading
/// `www.`, followed by the title.
pub fn searchable_text(url: &str, title: Option<&str>) -> String {
    let bare = match Url::parse(url) {
        Ok(parsed) if parsed.has_host() => {
            let rest = &url[parsed.scheme().len()..];
            rest.trim_start_matches(':').trim_start_matches('/').to_string()
        }
        _ => url.to_string(),
    };
    let lowered = bare.to_lowercase();
    let mut text = lowered.strip_prefix("www.").unwrap_or(&lowered).to_string();
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        text.push(' ');
        text.push_str(&title.to_lowercase());
    }
    text
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn placeholders(count: usize, first: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageNode> {
    Ok(PageNode {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        weight: row.get(3)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<GraphCardSummary> {
    let created_ms: i64 = row.get(3)?;
    Ok(GraphCardSummary {
        card_id: row.get(0)?,
        member_count: row.get(1)?,
        description: row.get(2)?,
        created_at: DateTime::from_timestamp_millis(created_ms).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Integer,
                format!("created_at {} is out of range", created_ms).into(),
            )
        })?,
    })
}

impl Database {
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Opens (creating if needed) the database and its schema.
    pub fn new(path: &Path) -> Result<Self> {
        let db = Self::open(path)?;
        db.init_schema()?;
        Ok(db)
    }

    /// Opens a connection to a database whose schema already exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;

        // Readers and the ingest writer run on separate connections
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        Ok(Database { conn })
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- Crawled pages
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    title TEXT,
    search_field TEXT NOT NULL,
    weight INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_pages_search ON pages(search_field);
CREATE INDEX IF NOT EXISTS idx_pages_url ON pages(url);

-- Aggregated links between pages
CREATE TABLE IF NOT EXISTS links (
    from_id INTEGER NOT NULL,
    to_id INTEGER NOT NULL,
    weight INTEGER NOT NULL,
    PRIMARY KEY(from_id, to_id)
);

CREATE INDEX IF NOT EXISTS idx_links_weight ON links(weight);
CREATE INDEX IF NOT EXISTS idx_links_target ON links(to_id);

-- Saved graph cards
CREATE TABLE IF NOT EXISTS graph_cards (
    card_id BLOB PRIMARY KEY,
    owner_id BLOB NOT NULL,
    description TEXT NOT NULL,
    member_count INTEGER NOT NULL,
    created_at INTEGER NOT NULL,  -- unix millis
    deleted INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_graph_cards_owner ON graph_cards(owner_id, deleted);

CREATE TABLE IF NOT EXISTS card_members (
    card_id BLOB NOT NULL,
    ordinal INTEGER NOT NULL,
    node_id INTEGER NOT NULL,
    PRIMARY KEY(card_id, ordinal),
    FOREIGN KEY(card_id) REFERENCES graph_cards(card_id) ON DELETE CASCADE
);
            ",
        )?;
        Ok(())
    }

    pub fn ping(&self) -> bool {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok()
    }

    // Page and link writes

    /// Adds `page.weight` to the stored page, saturating at `i32::MAX`.
    /// The first url and the first known title stick. Pages are keyed by
    /// id only; a url reported under several ids yields several pages.
    pub fn upsert_page(&self, page: &PageRecord) -> Result<()> {
        let search_field = searchable_text(&page.url, page.title.as_deref());
        self.conn.execute(
            "INSERT INTO pages (id, url, title, search_field, weight) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                weight = MIN(pages.weight + excluded.weight, 2147483647),
                title = COALESCE(pages.title, excluded.title),
                search_field = CASE WHEN pages.title IS NULL AND excluded.title IS NOT NULL
                                    THEN excluded.search_field ELSE pages.search_field END",
            params![page.id, &page.url, &page.title, search_field, page.weight],
        )?;
        Ok(())
    }

    pub fn record_link(&self, edge: &LinkEdge) -> Result<()> {
        self.conn.execute(
            "INSERT INTO links (from_id, to_id, weight) VALUES (?1, ?2, ?3)
             ON CONFLICT(from_id, to_id) DO UPDATE SET
                weight = MIN(links.weight + excluded.weight, 2147483647)",
            params![edge.from, edge.to, edge.weight],
        )?;
        Ok(())
    }

    /// Stores an aggregated ingest batch as one transaction.
    pub fn apply_ingest(&self, pages: &[PageRecord], edges: &[LinkEdge]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for page in pages {
            self.upsert_page(page)?;
        }
        for edge in edges {
            self.record_link(edge)?;
        }
        tx.commit()?;
        debug!("Stored {} pages and {} links", pages.len(), edges.len());
        Ok(())
    }

    // Graph card storage

    /// Writes the card header and all members atomically. Returns
    /// `DuplicateIdentity` when the card id is already taken.
    pub fn insert_card(&self, owner_id: Uuid, card: &NewCard, created_at: DateTime<Utc>) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let inserted = tx.execute(
            "INSERT INTO graph_cards (card_id, owner_id, description, member_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(card_id) DO NOTHING",
            params![
                card.card_id,
                owner_id,
                &card.description,
                card.members.len() as i64,
                created_at.timestamp_millis(),
            ],
        )?;
        if inserted == 0 {
            // Dropping the transaction rolls it back
            return Err(GraphError::DuplicateIdentity(card.card_id));
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO card_members (card_id, ordinal, node_id) VALUES (?1, ?2, ?3)",
            )?;
            for member in &card.members {
                stmt.execute(params![card.card_id, member.ordinal, member.node_id])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    pub fn card_summary(&self, card_id: Uuid) -> Result<Option<GraphCardSummary>> {
        let summary = self
            .conn
            .query_row(
                "SELECT card_id, member_count, description, created_at
                 FROM graph_cards WHERE card_id = ?1 AND deleted = 0",
                params![card_id],
                summary_from_row,
            )
            .optional()?;
        Ok(summary)
    }

    /// Live cards of `owner_id`, most recent first.
    pub fn list_cards(&self, owner_id: Uuid) -> Result<Vec<GraphCardSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT card_id, member_count, description, created_at
             FROM graph_cards
             WHERE owner_id = ?1 AND deleted = 0
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let cards = stmt
            .query_map(params![owner_id], summary_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    /// Sets the tombstone. Returns the number of cards affected (0 or 1).
    pub fn tombstone_card(&self, owner_id: Uuid, card_id: Uuid) -> Result<usize> {
        let affected = self.conn.execute(
            "UPDATE graph_cards SET deleted = 1
             WHERE owner_id = ?1 AND card_id = ?2 AND deleted = 0",
            params![owner_id, card_id],
        )?;
        Ok(affected)
    }

    /// Members of a live card ordered by ordinal, or `None` when the card
    /// does not exist or is tombstoned.
    pub fn card_members(&self, card_id: Uuid) -> Result<Option<Vec<CardMember>>> {
        if self.card_summary(card_id)?.is_none() {
            return Ok(None);
        }
        let mut stmt = self.conn.prepare(
            "SELECT node_id, ordinal FROM card_members WHERE card_id = ?1 ORDER BY ordinal",
        )?;
        let members = stmt
            .query_map(params![card_id], |row| {
                Ok(CardMember {
                    node_id: row.get(0)?,
                    ordinal: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(members))
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

impl LinkSource for Database {
    fn node_by_label(&self, label: &str) -> Result<Option<PageNode>> {
        let node = self
            .conn
            .query_row(
                "SELECT id, url, COALESCE(title, url), weight FROM pages
                 WHERE url = ?1 ORDER BY id LIMIT 1",
                params![label],
                page_from_row,
            )
            .optional()?;
        Ok(node)
    }

    fn node_by_id(&self, id: i64) -> Result<Option<PageNode>> {
        let node = self
            .conn
            .query_row(
                "SELECT id, url, COALESCE(title, url), weight FROM pages WHERE id = ?1",
                params![id],
                page_from_row,
            )
            .optional()?;
        Ok(node)
    }

    fn nodes_by_ids(&self, ids: &[i64]) -> Result<Vec<PageNode>> {
        let mut nodes = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(ID_CHUNK) {
            let sql = format!(
                "SELECT id, url, COALESCE(title, url), weight FROM pages WHERE id IN ({}) ORDER BY id",
                placeholders(chunk.len(), 1)
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), page_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            nodes.extend(rows);
        }
        nodes.sort_by_key(|n| n.id);
        nodes.dedup_by_key(|n| n.id);
        Ok(nodes)
    }

    fn edges_from(&self, ids: &[i64], min_weight: i32) -> Result<Vec<LinkEdge>> {
        let mut edges = Vec::new();
        for chunk in ids.chunks(ID_CHUNK) {
            let sql = format!(
                "SELECT from_id, to_id, weight FROM links
                 WHERE weight >= ?1 AND from_id IN ({})
                 ORDER BY from_id, to_id",
                placeholders(chunk.len(), 2)
            );
            let values: Vec<i64> = std::iter::once(i64::from(min_weight))
                .chain(chunk.iter().copied())
                .collect();
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok(LinkEdge {
                        from: row.get(0)?,
                        to: row.get(1)?,
                        weight: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            edges.extend(rows);
        }
        Ok(edges)
    }

    fn all_edges(&self, min_weight: i32) -> Result<Vec<LinkEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT from_id, to_id, weight FROM links WHERE weight >= ?1 ORDER BY from_id, to_id",
        )?;
        let edges = stmt
            .query_map(params![min_weight], |row| {
                Ok(LinkEdge {
                    from: row.get(0)?,
                    to: row.get(1)?,
                    weight: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    fn search_nodes(&self, needle: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
        let mut stmt = self.conn.prepare(
            "SELECT id, url, COALESCE(title, url) FROM pages
             WHERE search_field LIKE ?1 ESCAPE '\\'
             ORDER BY id
             LIMIT ?2",
        )?;
        let hits = stmt
            .query_map(params![pattern, limit as i64], |row| {
                Ok(SearchHit {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    title: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(hits)
    }
}
