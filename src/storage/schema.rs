//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the crawl database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track update cycles
CREATE TABLE IF NOT EXISTS update_cycles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    counters TEXT
);

-- One record per canonical URL, keyed by reversed URL
CREATE TABLE IF NOT EXISTS webpages (
    reversed_url TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    fetch_time TEXT NOT NULL,
    prev_fetch_time TEXT NOT NULL,
    modified_time TEXT NOT NULL,
    prev_modified_time TEXT NOT NULL,
    fetch_interval INTEGER NOT NULL,
    retries_since_fetch INTEGER NOT NULL DEFAULT 0,
    fetch_count INTEGER NOT NULL DEFAULT 0,
    depth INTEGER NOT NULL,
    score REAL NOT NULL DEFAULT 0,
    signature BLOB,
    prev_signature BLOB,
    batch_id TEXT,
    crawl_id TEXT,
    publish_time TEXT,
    ref_publish_time TEXT,
    page_category TEXT NOT NULL,
    page_category_likelihood REAL NOT NULL DEFAULT 0,
    inlinks TEXT NOT NULL,
    outlinks TEXT NOT NULL,
    headers TEXT NOT NULL,
    metadata TEXT NOT NULL,
    marks TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_webpages_status ON webpages(status);
CREATE INDEX IF NOT EXISTS idx_webpages_depth ON webpages(depth);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
