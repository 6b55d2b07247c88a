//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::{CrawlStatus, PageCategory, WebPage};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CycleRecord, CycleStatus};
use crate::update::UpdateCounters;
use crate::UpdateError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const PAGE_COLUMNS: &str = "reversed_url, status, fetch_time, prev_fetch_time, modified_time,
    prev_modified_time, fetch_interval, retries_since_fetch, fetch_count, depth, score,
    signature, prev_signature, batch_id, crawl_id, publish_time, ref_publish_time,
    page_category, page_category_likelihood, inlinks, outlinks, headers, metadata, marks";

const CYCLE_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, counters";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(UpdateError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, UpdateError> {
        let conn = init_database(path)?;

        conn.execute_batch(
            "
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, UpdateError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// A `webpages` row before its text and JSON columns are decoded
struct PageRow {
    reversed_url: String,
    status: String,
    fetch_time: String,
    prev_fetch_time: String,
    modified_time: String,
    prev_modified_time: String,
    fetch_interval: i64,
    retries_since_fetch: u32,
    fetch_count: u32,
    depth: u32,
    score: f64,
    signature: Option<Vec<u8>>,
    prev_signature: Option<Vec<u8>>,
    batch_id: Option<String>,
    crawl_id: Option<String>,
    publish_time: Option<String>,
    ref_publish_time: Option<String>,
    page_category: String,
    page_category_likelihood: f64,
    inlinks: String,
    outlinks: String,
    headers: String,
    metadata: String,
    marks: String,
}

impl PageRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            reversed_url: row.get(0)?,
            status: row.get(1)?,
            fetch_time: row.get(2)?,
            prev_fetch_time: row.get(3)?,
            modified_time: row.get(4)?,
            prev_modified_time: row.get(5)?,
            fetch_interval: row.get(6)?,
            retries_since_fetch: row.get(7)?,
            fetch_count: row.get(8)?,
            depth: row.get(9)?,
            score: row.get(10)?,
            signature: row.get(11)?,
            prev_signature: row.get(12)?,
            batch_id: row.get(13)?,
            crawl_id: row.get(14)?,
            publish_time: row.get(15)?,
            ref_publish_time: row.get(16)?,
            page_category: row.get(17)?,
            page_category_likelihood: row.get(18)?,
            inlinks: row.get(19)?,
            outlinks: row.get(20)?,
            headers: row.get(21)?,
            metadata: row.get(22)?,
            marks: row.get(23)?,
        })
    }

    fn into_page(self) -> StorageResult<(String, WebPage)> {
        let status = CrawlStatus::from_db_string(&self.status).ok_or_else(|| {
            StorageError::Serialization(format!(
                "unknown status '{}' for {}",
                self.status, self.reversed_url
            ))
        })?;

        let page = WebPage {
            status,
            fetch_time: parse_time(&self.fetch_time)?,
            prev_fetch_time: parse_time(&self.prev_fetch_time)?,
            modified_time: parse_time(&self.modified_time)?,
            prev_modified_time: parse_time(&self.prev_modified_time)?,
            fetch_interval: self.fetch_interval,
            retries_since_fetch: self.retries_since_fetch,
            fetch_count: self.fetch_count,
            depth: self.depth,
            score: self.score as f32,
            signature: self.signature,
            prev_signature: self.prev_signature,
            batch_id: self.batch_id,
            crawl_id: self.crawl_id,
            publish_time: self.publish_time.as_deref().map(parse_time).transpose()?,
            ref_publish_time: self.ref_publish_time.as_deref().map(parse_time).transpose()?,
            page_category: PageCategory::from_db_string(&self.page_category).unwrap_or_default(),
            page_category_likelihood: self.page_category_likelihood as f32,
            inlinks: serde_json::from_str(&self.inlinks)?,
            outlinks: serde_json::from_str(&self.outlinks)?,
            headers: serde_json::from_str(&self.headers)?,
            metadata: serde_json::from_str(&self.metadata)?,
            marks: serde_json::from_str(&self.marks)?,
        };

        Ok((self.reversed_url, page))
    }
}

fn parse_time(s: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("bad timestamp '{}': {}", s, e)))
}

fn read_cycle(row: &Row<'_>) -> rusqlite::Result<(CycleRecord, Option<String>)> {
    let record = CycleRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: CycleStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(CycleStatus::Running),
        counters: None,
    };
    Ok((record, row.get(5)?))
}

fn with_counters(
    (mut record, counters): (CycleRecord, Option<String>),
) -> StorageResult<CycleRecord> {
    record.counters = counters
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;
    Ok(record)
}

impl Storage for SqliteStorage {
    // ===== Cycle Management =====

    fn create_cycle(
        &mut self,
        config_hash: &str,
        started_at: DateTime<Utc>,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO update_cycles (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![
                started_at.to_rfc3339(),
                config_hash,
                CycleStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_cycle(&self, cycle_id: i64) -> StorageResult<CycleRecord> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM update_cycles WHERE id = ?1", CYCLE_COLUMNS),
                params![cycle_id],
                read_cycle,
            )
            .optional()?
            .ok_or(StorageError::CycleNotFound(cycle_id))?;

        with_counters(row)
    }

    fn get_latest_cycle(&self) -> StorageResult<Option<CycleRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM update_cycles ORDER BY id DESC LIMIT 1",
                    CYCLE_COLUMNS
                ),
                [],
                read_cycle,
            )
            .optional()?
            .map(with_counters)
            .transpose()
    }

    fn complete_cycle(
        &mut self,
        cycle_id: i64,
        status: CycleStatus,
        counters: &UpdateCounters,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let counters = serde_json::to_string(counters)?;
        let updated = self.conn.execute(
            "UPDATE update_cycles SET status = ?1, finished_at = ?2, counters = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, counters, cycle_id],
        )?;

        if updated == 0 {
            return Err(StorageError::CycleNotFound(cycle_id));
        }
        Ok(())
    }

    // ===== Page Management =====

    fn get_page(&self, reversed_url: &str) -> StorageResult<Option<WebPage>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM webpages WHERE reversed_url = ?1", PAGE_COLUMNS),
                params![reversed_url],
                PageRow::read,
            )
            .optional()?;

        match row {
            Some(row) => Ok(Some(row.into_page()?.1)),
            None => Ok(None),
        }
    }

    fn put_page(&mut self, reversed_url: &str, page: &WebPage) -> StorageResult<()> {
        if reversed_url.is_empty() {
            return Err(StorageError::ConstraintViolation(
                "empty page key".to_string(),
            ));
        }

        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO webpages ({}) VALUES
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                  ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
                PAGE_COLUMNS
            ),
            params![
                reversed_url,
                page.status.to_db_string(),
                page.fetch_time.to_rfc3339(),
                page.prev_fetch_time.to_rfc3339(),
                page.modified_time.to_rfc3339(),
                page.prev_modified_time.to_rfc3339(),
                page.fetch_interval,
                page.retries_since_fetch,
                page.fetch_count,
                page.depth,
                page.score as f64,
                page.signature,
                page.prev_signature,
                page.batch_id,
                page.crawl_id,
                page.publish_time.map(|t| t.to_rfc3339()),
                page.ref_publish_time.map(|t| t.to_rfc3339()),
                page.page_category.to_db_string(),
                page.page_category_likelihood as f64,
                serde_json::to_string(&page.inlinks)?,
                serde_json::to_string(&page.outlinks)?,
                serde_json::to_string(&page.headers)?,
                serde_json::to_string(&page.metadata)?,
                serde_json::to_string(&page.marks)?,
            ],
        )?;
        Ok(())
    }

    fn scan_pages(&self) -> StorageResult<Vec<(String, StorageResult<WebPage>)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM webpages ORDER BY reversed_url",
            PAGE_COLUMNS
        ))?;

        // Decode failures stay with their row
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, PageRow::read(row))))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(key, row)| {
                let page = row
                    .map_err(StorageError::from)
                    .and_then(PageRow::into_page)
                    .map(|(_, page)| page);
                (key, page)
            })
            .collect())
    }

    // ===== Statistics =====

    fn count_pages_by_status(&self, status: CrawlStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM webpages WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM webpages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn get_depth_breakdown(&self) -> StorageResult<HashMap<u32, usize>> {
        let query = "
            SELECT depth, COUNT(*) as count
            FROM webpages
            WHERE depth < ?1
            GROUP BY depth
            ORDER BY depth
        ";

        let mut stmt = self.conn.prepare(query)?;
        let rows = stmt.query_map(params![crate::state::UNKNOWN_DEPTH], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, usize>(1)?))
        })?;

        let mut breakdown = HashMap::new();
        for row in rows {
            let (depth, count) = row?;
            breakdown.insert(depth, count);
        }

        Ok(breakdown)
    }
}

/// Initializes or opens a database at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
