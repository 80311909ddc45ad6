//! Embedded redb backend for the link store
//!
//! This module handles the setup of the redb database file and implements
//! [`LinkStore`] on top of it.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::LinkError;
use crate::model::ShortLink;
use crate::store::{new_record, LinkStore};

/// Main table for storing short links
///
/// Key: short code as string
/// Value: JSON-serialized ShortLink as string
///
/// Example:
/// - Key: "abc123"
/// - Value: '{"code":"abc123","target_url":"https://example.com",...}'
pub const TABLE_LINKS: TableDefinition<&str, &str> = TableDefinition::new("links_v1");

/// Creates or opens the database file and makes sure the links table exists
///
/// # Example
///
/// ```no_run
/// # use shortlink::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: impl AsRef<Path>) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    // Opening the table inside a write transaction creates it on first run
    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_LINKS)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// [`LinkStore`] persisted in an embedded redb file
///
/// redb admits one write transaction at a time, so `put` and `resolve` are
/// serialized against each other. Reads run on MVCC snapshots of committed state.
/// Every redb call is moved onto the blocking thread pool.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Opens (or creates) the database at `db_path`
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, LinkError> {
        Ok(Self::new(init_db(db_path)?))
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, LinkError>
    where
        F: FnOnce(&Database) -> Result<T, LinkError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db)).await?
    }
}

fn read_record(db: &Database, code: &str) -> Result<Option<ShortLink>, LinkError> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(TABLE_LINKS)?;

    let record = match table.get(code)? {
        Some(value) => Some(serde_json::from_str(value.value())?),
        None => None,
    };
    Ok(record)
}

#[async_trait]
impl LinkStore for RedbStore {
    async fn put(
        &self,
        code: &str,
        target_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLink, LinkError> {
        let record = new_record(code, target_url, expires_at)?;

        self.blocking(move |db| {
            let record_json = serde_json::to_string(&record)?;

            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(TABLE_LINKS)?;

                // Dropping the uncommitted transaction rolls it back
                if table.get(record.code.as_str())?.is_some() {
                    return Err(LinkError::CodeConflict(record.code));
                }

                table.insert(record.code.as_str(), record_json.as_str())?;
            }
            write_txn.commit()?;

            Ok(record)
        })
        .await
    }

    async fn get(&self, code: &str) -> Result<ShortLink, LinkError> {
        let code = code.to_string();

        self.blocking(move |db| match read_record(db, &code)? {
            Some(link) if link.is_active_at(Utc::now()) => Ok(link),
            _ => Err(LinkError::NotFound(code)),
        })
        .await
    }

    async fn resolve(&self, code: &str) -> Result<String, LinkError> {
        let code = code.to_string();

        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            let target_url = {
                let mut table = write_txn.open_table(TABLE_LINKS)?;

                let stored = match table.get(code.as_str())? {
                    Some(value) => value.value().to_string(),
                    None => return Err(LinkError::NotFound(code)),
                };

                let mut link: ShortLink = serde_json::from_str(&stored)?;
                if !link.is_active_at(Utc::now()) {
                    return Err(LinkError::NotFound(code));
                }

                link.visit_count += 1;
                let record_json = serde_json::to_string(&link)?;
                table.insert(code.as_str(), record_json.as_str())?;

                link.target_url
            };
            write_txn.commit()?;

            Ok(target_url)
        })
        .await
    }

    async fn exists(&self, code: &str) -> Result<bool, LinkError> {
        let code = code.to_string();

        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(TABLE_LINKS)?;
            let occupied = table.get(code.as_str())?.is_some();
            Ok(occupied)
        })
        .await
    }
}
