//! SQLite storage backend for the library

use super::traits::{OpenStore, StorageError, StorageResult, TagStore};
use crate::error::{LibraryError, LibraryResult};
use crate::ident;
use crate::library::{DocId, Document, ReadingStatus, Tag, TagId, TagUsage};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Attempts for a mutation that hits SQLITE_BUSY before giving up
const BUSY_RETRIES: u32 = 5;
/// Delay between busy retries
const BUSY_BACKOFF: Duration = Duration::from_millis(50);

/// SQLite-backed tag store
///
/// Uses a single SQLite database file with tables for documents, tags, and
/// the document/tag join relation. Thread-safe via internal mutex on the
/// connection; cross-process writers are serialized by `BEGIN IMMEDIATE`
/// transactions, so the status read-modify-write in `attach` can never leave
/// a document with two reading-status tags.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Documents table (one row per identifier, created on first attach)
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY,
                identifier TEXT NOT NULL UNIQUE,
                folder TEXT NOT NULL,
                filename TEXT NOT NULL,
                added_at TEXT NOT NULL,
                last_accessed_at TEXT
            );

            -- Tags table (name is the natural key)
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at TEXT NOT NULL
            );

            -- Join relation: membership is a set, hence the composite key
            CREATE TABLE IF NOT EXISTS document_tags (
                document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (document_id, tag_id)
            );

            CREATE INDEX IF NOT EXISTS idx_document_tags_tag
                ON document_tags(tag_id);

            -- Enable foreign keys (per-connection setting)
            PRAGMA foreign_keys = ON;

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Seed the reading-status tags with their fixed descriptions
    ///
    /// Safe to run on every open: existing rows are left untouched.
    fn seed_defaults(conn: &Connection) -> StorageResult<()> {
        for status in ReadingStatus::ALL {
            conn.execute(
                "INSERT INTO tags (name, description, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO NOTHING",
                params![
                    status.as_str(),
                    status.seed_description(),
                    Utc::now().to_rfc3339()
                ],
            )?;
        }
        Ok(())
    }

    fn is_busy(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
        )
    }

    /// Run a mutation with bounded retries on SQLITE_BUSY/SQLITE_LOCKED
    ///
    /// Exhausted retries surface as `StorageError::Contention`.
    fn with_retry<T>(
        &self,
        op: &str,
        mut f: impl FnMut(&mut Connection) -> LibraryResult<T>,
    ) -> LibraryResult<T> {
        let mut conn = self.conn.lock().unwrap();
        let mut attempt = 0;
        loop {
            match f(&mut conn) {
                Err(LibraryError::Storage(StorageError::Database(ref e)))
                    if Self::is_busy(e) && attempt < BUSY_RETRIES =>
                {
                    attempt += 1;
                    debug!(op, attempt, "database busy, retrying");
                    std::thread::sleep(BUSY_BACKOFF);
                }
                Err(LibraryError::Storage(StorageError::Database(e))) if Self::is_busy(&e) => {
                    return Err(StorageError::Contention(format!(
                        "{} still busy after {} retries: {}",
                        op, attempt, e
                    ))
                    .into());
                }
                other => return other,
            }
        }
    }

    fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StorageError::DateParse(e.to_string()))
    }

    /// Deserialize a tag from database columns
    fn row_to_tag(
        id: i64,
        name: String,
        description: Option<String>,
        created_at: String,
    ) -> StorageResult<Tag> {
        Ok(Tag {
            id: TagId::new(id),
            name,
            description,
            created_at: Self::parse_timestamp(&created_at)?,
        })
    }

    fn tag_by_id(conn: &Connection, id: TagId) -> StorageResult<Option<Tag>> {
        let row: Option<(i64, String, Option<String>, String)> = conn
            .query_row(
                "SELECT id, name, description, created_at FROM tags WHERE id = ?1",
                params![id.as_i64()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        match row {
            Some((id, name, description, created_at)) => {
                Ok(Some(Self::row_to_tag(id, name, description, created_at)?))
            }
            None => Ok(None),
        }
    }

    fn find_tag(conn: &Connection, name: &str) -> StorageResult<Option<Tag>> {
        let row: Option<(i64, String, Option<String>, String)> = conn
            .query_row(
                "SELECT id, name, description, created_at FROM tags WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        match row {
            Some((id, name, description, created_at)) => {
                Ok(Some(Self::row_to_tag(id, name, description, created_at)?))
            }
            None => Ok(None),
        }
    }

    /// Atomic check-then-insert for a tag by name
    ///
    /// The loser of a creation race re-reads and returns the winner's row;
    /// an existing description is never overwritten.
    fn get_or_create_tag_in(
        conn: &Connection,
        name: &str,
        description: Option<&str>,
    ) -> StorageResult<Tag> {
        conn.execute(
            "INSERT INTO tags (name, description, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO NOTHING",
            params![name, description, Utc::now().to_rfc3339()],
        )?;
        Self::find_tag(conn, name)?.ok_or_else(|| {
            StorageError::Database(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get-or-create for a document by identifier, deriving folder/filename
    /// via the identifier normalizer
    fn get_or_create_document_in(conn: &Connection, identifier: &str) -> StorageResult<DocId> {
        let (folder, filename) = ident::split(identifier);
        conn.execute(
            "INSERT INTO documents (identifier, folder, filename, added_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(identifier) DO NOTHING",
            params![identifier, folder, filename, Utc::now().to_rfc3339()],
        )?;
        let id: i64 = conn.query_row(
            "SELECT id FROM documents WHERE identifier = ?1",
            params![identifier],
            |row| row.get(0),
        )?;
        Ok(DocId::new(id))
    }

    /// Load a document with its current tag-name set
    fn load_document(conn: &Connection, identifier: &str) -> StorageResult<Option<Document>> {
        let row: Option<(i64, String, String, String, String, Option<String>)> = conn
            .query_row(
                "SELECT id, identifier, folder, filename, added_at, last_accessed_at
                 FROM documents WHERE identifier = ?1",
                params![identifier],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, identifier, folder, filename, added_at, last_accessed_at)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT t.name FROM tags t
             JOIN document_tags dt ON dt.tag_id = t.id
             WHERE dt.document_id = ?1",
        )?;
        let tags = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Some(Document {
            id: DocId::new(id),
            identifier,
            folder,
            filename,
            added_at: Self::parse_timestamp(&added_at)?,
            last_accessed_at: last_accessed_at
                .as_deref()
                .map(Self::parse_timestamp)
                .transpose()?,
            tags,
        }))
    }

    fn is_associated(conn: &Connection, doc_id: DocId, tag_id: TagId) -> StorageResult<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM document_tags WHERE document_id = ?1 AND tag_id = ?2)",
            params![doc_id.as_i64(), tag_id.as_i64()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

/// Reject empty or whitespace-only required fields
fn require_nonempty(what: &str, value: &str) -> LibraryResult<()> {
    if value.trim().is_empty() {
        return Err(LibraryError::Validation(format!("{} must not be empty", what)));
    }
    Ok(())
}

impl TagStore for SqliteStore {
    // === Tag catalog ===

    fn get_or_create_tag(&self, name: &str, description: Option<&str>) -> LibraryResult<Tag> {
        require_nonempty("tag name", name)?;
        self.with_retry("get_or_create_tag", |conn| {
            Ok(Self::get_or_create_tag_in(conn, name, description)?)
        })
    }

    fn tag_by_name(&self, name: &str) -> LibraryResult<Option<Tag>> {
        let conn = self.conn.lock().unwrap();
        Ok(Self::find_tag(&conn, name)?)
    }

    fn rename_tag(&self, id: TagId, new_name: &str) -> LibraryResult<Tag> {
        require_nonempty("tag name", new_name)?;
        self.with_retry("rename_tag", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(StorageError::from)?;

            let tag = Self::tag_by_id(&tx, id)?
                .ok_or_else(|| LibraryError::TagNotFound(id.to_string()))?;
            if tag.name == new_name {
                // Nothing to change; permitted even for protected tags.
                return Ok(tag);
            }
            if tag.is_protected() {
                return Err(LibraryError::ProtectedTag(tag.name));
            }
            if Self::find_tag(&tx, new_name)?.is_some() {
                return Err(LibraryError::NameConflict(new_name.to_string()));
            }

            tx.execute(
                "UPDATE tags SET name = ?1 WHERE id = ?2",
                params![new_name, id.as_i64()],
            )
            .map_err(StorageError::from)?;
            let renamed = Self::tag_by_id(&tx, id)?
                .ok_or_else(|| LibraryError::TagNotFound(id.to_string()))?;
            tx.commit().map_err(StorageError::from)?;

            info!(tag = %renamed.name, previous = %tag.name, "renamed tag");
            Ok(renamed)
        })
    }

    fn update_tag_description(&self, id: TagId, description: &str) -> LibraryResult<Tag> {
        self.with_retry("update_tag_description", |conn| {
            let rows = conn
                .execute(
                    "UPDATE tags SET description = ?1 WHERE id = ?2",
                    params![description, id.as_i64()],
                )
                .map_err(StorageError::from)?;
            if rows == 0 {
                return Err(LibraryError::TagNotFound(id.to_string()));
            }
            Ok(Self::tag_by_id(conn, id)?
                .ok_or_else(|| LibraryError::TagNotFound(id.to_string()))?)
        })
    }

    fn delete_tag(&self, id: TagId) -> LibraryResult<()> {
        self.with_retry("delete_tag", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(StorageError::from)?;

            let tag = Self::tag_by_id(&tx, id)?
                .ok_or_else(|| LibraryError::TagNotFound(id.to_string()))?;
            if tag.is_protected() {
                return Err(LibraryError::ProtectedTag(tag.name));
            }

            // Cascade: every document holding the tag loses it in the same
            // transaction as the tag row itself.
            tx.execute(
                "DELETE FROM document_tags WHERE tag_id = ?1",
                params![id.as_i64()],
            )
            .map_err(StorageError::from)?;
            tx.execute("DELETE FROM tags WHERE id = ?1", params![id.as_i64()])
                .map_err(StorageError::from)?;
            tx.commit().map_err(StorageError::from)?;

            info!(tag = %tag.name, "deleted tag and its associations");
            Ok(())
        })
    }

    fn list_tags(&self) -> LibraryResult<Vec<Tag>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, name, description, created_at FROM tags ORDER BY name")
            .map_err(StorageError::from)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(StorageError::from)?;

        let mut tags = Vec::new();
        for row in rows {
            let (id, name, description, created_at) = row.map_err(StorageError::from)?;
            tags.push(Self::row_to_tag(id, name, description, created_at)?);
        }
        Ok(tags)
    }

    // === Associations ===

    fn attach(&self, identifier: &str, tag_name: &str) -> LibraryResult<Document> {
        require_nonempty("identifier", identifier)?;
        require_nonempty("tag name", tag_name)?;

        self.with_retry("attach", |conn| {
            // BEGIN IMMEDIATE serializes the status read-modify-write per
            // database; a reader can never observe two status tags.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(StorageError::from)?;

            let doc_id = Self::get_or_create_document_in(&tx, identifier)?;
            let tag = Self::get_or_create_tag_in(&tx, tag_name, None)?;

            if !Self::is_associated(&tx, doc_id, tag.id)? {
                if ReadingStatus::is_status_name(tag_name) {
                    // Displace any other reading status the document holds.
                    let removed = tx
                        .execute(
                            "DELETE FROM document_tags
                             WHERE document_id = ?1
                               AND tag_id != ?2
                               AND tag_id IN (SELECT id FROM tags WHERE name IN (?3, ?4, ?5))",
                            params![
                                doc_id.as_i64(),
                                tag.id.as_i64(),
                                ReadingStatus::Finished.as_str(),
                                ReadingStatus::InProgress.as_str(),
                                ReadingStatus::Backlog.as_str()
                            ],
                        )
                        .map_err(StorageError::from)?;
                    if removed > 0 {
                        debug!(identifier, tag = tag_name, "displaced previous reading status");
                    }
                }
                tx.execute(
                    "INSERT OR IGNORE INTO document_tags (document_id, tag_id) VALUES (?1, ?2)",
                    params![doc_id.as_i64(), tag.id.as_i64()],
                )
                .map_err(StorageError::from)?;
            }

            let doc = Self::load_document(&tx, identifier)?
                .ok_or_else(|| LibraryError::DocumentNotFound(identifier.to_string()))?;
            tx.commit().map_err(StorageError::from)?;

            debug!(identifier, tag = tag_name, "attached tag");
            Ok(doc)
        })
    }

    fn detach(&self, identifier: &str, tag_name: &str) -> LibraryResult<bool> {
        self.with_retry("detach", |conn| {
            // Single statement, so it is atomic on its own; missing document
            // or tag simply matches nothing.
            let rows = conn
                .execute(
                    "DELETE FROM document_tags
                     WHERE document_id = (SELECT id FROM documents WHERE identifier = ?1)
                       AND tag_id = (SELECT id FROM tags WHERE name = ?2)",
                    params![identifier, tag_name],
                )
                .map_err(StorageError::from)?;
            if rows > 0 {
                debug!(identifier, tag = tag_name, "detached tag");
            }
            Ok(rows > 0)
        })
    }

    fn tags_of(&self, identifier: &str) -> LibraryResult<BTreeSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT t.name FROM tags t
                 JOIN document_tags dt ON dt.tag_id = t.id
                 JOIN documents d ON d.id = dt.document_id
                 WHERE d.identifier = ?1",
            )
            .map_err(StorageError::from)?;
        let names = stmt
            .query_map(params![identifier], |row| row.get::<_, String>(0))
            .map_err(StorageError::from)?
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(StorageError::from)?;
        Ok(names)
    }

    fn documents_with_tag(&self, tag_name: &str) -> LibraryResult<BTreeSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT d.identifier FROM documents d
                 JOIN document_tags dt ON dt.document_id = d.id
                 JOIN tags t ON t.id = dt.tag_id
                 WHERE t.name = ?1",
            )
            .map_err(StorageError::from)?;
        let identifiers = stmt
            .query_map(params![tag_name], |row| row.get::<_, String>(0))
            .map_err(StorageError::from)?
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(StorageError::from)?;
        Ok(identifiers)
    }

    fn usage_stats(&self) -> LibraryResult<BTreeMap<String, TagUsage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT t.name, t.description, COUNT(dt.document_id)
                 FROM tags t
                 LEFT JOIN document_tags dt ON dt.tag_id = t.id
                 GROUP BY t.id",
            )
            .map_err(StorageError::from)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .map_err(StorageError::from)?;

        let mut stats = BTreeMap::new();
        for row in rows {
            let (name, description, count) = row.map_err(StorageError::from)?;
            stats.insert(
                name,
                TagUsage {
                    count: count as u64,
                    description,
                },
            );
        }
        Ok(stats)
    }

    // === Documents ===

    fn document(&self, identifier: &str) -> LibraryResult<Option<Document>> {
        let conn = self.conn.lock().unwrap();
        Ok(Self::load_document(&conn, identifier)?)
    }

    fn touch(&self, identifier: &str) -> LibraryResult<bool> {
        self.with_retry("touch", |conn| {
            let rows = conn
                .execute(
                    "UPDATE documents SET last_accessed_at = ?1 WHERE identifier = ?2",
                    params![Utc::now().to_rfc3339(), identifier],
                )
                .map_err(StorageError::from)?;
            Ok(rows > 0)
        })
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Self::seed_defaults(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Self::seed_defaults(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}
