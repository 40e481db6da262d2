//! Scoped sessions against the embedded engine
//!
//! A session owns one connection and exactly one transaction:
//! `Open -> {Committed | Aborted}`. [`Session::commit`] and [`Session::abort`]
//! consume the session, so it cannot be reused afterwards. A session dropped
//! while still open rolls its transaction back.

use std::collections::BTreeMap;
use std::time::Duration;
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use crate::record::Record;
use crate::schema::{TypeDescriptor, REGISTERED_TYPES};
use crate::{Error, Result};
use super::schema;
use super::store_config::StoreConfig;

/// Engine-assigned object id of a stored row
pub type Oid = i64;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Kind of transaction a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Read,
    Update,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Read => "read",
            SessionMode::Update => "update",
        }
    }

    fn begin_statement(&self) -> &'static str {
        match self {
            SessionMode::Read => "BEGIN DEFERRED",
            SessionMode::Update => "BEGIN IMMEDIATE",
        }
    }
}

/// A bound handle granting transactional access to one store
pub struct Session {
    conn: Connection,
    mode: SessionMode,
    resolved: bool,
}

impl Session {
    /// Open a session on an existing store.
    ///
    /// Never creates the engine file; a missing store is
    /// [`Error::NotInitialized`].
    pub fn open(config: &StoreConfig, mode: SessionMode) -> Result<Self> {
        let data_file = config.data_file();
        if !data_file.is_file() {
            return Err(Error::NotInitialized(config.store_dir()));
        }

        let flags = match mode {
            SessionMode::Read => OpenFlags::SQLITE_OPEN_READ_ONLY,
            SessionMode::Update => OpenFlags::SQLITE_OPEN_READ_WRITE,
        } | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&data_file, flags)
            .map_err(|e| Error::Session(format!("failed to open {}: {}", data_file.display(), e)))?;
        Self::begin(conn, mode)
    }

    /// Open an update session, creating the engine file if needed.
    ///
    /// The store directory must already exist.
    pub fn create(config: &StoreConfig) -> Result<Self> {
        let data_file = config.data_file();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&data_file, flags)
            .map_err(|e| Error::Session(format!("failed to create {}: {}", data_file.display(), e)))?;
        Self::begin(conn, SessionMode::Update)
    }

    fn begin(conn: Connection, mode: SessionMode) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| Error::Session(e.to_string()))?;
        conn.execute_batch(mode.begin_statement())
            .map_err(|e| Error::Session(format!("failed to begin {} transaction: {}", mode.as_str(), e)))?;

        let session = Self { conn, mode, resolved: false };
        if mode == SessionMode::Update {
            session.ensure_schema()?;
        }
        tracing::debug!("opened {} session", mode.as_str());
        Ok(session)
    }

    fn ensure_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    fn require_update(&self, operation: &str) -> Result<()> {
        if self.mode != SessionMode::Update {
            return Err(Error::Session(format!("{} requires an update session", operation)));
        }
        Ok(())
    }

    // ========== Type Registration ==========

    /// Record a type in the store's type catalog (idempotent)
    pub fn register_type(&self, descriptor: &TypeDescriptor) -> Result<()> {
        self.require_update("register_type")?;
        self.conn.execute(
            "INSERT OR IGNORE INTO registered_types (name, full_name, registered_at) VALUES (?1, ?2, ?3)",
            params![descriptor.type_name, descriptor.full_name, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Names in the store's type catalog
    pub fn registered_type_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM registered_types ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    // ========== Record Operations ==========

    /// Persist a record and, transitively, its owned children.
    ///
    /// Returns the object id of the record's own row.
    pub fn persist<T: Record>(&self, record: &T) -> Result<Oid> {
        self.require_update("persist")?;
        record.validate()?;
        let created_at = Utc::now().to_rfc3339();

        let oid = self.insert_row(T::TYPE_NAME, None, &serde_json::to_string(record)?, &created_at)?;
        for child in record.embedded()? {
            let body = serde_json::to_string(&child.body)?;
            self.insert_row(child.type_name, Some(oid), &body, &created_at)?;
        }

        tracing::debug!("persisted {} as oid {}", T::TYPE_NAME, oid);
        Ok(oid)
    }

    /// Replace every stored record of type `T` (and the children they own)
    /// with `record`, inside this session's transaction.
    pub fn replace<T: Record>(&self, record: &T) -> Result<Oid> {
        self.require_update("replace")?;
        record.validate()?;
        let removed = self.delete_type(T::TYPE_NAME)?;
        if removed > 0 {
            tracing::debug!("replacing {} stored {} record(s)", removed, T::TYPE_NAME);
        }
        self.persist(record)
    }

    /// Delete all rows of a type together with their owned rows.
    ///
    /// Returns the number of rows of the type itself that were removed.
    pub fn delete_type(&self, type_name: &str) -> Result<usize> {
        self.require_update("delete_type")?;
        self.conn.execute(
            "DELETE FROM objects WHERE owner_oid IN (SELECT oid FROM objects WHERE type_name = ?1)",
            [type_name],
        )?;
        let removed = self.conn.execute("DELETE FROM objects WHERE type_name = ?1", [type_name])?;
        Ok(removed)
    }

    fn insert_row(&self, type_name: &str, owner: Option<Oid>, body: &str, created_at: &str) -> Result<Oid> {
        self.conn.execute(
            "INSERT INTO objects (type_name, owner_oid, body, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![type_name, owner, body, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Every stored record of type `T`, in object id order
    pub fn all_objects<T: Record>(&self) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare("SELECT body FROM objects WHERE type_name = ?1 ORDER BY oid")?;
        let bodies = stmt
            .query_map([T::TYPE_NAME], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(Error::from))
            .collect()
    }

    /// The first stored record of type `T`, if any
    pub fn first<T: Record>(&self) -> Result<Option<T>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM objects WHERE type_name = ?1 ORDER BY oid LIMIT 1",
                [T::TYPE_NAME],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// Count records of type `T`
    pub fn count<T: Record>(&self) -> Result<u64> {
        self.count_type(T::TYPE_NAME)
    }

    /// Count records by registered type name
    pub fn count_type(&self, type_name: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM objects WHERE type_name = ?1",
            [type_name],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Counts for every registered type, keyed by type name
    pub fn count_all(&self) -> Result<BTreeMap<&'static str, u64>> {
        REGISTERED_TYPES
            .iter()
            .map(|d| -> Result<(&'static str, u64)> { Ok((d.type_name, self.count_type(d.type_name)?)) })
            .collect()
    }

    /// Up to `limit` raw records of a type, in object id order
    pub fn sample_type(&self, type_name: &str, limit: usize) -> Result<Vec<serde_json::Value>> {
        let mut stmt = self.conn.prepare(
            "SELECT body FROM objects WHERE type_name = ?1 ORDER BY oid LIMIT ?2",
        )?;
        let bodies = stmt
            .query_map(params![type_name, limit as i64], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(Error::from))
            .collect()
    }

    // ========== Store Metadata ==========

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.require_update("set_meta")?;
        self.conn.execute(
            "INSERT OR REPLACE INTO store_meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn meta(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM store_meta WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    // ========== Transaction Resolution ==========

    /// Commit the transaction and close the session
    pub fn commit(mut self) -> Result<()> {
        self.resolved = true;
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| Error::Session(format!("commit failed: {}", e)))?;
        tracing::debug!("committed {} session", self.mode.as_str());
        Ok(())
    }

    /// Roll the transaction back and close the session
    pub fn abort(mut self) -> Result<()> {
        self.resolved = true;
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| Error::Session(format!("abort failed: {}", e)))?;
        tracing::debug!("aborted {} session", self.mode.as_str());
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!("rollback of unresolved {} session failed: {}", self.mode.as_str(), e);
        } else {
            tracing::debug!("rolled back unresolved {} session", self.mode.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::User;
    use crate::workspace::{Position, WorkspaceObject};
    use tempfile::TempDir;

    fn fresh_store(dir: &TempDir) -> StoreConfig {
        let config = StoreConfig::new(dir.path(), "objects");
        std::fs::create_dir_all(config.store_dir()).unwrap();
        Session::create(&config).unwrap().commit().unwrap();
        config
    }

    #[test]
    fn test_open_missing_store_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new(dir.path(), "missing");
        let err = Session::open(&config, SessionMode::Read).err().unwrap();
        assert!(matches!(err, Error::NotInitialized(_)));
        assert!(!config.store_dir().exists());
    }

    #[test]
    fn test_persist_and_read_back() {
        let dir = TempDir::new().unwrap();
        let config = fresh_store(&dir);

        let session = Session::open(&config, SessionMode::Update).unwrap();
        session.persist(&User::new(1, "Admin", "Administrator")).unwrap();
        session.persist(&User::new(2, "Guest", "Viewer")).unwrap();
        session.commit().unwrap();

        let session = Session::open(&config, SessionMode::Read).unwrap();
        let users: Vec<User> = session.all_objects().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Admin");
        assert_eq!(session.first::<User>().unwrap().unwrap().id, 1);
        session.commit().unwrap();
    }

    #[test]
    fn test_children_persisted_transitively() {
        let dir = TempDir::new().unwrap();
        let config = fresh_store(&dir);

        let session = Session::open(&config, SessionMode::Update).unwrap();
        session
            .persist(&WorkspaceObject::new("A", "primitive", Position::new(1.0, 2.0)))
            .unwrap();
        session.commit().unwrap();

        let session = Session::open(&config, SessionMode::Read).unwrap();
        assert_eq!(session.count::<WorkspaceObject>().unwrap(), 1);
        assert_eq!(session.count::<Position>().unwrap(), 1);
        assert_eq!(session.first::<Position>().unwrap(), Some(Position::new(1.0, 2.0)));
    }

    #[test]
    fn test_replace_drops_previous_aggregate_and_children() {
        let dir = TempDir::new().unwrap();
        let config = fresh_store(&dir);

        let session = Session::open(&config, SessionMode::Update).unwrap();
        let old = WorkspaceObject::new("Old", "local", Position::new(0.0, 0.0));
        session.persist(&old).unwrap();
        session.persist(&old).unwrap();
        let new = WorkspaceObject::new("New", "match", Position::new(5.0, 6.0));
        session.replace(&new).unwrap();
        session.commit().unwrap();

        let session = Session::open(&config, SessionMode::Read).unwrap();
        assert_eq!(session.all_objects::<WorkspaceObject>().unwrap(), vec![new]);
        assert_eq!(session.all_objects::<Position>().unwrap(), vec![Position::new(5.0, 6.0)]);
    }

    #[test]
    fn test_persist_rejects_non_finite_position() {
        let dir = TempDir::new().unwrap();
        let config = fresh_store(&dir);

        let session = Session::open(&config, SessionMode::Update).unwrap();
        let err = session
            .persist(&WorkspaceObject::new("A", "local", Position::new(f64::NAN, 1.0)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRecord(_)));
        assert_eq!(session.count::<WorkspaceObject>().unwrap(), 0);
        assert_eq!(session.count::<Position>().unwrap(), 0);
    }

    #[test]
    fn test_abort_discards_writes() {
        let dir = TempDir::new().unwrap();
        let config = fresh_store(&dir);

        let session = Session::open(&config, SessionMode::Update).unwrap();
        session.persist(&User::new(1, "Admin", "Administrator")).unwrap();
        session.abort().unwrap();

        let session = Session::open(&config, SessionMode::Read).unwrap();
        assert_eq!(session.count::<User>().unwrap(), 0);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let dir = TempDir::new().unwrap();
        let config = fresh_store(&dir);

        {
            let session = Session::open(&config, SessionMode::Update).unwrap();
            session.persist(&User::new(1, "Admin", "Administrator")).unwrap();
        }

        let session = Session::open(&config, SessionMode::Read).unwrap();
        assert_eq!(session.count::<User>().unwrap(), 0);
    }

    #[test]
    fn test_read_session_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let config = fresh_store(&dir);

        let session = Session::open(&config, SessionMode::Read).unwrap();
        let err = session.persist(&User::new(1, "Admin", "Administrator")).unwrap_err();
        assert!(matches!(err, Error::Session(_)));
        assert_eq!(session.mode(), SessionMode::Read);
    }

    #[test]
    fn test_register_type_and_meta() {
        let dir = TempDir::new().unwrap();
        let config = fresh_store(&dir);

        let session = Session::open(&config, SessionMode::Update).unwrap();
        session.register_type(User::descriptor()).unwrap();
        session.register_type(User::descriptor()).unwrap();
        session.set_meta("initialized_at", "now").unwrap();
        assert_eq!(session.registered_type_names().unwrap(), vec!["User".to_string()]);
        assert_eq!(session.meta("initialized_at").unwrap().as_deref(), Some("now"));
        assert_eq!(session.meta("missing").unwrap(), None);
        session.commit().unwrap();
    }

    #[test]
    fn test_sample_respects_limit() {
        let dir = TempDir::new().unwrap();
        let config = fresh_store(&dir);

        let session = Session::open(&config, SessionMode::Update).unwrap();
        for id in 0..8 {
            session.persist(&User::new(id, format!("user{}", id), "Viewer")).unwrap();
        }
        let sample = session.sample_type("User", 5).unwrap();
        assert_eq!(sample.len(), 5);
        assert_eq!(sample[0]["id"], 0);
        assert_eq!(session.count_all().unwrap()["User"], 8);
        session.commit().unwrap();
    }
}
