//! Persistence Gateway - one session per logical operation
//!
//! Every call opens its own session, resolves it before returning, and
//! converts engine failures into crate errors at this boundary.

use std::collections::BTreeMap;
use std::fs;
use serde::Serialize;
use crate::record::Record;
use crate::workspace::WorkspaceData;
use crate::{Error, Result};
use super::session::{Oid, Session, SessionMode};
use super::store_config::StoreConfig;

/// Existence and contents of a store
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub initialized: bool,
    pub path: String,
    pub directory_exists: bool,
    pub has_data_files: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<BTreeMap<&'static str, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Typed record access against one configured store
#[derive(Debug, Clone)]
pub struct Gateway {
    config: StoreConfig,
}

impl Gateway {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open a session bound to this gateway's store
    pub fn open_session(&self, mode: SessionMode) -> Result<Session> {
        Session::open(&self.config, mode)
    }

    /// Run `f` inside a read session
    fn read<R>(&self, f: impl FnOnce(&Session) -> Result<R>) -> Result<R> {
        let session = self.open_session(SessionMode::Read)?;
        let value = f(&session)?;
        session.commit()?;
        Ok(value)
    }

    /// Every committed record of type `T`
    pub fn get_all<T: Record>(&self) -> Result<Vec<T>> {
        self.read(|session| session.all_objects::<T>())
    }

    /// The first committed record of type `T`, or `None`
    pub fn get_first<T: Record>(&self) -> Result<Option<T>> {
        self.read(|session| session.first::<T>())
    }

    /// Like [`Gateway::get_first`], but absence is [`Error::RecordNotFound`]
    pub fn require_first<T: Record>(&self) -> Result<T> {
        self.get_first::<T>()?
            .ok_or(Error::RecordNotFound(T::TYPE_NAME))
    }

    pub fn count<T: Record>(&self) -> Result<u64> {
        self.read(|session| session.count::<T>())
    }

    /// Run `f` inside an update session; any failure aborts the transaction,
    /// so nothing is partially written.
    fn write<R>(&self, f: impl FnOnce(&Session) -> Result<R>) -> Result<R> {
        let session = self.open_session(SessionMode::Update)?;
        match f(&session) {
            Ok(value) => {
                session.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = session.abort() {
                    tracing::warn!("abort after failed write also failed: {}", abort_err);
                }
                Err(e)
            }
        }
    }

    /// Persist one record (and its children) next to the existing ones
    pub fn save<T: Record>(&self, record: &T) -> Result<Oid> {
        self.write(|session| session.persist(record))
    }

    /// Make `data` the store's workspace.
    ///
    /// The previous workspace and everything it owns are removed in the same
    /// transaction, so a following [`Gateway::get_first`] returns `data`.
    pub fn save_workspace(&self, data: &WorkspaceData) -> Result<Oid> {
        let dangling = data.dangling_relationships().len();
        if dangling > 0 {
            tracing::debug!("saving workspace '{}' with {} dangling relationships", data.title, dangling);
        }
        self.write(|session| session.replace(data))
    }

    /// Report whether the store exists and what it holds.
    ///
    /// Never fails: an absent or unreadable store is a reported state.
    pub fn status(&self) -> StoreStatus {
        let dir = self.config.store_dir();
        let directory_exists = dir.is_dir();
        let has_data_files = directory_exists
            && fs::read_dir(&dir)
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false);

        let mut status = StoreStatus {
            initialized: false,
            path: dir.display().to_string(),
            directory_exists,
            has_data_files,
            counts: None,
            error: None,
        };

        if !has_data_files {
            return status;
        }

        match self.read(|session| session.count_all()) {
            Ok(counts) => {
                status.initialized = true;
                status.counts = Some(counts);
            }
            Err(Error::NotInitialized(_)) => {}
            Err(e) => status.error = Some(e.to_string()),
        }
        status
    }
}
