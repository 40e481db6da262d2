//! Store Initializer - creates, seeds, recreates and deletes a store
//!
//! Seeding contract: `initialize` writes the seed data only when the store
//! holds neither `User` nor `WorkspaceData` records, so repeated
//! `initialize(false)` calls never duplicate it. `seed` always writes.

use std::fs;
use std::path::PathBuf;
use chrono::Utc;
use serde::Serialize;
use crate::record::User;
use crate::workspace::WorkspaceData;
use crate::schema::REGISTERED_TYPES;
use crate::{Error, Result};
use super::seed;
use super::session::Session;
use super::store_config::StoreConfig;

/// Key of the writability sentinel in `store_meta`
pub const SENTINEL_KEY: &str = "initialized_at";

/// What an `initialize` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InitOutcome {
    pub recreated: bool,
    pub seeded: bool,
}

/// Owns the on-disk location of one store
pub struct StoreInitializer {
    config: StoreConfig,
}

impl StoreInitializer {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// The configured store directory (no I/O)
    pub fn path(&self) -> PathBuf {
        self.config.store_dir()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create the store if needed, register types, check writability and
    /// seed an empty store.
    ///
    /// With `recreate`, an existing store directory is deleted first. Callers
    /// must serialize recreation against all other access to the store.
    pub fn initialize(&self, recreate: bool) -> Result<InitOutcome> {
        let dir = self.path();
        let mut recreated = false;

        if recreate && dir.exists() {
            tracing::info!("Removing existing store at {}", dir.display());
            fs::remove_dir_all(&dir).map_err(init_failed)?;
            std::thread::sleep(self.config.settle_delay);
            recreated = true;
        }

        fs::create_dir_all(&dir).map_err(init_failed)?;

        let session = Session::create(&self.config).map_err(init_failed)?;
        match prepare(&session) {
            Ok(seeded) => {
                session.commit().map_err(init_failed)?;
                tracing::info!("Initialized store at {} (seeded: {})", dir.display(), seeded);
                Ok(InitOutcome { recreated, seeded })
            }
            Err(e) => {
                if let Err(abort_err) = session.abort() {
                    tracing::warn!("abort after failed initialization also failed: {}", abort_err);
                }
                tracing::error!("Initialization of {} failed: {}", dir.display(), e);
                Err(init_failed(e))
            }
        }
    }

    /// Same as `initialize(true)`
    pub fn recreate(&self) -> Result<InitOutcome> {
        self.initialize(true)
    }

    /// Persist the admin user and the sample workspace in one transaction
    pub fn seed(&self) -> Result<()> {
        fs::create_dir_all(self.path()).map_err(init_failed)?;
        let session = Session::create(&self.config).map_err(init_failed)?;
        match write_seed(&session) {
            Ok(()) => session.commit().map_err(init_failed),
            Err(e) => {
                if let Err(abort_err) = session.abort() {
                    tracing::warn!("abort after failed seed also failed: {}", abort_err);
                }
                Err(init_failed(e))
            }
        }
    }

    /// Remove the store directory. Returns whether anything was deleted.
    pub fn delete(&self) -> Result<bool> {
        let dir = self.path();
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        tracing::info!("Deleted store at {}", dir.display());
        Ok(true)
    }
}

fn prepare(session: &Session) -> Result<bool> {
    for descriptor in REGISTERED_TYPES {
        session.register_type(descriptor)?;
    }
    session.set_meta(SENTINEL_KEY, &Utc::now().to_rfc3339())?;

    if session.count::<User>()? > 0 || session.count::<WorkspaceData>()? > 0 {
        return Ok(false);
    }
    write_seed(session)?;
    Ok(true)
}

fn write_seed(session: &Session) -> Result<()> {
    session.persist(&seed::admin_user())?;
    session.persist(&seed::sample_workspace())?;
    Ok(())
}

fn init_failed(e: impl Into<Error>) -> Error {
    match e.into() {
        Error::InitializationFailed(msg) => Error::InitializationFailed(msg),
        other => Error::InitializationFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SessionMode;
    use std::time::Duration;
    use tempfile::TempDir;

    fn initializer_in(dir: &TempDir) -> StoreInitializer {
        StoreInitializer::new(
            StoreConfig::new(dir.path(), "objects").with_settle_delay(Duration::ZERO),
        )
    }

    fn read_session(init: &StoreInitializer) -> Session {
        Session::open(init.config(), SessionMode::Read).unwrap()
    }

    #[test]
    fn test_initialize_seeds_literal_data() {
        let dir = TempDir::new().unwrap();
        let init = initializer_in(&dir);
        let outcome = init.initialize(false).unwrap();
        assert_eq!(outcome, InitOutcome { recreated: false, seeded: true });

        let session = read_session(&init);
        let users: Vec<User> = session.all_objects().unwrap();
        assert_eq!(users, vec![User::new(1, "Admin", "Administrator")]);

        let workspace: WorkspaceData = session.first().unwrap().unwrap();
        assert_eq!(workspace.title, "Methods of run.json");
        let names: Vec<&str> = workspace.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Primitive", "External Method", "Local Method", "Evaluation", "Persistent", "Match"]
        );
        let links: Vec<(&str, &str)> = workspace
            .relationships
            .iter()
            .map(|r| (r.from.as_str(), r.to.as_str()))
            .collect();
        assert_eq!(
            links,
            vec![("Match", "External Method"), ("Evaluation", "Primitive"), ("Persistent", "Primitive")]
        );
        assert!(session.meta(SENTINEL_KEY).unwrap().is_some());
        assert_eq!(session.registered_type_names().unwrap().len(), 5);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let init = initializer_in(&dir);
        init.initialize(false).unwrap();
        for _ in 0..3 {
            let outcome = init.initialize(false).unwrap();
            assert!(!outcome.seeded);
        }

        let session = read_session(&init);
        assert_eq!(session.count::<User>().unwrap(), 1);
        assert_eq!(session.count::<WorkspaceData>().unwrap(), 1);
    }

    #[test]
    fn test_initialize_keeps_existing_workspace_without_users() {
        let dir = TempDir::new().unwrap();
        let init = initializer_in(&dir);
        std::fs::create_dir_all(init.path()).unwrap();
        let session = Session::create(init.config()).unwrap();
        session.persist(&seed::sample_workspace()).unwrap();
        session.commit().unwrap();

        let outcome = init.initialize(false).unwrap();
        assert!(!outcome.seeded);

        let session = read_session(&init);
        assert_eq!(session.count::<WorkspaceData>().unwrap(), 1);
        assert_eq!(session.count::<User>().unwrap(), 0);
        assert!(session.meta(SENTINEL_KEY).unwrap().is_some());
    }

    #[test]
    fn test_recreate_discards_previous_records() {
        let dir = TempDir::new().unwrap();
        let init = initializer_in(&dir);
        init.initialize(false).unwrap();

        let session = Session::open(init.config(), SessionMode::Update).unwrap();
        session.persist(&User::new(7, "Extra", "Viewer")).unwrap();
        session.persist(&WorkspaceData::default()).unwrap();
        session.commit().unwrap();

        let outcome = init.recreate().unwrap();
        assert_eq!(outcome, InitOutcome { recreated: true, seeded: true });

        let session = read_session(&init);
        let users: Vec<User> = session.all_objects().unwrap();
        assert_eq!(users, vec![seed::admin_user()]);
        assert_eq!(session.count::<WorkspaceData>().unwrap(), 1);
    }

    #[test]
    fn test_recreate_without_existing_store() {
        let dir = TempDir::new().unwrap();
        let init = initializer_in(&dir);
        let outcome = init.recreate().unwrap();
        assert!(!outcome.recreated);
        assert!(outcome.seeded);
    }

    #[test]
    fn test_seed_always_writes() {
        let dir = TempDir::new().unwrap();
        let init = initializer_in(&dir);
        init.initialize(false).unwrap();
        init.seed().unwrap();
        assert_eq!(read_session(&init).count::<User>().unwrap(), 2);
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let init = initializer_in(&dir);
        assert!(!init.delete().unwrap());
        init.initialize(false).unwrap();
        assert!(init.path().exists());
        assert!(init.delete().unwrap());
        assert!(!init.path().exists());
    }

    #[test]
    fn test_initialize_fails_when_base_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let init = StoreInitializer::new(StoreConfig::new(&blocker, "objects"));

        let err = init.initialize(false).unwrap_err();
        assert!(matches!(err, Error::InitializationFailed(_)));
    }

    #[test]
    fn test_path_is_pure() {
        let dir = TempDir::new().unwrap();
        let init = initializer_in(&dir);
        assert_eq!(init.path(), dir.path().join("objects"));
        assert!(!init.path().exists());
    }
}
