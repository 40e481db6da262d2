//! Location of a store on disk

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the engine file inside the store directory
pub const DATA_FILE_NAME: &str = "objects.db";

/// Where a store lives and how it is recreated.
///
/// Passed explicitly into every session-opening call; there is no
/// process-wide "current store".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding all stores
    pub base_path: PathBuf,
    /// Store name; the store directory is `base_path/name`
    pub name: String,
    /// Pause after deleting a store directory before recreating it
    pub settle_delay: Duration,
}

impl StoreConfig {
    pub const DEFAULT_BASE_PATH: &'static str = "data";
    pub const DEFAULT_NAME: &'static str = "objects";
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(250);

    pub fn new(base_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            name: name.into(),
            settle_delay: Self::DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Directory owned by the engine
    pub fn store_dir(&self) -> PathBuf {
        self.base_path.join(&self.name)
    }

    /// Engine file inside the store directory
    pub fn data_file(&self) -> PathBuf {
        self.store_dir().join(DATA_FILE_NAME)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_PATH, Self::DEFAULT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let config = StoreConfig::new("/tmp/stores", "main");
        assert_eq!(config.store_dir(), PathBuf::from("/tmp/stores/main"));
        assert_eq!(config.data_file(), PathBuf::from("/tmp/stores/main/objects.db"));
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.store_dir(), PathBuf::from("data/objects"));
        assert_eq!(config.settle_delay, Duration::from_millis(250));
        let fast = config.with_settle_delay(Duration::ZERO);
        assert_eq!(fast.settle_delay, Duration::ZERO);
    }
}
