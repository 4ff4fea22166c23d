use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::fs::{config_dir, state_dir};

const CURRENT_CONFIG_VERSION: u16 = 1;
const FILE_NAME: &str = "jotter.toml";
const DATABASE_FILE_NAME: &str = "notes.db";

/// Default cap on how many `NoteN` titles are probed when auto-creating a note.
pub const DEFAULT_MAX_TITLE_PROBES: u32 = 10_000;

/// Handle to the core configuration
pub type Cfg = Arc<RwLock<CoreConfig>>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Could not access the configuration file: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed configuration file: {0}")]
    Decode(#[from] toml::de::Error),
    #[error("Could not serialize the configuration: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("Unsupported configuration version {found}, expected {expected}")]
    Version { found: u16, expected: u16 },
}

/// The core configuration, serialized to TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    version: u16,
    /// Overrides the location of the note database.
    database_path: Option<PathBuf>,
    /// Upper bound on the `Note1`, `Note2`, ... probe sequence.
    max_title_probes: u32,
}

impl CoreConfig {
    /// Load the configuration from the user's config directory, writing the defaults there if
    /// no file exists yet.
    pub fn load() -> Result<Self, Error> {
        Self::load_from(&config_dir()?.join(FILE_NAME))
    }

    pub fn save(&self) -> Result<(), Error> {
        self.save_to(&config_dir()?.join(FILE_NAME))
    }

    /// Load the configuration file at `path`, creating it with the defaults if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(path)?;
            debug!("Wrote default configuration to {}", path.display());
            return Ok(cfg);
        }

        let contents = fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&contents)?;

        if cfg.version != CURRENT_CONFIG_VERSION {
            return Err(Error::Version {
                found: cfg.version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }

        debug!("Loaded configuration from {}", path.display());

        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Error> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;

        Ok(())
    }

    /// Where the note database lives, falling back to the XDG state directory.
    pub fn database_path(&self) -> Result<PathBuf, Error> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(state_dir()?.join(DATABASE_FILE_NAME)),
        }
    }

    pub fn set_database_path(&mut self, path: impl Into<PathBuf>) {
        self.database_path = Some(path.into());
    }

    pub fn max_title_probes(&self) -> u32 {
        self.max_title_probes
    }

    pub fn set_max_title_probes(&mut self, probes: u32) {
        self.max_title_probes = probes;
    }

    /// A configuration that never touches the filesystem, for tests.
    #[cfg(test)]
    pub(crate) fn mock() -> Self {
        Self::default()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            database_path: None,
            max_title_probes: DEFAULT_MAX_TITLE_PROBES,
        }
    }
}

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_writes_defaults_on_first_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jotter").join(FILE_NAME);

        let cfg = CoreConfig::load_from(&path).unwrap();

        assert_eq!(cfg, CoreConfig::default());
        assert!(path.exists());

        let written: CoreConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, CoreConfig::default());
    }

    #[test]
    fn test_saved_changes_are_loaded_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILE_NAME);

        let mut cfg = CoreConfig::load_from(&path).unwrap();
        cfg.set_max_title_probes(7);
        cfg.set_database_path(dir.path().join("elsewhere.db"));
        cfg.save_to(&path).unwrap();

        assert_eq!(CoreConfig::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn test_unknown_version_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "version = 9\n").unwrap();

        assert!(matches!(
            CoreConfig::load_from(&path),
            Err(Error::Version {
                found: 9,
                expected: CURRENT_CONFIG_VERSION
            })
        ));
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let cfg: CoreConfig = toml::from_str("max_title_probes = 3").unwrap();

        assert_eq!(cfg.max_title_probes(), 3);
        assert_eq!(cfg.version, CURRENT_CONFIG_VERSION);
        assert!(cfg.database_path.is_none());
    }

    #[test]
    fn test_database_path_override() {
        let mut cfg = CoreConfig::mock();
        cfg.set_database_path("/tmp/jotter-test/notes.db");

        assert_eq!(
            cfg.database_path().unwrap(),
            PathBuf::from("/tmp/jotter-test/notes.db")
        );
    }

    #[test]
    fn test_serialized_form_is_readable() {
        let mut cfg = CoreConfig::mock();
        cfg.set_max_title_probes(42);

        let contents = toml::to_string_pretty(&cfg).unwrap();
        let parsed: CoreConfig = toml::from_str(&contents).unwrap();

        assert_eq!(parsed, cfg);
    }
}
