//! Store location configuration.
//!
//! The only external parameter is [`STORE_URL_ENV`]. It is read once at
//! startup into a [`StoreConfig`] value that is handed to the store factory;
//! nothing here is process-global.

use std::env;
use std::path::PathBuf;
use std::rc::Rc;

use thiserror::Error;
use url::Url;

use crate::store::{FileObjectStore, InMemoryObjectStore, ObjectStore};

/// Environment variable holding the store location.
pub const STORE_URL_ENV: &str = "LOSTUPDATE_STORE_URL";

const REMEDIATION_HINT: &str = "set LOSTUPDATE_STORE_URL to `memory://` for an in-process store \
     or to `file:///absolute/path` pointing at an existing directory";

/// Errors raised while reading the store location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The variable is unset or blank.
    #[error("{var} is not set; {hint}")]
    Missing {
        /// Variable that was read.
        var: &'static str,
        /// How to fix it.
        hint: &'static str,
    },

    /// The variable does not describe a supported store.
    #[error("{var}='{value}' is invalid ({reason}); {hint}")]
    Invalid {
        /// Variable that was read.
        var: &'static str,
        /// Raw value found.
        value: String,
        /// What is wrong with it.
        reason: String,
        /// How to fix it.
        hint: &'static str,
    },
}

/// Where the shared object store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// In-process store, gone when the process exits.
    Memory,
    /// Directory-backed store rooted at an existing directory.
    File {
        /// Account directory; containers become subdirectories.
        root: PathBuf,
    },
}

impl StoreConfig {
    /// Read [`STORE_URL_ENV`] from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(env::var(STORE_URL_ENV).ok())
    }

    /// Parse a raw store location as it would come from the environment.
    ///
    /// A `file://` root must already exist; it is checked here so a bad
    /// location is reported before any store is opened.
    pub fn parse(raw: Option<String>) -> Result<Self, ConfigError> {
        let Some(raw) = raw
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        else {
            return Err(ConfigError::Missing {
                var: STORE_URL_ENV,
                hint: REMEDIATION_HINT,
            });
        };

        let invalid = |reason: String| ConfigError::Invalid {
            var: STORE_URL_ENV,
            value: raw.clone(),
            reason,
            hint: REMEDIATION_HINT,
        };

        let url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "memory" => Ok(StoreConfig::Memory),
            "file" => {
                let root = url
                    .to_file_path()
                    .map_err(|()| invalid("file URL must carry an absolute local path".into()))?;
                if !root.is_dir() {
                    return Err(invalid(format!(
                        "{} is not an existing directory",
                        root.display()
                    )));
                }
                Ok(StoreConfig::File { root })
            }
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }

    /// Open a handle to `container` in the configured store.
    pub fn open(&self, container: &str) -> Rc<dyn ObjectStore> {
        match self {
            StoreConfig::Memory => Rc::new(InMemoryObjectStore::new(container)),
            StoreConfig::File { root } => Rc::new(FileObjectStore::new(root.clone(), container)),
        }
    }
}
