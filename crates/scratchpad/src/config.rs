use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

macro_rules! pyodide_version {
    () => {
        "0.26.2"
    };
}

pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 5000;
/// Pyodide release the browser runtime is built against. Stream capture
/// relies on the `setStdout({ write })` API, which needs 0.24 or later.
pub const PYODIDE_VERSION: &str = pyodide_version!();
pub const DEFAULT_RUNTIME_INDEX_URL: &str =
    concat!("https://cdn.jsdelivr.net/pyodide/v", pyodide_version!(), "/full/");
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "script.py";
pub const DEFAULT_STATE_DIR: &str = ".scratchpad";

/// Scratchpad settings. Every field has a default, so an empty TOML
/// document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub autosave_interval_ms: u64,
    /// Where the browser runtime loads its packages from.
    pub runtime_index_url: String,
    /// Filename offered when the editor text is downloaded.
    pub download_filename: String,
    /// Directory for file-backed persistence (native only).
    pub state_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autosave_interval_ms: DEFAULT_AUTOSAVE_INTERVAL_MS,
            runtime_index_url: DEFAULT_RUNTIME_INDEX_URL.to_string(),
            download_filename: DEFAULT_DOWNLOAD_FILENAME.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(source) => Self::from_toml_str(&source),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_millis(self.autosave_interval_ms)
    }

    /// The `pyodide.js` loader that defines `loadPyodide` for the page.
    pub fn loader_script_url(&self) -> String {
        format!("{}/pyodide.js", self.runtime_index_url.trim_end_matches('/'))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.autosave_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "autosave_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.download_filename.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "download_filename",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
