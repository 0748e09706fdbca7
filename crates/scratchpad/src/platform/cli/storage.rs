//! File-based persistence for CLI.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::StorageError;
use crate::storage::KeyValueStore;

/// One `<key>.txt` file per key under `base_path`.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{key}.txt"))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_error = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.base_path).map_err(io_error)?;
        fs::write(self.path_for(key), value).map_err(io_error)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Err(error) if error.kind() != ErrorKind::NotFound => Err(StorageError::Io {
                key: key.to_string(),
                source: error,
            }),
            _ => Ok(()),
        }
    }
}
