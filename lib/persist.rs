use derive_more::{Display, Error, From};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{fs, io};
use tracing::{instrument, warn};

/// Trait for key-value stores that keep player state across sessions.
///
/// Writes are fire and forget; a store that cannot persist a value is
/// expected to log and carry on rather than fail the game.
#[cfg_attr(test, mockall::automock)]
pub trait Store {
    /// Reads the value persisted under `key`.
    fn load_value(&self, key: &str) -> Option<String>;

    /// Persists `value` under `key`.
    fn save_value(&mut self, key: &str, value: &str);
}

/// An in-memory [`Store`] that forgets everything when dropped.
impl Store for HashMap<String, String> {
    fn load_value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }

    fn save_value(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

/// The reason why opening a [`FileStore`] failed.
#[derive(Debug, Display, Error, From)]
pub enum FileStoreError {
    #[display(fmt = "failed to read the state file")]
    Io(io::Error),

    #[display(fmt = "failed to parse the state file")]
    Parse(ron::de::SpannedError),
}

/// A [`Store`] backed by a single RON file.
///
/// Every write rewrites the whole file; there is little state and losing a
/// write to a crash only costs one evaluation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`, creating it on the first write if absent.
    #[instrument(level = "trace", skip(path), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FileStoreError> {
        let path = path.as_ref().to_path_buf();

        let values = match fs::read_to_string(&path) {
            Ok(s) => ron::de::from_str(&s)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(FileStore { path, values })
    }
}

impl Store for FileStore {
    fn load_value(&self, key: &str) -> Option<String> {
        self.values.load_value(key)
    }

    fn save_value(&mut self, key: &str, value: &str) {
        self.values.save_value(key, value);

        let result = ron::ser::to_string(&self.values)
            .map_err(anyhow::Error::from)
            .and_then(|s| Ok(fs::write(&self.path, s)?));

        if let Err(e) = result {
            warn!("failed to persist `{}`, {:?}", key, e);
        }
    }
}
