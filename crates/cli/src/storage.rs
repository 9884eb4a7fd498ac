//! Cart persistence in the data directory.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use tajine_house_core::cart::{CartStorage, CartStorageError};

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// crash never leaves a half-written cart.
#[derive(Debug, Clone)]
pub struct JsonFileCartStorage {
    dir: PathBuf,
}

impl JsonFileCartStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CartStorage for JsonFileCartStorage {
    fn load(&self, key: &str) -> Result<Option<String>, CartStorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), CartStorageError> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}
