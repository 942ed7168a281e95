//! Key value store for scraped contract metadata, keyed by contract address.
//!
//! Entries are never invalidated: once an address is stored its entry is returned for good.

use crate::error::Error;
use crate::model::ContractInfo;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

pub trait ContractCache {
    fn exists(&self, key: &str) -> Result<bool, Error>;

    fn get(&self, key: &str) -> Result<ContractInfo, Error>;

    fn put(&self, key: &str, value: &ContractInfo) -> Result<(), Error>;
}

/// Stores each entry as pretty printed JSON in `<dir>/<key>.json`.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        FileCache {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self, key: &str) -> Result<PathBuf, Error> {
        // Keys end up as file names, anything but an address-like string could escape the directory
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::CacheInvalidKey(key.to_string()));
        }

        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl ContractCache for FileCache {
    fn exists(&self, key: &str) -> Result<bool, Error> {
        Ok(self.path(key)?.is_file())
    }

    fn get(&self, key: &str) -> Result<ContractInfo, Error> {
        let path = self.path(key)?;
        if !path.is_file() {
            return Err(Error::CacheMiss(key.to_string()));
        }

        let content =
            std::fs::read_to_string(&path).map_err(|err| Error::CacheIo(path.display().to_string(), err))?;

        Ok(serde_json::from_str(&content)?)
    }

    fn put(&self, key: &str, value: &ContractInfo) -> Result<(), Error> {
        let path = self.path(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|err| Error::CacheIo(self.dir.display().to_string(), err))?;

        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, content).map_err(|err| Error::CacheIo(path.display().to_string(), err))
    }
}

/// Process local cache, mostly useful for tests and one-off runs.
#[derive(Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<String, ContractInfo>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ContractCache for MemoryCache {
    fn exists(&self, key: &str) -> Result<bool, Error> {
        Ok(self.entries.borrow().contains_key(key))
    }

    fn get(&self, key: &str) -> Result<ContractInfo, Error> {
        self.entries
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::CacheMiss(key.to_string()))
    }

    fn put(&self, key: &str, value: &ContractInfo) -> Result<(), Error> {
        self.entries.borrow_mut().insert(key.to_string(), value.clone());
        Ok(())
    }
}
