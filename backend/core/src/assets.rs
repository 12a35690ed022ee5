use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// Read-only view of the directory an engine loads its model files from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    root: PathBuf,
}

impl AssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Fail with [`EngineError::MissingAsset`] unless every name is present.
    pub fn require(&self, names: &[&str]) -> Result<(), EngineError> {
        match names.iter().find(|name| !self.contains(name)) {
            Some(missing) => Err(EngineError::MissingAsset((*missing).to_string())),
            None => Ok(()),
        }
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        fs::read(self.path(name)).map_err(|source| EngineError::Asset {
            name: name.to_string(),
            source,
        })
    }

    pub fn read_to_string(&self, name: &str) -> Result<String, EngineError> {
        let bytes = self.read(name)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
