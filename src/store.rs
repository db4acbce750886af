use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::error::FetchError;

#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    /// Store rooted at `data_dir` when given, else at `~/.cache/ds000228-fetch`.
    pub fn new(data_dir: Option<&Utf8Path>) -> Result<Self, FetchError> {
        if let Some(dir) = data_dir {
            return Ok(Self::new_with_root(dir.to_path_buf()));
        }

        let root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("ds000228-fetch"))
                    .ok()
            })
            .ok_or_else(|| FetchError::DataDir("unable to resolve cache directory".to_string()))?;

        Ok(Self { root })
    }

    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn dataset_dir(&self, dataset_name: &str) -> Utf8PathBuf {
        self.root.join(dataset_name)
    }

    /// Returns the dataset directory, creating it if needed.
    pub fn ensure_dataset_dir(&self, dataset_name: &str) -> Result<Utf8PathBuf, FetchError> {
        let dir = self.dataset_dir(dataset_name);
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| FetchError::DataDir(format!("{dir}: {err}")))?;
        Ok(dir)
    }
}
