use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{DATASET_NAME, DEFAULT_BASE_URL};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Number of subjects to fetch; `None` fetches all of them.
    #[serde(default)]
    pub n_subjects: Option<usize>,
    #[serde(default)]
    pub data_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_resume")]
    pub resume: bool,
    #[serde(default = "default_verbose")]
    pub verbose: u8,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            n_subjects: None,
            data_dir: None,
            url: None,
            resume: default_resume(),
            verbose: default_verbose(),
        }
    }
}

impl FetchConfig {
    pub fn with_subjects(n_subjects: usize) -> Self {
        Self {
            n_subjects: Some(n_subjects),
            ..Self::default()
        }
    }

    pub fn dataset_name(&self) -> &'static str {
        DATASET_NAME
    }

    pub fn base_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }
}

fn default_resume() -> bool {
    true
}

fn default_verbose() -> u8 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.n_subjects, None);
        assert!(config.resume);
        assert_eq!(config.verbose, 1);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn base_url_override_is_used_verbatim() {
        let config = FetchConfig {
            url: Some("http://mirror.local/ds000228/".to_string()),
            ..FetchConfig::default()
        };
        assert_eq!(config.base_url(), "http://mirror.local/ds000228/");
    }
}
