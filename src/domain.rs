use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::FetchError;

pub const DATASET_NAME: &str = "ds000228";
pub const DEFAULT_BASE_URL: &str = "https://openneuro.org/crn/datasets/ds000228/snapshots/00001/files/";
pub const MAX_SUBJECTS: usize = 155;
pub const PHENOTYPIC_FILE: &str = "participants.tsv";

/// Characters left untouched when a logical name is quoted into a URL path.
/// Matches the usual `quote` rules: unreserved characters and `/` pass through.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubjectId(usize);

impl SubjectId {
    pub fn new(value: usize) -> Result<Self, FetchError> {
        if value == 0 || value > MAX_SUBJECTS {
            return Err(FetchError::InvalidSubjectId(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Zero-based row of this subject in `participants.tsv`.
    pub fn row_index(self) -> usize {
        self.0 - 1
    }

    pub fn label(self) -> String {
        format!("sub-pixar{:03}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectCount {
    pub count: usize,
    pub clamped: bool,
}

impl SubjectCount {
    pub fn resolve(requested: Option<usize>) -> Result<Self, FetchError> {
        match requested {
            None => Ok(Self {
                count: MAX_SUBJECTS,
                clamped: false,
            }),
            Some(0) => Err(FetchError::InvalidSubjectCount(
                "at least one subject must be requested".to_string(),
            )),
            Some(n) if n > MAX_SUBJECTS => Ok(Self {
                count: MAX_SUBJECTS,
                clamped: true,
            }),
            Some(n) => Ok(Self {
                count: n,
                clamped: false,
            }),
        }
    }

    pub fn ids(&self) -> Vec<SubjectId> {
        (1..=self.count).map(SubjectId).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Functional,
    Confounds,
}

impl FileCategory {
    pub fn logical_name(self, id: SubjectId) -> String {
        let label = id.label();
        match self {
            FileCategory::Functional => format!(
                "derivatives:fmriprep:{label}:{label}_task-pixar_run-001_swrf_bold.nii.gz"
            ),
            FileCategory::Confounds => format!(
                "derivatives:fmriprep:{label}:{label}_task-pixar_run-001_ART_and_CompCor_nuisance_regressors.mat"
            ),
        }
    }

    pub fn descriptors(self, ids: &[SubjectId], base_url: &str) -> Vec<FileDescriptor> {
        ids.iter()
            .map(|id| FileDescriptor::from_logical(&self.logical_name(*id), base_url))
            .collect()
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileCategory::Functional => write!(f, "func"),
            FileCategory::Confounds => write!(f, "confounds"),
        }
    }
}

/// Per-file fetch settings. Empty for every file this crate requests today.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOptions {
    pub move_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Percent-encoded name, as it appears in the URL.
    pub name: String,
    pub url: String,
    pub options: FileOptions,
}

impl FileDescriptor {
    pub fn from_logical(logical: &str, base_url: &str) -> Self {
        let name = quote(logical);
        let url = format!("{base_url}{name}");
        Self {
            name,
            url,
            options: FileOptions::default(),
        }
    }

    /// Name of the file on disk: the override if set, else the decoded name.
    pub fn local_name(&self) -> Result<String, FetchError> {
        if let Some(name) = &self.options.move_to {
            return Ok(name.clone());
        }
        unquote(&self.name)
    }
}

pub fn quote(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

pub fn unquote(value: &str) -> Result<String, FetchError> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|err| FetchError::InvalidFileName(format!("{value}: {err}")))
}
