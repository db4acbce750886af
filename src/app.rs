use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::FetchConfig;
use crate::domain::{
    DATASET_NAME, FileCategory, FileDescriptor, MAX_SUBJECTS, PHENOTYPIC_FILE, SubjectCount,
    SubjectId,
};
use crate::error::FetchError;
use crate::fetcher::{FileFetcher, HttpFetcher, TransferOptions};
use crate::phenotypic::PhenotypicTable;
use crate::store::Store;

/// Local copy of the dataset. Path lists follow ascending subject id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ds000228 {
    pub func: Vec<Utf8PathBuf>,
    pub confounds: Vec<Utf8PathBuf>,
    /// Raw `participants.tsv` as downloaded.
    pub phenotypic: Utf8PathBuf,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct FetchReport {
    pub dataset: Ds000228,
    /// Participant rows for the fetched subjects.
    pub phenotypes: PhenotypicTable,
    pub subjects: SubjectCount,
}

#[derive(Clone)]
pub struct App<F: FileFetcher> {
    fetcher: F,
}

impl<F: FileFetcher> App<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetch(&self, config: &FetchConfig) -> Result<Ds000228, FetchError> {
        self.fetch_with_details(config).map(|report| report.dataset)
    }

    pub fn fetch_with_details(&self, config: &FetchConfig) -> Result<FetchReport, FetchError> {
        let subjects = SubjectCount::resolve(config.n_subjects)?;
        if subjects.clamped {
            warn!("there are only {MAX_SUBJECTS} subjects; fetching {MAX_SUBJECTS}");
        }

        let store = Store::new(config.data_dir.as_deref())?;
        let data_dir = store.ensure_dataset_dir(config.dataset_name())?;
        let ids = subjects.ids();
        let base_url = config.base_url();
        let options = TransferOptions {
            resume: config.resume,
            verbose: config.verbose,
        };

        let metadata = FileDescriptor::from_logical(PHENOTYPIC_FILE, &base_url);
        let phenotypic = self
            .fetcher
            .fetch_files(&data_dir, &[metadata], options)?
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Filesystem(format!("{PHENOTYPIC_FILE} was not fetched")))?;

        let table = PhenotypicTable::read(&phenotypic)?;
        if table.is_empty() {
            return Err(FetchError::PhenotypicParse(format!(
                "{PHENOTYPIC_FILE} has no participant rows"
            )));
        }
        if table.len() < subjects.count {
            return Err(FetchError::PhenotypicMismatch {
                requested: subjects.count,
                available: table.len(),
            });
        }
        if table.len() != MAX_SUBJECTS {
            warn!(
                rows = table.len(),
                "{PHENOTYPIC_FILE} does not have one row per subject ({MAX_SUBJECTS})"
            );
        }
        let phenotypes = table.select(&ids)?;

        let func =
            self.fetch_category(FileCategory::Functional, &ids, &base_url, &data_dir, options)?;
        let confounds =
            self.fetch_category(FileCategory::Confounds, &ids, &base_url, &data_dir, options)?;

        if config.verbose > 0 {
            info!(subjects = subjects.count, "{DATASET_NAME} ready in {data_dir}");
        }

        Ok(FetchReport {
            dataset: Ds000228 {
                func,
                confounds,
                phenotypic,
                description: DATASET_NAME.to_string(),
            },
            phenotypes,
            subjects,
        })
    }

    fn fetch_category(
        &self,
        category: FileCategory,
        ids: &[SubjectId],
        base_url: &str,
        data_dir: &Utf8Path,
        options: TransferOptions,
    ) -> Result<Vec<Utf8PathBuf>, FetchError> {
        let files = category.descriptors(ids, base_url);
        let paths = self.fetcher.fetch_files(data_dir, &files, options)?;
        if paths.len() != files.len() {
            return Err(FetchError::Filesystem(format!(
                "expected {} {category} files, fetched {}",
                files.len(),
                paths.len()
            )));
        }
        Ok(paths)
    }
}

/// Fetch over HTTP with the default client.
pub fn fetch_ds000228(config: &FetchConfig) -> Result<Ds000228, FetchError> {
    App::new(HttpFetcher::new()?).fetch(config)
}
