use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("invalid subject count: {0}")]
    InvalidSubjectCount(String),

    #[error("invalid subject id: {0}")]
    InvalidSubjectId(String),

    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    #[error("unable to resolve data directory: {0}")]
    DataDir(String),

    #[error("download request failed: {0}")]
    Http(String),

    #[error("{url} returned status {status}: {message}")]
    HttpStatus {
        status: u16,
        url: String,
        message: String,
    },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to parse phenotypic table: {0}")]
    PhenotypicParse(String),

    #[error("phenotypic table has {available} rows but {requested} subjects were requested")]
    #[diagnostic(help("the remote participants.tsv no longer lines up with the subject files"))]
    PhenotypicMismatch { requested: usize, available: usize },
}
