use std::io::Read;

use camino::Utf8Path;
use csv::ReaderBuilder;

use crate::domain::SubjectId;
use crate::error::FetchError;

/// Tab-separated participant table with header-derived columns.
///
/// Cells are kept as text. Row `i - 1` describes subject `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhenotypicTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl PhenotypicTable {
    pub fn read(path: &Utf8Path) -> Result<Self, FetchError> {
        let file = std::fs::File::open(path.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("open {path}: {err}")))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FetchError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(reader);

        let columns = reader
            .headers()
            .map_err(|err| FetchError::PhenotypicParse(err.to_string()))?
            .iter()
            .map(|name| name.trim().to_string())
            .collect::<Vec<_>>();
        if columns.iter().all(|name| name.is_empty()) {
            return Err(FetchError::PhenotypicParse("missing header row".to_string()));
        }

        let rows = reader
            .records()
            .map(|record| {
                record
                    .map(|record| record.iter().map(|cell| cell.trim().to_string()).collect())
                    .map_err(|err| FetchError::PhenotypicParse(err.to_string()))
            })
            .collect::<Result<Vec<Vec<String>>, FetchError>>()?;

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|row| row[index].as_str())
    }

    /// Rows for `ids`, in the order given.
    pub fn select(&self, ids: &[SubjectId]) -> Result<Self, FetchError> {
        let rows = ids
            .iter()
            .map(|id| {
                self.rows
                    .get(id.row_index())
                    .cloned()
                    .ok_or(FetchError::PhenotypicMismatch {
                        requested: id.get(),
                        available: self.rows.len(),
                    })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;
        Ok(Self {
            columns: self.columns.clone(),
            rows,
        })
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}
