use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_RANGE, HeaderMap, HeaderValue, RANGE, USER_AGENT};
use tracing::{debug, info, warn};

use crate::domain::FileDescriptor;
use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    pub resume: bool,
    pub verbose: u8,
}

/// Downloads a batch of files into a directory, skipping files already present.
///
/// Implementations return one local path per descriptor, in input order.
pub trait FileFetcher: Send + Sync {
    fn fetch_files(
        &self,
        dir: &Utf8Path,
        files: &[FileDescriptor],
        options: TransferOptions,
    ) -> Result<Vec<Utf8PathBuf>, FetchError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ds000228-fetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FetchError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(30 * 60))
            .build()
            .map_err(|err| FetchError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
        url: &str,
    ) -> Result<reqwest::blocking::Response, FetchError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "download request failed".to_string());
        Err(FetchError::HttpStatus {
            status,
            url: url.to_string(),
            message,
        })
    }

    fn download_atomic(&self, url: &str, target: &Utf8Path) -> Result<(), FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| FetchError::Http(err.to_string()))?;
        let mut response = Self::handle_status(response, url)?;
        write_atomic(&mut response, target)
    }

    fn download_resumable(&self, url: &str, target: &Utf8Path) -> Result<(), FetchError> {
        let partial = partial_path(target);
        let offset = fs::metadata(partial.as_std_path())
            .map(|meta| meta.len())
            .unwrap_or(0);

        let mut request = self.client.get(url);
        if offset > 0 {
            debug!(offset, "resuming {target}");
            request = request.header(RANGE, format!("bytes={offset}-"));
        }
        let response = request
            .send()
            .map_err(|err| FetchError::Http(err.to_string()))?;

        if offset > 0 && response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            let total = response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|value| value.to_str().ok())
                .and_then(unsatisfied_range_length);
            if total == Some(offset) {
                return fs::rename(partial.as_std_path(), target.as_std_path())
                    .map_err(|err| FetchError::Filesystem(err.to_string()));
            }
            // Partial does not match the remote file; start over.
            warn!(offset, ?total, "discarding stale partial download {partial}");
            fs::remove_file(partial.as_std_path())
                .map_err(|err| FetchError::Filesystem(format!("remove {partial}: {err}")))?;
            return self.download_resumable(url, target);
        }

        let append = offset > 0 && response.status() == StatusCode::PARTIAL_CONTENT;
        let mut response = Self::handle_status(response, url)?;

        let mut open = OpenOptions::new();
        if append {
            open.append(true);
        } else {
            open.write(true).create(true).truncate(true);
        }
        let mut file = open
            .open(partial.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("open {partial}: {err}")))?;
        io::copy(&mut response, &mut file)
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        drop(file);

        fs::rename(partial.as_std_path(), target.as_std_path())
            .map_err(|err| FetchError::Filesystem(err.to_string()))
    }
}

impl FileFetcher for HttpFetcher {
    fn fetch_files(
        &self,
        dir: &Utf8Path,
        files: &[FileDescriptor],
        options: TransferOptions,
    ) -> Result<Vec<Utf8PathBuf>, FetchError> {
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("{dir}: {err}")))?;

        let mut paths = Vec::with_capacity(files.len());
        for file in files {
            let target = dir.join(file.local_name()?);
            if target.as_std_path().exists() {
                if options.verbose > 1 {
                    info!("already cached: {target}");
                } else {
                    debug!("already cached: {target}");
                }
                paths.push(target);
                continue;
            }

            if options.verbose > 0 {
                info!("downloading {}", file.url);
            }
            if options.resume {
                self.download_resumable(&file.url, &target)?;
            } else {
                self.download_atomic(&file.url, &target)?;
            }
            paths.push(target);
        }
        Ok(paths)
    }
}

/// Copies `reader` into a temp file next to `target`, then moves it into place.
/// Nothing is left on disk if the copy fails.
pub fn write_atomic<R: Read>(reader: &mut R, target: &Utf8Path) -> Result<(), FetchError> {
    let parent = target
        .parent()
        .ok_or_else(|| FetchError::Filesystem(format!("invalid destination {target}")))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".ds000228-download")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    io::copy(reader, temp.as_file_mut()).map_err(|err| FetchError::Filesystem(err.to_string()))?;
    temp.persist(target.as_std_path())
        .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    Ok(())
}

/// Complete length from a `416` response's `Content-Range: bytes */N`.
pub fn unsatisfied_range_length(value: &str) -> Option<u64> {
    value.trim().strip_prefix("bytes */")?.trim().parse().ok()
}

/// Where an in-flight resumable download accumulates its bytes.
pub fn partial_path(target: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{target}.part"))
}
