use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use httpmock::prelude::*;

use ds000228_fetch::domain::FileDescriptor;
use ds000228_fetch::error::FetchError;
use ds000228_fetch::fetcher::{FileFetcher, HttpFetcher, TransferOptions, partial_path};

const BODY: &[u8] = b"participant_id\tAge\nsub-pixar001\t3.5\nsub-pixar002\t7.2\n";

fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(temp.path().join("ds000228")).unwrap();
    (temp, dir)
}

fn participants(server: &MockServer) -> FileDescriptor {
    FileDescriptor::from_logical("participants.tsv", &format!("{}/", server.base_url()))
}

fn fetch(
    dir: &Utf8PathBuf,
    file: FileDescriptor,
    resume: bool,
) -> Result<Vec<Utf8PathBuf>, FetchError> {
    HttpFetcher::new()
        .unwrap()
        .fetch_files(dir, &[file], TransferOptions { resume, verbose: 0 })
}

fn write_partial(dir: &Utf8PathBuf, content: &[u8]) -> Utf8PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let target = dir.join("participants.tsv");
    std::fs::write(partial_path(&target), content).unwrap();
    target
}

#[test]
fn downloads_missing_file() {
    let (_temp, dir) = temp_dir();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/participants.tsv");
        then.status(200).body(BODY);
    });

    let paths = fetch(&dir, participants(&server), false).unwrap();

    mock.assert_hits(1);
    assert_eq!(paths, vec![dir.join("participants.tsv")]);
    assert_eq!(std::fs::read(&paths[0]).unwrap(), BODY);
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
}

#[test]
fn cached_file_is_not_requested() {
    let (_temp, dir) = temp_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("participants.tsv"), b"cached").unwrap();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET);
        then.status(200).body(BODY);
    });

    fetch(&dir, participants(&server), true).unwrap();

    mock.assert_hits(0);
    assert_eq!(std::fs::read(dir.join("participants.tsv")).unwrap(), b"cached");
}

#[test]
fn resumes_partial_download() {
    let (_temp, dir) = temp_dir();
    let target = write_partial(&dir, &BODY[..10]);
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/participants.tsv")
            .header("range", "bytes=10-");
        then.status(206).body(&BODY[10..]);
    });

    fetch(&dir, participants(&server), true).unwrap();

    mock.assert_hits(1);
    assert_eq!(std::fs::read(&target).unwrap(), BODY);
    assert!(!partial_path(&target).exists());
}

#[test]
fn full_response_to_range_request_restarts_partial() {
    let (_temp, dir) = temp_dir();
    let target = write_partial(&dir, b"XXXXXXXXXX");
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).header("range", "bytes=10-");
        then.status(200).body(BODY);
    });

    fetch(&dir, participants(&server), true).unwrap();

    mock.assert_hits(1);
    assert_eq!(std::fs::read(&target).unwrap(), BODY);
}

#[test]
fn complete_partial_is_promoted_on_416() {
    let (_temp, dir) = temp_dir();
    let target = write_partial(&dir, BODY);
    let server = MockServer::start();
    let ranged = server.mock(|when, then| {
        when.method(GET).header("range", format!("bytes={}-", BODY.len()));
        then.status(416)
            .header("content-range", format!("bytes */{}", BODY.len()));
    });
    let plain = server.mock(|when, then| {
        when.method(GET).header_missing("range");
        then.status(200).body(b"unexpected");
    });

    fetch(&dir, participants(&server), true).unwrap();

    ranged.assert_hits(1);
    plain.assert_hits(0);
    assert_eq!(std::fs::read(&target).unwrap(), BODY);
    assert!(!partial_path(&target).exists());
}

#[test]
fn oversized_partial_is_discarded_on_416() {
    let (_temp, dir) = temp_dir();
    let target = write_partial(&dir, b"STALE-JUNK!!");
    let server = MockServer::start();
    let ranged = server.mock(|when, then| {
        when.method(GET).header("range", "bytes=12-");
        then.status(416).header("content-range", "bytes */5");
    });
    let plain = server.mock(|when, then| {
        when.method(GET).header_missing("range");
        then.status(200).body(b"fresh");
    });

    fetch(&dir, participants(&server), true).unwrap();

    ranged.assert_hits(1);
    plain.assert_hits(1);
    assert_eq!(std::fs::read(&target).unwrap(), b"fresh");
    assert!(!partial_path(&target).exists());
}

#[test]
fn saves_under_decoded_name() {
    let (_temp, dir) = temp_dir();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path_includes("sub-pixar001");
        then.status(200).body(b"mat");
    });
    let file = FileDescriptor::from_logical(
        "derivatives:fmriprep:sub-pixar001:x.mat",
        &format!("{}/", server.base_url()),
    );

    let paths = fetch(&dir, file, true).unwrap();

    mock.assert_hits(1);
    assert_eq!(paths[0], dir.join("derivatives:fmriprep:sub-pixar001:x.mat"));
}

#[test]
fn http_errors_carry_status() {
    let (_temp, dir) = temp_dir();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET);
        then.status(404).body("missing");
    });

    let err = fetch(&dir, participants(&server), false).unwrap_err();

    assert_matches!(err, FetchError::HttpStatus { status: 404, .. });
    assert!(!dir.join("participants.tsv").exists());
}
