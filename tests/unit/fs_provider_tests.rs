//! Unit tests for the filesystem capability provider.

use std::sync::{Arc, Mutex};

use bytesmith::acp::types::{ReadTextFileParams, WriteTextFileParams};
use bytesmith::providers::fs::{FileChange, FileChangeObserver, FsProvider};
use bytesmith::AppError;

/// Observer that records every change it sees.
#[derive(Default)]
struct RecordingObserver {
    seen: Mutex<Vec<FileChange>>,
}

impl FileChangeObserver for RecordingObserver {
    fn file_changed(&self, change: &FileChange) {
        self.seen.lock().unwrap().push(change.clone());
    }
}

fn provider() -> (FsProvider, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let fs = FsProvider::new(Arc::clone(&observer) as Arc<dyn FileChangeObserver>);
    (fs, observer)
}

fn read_params(path: &str, line: i64, limit: i64) -> ReadTextFileParams {
    ReadTextFileParams {
        session_id: "s".to_owned(),
        path: path.to_owned(),
        line,
        limit,
    }
}

#[tokio::test]
async fn read_full_file_preserves_trailing_newline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "a\nb\nc\n").unwrap();

    let (fs, _) = provider();
    let result = fs
        .read_text_file(read_params(path.to_str().unwrap(), 0, 0))
        .await
        .expect("read");

    assert_eq!(result.content, "a\nb\nc\n");
}

/// A window that ends before the last line gets no trailing newline.
#[tokio::test]
async fn read_window_inside_file_has_no_trailing_newline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "a\nb\nc\n").unwrap();

    let (fs, _) = provider();
    let result = fs
        .read_text_file(read_params(path.to_str().unwrap(), 2, 1))
        .await
        .expect("read");

    assert_eq!(result.content, "b", "selection ends before the last line");
}

/// A window reaching the last line keeps the trailing newline.
#[tokio::test]
async fn read_window_to_last_line_keeps_newline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "a\nb\nc\n").unwrap();

    let (fs, _) = provider();
    let result = fs
        .read_text_file(read_params(path.to_str().unwrap(), 3, 0))
        .await
        .expect("read");

    assert_eq!(result.content, "c\n");
}

/// `line` beyond the end of the file yields empty content, not an error.
#[tokio::test]
async fn read_beyond_eof_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "a\nb\nc\n").unwrap();

    let (fs, _) = provider();
    let result = fs
        .read_text_file(read_params(path.to_str().unwrap(), 4, 0))
        .await
        .expect("read");

    assert_eq!(result.content, "");
}

/// Zero and negative `line` default to 1; an over-large `limit` clamps to
/// the end of the file.
#[tokio::test]
async fn read_defaults_and_clamps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "a\nb\n").unwrap();

    let (fs, _) = provider();
    let from_zero = fs
        .read_text_file(read_params(path.to_str().unwrap(), 0, 0))
        .await
        .expect("read");
    let from_negative = fs
        .read_text_file(read_params(path.to_str().unwrap(), -5, 100))
        .await
        .expect("read");

    assert_eq!(from_zero.content, "a\nb\n");
    assert_eq!(from_negative.content, "a\nb\n");
}

/// An empty file reads as empty content with no added newline.
#[tokio::test]
async fn read_empty_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");
    std::fs::write(&path, "").unwrap();

    let (fs, _) = provider();
    let result = fs
        .read_text_file(read_params(path.to_str().unwrap(), 1, 0))
        .await
        .expect("read");

    assert_eq!(result.content, "");
}

/// A missing file surfaces as a domain failure.
#[tokio::test]
async fn read_missing_file_is_an_error() {
    let (fs, _) = provider();
    let result = fs
        .read_text_file(read_params("/nonexistent/definitely/missing.txt", 1, 0))
        .await;

    assert!(matches!(result, Err(AppError::Io(_))));
}

/// write followed by a full read returns the written content (plus the
/// trailing newline the read path appends at EOF).
#[tokio::test]
async fn write_then_read_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let path_str = path.to_str().unwrap().to_owned();

    let (fs, _) = provider();
    fs.write_text_file(
        WriteTextFileParams {
            session_id: "s".to_owned(),
            path: path_str.clone(),
            content: "hello\nworld".to_owned(),
        },
        "test-agent",
    )
    .await
    .expect("write");

    let result = fs
        .read_text_file(read_params(&path_str, 1, 0))
        .await
        .expect("read");
    assert_eq!(result.content, "hello\nworld\n");
}

/// Writes create missing parent directories.
#[tokio::test]
async fn write_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deep/nested/out.txt");

    let (fs, _) = provider();
    fs.write_text_file(
        WriteTextFileParams {
            session_id: "s".to_owned(),
            path: path.to_str().unwrap().to_owned(),
            content: "x".to_owned(),
        },
        "test-agent",
    )
    .await
    .expect("write");

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "x");

    // Directories are created 0755 (less the process umask): owner keeps
    // full access, group/other never gain write.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        let mode = std::fs::metadata(dir.path().join("deep"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o700, 0o700, "owner must keep rwx, got {mode:o}");
        assert_eq!(mode & 0o022, 0, "group/other must not be writable, got {mode:o}");
    }
}

/// Each write appends to the change log with the prior content (missing
/// file = empty) and notifies the observer.
#[tokio::test]
async fn write_records_change_and_notifies_observer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracked.txt");
    let path_str = path.to_str().unwrap().to_owned();

    let (fs, observer) = provider();

    fs.write_text_file(
        WriteTextFileParams {
            session_id: "sess-1".to_owned(),
            path: path_str.clone(),
            content: "first".to_owned(),
        },
        "test-agent",
    )
    .await
    .expect("first write");

    fs.write_text_file(
        WriteTextFileParams {
            session_id: "sess-1".to_owned(),
            path: path_str.clone(),
            content: "second".to_owned(),
        },
        "test-agent",
    )
    .await
    .expect("second write");

    let changes = fs.changes().await;
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].old_content, "", "missing file reads as empty");
    assert_eq!(changes[0].new_content, "first");
    assert_eq!(changes[1].old_content, "first");
    assert_eq!(changes[1].new_content, "second");
    assert_eq!(changes[1].session_id, "sess-1");
    assert_eq!(changes[1].agent_name, "test-agent");

    let seen = observer.seen.lock().unwrap();
    assert_eq!(seen.len(), 2, "observer must see every write");
    assert_eq!(seen[1].new_content, "second");
}
