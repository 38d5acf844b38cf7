//! Write text to a file and read it back through the same handle

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{IoResultExt, Result};

pub const DEFAULT_SCRATCH_PATH: &str = "test_wplus.txt";
pub const DEFAULT_SCRATCH_CONTENT: &str = "写入后立即读取\n";

/// Truncate or create `path`, write `content`, rewind and return what the file holds
pub fn write_then_read<P: AsRef<Path>>(path: P, content: &str) -> Result<String> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_path(path)?;

    file.write_all(content.as_bytes()).with_path(path)?;
    file.flush().with_path(path)?;

    // the cursor sits after the written bytes
    file.seek(SeekFrom::Start(0)).with_path(path)?;
    let mut read_back = String::new();
    file.read_to_string(&mut read_back).with_path(path)?;

    debug!(path = %path.display(), bytes = read_back.len(), "scratch file round trip");
    Ok(read_back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use tempfile::TempDir;

    #[test]
    fn test_returns_written_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scratch.txt");
        assert_eq!(
            write_then_read(&path, DEFAULT_SCRATCH_CONTENT).unwrap(),
            DEFAULT_SCRATCH_CONTENT
        );
    }

    #[test]
    fn test_truncates_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scratch.txt");
        std::fs::write(&path, "a much longer previous body").unwrap();

        assert_eq!(write_then_read(&path, "short").unwrap(), "short");
    }

    #[test]
    fn test_missing_directory_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("scratch.txt");

        match write_then_read(&path, "x") {
            Err(ReportError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
