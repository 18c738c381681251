//! Append-only audit log mapping codes to original file names.
//!
//! CSV, UTF-8, one record per marked image:
//!
//! ```text
//! code,original_filename
//! 3f9a1c,IMG_0001.jpg
//! ```
//!
//! Batch runs recreate the file at start ([`AuditLog::create`]); single-image
//! runs append to a long-lived file ([`AuditLog::open_append`]). Appends from
//! parallel workers are serialized through a mutex so lines never interleave.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub const AUDIT_FILENAME: &str = "watermark_log.csv";
pub const AUDIT_HEADER: &str = "code,original_filename";

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit log {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl AuditLog {
    /// Truncate (or create) `path` and write the header.
    pub fn create(path: &Path) -> Result<Self, AuditError> {
        let io_err = |source| AuditError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::create(path).map_err(io_err)?;
        writeln!(file, "{AUDIT_HEADER}").map_err(io_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Open `path` for appending; writes the header if the file is new or empty.
    pub fn open_append(path: &Path) -> Result<Self, AuditError> {
        let io_err = |source| AuditError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        if file.metadata().map_err(io_err)?.len() == 0 {
            writeln!(file, "{AUDIT_HEADER}").map_err(io_err)?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Safe to call from many threads.
    pub fn append(&self, code: &str, filename: &str) -> Result<(), AuditError> {
        let line = format!("{},{}\n", csv_field(code), csv_field(filename));
        // Each record is a single write_all; a poisoned lock holds no partial line.
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| AuditError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Quote a field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
impl AuditLog {
    /// A log whose file handle rejects every append.
    pub(crate) fn read_only(path: &Path) -> Self {
        File::create(path).unwrap();
        Self {
            path: path.to_path_buf(),
            file: Mutex::new(File::open(path).unwrap()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    // =========================================================================
    // create / open_append tests
    // =========================================================================

    #[test]
    fn create_truncates_and_writes_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(AUDIT_FILENAME);
        fs::write(&path, "old,stuff\n").unwrap();

        let log = AuditLog::create(&path).unwrap();
        log.append("ab12cd", "photo.jpg").unwrap();

        assert_eq!(lines(&path), vec![AUDIT_HEADER, "ab12cd,photo.jpg"]);
    }

    #[test]
    fn open_append_keeps_existing_records() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("server.csv");

        AuditLog::open_append(&path)
            .unwrap()
            .append("aaaaaaaa", "one.png")
            .unwrap();
        AuditLog::open_append(&path)
            .unwrap()
            .append("bbbbbbbb", "two.png")
            .unwrap();

        assert_eq!(
            lines(&path),
            vec![AUDIT_HEADER, "aaaaaaaa,one.png", "bbbbbbbb,two.png"]
        );
    }

    #[test]
    fn create_in_missing_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let err = AuditLog::create(&tmp.path().join("nope/log.csv")).unwrap_err();
        assert!(matches!(err, AuditError::Io { .. }));
    }

    // =========================================================================
    // append tests
    // =========================================================================

    #[test]
    fn fields_with_commas_and_quotes_are_quoted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("log.csv");
        let log = AuditLog::create(&path).unwrap();
        log.append("c1", "beach, day 2.jpg").unwrap();
        log.append("c2", "the \"best\".png").unwrap();

        assert_eq!(
            lines(&path)[1..],
            [
                "c1,\"beach, day 2.jpg\"".to_string(),
                "c2,\"the \"\"best\"\".png\"".to_string(),
            ]
        );
    }

    #[test]
    fn concurrent_appends_never_interleave() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("log.csv");
        let log = Arc::new(AuditLog::create(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        log.append(&format!("t{t}"), &format!("file_{t}_{i}.jpg"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let lines = lines(&path);
        assert_eq!(lines.len(), 1 + 8 * 50);
        for line in &lines[1..] {
            let (code, name) = line.split_once(',').unwrap();
            assert!(name.starts_with(&format!("file_{}_", &code[1..])), "{line}");
        }
    }
}
