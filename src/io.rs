//! File I/O operations
//!
//! Load and save plain UTF-8 documents

use crate::error::{NotepadError, Result};
use std::fs;
use std::path::Path;

/// Filesystem seen by the editor. Swapped out in tests.
pub trait Filesystem {
    fn read(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, text: &str) -> Result<()>;
}

/// The real disk
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFilesystem;

impl Filesystem for DiskFilesystem {
    fn read(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| NotepadError::from_io(path, e))?;
        simdutf8::basic::from_utf8(&bytes)
            .map(str::to_owned)
            .map_err(|_| NotepadError::InvalidUtf8(path.to_path_buf()))
    }

    fn write(&self, path: &Path, text: &str) -> Result<()> {
        fs::write(path, text).map_err(|e| NotepadError::from_io(path, e))
    }
}

/// Strip exactly one trailing `\n`, if there is one
pub fn strip_one_trailing_newline(text: &str) -> &str {
    text.strip_suffix('\n').unwrap_or(text)
}

/// Text that ends up on disk for a buffer
pub fn persisted_text(buffer: &str, strip_trailing_newline: bool) -> &str {
    if strip_trailing_newline {
        strip_one_trailing_newline(buffer)
    } else {
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_one_trailing_newline() {
        assert_eq!(strip_one_trailing_newline("hello\n"), "hello");
        assert_eq!(strip_one_trailing_newline("hello\n\n"), "hello\n");
        assert_eq!(strip_one_trailing_newline("hello"), "hello");
        assert_eq!(strip_one_trailing_newline(""), "");
        assert_eq!(strip_one_trailing_newline("\r\n"), "\r");
    }

    #[test]
    fn test_disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");

        DiskFilesystem.write(&path, "한글 text").unwrap();
        assert_eq!(DiskFilesystem.read(&path).unwrap(), "한글 text");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DiskFilesystem.read(&dir.path().join("missing.txt")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_read_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = DiskFilesystem.read(&path).unwrap_err();
        assert!(matches!(err, NotepadError::InvalidUtf8(_)));
    }
}
