// Payload ceiling check before handoff to the messaging client

use std::io;
use std::path::Path;

/// Largest file the messaging client accepts (50 MiB)
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheck {
    Ok(u64),
    TooLarge(u64),
}

impl SizeCheck {
    pub fn size(&self) -> u64 {
        match self {
            Self::Ok(size) | Self::TooLarge(size) => *size,
        }
    }
}

/// Stat `path` and compare against `ceiling` (inclusive)
pub fn check(path: &Path, ceiling: u64) -> io::Result<SizeCheck> {
    let size = std::fs::metadata(path)?.len();
    if size > ceiling {
        Ok(SizeCheck::TooLarge(size))
    } else {
        Ok(SizeCheck::Ok(size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn sized_file(dir: &Path, len: u64) -> std::path::PathBuf {
        let path = dir.join(format!("file-{}", len));
        File::create(&path).unwrap().set_len(len).unwrap();
        path
    }

    #[test]
    fn test_exact_ceiling_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = sized_file(dir.path(), MAX_FILE_SIZE);
        assert_eq!(check(&path, MAX_FILE_SIZE).unwrap(), SizeCheck::Ok(MAX_FILE_SIZE));
    }

    #[test]
    fn test_one_byte_over_is_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let path = sized_file(dir.path(), MAX_FILE_SIZE + 1);
        assert_eq!(
            check(&path, MAX_FILE_SIZE).unwrap(),
            SizeCheck::TooLarge(MAX_FILE_SIZE + 1)
        );
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check(&dir.path().join("nope.mp4"), MAX_FILE_SIZE).is_err());
    }
}
