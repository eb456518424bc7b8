// Per-request scratch directory

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const PREFIX: &str = "savebot-";

/// Exclusively-owned scratch directory for one request.
///
/// The directory and everything inside it is removed when the value is
/// dropped, so every exit path of a request cleans up after itself.
#[derive(Debug)]
pub struct WorkArea {
    dir: TempDir,
}

impl WorkArea {
    /// Create a fresh work area under the system temp dir
    pub fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir()?;
        debug!(path = %dir.path().display(), "work area created");
        Ok(Self { dir })
    }

    /// Create a fresh work area under `root`
    pub fn create_in(root: &Path) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir_in(root)?;
        debug!(path = %dir.path().display(), "work area created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Isolated directory for the `n`-th extraction attempt (created on demand)
    pub fn attempt_dir(&self, n: usize) -> io::Result<PathBuf> {
        let dir = self.dir.path().join(format!("attempt-{}", n));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Remove the directory now, reporting failures instead of swallowing them
    pub fn close(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => {
                debug!(path = %path.display(), "work area removed");
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove work area");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_removes_directory_and_contents() {
        let area = WorkArea::create().unwrap();
        let root = area.path().to_path_buf();
        let attempt = area.attempt_dir(1).unwrap();
        std::fs::write(attempt.join("raw_video.mp4"), b"data").unwrap();
        assert!(root.exists());

        drop(area);
        assert!(!root.exists());
    }

    #[test]
    fn test_close_removes_directory() {
        let parent = tempfile::tempdir().unwrap();
        let area = WorkArea::create_in(parent.path()).unwrap();
        let root = area.path().to_path_buf();
        assert!(root.starts_with(parent.path()));

        area.close().unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_work_areas_are_distinct() {
        let a = WorkArea::create().unwrap();
        let b = WorkArea::create().unwrap();
        assert_ne!(a.path(), b.path());
    }
}
