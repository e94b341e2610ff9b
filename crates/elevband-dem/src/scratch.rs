//! Run-scoped intermediate files.

use crate::Result;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Owns intermediate files created in the work directory and deletes them
/// when released or dropped.
///
/// Every staged reference file, unpacked tile, shifted tile, and mosaic goes
/// through one of these, so a failing stage still leaves the work directory
/// clean.
#[derive(Debug)]
pub struct ScratchFiles {
    work_dir: PathBuf,
    paths: Vec<PathBuf>,
}

impl ScratchFiles {
    /// Create an empty set rooted at `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            paths: Vec::new(),
        }
    }

    /// The directory intermediate files are created in.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Path of `name` inside the work directory, without tracking it.
    pub fn path(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    /// Take ownership of a file that will be created (or already was).
    pub fn track(&mut self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path.clone());
        }
        path
    }

    /// Track `name` inside the work directory.
    pub fn track_name(&mut self, name: &str) -> PathBuf {
        let path = self.path(name);
        self.track(path)
    }

    /// Stop tracking a path so it survives release.
    pub fn keep(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Link `source` into the work directory as `name` and track the link.
    ///
    /// An existing entry with that name is reused as is and left untracked,
    /// since this run did not create it.
    pub fn link(&mut self, source: &Path, name: &str) -> Result<PathBuf> {
        let destination = self.path(name);
        if destination.symlink_metadata().is_ok() {
            debug!("Reusing existing {}", destination.display());
            return Ok(destination);
        }

        link_file(source, &destination)?;
        debug!("Linked {} -> {}", destination.display(), source.display());
        Ok(self.track(destination))
    }

    /// Delete every tracked file, newest first. Files that are already gone
    /// are ignored; other failures are logged and skipped.
    pub fn release(&mut self) {
        while let Some(path) = self.paths.pop() {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(unix)]
fn link_file(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, destination)
}

#[cfg(not(unix))]
fn link_file(source: &Path, destination: &Path) -> io::Result<()> {
    std::fs::copy(source, destination).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_release_on_drop() {
        let dir = TempDir::new().unwrap();
        let created = dir.path().join("espa-mosaic-elevation.img");

        {
            let mut scratch = ScratchFiles::new(dir.path());
            let path = scratch.track_name("espa-mosaic-elevation.img");
            std::fs::write(&path, b"mosaic").unwrap();
            // Tracked but never created
            scratch.track_name("espa-mosaic-elevation.hdr");
            assert_eq!(scratch.len(), 2);
        }

        assert!(!created.exists());
    }

    #[test]
    fn test_keep_survives_release() {
        let dir = TempDir::new().unwrap();
        let mut scratch = ScratchFiles::new(dir.path());
        let path = scratch.track_name("output.img");
        std::fs::write(&path, b"data").unwrap();

        scratch.keep(&path);
        scratch.release();

        assert!(path.exists());
        assert!(scratch.is_empty());
    }

    #[test]
    fn test_link_and_reuse() {
        let data = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let source = data.path().join("geoid.img");
        std::fs::write(&source, b"geoid").unwrap();

        let mut scratch = ScratchFiles::new(work.path());
        let linked = scratch.link(&source, "geoid.img").unwrap();
        assert_eq!(std::fs::read(&linked).unwrap(), b"geoid");
        assert_eq!(scratch.len(), 1);

        // A second link to the same name is not tracked twice
        let mut other = ScratchFiles::new(work.path());
        other.link(&source, "geoid.img").unwrap();
        assert!(other.is_empty());
        drop(other);
        assert!(linked.exists());

        scratch.release();
        assert!(!linked.exists());
        assert!(source.exists());
    }
}
