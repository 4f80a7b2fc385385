//! `checkpoint`
//!
//! Remembers how far through a drawing the plotter got, so that an interrupted job can carry on
//! where it left off.
//!
//! The checkpoint is a small text file holding the index of the last instruction that was
//! completed. Its presence means a job is in progress, and it is removed once a job finishes.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::error::CheckpointError;

/// Where the checkpoint lives unless configured otherwise.
pub const DEFAULT_CHECKPOINT_PATH: &str = "progress.txt";

/// A checkpoint file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Location of the file.
    path: PathBuf,
}

impl Checkpoint {
    /// Creates a new [`Checkpoint`]. Nothing is touched until it is saved.
    ///
    /// # Arguments
    /// * `path`: Where the file lives.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Checkpoint { path: path.into() }
    }

    /// Gets where the file lives.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records that an instruction has been completed.
    ///
    /// The file is replaced in one go, so an interruption part way through a save leaves the
    /// previous index in place.
    ///
    /// # Arguments
    /// * `index`: Index of the instruction that was just completed.
    ///
    /// # Errors
    /// [`CheckpointError::Persistence`] if the file could not be written.
    pub fn save(&self, index: usize) -> Result<(), CheckpointError> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let replace = || -> io::Result<()> {
            let mut file = NamedTempFile::new_in(directory)?;
            write!(file, "{index}")?;
            file.flush()?;
            file.persist(&self.path).map_err(|err| err.error)?;
            Ok(())
        };

        replace().map_err(|source| self.persistence(source))
    }

    /// Reads the checkpoint.
    ///
    /// # Returns
    /// The index of the last completed instruction, or `None` if there is no checkpoint.
    ///
    /// # Errors
    /// [`CheckpointError::Persistence`] if the file exists but cannot be read,
    /// [`CheckpointError::Corrupt`] if it does not hold an index.
    pub fn load(&self) -> Result<Option<usize>, CheckpointError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.persistence(err)),
        };

        content
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CheckpointError::Corrupt {
                path: self.path.clone(),
                content,
            })
    }

    /// Removes the checkpoint, marking the job as finished. Removing a checkpoint that does not
    /// exist is not an error.
    ///
    /// # Errors
    /// [`CheckpointError::Persistence`] if the file could not be removed.
    pub fn clear(&self) -> Result<(), CheckpointError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.persistence(err)),
        }
    }

    /// Wraps an I/O failure on this checkpoint.
    fn persistence(&self, source: io::Error) -> CheckpointError {
        CheckpointError::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Checkpoint::new(DEFAULT_CHECKPOINT_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("progress.txt"));

        assert_eq!(checkpoint.load().unwrap(), None, "no checkpoint yet");

        checkpoint.save(0).unwrap();
        assert_eq!(checkpoint.load().unwrap(), Some(0));
        checkpoint.save(1234).unwrap();
        assert_eq!(checkpoint.load().unwrap(), Some(1234), "later saves replace earlier ones");
        assert_eq!(fs::read_to_string(checkpoint.path()).unwrap(), "1234");

        checkpoint.clear().unwrap();
        assert!(!checkpoint.path().exists());
        assert_eq!(checkpoint.load().unwrap(), None);
        checkpoint.clear().unwrap();
    }

    #[test]
    fn test_load_accepts_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("progress.txt"));
        fs::write(checkpoint.path(), "5\n").unwrap();
        assert_eq!(checkpoint.load().unwrap(), Some(5));
    }

    #[test]
    fn test_load_rejects_corrupt_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("progress.txt"));

        for content in ["", "five", "-1", "3.5"] {
            fs::write(checkpoint.path(), content).unwrap();
            assert!(
                matches!(
                    checkpoint.load(),
                    Err(CheckpointError::Corrupt { content: ref found, .. }) if *found == content
                ),
                "{content:?} should not load"
            );
        }
    }

    #[test]
    fn test_save_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("missing").join("progress.txt"));
        assert!(matches!(
            checkpoint.save(1),
            Err(CheckpointError::Persistence { .. })
        ));
    }
}
