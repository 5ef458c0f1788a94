use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dinoqode_logging::{dq_debug, dq_info};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::filename::{archive_filename, with_counter};

const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("directory {path} missing or not usable: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot archive {from} to {to}: {source}")]
    Archive {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no free archive name for {0}")]
    ArchiveNameExhausted(String),
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Ensure a directory exists; an existing directory is success.
pub fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::create_dir_all(dir) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
        Err(source) => {
            return Err(PersistError::Directory {
                path: dir.to_path_buf(),
                source,
            })
        }
    }
    if !dir.is_dir() {
        return Err(PersistError::Directory {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, "path is not a directory"),
        });
    }
    Ok(())
}

/// The current batch file and the archive of superseded batches.
#[derive(Debug, Clone)]
pub struct BatchStore {
    input_path: PathBuf,
    archive_dir: PathBuf,
}

impl BatchStore {
    pub fn new(input_path: PathBuf, archive_dir: PathBuf) -> Self {
        Self {
            input_path,
            archive_dir,
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    pub fn has_batch(&self) -> bool {
        self.input_path.is_file()
    }

    /// Moves the current batch file into the archive under a timestamped name.
    ///
    /// Returns `None` when there is no current batch. The move is a single
    /// rename and never replaces an existing archive entry.
    pub fn archive_previous(&self, timestamp: &str) -> Result<Option<PathBuf>, PersistError> {
        if !self.has_batch() {
            return Ok(None);
        }
        ensure_dir(&self.archive_dir)?;

        let content = fs::read(&self.input_path).map_err(|source| PersistError::Archive {
            from: self.input_path.clone(),
            to: self.archive_dir.clone(),
            source,
        })?;
        let target = self.free_archive_path(&archive_filename(self.stem(), timestamp, &content))?;

        fs::rename(&self.input_path, &target).map_err(|source| PersistError::Archive {
            from: self.input_path.clone(),
            to: target.clone(),
            source,
        })?;
        dq_info!("Archived previous batch to {:?}", target);
        Ok(Some(target))
    }

    /// Atomically replaces the batch file with `content`.
    pub fn persist(&self, content: &str) -> Result<PathBuf, PersistError> {
        let dir = self
            .input_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        ensure_dir(dir)?;

        let write_err = |source: io::Error| PersistError::Write {
            path: self.input_path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        tmp.as_file_mut().sync_all().map_err(write_err)?;
        tmp.persist(&self.input_path)
            .map_err(|e| write_err(e.error))?;
        dq_debug!("Wrote {} bytes to {:?}", content.len(), self.input_path);
        Ok(self.input_path.clone())
    }

    /// Archive entries sorted by name.
    pub fn archived(&self) -> Result<Vec<PathBuf>, PersistError> {
        let entries = match fs::read_dir(&self.archive_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PersistError::Directory {
                    path: self.archive_dir.clone(),
                    source,
                })
            }
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn stem(&self) -> &str {
        self.input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("batch")
    }

    fn free_archive_path(&self, filename: &str) -> Result<PathBuf, PersistError> {
        let first = self.archive_dir.join(filename);
        if !first.exists() {
            return Ok(first);
        }
        (1..MAX_NAME_ATTEMPTS)
            .map(|n| self.archive_dir.join(with_counter(filename, n)))
            .find(|candidate| !candidate.exists())
            .ok_or_else(|| PersistError::ArchiveNameExhausted(filename.to_string()))
    }
}
