//! BLAKE3 checksum task, hashing a file in fixed-size reads.

use crate::task::{Task, TaskError, TaskStep};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Largest accepted read size.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

pub struct ChecksumTask {
    path: PathBuf,
    chunk_size: usize,
    description: String,
    file: Option<File>,
    buf: Vec<u8>,
    hasher: blake3::Hasher,
    read: u64,
    total: u64,
    digest: Option<String>,
}

impl ChecksumTask {
    pub fn new(path: impl Into<PathBuf>, chunk_size: usize) -> Self {
        let path = path.into();
        let description = format!("Checksumming {}", path.display());
        Self {
            path,
            chunk_size: chunk_size.clamp(1, MAX_CHUNK_SIZE),
            description,
            file: None,
            buf: Vec::new(),
            hasher: blake3::Hasher::new(),
            read: 0,
            total: 0,
            digest: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hex digest, available once the task has completed.
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }
}

impl Task for ChecksumTask {
    fn description(&self) -> &str {
        &self.description
    }

    fn start(&mut self) -> Result<(), TaskError> {
        let file = File::open(&self.path)?;
        self.total = file.metadata()?.len();
        let len = usize::try_from(self.total).map_or(self.chunk_size, |total| total.clamp(1, self.chunk_size));
        self.buf = vec![0u8; len];
        self.file = Some(file);
        Ok(())
    }

    fn step(&mut self) -> Result<TaskStep, TaskError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(TaskStep::Done);
        };

        let n = file.read(&mut self.buf)?;
        if n == 0 {
            self.digest = Some(hex::encode(self.hasher.finalize().as_bytes()));
            self.file = None;
            self.buf = Vec::new();
            return Ok(TaskStep::Done);
        }
        self.hasher.update(&self.buf[..n]);
        self.read += n as u64;
        Ok(TaskStep::Continue)
    }

    fn progress(&self) -> Option<f64> {
        if self.digest.is_some() || self.total == 0 {
            return Some(if self.digest.is_some() { 1.0 } else { 0.0 });
        }
        Some((self.read as f64 / self.total as f64).min(1.0))
    }
}
