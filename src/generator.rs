use log::{error, info};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{GenerateError, Result};

/// Banner placed at the top of every generated file.
pub const CONFIG_FILE_WARNING: &str = "# WARNING: This file will be regenerated on container startup. Any manual changes will be overwritten.\n\n";

/// A fully rendered file, waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub path: PathBuf,
    pub contents: String,
}

impl RenderedArtifact {
    /// Wraps a rendered body, prefixing it with [`CONFIG_FILE_WARNING`].
    pub fn new(path: impl Into<PathBuf>, body: &str) -> Self {
        Self {
            path: path.into(),
            contents: format!("{CONFIG_FILE_WARNING}{body}"),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// What happened to one artifact on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Skipped,
}

pub struct FileGenerator {
    dry_run: bool,
}

impl FileGenerator {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Ensures that the specified directory exists, creating it if necessary.
    fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| {
                error!("Failed to create directory: {:?}", path);
                GenerateError::io(path, e)
            })?;
        }
        Ok(())
    }

    /// Writes an artifact, always replacing what is there. Whether the file
    /// existed only changes the log message.
    pub fn write(&self, artifact: &RenderedArtifact) -> Result<WriteOutcome> {
        let path = &artifact.path;
        if path.file_name().is_none() {
            error!("Output path must have a filename: {:?}", path);
            return Err(GenerateError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "output path has no file name"),
            ));
        }

        let existed = path.exists();
        if self.dry_run {
            info!("[DRY RUN] Would write: {:?}", path);
            return Ok(WriteOutcome::Skipped);
        }

        if let Some(parent) = path.parent() {
            Self::ensure_dir_exists(parent)?;
        }

        if existed {
            info!("Updating {}", artifact.file_name());
        } else {
            info!("Generating {} since it does not exist yet", artifact.file_name());
        }

        fs::write(path, &artifact.contents).map_err(|e| {
            error!("Failed to write rendered content to file: {:?}", path);
            GenerateError::io(path, e)
        })?;

        Ok(if existed {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Created
        })
    }
}
