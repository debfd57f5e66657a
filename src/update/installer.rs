use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

use super::error::UpdateError;
use super::store::VersionStore;
use super::version::Version;
use crate::models::Artifact;

/// Swaps a downloaded artifact into place and records the new version.
pub struct Installer<'a> {
    store: &'a VersionStore,
}

/// Artifact written to a temporary file beside its target, not yet live.
///
/// Dropping it without calling [`StagedArtifact::commit`] deletes the
/// temporary file and leaves the target untouched.
pub struct StagedArtifact {
    file: NamedTempFile,
    target: PathBuf,
}

impl<'a> Installer<'a> {
    pub fn new(store: &'a VersionStore) -> Self {
        Self { store }
    }

    /// Replace the target with the artifact, then record `version`.
    ///
    /// The version record is only written once the rename has succeeded.
    pub fn stage_and_replace(&self, artifact: &Artifact, version: &Version) -> Result<(), UpdateError> {
        let staged = stage(&artifact.payload, &artifact.target)?;
        staged.commit()?;
        info!("installed {} from {}", artifact.target.display(), artifact.source_url);
        self.store.save(version)
    }
}

/// Write `payload` to a temporary file in the same directory as `target`.
pub fn stage(payload: &[u8], target: &Path) -> Result<StagedArtifact, UpdateError> {
    let stage_error = |source: std::io::Error| UpdateError::Stage {
        target: target.to_path_buf(),
        source,
    };

    let dir = install_dir(target);
    let mut file = tempfile::Builder::new()
        .prefix(".ota-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(stage_error)?;

    file.write_all(payload).map_err(stage_error)?;
    file.as_file().sync_all().map_err(stage_error)?;
    copy_permissions(target, file.path()).map_err(stage_error)?;

    debug!("staged {} bytes at {}", payload.len(), file.path().display());
    Ok(StagedArtifact {
        file,
        target: target.to_path_buf(),
    })
}

impl StagedArtifact {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Atomically rename the staged file onto the target.
    pub fn commit(self) -> Result<(), UpdateError> {
        let target = self.target;
        // On failure the temporary file comes back inside the error and is
        // removed when it drops
        self.file.persist(&target).map_err(|e| UpdateError::Replace {
            target: target.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}

fn install_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Keep the live file's mode so a replaced executable stays executable
fn copy_permissions(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::metadata(from) {
        Ok(meta) => fs::set_permissions(to, meta.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
