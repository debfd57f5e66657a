use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::{json, Value};

use super::error::UpdateError;
use super::installer::{stage, StagedArtifact};
use super::version::Version;

/// Default name of the local version record, next to the installed file.
pub const VERSION_FILE: &str = "version.json";

/// Reads and writes the local `version.json` record.
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the installed version, never failing.
    ///
    /// A missing record is created with `0.0.0`. Unreadable or malformed
    /// records are reported through `report` and treated as `0.0.0`.
    pub fn load(&self, mut report: impl FnMut(String)) -> Version {
        if !self.path.exists() {
            let initial = Version::zero();
            if let Err(e) = self.save(&initial) {
                warn!("{}", e);
                report(format!("Error creating {}: {}", self.path.display(), e));
            }
            return initial;
        }

        match self.read() {
            Ok(version) => version,
            Err(e) => {
                warn!("{}", e);
                report(format!("Error reading {}: {}", self.path.display(), e));
                Version::zero()
            }
        }
    }

    fn read(&self) -> Result<Version, UpdateError> {
        let local_state = |reason: String| UpdateError::LocalState {
            path: self.path.clone(),
            reason,
        };

        let content = fs::read_to_string(&self.path).map_err(|e| local_state(e.to_string()))?;
        let data: Value =
            serde_json::from_str(&content).map_err(|e| local_state(e.to_string()))?;

        match version_field(&data) {
            Some(raw) => Version::parse(&raw).map_err(|e| local_state(e.to_string())),
            // A record without a version key is an old install, not an error
            None => Ok(Version::zero()),
        }
    }

    /// Overwrite the record with `version`.
    ///
    /// The record is staged beside the old one and renamed over it, so a
    /// reader sees either the previous version or the new one.
    pub fn save(&self, version: &Version) -> Result<(), UpdateError> {
        debug!("writing version {} to {}", version, self.path.display());
        let body = json!({ "version": version.as_str() }).to_string();

        stage(body.as_bytes(), &self.path)
            .and_then(StagedArtifact::commit)
            .map_err(|e| match e {
                UpdateError::Stage { source, .. } | UpdateError::Replace { source, .. } => {
                    self.record_error(version, source)
                }
                other => other,
            })
    }

    fn record_error(&self, version: &Version, source: io::Error) -> UpdateError {
        UpdateError::RecordVersion {
            version: version.to_string(),
            path: self.path.clone(),
            source,
        }
    }
}

/// Extract `version` as text, accepting JSON strings and numbers.
pub(crate) fn version_field(data: &Value) -> Option<String> {
    match data.get("version")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_creates_default_record() {
        let dir = tempdir().unwrap();
        let store = VersionStore::new(dir.path().join(VERSION_FILE));
        let mut messages = Vec::new();

        let version = store.load(|m| messages.push(m));

        assert_eq!(version, Version::zero());
        assert!(messages.is_empty());
        let written = fs::read_to_string(store.path()).unwrap();
        let data: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(data["version"], "0.0.0");
    }

    #[test]
    fn test_load_reads_existing_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(VERSION_FILE);
        fs::write(&path, r#"{"version": "1.2.3"}"#).unwrap();

        let version = VersionStore::new(&path).load(|_| {});
        assert_eq!(version, Version::parse("1.2.3").unwrap());
    }

    #[test]
    fn test_load_accepts_numeric_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(VERSION_FILE);
        fs::write(&path, r#"{"version": 1.1}"#).unwrap();

        let version = VersionStore::new(&path).load(|_| {});
        assert_eq!(version.as_str(), "1.1");
    }

    #[test]
    fn test_load_missing_key_defaults_to_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(VERSION_FILE);
        fs::write(&path, r#"{"name": "app"}"#).unwrap();

        let mut messages = Vec::new();
        let version = VersionStore::new(&path).load(|m| messages.push(m));
        assert_eq!(version, Version::zero());
        assert!(messages.is_empty());
    }

    #[test]
    fn test_load_malformed_reports_and_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(VERSION_FILE);
        fs::write(&path, "not json at all").unwrap();

        let mut messages = Vec::new();
        let version = VersionStore::new(&path).load(|m| messages.push(m));

        assert_eq!(version, Version::zero());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Error reading"));
        // The broken record is left for the user to inspect
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json at all");
    }

    #[test]
    fn test_load_non_numeric_version_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(VERSION_FILE);
        fs::write(&path, r#"{"version": "beta"}"#).unwrap();

        let mut messages = Vec::new();
        let version = VersionStore::new(&path).load(|m| messages.push(m));
        assert_eq!(version, Version::zero());
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let store = VersionStore::new(dir.path().join(VERSION_FILE));
        store.save(&Version::parse("1.0").unwrap()).unwrap();
        store.save(&Version::parse("1.1").unwrap()).unwrap();

        assert_eq!(store.load(|_| {}).as_str(), "1.1");
    }

    #[test]
    fn test_save_leaves_no_temporary_files() {
        let dir = tempdir().unwrap();
        let store = VersionStore::new(dir.path().join(VERSION_FILE));
        fs::write(store.path(), r#"{"version": "1.0"}"#).unwrap();

        store.save(&Version::parse("1.1").unwrap()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![VERSION_FILE]);
        let data: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(data["version"], "1.1");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_rename_keeps_record_dir_clean() {
        let dir = tempdir().unwrap();
        // A directory where the record should be makes the rename fail
        let path = dir.path().join(VERSION_FILE);
        fs::create_dir(&path).unwrap();

        let err = VersionStore::new(&path)
            .save(&Version::parse("1.1").unwrap())
            .unwrap_err();

        assert!(matches!(err, UpdateError::RecordVersion { .. }));
        assert!(path.is_dir());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_into_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let store = VersionStore::new(dir.path().join("missing").join(VERSION_FILE));
        let err = store.save(&Version::zero()).unwrap_err();
        assert!(matches!(err, UpdateError::RecordVersion { .. }));
    }
}
