use std::fmt;
use std::path::PathBuf;

use crate::update::Version;

/// Latest release as advertised by the remote `version.json`.
#[derive(Debug, Clone)]
pub struct RemoteDescriptor {
    pub version: Version,
    pub sha256_checksum: Option<String>,
}

/// Downloaded replacement content, consumed once by the installer.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub payload: Vec<u8>,
    pub source_url: String,
    pub target: PathBuf,
}

/// Message sent from the update worker to whoever is listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    Progress(String),
    Done(UpdateOutcome),
}

/// Final result of one update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub restart_needed: bool,
    pub message: String,
}

impl UpdateOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            restart_needed: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Idle,
    CheckingConnectivity,
    ResolvingVersion,
    UpToDate,
    Downloading,
    Installing,
    InstalledNeedsRestart,
    Failed,
}

impl UpdateState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::UpToDate | Self::InstalledNeedsRestart | Self::Failed
        )
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CheckingConnectivity => "checking connectivity",
            Self::ResolvingVersion => "resolving version",
            Self::UpToDate => "up to date",
            Self::Downloading => "downloading",
            Self::Installing => "installing",
            Self::InstalledNeedsRestart => "installed, restart needed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
