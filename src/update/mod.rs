pub mod checksum;
pub mod error;
pub mod github;
pub mod installer;
pub mod store;
pub mod version;

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{error, info};

use crate::models::{Artifact, UpdateEvent, UpdateOutcome, UpdateState};

pub use error::UpdateError;
pub use github::{Endpoints, HttpRemote, Remote};
pub use installer::Installer;
pub use store::VersionStore;
pub use version::{compare, Comparison, Version};

/// Everything one update check needs to know about where things live.
#[derive(Debug, Clone)]
pub struct UpdateSettings {
    pub endpoints: Endpoints,
    pub target: PathBuf,
    pub version_file: PathBuf,
    pub verify_checksum: bool,
}

/// Runs a single update check from connectivity check to install.
pub struct Updater<R> {
    settings: UpdateSettings,
    remote: R,
    store: VersionStore,
    current_version: Version,
    // Problems found while loading the local record, replayed once the
    // workflow has somewhere to send them
    notices: Vec<String>,
}

/// A running update worker and the stream of its events.
pub struct UpdateHandle {
    events: Receiver<UpdateEvent>,
    worker: JoinHandle<(UpdateState, UpdateOutcome)>,
}

impl<R: Remote> Updater<R> {
    pub fn new(settings: UpdateSettings, remote: R) -> Self {
        let store = VersionStore::new(&settings.version_file);
        let mut notices = Vec::new();
        let current_version = store.load(|message| notices.push(message));

        Self {
            settings,
            remote,
            store,
            current_version,
            notices,
        }
    }

    pub fn current_version(&self) -> &Version {
        &self.current_version
    }

    /// Run the workflow on the calling thread, reporting through `events`.
    ///
    /// The last event sent is always [`UpdateEvent::Done`] carrying the
    /// returned outcome.
    pub fn run(self, events: Sender<UpdateEvent>) -> UpdateOutcome {
        self.run_to_end(events).1
    }

    fn run_to_end(mut self, events: Sender<UpdateEvent>) -> (UpdateState, UpdateOutcome) {
        let mut progress = Progress::new(events);
        for notice in std::mem::take(&mut self.notices) {
            progress.message(notice);
        }

        let outcome = match self.execute(&mut progress) {
            Ok(outcome) => outcome,
            Err(e) => fail(&mut progress, e),
        };

        progress.done(outcome.clone());
        (progress.state, outcome)
    }

    fn execute(&self, progress: &mut Progress) -> Result<UpdateOutcome, UpdateError> {
        progress.enter(UpdateState::CheckingConnectivity);
        progress.message("Checking internet connection...");
        if !self.remote.is_reachable() {
            return Err(UpdateError::Connectivity);
        }

        progress.enter(UpdateState::ResolvingVersion);
        progress.message(format!("Current version: {}", self.current_version));
        progress.message("Checking for updates...");
        let descriptor = self
            .remote
            .fetch_descriptor(&self.settings.endpoints.descriptor_url)?;
        progress.message(format!("Latest available version: {}", descriptor.version));

        if compare(&self.current_version, &descriptor.version) == Comparison::UpToDate {
            progress.enter(UpdateState::UpToDate);
            progress.message("No new update available.");
            return Ok(UpdateOutcome {
                restart_needed: false,
                message: "Your application is up to date.".to_string(),
            });
        }

        progress.enter(UpdateState::Downloading);
        let url = &self.settings.endpoints.artifact_url;
        progress.message(format!("Downloading new version from {}...", url));
        let payload = self.remote.download(url)?;

        if let Some(expected) = descriptor.sha256_checksum.as_deref() {
            if self.settings.verify_checksum {
                progress.message("Verifying checksum...");
                checksum::verify(&payload, expected)?;
            }
        }

        let artifact = Artifact {
            payload,
            source_url: url.clone(),
            target: self.settings.target.clone(),
        };

        progress.enter(UpdateState::Installing);
        progress.message(format!(
            "Installing update (replacing {})...",
            self.settings.target.display()
        ));
        match Installer::new(&self.store).stage_and_replace(&artifact, &descriptor.version) {
            Ok(()) => {}
            // The new file is already live, so a restart is still required
            Err(e @ UpdateError::RecordVersion { .. }) => {
                error!("{}", e);
                progress.enter(UpdateState::InstalledNeedsRestart);
                progress.message(format!("Warning: {}", e));
                return Ok(UpdateOutcome {
                    restart_needed: true,
                    message: "Update installed, but the local version record could not be updated."
                        .to_string(),
                });
            }
            Err(e) => return Err(e),
        }

        progress.enter(UpdateState::InstalledNeedsRestart);
        progress.message("Update complete. Please restart the application.");
        Ok(UpdateOutcome {
            restart_needed: true,
            message: "Update installed successfully!".to_string(),
        })
    }
}

impl<R: Remote + Send + 'static> Updater<R> {
    /// Start the workflow on its own worker thread.
    pub fn spawn(self) -> UpdateHandle {
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || self.run_to_end(tx));

        UpdateHandle { events: rx, worker }
    }
}

impl UpdateHandle {
    /// Events in the order they were produced, ending after `Done`.
    pub fn events(&self) -> mpsc::Iter<'_, UpdateEvent> {
        self.events.iter()
    }

    /// Wait for the worker to finish; returns the terminal state and outcome.
    pub fn join(self) -> (UpdateState, UpdateOutcome) {
        self.worker.join().unwrap_or_else(|_| {
            (
                UpdateState::Failed,
                UpdateOutcome::failed("Update failed: the update worker crashed."),
            )
        })
    }
}

/// Turn a workflow error into the status message and terminal outcome.
fn fail(progress: &mut Progress, e: UpdateError) -> UpdateOutcome {
    error!("update failed while {}: {}", progress.state, e);
    progress.enter(UpdateState::Failed);

    let (status, summary) = match &e {
        UpdateError::Connectivity => (
            "No internet connection.".to_string(),
            "Update failed: no internet connection.".to_string(),
        ),
        UpdateError::Network { .. } => (
            format!("Network error: {}", e),
            format!("Update failed: {}", e),
        ),
        UpdateError::Format(_) | UpdateError::InvalidVersion(_) => (
            format!(
                "Error: the remote version file is malformed or the 'version' key is missing ({}).",
                e
            ),
            "Update failed: invalid remote version file.".to_string(),
        ),
        UpdateError::ChecksumMismatch { .. } => (
            format!("Error: {}", e),
            "Update failed: the downloaded file did not match its checksum.".to_string(),
        ),
        UpdateError::Replace { .. } => (
            format!("Critical: {}. The previous version is still installed.", e),
            format!("Update failed: {}", e),
        ),
        _ => (format!("Error: {}", e), format!("Update failed: {}", e)),
    };

    progress.message(status);
    UpdateOutcome::failed(summary)
}

/// Status reporting for one workflow run.
struct Progress {
    events: Sender<UpdateEvent>,
    state: UpdateState,
}

impl Progress {
    fn new(events: Sender<UpdateEvent>) -> Self {
        Self {
            events,
            state: UpdateState::Idle,
        }
    }

    fn enter(&mut self, state: UpdateState) {
        info!("update: {} -> {}", self.state, state);
        self.state = state;
    }

    fn message(&mut self, message: impl Into<String>) {
        // A listener that went away just stops getting updates
        let _ = self.events.send(UpdateEvent::Progress(message.into()));
    }

    fn done(&mut self, outcome: UpdateOutcome) {
        debug_assert!(self.state.is_terminal());
        let _ = self.events.send(UpdateEvent::Done(outcome));
    }
}
