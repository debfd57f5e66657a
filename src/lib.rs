pub mod config;
pub mod generate;
pub mod models;
pub mod update;

pub use config::Config;
pub use models::{UpdateEvent, UpdateOutcome, UpdateState};
pub use update::{UpdateHandle, UpdateSettings, Updater};
