use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};

use ota_update::update::VersionStore;
use ota_update::{Config, UpdateEvent, UpdateOutcome, UpdateState, Updater};

#[derive(Parser, Debug)]
#[command(name = "ota")]
#[command(about = "Over-the-air updates for a standalone application", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    target: TargetArgs,
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Repository URL to fetch updates from (overrides repo_url)
    #[arg(long, global = true)]
    repo: Option<String>,

    /// File to update, relative to the install directory (overrides target_file)
    #[arg(long, global = true)]
    file: Option<String>,

    /// Directory holding the installed file and version.json
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Branch the descriptor and artifact are published on
    #[arg(long, global = true)]
    branch: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check for an update and install it (default)
    Check,

    /// Generate a version.json descriptor for a file to publish
    Generate {
        /// Version to publish (e.g. 1.0.1)
        #[arg(long = "set-version", value_name = "VERSION")]
        new_version: Option<String>,

        /// Where to write the descriptor
        #[arg(short, long, default_value = ota_update::generate::OUTPUT_FILE)]
        output: PathBuf,
    },

    /// Print the locally installed version
    Current,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Generate {
            new_version,
            output,
        }) => ota_update::generate::run_generate(cli.target.file, new_version, &output),
        Some(Command::Current) => run_current_command(cli.target),
        Some(Command::Check) | None => run_check_command(cli.target),
    }
}

fn load_config(args: TargetArgs) -> Result<Config> {
    let mut config = Config::load()?;

    if let Some(repo) = args.repo {
        config.repo_url = Some(repo);
    }
    if let Some(file) = args.file {
        config.target_file = Some(file);
    }
    if let Some(dir) = args.dir {
        config.install_dir = dir;
    }
    if let Some(branch) = args.branch {
        config.branch = branch;
    }

    Ok(config)
}

fn run_check_command(args: TargetArgs) -> Result<()> {
    let config = load_config(args)?;
    let settings = config.settings()?;

    let handle = Updater::new(settings, config.remote()).spawn();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut outcome = None;
    for event in handle.events() {
        match event {
            UpdateEvent::Progress(message) => {
                spinner.println(format!("  {}", message.dimmed()));
                spinner.set_message(message);
            }
            UpdateEvent::Done(done) => outcome = Some(done),
        }
    }
    spinner.finish_and_clear();

    let (state, joined) = handle.join();
    report_outcome(state, &outcome.unwrap_or(joined))
}

fn report_outcome(state: UpdateState, outcome: &UpdateOutcome) -> Result<()> {
    if outcome.restart_needed {
        println!("{} {}", "✓".green(), outcome.message.green());
        println!(
            "{} Restart the application to apply the changes.",
            "→".yellow()
        );
        return Ok(());
    }

    if state == UpdateState::Failed {
        bail!("{}", outcome.message);
    }

    println!("{} {}", "✓".green(), outcome.message);
    Ok(())
}

fn run_current_command(args: TargetArgs) -> Result<()> {
    let config = load_config(args)?;
    let store = VersionStore::new(config.version_path());

    let version = store.load(|message| eprintln!("{} {}", "⚠".yellow(), message));
    println!("{}", version);

    Ok(())
}
