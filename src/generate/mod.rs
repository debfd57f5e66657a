mod prompt;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Serialize;

use crate::update::checksum::sha256_file;
use crate::update::Version;
use prompt::prompt_line;

/// Default output of `ota generate`
pub const OUTPUT_FILE: &str = "output.json";

/// Descriptor published next to the artifact for clients to fetch
#[derive(Debug, Serialize)]
pub struct Descriptor {
    pub version: String,
    pub sha256_checksum: String,
}

/// Run the generate command, prompting for anything not given on the command line
pub fn run_generate(file: Option<String>, version: Option<String>, output: &Path) -> Result<()> {
    println!("{}", "Version descriptor generator".bold());

    let file = match file {
        Some(f) => f,
        None => prompt_line("File to publish (e.g. main_app.py)")?,
    };
    let file = PathBuf::from(file);
    if !file.is_file() {
        bail!("File '{}' does not exist", file.display());
    }

    let version = match version {
        Some(v) => v.trim().to_string(),
        None => prompt_line("New version (e.g. 1.0.1, 2.0)")?,
    };
    if version.is_empty() {
        println!("{} Version cannot be empty, cancelled", "✗".red());
        return Ok(());
    }

    println!("{} Computing SHA-256 of {}...", "●".cyan(), file.display());
    let descriptor = build_descriptor(&file, &version)?;
    println!("{} SHA-256: {}", "✓".green(), descriptor.sha256_checksum.dimmed());

    let json = write_descriptor(&descriptor, output)?;
    println!("{} Wrote {}", "✓".green(), output.display().to_string().cyan());
    println!("{}", json);

    Ok(())
}

/// Hash `file` and pair it with `version`
pub fn build_descriptor(file: &Path, version: &str) -> Result<Descriptor> {
    // Clients reject versions they cannot order, so catch it here
    let parsed = Version::parse(version)?;
    let sha256_checksum =
        sha256_file(file).with_context(|| format!("Failed to hash {}", file.display()))?;

    Ok(Descriptor {
        version: parsed.to_string(),
        sha256_checksum,
    })
}

/// Write the descriptor as pretty JSON and return what was written
pub fn write_descriptor(descriptor: &Descriptor, output: &Path) -> Result<String> {
    let json = serde_json::to_string_pretty(descriptor)?;
    fs::write(output, &json).with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(json)
}
