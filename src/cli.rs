use clap::{ArgAction, Parser};
use mmbatch_config::Config;
use std::path::PathBuf;

/// Runs the MantaMatcher over every candidate-region (`<name>_CR.<ext>`)
/// image found in the given directories.
#[derive(Parser, Debug)]
#[command(name = "mmbatch", version, about)]
pub struct Args {
    /// Directories to scan, recursively.
    #[arg(required = true, value_name = "DIR")]
    pub directories: Vec<PathBuf>,

    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, env = "MMBATCH_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the mmprocess executable.
    #[arg(short, long, value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Seconds before a running matcher is killed.
    #[arg(short, long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Milliseconds to pause between images (0 disables pacing).
    #[arg(short, long, value_name = "MS")]
    pub pacing: Option<u64>,

    /// More logging; repeat for even more.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
impl Args {
    /// Overlays the command-line options onto the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(executable) = &self.executable {
            config.matcher.executable = Some(executable.clone());
        }
        if let Some(timeout) = self.timeout {
            config.matcher.timeout_secs = Some(timeout);
        }
        if let Some(pacing) = self.pacing {
            config.batch.pacing_ms = Some(pacing);
        }
    }

    /// Default log filter when `RUST_LOG` isn't set.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
