use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use filtertabs::{TabSettings, TabStore};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_HISTORY: f32 = 1.0 / 3.0;

/// Slider positions at or past this keep every line.
const UNLIMITED_HISTORY: f32 = 0.99666;

#[derive(Debug, Parser)]
#[command(
    name = "ft",
    version,
    about = "Follow one noisy stream through named, filtered tabs",
    after_help = "Example:\n  tail -f app.log | ft\n  ft add Errors '(?i)error' --regex"
)]
pub struct Cli {
    /// Where the tab layout is stored
    #[arg(long, env = "FT_SAVE_FILE", global = true)]
    pub save_file: Option<PathBuf>,

    /// Append logs to this file (RUST_LOG sets the level)
    #[arg(long, env = "FT_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read lines from stdin and show them in tabs (the default)
    Watch(WatchArgs),
    /// Print every group and its tabs
    List,
    /// Add a tab to a group
    Add(TabArgs),
    /// Replace the settings of an existing tab
    Edit(TabArgs),
    /// Delete a tab
    Rm {
        name: String,
        #[arg(long, default_value_t = 1)]
        group: usize,
    },
    /// Print MESSAGE as it would be sent from a tab, prefix included
    Send {
        tab: String,
        message: String,
        #[arg(long, default_value_t = 1)]
        group: usize,
    },
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Transcript length per tab, from 0.0 (1 line) to 1.0 (unlimited)
    #[arg(long, default_value_t = DEFAULT_HISTORY, value_parser = parse_fraction)]
    pub history: f32,
}

impl Default for WatchArgs {
    fn default() -> Self {
        Self {
            history: DEFAULT_HISTORY,
        }
    }
}

#[derive(Debug, Args)]
pub struct TabArgs {
    pub name: String,

    /// Keyword to look for, or a regular expression with --regex
    pub pattern: String,

    #[arg(long)]
    pub regex: bool,

    /// Show messages that do NOT match
    #[arg(long)]
    pub blacklist: bool,

    /// Prepended to messages sent from this tab
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Ring the terminal bell on every accepted message
    #[arg(long)]
    pub notify: bool,

    /// Group number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub group: usize,
}

impl TabArgs {
    pub fn settings(&self) -> TabSettings {
        TabSettings {
            pattern: self.pattern.clone(),
            literal: !self.regex,
            whitelist: !self.blacklist,
            prefix: self.prefix.clone(),
            notify: self.notify,
        }
    }
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Command::Watch(_)))
    }

    pub fn store(&self) -> anyhow::Result<TabStore> {
        let path = self
            .save_file
            .clone()
            .or_else(TabStore::default_location)
            .context("no config directory on this platform, pass --save-file")?;
        Ok(TabStore::new(path))
    }
}

fn parse_fraction(value: &str) -> Result<f32, String> {
    let parsed = value
        .parse::<f32>()
        .map_err(|err| format!("{value:?} is not a number: {err}"))?;
    if (0.0..=1.0).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(format!("{value} is outside 0.0..=1.0"))
    }
}

/// Lines kept per tab for a history slider position; `None` keeps all.
pub fn history_limit(position: f32) -> Option<usize> {
    if position >= UNLIMITED_HISTORY {
        return None;
    }
    Some(100f64.powf(3.0 * f64::from(position)).floor() as usize)
}

/// The screen belongs to the TUI, so interactive runs only log when given a
/// file. One-shot commands log to stderr.
pub fn init_logging(log_file: Option<&Path>, interactive: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None if interactive => return Ok(()),
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|err| anyhow!("cannot install logger: {err}"))
}
