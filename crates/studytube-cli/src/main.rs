//! StudyTube CLI
//!
//! Command-line interface for StudyTube - study video progress tracking.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use studytube_core::{Config, FileStore, Library, OEmbedClient, Subject};

mod commands;
mod output;
mod player;
mod prompt;

use commands::play::PlayOptions;
use commands::settings::{parse_switch, ThemeChoice};
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "studytube")]
#[command(about = "StudyTube - Track your progress through study videos")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show progress per subject, videos to continue and recent activity
    #[command(alias = "status")]
    Home,
    /// Add videos to a subject
    Add {
        /// Subject (physics, chemistry, biology)
        subject: Subject,
        /// YouTube links or video ids
        links: Vec<String>,
        /// Read links from a file (one per line or comma-separated)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Check which links are valid without adding them
    Check {
        /// YouTube links or video ids
        links: Vec<String>,
        /// Read links from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// List the videos of a subject
    #[command(alias = "ls")]
    List {
        /// Subject (physics, chemistry, biology)
        subject: Subject,
    },
    /// Show video details
    Show {
        /// Subject (physics, chemistry, biology)
        subject: Subject,
        /// Video id
        id: String,
    },
    /// Play a video and track progress
    Play {
        /// Subject (physics, chemistry, biology)
        subject: Subject,
        /// Video id
        id: String,
        /// Length in seconds to assume if the video's duration is unknown
        #[arg(long, default_value_t = 600.0)]
        duration: f64,
        /// Playback speed
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Start from the beginning
        #[arg(long)]
        restart: bool,
    },
    /// Record progress on a video
    Progress {
        /// Subject (physics, chemistry, biology)
        subject: Subject,
        /// Video id
        id: String,
        /// Percentage watched
        percent: f64,
        /// Playback position in seconds
        #[arg(long)]
        time: Option<f64>,
    },
    /// Mark a video as watched
    Done {
        /// Subject (physics, chemistry, biology)
        subject: Subject,
        /// Video id
        id: String,
    },
    /// Remove a video
    #[command(alias = "rm")]
    Remove {
        /// Subject (physics, chemistry, biology)
        subject: Subject,
        /// Video id
        id: String,
    },
    /// Show recent activity
    Activity {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Show or set the theme (light, dark, toggle)
    Theme { value: Option<ThemeChoice> },
    /// Show or set autosave (on, off)
    Autosave {
        #[arg(value_parser = parse_switch)]
        value: Option<bool>,
    },
    /// Export a backup
    Export {
        /// Backup file (defaults to a dated file in the current directory)
        #[arg(short = 'o', long = "output")]
        path: Option<PathBuf>,
    },
    /// Import a backup, replacing the current data
    Import {
        /// Backup file
        file: PathBuf,
        /// Only show what the backup contains
        #[arg(long)]
        dry_run: bool,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_file, autosave_interval_secs,
        /// progress_interval_ms, lookup_timeout_secs, oembed_url)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Commands that don't need the library
    match &cli.command {
        Some(Commands::Config { command }) => {
            return handle_config_command(command.clone(), &output);
        }
        Some(Commands::Check { links, file }) => {
            let links = commands::video::collect_links(links, file.as_ref())?;
            return commands::video::check(links, &output);
        }
        _ => {}
    }

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config);

    let store = FileStore::from_config(&config);
    debug!("Using state file {:?}", store.path());
    let mut library = Library::open(store);

    let result = match cli.command.unwrap_or(Commands::Home) {
        Commands::Home => commands::overview::home(&library, &output),
        Commands::Add {
            subject,
            links,
            file,
        } => {
            let links = commands::video::collect_links(&links, file.as_ref())?;
            let lookup = OEmbedClient::new(config.oembed_url.clone(), config.lookup_timeout())
                .context("Failed to create HTTP client")?;
            commands::video::add(&mut library, subject, links, &lookup, &output).await
        }
        Commands::List { subject } => commands::video::list(&mut library, subject, &output),
        Commands::Show { subject, id } => commands::video::show(&library, subject, id, &output),
        Commands::Play {
            subject,
            id,
            duration,
            speed,
            restart,
        } => {
            let options = PlayOptions {
                duration,
                speed,
                restart,
            };
            commands::play::play(&mut library, &config, subject, id, options, &output).await
        }
        Commands::Progress {
            subject,
            id,
            percent,
            time,
        } => commands::video::progress(&mut library, subject, id, percent, time, &output),
        Commands::Done { subject, id } => commands::video::done(&mut library, subject, id, &output),
        Commands::Remove { subject, id } => {
            commands::video::remove(&mut library, subject, id, &output)
        }
        Commands::Activity { limit } => commands::overview::activity(&library, limit, &output),
        Commands::Theme { value } => commands::settings::theme(&mut library, value, &output),
        Commands::Autosave { value } => commands::settings::autosave(&mut library, value, &output),
        Commands::Export { path } => commands::backup::export(&library, path, &output).map(|_| ()),
        Commands::Import { file, dry_run } => {
            commands::backup::import(&mut library, file, dry_run, &output)
        }
        Commands::Config { .. } | Commands::Check { .. } => unreachable!(), // Handled above
    };

    // Changes stay in memory when a save fails; tell the user
    if let Some(e) = library.take_save_error() {
        output.save_failed(&e);
    }

    result
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

/// Initialize logging
///
/// Level comes from RUST_LOG (default `warn`). Logs go to the configured
/// log file, or stderr when none is set.
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some(log_path) = &config.log_file else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    };

    let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            return;
        }
    };

    // Initialize file-based logging (ignore error if already initialized)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init();
}
