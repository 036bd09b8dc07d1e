// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photobooth::backends::camera::CameraSourceKind;
use photobooth::constants::paths;
use photobooth::{Config, i18n};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Take a photo, leave a message, send it to the event screen")]
#[command(version = photobooth::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/photobooth/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Upload endpoint, overrides the config file
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Camera source: auto, /dev/videoN or file:PATH
    #[arg(long, global = true)]
    source: Option<CameraSourceKind>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the booth in the terminal (default)
    Run,

    /// List available cameras
    List,

    /// Take one photo and send it
    Snap {
        /// Message sent along with the photo
        #[arg(short, long)]
        comment: Option<String>,

        /// Also save the JPEG (default: ~/Pictures/Photobooth)
        #[arg(short, long, num_args = 0..=1, default_missing_value = "")]
        save: Option<PathBuf>,

        /// Skip the upload
        #[arg(long)]
        no_upload: bool,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Commands::Run));
    init_logging(interactive);

    let config_path = cli.config.clone().or_else(Config::default_path);
    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .with_overrides(cli.endpoint, cli.source)?;

    i18n::init_from_desktop();

    match cli.command {
        None | Some(Commands::Run) => photobooth::terminal::run(config),
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Snap {
            comment,
            save,
            no_upload,
        }) => cli::snap(
            config,
            cli::SnapOptions {
                comment,
                save,
                no_upload,
            },
        ),
        Some(Commands::Config) => cli::print_config(&config, config_path.as_deref()),
    }
}

/// Set RUST_LOG to control the log level (e.g. RUST_LOG=photobooth=debug)
///
/// The terminal UI owns stdout, so interactive runs log to a file in the
/// cache dir instead.
fn init_logging(interactive: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let log_file = interactive
        .then(|| dirs::cache_dir().map(|dir| dir.join(paths::APP_DIR)))
        .flatten()
        .and_then(|dir| {
            std::fs::create_dir_all(&dir).ok()?;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(paths::LOG_FILE))
                .ok()
        });

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init(),
        None if interactive => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init(),
    }
}
