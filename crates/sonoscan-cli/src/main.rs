//! sonoscan CLI - hear a depth scene as a sweeping soundscape.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sonoscan")]
#[command(author, version, about = "Depth and segmentation sonification", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config if it exists)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Built-in profile to start from (default, indoor, outdoor)
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a synthetic scene to a stereo WAV file
    Render(commands::render::RenderArgs),

    /// Sonify a synthetic scene in real time
    Play(commands::play::PlayArgs),

    /// Print the frequency band layout
    Bands(commands::bands::BandsArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),

    /// Show or create the configuration file
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let source = commands::common::ConfigSource {
        path: cli.config,
        profile: cli.profile,
    };

    match cli.command {
        Commands::Render(args) => commands::render::run(args, &source),
        Commands::Play(args) => commands::play::run(args, &source),
        Commands::Bands(args) => commands::bands::run(args, &source),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Config(args) => commands::config::run(args, &source),
    }
}
