//! Configuration file management.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use sonoscan_config::{PROFILE_NAMES, config_path, profile};

use super::common::ConfigSource;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Write a configuration file from a profile
    Init {
        /// Profile to start from
        #[arg(long, default_value = "default")]
        from: String,

        /// Destination (defaults to the user config file)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check the effective configuration and list every problem
    Validate,

    /// Print the user config file location
    Path,

    /// List built-in profiles
    Profiles,
}

pub fn run(args: ConfigArgs, source: &ConfigSource) -> anyhow::Result<()> {
    match args.command.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => {
            let config = source.resolve()?;
            print!("{}", config.to_toml()?);
        }
        ConfigCommand::Init { from, path, force } => {
            let path = path.unwrap_or_else(config_path);
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists. Use --force to overwrite.",
                    path.display()
                );
            }
            let config = profile(&from)?;
            config.save(&path)?;
            println!("Wrote '{}' profile to {}", from, path.display());
        }
        ConfigCommand::Validate => {
            let config = source.resolve()?;
            match config.validate() {
                Ok(()) => println!("Configuration OK"),
                Err(e) => anyhow::bail!("Configuration invalid: {e}"),
            }
        }
        ConfigCommand::Path => println!("{}", config_path().display()),
        ConfigCommand::Profiles => {
            for name in PROFILE_NAMES {
                println!("{name}");
            }
        }
    }
    Ok(())
}
