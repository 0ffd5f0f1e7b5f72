//! Configuration management CLI commands.

use std::path::Path;

use clap::Subcommand;
use trailframe::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration
    Show,

    /// Write a configuration file with every default filled in
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(config: Option<&Path>, command: ConfigCommands) -> Result<(), CliError> {
    let path = config.map_or_else(config_file_path, Path::to_path_buf);
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let loaded = if path.exists() {
                ConfigFile::load_from(&path)?
            } else {
                ConfigFile::default()
            };
            let mut out = Vec::new();
            loaded
                .to_ini()
                .write_to(&mut out)
                .map_err(|e| CliError::Config(e.to_string()))?;
            print!("{}", String::from_utf8_lossy(&out));
            Ok(())
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::Config(format!(
                    "{} already exists. Use --force to overwrite.",
                    path.display()
                )));
            }
            ConfigFile::default().save_to(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
