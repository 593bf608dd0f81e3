//! The `linnea config` command: inspect and create the config file.

use clap::{Args, Subcommand};
use linnea_core::Config;
use std::path::Path;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the active configuration as TOML
    Show,

    /// Print the config file location
    Path,

    /// Write a config file populated with the defaults
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    let path = Config::default_path();

    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            if path.exists() {
                println!("# {}", path.display());
            } else {
                println!("# built-in defaults ({} not found)", path.display());
            }
            print!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => println!("{}", path.display()),

        ConfigCommand::Init { force } => {
            write_default_config(&path, force)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

/// Create the config file with default contents, refusing to clobber an
/// existing file unless forced.
fn write_default_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (--force replaces it)", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    Ok(())
}
