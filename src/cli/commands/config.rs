//! `qcsim config` command - settings file management

use std::path::PathBuf;

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::load_settings;
use crate::cli::output::{effective_format, print_json, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat, SettingsArgs};
use crate::core::config::{user_settings_path, write_default, ConfigError};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a settings file with the default values
    Init(InitArgs),

    /// Show the effective settings after all layers are applied
    Show(ShowArgs),

    /// Print the location of the user settings file
    Path,
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Where to write the file (defaults to the user settings file)
    #[arg(long, short = 'p')]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Init(args) => run_init(args),
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Path => run_path(),
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => user_settings_path().ok_or(ConfigError::NoConfigDir)?,
    };

    write_default(&path, args.force)?;
    println!(
        "{} Wrote default settings to {}",
        style("✓").green(),
        style(path.display()).cyan()
    );
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let settings = load_settings(global, &args.settings)?;

    match effective_format(global.output, false) {
        OutputFormat::Json => print_json(&settings),
        OutputFormat::Table => {
            let value = serde_json::to_value(&settings).map_err(|e| miette::miette!("{}", e))?;
            if let serde_json::Value::Object(map) = value {
                for (key, v) in map {
                    println!("{:<30} {}", style(key).bold(), v);
                }
            }
            Ok(())
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.serialize(&settings).map_err(|e| miette::miette!("{}", e))?;
            wtr.flush().map_err(|e| miette::miette!("{}", e))
        }
        OutputFormat::Yaml | OutputFormat::Auto => print_yaml(&settings),
    }
}

fn run_path() -> Result<()> {
    let path = user_settings_path().ok_or(ConfigError::NoConfigDir)?;
    println!("{}", path.display());
    Ok(())
}
