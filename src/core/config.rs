//! Settings loading - layered YAML files plus command-line overrides
//!
//! Precedence, lowest to highest:
//! 1. built-in defaults
//! 2. user settings file (`<config dir>/qcsim/settings.yaml`)
//! 3. an explicit settings file (`--config`)
//! 4. individual overrides
//!
//! Files may be partial; keys are merged before the result is validated.

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde_yml::{Mapping, Value};
use thiserror::Error;

use crate::core::settings::{SettingsError, SimulationSettings};
use crate::yaml::{read_layer, YamlError};

/// Environment variable that relocates the user config directory
pub const CONFIG_DIR_ENV: &str = "QCSIM_CONFIG_DIR";

/// File name of the settings file inside the config directory
pub const SETTINGS_FILE: &str = "settings.yaml";

/// Errors from loading or writing settings files
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Invalid(#[from] SettingsError),

    #[error("Settings file {} must contain a mapping of setting names to values", path.display())]
    #[diagnostic(code(qcsim::config::not_a_mapping))]
    NotAMapping { path: PathBuf },

    #[error("Settings file {} already exists", path.display())]
    #[diagnostic(code(qcsim::config::exists), help("pass --force to overwrite it"))]
    AlreadyExists { path: PathBuf },

    #[error("Could not determine a configuration directory for this platform")]
    #[diagnostic(
        code(qcsim::config::no_config_dir),
        help("set QCSIM_CONFIG_DIR or pass --path explicitly")
    )]
    NoConfigDir,

    #[error("Failed to write {}: {source}", path.display())]
    #[diagnostic(code(qcsim::config::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to convert settings: {message}")]
    #[diagnostic(code(qcsim::config::serialize))]
    Serialize { message: String },
}

/// Per-field overrides, typically from command-line flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub production_mean: Option<f64>,
    pub production_std: Option<f64>,
    pub measurement_std: Option<f64>,
    pub prior_mean: Option<f64>,
    pub prior_std: Option<f64>,
    pub spec_lower: Option<f64>,
    pub spec_upper: Option<f64>,
    pub alpha: Option<f64>,
    pub measurement_error_rate: Option<f64>,
    pub measurement_error_magnitude: Option<f64>,
    pub production_error_rate: Option<f64>,
    pub interval: Option<u64>,
    pub time_window: Option<f64>,
}

impl SettingsOverrides {
    /// Apply every override that is set
    pub fn apply(&self, settings: &mut SimulationSettings) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(v) = self.$field { settings.$field = v; })*
            };
        }
        set!(
            production_mean,
            production_std,
            measurement_std,
            prior_mean,
            prior_std,
            spec_lower,
            spec_upper,
            alpha,
            measurement_error_rate,
            measurement_error_magnitude,
            production_error_rate,
            interval,
            time_window
        );
    }
}

/// Location of the user settings file, if the platform has a config dir
pub fn user_settings_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir).join(SETTINGS_FILE));
    }
    directories::ProjectDirs::from("", "", "qcsim").map(|d| d.config_dir().join(SETTINGS_FILE))
}

/// Layered settings loader
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    files: Vec<PathBuf>,
    overrides: SettingsOverrides,
}

impl SettingsLoader {
    /// Loader with the user settings file as the first layer (when it exists)
    pub fn new() -> Self {
        let files = user_settings_path()
            .filter(|p| p.is_file())
            .into_iter()
            .collect();
        Self {
            files,
            overrides: SettingsOverrides::default(),
        }
    }

    /// Loader that ignores the user settings file
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a settings file layered over the previous ones
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Set the overrides applied after every file
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Files that will be read, lowest precedence first
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Merge all layers and validate the result
    pub fn load(&self) -> Result<SimulationSettings, ConfigError> {
        let mut merged = Mapping::new();
        for path in &self.files {
            let layer = read_layer::<SimulationSettings>(path)?;
            match layer {
                Value::Mapping(map) => merged.extend(map),
                // An empty file parses as null
                Value::Null => {}
                _ => return Err(ConfigError::NotAMapping { path: path.clone() }),
            }
        }

        let mut settings: SimulationSettings = if merged.is_empty() {
            SimulationSettings::default()
        } else {
            serde_yml::from_value(Value::Mapping(merged)).map_err(|e| ConfigError::Serialize {
                message: e.to_string(),
            })?
        };

        self.overrides.apply(&mut settings);
        settings.validate()?;
        Ok(settings)
    }
}

/// Render settings as a YAML document
pub fn to_yaml(settings: &SimulationSettings) -> Result<String, ConfigError> {
    serde_yml::to_string(settings).map_err(|e| ConfigError::Serialize {
        message: e.to_string(),
    })
}

/// Write the default settings to `path`, creating parent directories
pub fn write_default(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }

    let body = to_yaml(&SimulationSettings::default())?;
    let contents = format!(
        "# qcsim simulation settings\n# Missing keys fall back to built-in defaults.\n{}",
        body
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
