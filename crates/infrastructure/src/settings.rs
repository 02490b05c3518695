//! Settings loader.
//!
//! Layers, lowest priority first: built-in defaults, a TOML file, and
//! `PATCHGATE__*` environment variables (`PATCHGATE__RECONNECT__MAX_ATTEMPTS=5`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use patchgate_domain::{ClientSettings, DomainError};
use thiserror::Error;
use tracing::debug;

const ENV_PREFIX: &str = "PATCHGATE";
const ENV_SEPARATOR: &str = "__";

/// Errors from loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or parsed.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// The merged settings are invalid.
    #[error("invalid settings: {0}")]
    Invalid(#[from] DomainError),
}

/// Default location of the settings file, if the platform has a config dir.
#[must_use]
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("patchgate").join("settings.toml"))
}

/// Loads and validates the client settings.
///
/// An explicit `path` must exist. Without one, the default location is used
/// when present.
///
/// # Errors
///
/// Returns an error if a source cannot be parsed or the result is invalid.
pub fn load_settings(path: Option<&Path>) -> Result<ClientSettings, SettingsError> {
    load_with_env(path, None)
}

fn load_with_env(
    path: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> Result<ClientSettings, SettingsError> {
    let mut builder = Config::builder();

    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading settings file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        None => {
            if let Some(default) = default_settings_path() {
                builder = builder
                    .add_source(File::from(default).format(FileFormat::Toml).required(false));
            }
        }
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(env),
    );

    let settings: ClientSettings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
