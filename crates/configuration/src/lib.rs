use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{AnalyticsSettings, Config, LogFormat, LoggingSettings, ServerSettings};

/// Prefix for environment overrides, e.g. `VIEWTRENDS__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "VIEWTRENDS";

/// Loads the application configuration.
///
/// Reads the TOML file at `path` if it exists, then applies `VIEWTRENDS__*`
/// environment overrides on top, deserializes into our strongly-typed `Config`
/// struct and validates it. A missing file is not an error: defaults apply.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_env(path, environment())
}

/// The `VIEWTRENDS__SECTION__KEY` environment source read by `load_config`.
pub fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Like `load_config`, but with an explicit environment source layered over the file.
pub fn load_config_with_env(path: &Path, env: config::Environment) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults.");
    }

    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(env);

    finish(builder)
}

/// Parses configuration from TOML text, without environment overrides.
pub fn config_from_toml(toml: &str) -> Result<Config, ConfigError> {
    let builder =
        config::Config::builder().add_source(config::File::from_str(toml, config::FileFormat::Toml));
    finish(builder)
}

fn finish(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.build()?.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}
