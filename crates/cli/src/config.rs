//! Configuration management for the CLI
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML/JSON
//! file, then `FINOPS__`-prefixed environment variables.

use anyhow::{Context, Result};
use finops_lib::PipelineConfig;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "FINOPS";
const ENV_SEPARATOR: &str = "__";

/// Load and validate the pipeline configuration
pub fn load(explicit: Option<&Path>) -> Result<PipelineConfig> {
    let defaults = config::Config::try_from(&PipelineConfig::default())
        .context("Failed to seed configuration defaults")?;
    let mut builder = config::Config::builder().add_source(defaults);

    match explicit {
        Some(path) => {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        None => {
            if let Some(path) = default_config_path() {
                builder = builder.add_source(config::File::from(path).required(false));
            }
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("nonprod.patterns")
            .with_list_parse_key("nonprod.exclusions"),
    );

    let pipeline: PipelineConfig = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration value")?;
    pipeline.validate().context("Invalid pipeline configuration")?;
    Ok(pipeline)
}

/// `~/.config/finops/config.toml`
fn default_config_path() -> Option<PathBuf> {
    let home = dirs_next::home_dir()?;
    Some(home.join(".config").join("finops").join("config.toml"))
}
