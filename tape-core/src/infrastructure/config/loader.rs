//! Configuration loader using Figment for layered config management.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. TOML config file
//! 3. Environment variables (`TAPE_*` prefix, `__` nesting)

use crate::foundation::{Result, TapeError};
use crate::infrastructure::config::env::ENV_PREFIX;
use crate::infrastructure::config::types::AppConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use log::{debug, info};
use std::path::Path;

/// Load configuration from a specific file path. A missing file leaves defaults and env only.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    load_config_with_env_prefix(path, ENV_PREFIX)
}

pub(crate) fn load_config_with_env_prefix(path: &Path, env_prefix: &str) -> Result<AppConfig> {
    info!("loading configuration path={}", path.display());
    let figment = figment_base(path).merge(Env::prefixed(env_prefix).split("__"));
    let config: AppConfig = figment.extract()?;
    debug!(
        "configuration loaded channel={} endorsers={} committers={} orderers={} number={} burst={} rate={}",
        config.network.channel,
        config.network.endorsers.len(),
        config.network.committers.len(),
        config.network.orderers.len(),
        config.run.number,
        config.run.burst,
        config.run.rate
    );
    Ok(config)
}

/// Loads and validates, folding every validation problem into one error.
pub fn load_and_validate(path: &Path) -> Result<AppConfig> {
    let config = load_config_from_file(path)?;
    config.validate().map_err(|errors| TapeError::ConfigError(format!("validation failed: {}", errors.join("; "))))?;
    Ok(config)
}

fn figment_base(path: &Path) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
    if path.exists() {
        figment = figment.merge(Toml::file(path));
    } else {
        debug!("configuration file missing; using defaults and env only path={}", path.display());
    }
    figment
}
