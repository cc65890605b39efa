use crate::foundation::Result;
use std::path::{Path, PathBuf};

/// Explicit config file path; wins over the default location.
pub const CONFIG_PATH_ENV: &str = "TAPE_CONFIG_PATH";

/// Environment variable prefix for config overrides.
///
/// Example: `TAPE_RUN__RATE` -> `run.rate`
pub const ENV_PREFIX: &str = "TAPE_";

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Resolves the config path: `TAPE_CONFIG_PATH`, then the CLI value, then `./config.toml`.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Result<PathBuf> {
    if let Ok(value) = std::env::var(CONFIG_PATH_ENV) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    if let Some(path) = cli_path {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|err| crate::io_err!("env::current_dir", err))?;
    Ok(cwd.join(DEFAULT_CONFIG_FILE))
}
