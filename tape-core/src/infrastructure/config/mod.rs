mod env;
mod loader;
mod types;
pub mod validation;

pub use env::{resolve_config_path, CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use loader::{load_and_validate, load_config_from_file};
pub use types::*;

use crate::foundation::Result;
use std::path::Path;

/// Resolves the config path and loads a validated `AppConfig`.
pub fn load_app_config(cli_path: Option<&Path>) -> Result<AppConfig> {
    let path = resolve_config_path(cli_path)?;
    load_and_validate(&path)
}
