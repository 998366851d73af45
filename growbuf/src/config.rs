use std::env;
use std::path::Path;

use serde::Deserialize;

use crate::RunError;

const FILE_NAME: &str = "growbuf.toml";

#[derive(Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    buffer: Buffer,
}

#[derive(Deserialize, Default)]
pub struct Buffer {
    initial_capacity: Option<usize>,
    max_capacity: Option<usize>,
}

fn set_env<T: ToString>(name: &str, value: T) {
    env::set_var(name, value.to_string());
}

fn set_env_option<T: ToString>(name: &str, value: Option<T>) {
    if let Some(value) = value {
        set_env(name, value)
    }
}

/// Exports config values as `GROWBUF_*` variables. Variables already set in
/// the environment and command line flags both take precedence.
pub fn load_into_env(config: &Config) {
    let vars = [
        ("GROWBUF_INITIAL_CAPACITY", config.buffer.initial_capacity),
        ("GROWBUF_MAX_CAPACITY", config.buffer.max_capacity),
    ];

    for (name, value) in vars {
        if env::var_os(name).is_none() {
            set_env_option(name, value);
        }
    }
}

fn load_file(path: &Path) -> Result<Option<Config>, RunError> {
    log::debug!("looking for config in {}", path.display());

    let Ok(contents) = std::fs::read_to_string(path) else {
        return Ok(None);
    };

    let config = toml::from_str(&contents)
        .map_err(|e| RunError::Config(path.to_owned(), e))?;

    log::info!("reading config from {}", path.display());
    Ok(Some(config))
}

pub fn read() -> Result<Option<Config>, RunError> {
    // try current directory first
    if let Some(config) = load_file(Path::new(FILE_NAME))? {
        return Ok(Some(config));
    }

    // otherwise try xdg config dirs
    let Ok(dirs) = xdg::BaseDirectories::new() else {
        return Ok(None);
    };

    match dirs.find_config_file(FILE_NAME) {
        Some(path) => load_file(&path),
        None => Ok(None),
    }
}
