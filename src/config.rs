use ini::{Ini, Properties};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Section the settings are read from; keys before any section header work too.
const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Unable to read {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },
    #[error("Malformed config: {0}")]
    Malformed(#[from] ini::ParseError),
    #[error("Missing required setting '{0}'")]
    MissingKey(&'static str),
    #[error("Setting '{0}' must not be empty")]
    EmptyKey(&'static str),
}

pub struct Config {
    pub api_token: String,
    pub zone_id: String,
    pub domain: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_token", &"<redacted>")
            .field("zone_id", &self.zone_id)
            .field("domain", &self.domain)
            .finish()
    }
}

fn required(
    key: &'static str,
    default: Option<&Properties>,
    general: &Properties,
) -> Result<String, ConfigError> {
    let value = default
        .and_then(|section| section.get(key))
        .or_else(|| general.get(key));
    match value {
        None => Err(ConfigError::MissingKey(key)),
        Some(value) => match unquote(value.trim()) {
            "" => Err(ConfigError::EmptyKey(key)),
            value => Ok(value.to_string()),
        },
    }
}

/// `key = "value"` and `key = 'value'` read the same as `key = value`.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    value
}

pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    let file = Ini::load_from_str(contents)?;
    let default = file.section(Some(DEFAULT_SECTION));
    let general = file.general_section();

    Ok(Config {
        api_token: required("api_token", default, general)?,
        zone_id: required("zone_id", default, general)?,
        domain: required("domain", default, general)?,
    })
}

pub fn load_config(file: &Path) -> Result<Config, ConfigError> {
    if !file.is_file() {
        return Err(ConfigError::NotFound(file.to_path_buf()));
    }
    let contents = fs::read_to_string(file).map_err(|source| ConfigError::Unreadable {
        path: file.to_path_buf(),
        source,
    })?;

    parse_config(&contents)
}
