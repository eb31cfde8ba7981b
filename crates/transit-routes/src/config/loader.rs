//! Topology document loading

use super::schema::TopologyDocument;
use crate::{Error, Result};
use regex::Regex;
use std::path::Path;

/// Serialization format of a topology document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            _ => Err(Error::Config(format!(
                "unsupported topology document extension: {}",
                path.display()
            ))),
        }
    }
}

/// Load a topology document, choosing the format by extension
pub fn load_from_file(path: impl AsRef<Path>) -> Result<TopologyDocument> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let contents = std::fs::read_to_string(path)?;
    from_str(&contents, format)
}

/// Parse a topology document after `${VAR}` substitution
pub fn from_str(contents: &str, format: ConfigFormat) -> Result<TopologyDocument> {
    let contents = substitute_env_vars(contents)?;
    let document = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&contents)?,
        ConfigFormat::Toml => toml::from_str(&contents)?,
        ConfigFormat::Json => serde_json::from_str(&contents)?,
    };
    Ok(document)
}

/// Replace every `${VAR_NAME}` with the value of that environment variable
fn substitute_env_vars(contents: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| Error::Config(e.to_string()))?;

    let mut result = String::with_capacity(contents.len());
    let mut last = 0;
    for cap in re.captures_iter(contents) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let value = std::env::var(var_name.as_str()).map_err(|_| {
            Error::Config(format!(
                "environment variable '{}' not found",
                var_name.as_str()
            ))
        })?;
        result.push_str(&contents[last..full_match.start()]);
        result.push_str(&value);
        last = full_match.end();
    }
    result.push_str(&contents[last..]);
    Ok(result)
}
