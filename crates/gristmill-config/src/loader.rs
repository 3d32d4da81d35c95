//! `KEY=value` configuration-file loading.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::model::EngineConfig;

/// Load configuration from `path`. The file must exist; keys not listed in
/// the model are warned about and ignored so configuration files may carry
/// settings for other tools. Roots are expanded to absolute paths.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a line is not of the
/// `KEY=value` form, or a recognized key carries an invalid value.
pub fn load(path: &Path) -> ConfigResult<EngineConfig> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "reading configuration file");

    let mut config = EngineConfig::default();
    apply_text(&mut config, &text, path)?;
    absolutize(&mut config)?;
    Ok(config)
}

fn apply_text(config: &mut EngineConfig, text: &str, path: &Path) -> ConfigResult<()> {
    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::MalformedLine {
                path: path.to_path_buf(),
                line: index + 1,
                content: raw_line.to_string(),
            });
        };
        let key = key.trim();
        let value = strip_quotes(value.trim());
        match key {
            "PRODUCT_ROOT" => config.product_root = required_path(key, value)?,
            "CACHE_ROOT" => config.cache_root = required_path(key, value)?,
            "GENERATOR_SCRIPT" => config.generator_script = required_name(key, value)?,
            "INPUT_SCRIPT" => config.input_script = required_name(key, value)?,
            other => warn!(key = other, "ignoring unrecognized configuration key"),
        }
    }
    Ok(())
}

fn required_path(field: &str, value: &str) -> ConfigResult<PathBuf> {
    if value.is_empty() {
        return Err(ConfigError::InvalidField {
            field: field.to_string(),
            value: None,
            reason: "must not be empty",
        });
    }
    Ok(PathBuf::from(value))
}

fn required_name(field: &str, value: &str) -> ConfigResult<String> {
    if value.is_empty() {
        return Err(ConfigError::InvalidField {
            field: field.to_string(),
            value: None,
            reason: "must not be empty",
        });
    }
    if value.contains(['/', '\\']) {
        return Err(ConfigError::InvalidField {
            field: field.to_string(),
            value: Some(value.to_string()),
            reason: "must be a bare filename",
        });
    }
    Ok(value.to_string())
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn absolutize(config: &mut EngineConfig) -> ConfigResult<()> {
    config.product_root =
        std::path::absolute(&config.product_root).map_err(|source| ConfigError::Io {
            path: config.product_root.clone(),
            source,
        })?;
    config.cache_root = std::path::absolute(&config.cache_root).map_err(|source| ConfigError::Io {
        path: config.cache_root.clone(),
        source,
    })?;
    Ok(())
}
