//! Product descriptor model and descriptor-string parsing.
//!
//! Descriptor strings follow the canonical filename convention
//! `[TIMESTAMP_]id[_KEY=VALUE]*.format`: underscore-separated tokens where
//! a leading token of twelve digits (or the literal `LATEST`) is the
//! timestamp, tokens containing `=` are parameters, and the rest form the
//! dot-segmented product id.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};

/// Length of a concrete timestamp: `YYYYMMDDHHMM`.
const STAMP_LEN: usize = 12;

/// Sentinel spelling for the latest-alias timestamp.
const LATEST_LABEL: &str = "LATEST";

/// Timestamp portion of a product descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Timestamp {
    /// No timestamp: the product is not time-partitioned.
    Unset,
    /// The `LATEST` sentinel: resolved outside the time partition.
    Latest,
    /// A concrete stamp of exactly twelve digits (`YYYYMMDDHHMM`).
    Stamp(String),
}

impl Timestamp {
    /// Parse a raw timestamp. Non-alphanumeric characters are stripped
    /// before the twelve-digit check, so `2020-01-01 00:00` is accepted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDescriptor` unless the sanitized input is empty,
    /// `LATEST`, or at least twelve digits.
    pub fn parse(raw: &str) -> EngineResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::Unset);
        }
        if trimmed == LATEST_LABEL {
            return Ok(Self::Latest);
        }
        let sanitized: String = trimmed.chars().filter(char::is_ascii_alphanumeric).collect();
        if sanitized.len() >= STAMP_LEN && sanitized[..STAMP_LEN].bytes().all(|b| b.is_ascii_digit())
        {
            return Ok(Self::Stamp(sanitized[..STAMP_LEN].to_string()));
        }
        Err(EngineError::invalid_descriptor(
            raw,
            "timestamp must be twelve digits or LATEST",
        ))
    }

    /// Filename spelling; `None` when unset.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Unset => None,
            Self::Latest => Some(LATEST_LABEL),
            Self::Stamp(stamp) => Some(stamp),
        }
    }

    /// The concrete stamp, when one is present.
    #[must_use]
    pub fn stamp(&self) -> Option<&str> {
        match self {
            Self::Stamp(stamp) => Some(stamp),
            Self::Unset | Self::Latest => None,
        }
    }
}

/// Identity of a requested product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDescriptor {
    /// Dot-segmented product type identifier, e.g. `radar.comp`.
    pub id: String,
    /// Requested timestamp.
    pub timestamp: Timestamp,
    /// Generator parameters, keyed by name.
    pub params: BTreeMap<String, String>,
    /// Output format: the file extension, without the dot.
    pub format: String,
}

impl ProductDescriptor {
    /// Canonical filename of this product instance.
    #[must_use]
    pub fn filename(&self) -> String {
        let mut name = String::new();
        if let Some(label) = self.timestamp.label() {
            name.push_str(label);
            name.push('_');
        }
        name.push_str(&self.id);
        for (key, value) in &self.params {
            name.push('_');
            name.push_str(key);
            name.push('=');
            name.push_str(value);
        }
        name.push('.');
        name.push_str(&self.format);
        name
    }

    /// Filename of the latest alias: the canonical filename with the
    /// timestamp portion replaced by `LATEST`.
    #[must_use]
    pub fn latest_filename(&self) -> String {
        Self {
            timestamp: Timestamp::Latest,
            ..self.clone()
        }
        .filename()
    }

    /// Time partition segment `{YEAR}/{MONTH}/{DAY}`; `None` for unset
    /// timestamps and the `LATEST` sentinel.
    #[must_use]
    pub fn time_segment(&self) -> Option<PathBuf> {
        let stamp = self.timestamp.stamp()?;
        let mut segment = PathBuf::from(&stamp[0..4]);
        segment.push(&stamp[4..6]);
        segment.push(&stamp[6..8]);
        Some(segment)
    }

    /// Type partition segment: the id with `.` replaced by the path
    /// separator.
    #[must_use]
    pub fn type_segment(&self) -> PathBuf {
        self.id.split('.').collect()
    }

    /// Base child-process environment: the parameters plus the timestamp
    /// expanded into `TIMESTAMP`, `YEAR`, `MONTH`, `DAY`, `HOUR`, `MINUTE`.
    #[must_use]
    pub fn base_env(&self) -> BTreeMap<String, String> {
        let mut env = self.params.clone();
        if let Some(stamp) = self.timestamp.stamp() {
            env.insert("TIMESTAMP".to_string(), stamp.to_string());
            env.insert("YEAR".to_string(), stamp[0..4].to_string());
            env.insert("MONTH".to_string(), stamp[4..6].to_string());
            env.insert("DAY".to_string(), stamp[6..8].to_string());
            env.insert("HOUR".to_string(), stamp[8..10].to_string());
            env.insert("MINUTE".to_string(), stamp[10..12].to_string());
        }
        env
    }
}

impl fmt::Display for ProductDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename())
    }
}

impl FromStr for ProductDescriptor {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EngineError::invalid_descriptor(
                raw,
                "descriptor string is empty",
            ));
        }
        let (stem, format) = trimmed
            .rsplit_once('.')
            .ok_or_else(|| EngineError::invalid_descriptor(raw, "missing format extension"))?;
        if format.is_empty() || format.contains(['_', '=']) {
            return Err(EngineError::invalid_descriptor(
                raw,
                "missing format extension",
            ));
        }

        let mut timestamp = Timestamp::Unset;
        let mut id_parts: Vec<&str> = Vec::new();
        let mut params = BTreeMap::new();
        for (index, token) in stem.split('_').enumerate() {
            if token.is_empty() {
                continue;
            }
            if index == 0 && (token == LATEST_LABEL || is_stamp_token(token)) {
                timestamp = Timestamp::parse(token)?;
                continue;
            }
            if let Some((key, value)) = token.split_once('=') {
                if key.is_empty() {
                    return Err(EngineError::invalid_descriptor(
                        raw,
                        "parameter with empty name",
                    ));
                }
                params.insert(key.to_string(), value.to_string());
            } else {
                id_parts.push(token);
            }
        }

        let id = id_parts.join("_");
        if id.is_empty() {
            return Err(EngineError::invalid_descriptor(raw, "missing product id"));
        }

        Ok(Self {
            id,
            timestamp,
            params,
            format: format.to_string(),
        })
    }
}

fn is_stamp_token(token: &str) -> bool {
    token.len() == STAMP_LEN && token.bytes().all(|b| b.is_ascii_digit())
}
