//! Raw values as read from the TOML file and the environment.
//!
//! Field names mirror the TOML keys and environment variables one to one.
#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf};

use crate::util::non_blank;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub tools: FileToolsConfig,
    #[serde(default)]
    pub timeouts: FileTimeoutsConfig,
    #[serde(default)]
    pub search: FileSearchConfig,
    #[serde(default)]
    pub http: FileHttpConfig,
    #[serde(default)]
    pub logging: FileLoggingConfig,
}

/// `[tools]` table.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileToolsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extractor: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcoder: Option<PathBuf>,
}

/// Timeouts are kept as strings so they can use humantime notation.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileTimeoutsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
}

/// `[search]` table.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileSearchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub releases: Option<u32>,
}

/// `[http]` table.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileHttpConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// `[logging]` table.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Environment-derived configuration values.
///
/// Numbers and durations stay raw here; the loader parses them so errors can
/// name the variable that carried the bad value.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub extractor_path: Option<PathBuf>,
    pub transcoder_path: Option<PathBuf>,
    pub tool_timeout: Option<String>,
    pub download_timeout: Option<String>,
    pub transcode_timeout: Option<String>,
    pub http_timeout: Option<String>,
    pub search_limit: Option<String>,
    pub release_limit: Option<String>,
    pub user_agent: Option<String>,
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Read the process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an explicit key/value map (used by tests and dry runs).
    pub fn from_map(env: &HashMap<String, String>) -> Self {
        Self::from_lookup(|key| env.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| non_blank(lookup(key));
        Self {
            config_path: get("RIPTAG_CONFIG").map(PathBuf::from),
            root: get("RIPTAG_ROOT").map(PathBuf::from),
            extractor_path: get("YT_DLP_PATH").map(PathBuf::from),
            transcoder_path: get("FFMPEG_PATH").map(PathBuf::from),
            tool_timeout: get("RIPTAG_TOOL_TIMEOUT"),
            download_timeout: get("RIPTAG_DOWNLOAD_TIMEOUT"),
            transcode_timeout: get("RIPTAG_TRANSCODE_TIMEOUT"),
            http_timeout: get("RIPTAG_HTTP_TIMEOUT"),
            search_limit: get("RIPTAG_SEARCH_LIMIT"),
            release_limit: get("RIPTAG_RELEASE_LIMIT"),
            user_agent: get("RIPTAG_USER_AGENT"),
            log_level: get("RIPTAG_LOG"),
        }
    }
}
