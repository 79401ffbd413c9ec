//! Layered loading: built-in defaults, then the TOML file, then the
//! environment, then command-line overrides.

pub mod error;

use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

use crate::{
    constants::{
        DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_HTTP_TIMEOUT, DEFAULT_LOG_LEVEL,
        DEFAULT_RELEASE_RESULTS, DEFAULT_ROOT_DIR, DEFAULT_TOOL_TIMEOUT,
        DEFAULT_TRANSCODE_TIMEOUT, DEFAULT_VIDEO_RESULTS, default_user_agent,
    },
    models::{
        Config, ConfigMetadata, ConfigWarnings, HttpSettings, LoggingSettings,
        SearchLimits, Timeouts, ToolOverrides,
        layout::AppLayout,
        sources::{EnvConfig, FileConfig},
    },
    util::{non_blank, parse_duration},
};
use error::ConfigLoadError;

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("riptag.toml"),
        PathBuf::from("config/riptag.toml"),
    ]
});

/// Inputs that steer [`ConfigLoader::load`].
#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    /// Explicit TOML file. It must exist when set.
    pub config_path: Option<PathBuf>,
    /// Explicit `.env` file; otherwise the nearest `.env` is used if
    /// present.
    pub env_file: Option<PathBuf>,
    /// Command-line root override; wins over every other source.
    pub root: Option<PathBuf>,
    /// Command-line log filter override.
    pub log_level: Option<String>,
    /// Use these values instead of the process environment. No `.env` file
    /// is read when set.
    pub environment: Option<EnvConfig>,
}

/// Resolves a [`Config`] from every configured source.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

/// A successfully loaded configuration.
#[derive(Debug)]
pub struct ConfigLoad {
    /// The resolved settings.
    pub config: Config,
    /// Problems that fell back to defaults instead of failing.
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    /// Loader with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with explicit options.
    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    /// Read this TOML file instead of searching the default locations.
    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    /// Apply this `.env` file before reading the environment.
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Use `env` instead of the process environment.
    pub fn with_environment(mut self, env: EnvConfig) -> Self {
        self.options.environment = Some(env);
        self
    }

    /// Resolve every source into a [`Config`].
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env_config, env_file_loaded) = match &self.options.environment {
            Some(env) => (env.clone(), false),
            None => {
                let loaded = self.load_env_file()?;
                (EnvConfig::gather(), loaded)
            }
        };

        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let mut warnings = ConfigWarnings::default();
        if config_path.is_none() {
            warnings.push_with_hint(
                "No riptag.toml detected; using environment and defaults",
                "Create riptag.toml or pass --config to customise timeouts and limits",
            );
        }

        let config = self.compose_config(
            file_config.unwrap_or_default(),
            env_config,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
            &mut warnings,
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let result = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path),
            None => dotenvy::dotenv().map(|_| ()),
        };
        match result {
            Ok(()) => Ok(true),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        // A path named on the command line or in the environment must exist;
        // the default locations are tried silently.
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env_config.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(found) => found.clone(),
                None => return Ok((None, None)),
            },
        };

        let file_config = read_file_config(&path)?;
        debug!(path = %path.display(), "loaded configuration file");
        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file: FileConfig,
        env: EnvConfig,
        metadata: ConfigMetadata,
        warnings: &mut ConfigWarnings,
    ) -> Result<Config, ConfigLoadError> {
        let FileConfig {
            root: file_root,
            tools: file_tools,
            timeouts: file_timeouts,
            search: file_search,
            http: file_http,
            logging: file_logging,
        } = file;

        let root = self
            .options
            .root
            .clone()
            .or(env.root)
            .or(file_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT_DIR));

        let tools = ToolOverrides {
            extractor: env.extractor_path.or(file_tools.extractor),
            transcoder: env.transcoder_path.or(file_tools.transcoder),
        };
        for (label, path) in [
            ("yt-dlp", tools.extractor.as_deref()),
            ("ffmpeg", tools.transcoder.as_deref()),
        ] {
            if let Some(path) = path
                && !path.exists()
            {
                warnings.push_with_hint(
                    format!("{label} override {} does not exist", path.display()),
                    "The dependency check will report it as missing",
                );
            }
        }

        let timeouts = Timeouts {
            tool: resolve_duration(
                "RIPTAG_TOOL_TIMEOUT",
                env.tool_timeout.or(file_timeouts.tool),
                DEFAULT_TOOL_TIMEOUT,
            )?,
            download: resolve_duration(
                "RIPTAG_DOWNLOAD_TIMEOUT",
                env.download_timeout.or(file_timeouts.download),
                DEFAULT_DOWNLOAD_TIMEOUT,
            )?,
            transcode: resolve_duration(
                "RIPTAG_TRANSCODE_TIMEOUT",
                env.transcode_timeout.or(file_timeouts.transcode),
                DEFAULT_TRANSCODE_TIMEOUT,
            )?,
            http: resolve_duration(
                "RIPTAG_HTTP_TIMEOUT",
                env.http_timeout.or(file_timeouts.http),
                DEFAULT_HTTP_TIMEOUT,
            )?,
        };

        let search = SearchLimits {
            videos: resolve_limit(
                "RIPTAG_SEARCH_LIMIT",
                env.search_limit,
                file_search.videos,
                DEFAULT_VIDEO_RESULTS,
                warnings,
            )?,
            releases: resolve_limit(
                "RIPTAG_RELEASE_LIMIT",
                env.release_limit,
                file_search.releases,
                DEFAULT_RELEASE_RESULTS,
                warnings,
            )?,
        };

        let http = HttpSettings {
            user_agent: env
                .user_agent
                .or(non_blank(file_http.user_agent))
                .unwrap_or_else(default_user_agent),
        };

        let logging = LoggingSettings {
            level: non_blank(self.options.log_level.clone())
                .or(env.log_level)
                .or(non_blank(file_logging.level))
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        };

        Ok(Config {
            layout: AppLayout::new(root),
            tools,
            timeouts,
            search,
            http,
            logging,
            metadata,
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve_duration(
    key: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match non_blank(raw) {
        Some(value) => parse_duration(&value).map_err(|source| {
            ConfigLoadError::InvalidDuration { key, value, source }
        }),
        None => Ok(default),
    }
}

fn resolve_limit(
    key: &'static str,
    env_raw: Option<String>,
    file_value: Option<u32>,
    default: u32,
    warnings: &mut ConfigWarnings,
) -> Result<u32, ConfigLoadError> {
    let value = match env_raw {
        Some(raw) => raw.trim().parse::<u32>().map_err(|source| {
            ConfigLoadError::InvalidNumber {
                key,
                value: raw.clone(),
                source,
            }
        })?,
        None => match file_value {
            Some(value) => value,
            None => return Ok(default),
        },
    };

    if value == 0 {
        warnings.push(format!("{key} is 0; using the default of {default}"));
        return Ok(default);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_duration_falls_back_to_default() {
        let value = resolve_duration(
            "RIPTAG_TOOL_TIMEOUT",
            Some("  ".into()),
            DEFAULT_TOOL_TIMEOUT,
        )
        .unwrap();
        assert_eq!(value, DEFAULT_TOOL_TIMEOUT);
    }

    #[test]
    fn zero_limit_warns_and_uses_default() {
        let mut warnings = ConfigWarnings::default();
        let value = resolve_limit(
            "RIPTAG_SEARCH_LIMIT",
            Some("0".into()),
            None,
            DEFAULT_VIDEO_RESULTS,
            &mut warnings,
        )
        .unwrap();

        assert_eq!(value, DEFAULT_VIDEO_RESULTS);
        assert_eq!(warnings.items.len(), 1);
    }

    #[test]
    fn malformed_limit_names_the_variable() {
        let mut warnings = ConfigWarnings::default();
        let err = resolve_limit(
            "RIPTAG_RELEASE_LIMIT",
            Some("lots".into()),
            Some(10),
            DEFAULT_RELEASE_RESULTS,
            &mut warnings,
        )
        .unwrap_err();

        assert!(err.to_string().contains("RIPTAG_RELEASE_LIMIT"));
    }
}
