//! `formdeck.toml` loading and resolution of effective settings.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use form_spec::ValidationMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const CONFIG_FILE_NAME: &str = "formdeck.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    Missing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid public_base_url '{value}': {source}")]
    BaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("blob directory {0} cannot be expressed as a file url")]
    BlobDir(PathBuf),
    #[error("no data directory could be determined; pass --data-dir")]
    NoDataDir,
}

/// Contents of `formdeck.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub data_dir: Option<PathBuf>,
    pub blob_dir: Option<PathBuf>,
    pub public_base_url: Option<String>,
    pub validation_mode: ValidationMode,
    pub log_level: Option<String>,
}

impl ConfigFile {
    pub fn from_toml(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` when given (it must exist), else `./formdeck.toml`,
    /// else the platform config file. No file at all yields defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::Missing(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => candidate_paths().into_iter().find(|path| path.is_file()),
        };
        let Some(path) = path else {
            return Ok((Self::default(), None));
        };
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml(&path, &raw)?;
        Ok((config, Some(path)))
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dirs) = project_dirs() {
        paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
    }
    paths
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "formdeck", "formdeck")
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Effective settings after merging flags, file and platform defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub config_path: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub blob_dir: PathBuf,
    pub public_base_url: Url,
    pub validation_mode: ValidationMode,
    pub log_level: Option<String>,
}

impl Settings {
    pub fn resolve(
        file: ConfigFile,
        config_path: Option<PathBuf>,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let data_dir = match overrides.data_dir.or(file.data_dir) {
            Some(dir) => dir,
            None => project_dirs()
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or(ConfigError::NoDataDir)?,
        };
        let blob_dir = file.blob_dir.unwrap_or_else(|| data_dir.join("blobs"));
        let public_base_url = match file.public_base_url {
            Some(value) => Url::parse(&value).map_err(|source| ConfigError::BaseUrl {
                value: value.clone(),
                source,
            })?,
            None => file_url(&blob_dir)?,
        };
        Ok(Self {
            config_path,
            data_dir,
            blob_dir,
            public_base_url,
            validation_mode: file.validation_mode,
            log_level: overrides.log_level.or(file.log_level),
        })
    }
}

fn file_url(dir: &Path) -> Result<Url, ConfigError> {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|_| ConfigError::BlobDir(dir.to_path_buf()))?
            .join(dir)
    };
    Url::from_directory_path(&absolute).map_err(|_| ConfigError::BlobDir(dir.to_path_buf()))
}
