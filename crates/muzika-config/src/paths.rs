use directories::ProjectDirs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("toml error: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("directories error: could not determine home directory")]
  Directories,
  #[error("other: {0}")]
  Other(String),
}

#[derive(Debug, Clone)]
pub struct MuzikaPaths {
  pub base_dir: PathBuf,
  pub config_dir: PathBuf,
  pub data_dir: PathBuf,
  pub cache_dir: PathBuf,
}

impl MuzikaPaths {
  pub fn new() -> Result<Self, ConfigError> {
    if let Ok(env_base) = std::env::var("MUZIKA_BASE_DIR") {
      return Self::at(env_base);
    }

    let proj_dirs = ProjectDirs::from("lt", "muzika", "muzika").ok_or(ConfigError::Directories)?;
    let paths = Self {
      base_dir: proj_dirs.config_dir().to_path_buf(),
      config_dir: proj_dirs.config_dir().to_path_buf(),
      data_dir: proj_dirs.data_dir().to_path_buf(),
      cache_dir: proj_dirs.cache_dir().to_path_buf(),
    };
    paths.create_dirs()?;
    Ok(paths)
  }

  /// Layout portable: todo cuelga de `base`.
  pub fn at(base: impl Into<PathBuf>) -> Result<Self, ConfigError> {
    let base: PathBuf = base.into();
    let paths = Self {
      config_dir: base.join("config"),
      data_dir: base.join("data"),
      cache_dir: base.join("cache"),
      base_dir: base,
    };
    paths.create_dirs()?;
    Ok(paths)
  }

  pub fn detect() -> Result<Self, ConfigError> {
    Self::new()
  }

  pub fn config_file(&self) -> PathBuf {
    self.config_dir.join("muzika.toml")
  }

  fn create_dirs(&self) -> Result<(), ConfigError> {
    std::fs::create_dir_all(&self.config_dir)?;
    std::fs::create_dir_all(&self.data_dir)?;
    std::fs::create_dir_all(&self.cache_dir)?;
    Ok(())
  }
}
