use muzika_config::{CONFIG_BACKEND, ConfigBackend, ConfigError, PATHS};
use muzika_core::services::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
  pub db_path: PathBuf,
  pub journal_mode: Option<String>,
  #[serde(default = "default_busy_timeout_ms")]
  pub busy_timeout_ms: u32,
  #[serde(default = "default_pool_size")]
  pub pool_size: u32,
}

fn default_busy_timeout_ms() -> u32 {
  5_000
}

fn default_pool_size() -> u32 {
  5
}

impl Default for StorageConfig {
  fn default() -> Self {
    let db_path = PATHS.data_dir.join("muzika.db");
    StorageConfig::at(db_path)
  }
}

impl StorageConfig {
  /// Configuración por defecto apuntando a `db_path`.
  pub fn at(db_path: impl Into<PathBuf>) -> Self {
    StorageConfig {
      db_path: db_path.into(),
      journal_mode: Some("WAL".to_string()),
      busy_timeout_ms: default_busy_timeout_ms(),
      pool_size: default_pool_size(),
    }
  }

  pub fn load() -> Result<Self, ConfigError> {
    let cfg = CONFIG_BACKEND.load_section_with_default("storage")?;
    CONFIG_BACKEND.save_section("storage", &cfg)?;
    Ok(cfg)
  }

  pub fn save(&self) -> Result<(), ConfigError> {
    CONFIG_BACKEND.save_section("storage", self)
  }
}

/// Carga la sección `[relations]` (reintentos del servicio de relaciones).
pub fn load_sync_config() -> Result<SyncConfig, ConfigError> {
  let cfg = CONFIG_BACKEND.load_section_with_default("relations")?;
  CONFIG_BACKEND.save_section("relations", &cfg)?;
  Ok(cfg)
}
