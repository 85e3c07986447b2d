use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt};

use crate::{CONFIG_BACKEND, ConfigBackend, ConfigError};

/// Sección `[logging]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
  /// Filtro por defecto (`info`, `muzika_core=debug`...). `RUST_LOG` manda.
  #[serde(default = "default_level")]
  pub level: String,
  /// `pretty` o `json`.
  #[serde(default = "default_format")]
  pub format: String,
}

fn default_level() -> String {
  "info".into()
}

fn default_format() -> String {
  "pretty".into()
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self { level: default_level(), format: default_format() }
  }
}

impl LoggingConfig {
  pub fn load() -> Result<Self, ConfigError> {
    let cfg = CONFIG_BACKEND.load_section_with_default("logging")?;
    CONFIG_BACKEND.save_section("logging", &cfg)?;
    Ok(cfg)
  }

  fn filter(&self) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
  }

  /// Instala el subscriber global de `tracing`.
  ///
  /// Si ya había uno instalado (tests, binarios que embeben la librería) no
  /// hace nada.
  pub fn init(&self) {
    let filter = self.filter();

    let _ = match self.format.as_str() {
      "json" => fmt().json().with_env_filter(filter).try_init(),
      _ => fmt().with_env_filter(filter).try_init(),
    };
  }
}
