mod backend;
mod io;
mod logging;
mod paths;

pub use backend::{ConfigBackend, TomlConfigBackend};
pub use io::atomic_write_str;
pub use logging::LoggingConfig;
pub use paths::{ConfigError, MuzikaPaths};

use once_cell::sync::Lazy;

// Singleton de paths (portable / system)
pub static PATHS: Lazy<MuzikaPaths> = Lazy::new(|| MuzikaPaths::detect().expect("failed to init MuzikaPaths"));

// Singleton del backend de config
pub static CONFIG_BACKEND: Lazy<TomlConfigBackend> = Lazy::new(|| TomlConfigBackend::new(PATHS.clone()));
