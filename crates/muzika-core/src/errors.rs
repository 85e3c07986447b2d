// crates/muzika-core/src/errors.rs
use thiserror::Error;

use crate::ports::RepoError;

/// Error genérico del núcleo de Muzika.
///
/// Las capas superiores (panel de administración, CLI, etc.) deberían
/// mapear este error a mensajes de usuario o logs.
#[derive(Debug, Error)]
pub enum CoreError {
  #[error("repository error: {0}")]
  Repository(String),

  /// Otro guardado tocó las mismas filas y se agotaron los reintentos.
  #[error("concurrent update: {0}")]
  Conflict(String),

  #[error("not found")]
  NotFound,
}

impl From<RepoError> for CoreError {
  fn from(err: RepoError) -> Self {
    match err {
      RepoError::NotFound => CoreError::NotFound,
      e @ RepoError::Conflict { .. } => CoreError::Conflict(e.to_string()),
      RepoError::Storage(msg) => CoreError::Repository(msg),
    }
  }
}
