use muzika_core::domain::ArtistId;
use muzika_core::ports::RepoError;
use thiserror::Error;

/// Errores internos del adapter SQLite.
///
/// Se convierten a [`RepoError`] en la frontera del port.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("database error: {0}")]
  Database(#[from] diesel::result::Error),

  #[error("connection error: {0}")]
  Connection(String),

  #[error("migration error: {0}")]
  Migration(String),

  #[error("corrupt row: {0}")]
  Corrupt(String),

  #[error("version conflict on artist {id}")]
  Conflict { id: ArtistId, expected: u64, found: Option<u64> },
}

impl From<StoreError> for RepoError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::Conflict { id, expected, found } => RepoError::Conflict { id, expected, found },
      other => RepoError::Storage(other.to_string()),
    }
  }
}
