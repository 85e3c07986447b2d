use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identificador único de un artista (solista o grupo).
///
/// Es opaco y estable durante toda la vida de la entidad: renombrar un
/// artista o cambiar su tipo no cambia su id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtistId(Uuid);

impl ArtistId {
  /// Genera un nuevo identificador único.
  pub fn new() -> Self {
    ArtistId(Uuid::new_v4())
  }

  /// Construye un `ArtistId` a partir de un `Uuid` existente.
  pub fn from_uuid(u: Uuid) -> Self {
    ArtistId(u)
  }

  /// Devuelve el `Uuid` interno.
  pub fn as_uuid(&self) -> Uuid {
    self.0
  }
}

impl Default for ArtistId {
  fn default() -> Self {
    Self::new()
  }
}

impl FromStr for ArtistId {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Uuid::parse_str(s.trim()).map(ArtistId)
  }
}

impl From<Uuid> for ArtistId {
  fn from(u: Uuid) -> Self {
    ArtistId(u)
  }
}

impl From<ArtistId> for Uuid {
  fn from(id: ArtistId) -> Self {
    id.0
  }
}

impl fmt::Display for ArtistId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}
