use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Tipo de artista.
///
/// Un `Solo` puede declarar pertenencia a grupos; un `Group` declara a sus
/// miembros. La relación "artista relacionado" ignora el tipo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtistKind {
  /// Artista individual.
  Solo,
  /// Grupo, banda o colectivo.
  Group,
}

impl ArtistKind {
  /// El tipo del otro extremo de una relación de pertenencia.
  pub fn complement(self) -> Self {
    match self {
      ArtistKind::Solo => ArtistKind::Group,
      ArtistKind::Group => ArtistKind::Solo,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      ArtistKind::Solo => "solo",
      ArtistKind::Group => "group",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown artist kind: {0:?}")]
pub struct ArtistKindParseError(pub String);

impl FromStr for ArtistKind {
  type Err = ArtistKindParseError;

  /// Convierte una cadena en un `ArtistKind`.
  ///
  /// Se normaliza (minúsculas, trimming) y se aceptan algunos alias que
  /// aparecen en los formularios de administración (`"band"`, `"grupė"`...).
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_lowercase();

    match normalized.as_str() {
      "solo" | "artist" | "solo artist" | "atlikėjas" => Ok(ArtistKind::Solo),
      "group" | "band" | "grupe" | "grupė" => Ok(ArtistKind::Group),
      _ => Err(ArtistKindParseError(s.to_string())),
    }
  }
}

impl fmt::Display for ArtistKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
