use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ids::ArtistId;

/// Intervalo de validez de una relación, tal como lo escribe el editor.
///
/// Los años se guardan como texto sin interpretar (`"2010"`, `"~1998"`).
/// Un `year_to` vacío significa que la relación sigue vigente.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenure {
  pub year_from: String,
  pub year_to: String,
}

impl Tenure {
  pub fn new(year_from: impl Into<String>, year_to: impl Into<String>) -> Self {
    Self { year_from: year_from.into(), year_to: year_to.into() }
  }

  /// `true` si la relación no tiene año de fin.
  pub fn is_ongoing(&self) -> bool {
    self.year_to.trim().is_empty()
  }
}

/// Una mitad de una relación bidireccional, guardada en uno de los extremos.
///
/// Según la lista donde aparezca, `artist_id` apunta a:
/// - `Artist::memberships` → el grupo al que pertenece el solista,
/// - `Artist::members` → el solista miembro del grupo,
/// - `Artist::related` → el artista relacionado.
///
/// `name` es una copia desnormalizada del nombre del otro extremo, tomada
/// en el momento de escribir la relación.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistLink {
  pub artist_id: ArtistId,
  pub name: String,
  #[serde(flatten)]
  pub tenure: Tenure,
}

impl ArtistLink {
  pub fn new(artist_id: ArtistId, name: impl Into<String>, tenure: Tenure) -> Self {
    Self { artist_id, name: name.into(), tenure }
  }
}

/// Relación declarada por el editor al guardar un artista.
///
/// Viene del formulario de administración tal cual: el id puede faltar
/// (fila vacía) y el nombre es opcional porque se resuelve contra el
/// catálogo al reconciliar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredLink {
  pub counterpart_id: Option<ArtistId>,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(flatten)]
  pub tenure: Tenure,
}

impl DeclaredLink {
  pub fn new(counterpart_id: ArtistId, tenure: Tenure) -> Self {
    Self { counterpart_id: Some(counterpart_id), name: None, tenure }
  }
}

impl From<&ArtistLink> for DeclaredLink {
  fn from(link: &ArtistLink) -> Self {
    Self {
      counterpart_id: Some(link.artist_id),
      name: Some(link.name.clone()),
      tenure: link.tenure.clone(),
    }
  }
}

/// Las dos relaciones bidireccionales que mantiene el catálogo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
  /// Solista ↔ grupo (`memberships` / `members`).
  Membership,
  /// Artista ↔ artista, sin restricción de tipo (`related`).
  Related,
}

impl fmt::Display for Relation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Relation::Membership => f.write_str("membership"),
      Relation::Related => f.write_str("related"),
    }
  }
}
