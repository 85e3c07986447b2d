use crate::domain::{Artist, ArtistId};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
  #[error("entity not found")]
  NotFound,

  /// La fila cambió (o desapareció) desde que se leyó.
  #[error("version conflict on artist {id}: expected {expected}, found {found:?}")]
  Conflict { id: ArtistId, expected: u64, found: Option<u64> },

  #[error("storage error: {0}")]
  Storage(String),
}

/// Conjunto de cambios que se aplica de una vez.
///
/// Cada fila lleva la versión con la que se leyó; si alguna no coincide con
/// la guardada, no se aplica nada.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
  /// Artistas a insertar (`version == 0`) o actualizar.
  pub upserts: Vec<Artist>,
  /// Artistas a borrar, con la versión esperada.
  pub deletes: Vec<(ArtistId, u64)>,
}

impl Changeset {
  pub fn upserting(upserts: Vec<Artist>) -> Self {
    Self { upserts, deletes: vec![] }
  }

  pub fn is_empty(&self) -> bool {
    self.upserts.is_empty() && self.deletes.is_empty()
  }
}

/// Port de persistencia de artistas y sus relaciones.
///
/// Las lecturas devuelven filas completas (con sus tres listas de
/// relaciones). Las escrituras son atómicas: todo el `Changeset` se aplica o
/// no se aplica nada, y cada fila escrita sale con `version + 1`.
pub trait ArtistRepository {
  // --- Lectura ---
  fn load_all(&self) -> Result<Vec<Artist>, RepoError>;
  fn find_artist(&self, id: ArtistId) -> Result<Option<Artist>, RepoError>;
  /// Los artistas existentes entre `ids`; los que no existen se omiten.
  fn find_many(&self, ids: &[ArtistId]) -> Result<Vec<Artist>, RepoError>;
  /// Otros artistas que tienen alguna relación apuntando a `id`.
  ///
  /// El propio `id` nunca se incluye, aunque guarde un enlace a sí mismo.
  fn find_referencing(&self, id: ArtistId) -> Result<Vec<Artist>, RepoError>;

  // --- Escritura ---
  fn commit(&self, changes: &Changeset) -> Result<Vec<Artist>, RepoError>;

  /// Persiste la colección completa en una sola transacción.
  fn save_all(&self, artists: &[Artist]) -> Result<Vec<Artist>, RepoError> {
    self.commit(&Changeset::upserting(artists.to_vec()))
  }
}

impl<R: ArtistRepository + ?Sized> ArtistRepository for &R {
  fn load_all(&self) -> Result<Vec<Artist>, RepoError> {
    (**self).load_all()
  }

  fn find_artist(&self, id: ArtistId) -> Result<Option<Artist>, RepoError> {
    (**self).find_artist(id)
  }

  fn find_many(&self, ids: &[ArtistId]) -> Result<Vec<Artist>, RepoError> {
    (**self).find_many(ids)
  }

  fn find_referencing(&self, id: ArtistId) -> Result<Vec<Artist>, RepoError> {
    (**self).find_referencing(id)
  }

  fn commit(&self, changes: &Changeset) -> Result<Vec<Artist>, RepoError> {
    (**self).commit(changes)
  }

  fn save_all(&self, artists: &[Artist]) -> Result<Vec<Artist>, RepoError> {
    (**self).save_all(artists)
  }
}
