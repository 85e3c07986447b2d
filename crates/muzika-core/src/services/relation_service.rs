use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{Artist, ArtistId, DeclaredLink};
use crate::errors::CoreError;
use crate::ports::{ArtistRepository, Changeset};
use crate::relations::{Inconsistency, RelationSynchronizer, check_consistency};

/// Ajustes del servicio de relaciones (sección `[relations]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
  /// Intentos máximos cuando otro guardado toca las mismas filas.
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
  3
}

impl Default for SyncConfig {
  fn default() -> Self {
    SyncConfig { max_attempts: default_max_attempts() }
  }
}

/// Resultado de [`RelationService::rebuild_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
  /// Inconsistencias encontradas antes de reconstruir.
  pub found: Vec<Inconsistency>,
  /// Inconsistencias que siguen ahí después (debería estar vacío).
  pub remaining: Vec<Inconsistency>,
  /// Artistas cuyo contenido cambió.
  pub changed: usize,
}

pub struct RelationService<R>
where
  R: ArtistRepository,
{
  repo: R,
  config: SyncConfig,
}

impl<R> RelationService<R>
where
  R: ArtistRepository,
{
  pub fn new(repo: R, config: SyncConfig) -> Self {
    Self { repo, config }
  }

  pub fn repository(&self) -> &R {
    &self.repo
  }

  // -------- COMMAND (write) --------

  /// Guarda un artista y propaga sus relaciones declaradas a los
  /// contrapartes, todo en una sola transacción.
  ///
  /// - lee sólo las filas afectadas: el artista, sus contrapartes
  ///   declarados y quienes hoy apuntan a él,
  /// - reconcilia en memoria,
  /// - escribe las filas que cambiaron con control de versión.
  ///
  /// Si otro guardado toca alguna de esas filas entre la lectura y la
  /// escritura, se vuelve a leer y se reintenta hasta `max_attempts`. La
  /// `version` que traiga `artist` se ignora: el editor es la autoridad
  /// sobre su propia fila.
  pub fn save_artist(
    &self,
    artist: &Artist,
    declared_membership: &[DeclaredLink],
    declared_related: &[DeclaredLink],
  ) -> Result<Artist, CoreError> {
    self.retrying("save_artist", || self.try_save(artist, declared_membership, declared_related))
  }

  /// Borra un artista y limpia las referencias que otros tienen hacia él
  /// en la misma transacción.
  pub fn delete_artist(&self, id: ArtistId) -> Result<(), CoreError> {
    self.retrying("delete_artist", || self.try_delete(id))
  }

  /// Recorre el catálogo completo y completa las mitades que faltan.
  /// Pensado para importaciones y datos heredados.
  ///
  /// Una relación presente en cualquiera de los dos extremos se conserva.
  /// Cuando los intervalos se contradicen, gana el artista que aparece
  /// primero en `load_all`.
  pub fn rebuild_all(&self) -> Result<RebuildReport, CoreError> {
    self.retrying("rebuild_all", || {
      let snapshot = self.repo.load_all()?;
      let found = check_consistency(&snapshot);

      let working = RelationSynchronizer::repair(&snapshot);
      let remaining = check_consistency(&working);
      let changed = working.iter().zip(&snapshot).filter(|(after, before)| after != before).count();

      if changed > 0 {
        self.repo.save_all(&working)?;
      }

      info!(found = found.len(), remaining = remaining.len(), changed, "rebuilt artist relations");
      for issue in &remaining {
        warn!(%issue, "relation still inconsistent after rebuild");
      }

      Ok(RebuildReport { found, remaining, changed })
    })
  }

  // -------- QUERY (read) --------

  pub fn list_artists(&self) -> Result<Vec<Artist>, CoreError> {
    Ok(self.repo.load_all()?)
  }

  pub fn get_artist(&self, id: ArtistId) -> Result<Option<Artist>, CoreError> {
    Ok(self.repo.find_artist(id)?)
  }

  /// Audita el catálogo completo sin modificarlo.
  pub fn audit(&self) -> Result<Vec<Inconsistency>, CoreError> {
    Ok(check_consistency(&self.repo.load_all()?))
  }

  // -------- internals --------

  fn try_save(
    &self,
    artist: &Artist,
    declared_membership: &[DeclaredLink],
    declared_related: &[DeclaredLink],
  ) -> Result<Artist, CoreError> {
    let counterparts = declared_membership.iter().chain(declared_related).filter_map(|d| d.counterpart_id);
    let scope = self.load_scope(artist.id, counterparts)?;

    let mut edited = artist.clone();
    edited.version = scope.iter().find(|a| a.id == artist.id).map_or(0, |a| a.version);

    let next = RelationSynchronizer::reconcile_all(&scope, &edited, declared_membership, declared_related);
    let changes = Changeset::upserting(changed_rows(&scope, &next, Some(artist.id)));

    let saved = self.repo.commit(&changes)?;
    let row = saved.into_iter().find(|a| a.id == artist.id).ok_or(CoreError::NotFound)?;

    info!(artist = %row.id, version = row.version, touched = changes.upserts.len(), "saved artist with relations");
    Ok(row)
  }

  fn try_delete(&self, id: ArtistId) -> Result<(), CoreError> {
    let target = self.repo.find_artist(id)?.ok_or(CoreError::NotFound)?;
    let scope = self.load_scope(id, std::iter::empty())?;

    let next = RelationSynchronizer::detach(&scope, id);
    let changes = Changeset { upserts: changed_rows(&scope, &next, None), deletes: vec![(id, target.version)] };

    self.repo.commit(&changes)?;

    info!(artist = %id, scrubbed = changes.upserts.len(), "deleted artist");
    Ok(())
  }

  /// Filas que una reconciliación de `id` puede tocar.
  fn load_scope(
    &self,
    id: ArtistId,
    counterparts: impl Iterator<Item = ArtistId>,
  ) -> Result<Vec<Artist>, CoreError> {
    let mut ids = vec![id];
    for c in counterparts {
      if !ids.contains(&c) {
        ids.push(c);
      }
    }

    let mut scope = self.repo.find_many(&ids)?;
    let mut seen: HashSet<ArtistId> = scope.iter().map(|a| a.id).collect();
    for artist in self.repo.find_referencing(id)? {
      if seen.insert(artist.id) {
        scope.push(artist);
      }
    }

    Ok(scope)
  }

  fn retrying<T>(
    &self,
    op: &'static str,
    mut attempt: impl FnMut() -> Result<T, CoreError>,
  ) -> Result<T, CoreError> {
    let max_attempts = self.config.max_attempts.max(1);
    let mut tries = 1;

    loop {
      match attempt() {
        Err(CoreError::Conflict(reason)) if tries < max_attempts => {
          warn!(op, attempt = tries, %reason, "concurrent update, retrying");
          tries += 1;
        }
        other => return other,
      }
    }
  }
}

/// Filas de `next` que no existen o difieren en `before`.
///
/// `always` se incluye aunque no haya cambiado.
fn changed_rows(before: &[Artist], next: &[Artist], always: Option<ArtistId>) -> Vec<Artist> {
  next
    .iter()
    .filter(|row| Some(row.id) == always || !before.iter().any(|b| b == *row))
    .cloned()
    .collect()
}
