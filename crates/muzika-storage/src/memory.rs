use std::sync::RwLock;

use muzika_core::domain::{Artist, ArtistId};
use muzika_core::ports::{ArtistRepository, Changeset, RepoError};

/// Repositorio en memoria con las mismas garantías que el de SQLite.
///
/// Todo el `Changeset` se valida y aplica bajo un único lock de escritura.
/// Sirve para tests y para importaciones que no necesitan persistir.
#[derive(Debug, Default)]
pub struct InMemoryArtistRepository {
  rows: RwLock<Vec<Artist>>,
}

impl InMemoryArtistRepository {
  pub fn new() -> Self {
    Self::default()
  }

  /// Crea el repositorio con filas ya guardadas (versión mínima 1).
  pub fn with_artists(artists: Vec<Artist>) -> Self {
    let rows = artists
      .into_iter()
      .map(|mut a| {
        a.version = a.version.max(1);
        a
      })
      .collect();
    Self { rows: RwLock::new(rows) }
  }

  fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Artist>>, RepoError> {
    self.rows.read().map_err(|_| RepoError::Storage("artist store lock poisoned".to_string()))
  }
}

fn conflict(rows: &[Artist], id: ArtistId, expected: u64) -> RepoError {
  let found = rows.iter().find(|a| a.id == id).map(|a| a.version);
  RepoError::Conflict { id, expected, found }
}

impl ArtistRepository for InMemoryArtistRepository {
  fn load_all(&self) -> Result<Vec<Artist>, RepoError> {
    Ok(self.read()?.clone())
  }

  fn find_artist(&self, id: ArtistId) -> Result<Option<Artist>, RepoError> {
    Ok(self.read()?.iter().find(|a| a.id == id).cloned())
  }

  fn find_many(&self, ids: &[ArtistId]) -> Result<Vec<Artist>, RepoError> {
    Ok(self.read()?.iter().filter(|a| ids.contains(&a.id)).cloned().collect())
  }

  fn find_referencing(&self, id: ArtistId) -> Result<Vec<Artist>, RepoError> {
    Ok(self.read()?.iter().filter(|a| a.id != id && a.references(id)).cloned().collect())
  }

  fn commit(&self, changes: &Changeset) -> Result<Vec<Artist>, RepoError> {
    let mut rows =
      self.rows.write().map_err(|_| RepoError::Storage("artist store lock poisoned".to_string()))?;

    // Validar todo antes de tocar nada.
    for artist in &changes.upserts {
      let stored = rows.iter().find(|a| a.id == artist.id).map(|a| a.version);
      let ok = match stored {
        None => artist.version == 0,
        Some(v) => v == artist.version && artist.version > 0,
      };
      if !ok {
        return Err(conflict(&rows, artist.id, artist.version));
      }
    }
    for (id, expected) in &changes.deletes {
      if !rows.iter().any(|a| a.id == *id && a.version == *expected) {
        return Err(conflict(&rows, *id, *expected));
      }
    }

    let mut saved = Vec::with_capacity(changes.upserts.len());
    for artist in &changes.upserts {
      let mut row = artist.clone();
      row.version += 1;
      match rows.iter_mut().find(|a| a.id == row.id) {
        Some(slot) => *slot = row.clone(),
        None => rows.push(row.clone()),
      }
      saved.push(row);
    }
    rows.retain(|a| !changes.deletes.iter().any(|(id, _)| *id == a.id));

    Ok(saved)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insert_then_update_bumps_version() {
    let repo = InMemoryArtistRepository::new();
    let artist = Artist::solo("Jurga");

    let saved = repo.commit(&Changeset::upserting(vec![artist.clone()])).unwrap();
    assert_eq!(saved[0].version, 1);

    let saved = repo.commit(&Changeset::upserting(saved)).unwrap();
    assert_eq!(saved[0].version, 2);
    assert_eq!(repo.find_artist(artist.id).unwrap().unwrap().version, 2);
  }

  #[test]
  fn stale_version_rejects_whole_changeset() {
    let a = Artist::solo("A");
    let b = Artist::solo("B");
    let repo = InMemoryArtistRepository::with_artists(vec![a.clone(), b.clone()]);

    let mut fresh = a.clone();
    fresh.version = 1;
    fresh.name = "A2".into();
    let stale = b.clone(); // version 0, pero ya existe

    let err = repo.commit(&Changeset::upserting(vec![fresh, stale])).unwrap_err();

    assert!(matches!(err, RepoError::Conflict { found: Some(1), .. }));
    assert_eq!(repo.find_artist(a.id).unwrap().unwrap().name, "A");
  }

  #[test]
  fn find_referencing_skips_self_links() {
    use muzika_core::domain::{ArtistLink, Tenure};

    let mut looped = Artist::solo("Looped");
    looped.related.push(ArtistLink::new(looped.id, "Looped", Tenure::default()));
    let mut fan = Artist::solo("Fan");
    fan.related.push(ArtistLink::new(looped.id, "Looped", Tenure::default()));
    let repo = InMemoryArtistRepository::with_artists(vec![looped.clone(), fan.clone()]);

    let owners = repo.find_referencing(looped.id).unwrap();

    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].id, fan.id);
  }

  #[test]
  fn delete_requires_matching_version() {
    let a = Artist::solo("A");
    let repo = InMemoryArtistRepository::with_artists(vec![a.clone()]);

    let err = repo.commit(&Changeset { upserts: vec![], deletes: vec![(a.id, 7)] }).unwrap_err();
    assert!(matches!(err, RepoError::Conflict { expected: 7, found: Some(1), .. }));

    repo.commit(&Changeset { upserts: vec![], deletes: vec![(a.id, 1)] }).unwrap();
    assert!(repo.find_artist(a.id).unwrap().is_none());
  }
}
