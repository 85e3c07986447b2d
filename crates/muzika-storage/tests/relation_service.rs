use std::sync::atomic::{AtomicBool, Ordering};

use muzika_core::CoreError;
use muzika_core::domain::{Artist, ArtistId, ArtistLink, DeclaredLink, Relation, Tenure};
use muzika_core::ports::{ArtistRepository, Changeset, RepoError};
use muzika_core::relations::check_consistency;
use muzika_core::services::{RelationService, SyncConfig};
use muzika_storage::config::StorageConfig;
use muzika_storage::{InMemoryArtistRepository, SqliteArtistRepository};
use tempfile::{TempDir, tempdir};

fn sqlite() -> (TempDir, SqliteArtistRepository) {
  let tmp = tempdir().unwrap();
  let repo = SqliteArtistRepository::open(&StorageConfig::at(tmp.path().join("muzika.db"))).unwrap();
  (tmp, repo)
}

fn declare(id: ArtistId, from: &str, to: &str) -> DeclaredLink {
  DeclaredLink::new(id, Tenure::new(from, to))
}

fn get<R: ArtistRepository>(service: &RelationService<R>, id: ArtistId) -> Artist {
  service.get_artist(id).unwrap().unwrap()
}

/// Escenarios comunes, corridos contra cualquier repositorio.
fn membership_lifecycle<R: ArtistRepository>(repo: R) {
  let service = RelationService::new(repo, SyncConfig::default());
  let g1 = service.save_artist(&Artist::group("G1"), &[], &[]).unwrap();
  let g2 = service.save_artist(&Artist::group("G2"), &[], &[]).unwrap();

  let s1 = Artist::solo("S1");
  let s1 = service.save_artist(&s1, &[declare(g1.id, "2010", ""), declare(g2.id, "2012", "2015")], &[]).unwrap();

  assert_eq!(get(&service, g1.id).members, vec![ArtistLink::new(s1.id, "S1", Tenure::new("2010", ""))]);
  assert_eq!(get(&service, g2.id).members[0].tenure, Tenure::new("2012", "2015"));

  // Se quita G1 y se conserva G2.
  let g2_before = get(&service, g2.id);
  service.save_artist(&s1, &[declare(g2.id, "2012", "2015")], &[]).unwrap();

  assert!(get(&service, g1.id).members.is_empty());
  assert_eq!(get(&service, g2.id).members, g2_before.members);
  assert_eq!(get(&service, g2.id).version, g2_before.version, "unchanged counterpart must not be rewritten");
  assert!(service.audit().unwrap().is_empty());
}

#[test]
fn membership_lifecycle_in_memory() {
  membership_lifecycle(InMemoryArtistRepository::new());
}

#[test]
fn membership_lifecycle_sqlite() {
  let (_tmp, repo) = sqlite();
  membership_lifecycle(repo);
}

#[test]
fn group_edit_prunes_solo_membership() {
  let (_tmp, repo) = sqlite();
  let service = RelationService::new(repo, SyncConfig::default());
  let g1 = service.save_artist(&Artist::group("G1"), &[], &[]).unwrap();
  let s1 = service.save_artist(&Artist::solo("S1"), &[declare(g1.id, "2010", "")], &[]).unwrap();

  service.save_artist(&get(&service, g1.id), &[], &[]).unwrap();

  assert!(get(&service, s1.id).memberships.is_empty());
}

#[test]
fn related_artists_are_mirrored() {
  let (_tmp, repo) = sqlite();
  let service = RelationService::new(repo, SyncConfig::default());
  let b = service.save_artist(&Artist::group("B"), &[], &[]).unwrap();
  let a = service.save_artist(&Artist::solo("A"), &[], &[declare(b.id, "2005", "2008")]).unwrap();

  let b = get(&service, b.id);
  assert_eq!(b.link_to(Relation::Related, a.id).unwrap().tenure, Tenure::new("2005", "2008"));
}

#[test]
fn dangling_declaration_is_saved_as_soft_reference() {
  let service = RelationService::new(InMemoryArtistRepository::new(), SyncConfig::default());
  let ghost = ArtistId::new();

  let s1 = service.save_artist(&Artist::solo("S1"), &[declare(ghost, "2010", "")], &[]).unwrap();

  assert_eq!(s1.memberships.len(), 1);
  assert_eq!(service.list_artists().unwrap().len(), 1);
}

#[test]
fn delete_scrubs_back_references() {
  let (_tmp, repo) = sqlite();
  let service = RelationService::new(repo, SyncConfig::default());
  let g1 = service.save_artist(&Artist::group("G1"), &[], &[]).unwrap();
  let friend = service.save_artist(&Artist::solo("Friend"), &[], &[]).unwrap();
  let s1 = service
    .save_artist(&Artist::solo("S1"), &[declare(g1.id, "2010", "")], &[declare(friend.id, "", "")])
    .unwrap();

  service.delete_artist(s1.id).unwrap();

  assert!(service.get_artist(s1.id).unwrap().is_none());
  assert!(get(&service, g1.id).members.is_empty());
  assert!(get(&service, friend.id).related.is_empty());
}

#[test]
fn deleting_unknown_artist_is_not_found() {
  let service = RelationService::new(InMemoryArtistRepository::new(), SyncConfig::default());

  let err = service.delete_artist(ArtistId::new()).unwrap_err();

  assert!(matches!(err, CoreError::NotFound));
}

#[test]
fn rebuild_repairs_one_sided_links() {
  let g1 = Artist::group("G1");
  let mut s1 = Artist::solo("S1");
  s1.memberships.push(ArtistLink::new(g1.id, "G1", Tenure::new("2010", "")));
  let mut a = Artist::solo("A");
  a.related.push(ArtistLink::new(s1.id, "S1", Tenure::new("2000", "")));
  let repo = InMemoryArtistRepository::with_artists(vec![g1.clone(), s1.clone(), a.clone()]);
  let service = RelationService::new(repo, SyncConfig::default());

  let report = service.rebuild_all().unwrap();

  assert_eq!(report.found.len(), 2);
  assert!(report.remaining.is_empty());
  assert!(report.changed > 0);
  assert!(check_consistency(&service.list_artists().unwrap()).is_empty());
  assert_eq!(get(&service, g1.id).members[0].artist_id, s1.id);
}

#[test]
fn rebuild_of_consistent_catalog_writes_nothing() {
  let service = RelationService::new(InMemoryArtistRepository::new(), SyncConfig::default());
  let g1 = service.save_artist(&Artist::group("G1"), &[], &[]).unwrap();
  service.save_artist(&Artist::solo("S1"), &[declare(g1.id, "2010", "")], &[]).unwrap();
  let before = service.list_artists().unwrap();

  let report = service.rebuild_all().unwrap();

  assert_eq!(report.changed, 0);
  assert_eq!(service.list_artists().unwrap(), before);
}

/// Repositorio que simula otro guardado justo antes de los primeros
/// `commit`, tocando al grupo contraparte.
struct RacingRepo {
  inner: InMemoryArtistRepository,
  victim: ArtistId,
  raced: AtomicBool,
  race_every_time: bool,
}

impl ArtistRepository for RacingRepo {
  fn load_all(&self) -> Result<Vec<Artist>, RepoError> {
    self.inner.load_all()
  }

  fn find_artist(&self, id: ArtistId) -> Result<Option<Artist>, RepoError> {
    self.inner.find_artist(id)
  }

  fn find_many(&self, ids: &[ArtistId]) -> Result<Vec<Artist>, RepoError> {
    self.inner.find_many(ids)
  }

  fn find_referencing(&self, id: ArtistId) -> Result<Vec<Artist>, RepoError> {
    self.inner.find_referencing(id)
  }

  fn commit(&self, changes: &Changeset) -> Result<Vec<Artist>, RepoError> {
    if self.race_every_time || !self.raced.swap(true, Ordering::SeqCst) {
      let mut victim = self.inner.find_artist(self.victim)?.unwrap();
      victim.bio = Some("edited concurrently".into());
      self.inner.commit(&Changeset::upserting(vec![victim]))?;
    }
    self.inner.commit(changes)
  }
}

#[test]
fn conflicting_save_is_retried() {
  let g1 = Artist::group("G1");
  let repo = RacingRepo {
    inner: InMemoryArtistRepository::with_artists(vec![g1.clone()]),
    victim: g1.id,
    raced: AtomicBool::new(false),
    race_every_time: false,
  };
  let service = RelationService::new(repo, SyncConfig { max_attempts: 3 });

  let s1 = service.save_artist(&Artist::solo("S1"), &[declare(g1.id, "2010", "")], &[]).unwrap();

  let g1 = get(&service, g1.id);
  assert_eq!(g1.bio.as_deref(), Some("edited concurrently"));
  assert_eq!(g1.members[0].artist_id, s1.id);
}

#[test]
fn exhausted_retries_surface_conflict_and_apply_nothing() {
  let g1 = Artist::group("G1");
  let repo = RacingRepo {
    inner: InMemoryArtistRepository::with_artists(vec![g1.clone()]),
    victim: g1.id,
    raced: AtomicBool::new(false),
    race_every_time: true,
  };
  let service = RelationService::new(repo, SyncConfig { max_attempts: 2 });
  let s1 = Artist::solo("S1");

  let err = service.save_artist(&s1, &[declare(g1.id, "2010", "")], &[]).unwrap_err();

  assert!(matches!(err, CoreError::Conflict(_)));
  assert!(service.get_artist(s1.id).unwrap().is_none());
  assert!(get(&service, g1.id).members.is_empty());
}

#[test]
fn concurrent_saves_on_shared_group_all_land() {
  let (_tmp, repo) = sqlite();
  let service = RelationService::new(repo, SyncConfig { max_attempts: 50 });
  let group = service.save_artist(&Artist::group("Shared"), &[], &[]).unwrap();

  let solos: Vec<Artist> = (0..6).map(|i| Artist::solo(format!("Solo {i}"))).collect();

  std::thread::scope(|scope| {
    for solo in &solos {
      let service = &service;
      scope.spawn(move || {
        service.save_artist(solo, &[declare(group.id, "2020", "")], &[]).unwrap();
      });
    }
  });

  let group = get(&service, group.id);
  assert_eq!(group.members.len(), solos.len());
  assert!(service.audit().unwrap().is_empty());
}
