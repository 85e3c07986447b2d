use muzika_config::LoggingConfig;
use muzika_core::domain::{Artist, DeclaredLink, Tenure};
use muzika_core::services::RelationService;
use muzika_storage::{SqliteArtistRepository, load_sync_config};

fn main() {
  LoggingConfig::load().unwrap_or_default().init();

  // Usa la base de datos de la sección [storage] de muzika.toml
  let repo = SqliteArtistRepository::new_from_config().expect("failed to open database");
  let service = RelationService::new(repo, load_sync_config().unwrap_or_default());

  let group = service.save_artist(&Artist::group("Antis"), &[], &[]).expect("failed to save group");

  let solo = Artist::solo("Algirdas Kaušpėdas");
  let membership = [DeclaredLink::new(group.id, Tenure::new("1984", ""))];
  let solo = service.save_artist(&solo, &membership, &[]).expect("failed to save solo artist");

  println!("Saved {} ({}) and {} ({})", solo.name, solo.id, group.name, group.id);

  let loaded = service.get_artist(group.id).expect("failed to load group");
  println!("Group from DB: {loaded:?}");

  let issues = service.audit().expect("failed to audit catalog");
  println!("Inconsistencies: {}", issues.len());
}
