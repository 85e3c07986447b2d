pub mod config;
pub mod connection;
pub mod error;
pub mod memory;
pub mod models;
pub mod schema;

use std::collections::HashMap;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use muzika_core::domain::{Artist, ArtistId, ArtistKind, ArtistLink, Tenure};
use muzika_core::ports::{ArtistRepository, Changeset, RepoError};

use crate::config::StorageConfig;
use crate::connection::{DbPool, create_pool, run_migrations};
use crate::error::StoreError;
use crate::models::{ArtistRow, LinkRow, NewArtistRow, NewLinkRow};

pub use config::load_sync_config;
pub use memory::InMemoryArtistRepository;

const SIDE_MEMBERSHIPS: &str = "memberships";
const SIDE_MEMBERS: &str = "members";
const SIDE_RELATED: &str = "related";

/// Repositorio de artistas sobre SQLite (Diesel).
///
/// Cada `commit` corre en una transacción `IMMEDIATE`: toma el lock de
/// escritura al empezar, comprueba la versión de cada fila y escribe todo
/// o nada.
pub struct SqliteArtistRepository {
  pool: DbPool,
}

impl SqliteArtistRepository {
  /// Abre (o crea) la base de datos y aplica las migraciones pendientes.
  pub fn open(config: &StorageConfig) -> Result<Self, RepoError> {
    let pool = create_pool(config)?;
    run_migrations(&pool)?;
    debug!(path = %config.db_path.display(), "opened artist database");
    Ok(Self { pool })
  }

  /// Abre la base de datos definida en la sección `[storage]`.
  pub fn new_from_config() -> Result<Self, RepoError> {
    let config = StorageConfig::load().map_err(|e| RepoError::Storage(e.to_string()))?;
    Self::open(&config)
  }

  fn conn(
    &self,
  ) -> Result<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>, StoreError> {
    self.pool.get().map_err(|e| StoreError::Connection(e.to_string()))
  }
}

fn artist_to_new_row(artist: &Artist, version: u64) -> NewArtistRow {
  NewArtistRow {
    id: artist.id.to_string(),
    name: artist.name.clone(),
    kind: artist.kind.to_string(),
    bio: artist.bio.clone(),
    version: version as i64,
  }
}

fn artist_to_link_rows(artist: &Artist) -> Vec<NewLinkRow> {
  let owner = artist.id.to_string();

  [(SIDE_MEMBERSHIPS, &artist.memberships), (SIDE_MEMBERS, &artist.members), (SIDE_RELATED, &artist.related)]
    .into_iter()
    .flat_map(|(side, links)| {
      let owner = owner.clone();
      links.iter().enumerate().map(move |(position, link)| NewLinkRow {
        id: Uuid::new_v4().to_string(),
        artist_id: owner.clone(),
        side: side.to_string(),
        counterpart_id: link.artist_id.to_string(),
        counterpart_name: link.name.clone(),
        year_from: link.tenure.year_from.clone(),
        year_to: link.tenure.year_to.clone(),
        position: position as i32,
      })
    })
    .collect()
}

fn parse_id(raw: &str) -> Result<ArtistId, StoreError> {
  raw.parse().map_err(|e| StoreError::Corrupt(format!("invalid artist id {raw:?}: {e}")))
}

fn row_to_artist(row: ArtistRow, links: Vec<LinkRow>) -> Result<Artist, StoreError> {
  let kind: ArtistKind = row.kind.parse().map_err(|e| StoreError::Corrupt(format!("{e}")))?;

  let mut artist = Artist {
    id: parse_id(&row.id)?,
    name: row.name,
    kind,
    bio: row.bio,
    memberships: vec![],
    members: vec![],
    related: vec![],
    version: row.version as u64,
  };

  // `links` llega ordenado por posición.
  for link in links {
    let target = match link.side.as_str() {
      SIDE_MEMBERSHIPS => &mut artist.memberships,
      SIDE_MEMBERS => &mut artist.members,
      SIDE_RELATED => &mut artist.related,
      other => return Err(StoreError::Corrupt(format!("unknown link side {other:?}"))),
    };
    target.push(ArtistLink::new(
      parse_id(&link.counterpart_id)?,
      link.counterpart_name,
      Tenure::new(link.year_from, link.year_to),
    ));
  }

  Ok(artist)
}

/// Carga artistas completos. `ids == None` carga todo el catálogo.
fn load_artists(conn: &mut SqliteConnection, ids: Option<Vec<String>>) -> Result<Vec<Artist>, StoreError> {
  use crate::schema::{artist_links, artists};

  let rows: Vec<ArtistRow> = match &ids {
    Some(ids) => artists::table
      .filter(artists::id.eq_any(ids))
      .order((artists::name, artists::id))
      .select(ArtistRow::as_select())
      .load(conn)?,
    None => artists::table.order((artists::name, artists::id)).select(ArtistRow::as_select()).load(conn)?,
  };

  let owners: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
  let link_rows: Vec<LinkRow> = artist_links::table
    .filter(artist_links::artist_id.eq_any(&owners))
    .order((artist_links::artist_id, artist_links::side, artist_links::position))
    .select(LinkRow::as_select())
    .load(conn)?;

  let mut by_owner: HashMap<String, Vec<LinkRow>> = HashMap::new();
  for link in link_rows {
    by_owner.entry(link.artist_id.clone()).or_default().push(link);
  }

  rows
    .into_iter()
    .map(|row| {
      let links = by_owner.remove(&row.id).unwrap_or_default();
      row_to_artist(row, links)
    })
    .collect()
}

fn stored_version(conn: &mut SqliteConnection, id: &str) -> Result<Option<u64>, StoreError> {
  use crate::schema::artists;

  let version: Option<i64> =
    artists::table.find(id).select(artists::version).first(conn).optional()?;
  Ok(version.map(|v| v as u64))
}

/// Inserta o actualiza un artista con sus listas. Devuelve la fila con la
/// versión nueva.
fn write_artist(conn: &mut SqliteConnection, artist: &Artist) -> Result<Artist, StoreError> {
  use crate::schema::{artist_links, artists};

  let id_str = artist.id.to_string();
  let expected = artist.version;
  let conflict = |found| StoreError::Conflict { id: artist.id, expected, found };

  if expected == 0 {
    if let Some(found) = stored_version(conn, &id_str)? {
      return Err(conflict(Some(found)));
    }
    diesel::insert_into(artists::table).values(&artist_to_new_row(artist, 1)).execute(conn)?;
  } else {
    let updated = diesel::update(
      artists::table.filter(artists::id.eq(&id_str)).filter(artists::version.eq(expected as i64)),
    )
    .set((
      artists::name.eq(&artist.name),
      artists::kind.eq(artist.kind.as_str()),
      artists::bio.eq(artist.bio.as_deref()),
      artists::version.eq(expected as i64 + 1),
      artists::updated_at.eq(diesel::dsl::sql::<diesel::sql_types::Text>("CURRENT_TIMESTAMP")),
    ))
    .execute(conn)?;

    if updated == 0 {
      return Err(conflict(stored_version(conn, &id_str)?));
    }
  }

  diesel::delete(artist_links::table.filter(artist_links::artist_id.eq(&id_str))).execute(conn)?;
  let links = artist_to_link_rows(artist);
  if !links.is_empty() {
    diesel::insert_into(artist_links::table).values(&links).execute(conn)?;
  }

  let mut saved = artist.clone();
  saved.version = expected + 1;
  Ok(saved)
}

fn delete_artist(conn: &mut SqliteConnection, id: ArtistId, expected: u64) -> Result<(), StoreError> {
  use crate::schema::{artist_links, artists};

  let id_str = id.to_string();
  let deleted = diesel::delete(
    artists::table.filter(artists::id.eq(&id_str)).filter(artists::version.eq(expected as i64)),
  )
  .execute(conn)?;

  if deleted == 0 {
    return Err(StoreError::Conflict { id, expected, found: stored_version(conn, &id_str)? });
  }

  diesel::delete(artist_links::table.filter(artist_links::artist_id.eq(&id_str))).execute(conn)?;
  Ok(())
}

impl ArtistRepository for SqliteArtistRepository {
  fn load_all(&self) -> Result<Vec<Artist>, RepoError> {
    let mut conn = self.conn()?;
    Ok(load_artists(&mut conn, None)?)
  }

  fn find_artist(&self, artist_id: ArtistId) -> Result<Option<Artist>, RepoError> {
    let mut conn = self.conn()?;
    let mut found = load_artists(&mut conn, Some(vec![artist_id.to_string()]))?;
    Ok(found.pop())
  }

  fn find_many(&self, ids: &[ArtistId]) -> Result<Vec<Artist>, RepoError> {
    if ids.is_empty() {
      return Ok(vec![]);
    }
    let mut conn = self.conn()?;
    Ok(load_artists(&mut conn, Some(ids.iter().map(ArtistId::to_string).collect()))?)
  }

  fn find_referencing(&self, artist_id: ArtistId) -> Result<Vec<Artist>, RepoError> {
    use crate::schema::artist_links;

    let mut conn = self.conn()?;
    let id = artist_id.to_string();
    let owners: Vec<String> = artist_links::table
      .filter(artist_links::counterpart_id.eq(&id))
      .filter(artist_links::artist_id.ne(&id))
      .select(artist_links::artist_id)
      .distinct()
      .load(&mut conn)
      .map_err(StoreError::from)?;

    if owners.is_empty() {
      return Ok(vec![]);
    }
    Ok(load_artists(&mut conn, Some(owners))?)
  }

  fn commit(&self, changes: &Changeset) -> Result<Vec<Artist>, RepoError> {
    if changes.is_empty() {
      return Ok(vec![]);
    }

    let mut conn = self.conn()?;
    let saved = conn.immediate_transaction(|conn| {
      let mut saved = Vec::with_capacity(changes.upserts.len());
      for artist in &changes.upserts {
        saved.push(write_artist(conn, artist)?);
      }
      for (id, expected) in &changes.deletes {
        delete_artist(conn, *id, *expected)?;
      }
      Ok::<_, StoreError>(saved)
    })?;

    debug!(upserts = saved.len(), deletes = changes.deletes.len(), "committed artist changeset");
    Ok(saved)
  }
}
