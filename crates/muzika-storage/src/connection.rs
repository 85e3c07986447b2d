//! Pool de conexiones SQLite y migraciones embebidas.

use diesel::SqliteConnection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::config::StorageConfig;
use crate::error::StoreError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// PRAGMAs que se aplican a cada conexión nueva del pool.
#[derive(Debug, Clone)]
struct SqlitePragmas {
  journal_mode: Option<String>,
  busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    let mut sql = format!("PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;", self.busy_timeout_ms);
    if let Some(mode) = &self.journal_mode {
      sql.push_str(&format!(" PRAGMA journal_mode = {mode};"));
    }
    conn.batch_execute(&sql).map_err(diesel::r2d2::Error::QueryError)
  }
}

pub fn create_pool(config: &StorageConfig) -> Result<DbPool, StoreError> {
  if let Some(parent) = config.db_path.parent() {
    std::fs::create_dir_all(parent).map_err(|e| StoreError::Connection(e.to_string()))?;
  }

  let url = config.db_path.to_string_lossy().to_string();
  let manager = ConnectionManager::<SqliteConnection>::new(url);
  let pragmas =
    SqlitePragmas { journal_mode: config.journal_mode.clone(), busy_timeout_ms: config.busy_timeout_ms };

  Pool::builder()
    .max_size(config.pool_size.max(1))
    .connection_customizer(Box::new(pragmas))
    .build(manager)
    .map_err(|e| StoreError::Connection(e.to_string()))
}

pub fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
  let mut conn = pool.get().map_err(|e| StoreError::Connection(e.to_string()))?;
  conn.run_pending_migrations(MIGRATIONS).map_err(|e| StoreError::Migration(e.to_string()))?;
  Ok(())
}
