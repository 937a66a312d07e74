//! Database pool construction and migrations
//!
//! SQLite behind an r2d2 pool. Every connection gets the same pragmas on
//! acquire: foreign keys on (order_items cascade with their order), WAL
//! journaling, and a busy timeout so concurrent writers queue instead of
//! failing immediately.

use anyhow::{anyhow, Context, Result};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Clone, Copy)]
struct SqlitePragmaCustomizer;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmaCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        sql_query("PRAGMA foreign_keys = ON;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        sql_query("PRAGMA journal_mode = WAL;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        // Wait up to 5 seconds for locks instead of failing immediately
        sql_query("PRAGMA busy_timeout = 5000;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        sql_query("PRAGMA synchronous = NORMAL;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        Ok(())
    }
}

/// Create the database connection pool.
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);

    let pool = r2d2::Pool::builder()
        .max_size(16)
        .connection_timeout(std::time::Duration::from_secs(30))
        .connection_customizer(Box::new(SqlitePragmaCustomizer))
        .build(manager)
        .context("Failed to create database connection pool")?;

    Ok(pool)
}

/// Run any pending embedded migrations.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!("Failed to run migrations: {e}"))?;
    Ok(())
}
