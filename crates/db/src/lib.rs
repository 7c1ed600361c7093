//! SQLite connection pool and module migration runner.

use std::str::FromStr;

use anyhow::Context;
use bookshop_kernel::{settings::DatabaseSettings, Migration};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use sqlx::SqlitePool as DbPool;

const LEDGER_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        PRIMARY KEY (module, id)
    );
"#;

/// Open a connection pool for the configured database.
///
/// In-memory databases live as long as their connection, so they are pinned
/// to a single connection that is never recycled.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<DbPool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .foreign_keys(true);

    let in_memory = settings.url.contains(":memory:") || settings.url.contains("mode=memory");

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(settings.max_connections.max(1))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| "failed to open database pool")?;

    tracing::info!(target: "bookshop-db", in_memory, "database pool ready");
    Ok(pool)
}

/// Apply every migration not yet recorded in the `schema_migrations` ledger.
///
/// Each migration runs in its own transaction together with its ledger row.
/// Returns the number of migrations applied.
pub async fn run_migrations(
    pool: &DbPool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::raw_sql(LEDGER_DDL)
        .execute(pool)
        .await
        .with_context(|| "failed to create migration ledger")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let seen: Option<(String,)> =
            sqlx::query_as("SELECT id FROM schema_migrations WHERE module = ?1 AND id = ?2")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(pool)
                .await?;
        if seen.is_some() {
            tracing::debug!(target: "bookshop-db", %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO schema_migrations (module, id) VALUES (?1, ?2)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(target: "bookshop-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

/// Returns true when the error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
