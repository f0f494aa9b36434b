use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Connection, PgConnection, PgPool};
use tracing::info;

use crate::config::AppConfig;

/// Owns the Postgres connection pool. Cheap to clone, built once at startup
/// and injected through `AppState` so tests can construct their own.
#[derive(Clone, Debug)]
pub struct DbManager {
    db: PgPool,
}

impl DbManager {
    pub async fn init(config: &AppConfig) -> Result<Self> {
        info!("{:<20} - Initializing the DB pool", "init_db");
        // NOTE: Tests sometimes fail if there is more than 1 max connection. This fixes it.
        let max_cons = if cfg!(test) { 1 } else { 5 };

        let con_opts = config.db_config.connection_options();

        let db_pool = PgPoolOptions::new()
            .max_connections(max_cons)
            .acquire_timeout(Duration::from_millis(500))
            .connect_with(con_opts)
            .await
            .map_err(|_| Error::FailToCreatePool)?;

        Ok(Self { db: db_pool })
    }

    /// Creates the database named in `config` and runs the migrations on it.
    /// Integration tests point `db_name` at a throwaway database first.
    pub async fn configure_for_test(config: &AppConfig) -> Result<()> {
        let db_config = &config.db_config;
        let mut connection =
            PgConnection::connect_with(&db_config.connection_options_without_db()).await?;

        let sql = format!(r#"CREATE DATABASE "{}";"#, db_config.db_name.clone());
        sqlx::query(&sql).execute(&mut connection).await?;

        // Pool only used to migrate the DB
        let db_pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_millis(1000))
            .connect_with(db_config.connection_options())
            .await
            .map_err(|_| Error::FailToCreatePool)?;
        sqlx::migrate!("./migrations").run(&db_pool).await?;

        Ok(())
    }

    pub fn db(&self) -> &PgPool {
        &self.db
    }
}

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create db pool")]
    FailToCreatePool,
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("sqlx migration error: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
}
