use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::config::Config;
use crate::error::AppError;
use crate::store::history::SqliteHistory;

/// Everything the application shell shares between screens.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
}

impl AppState {
    /// Opens (creating if needed) the SQLite database and applies migrations.
    pub async fn connect(config: Config) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to open database {}: {:?}", config.database_url, e);
                AppError::from(e)
            })?;

        tracing::info!("Database connected...");

        run_migrations(&pool).await?;

        Ok(Self { pool, config })
    }

    pub fn history(&self) -> SqliteHistory {
        SqliteHistory::new(self.pool.clone())
    }
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Migrations applied successfully.");
    Ok(())
}
