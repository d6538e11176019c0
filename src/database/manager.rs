use std::time::Duration;

use sqlx::{error::ErrorKind, postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the data access layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    ConstraintViolation(String),

    #[error(transparent)]
    StoreUnavailable(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classify a driver error raised by a write. Only integrity-constraint
    /// rejections are the caller's fault; missing tables, permissions and
    /// connection trouble are store failures.
    pub fn from_write(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if is_constraint(&db.kind()) => {
                DatabaseError::ConstraintViolation(db.message().to_string())
            }
            other => DatabaseError::StoreUnavailable(other),
        }
    }
}

fn is_constraint(kind: &ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation
    )
}

/// Owns the connection pool for the users database.
///
/// Built once in `main` and handed to the repository; `close` releases the
/// pool on shutdown.
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let connection_string = Self::build_connection_string(&config.url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await?;

        info!("Created database pool for: {}", Self::redacted(&connection_string));
        Ok(Self { pool })
    }

    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    fn build_connection_string(raw: &str) -> Result<String, DatabaseError> {
        if raw.trim().is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }

        let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => {}
            _ => return Err(DatabaseError::InvalidDatabaseUrl),
        }
        Ok(url.into())
    }

    /// Connection string with the password stripped, for logs
    fn redacted(connection_string: &str) -> String {
        match url::Url::parse(connection_string) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.into()
            }
            Err(_) => "<invalid url>".to_string(),
        }
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}
