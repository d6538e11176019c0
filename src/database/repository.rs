use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::database::manager::DatabaseError;
use crate::database::models::user::{NewUser, User, UserPatch};
use crate::database::query_builder::UpdateBuilder;

const TABLE_NAME: &str = "users";
const USER_COLUMNS: &[&str] = &["id", "name", "login", "password"];

/// Operations the HTTP layer needs from user storage
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users in store order; empty when there are none
    async fn list_all(&self) -> Result<Vec<User>, DatabaseError>;

    async fn get_by_id(&self, id: i32) -> Result<User, DatabaseError>;

    /// Inserts a row and returns the id assigned by the store
    async fn insert(&self, user: &NewUser) -> Result<i32, DatabaseError>;

    async fn delete(&self, id: i32) -> Result<(), DatabaseError>;

    /// Overwrites every mutable column of the row matching `user.id`
    async fn replace(&self, user: &User) -> Result<(), DatabaseError>;

    /// Updates only the supplied fields and returns the full row
    async fn patch(&self, id: i32, patch: &UserPatch) -> Result<User, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

pub(crate) fn not_found(id: i32) -> DatabaseError {
    DatabaseError::NotFound(format!("user {} not found", id))
}

pub(crate) fn empty_patch() -> DatabaseError {
    DatabaseError::InvalidArgument("no fields to update".to_string())
}

/// PostgreSQL-backed user storage
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn list_all(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>("SELECT id, name, login, password FROM users")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn get_by_id(&self, id: i32) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT id, name, login, password FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn insert(&self, user: &NewUser) -> Result<i32, DatabaseError> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO users (name, login, password) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&user.name)
        .bind(&user.login)
        .bind(&user.password)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_write)?;

        debug!("Inserted user {}", id);
        Ok(id)
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            warn!("Delete matched no user with id {}", id);
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn replace(&self, user: &User) -> Result<(), DatabaseError> {
        let result =
            sqlx::query("UPDATE users SET name = $1, login = $2, password = $3 WHERE id = $4")
                .bind(&user.name)
                .bind(&user.login)
                .bind(&user.password)
                .bind(user.id)
                .execute(&self.pool)
                .await
                .map_err(DatabaseError::from_write)?;

        if result.rows_affected() == 0 {
            warn!("Replace matched no user with id {}", user.id);
            return Err(not_found(user.id));
        }
        Ok(())
    }

    async fn patch(&self, id: i32, patch: &UserPatch) -> Result<User, DatabaseError> {
        if patch.is_empty() {
            return Err(empty_patch());
        }

        let mut builder = UpdateBuilder::new(TABLE_NAME)?;
        for (column, value) in patch.fields() {
            builder = builder.set(column, value);
        }
        let sql = builder.returning(USER_COLUMNS).build()?;
        debug!("Patching user {}: {}", id, sql.query);

        let mut query = sqlx::query_as::<_, User>(&sql.query);
        for param in &sql.params {
            query = query.bind(*param);
        }

        query
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_write)?
            .ok_or_else(|| not_found(id))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
