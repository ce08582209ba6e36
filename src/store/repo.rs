use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::warn;
use uuid::Uuid;

use super::{
    repo_types::{NewUser, User, UserRow},
    StoreError, UserStore,
};

const USER_COLUMNS: &str = "id, email, name, password_hash, role, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

/// A unique violation on `users` can only come from the email index.
fn insert_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::DuplicateEmail,
        other => StoreError::Database(other),
    }
}

impl PgUserStore {
    /// Wraps an existing pool; migrations must already be applied.
    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }

    /// Connects and applies the embedded migrations. Failure here is fatal
    /// for the caller.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        Ok(Self::from_pool(db))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        // The unique index on lower(email) makes this the uniqueness check.
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            let err = insert_error(e);
            if matches!(err, StoreError::DuplicateEmail) {
                warn!(email = %user.email, "unique violation on insert");
            }
            err
        })?;
        Ok(User::try_from(row)?)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter()
            .map(|row| User::try_from(row).map_err(StoreError::from))
            .collect()
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM users").execute(&self.db).await?;
        Ok(result.rows_affected())
    }
}
