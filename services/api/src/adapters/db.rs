//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `RecordStore` and `AccountStore` ports from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use catalog_core::domain::{BookData, BookRecord, User, UserCredentials};
use catalog_core::ports::{AccountStore, PortError, PortResult, RecordStore};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the store ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct BookRow {
    id: Uuid,
    data: Json<BookData>,
}
impl BookRow {
    fn to_domain(self) -> BookRecord {
        BookRecord {
            id: self.id,
            data: self.data.0,
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserRow {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

//=========================================================================================
// `RecordStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecordStore for DbAdapter {
    async fn list_all(&self) -> PortResult<Vec<BookRecord>> {
        let rows = sqlx::query_as::<_, BookRow>("SELECT id, data FROM books ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(rows.into_iter().map(BookRow::to_domain).collect())
    }

    async fn get_one(&self, id: Uuid) -> PortResult<BookRecord> {
        let row = sqlx::query_as::<_, BookRow>("SELECT id, data FROM books WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected(format!("Book {} not found", id)))?;
        Ok(row.to_domain())
    }

    async fn find_by_accession(&self, accession_number: &str) -> PortResult<Option<BookRecord>> {
        let row = sqlx::query_as::<_, BookRow>(
            "SELECT id, data FROM books WHERE accession_number = $1 LIMIT 1",
        )
        .bind(accession_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.map(BookRow::to_domain))
    }

    async fn create_one(&self, data: BookData) -> PortResult<BookRecord> {
        let row = sqlx::query_as::<_, BookRow>(
            "INSERT INTO books (id, accession_number, data) VALUES ($1, $2, $3) RETURNING id, data",
        )
        .bind(Uuid::new_v4())
        .bind(&data.accession_number)
        .bind(Json(&data))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.to_domain())
    }

    async fn update_one(&self, id: Uuid, data: BookData) -> PortResult<BookRecord> {
        let row = sqlx::query_as::<_, BookRow>(
            "UPDATE books SET accession_number = $2, data = $3, updated_at = NOW() WHERE id = $1 RETURNING id, data",
        )
        .bind(id)
        .bind(&data.accession_number)
        .bind(Json(&data))
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Book {} not found", id)))?;
        Ok(row.to_domain())
    }

    async fn delete_one(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `AccountStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountStore for DbAdapter {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let (user_id, email): (Uuid, String) = sqlx::query_as(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email.trim().to_lowercase())
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(User { user_id, email })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("User {} not found", email)))?;
        Ok(row.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let (user_id,): (Uuid,) =
            sqlx::query_as("SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| match e {
                    sqlx::Error::RowNotFound => PortError::Unauthorized,
                    _ => PortError::Unexpected(e.to_string()),
                })?;
        Ok(user_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
