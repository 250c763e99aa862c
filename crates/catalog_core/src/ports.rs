//! crates/catalog_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the catalog's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the record store, the account store and spreadsheet decoding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{BookData, BookRecord, RawRow, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, file decoding).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Accession number {0} already exists")]
    Duplicate(String),
    #[error("Could not read spreadsheet: {0}")]
    Parse(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for catalog records.
///
/// Listing returns a full snapshot; filtering, sorting and paging happen in
/// [`crate::catalog::get_many`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_all(&self) -> PortResult<Vec<BookRecord>>;

    async fn get_one(&self, id: Uuid) -> PortResult<BookRecord>;

    /// Looks up a live record by accession number (exact match).
    async fn find_by_accession(&self, accession_number: &str) -> PortResult<Option<BookRecord>>;

    /// Stores a new record; the store assigns the identifier.
    async fn create_one(&self, data: BookData) -> PortResult<BookRecord>;

    async fn update_one(&self, id: Uuid, data: BookData) -> PortResult<BookRecord>;

    async fn delete_one(&self, id: Uuid) -> PortResult<()>;
}

/// Persistence for user accounts and browser login sessions.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves an unexpired session to its user.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

/// Decodes an uploaded spreadsheet into data rows keyed by the header row.
pub trait SpreadsheetReader: Send + Sync {
    /// `file_name` is used to pick the format; malformed input yields [`PortError::Parse`].
    fn read_rows(&self, file_name: &str, bytes: &[u8]) -> PortResult<Vec<RawRow>>;
}

/// Decides whether an authenticated identity may use the catalog.
pub trait AuthorizationPolicy: Send + Sync {
    fn is_authorized(&self, identity: &str) -> bool;
}
