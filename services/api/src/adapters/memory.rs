//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the store ports. Selected with
//! `DATABASE_URL=memory://`; contents are lost when the process exits.

use async_trait::async_trait;
use catalog_core::domain::{AuthSession, BookData, BookRecord, User, UserCredentials};
use catalog_core::ports::{AccountStore, PortError, PortResult, RecordStore};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    books: RwLock<Vec<BookRecord>>,
    users: RwLock<HashMap<String, UserCredentials>>,
    sessions: RwLock<HashMap<String, AuthSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_all(&self) -> PortResult<Vec<BookRecord>> {
        Ok(self.books.read().await.clone())
    }

    async fn get_one(&self, id: Uuid) -> PortResult<BookRecord> {
        self.books
            .read()
            .await
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", id)))
    }

    async fn find_by_accession(&self, accession_number: &str) -> PortResult<Option<BookRecord>> {
        Ok(self
            .books
            .read()
            .await
            .iter()
            .find(|b| b.data.accession_number == accession_number)
            .cloned())
    }

    async fn create_one(&self, data: BookData) -> PortResult<BookRecord> {
        let record = BookRecord {
            id: Uuid::new_v4(),
            data,
        };
        self.books.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_one(&self, id: Uuid, data: BookData) -> PortResult<BookRecord> {
        let mut books = self.books.write().await;
        let book = books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", id)))?;
        book.data = data;
        Ok(book.clone())
    }

    async fn delete_one(&self, id: Uuid) -> PortResult<()> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|b| b.id != id);
        if books.len() == before {
            return Err(PortError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let email = email.trim().to_lowercase();
        let mut users = self.users.write().await;
        if users.contains_key(&email) {
            return Err(PortError::Unexpected(format!("User {} already exists", email)));
        }
        let credentials = UserCredentials {
            user_id: Uuid::new_v4(),
            email: email.clone(),
            hashed_password: hashed_password.to_string(),
        };
        let user = User {
            user_id: credentials.user_id,
            email: email.clone(),
        };
        users.insert(email, credentials);
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.users
            .read()
            .await
            .get(&email.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let session = AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        };
        self.sessions.write().await.insert(session.id.clone(), session);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        match self.sessions.read().await.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}
