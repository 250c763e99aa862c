//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use catalog_core::ports::{AccountStore, AuthorizationPolicy, RecordStore, SpreadsheetReader};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub books: Arc<dyn RecordStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub policy: Arc<dyn AuthorizationPolicy>,
    pub spreadsheet: Arc<dyn SpreadsheetReader>,
    pub config: Arc<Config>,
}
