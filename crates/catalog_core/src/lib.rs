pub mod access;
pub mod card;
pub mod catalog;
pub mod coercion;
pub mod dashboard;
pub mod domain;
pub mod import;
pub mod ports;
pub mod schema;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use access::AllowListPolicy;
pub use domain::{AuthSession, BookData, BookRecord, CardType, RawCell, RawRow, User, UserCredentials};
pub use ports::{
    AccountStore, AuthorizationPolicy, PortError, PortResult, RecordStore, SpreadsheetReader,
};
pub use validation::{RecordValidator, Violation};
