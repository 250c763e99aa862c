//! crates/catalog_core/src/access.rs
//!
//! The e-mail allow-list used to decide who may sign in.

use std::collections::HashSet;

use crate::ports::AuthorizationPolicy;

/// Authorizes identities found in a fixed set of e-mail addresses.
/// Comparison ignores case and surrounding whitespace.
#[derive(Debug, Clone, Default)]
pub struct AllowListPolicy {
    emails: HashSet<String>,
}

impl AllowListPolicy {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| normalize(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

impl AuthorizationPolicy for AllowListPolicy {
    fn is_authorized(&self, identity: &str) -> bool {
        let identity = normalize(identity);
        !identity.is_empty() && self.emails.contains(&identity)
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}
