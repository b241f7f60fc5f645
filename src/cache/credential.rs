use std::fmt;

use crate::helpers::time::{expires_at_millis, now_millis};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const TICKET_KEY_PREFIX: &str = "ticket_";

/// Cached credential value with its absolute expiry
#[derive(Debug, Clone)]
pub struct CachedCredential {
    pub value: String,
    pub expires_at_ms: i64, // UNIX timestamp, milliseconds
}

impl CachedCredential {
    pub fn new(value: String, lifetime_seconds: i64) -> Self {
        Self {
            value,
            expires_at_ms: expires_at_millis(lifetime_seconds),
        }
    }

    pub fn is_usable(&self) -> bool {
        now_millis() < self.expires_at_ms
    }
}

/// Which credential a caller asks for. Ticket types are opaque upstream strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    AccessToken,
    Ticket(String),
}

impl CredentialKind {
    /// Store slot for this kind.
    pub fn cache_key(&self) -> String {
        match self {
            CredentialKind::AccessToken => ACCESS_TOKEN_KEY.to_owned(),
            CredentialKind::Ticket(ticket_type) => format!("{}{}", TICKET_KEY_PREFIX, ticket_type),
        }
    }

    /// Metric label, bounded to two values.
    pub fn label(&self) -> &'static str {
        match self {
            CredentialKind::AccessToken => "access_token",
            CredentialKind::Ticket(_) => "ticket",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::AccessToken => write!(f, "access token"),
            CredentialKind::Ticket(ticket_type) => write!(f, "ticket '{}'", ticket_type),
        }
    }
}
