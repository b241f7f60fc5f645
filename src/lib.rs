//! # WeChat Token Hub
//!
//! Caching gateway in front of the WeChat credential API. Callers fetch the
//! access token and tickets through the hub instead of hitting the upstream,
//! which rate-limits issuance and revokes a token as soon as a new one is
//! requested.
//!
//! Modules:
//! - `cache`: expiring credential store
//! - `upstream`: credential issuer trait and the WeChat client
//! - `resolver`: cache-or-issue logic with one-shot invalid-token recovery
//! - `auth`: bearer JWT verification for inbound callers
//! - `server`: axum routes, handlers and access log
//! - `config`: YAML configuration, defaults and validation

pub mod auth;
pub mod cache;
pub mod config;
pub mod helpers;
pub mod observability;
pub mod resolver;
pub mod server;
pub mod upstream;
pub mod utils;

#[cfg(test)]
pub mod tests;

pub use crate::config::settings::ServiceConfig;
pub use crate::resolver::CredentialResolver;
