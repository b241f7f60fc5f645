pub mod access_log;
pub mod handlers;
pub mod server;
