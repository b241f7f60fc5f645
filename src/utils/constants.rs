//! Shared constants and invariants

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "8567";
pub const DEFAULT_AUDIENCE: &str = "wechat-token-hub";
pub const JWT_KEY_ENV_PREFIX: &str = "JWT_KEY_";

// Upstream WeChat API
pub const DEFAULT_WECHAT_API_ROOT: &str = "https://api.weixin.qq.com";
pub const WECHAT_TOKEN_PATH: &str = "/cgi-bin/token";
pub const WECHAT_TICKET_PATH: &str = "/cgi-bin/ticket/getticket";

// Inbound routes
pub const ACCESS_TOKEN_PATH: &str = "/access_token";
pub const TICKET_PATH: &str = "/ticket";
