use http::StatusCode;

/// Provider code meaning the access token was revoked or replaced.
pub const INVALID_ACCESS_TOKEN_CODE: i64 = 40001;

/// Errors of the upstream credential client.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("missing upstream configuration: {0}")]
    Config(&'static str),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("fetch {what} fail, unexpected HTTP status {status}")]
    Status { what: &'static str, status: StatusCode },

    #[error("fetch {what} fail, undecodable response: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("fetch {what} fail, code: {code}, message: {message}")]
    Provider {
        what: &'static str,
        code: i64,
        message: String,
    },

    /// The access token used for the call is no longer valid upstream.
    #[error("fetch {what} fail, code: {code}, message: {message}", code = INVALID_ACCESS_TOKEN_CODE)]
    InvalidAccessToken { what: &'static str, message: String },
}

impl UpstreamError {
    pub fn is_invalid_access_token(&self) -> bool {
        matches!(self, UpstreamError::InvalidAccessToken { .. })
    }

    /// Bounded label for failure metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            UpstreamError::Config(_) => "config",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Status { .. } => "status",
            UpstreamError::Decode { .. } => "decode",
            UpstreamError::Provider { .. } => "provider",
            UpstreamError::InvalidAccessToken { .. } => "invalid_access_token",
        }
    }
}
