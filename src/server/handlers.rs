use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::server::server::AppState;
use crate::upstream::error::UpstreamError;
use crate::upstream::CredentialIssuer;

/// Raw query pairs; a repeated key keeps its first value.
type QueryPairs = Query<Vec<(String, String)>>;

#[derive(Debug, Default, PartialEq)]
pub struct AccessTokenQuery {
    pub rotate_token: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct TicketQuery {
    pub ticket_type: String,
    pub rotate_ticket: Option<String>,
}

impl AccessTokenQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            rotate_token: first_value(pairs, "rotate_token"),
        }
    }
}

impl TicketQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            ticket_type: first_value(pairs, "type").unwrap_or_default(),
            rotate_ticket: first_value(pairs, "rotate_ticket"),
        }
    }
}

fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.to_owned())
}

/// `GET /access_token?rotate_token=`
pub async fn access_token<C: CredentialIssuer>(
    State(state): State<AppState<C>>,
    Query(pairs): QueryPairs,
) -> Response {
    let query = AccessTokenQuery::from_pairs(&pairs);
    let result = state
        .resolver
        .resolve_access_token(rotate_hint(&query.rotate_token))
        .await;
    into_text_response(result)
}

/// `GET /ticket?type=&rotate_ticket=`
pub async fn ticket<C: CredentialIssuer>(
    State(state): State<AppState<C>>,
    Query(pairs): QueryPairs,
) -> Response {
    let query = TicketQuery::from_pairs(&pairs);
    let result = state
        .resolver
        .resolve_ticket(&query.ticket_type, rotate_hint(&query.rotate_ticket))
        .await;
    into_text_response(result)
}

// empty means "no hint"
fn rotate_hint(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|hint| !hint.is_empty())
}

fn into_text_response(result: Result<String, UpstreamError>) -> Response {
    match result {
        Ok(credential) => (StatusCode::OK, credential).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
