use std::{convert::Infallible, sync::Arc};

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use server_api::AuthSession;

use crate::app_state::AppState;

/// Session resolved from `Authorization: Bearer <token>`, if any.
///
/// Never rejects on its own; handlers decide what a missing session means.
pub(crate) struct BearerSession(pub(crate) Option<AuthSession>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for BearerSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token);
        Ok(Self(state.api.resolve_session(token)))
    }
}

fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
