use crate::AppState;
use crate::utils::auth::{SESSION_COOKIE, find_cookie};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use std::convert::Infallible;

/// Per-request view of the browser session, decoded from the signed cookie.
///
/// A missing, foreign or tampered cookie yields an anonymous session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub logged_in: bool,
    pub username: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|h| find_cookie(h, SESSION_COOKIE));

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(Session::anonymous());
        };

        match state.sessions.verify(token) {
            Ok(claims) => Ok(Session {
                logged_in: claims.logged_in,
                username: Some(claims.sub),
            }),
            Err(e) => {
                tracing::debug!("Ignoring invalid session cookie: {}", e);
                Ok(Session::anonymous())
            }
        }
    }
}
