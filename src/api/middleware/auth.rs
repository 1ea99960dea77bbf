use crate::api::session::Session;
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Continue,
    Redirect(&'static str),
}

/// Access decision for the protected page.
pub fn require_session(session: &Session) -> Gate {
    if session.logged_in {
        Gate::Continue
    } else {
        Gate::Redirect(LOGIN_PATH)
    }
}

pub async fn session_gate(session: Session, req: Request, next: Next) -> Response {
    match require_session(&session) {
        Gate::Continue => next.run(req).await,
        Gate::Redirect(to) => {
            tracing::debug!("Unauthenticated {} {}, redirecting", req.method(), req.uri());
            Redirect::to(to).into_response()
        }
    }
}
