use crate::api::error::AppError;
use crate::api::views;
use crate::services::credential_store::CredentialError;
use crate::utils::auth::{cleared_session_cookie, session_cookie, token_fingerprint};
use crate::utils::validation::{CredentialsForm, first_message};
use axum::{
    Form,
    extract::State,
    http::header::SET_COOKIE,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::info;
use validator::Validate;

#[utoipa::path(
    get,
    path = "/signup",
    responses(
        (status = 200, description = "Signup form", body = String, content_type = "text/html")
    ),
    tag = "auth"
)]
pub async fn signup_form() -> Html<String> {
    Html(views::signup_page(None))
}

#[utoipa::path(
    post,
    path = "/signup",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created, redirect to /login"),
        (status = 200, description = "Form re-rendered with an inline error", body = String, content_type = "text/html")
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<crate::AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = form.validate() {
        let message = first_message(&errors);
        return Ok(Html(views::signup_page(Some(&message))).into_response());
    }

    match state.credentials.register(&form.username, &form.password).await {
        Ok(()) => Ok(Redirect::to("/login").into_response()),
        Err(CredentialError::DuplicateUsername) => {
            Ok(Html(views::signup_page(Some("Username already exists"))).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login form", body = String, content_type = "text/html")
    ),
    tag = "auth"
)]
pub async fn login_form() -> Html<String> {
    Html(views::login_page(None))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Session established, redirect to /"),
        (status = 200, description = "Form re-rendered with an inline error", body = String, content_type = "text/html")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let outcome = state
        .credentials
        .authenticate(&form.username, &form.password)
        .await?;

    if !outcome.is_accepted() {
        info!("🚫 Rejected login for '{}'", form.username);
        return Ok(Html(views::login_page(Some("Invalid username or password"))).into_response());
    }

    let token = state
        .sessions
        .issue(&form.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    info!(
        "🔑 Session issued for '{}' ({})",
        form.username,
        token_fingerprint(&token)
    );

    Ok(([(SET_COOKIE, session_cookie(&token))], Redirect::to("/")).into_response())
}

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Session cleared, redirect to /login")
    ),
    tag = "auth"
)]
pub async fn logout() -> Response {
    ([(SET_COOKIE, cleared_session_cookie())], Redirect::to("/login")).into_response()
}
