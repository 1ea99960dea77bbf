pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::classifier::Classifier;
use crate::services::credential_store::CredentialStore;
use crate::services::diagnosis::DiagnosisService;
use crate::services::report::ReportRenderer;
use crate::services::storage::UploadStore;
use crate::utils::auth::SessionKeys;
use axum::{Router, middleware::from_fn_with_state, routing::get};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::signup_form,
        api::handlers::auth::signup,
        api::handlers::auth::login_form,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::diagnosis::index,
        api::handlers::diagnosis::diagnose,
        api::handlers::uploads::uploaded_file,
        api::handlers::reports::report_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            utils::validation::CredentialsForm,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "auth", description = "Signup, login and logout"),
        (name = "diagnosis", description = "MRI upload, classification and report"),
        (name = "files", description = "Uploaded scans and generated reports"),
        (name = "system", description = "Health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub credentials: Arc<CredentialStore>,
    pub classifier: Arc<Classifier>,
    pub uploads: Arc<UploadStore>,
    pub diagnosis: Arc<DiagnosisService>,
    pub sessions: Arc<SessionKeys>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the services around an already loaded classifier. The session
    /// key is fresh for every call.
    pub fn new(
        db: DatabaseConnection,
        classifier: Arc<Classifier>,
        uploads: Arc<UploadStore>,
        renderer: Arc<ReportRenderer>,
        config: AppConfig,
    ) -> Self {
        let diagnosis = Arc::new(DiagnosisService::new(
            uploads.clone(),
            classifier.clone(),
            renderer,
        ));

        Self {
            credentials: Arc::new(CredentialStore::new(db.clone())),
            db,
            classifier,
            uploads,
            diagnosis,
            sessions: Arc::new(SessionKeys::generate()),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/signup",
            get(api::handlers::auth::signup_form).post(api::handlers::auth::signup),
        )
        .route(
            "/login",
            get(api::handlers::auth::login_form).post(api::handlers::auth::login),
        )
        .route("/logout", get(api::handlers::auth::logout))
        .route(
            "/",
            get(api::handlers::diagnosis::index)
                .post(api::handlers::diagnosis::diagnose)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::session_gate,
                )),
        )
        .route(
            "/uploads/:filename",
            get(api::handlers::uploads::uploaded_file),
        )
        .route(
            "/static/reports/:filename",
            get(api::handlers::reports::report_file),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_file_size + 1024 * 1024, // multipart overhead
        ))
        .with_state(state)
}
