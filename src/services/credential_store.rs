use crate::entities::{admin, prelude::Admin};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, SqlErr};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Outcome of a login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Accepted,
    Rejected,
}

impl AuthOutcome {
    pub fn is_accepted(self) -> bool {
        self == AuthOutcome::Accepted
    }
}

/// Username/password table backing login.
#[derive(Clone)]
pub struct CredentialStore {
    db: DatabaseConnection,
}

impl CredentialStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a new account. The UNIQUE constraint on `username` decides
    /// duplicates, so a failed insert leaves the existing row untouched.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
            .to_string();

        let account = admin::ActiveModel {
            username: Set(username.to_string()),
            password: Set(password_hash),
            ..Default::default()
        };

        match account.insert(&self.db).await {
            Ok(model) => {
                info!("👤 Registered account '{}' (id={})", model.username, model.id);
                Ok(())
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!("Duplicate signup for '{}'", username);
                Err(CredentialError::DuplicateUsername)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Exact, case-sensitive match on both username and password.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, CredentialError> {
        let Some(account) = Admin::find()
            .filter(admin::Column::Username.eq(username))
            .one(&self.db)
            .await?
        else {
            return Ok(AuthOutcome::Rejected);
        };

        // A row whose stored value is not a PHC string can never match.
        let Ok(parsed) = PasswordHash::new(&account.password) else {
            return Ok(AuthOutcome::Rejected);
        };

        let outcome = match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => AuthOutcome::Accepted,
            Err(_) => AuthOutcome::Rejected,
        };
        Ok(outcome)
    }

    /// Whether an account with this username exists.
    pub async fn exists(&self, username: &str) -> Result<bool, CredentialError> {
        let found = Admin::find()
            .filter(admin::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }
}
