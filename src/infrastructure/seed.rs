use crate::config::AppConfig;
use crate::services::credential_store::{CredentialError, CredentialStore};
use sea_orm::DatabaseConnection;
use tracing::info;

/// Creates the configured admin account when it does not exist yet.
pub async fn seed_default_admin(db: &DatabaseConnection, config: &AppConfig) -> anyhow::Result<()> {
    let Some((username, password)) = config.admin_credentials() else {
        return Ok(());
    };

    info!("🌱 Seeding admin account '{}'...", username);

    let store = CredentialStore::new(db.clone());
    if store.exists(username).await? {
        info!("   - Admin account '{}' already present (skipped)", username);
        return Ok(());
    }

    match store.register(username, password).await {
        Ok(()) => info!("✅ Admin account '{}' created", username),
        Err(CredentialError::DuplicateUsername) => {
            info!("   - Admin account '{}' already present (skipped)", username)
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
