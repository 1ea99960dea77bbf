use clap::Parser;
use dotenvy::dotenv;
use mri_report_server::config::AppConfig;
use mri_report_server::infrastructure::database;
use mri_report_server::services::credential_store::{CredentialError, CredentialStore};

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "create_admin", about = "Create a login account for the report server")]
struct Args {
    #[arg(long, env = "ADMIN_USERNAME", default_value = "admin")]
    username: String,

    #[arg(long, env = "ADMIN_PASSWORD")]
    password: String,

    /// Drop and recreate the credential table first (removes every account)
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "create_admin=info,mri_report_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🔐 Starting Admin Account Tool...");

    if args.username.trim().is_empty() || args.password.is_empty() {
        error!("❌ Username and password must not be empty.");
        info!("Usage: cargo run --bin create_admin -- --username admin --password <secret> [--reset]");
        std::process::exit(1);
    }

    let config = AppConfig::from_env();

    info!("🔌 Connecting to database...");
    let db = database::setup_database(&config.database_url).await?;

    if args.reset {
        info!("🔄 Resetting credential table...");
        database::reset_schema(&db).await?;
    }

    let store = CredentialStore::new(db);
    match store.register(&args.username, &args.password).await {
        Ok(()) => {
            info!("✅ Account '{}' created.", args.username);
        }
        Err(CredentialError::DuplicateUsername) => {
            error!(
                "❌ Account '{}' already exists. Use --reset to recreate the table.",
                args.username
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("❌ Failed to create account: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
