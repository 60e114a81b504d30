/**
 * warren - per-identity wiki trees over WebDAV
 *
 * Entry point: load environment configuration, initialize tracing, then
 * either run the one-shot credential bootstrap or serve until shutdown.
 */

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = warren::server::Config::from_env()?;

    // Gen mode: add a credential entry and exit without serving.
    if let Some(entry) = &config.gen {
        let hash = warren::auth::credentials::hash_secret(&entry.secret)?;
        warren::auth::credentials::append_entry(&config.credential_file, &entry.identity, &hash)?;
        let target = config.credential_file.display().to_string();
        println!("Added {:?} to {:?}", entry.identity, target);
        return Ok(());
    }

    warren::server::init::run(config).await
}
