use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Signing key for credential issuance and verification (JWT HS256).
    /// Set via HEALTHD_AUTH_SECRET.
    pub auth_secret: String,
    /// Lifetime of issued tokens in days. Default: 7.
    pub token_ttl_days: i64,
    /// Delivery sweep interval in seconds. Default: 60.
    pub sweep_interval_secs: u64,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let auth_secret = std::env::var("HEALTHD_AUTH_SECRET")
        .unwrap_or_else(|_| "CHANGE_ME_SIGNING_SECRET".into());

    if auth_secret == "CHANGE_ME_SIGNING_SECRET" {
        let env_mode = std::env::var("HEALTHD_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "HEALTHD_AUTH_SECRET is still the insecure placeholder. \
                 Set a proper signing secret before running in production."
            );
        }
        eprintln!("⚠️  HEALTHD_AUTH_SECRET is not set — using insecure placeholder. Set a real signing secret for production.");
    }

    Ok(Config {
        port: std::env::var("HEALTHD_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/healthd".into()),
        auth_secret,
        token_ttl_days: std::env::var("HEALTHD_TOKEN_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7),
        sweep_interval_secs: std::env::var("HEALTHD_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60),
    })
}
