use anyhow::{Context, Result};
use storage::services::points::DEFAULT_MEDIA_BONUS;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub api_keys: String,
    pub channel_api_url: String,
    pub channel_provider: String,
    pub dispatch_interval_secs: u64,
    pub dispatch_max_attempts: u32,
    pub points_media_bonus: i32,
    pub legacy_template_fallback: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            channel_api_url: std::env::var("CHANNEL_API_URL")
                .context("Cannot load CHANNEL_API_URL env variable")?,
            channel_provider: std::env::var("CHANNEL_PROVIDER")
                .unwrap_or_else(|_| dispatcher::channel::DEFAULT_PROVIDER.to_string()),
            dispatch_interval_secs: env_or("DISPATCH_INTERVAL_SECS", 60)?,
            dispatch_max_attempts: env_or("DISPATCH_MAX_ATTEMPTS", 3)?,
            points_media_bonus: env_or("POINTS_MEDIA_BONUS", DEFAULT_MEDIA_BONUS)?,
            legacy_template_fallback: std::env::var("LEGACY_TEMPLATE_FALLBACK")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be a number")),
        Err(_) => Ok(default),
    }
}
