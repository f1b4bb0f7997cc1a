use crate::error::{Error, Result};
use crate::models::job::LoadPolicy;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub jobs_path: PathBuf,
    pub record_policy: LoadPolicy,
    pub public_base_url: String,
    pub public_rps: u32,
    pub news_feed_url: Option<String>,
    pub news_refresh_interval: Duration,
    pub news_cache_path: Option<PathBuf>,
    pub preferences_path: Option<PathBuf>,
    pub search_debounce: Duration,
    pub salary_debounce: Duration,
    pub page_size: usize,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            jobs_path: PathBuf::from(get_env("JOBS_PATH")?),
            record_policy: get_env_or("RECORD_POLICY", LoadPolicy::Strict)?,
            public_base_url: get_env("PUBLIC_BASE_URL")?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            news_feed_url: env::var("NEWS_FEED_URL").ok().filter(|v| !v.trim().is_empty()),
            news_refresh_interval: Duration::from_secs(get_env_or("NEWS_REFRESH_SECS", 600)?),
            news_cache_path: env::var("NEWS_CACHE_PATH").ok().map(PathBuf::from),
            preferences_path: env::var("PREFERENCES_PATH").ok().map(PathBuf::from),
            search_debounce: Duration::from_millis(get_env_or("SEARCH_DEBOUNCE_MS", 500)?),
            salary_debounce: Duration::from_millis(get_env_or("SALARY_DEBOUNCE_MS", 800)?),
            page_size: get_env_or("PAGE_SIZE", crate::services::listing_service::DEFAULT_PAGE_SIZE)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn get_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(_) => get_env_parse(name),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
