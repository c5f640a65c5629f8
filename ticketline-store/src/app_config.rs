use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::StoreResult;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub realtime: RealtimeConfig,
    pub api: ApiConfig,
    pub tracker: TrackerConfig,
    pub credentials: CredentialsConfig,
    pub navigation: NavigationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeConfig {
    pub origin: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub origin: String,
    pub request_timeout_seconds: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    /// How long to wait for the booking outcome; 0 waits forever
    pub wait_timeout_seconds: u64,
}

impl TrackerConfig {
    pub fn wait_timeout(&self) -> Option<Duration> {
        (self.wait_timeout_seconds > 0).then(|| Duration::from_secs(self.wait_timeout_seconds))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    pub token_file: Option<String>, // persistent store
    pub access_token_env: String,   // session store
    pub refresh_token_env: String,
}

impl CredentialsConfig {
    /// Persistent token file; `$HOME/.ticketline/tokens.json` unless configured
    pub fn token_path(&self) -> Option<PathBuf> {
        match &self.token_file {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => env::var_os("HOME").map(|home| PathBuf::from(home).join(".ticketline").join("tokens.json")),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NavigationConfig {
    pub open_browser: bool,
}

impl Config {
    pub fn load() -> StoreResult<Self> {
        Self::load_from(None)
    }

    /// Layered load: built-in defaults, `config/default`, `config/{RUN_MODE}`,
    /// `config/local`, an explicit file, then `TICKETLINE__*` environment variables.
    pub fn load_from(explicit: Option<&str>) -> StoreResult<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = config::Config::builder()
            .set_default("realtime.origin", "ws://172.188.164.9")?
            .set_default("api.origin", "http://localhost:8080/")?
            .set_default("api.request_timeout_seconds", 15_i64)?
            .set_default("tracker.wait_timeout_seconds", 300_i64)?
            .set_default("credentials.access_token_env", "TICKETLINE_ACCESS_TOKEN")?
            .set_default("credentials.refresh_token_env", "TICKETLINE_REFRESH_TOKEN")?
            .set_default("navigation.open_browser", false)?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(config::File::with_name(path));
        }

        let settings: Self = builder
            .add_source(config::Environment::with_prefix("TICKETLINE").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
