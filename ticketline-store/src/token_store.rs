use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ticketline_core::credentials::{ChainedCredentials, CredentialProvider};
use tracing::warn;

use crate::app_config::CredentialsConfig;

/// On-disk token file, shared across sessions
#[derive(Debug, Default, Deserialize)]
struct TokenFile {
    #[serde(rename = "accessToken", default)]
    access_token: Option<String>,
    #[serde(rename = "refreshToken", default)]
    refresh_token: Option<String>,
}

/// Persistent store: a JSON file written by the login flow. Read on every call
/// so a fresh login is picked up without restarting.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> TokenFile {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return TokenFile::default(),
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring unreadable token file {}: {}", self.path.display(), e);
            TokenFile::default()
        })
    }
}

impl CredentialProvider for FileTokenStore {
    fn access_token(&self) -> Option<String> {
        self.read().access_token.filter(|t| !t.is_empty())
    }

    fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.filter(|t| !t.is_empty())
    }
}

/// Session store: tokens exported into the current shell
#[derive(Debug, Clone)]
pub struct SessionTokenStore {
    access_var: String,
    refresh_var: String,
}

impl SessionTokenStore {
    pub fn new(access_var: impl Into<String>, refresh_var: impl Into<String>) -> Self {
        Self { access_var: access_var.into(), refresh_var: refresh_var.into() }
    }
}

impl CredentialProvider for SessionTokenStore {
    fn access_token(&self) -> Option<String> {
        env::var(&self.access_var).ok().filter(|t| !t.is_empty())
    }

    fn refresh_token(&self) -> Option<String> {
        env::var(&self.refresh_var).ok().filter(|t| !t.is_empty())
    }
}

/// Persistent store first, session store second
pub fn token_stores(config: &CredentialsConfig) -> ChainedCredentials {
    let mut stores: Vec<Arc<dyn CredentialProvider>> = Vec::new();
    if let Some(path) = config.token_path() {
        stores.push(Arc::new(FileTokenStore::new(path)));
    }
    stores.push(Arc::new(SessionTokenStore::new(
        config.access_token_env.clone(),
        config.refresh_token_env.clone(),
    )));
    ChainedCredentials::new(stores)
}
