use std::sync::Arc;

/// Tokens attached to authenticated backend calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Read-only view of a client-side token store
pub trait CredentialProvider: Send + Sync {
    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String> {
        None
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.access_token(),
            refresh_token: self.refresh_token(),
        }
    }
}

/// Asks each store in order; the first one holding a token wins
pub struct ChainedCredentials {
    stores: Vec<Arc<dyn CredentialProvider>>,
}

impl ChainedCredentials {
    pub fn new(stores: Vec<Arc<dyn CredentialProvider>>) -> Self {
        Self { stores }
    }
}

impl CredentialProvider for ChainedCredentials {
    fn access_token(&self) -> Option<String> {
        self.stores.iter().find_map(|s| s.access_token())
    }

    fn refresh_token(&self) -> Option<String> {
        self.stores.iter().find_map(|s| s.refresh_token())
    }
}

/// Fixed tokens, for wiring and tests
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl StaticCredentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self { access_token: Some(token.into()), refresh_token: None }
    }
}

impl CredentialProvider for StaticCredentials {
    fn access_token(&self) -> Option<String> {
        self.access_token.clone().filter(|t| !t.is_empty())
    }

    fn refresh_token(&self) -> Option<String> {
        self.refresh_token.clone().filter(|t| !t.is_empty())
    }
}
