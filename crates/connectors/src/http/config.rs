use crate::error::ClientConfigError;
use std::{path::PathBuf, time::Duration};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Credentials sent with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Auth {
    pub username: Option<String>,
    pub password: Option<String>,
    pub password_file: Option<PathBuf>,
    pub bearer_token: Option<String>,
    pub bearer_token_file: Option<PathBuf>,
}

impl Auth {
    pub fn validate(&self) -> Result<(), ClientConfigError> {
        let has_basic = self.username.is_some()
            || self.password.is_some()
            || self.password_file.is_some();
        let has_bearer = self.bearer_token.is_some() || self.bearer_token_file.is_some();

        if has_basic && has_bearer {
            return Err(ClientConfigError::BasicAndBearer);
        }
        if self.password.is_some() && self.password_file.is_some() {
            return Err(ClientConfigError::PasswordAndFile);
        }
        if self.bearer_token.is_some() && self.bearer_token_file.is_some() {
            return Err(ClientConfigError::BearerAndFile);
        }
        if self.username.is_none() && (self.password.is_some() || self.password_file.is_some()) {
            return Err(ClientConfigError::PasswordWithoutUsername);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    pub ca_file: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    pub fn validate(&self) -> Result<(), ClientConfigError> {
        if self.cert_file.is_some() != self.key_file.is_some() {
            return Err(ClientConfigError::IncompleteClientCert);
        }
        Ok(())
    }
}

/// Per-endpoint HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    pub auth: Auth,
    pub tls: TlsConfig,
    pub timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            auth: Auth::default(),
            tls: TlsConfig::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpClientConfig {
    pub fn validate(&self) -> Result<(), ClientConfigError> {
        if self.timeout.is_zero() {
            return Err(ClientConfigError::ZeroTimeout);
        }
        self.auth.validate()?;
        self.tls.validate()
    }
}
