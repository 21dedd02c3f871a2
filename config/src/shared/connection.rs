use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::Config;
use crate::shared::ValidationError;

/// Application name reported to the target database for connection auditing.
const APP_NAME_SYNCHRONIZER: &str = "cdc_synchronizer";

/// Connection settings for the relational target store.
#[derive(Debug, Clone, Deserialize)]
pub struct PgConnectionConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub username: String,
    pub password: Option<SecretString>,
    pub tls: TlsConfig,
}

impl PgConnectionConfig {
    /// Builds sqlx connect options for the target database.
    pub fn with_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.tls.enabled {
            PgSslMode::VerifyFull
        } else {
            PgSslMode::Prefer
        };

        let mut options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .database(&self.name)
            .application_name(APP_NAME_SYNCHRONIZER)
            .ssl_mode(ssl_mode)
            .ssl_root_cert_from_pem(self.tls.trusted_root_certs.clone().into_bytes());

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        options
    }

    /// Validates the connection configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tls.enabled && self.tls.trusted_root_certs.is_empty() {
            return Err(ValidationError::MissingTrustedRootCerts);
        }

        Ok(())
    }
}

impl Config for PgConnectionConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

/// TLS settings for the target store connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    pub trusted_root_certs: String,
    pub enabled: bool,
}

impl TlsConfig {
    pub fn disabled() -> Self {
        Self {
            trusted_root_certs: "".to_string(),
            enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection_config(tls: TlsConfig) -> PgConnectionConfig {
        PgConnectionConfig {
            host: "localhost".to_string(),
            port: 5432,
            name: "target".to_string(),
            username: "postgres".to_string(),
            password: None,
            tls,
        }
    }

    #[test]
    fn tls_without_certs_is_rejected() {
        let config = connection_config(TlsConfig {
            trusted_root_certs: "".to_string(),
            enabled: true,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn disabled_tls_is_valid() {
        let config = connection_config(TlsConfig::disabled());
        assert!(config.validate().is_ok());
    }
}
