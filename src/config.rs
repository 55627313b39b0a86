//! Signer configuration
//!
//! Loaded from an optional JSON file and then overridden from the
//! environment (`.env` is read by the binary via `dotenv`).
//!
//! Environment keys:
//! - `STARK_DOMAIN_NAME`, `STARK_DOMAIN_VERSION`, `STARK_DOMAIN_CHAIN_ID`,
//!   `STARK_DOMAIN_REVISION`: domain separator fields
//! - `STARK_MAX_NONCE_ATTEMPTS`: signer retry cap

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SignerError};
use crate::signer::{Signer, DEFAULT_MAX_NONCE_ATTEMPTS};
use crate::snip12::{SchemaVersion, StarknetDomain};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerConfig {
    #[serde(default = "default_domain")]
    pub domain: StarknetDomain,
    #[serde(default = "default_max_nonce_attempts")]
    pub max_nonce_attempts: u32,
}

fn default_domain() -> StarknetDomain {
    StarknetDomain::mainnet()
}

fn default_max_nonce_attempts() -> u32 {
    DEFAULT_MAX_NONCE_ATTEMPTS
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            max_nonce_attempts: default_max_nonce_attempts(),
        }
    }
}

impl SignerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SignerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        info!("Loaded signer config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production, a map in tests)
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("STARK_DOMAIN_NAME") {
            self.domain.name = name;
        }
        if let Some(version) = lookup("STARK_DOMAIN_VERSION") {
            self.domain.version = version;
        }
        if let Some(chain_id) = lookup("STARK_DOMAIN_CHAIN_ID") {
            self.domain.chain_id = chain_id;
        }
        if let Some(revision) = lookup("STARK_DOMAIN_REVISION") {
            self.domain.revision = revision;
        }
        if let Some(attempts) = lookup("STARK_MAX_NONCE_ATTEMPTS") {
            self.max_nonce_attempts = attempts.parse().map_err(|_| {
                SignerError::Config(format!(
                    "STARK_MAX_NONCE_ATTEMPTS must be a positive integer, got '{}'",
                    attempts
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Schema declared by the configured domain version
    pub fn schema(&self) -> Result<SchemaVersion> {
        SchemaVersion::from_domain_version(&self.domain.version)
    }

    pub fn signer(&self) -> Signer {
        Signer::new(self.max_nonce_attempts)
    }

    fn validate(&self) -> Result<()> {
        if self.max_nonce_attempts == 0 {
            return Err(SignerError::Config(
                "max_nonce_attempts must be at least 1".to_string(),
            ));
        }
        self.schema()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = SignerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SignerConfig::default());
        assert_eq!(config.domain, StarknetDomain::mainnet());
        assert_eq!(config.signer().max_nonce_attempts(), DEFAULT_MAX_NONCE_ATTEMPTS);
    }

    #[test]
    fn test_json_domain() {
        let config = SignerConfig::from_json_str(
            r#"{
                "domain": {"name": "Perpetuals", "version": "v0", "chainId": "SN_SEPOLIA", "revision": "1"},
                "max_nonce_attempts": 4
            }"#,
        )
        .unwrap();
        assert_eq!(config.domain, StarknetDomain::testnet());
        assert_eq!(config.max_nonce_attempts, 4);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("STARK_DOMAIN_CHAIN_ID", "SN_SEPOLIA"),
            ("STARK_MAX_NONCE_ATTEMPTS", "8"),
        ]
        .into_iter()
        .collect();
        let config = SignerConfig::default()
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.domain, StarknetDomain::testnet());
        assert_eq!(config.max_nonce_attempts, 8);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            SignerConfig::from_json_str(r#"{"max_nonce_attempts": 0}"#),
            Err(SignerError::Config(_))
        ));
        assert!(matches!(
            SignerConfig::default()
                .apply_overrides(|key| (key == "STARK_MAX_NONCE_ATTEMPTS").then(|| "many".to_string())),
            Err(SignerError::Config(_))
        ));
        assert!(matches!(
            SignerConfig::default()
                .apply_overrides(|key| (key == "STARK_DOMAIN_VERSION").then(|| "v7".to_string())),
            Err(SignerError::UnsupportedSchema(_))
        ));
        assert!(matches!(
            SignerConfig::from_json_str("not json"),
            Err(SignerError::Json(_))
        ));
    }
}
