/// Starknet domain separator for SNIP-12

use serde::{Deserialize, Serialize};

/// Domain separator to prevent replay attacks across different chains/applications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarknetDomain {
    pub name: String,
    pub version: String,
    #[serde(alias = "chainId")]
    pub chain_id: String,
    pub revision: String,
}

impl StarknetDomain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id: chain_id.into(),
            revision: revision.into(),
        }
    }

    /// Create domain for Extended mainnet
    pub fn mainnet() -> Self {
        Self::new("Perpetuals", "v0", "SN_MAIN", "1")
    }

    /// Create domain for Extended testnet (Sepolia)
    pub fn testnet() -> Self {
        Self::new("Perpetuals", "v0", "SN_SEPOLIA", "1")
    }

    /// Create the Perpetuals domain for a chain ID string.
    ///
    /// Unknown chain IDs keep the given value instead of falling back to
    /// mainnet, so a typo produces a different hash rather than a mainnet one.
    pub fn from_chain_id(chain_id: &str) -> Self {
        match chain_id {
            "SN_MAIN" => Self::mainnet(),
            "SN_SEPOLIA" => Self::testnet(),
            other => Self::new("Perpetuals", "v0", other, "1"),
        }
    }
}

impl Default for StarknetDomain {
    fn default() -> Self {
        Self::mainnet()
    }
}
