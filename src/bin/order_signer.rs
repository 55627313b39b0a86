//! Order Signer - hash (and optionally sign) a Perpetuals order
//!
//! Takes the 10 positional order arguments, computes the SNIP-12 message
//! hash under the configured domain and prints a JSON object on stdout.
//! When `STARK_PRIVATE_KEY` is set the hash is also signed.
//!
//! Usage:
//!   cargo run --bin order_signer -- \
//!     <position_id> <base_asset_id> <base_amount> <quote_asset_id> <quote_amount> \
//!     <fee_asset_id> <fee_amount> <expiration> <salt> <user_public_key>
//!
//! Configuration via `ORDER_SIGNER_CONFIG` (JSON file) or environment variables

use std::env;

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use perpetuals_order_signer::{
    codec, compute_order_hash, init_logging, signer, SchemaVersion, SignerConfig,
};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
struct Output {
    hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_key: Option<String>,
}

fn load_config() -> Result<SignerConfig> {
    let config = match env::var("ORDER_SIGNER_CONFIG") {
        Ok(path) => SignerConfig::load(&path)
            .with_context(|| format!("Failed to load signer config from {}", path))?,
        Err(_) => SignerConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("Invalid signer environment overrides")
}

fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("   Perpetuals Order Signer");
    eprintln!("═══════════════════════════════════════════════════════════\n");

    dotenv().ok();

    let config = load_config()?;
    let schema: SchemaVersion = config.schema()?;

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != schema.argument_count() {
        bail!(
            "expected {} order arguments for schema {}, got {}",
            schema.argument_count(),
            schema,
            args.len()
        );
    }

    info!(
        "Domain: {} {} on {} (revision {})",
        config.domain.name, config.domain.version, config.domain.chain_id, config.domain.revision
    );

    let hash = compute_order_hash(&args, &config.domain).context("Failed to hash order")?;
    let mut output = Output {
        hash,
        signature: None,
        public_key: None,
    };

    if let Ok(private_key_hex) = env::var("STARK_PRIVATE_KEY") {
        let private_key = codec::parse_private_key(&private_key_hex)
            .context("STARK_PRIVATE_KEY is not a usable key")?;
        let message_hash = codec::parse_message_hash(&output.hash)?;

        let signature = config
            .signer()
            .sign(&message_hash, &private_key)
            .context("Failed to sign order hash")?;
        let public_key = signer::public_key(&private_key)?
            .x()
            .context("Public key is the point at infinity")?;

        output.signature = Some(codec::encode_signature(&signature));
        output.public_key = Some(codec::format_field_element(&public_key));
        info!("✓ Order signed");
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
