/// SNIP-12 (Starknet Typed Data) order hashing for Perpetuals orders
///
/// Implements the revision 1 typed-data envelope used by the Perpetuals
/// contract:
///
/// - Domain separator `StarknetDomain(name, version, chainId, revision)` with
///   short-string packing and an integer revision
/// - Order struct hash over the schema's positional fields
/// - Message hash `poseidon('StarkNet Message', domain, public_key, order)`
///
/// The positional argument layout for each schema version lives in
/// [`schema`]; [`transcript`] turns arguments into field elements and
/// [`hash`] folds them.

use tracing::debug;

use crate::error::Result;
use crate::field::FieldElement;

pub mod domain;
pub mod hash;
pub mod schema;
pub mod transcript;


pub use domain::StarknetDomain;
pub use hash::{message_hash, poseidon_fold, starknet_keccak};
pub use schema::{FieldKind, FieldSpec, SchemaVersion};
pub use transcript::{encode_short_string, Transcript, TranscriptEncoder};

/// Compute the SNIP-12 message hash for an order given as positional strings
///
/// The domain's `version` selects the schema, which fixes how many arguments
/// are expected and how each one is parsed.
pub fn get_order_message_hash<S: AsRef<str>>(
    order_fields: &[S],
    domain: &StarknetDomain,
) -> Result<FieldElement> {
    let encoder = TranscriptEncoder::for_domain(domain)?;
    let transcript = encoder.encode(order_fields, domain)?;
    message_hash(&transcript)
}

/// Order hash as minimal-width `0x` hex
pub fn compute_order_hash<S: AsRef<str>>(
    order_fields: &[S],
    domain: &StarknetDomain,
) -> Result<String> {
    let hash = get_order_message_hash(order_fields, domain)?;
    debug!(chain_id = %domain.chain_id, hash = %hash, "Computed order hash");
    Ok(crate::codec::format_field_element(&hash))
}
