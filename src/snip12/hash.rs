/// SNIP-12 hashing functions for order signing

use std::sync::LazyLock;

use sha3::{Digest, Keccak256};
use starknet_crypto::{Felt, PoseidonHasher};
use tracing::debug;

use super::transcript::Transcript;
use crate::error::{Result, SignerError};
use crate::field::{constant, FieldElement};

/// `'StarkNet Message'` packed as a Cairo short string
const STARKNET_MESSAGE_PREFIX_HEX: &str = "0x537461726b4e6574204d657373616765";

static STARKNET_MESSAGE_PREFIX: LazyLock<FieldElement> =
    LazyLock::new(|| constant(STARKNET_MESSAGE_PREFIX_HEX));

/// Compute starknet_keccak hash
///
/// Keccak-256 with the top six bits cleared, so the result is a 250-bit
/// value. Used for the SNIP-12 type hashes.
pub fn starknet_keccak(input: &[u8]) -> FieldElement {
    let mut hasher = Keccak256::new();
    hasher.update(input);
    let result = hasher.finalize();

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    bytes[0] &= 0x03;
    FieldElement::from_felt(Felt::from_bytes_be(&bytes))
}

/// Fold a sequence of field elements with the Poseidon sponge.
///
/// Same result as `poseidon_hash_many`: elements are absorbed pairwise and
/// the input is padded with a single `1` (plus a `0` when needed).
pub fn poseidon_fold(elements: &[FieldElement]) -> FieldElement {
    let mut hasher = PoseidonHasher::new();
    for element in elements {
        hasher.update(element.to_felt());
    }
    FieldElement::from_felt(hasher.finalize())
}

/// Hash one struct segment (type hash followed by members), checking its
/// length against the schema's fixed arity
pub fn hash_struct(segment: &[FieldElement], arity: usize) -> Result<FieldElement> {
    if segment.len() < arity {
        return Err(SignerError::TranscriptTooShort {
            expected: arity,
            actual: segment.len(),
        });
    }
    if segment.len() > arity {
        return Err(SignerError::TranscriptTooLong {
            expected: arity,
            actual: segment.len(),
        });
    }
    Ok(poseidon_fold(segment))
}

/// Hash the StarknetDomain segment of a transcript
pub fn hash_domain(transcript: &Transcript) -> Result<FieldElement> {
    hash_struct(&transcript.domain, transcript.schema.domain_arity())
}

/// Hash the Order segment of a transcript
pub fn hash_order_struct(transcript: &Transcript) -> Result<FieldElement> {
    hash_struct(&transcript.order, transcript.schema.order_arity())
}

/// Compute the final SNIP-12 message hash
///
/// `poseidon('StarkNet Message', domain_hash, account, order_struct_hash)`
pub fn message_hash(transcript: &Transcript) -> Result<FieldElement> {
    let domain_hash = hash_domain(transcript)?;
    let struct_hash = hash_order_struct(transcript)?;

    let hash = poseidon_fold(&[
        *STARKNET_MESSAGE_PREFIX,
        domain_hash,
        transcript.account,
        struct_hash,
    ]);

    debug!(
        schema = %transcript.schema,
        elements = transcript.elements().count(),
        domain_hash = %domain_hash,
        struct_hash = %struct_hash,
        "Computed order message hash"
    );
    Ok(hash)
}
