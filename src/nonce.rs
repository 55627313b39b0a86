//! Deterministic ECDSA nonces (RFC 6979 HMAC-DRBG over SHA-256)
//!
//! The construction follows the Starknet convention:
//!
//! - entropy input: the private key as 32 big-endian bytes
//! - nonce input: the message hash as 32 big-endian bytes (not reduced)
//! - personalization: the optional seed with leading zero bytes stripped
//! - each 32-byte draw is shifted right by 4 bits and accepted when `0 < k < N`
//!
//! The seed is what the signer bumps when a nonce yields an unusable `r` or `s`.

use crypto_bigint::{Encoding, U256};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Result, SignerError};
use crate::field::FieldElement;
use crate::scalar::Scalar;

type HmacSha256 = Hmac<Sha256>;

/// Upper bound on DRBG draws for a single nonce. Each draw is rejected with
/// probability below 2^-4, so this is never reached in practice.
const MAX_DRBG_DRAWS: u32 = 64;

/// HMAC-DRBG state (RFC 6979 section 3.2, steps b through h)
struct HmacDrbg {
    k: [u8; 32],
    v: [u8; 32],
}

impl HmacDrbg {
    fn new(entropy: &[u8], nonce: &[u8], personalization: &[u8]) -> Result<Self> {
        let mut drbg = Self {
            k: [0x00; 32],
            v: [0x01; 32],
        };
        for round in [0x00u8, 0x01] {
            drbg.k = hmac(&drbg.k, &[&drbg.v, &[round], entropy, nonce, personalization])?;
            drbg.v = hmac(&drbg.k, &[&drbg.v])?;
        }
        Ok(drbg)
    }

    fn next_block(&mut self) -> Result<[u8; 32]> {
        self.v = hmac(&self.k, &[&self.v])?;
        let block = self.v;

        self.k = hmac(&self.k, &[&self.v, &[0x00]])?;
        self.v = hmac(&self.k, &[&self.v])?;
        Ok(block)
    }
}

fn hmac(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 32]> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Derive the signing nonce for `(message_hash, private_key, seed)`.
///
/// Pure function of its inputs: the same triple always yields the same `k`.
/// `seed = None` and `seed = Some(0)` are equivalent.
pub fn generate_k(
    message_hash: &FieldElement,
    private_key: &Scalar,
    seed: Option<&FieldElement>,
) -> Result<Scalar> {
    let seed_bytes = seed.map(|s| s.to_bytes_be()).unwrap_or([0u8; 32]);
    let first_non_zero = seed_bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(seed_bytes.len());

    let mut drbg = HmacDrbg::new(
        &private_key.to_bytes_be(),
        &message_hash.to_bytes_be(),
        &seed_bytes[first_non_zero..],
    )?;

    for _ in 0..MAX_DRBG_DRAWS {
        let candidate = U256::from_be_bytes(drbg.next_block()?).shr_vartime(4);
        let k: Option<Scalar> = Scalar::from_uint(candidate).into();
        if let Some(k) = k.filter(|k| !k.is_zero()) {
            return Ok(k);
        }
    }
    Err(SignerError::NonceExhausted(MAX_DRBG_DRAWS))
}
