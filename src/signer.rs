//! ECDSA over the STARK curve
//!
//! Signatures follow the Starknet conventions: `r` is the x coordinate of
//! `k * G` used as-is, both `r` and `s` must lie in `[1, 2^251)`, and the
//! message hash must be below `2^251`. Nonces come from [`crate::nonce`];
//! when a nonce produces an out-of-range `r` or `s` the seed is bumped and a
//! new nonce derived, up to a fixed number of attempts.

use std::sync::LazyLock;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec;
use crate::curve::Point;
use crate::error::{Result, SignerError};
use crate::field::FieldElement;
use crate::nonce::generate_k;
use crate::scalar::Scalar;

/// Default cap on nonce derivations per signature
pub const DEFAULT_MAX_NONCE_ATTEMPTS: u32 = 16;

/// Exclusive upper bound for message hashes and signature components
static ELEMENT_UPPER_BOUND: LazyLock<BigUint> = LazyLock::new(|| BigUint::from(1u32) << 251u32);

/// ECDSA signature on the STARK curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub r: FieldElement,
    pub s: FieldElement,
    /// Parity of `R.y`
    pub v: FieldElement,
}

/// Deterministic STARK-curve signer
#[derive(Debug, Clone, Copy)]
pub struct Signer {
    max_nonce_attempts: u32,
}

impl Default for Signer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NONCE_ATTEMPTS)
    }
}

impl Signer {
    pub fn new(max_nonce_attempts: u32) -> Self {
        Self { max_nonce_attempts }
    }

    pub fn max_nonce_attempts(&self) -> u32 {
        self.max_nonce_attempts
    }

    /// Sign a message hash with a private key
    pub fn sign(&self, message_hash: &FieldElement, private_key: &Scalar) -> Result<Signature> {
        check_private_key(private_key)?;
        check_message_hash(message_hash)?;

        let mut seed: Option<FieldElement> = None;
        for attempt in 1..=self.max_nonce_attempts {
            let k = generate_k(message_hash, private_key, seed.as_ref())?;
            if let Some(signature) = sign_with_nonce(message_hash, private_key, &k)? {
                debug!(attempt, "Signed message hash");
                return Ok(signature);
            }
            warn!(attempt, "Nonce produced an out-of-range signature, retrying");
            seed = Some(seed.map_or(FieldElement::ONE, |s| s + FieldElement::ONE));
        }
        Err(SignerError::NonceExhausted(self.max_nonce_attempts))
    }
}

/// One signing attempt with a fixed nonce.
///
/// `Ok(None)` means the nonce is unusable (`k = 0`, or `r`/`s` out of range)
/// and the caller should derive another one.
pub fn sign_with_nonce(
    message_hash: &FieldElement,
    private_key: &Scalar,
    k: &Scalar,
) -> Result<Option<Signature>> {
    if k.is_zero() {
        return Ok(None);
    }

    let (rx, ry) = match Point::generator().scalar_mul(k)? {
        Point::Infinity => return Ok(None),
        Point::Affine { x, y } => (x, y),
    };
    if !in_signature_range(&rx) {
        return Ok(None);
    }

    // Both values are below 2^251 < N
    let r = Scalar::from_field_element(&rx)?;
    let h = Scalar::from_field_element(message_hash)?;

    let s = &k.inverse()? * &(&h + &(&r * private_key));
    let s = s.to_field_element();
    if !in_signature_range(&s) {
        return Ok(None);
    }

    let v = if ry.to_bytes_be()[31] & 1 == 1 {
        FieldElement::ONE
    } else {
        FieldElement::ZERO
    };
    Ok(Some(Signature { r: rx, s, v }))
}

/// Public key point `private_key * G`
pub fn public_key(private_key: &Scalar) -> Result<Point> {
    check_private_key(private_key)?;
    Point::generator().scalar_mul(private_key)
}

/// Check `(u1 * G + u2 * Q).x == r` with `w = s^-1`, `u1 = h * w`, `u2 = r * w`
pub fn verify(public_key: &Point, message_hash: &FieldElement, signature: &Signature) -> Result<bool> {
    if public_key.is_infinity() || !public_key.is_on_curve() {
        return Err(SignerError::InvalidPoint {
            x: public_key.x().map(|x| x.to_hex_string()).unwrap_or_default(),
            y: public_key.y().map(|y| y.to_hex_string()).unwrap_or_default(),
        });
    }
    check_message_hash(message_hash)?;
    if !in_signature_range(&signature.r) || !in_signature_range(&signature.s) {
        return Ok(false);
    }

    let r = Scalar::from_field_element(&signature.r)?;
    let s = Scalar::from_field_element(&signature.s)?;
    let h = Scalar::from_field_element(message_hash)?;

    let w = s.inverse()?;
    let u1 = &h * &w;
    let u2 = &r * &w;
    let point = Point::generator()
        .scalar_mul(&u1)?
        .add(&public_key.scalar_mul(&u2)?)?;

    Ok(point.x() == Some(signature.r))
}

/// Sign a `0x`-prefixed hex message hash with a hex private key and return
/// the signature string (`r || s || v`, 64 hex digits each)
pub fn sign_message(hash_hex: &str, private_key_hex: &str) -> Result<String> {
    let message_hash = codec::parse_message_hash(hash_hex)?;
    let private_key = codec::parse_private_key(private_key_hex)?;
    let signature = Signer::default().sign(&message_hash, &private_key)?;
    Ok(codec::encode_signature(&signature))
}

fn in_signature_range(value: &FieldElement) -> bool {
    !value.is_zero() && value.to_biguint() < *ELEMENT_UPPER_BOUND
}

fn check_private_key(private_key: &Scalar) -> Result<()> {
    if private_key.is_zero() {
        return Err(SignerError::InvalidPrivateKey("key is zero".to_string()));
    }
    Ok(())
}

fn check_message_hash(message_hash: &FieldElement) -> Result<()> {
    if message_hash.to_biguint() >= *ELEMENT_UPPER_BOUND {
        return Err(SignerError::InvalidHash(format!(
            "{} is not below 2^251",
            message_hash
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::curve_order;
    use proptest::prelude::*;

    const PRIVATE_KEY: &str = "0x1234def56789012345678901234567890123456789012345678901234567890";
    const ORDER_HASH: &str = "0x4de4c009e0d0c5a70a7da0e2039fb2b99f376d53496f89d9f437e736add6b48";

    fn key() -> Scalar {
        codec::parse_private_key(PRIVATE_KEY).unwrap()
    }

    fn hash() -> FieldElement {
        codec::parse_message_hash(ORDER_HASH).unwrap()
    }

    #[test]
    fn test_signature_verifies() {
        let signature = Signer::default().sign(&hash(), &key()).unwrap();
        let q = public_key(&key()).unwrap();
        assert!(verify(&q, &hash(), &signature).unwrap());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let a = Signer::default().sign(&hash(), &key()).unwrap();
        let b = Signer::default().sign(&hash(), &key()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tampered_signature_fails() {
        let signature = Signer::default().sign(&hash(), &key()).unwrap();
        let q = public_key(&key()).unwrap();

        let other_hash = hash() + FieldElement::ONE;
        assert!(!verify(&q, &other_hash, &signature).unwrap());

        let bad_s = Signature {
            s: signature.s + FieldElement::ONE,
            ..signature
        };
        assert!(!verify(&q, &hash(), &bad_s).unwrap());

        let other_key = public_key(&Scalar::from_u64(7)).unwrap();
        assert!(!verify(&other_key, &hash(), &signature).unwrap());
    }

    #[test]
    fn test_matches_starknet_crypto_sign() {
        let h = hash();
        let d = key();
        let k = generate_k(&h, &d, None).unwrap();
        let ours = sign_with_nonce(&h, &d, &k).unwrap().unwrap();
        let theirs = starknet_crypto::sign(
            &d.to_field_element().to_felt(),
            &h.to_felt(),
            &k.to_field_element().to_felt(),
        )
        .unwrap();
        assert_eq!(ours.r.to_felt(), theirs.r);
        assert_eq!(ours.s.to_felt(), theirs.s);
        assert_eq!(ours.v.to_felt(), theirs.v);

        let pk = starknet_crypto::get_public_key(&d.to_field_element().to_felt());
        assert!(starknet_crypto::verify(&pk, &h.to_felt(), &theirs.r, &theirs.s).unwrap());
        assert!(starknet_crypto::verify(&pk, &h.to_felt(), &ours.r.to_felt(), &ours.s.to_felt()).unwrap());
    }

    #[test]
    fn test_zero_key_rejected() {
        let result = Signer::default().sign(&hash(), &Scalar::zero());
        assert!(matches!(result, Err(SignerError::InvalidPrivateKey(_))));
    }

    #[test]
    fn test_hash_above_bound_rejected() {
        let too_big = FieldElement::from_biguint(&(BigUint::from(1u32) << 251u32)).unwrap();
        let result = Signer::default().sign(&too_big, &key());
        assert!(matches!(result, Err(SignerError::InvalidHash(_))));
    }

    #[test]
    fn test_zero_nonce_is_retry() {
        assert!(sign_with_nonce(&hash(), &key(), &Scalar::zero()).unwrap().is_none());
    }

    #[test]
    fn test_zero_attempts_exhausts() {
        let result = Signer::new(0).sign(&hash(), &key());
        assert!(matches!(result, Err(SignerError::NonceExhausted(0))));
    }

    #[test]
    fn test_largest_key_signs() {
        let d = Scalar::new(curve_order() - 1u32).unwrap();
        let signature = Signer::default().sign(&hash(), &d).unwrap();
        assert!(verify(&public_key(&d).unwrap(), &hash(), &signature).unwrap());
    }

    #[test]
    fn test_verify_rejects_infinity_key() {
        let signature = Signer::default().sign(&hash(), &key()).unwrap();
        assert!(matches!(
            verify(&Point::Infinity, &hash(), &signature),
            Err(SignerError::InvalidPoint { .. })
        ));
    }

    #[test]
    fn test_sign_message_output_format() {
        let signature = sign_message(ORDER_HASH, PRIVATE_KEY).unwrap();
        assert_eq!(signature.len(), 192);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let decoded = codec::decode_signature(&signature).unwrap();
        assert!(verify(&public_key(&key()).unwrap(), &hash(), &decoded).unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(6))]

        #[test]
        fn random_keys_and_hashes_verify(d in 1u64.., h in any::<u64>()) {
            let d = Scalar::from_u64(d);
            let h = FieldElement::from_u64(h);
            let signature = Signer::default().sign(&h, &d).unwrap();
            prop_assert!(verify(&public_key(&d).unwrap(), &h, &signature).unwrap());
        }
    }
}
