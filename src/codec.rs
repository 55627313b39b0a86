//! String boundary for hashes, keys and signatures
//!
//! - Field elements render as minimal-width lowercase hex with `0x`
//! - Signatures render as `r || s || v`, each 64 lowercase hex digits, no `0x`
//!
//! Private-key parse errors never echo the input.

use crate::error::{Result, SignerError};
use crate::field::{parse_magnitude, strip_hex_prefix, FieldElement};
use crate::scalar::Scalar;
use crate::signer::Signature;

/// Hex digits per signature component
const COMPONENT_HEX_LEN: usize = 64;

/// Convert hex string to a field element (`0x` optional)
pub fn hex_to_field_element(hex_str: &str) -> Result<FieldElement> {
    FieldElement::from_hex_str(hex_str)
}

/// Convert a field element to hex string with 0x prefix
pub fn format_field_element(value: &FieldElement) -> String {
    value.to_hex_string()
}

/// Parse a message hash handed back for signing.
///
/// Must be `0x`-prefixed canonical hex; anything else is `InvalidHash`.
pub fn parse_message_hash(hash_hex: &str) -> Result<FieldElement> {
    if !(hash_hex.starts_with("0x") || hash_hex.starts_with("0X")) {
        return Err(SignerError::InvalidHash(format!(
            "'{}' is missing the 0x prefix",
            hash_hex
        )));
    }
    FieldElement::from_hex_str(hash_hex).map_err(|e| SignerError::InvalidHash(e.to_string()))
}

/// Parse a hex private key (`0x` optional) into a scalar in `[1, N)`
pub fn parse_private_key(private_key_hex: &str) -> Result<Scalar> {
    let digits = strip_hex_prefix(private_key_hex);
    let value = parse_magnitude("<private key>", digits, 16)
        .map_err(|_| SignerError::InvalidPrivateKey("not a hex number".to_string()))?;
    let key = Scalar::new(value).map_err(|_| {
        SignerError::InvalidPrivateKey("key is not below the curve order".to_string())
    })?;
    if key.is_zero() {
        return Err(SignerError::InvalidPrivateKey("key is zero".to_string()));
    }
    Ok(key)
}

/// Serialize a signature as `r || s || v` fixed-width hex, no prefix
pub fn encode_signature(signature: &Signature) -> String {
    let r_str = signature.r.to_fixed_hex_string();
    let s_str = signature.s.to_fixed_hex_string();
    let v_str = signature.v.to_fixed_hex_string();

    format!("{}{}{}", &r_str[2..], &s_str[2..], &v_str[2..])
}

/// Parse a signature string.
///
/// Accepts the 192-digit form produced by [`encode_signature`] and the
/// shorter 130-digit form that carries `v` as a single byte.
pub fn decode_signature(encoded: &str) -> Result<Signature> {
    let v_len = match encoded.len() {
        192 => COMPONENT_HEX_LEN,
        130 => 2,
        other => {
            return Err(SignerError::InvalidSignature(format!(
                "expected 192 or 130 hex digits, got {}",
                other
            )))
        }
    };
    if !encoded.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SignerError::InvalidSignature(
            "signature contains non-hex characters".to_string(),
        ));
    }

    let component = |range: std::ops::Range<usize>| {
        FieldElement::from_hex_str(&encoded[range])
            .map_err(|e| SignerError::InvalidSignature(e.to_string()))
    };
    let s_end = 2 * COMPONENT_HEX_LEN;
    Ok(Signature {
        r: component(0..COMPONENT_HEX_LEN)?,
        s: component(COMPONENT_HEX_LEN..s_end)?,
        v: component(s_end..s_end + v_len)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_felt_conversion() {
        let hex = "0x1234567890abcdef";
        let felt = hex_to_field_element(hex).unwrap();
        assert_eq!(format_field_element(&felt), hex);
    }

    #[test]
    fn test_hex_to_field_element_without_prefix() {
        let felt1 = hex_to_field_element("0x1").unwrap();
        let felt2 = hex_to_field_element("1").unwrap();

        assert_eq!(felt1, felt2);
        assert_eq!(felt1, FieldElement::ONE);
    }

    #[test]
    fn test_format_drops_leading_zeros() {
        let value = hex_to_field_element("0x000abc").unwrap();
        assert_eq!(format_field_element(&value), "0xabc");
    }

    #[test]
    fn test_parse_message_hash_requires_prefix() {
        assert!(matches!(
            parse_message_hash("4de4c009"),
            Err(SignerError::InvalidHash(_))
        ));
        assert!(matches!(
            parse_message_hash("0xnothex"),
            Err(SignerError::InvalidHash(_))
        ));
        assert!(matches!(
            parse_message_hash(crate::field::FIELD_PRIME_HEX),
            Err(SignerError::InvalidHash(_))
        ));
        assert!(parse_message_hash("0x4de4c009").is_ok());
    }

    #[test]
    fn test_parse_private_key() {
        assert!(parse_private_key(
            "0x1234def56789012345678901234567890123456789012345678901234567890"
        )
        .is_ok());
        assert!(parse_private_key("abc").is_ok());

        for bad in ["0x0", "", "0x", "0xzz", crate::scalar::CURVE_ORDER_HEX] {
            assert!(
                matches!(parse_private_key(bad), Err(SignerError::InvalidPrivateKey(_))),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_private_key_errors_do_not_echo_input() {
        let err = parse_private_key("0xdeadbeefzz").unwrap_err();
        assert!(!err.to_string().contains("deadbeef"));
    }

    #[test]
    fn test_signature_string_layout() {
        let signature = Signature {
            r: FieldElement::from_u64(0xaa),
            s: FieldElement::from_u64(0xbb),
            v: FieldElement::ONE,
        };
        let encoded = encode_signature(&signature);
        assert_eq!(encoded.len(), 192);
        assert!(encoded[..64].ends_with("aa"));
        assert!(encoded[64..128].ends_with("bb"));
        assert!(encoded.ends_with("01"));
        assert_eq!(decode_signature(&encoded).unwrap(), signature);
    }

    #[test]
    fn test_decode_short_form() {
        let encoded = format!("{:0>64}{:0>64}01", "aa", "bb");
        let signature = decode_signature(&encoded).unwrap();
        assert_eq!(signature.r, FieldElement::from_u64(0xaa));
        assert_eq!(signature.v, FieldElement::ONE);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(matches!(
            decode_signature("abc"),
            Err(SignerError::InvalidSignature(_))
        ));
        let with_prefix = format!("0x{:0>190}", "1");
        assert!(matches!(
            decode_signature(&with_prefix),
            Err(SignerError::InvalidSignature(_))
        ));
    }
}
