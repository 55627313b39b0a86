//! Arithmetic over the STARK prime field
//!
//! `FieldElement` wraps the `Felt` from starknet-types-core and adds the
//! boundary behaviour the order pipeline needs: strict decimal/hex parsing with
//! `-` meaning field negation, checked construction from bytes, and fallible
//! inversion.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;
use std::sync::LazyLock;

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use starknet_types_core::felt::Felt;
use subtle::{Choice, ConditionallySelectable};

use crate::error::{Result, SignerError};

/// Field prime `P = 2^251 + 17 * 2^192 + 1`
pub const FIELD_PRIME_HEX: &str =
    "0x800000000000011000000000000000000000000000000000000000000000001";

static FIELD_PRIME: LazyLock<BigUint> =
    LazyLock::new(|| BigUint::from_bytes_be(&(Felt::ZERO - Felt::ONE).to_bytes_be()) + 1u32);

/// `P - 2`, the Fermat inversion exponent
static INVERSE_EXPONENT: LazyLock<Felt> = LazyLock::new(|| Felt::ZERO - Felt::from(2u64));

/// The field prime as a big integer
pub fn field_prime() -> &'static BigUint {
    &FIELD_PRIME
}

/// An element of the STARK prime field, always in canonical form `[0, P)`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldElement(Felt);

impl FieldElement {
    pub const ZERO: Self = Self(Felt::ZERO);
    pub const ONE: Self = Self(Felt::ONE);

    pub fn from_felt(felt: Felt) -> Self {
        Self(felt)
    }

    pub fn to_felt(self) -> Felt {
        self.0
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Felt::from(value))
    }

    /// Signed integers map negatives to `P - |value|`
    pub fn from_i64(value: i64) -> Self {
        let magnitude = Self::from_u64(value.unsigned_abs());
        if value < 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Build from a 32-byte big-endian value, rejecting anything `>= P`
    pub fn from_bytes_be(bytes: &[u8; 32]) -> Result<Self> {
        if BigUint::from_bytes_be(bytes) >= *FIELD_PRIME {
            return Err(SignerError::parse(
                &format!("0x{}", hex::encode(bytes)),
                "value is not below the field prime",
            ));
        }
        Ok(Self(Felt::from_bytes_be(bytes)))
    }

    pub fn to_bytes_be(&self) -> [u8; 32] {
        self.0.to_bytes_be()
    }

    /// Build from a big integer, rejecting anything `>= P`
    pub fn from_biguint(value: &BigUint) -> Result<Self> {
        if *value >= *FIELD_PRIME {
            return Err(SignerError::parse(
                &format!("0x{}", value.to_str_radix(16)),
                "value is not below the field prime",
            ));
        }
        Ok(Self(Felt::from_bytes_be(&to_be_32(value))))
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.to_bytes_be())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Felt::ZERO
    }

    pub fn square(&self) -> Self {
        #[cfg(test)]
        op_count::record_mul();
        Self(self.0 * self.0)
    }

    /// Multiplicative inverse. Zero has none.
    pub fn inverse(&self) -> Result<Self> {
        #[cfg(test)]
        op_count::record_inversion();
        self.0.inverse().map(Self).ok_or(SignerError::DivisionByZero)
    }

    /// Inverse as `self^(P - 2)`.
    ///
    /// The exponent is public, so the operation sequence is the same for every
    /// input. Zero maps to zero.
    pub fn fermat_inverse(&self) -> Self {
        #[cfg(test)]
        op_count::record_inversion();
        Self(self.0.pow_felt(&INVERSE_EXPONENT))
    }

    /// Parse a decimal string. A leading `-` negates modulo `P`.
    ///
    /// The magnitude must already be below `P`; out-of-range input is an
    /// error rather than being reduced.
    pub fn from_dec_str(input: &str) -> Result<Self> {
        parse_signed(input, 10)
    }

    /// Parse a hex string, with or without the `0x` prefix. A leading `-`
    /// negates modulo `P`.
    pub fn from_hex_str(input: &str) -> Result<Self> {
        parse_signed(input, 16)
    }

    /// Minimal-width lowercase hex with `0x` prefix (`0x0` for zero)
    pub fn to_hex_string(&self) -> String {
        format!("0x{}", self.to_biguint().to_str_radix(16))
    }

    /// 64-digit zero-padded lowercase hex with `0x` prefix
    pub fn to_fixed_hex_string(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes_be()))
    }
}

/// Field constant from a hex literal known to be canonical
pub(crate) fn constant(hex_literal: &str) -> FieldElement {
    FieldElement(Felt::from_hex_unchecked(hex_literal))
}

/// Left-pad a big integer known to fit in 256 bits into a 32-byte array
pub(crate) fn to_be_32(value: &BigUint) -> [u8; 32] {
    let bytes = value.to_bytes_be();
    let mut out = [0u8; 32];
    let start = 32usize.saturating_sub(bytes.len());
    let skip = bytes.len().saturating_sub(32);
    out[start..].copy_from_slice(&bytes[skip..]);
    out
}

/// Strip an optional `0x`/`0X` prefix
pub(crate) fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

/// Parse the digits of an unsigned number in the given radix.
///
/// Rejects empty input and anything outside the radix alphabet (including
/// `+`, `_` and whitespace, which `BigUint` would otherwise tolerate).
pub(crate) fn parse_magnitude(input: &str, digits: &str, radix: u32) -> Result<BigUint> {
    if digits.is_empty() {
        return Err(SignerError::parse(input, "no digits"));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_digit(radix)) {
        return Err(SignerError::parse(
            input,
            format!("invalid base-{} digit '{}'", radix, bad),
        ));
    }
    BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| SignerError::parse(input, "not a number"))
}

fn parse_signed(input: &str, radix: u32) -> Result<FieldElement> {
    let (negative, body) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let digits = if radix == 16 {
        strip_hex_prefix(body)
    } else {
        body
    };

    let magnitude = parse_magnitude(input, digits, radix)?;
    if magnitude >= *FIELD_PRIME {
        return Err(SignerError::parse(
            input,
            "magnitude is not below the field prime",
        ));
    }
    let value = FieldElement::from_biguint(&magnitude)?;
    Ok(if negative { -value } else { value })
}

impl FromStr for FieldElement {
    type Err = SignerError;

    /// Hex when prefixed with `0x`, decimal otherwise
    fn from_str(s: &str) -> Result<Self> {
        let unsigned = s.strip_prefix('-').unwrap_or(s);
        if unsigned.starts_with("0x") || unsigned.starts_with("0X") {
            Self::from_hex_str(s)
        } else {
            Self::from_dec_str(s)
        }
    }
}

impl From<Felt> for FieldElement {
    fn from(felt: Felt) -> Self {
        Self(felt)
    }
}

impl From<FieldElement> for Felt {
    fn from(value: FieldElement) -> Self {
        value.0
    }
}

impl Add for FieldElement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for FieldElement {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for FieldElement {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        #[cfg(test)]
        op_count::record_mul();
        Self(self.0 * rhs.0)
    }
}

impl Neg for FieldElement {
    type Output = Self;

    fn neg(self) -> Self {
        Self(Felt::ZERO - self.0)
    }
}

impl ConditionallySelectable for FieldElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        let (a, b) = (a.0.to_raw(), b.0.to_raw());
        let mut limbs = [0u64; 4];
        for (limb, (x, y)) in limbs.iter_mut().zip(a.iter().zip(b.iter())) {
            *limb = u64::conditional_select(x, y, choice);
        }
        Self(Felt::from_raw(limbs))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex_string())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-thread counters of field multiplications and inversions
#[cfg(test)]
pub(crate) mod op_count {
    use std::cell::Cell;

    thread_local! {
        static MULTIPLICATIONS: Cell<u64> = const { Cell::new(0) };
        static INVERSIONS: Cell<u64> = const { Cell::new(0) };
    }

    pub(crate) fn record_mul() {
        MULTIPLICATIONS.with(|c| c.set(c.get() + 1));
    }

    pub(crate) fn record_inversion() {
        INVERSIONS.with(|c| c.set(c.get() + 1));
    }

    /// `(multiplications, inversions)` since the last call
    pub(crate) fn take() -> (u64, u64) {
        (
            MULTIPLICATIONS.with(|c| c.replace(0)),
            INVERSIONS.with(|c| c.replace(0)),
        )
    }
}
