//! Integers modulo the STARK curve group order `N`
//!
//! Private keys and nonces live here. `N` is smaller than the field prime, so
//! every scalar also fits in a `FieldElement`, but the two moduli are never
//! mixed implicitly: conversions go through `from_field_element` (checked) or
//! `reduce` (explicit).
//!
//! Values are fixed-width `U256` limbs. Addition, multiplication and inversion
//! go through Montgomery residues, so their running time does not depend on
//! the operands.

use std::fmt;
use std::ops::{Add, Mul};
use std::sync::LazyLock;

use crypto_bigint::modular::constant_mod::Residue;
use crypto_bigint::{impl_modulus, Encoding, U256};
use num_bigint::BigUint;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, ConstantTimeLess, CtOption};

use crate::error::{Result, SignerError};
use crate::field::{to_be_32, FieldElement};

/// Order of the STARK curve generator
pub const CURVE_ORDER_HEX: &str =
    "0x800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2f";

/// Width of the fixed scalar-multiplication ladder. `N < 2^252`.
pub const SCALAR_BITS: usize = 252;

impl_modulus!(
    CurveOrder,
    U256,
    "0800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2f"
);

type OrderResidue = Residue<CurveOrder, { U256::LIMBS }>;

const CURVE_ORDER_UINT: U256 =
    U256::from_be_hex("0800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2f");

static CURVE_ORDER: LazyLock<BigUint> =
    LazyLock::new(|| BigUint::from_bytes_be(&CURVE_ORDER_UINT.to_be_bytes()));

/// The curve order as a big integer
pub fn curve_order() -> &'static BigUint {
    &CURVE_ORDER
}

/// An integer in `[0, N)`
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Scalar(U256);

impl Scalar {
    pub fn zero() -> Self {
        Self(U256::ZERO)
    }

    pub fn one() -> Self {
        Self(U256::ONE)
    }

    pub fn from_u64(value: u64) -> Self {
        // N > 2^64
        Self(U256::from_u64(value))
    }

    /// Checked construction; values `>= N` are rejected
    pub fn new(value: BigUint) -> Result<Self> {
        if value >= *CURVE_ORDER {
            return Err(SignerError::parse(
                &format!("0x{}", value.to_str_radix(16)),
                "value is not below the curve order",
            ));
        }
        Ok(Self(U256::from_be_slice(&to_be_32(&value))))
    }

    /// Constant-time checked construction from fixed-width limbs
    pub fn from_uint(value: U256) -> CtOption<Self> {
        CtOption::new(Self(value), value.ct_lt(&CURVE_ORDER_UINT))
    }

    /// Explicit reduction modulo `N`. Variable time; meant for public values.
    pub fn reduce(value: BigUint) -> Self {
        Self(U256::from_be_slice(&to_be_32(&(value % &*CURVE_ORDER))))
    }

    /// Checked conversion from a field element; `N <= x < P` is rejected
    pub fn from_field_element(value: &FieldElement) -> Result<Self> {
        Option::from(Self::from_uint(U256::from_be_bytes(value.to_bytes_be()))).ok_or_else(|| {
            SignerError::parse(&value.to_hex_string(), "value is not below the curve order")
        })
    }

    pub fn to_field_element(&self) -> FieldElement {
        // N < P, so the value is always a canonical field element
        FieldElement::from_felt(starknet_types_core::felt::Felt::from_bytes_be(
            &self.to_bytes_be(),
        ))
    }

    pub fn is_zero(&self) -> bool {
        self.0.ct_eq(&U256::ZERO).into()
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.to_bytes_be())
    }

    pub fn to_bytes_be(&self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    /// Multiplicative inverse modulo `N`
    pub fn inverse(&self) -> Result<Self> {
        let (inverse, invertible) = self.residue().invert();
        if !bool::from(Choice::from(invertible)) {
            return Err(SignerError::DivisionByZero);
        }
        Ok(Self(inverse.retrieve()))
    }

    /// The low `SCALAR_BITS` bits, most significant first.
    ///
    /// Always yields exactly `SCALAR_BITS` items regardless of the value, so
    /// the ladder in `curve` runs the same number of steps for every scalar.
    pub fn bits_be(&self) -> impl Iterator<Item = Choice> {
        let bytes = self.to_bytes_be();
        (256 - SCALAR_BITS..256).map(move |i| Choice::from((bytes[i / 8] >> (7 - i % 8)) & 1))
    }

    pub fn to_fixed_hex_string(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes_be()))
    }

    fn residue(&self) -> OrderResidue {
        OrderResidue::new(&self.0)
    }
}

impl Add for &Scalar {
    type Output = Scalar;

    fn add(self, rhs: &Scalar) -> Scalar {
        Scalar((self.residue() + rhs.residue()).retrieve())
    }
}

impl Mul for &Scalar {
    type Output = Scalar;

    fn mul(self, rhs: &Scalar) -> Scalar {
        Scalar((self.residue() * rhs.residue()).retrieve())
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl ConditionallySelectable for Scalar {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self(U256::conditional_select(&a.0, &b.0, choice))
    }
}

/// Scalars hold private keys and nonces, so `Debug` never prints the value
impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Scalar(..)")
    }
}
