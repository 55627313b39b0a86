/// Versioned order schemas
///
/// Each schema version fixes which positional argument maps to which Order
/// struct member, how that argument is parsed, and the SNIP-12 type string
/// whose `starknet_keccak` becomes the struct's type hash.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::hash::starknet_keccak;
use crate::error::{Result, SignerError};
use crate::field::FieldElement;

/// SNIP-12 revision 1 type string for StarknetDomain
pub const DOMAIN_TYPE: &str = concat!(
    "\"StarknetDomain\"(",
    "\"name\":\"shortstring\",",
    "\"version\":\"shortstring\",",
    "\"chainId\":\"shortstring\",",
    "\"revision\":\"shortstring\"",
    ")"
);

/// Order type string for the v0 Perpetuals contract, including the
/// referenced PositionId / AssetId / Timestamp wrappers
pub const ORDER_TYPE_V0: &str = concat!(
    "\"Order\"(",
    "\"position_id\":\"felt\",",
    "\"base_asset_id\":\"AssetId\",",
    "\"base_amount\":\"i64\",",
    "\"quote_asset_id\":\"AssetId\",",
    "\"quote_amount\":\"i64\",",
    "\"fee_asset_id\":\"AssetId\",",
    "\"fee_amount\":\"u64\",",
    "\"expiration\":\"Timestamp\",",
    "\"salt\":\"felt\"",
    ")",
    "\"PositionId\"(\"value\":\"u32\")",
    "\"AssetId\"(\"value\":\"felt\")",
    "\"Timestamp\"(\"seconds\":\"u64\")"
);

static DOMAIN_TYPE_HASH: LazyLock<FieldElement> =
    LazyLock::new(|| starknet_keccak(DOMAIN_TYPE.as_bytes()));

static ORDER_TYPE_HASH_V0: LazyLock<FieldElement> =
    LazyLock::new(|| starknet_keccak(ORDER_TYPE_V0.as_bytes()));

/// How a positional string argument becomes a field element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Hex felt, `0x` prefix optional, non-negative
    Felt,
    /// Decimal `u32`
    U32,
    /// Decimal `i64`; negatives encode as `P - |v|`
    I64,
    /// Decimal `u64`
    U64,
}

impl FieldKind {
    pub fn encode(&self, field: &str, raw: &str) -> Result<FieldElement> {
        match self {
            FieldKind::Felt => {
                if raw.starts_with('-') {
                    return Err(field_error(field, raw, "hex field may not be negative"));
                }
                FieldElement::from_hex_str(raw).map_err(|e| rename_parse_error(field, e))
            }
            FieldKind::U32 => parse_decimal::<u32>(field, raw, false).map(|v| FieldElement::from_u64(v.into())),
            FieldKind::I64 => parse_decimal::<i64>(field, raw, true).map(FieldElement::from_i64),
            FieldKind::U64 => parse_decimal::<u64>(field, raw, false).map(FieldElement::from_u64),
        }
    }
}

/// One positional argument of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field_spec(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

const ORDER_FIELDS_V0: [FieldSpec; 9] = [
    field_spec("position_id", FieldKind::U32),
    field_spec("base_asset_id", FieldKind::Felt),
    field_spec("base_amount", FieldKind::I64),
    field_spec("quote_asset_id", FieldKind::Felt),
    field_spec("quote_amount", FieldKind::I64),
    field_spec("fee_asset_id", FieldKind::Felt),
    field_spec("fee_amount", FieldKind::U64),
    field_spec("expiration", FieldKind::U64),
    field_spec("salt", FieldKind::U64),
];

/// The signer's Stark public key, passed after the order fields
const ACCOUNT_FIELD: FieldSpec = field_spec("user_public_key", FieldKind::Felt);

/// Domain fields that are packed as short strings (name, version, chainId)
/// plus the integer revision
pub const DOMAIN_FIELD_COUNT: usize = 4;

/// Supported order schema versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaVersion {
    #[serde(rename = "v0")]
    V0,
}

impl SchemaVersion {
    /// Pick the schema declared by a domain `version` string
    pub fn from_domain_version(version: &str) -> Result<Self> {
        match version {
            "v0" => Ok(SchemaVersion::V0),
            other => Err(SignerError::UnsupportedSchema(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V0 => "v0",
        }
    }

    /// Order struct members in hashing order
    pub fn order_fields(&self) -> &'static [FieldSpec] {
        match self {
            SchemaVersion::V0 => &ORDER_FIELDS_V0,
        }
    }

    pub fn account_field(&self) -> FieldSpec {
        ACCOUNT_FIELD
    }

    /// Number of positional arguments: order fields followed by the public key
    pub fn argument_count(&self) -> usize {
        self.order_fields().len() + 1
    }

    pub fn order_type(&self) -> &'static str {
        match self {
            SchemaVersion::V0 => ORDER_TYPE_V0,
        }
    }

    pub fn order_type_hash(&self) -> FieldElement {
        match self {
            SchemaVersion::V0 => *ORDER_TYPE_HASH_V0,
        }
    }

    pub fn domain_type_hash(&self) -> FieldElement {
        *DOMAIN_TYPE_HASH
    }

    /// Length of the order segment: type hash plus members
    pub fn order_arity(&self) -> usize {
        1 + self.order_fields().len()
    }

    /// Length of the domain segment: type hash plus domain fields
    pub fn domain_arity(&self) -> usize {
        1 + DOMAIN_FIELD_COUNT
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_domain_version(s)
    }
}

fn field_error(field: &str, raw: &str, reason: &str) -> SignerError {
    SignerError::parse(raw, format!("{}: {}", field, reason))
}

fn rename_parse_error(field: &str, err: SignerError) -> SignerError {
    match err {
        SignerError::Parse { input, reason } => SignerError::Parse {
            input,
            reason: format!("{}: {}", field, reason),
        },
        other => other,
    }
}

/// Strict decimal integer parsing: an optional single sign (`-` for signed
/// kinds only), then one or more ASCII digits, within the target type's range
fn parse_decimal<T: FromStr>(field: &str, raw: &str, signed: bool) -> Result<T> {
    let digits = match (raw.strip_prefix('+'), raw.strip_prefix('-')) {
        (Some(rest), _) => rest,
        (None, Some(rest)) if signed => rest,
        (None, Some(_)) => return Err(field_error(field, raw, "value may not be negative")),
        (None, None) => raw,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(field_error(field, raw, "expected a decimal integer"));
    }
    raw.parse::<T>()
        .map_err(|_| field_error(field, raw, "out of range"))
}
