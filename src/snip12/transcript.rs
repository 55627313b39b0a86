/// Encoding of order arguments and domain fields into hash transcripts

use tracing::trace;

use super::domain::StarknetDomain;
use super::schema::{FieldKind, SchemaVersion};
use crate::error::{Result, SignerError};
use crate::field::FieldElement;

/// Longest ASCII string that packs into one felt
pub const MAX_SHORT_STRING_LEN: usize = 31;

/// The ordered field elements fed to the hash engine.
///
/// Three segments, each hashed in this order: the domain struct
/// (`[type_hash, name, version, chain_id, revision]`), the signer's public
/// key, and the order struct (`[type_hash, members...]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub schema: SchemaVersion,
    pub domain: Vec<FieldElement>,
    pub account: FieldElement,
    pub order: Vec<FieldElement>,
}

impl Transcript {
    /// All elements in transcript order
    pub fn elements(&self) -> impl Iterator<Item = &FieldElement> + '_ {
        self.domain
            .iter()
            .chain(std::iter::once(&self.account))
            .chain(self.order.iter())
    }
}

/// Turns positional order arguments plus a domain into a `Transcript`
#[derive(Debug, Clone, Copy)]
pub struct TranscriptEncoder {
    schema: SchemaVersion,
}

impl TranscriptEncoder {
    pub fn new(schema: SchemaVersion) -> Self {
        Self { schema }
    }

    /// Encoder for the schema declared by the domain's version string
    pub fn for_domain(domain: &StarknetDomain) -> Result<Self> {
        SchemaVersion::from_domain_version(&domain.version).map(Self::new)
    }

    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// Domain segment: type hash, three short strings, integer revision
    pub fn encode_domain(&self, domain: &StarknetDomain) -> Result<Vec<FieldElement>> {
        Ok(vec![
            self.schema.domain_type_hash(),
            encode_short_string(&domain.name)?,
            encode_short_string(&domain.version)?,
            encode_short_string(&domain.chain_id)?,
            // Revision 1 is the integer 1, not the short string '1'
            FieldKind::U64.encode("revision", &domain.revision)?,
        ])
    }

    /// Order segment and public key from positional arguments
    pub fn encode_order<S: AsRef<str>>(&self, args: &[S]) -> Result<(Vec<FieldElement>, FieldElement)> {
        let expected = self.schema.argument_count();
        if args.len() != expected {
            return Err(SignerError::SchemaMismatch {
                schema: self.schema.to_string(),
                expected,
                actual: args.len(),
            });
        }

        let fields = self.schema.order_fields();
        let mut order = Vec::with_capacity(self.schema.order_arity());
        order.push(self.schema.order_type_hash());
        for (spec, raw) in fields.iter().zip(args) {
            let element = spec.kind.encode(spec.name, raw.as_ref())?;
            trace!(field = spec.name, value = %element, "Encoded order field");
            order.push(element);
        }

        let account_spec = self.schema.account_field();
        let account = account_spec
            .kind
            .encode(account_spec.name, args[fields.len()].as_ref())?;

        Ok((order, account))
    }

    pub fn encode<S: AsRef<str>>(&self, args: &[S], domain: &StarknetDomain) -> Result<Transcript> {
        let (order, account) = self.encode_order(args)?;
        Ok(Transcript {
            schema: self.schema,
            domain: self.encode_domain(domain)?,
            account,
            order,
        })
    }
}

/// Pack an ASCII string (at most 31 bytes) big-endian into a felt, the way
/// Cairo short strings are represented
pub fn encode_short_string(s: &str) -> Result<FieldElement> {
    if !s.is_ascii() {
        return Err(SignerError::parse(s, "short strings must be ASCII"));
    }
    let bytes = s.as_bytes();
    if bytes.len() > MAX_SHORT_STRING_LEN {
        return Err(SignerError::ShortStringTooLong(s.to_string()));
    }

    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(bytes);
    FieldElement::from_bytes_be(&padded)
}
