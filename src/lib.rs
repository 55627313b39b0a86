pub mod codec;
pub mod config;
pub mod curve;
pub mod error;
pub mod field;
pub mod nonce;
pub mod scalar;
pub mod signer;
pub mod snip12;

#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export commonly used types
pub use codec::{decode_signature, encode_signature, parse_message_hash, parse_private_key};
pub use config::SignerConfig;
pub use curve::Point;
pub use error::{Result, SignerError};
pub use field::FieldElement;
pub use scalar::Scalar;
pub use signer::{public_key, sign_message, verify, Signature, Signer};
pub use snip12::{
    compute_order_hash, get_order_message_hash, SchemaVersion, StarknetDomain, Transcript,
    TranscriptEncoder,
};

/// Initialize logging for the library
///
/// Logs go to stderr; stdout is left for command output.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}
