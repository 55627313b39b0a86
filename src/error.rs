use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Failed to parse '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("Schema {schema} expects {expected} order fields, got {actual}")]
    SchemaMismatch {
        schema: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported schema version: {0}")]
    UnsupportedSchema(String),

    #[error("Short string '{0}' is longer than 31 bytes")]
    ShortStringTooLong(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Point ({x}, {y}) is not on the curve")]
    InvalidPoint { x: String, y: String },

    #[error("Transcript segment too short: expected {expected} elements, got {actual}")]
    TranscriptTooShort { expected: usize, actual: usize },

    #[error("Transcript segment too long: expected {expected} elements, got {actual}")]
    TranscriptTooLong { expected: usize, actual: usize },

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid message hash: {0}")]
    InvalidHash(String),

    #[error("No valid nonce after {0} attempts")]
    NonceExhausted(u32),

    #[error("Invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("HMAC key error: {0}")]
    HmacKey(#[from] hmac::digest::InvalidLength),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SignerError {
    pub(crate) fn parse(input: &str, reason: impl Into<String>) -> Self {
        SignerError::Parse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SignerError>;
