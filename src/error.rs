use thiserror::Error;

/// Errors raised by key, signing, record and configuration operations.
///
/// A signature that simply does not verify is not an error: `verify` reports
/// that as `false`. These variants are reserved for operational faults.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    #[error("Invalid key format: {0}")]
    KeyFormat(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid signature record: {0}")]
    Format(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<pkcs8::Error> for Error {
    fn from(err: pkcs8::Error) -> Self {
        Error::KeyFormat(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for Error {
    fn from(err: pkcs8::spki::Error) -> Self {
        Error::KeyFormat(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for Error {
    fn from(err: rsa::pkcs1::Error) -> Self {
        Error::KeyFormat(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Format(err.to_string())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::Format(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
