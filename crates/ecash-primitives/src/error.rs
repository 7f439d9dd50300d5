/// Unified error type for hashing, encoding and key operations.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    /// A secret key was zero, out of range or of the wrong length.
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    /// A public key could not be parsed as a secp256k1 point.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A signature could not be produced or parsed.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// A base58check payload failed its checksum.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// A string was not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// A string was not valid base58.
    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    /// A compact-size length does not fit in memory.
    #[error("varsize too large")]
    VarSizeTooLarge,

    /// An integer does not fit the requested encoding.
    #[error("value out of range: {0}")]
    ValueOutOfRange(String),

    /// The reader ran out of bytes.
    #[error("unexpected end of data")]
    UnexpectedEof,

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}
