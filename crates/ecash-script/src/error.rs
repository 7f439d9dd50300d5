/// Error types for script and address operations.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Generic invalid script error.
    #[error("invalid script: {0}")]
    InvalidScript(String),

    /// Not enough bytes left in the script to complete a push.
    #[error("not enough data")]
    DataTooSmall,

    /// Push payload exceeds what OP_PUSHDATA4 can carry.
    #[error("data too big")]
    DataTooBig,

    /// A push opcode cannot carry a payload of the given length.
    #[error("push opcode {opcode:#04x} cannot carry {len} bytes")]
    PushLengthMismatch {
        /// The push opcode.
        opcode: u8,
        /// The payload length.
        len: usize,
    },

    /// An OP_CODESEPARATOR index past the last separator in the script.
    #[error("script has {available} OP_CODESEPARATOR, cannot cut after #{requested}")]
    CodesepIndexOutOfRange {
        /// The requested 1-based separator index.
        requested: usize,
        /// The number of separators in the script.
        available: usize,
    },

    /// A malformed address: bad checksum, prefix, version byte or length.
    #[error("decode error: {0}")]
    Decode(String),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// An underlying primitives error (forwarded from `ecash-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] ecash_primitives::PrimitivesError),
}
