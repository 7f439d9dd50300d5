/// Error types for transaction, sighash and builder operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Leftover or fee settings are missing or of the wrong kind, or the
    /// builder has more than one leftover output.
    #[error("{0}")]
    Config(String),

    /// An input lacks the value or script needed to build its preimage.
    #[error("{0}")]
    MissingSignData(String),

    /// The inputs cannot cover the fixed outputs plus the required fee.
    #[error(
        "Insufficient input value ({input_sats}): Can only pay for {available_fee} fees, but {required_fee} required"
    )]
    InsufficientFunds {
        /// Sum of all input values.
        input_sats: u64,
        /// Input value left after the fixed outputs; negative if the
        /// outputs alone exceed the inputs.
        available_fee: i64,
        /// Fee the final transaction size requires.
        required_fee: u64,
        /// How many more satoshis the inputs would need.
        shortfall: u64,
    },

    /// A sighash type cannot be used for this input.
    #[error("{0}")]
    InvalidSigHash(String),

    /// An input index past the end of the input list.
    #[error("input index {index} out of range (tx has {count} inputs)")]
    InputIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of inputs in the transaction.
        count: usize,
    },

    /// Malformed or truncated transaction bytes.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An underlying script error (forwarded from `ecash-script`).
    #[error("script error: {0}")]
    Script(#[from] ecash_script::ScriptError),

    /// An underlying primitives error (forwarded from `ecash-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] ecash_primitives::PrimitivesError),
}
