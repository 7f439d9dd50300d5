//! Token error types.

use ecash_primitives::PrimitivesError;
use ecash_script::ScriptError;

/// Errors that can occur while encoding token sections or reading EMPP
/// bundles.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// A token argument cannot be encoded: unknown token type, bad token
    /// id, atoms out of range or a list of the wrong length.
    #[error("{0}")]
    Decode(String),

    /// An EMPP script is not `OP_RETURN OP_RESERVED` followed by non-empty
    /// pushes with at most one raw filler push.
    #[error("malformed EMPP bundle: {0}")]
    MalformedBundle(String),

    /// Script error.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Primitives error.
    #[error(transparent)]
    Primitives(#[from] PrimitivesError),
}
