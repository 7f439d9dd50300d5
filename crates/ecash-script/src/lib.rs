/// eCash SDK - Script construction and address handling.
///
/// Provides the immutable `Script` type, opcode constants, the `Op` model
/// for building scripts from pushes and opcodes, OP_CODESEPARATOR cutting
/// for signature hashing, and CashAddr / legacy address conversion.

pub mod address;
pub mod op;
pub mod opcodes;
pub mod script;

mod error;
pub use address::{Address, AddressType, Network};
pub use error::ScriptError;
pub use op::{push_bytes_op, push_number_op, Op, PushOp};
pub use script::Script;
