/// eCash SDK - Cryptographic primitives and binary utilities.
///
/// This crate provides the building blocks shared by the other crates:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, SHA-RMD160, HMAC)
/// - Compact-size integers and little-endian readers/writers
/// - Base58check encoding for legacy addresses
/// - secp256k1 keys with ECDSA and Schnorr signing behind the `Ecc` trait

pub mod base58;
pub mod ec;
pub mod hash;
pub mod util;

mod error;
pub use error::PrimitivesError;
