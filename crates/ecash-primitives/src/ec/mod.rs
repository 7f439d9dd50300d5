//! secp256k1 keys, ECDSA and Schnorr signing, and the [`Ecc`] capability.

pub mod ecc;
pub mod ecdsa;
pub mod keys;
pub mod schnorr;

pub use ecc::{Ecc, EccDummy, Secp256k1Ecc};
pub use keys::{PublicKey, SecretKey};
