//! secp256k1 secret and public keys.
//!
//! `SecretKey` holds the raw 32-byte scalar and wipes it on drop.
//! `PublicKey` is the 33-byte compressed SEC1 encoding that ends up in
//! P2PKH unlocking scripts and P2PK locking scripts.

use std::fmt;

use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::{ProjectivePoint, Scalar};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::hash::sha_rmd160;
use crate::PrimitivesError;

/// Length of a serialized secret key.
pub const SECRET_KEY_LEN: usize = 32;

/// Length of a compressed public key.
pub const PUBLIC_KEY_LEN: usize = 33;

/// A secp256k1 secret key.
///
/// The scalar is validated on construction (non-zero, below the curve
/// order) and zeroized when the key is dropped.
#[derive(Clone)]
pub struct SecretKey {
    bytes: Zeroizing<[u8; SECRET_KEY_LEN]>,
}

impl SecretKey {
    /// Generate a fresh key from the OS random number generator.
    pub fn random() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let mut bytes = Zeroizing::new([0u8; SECRET_KEY_LEN]);
        bytes.copy_from_slice(&signing_key.to_bytes());
        SecretKey { bytes }
    }

    /// Create a secret key from its 32-byte big-endian scalar.
    ///
    /// # Arguments
    /// * `bytes` - Exactly 32 bytes.
    ///
    /// # Returns
    /// `Ok(SecretKey)`, or `InvalidSecretKey` if the length is wrong or the
    /// scalar is zero or not below the curve order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != SECRET_KEY_LEN {
            return Err(PrimitivesError::InvalidSecretKey(format!(
                "expected {} bytes, got {}",
                SECRET_KEY_LEN,
                bytes.len()
            )));
        }
        SigningKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidSecretKey(e.to_string()))?;
        let mut arr = Zeroizing::new([0u8; SECRET_KEY_LEN]);
        arr.copy_from_slice(bytes);
        Ok(SecretKey { bytes: arr })
    }

    /// Create a secret key from 64 hex characters.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = Zeroizing::new(hex::decode(hex_str)?);
        Self::from_bytes(&bytes)
    }

    /// Borrow the raw scalar bytes.
    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_LEN] {
        &self.bytes
    }

    /// Derive the compressed public key.
    pub fn public_key(&self) -> Result<PublicKey, PrimitivesError> {
        let signing_key = self.signing_key()?;
        Ok(PublicKey::from_verifying_key(signing_key.verifying_key()))
    }

    pub(crate) fn signing_key(&self) -> Result<SigningKey, PrimitivesError> {
        SigningKey::from_slice(self.bytes.as_slice())
            .map_err(|e| PrimitivesError::InvalidSecretKey(e.to_string()))
    }

    pub(crate) fn to_scalar(&self) -> Result<Scalar, PrimitivesError> {
        Ok(*self.signing_key()?.as_nonzero_scalar().as_ref())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.as_slice() == other.bytes.as_slice()
    }
}

impl Eq for SecretKey {}

/// A compressed secp256k1 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    /// Parse a SEC1 public key (compressed or uncompressed) and store it
    /// compressed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let verifying_key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
        Ok(Self::from_verifying_key(&verifying_key))
    }

    /// Parse a hex-encoded SEC1 public key.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// A 33-byte all-zero placeholder of the right serialized size.
    ///
    /// Not a curve point; only meant for size estimation.
    pub fn placeholder() -> Self {
        PublicKey([0u8; PUBLIC_KEY_LEN])
    }

    /// The 33 compressed bytes.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.0
    }

    /// Borrow the 33 compressed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex of the compressed encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// RIPEMD-160(SHA-256(pubkey)), the payload of a P2PKH script.
    pub fn hash(&self) -> [u8; 20] {
        sha_rmd160(&self.0)
    }

    pub(crate) fn verifying_key(&self) -> Result<VerifyingKey, PrimitivesError> {
        VerifyingKey::from_sec1_bytes(&self.0)
            .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))
    }

    pub(crate) fn to_projective(&self) -> Result<ProjectivePoint, PrimitivesError> {
        Ok(ProjectivePoint::from(*self.verifying_key()?.as_affine()))
    }

    fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(true);
        let mut out = [0u8; PUBLIC_KEY_LEN];
        out.copy_from_slice(point.as_bytes());
        PublicKey(out)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The generator point is the public key of scalar 1.
    #[test]
    fn test_public_key_of_one_is_generator() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let sk = SecretKey::from_bytes(&bytes).expect("valid scalar");
        assert_eq!(
            sk.public_key().expect("pubkey").to_hex(),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn test_secret_key_rejects_zero_and_bad_length() {
        assert!(SecretKey::from_bytes(&[0u8; 32]).is_err());
        assert!(SecretKey::from_bytes(&[1u8; 31]).is_err());
        let order = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";
        assert!(SecretKey::from_hex(order).is_err());
    }

    /// Uncompressed input is normalized to the compressed form.
    #[test]
    fn test_public_key_from_uncompressed() {
        let uncompressed = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
                            483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";
        let pk = PublicKey::from_hex(uncompressed).expect("valid point");
        assert_eq!(pk.as_bytes()[0], 0x02);
        assert_eq!(pk.to_bytes().len(), PUBLIC_KEY_LEN);
    }

    #[test]
    fn test_random_keys_differ() {
        let a = SecretKey::random();
        let b = SecretKey::random();
        assert_ne!(a, b);
        assert!(a.public_key().is_ok());
    }

    #[test]
    fn test_secret_key_debug_is_redacted() {
        let sk = SecretKey::from_bytes(&[0x11; 32]).expect("valid scalar");
        assert_eq!(format!("{:?}", sk), "SecretKey(..)");
    }
}
