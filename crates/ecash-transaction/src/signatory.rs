//! Signatories turn an unsigned input into its unlocking script.
//!
//! The builder calls every signatory at least twice: once against
//! [`EccDummy`](ecash_primitives::ec::EccDummy) and a dummy transaction to
//! measure the size, and once for real. A signatory must therefore derive
//! everything from its arguments and keep no state between calls.

use ecash_primitives::ec::{Ecc, PublicKey, SecretKey};
use ecash_primitives::hash::sha256d;
use ecash_script::{push_bytes_op, Script};

use crate::sighash::SigHashType;
use crate::unsigned_tx::UnsignedTxInput;
use crate::TransactionError;

/// Produces the unlocking script of one input.
pub trait Signatory {
    /// Sign `input` with `ecc` and return its unlocking script.
    fn sign_input(
        &self,
        ecc: &dyn Ecc,
        input: &UnsignedTxInput<'_>,
    ) -> Result<Script, TransactionError>;
}

impl<F> Signatory for F
where
    F: Fn(&dyn Ecc, &UnsignedTxInput<'_>) -> Result<Script, TransactionError>,
{
    fn sign_input(
        &self,
        ecc: &dyn Ecc,
        input: &UnsignedTxInput<'_>,
    ) -> Result<Script, TransactionError> {
        self(ecc, input)
    }
}

/// Pin a closure to the [`Signatory`] call signature.
///
/// Closures only pick up higher-ranked argument lifetimes from an `Fn`
/// bound at the place they are written; pass them through here before
/// boxing.
pub fn signatory_fn<F>(f: F) -> F
where
    F: Fn(&dyn Ecc, &UnsignedTxInput<'_>) -> Result<Script, TransactionError>,
{
    f
}

/// Append the sighash byte to a raw signature.
pub fn flag_signature(sig: &[u8], sig_hash_type: SigHashType) -> Vec<u8> {
    let mut flagged = Vec::with_capacity(sig.len() + 1);
    flagged.extend_from_slice(sig);
    flagged.push(sig_hash_type.to_flag_byte());
    flagged
}

/// Sign `digest` and append the sighash byte.
///
/// BIP143 types produce Schnorr signatures (65 bytes flagged), legacy
/// types produce DER ECDSA signatures.
pub fn sign_with_sighash(
    ecc: &dyn Ecc,
    sk: &SecretKey,
    digest: &[u8; 32],
    sig_hash_type: SigHashType,
) -> Result<Vec<u8>, TransactionError> {
    let sig = if sig_hash_type.bip143 {
        ecc.schnorr_sign(sk, digest)?
    } else {
        ecc.ecdsa_sign(sk, digest)?
    };
    Ok(flag_signature(&sig, sig_hash_type))
}

/// Spends a P2PKH output: `<sig> <pubkey>`.
#[derive(Debug, Clone)]
pub struct P2PKHSignatory {
    /// Key that owns the output.
    pub sk: SecretKey,
    /// Public key whose hash the output locks to.
    pub pk: PublicKey,
    /// Sighash type of the signature.
    pub sig_hash_type: SigHashType,
}

impl P2PKHSignatory {
    /// Create a P2PKH signatory.
    pub fn new(sk: SecretKey, pk: PublicKey, sig_hash_type: SigHashType) -> Self {
        P2PKHSignatory {
            sk,
            pk,
            sig_hash_type,
        }
    }
}

impl Signatory for P2PKHSignatory {
    fn sign_input(
        &self,
        ecc: &dyn Ecc,
        input: &UnsignedTxInput<'_>,
    ) -> Result<Script, TransactionError> {
        let preimage = input.sig_hash_preimage(self.sig_hash_type, None)?;
        let sig = sign_with_sighash(ecc, &self.sk, &sha256d(&preimage.bytes), self.sig_hash_type)?;
        Ok(Script::from_ops([
            push_bytes_op(sig),
            push_bytes_op(self.pk.as_bytes()),
        ]))
    }
}

/// Spends a P2PK output: `<sig>`.
#[derive(Debug, Clone)]
pub struct P2PKSignatory {
    /// Key that owns the output.
    pub sk: SecretKey,
    /// Sighash type of the signature.
    pub sig_hash_type: SigHashType,
}

impl P2PKSignatory {
    /// Create a P2PK signatory.
    pub fn new(sk: SecretKey, sig_hash_type: SigHashType) -> Self {
        P2PKSignatory { sk, sig_hash_type }
    }
}

impl Signatory for P2PKSignatory {
    fn sign_input(
        &self,
        ecc: &dyn Ecc,
        input: &UnsignedTxInput<'_>,
    ) -> Result<Script, TransactionError> {
        let preimage = input.sig_hash_preimage(self.sig_hash_type, None)?;
        let sig = sign_with_sighash(ecc, &self.sk, &sha256d(&preimage.bytes), self.sig_hash_type)?;
        Ok(Script::from_ops([push_bytes_op(sig)]))
    }
}
