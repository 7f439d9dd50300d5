/// eCash Script - an immutable sequence of opcodes and data pushes.
///
/// Scripts lock outputs and unlock inputs. A `Script` is only ever built
/// whole (from bytes, from ops or from a template) and is compared
/// byte-for-byte.

use std::fmt;

use ecash_primitives::ec::PublicKey;
use ecash_primitives::util::{ByteWriter, VarSize};

use crate::address::{Address, AddressType};
use crate::op::{push_bytes_op, Op, OpIter};
use crate::opcodes::*;
use crate::ScriptError;

/// Length of the hash in P2PKH and P2SH templates.
pub const HASH_LEN: usize = 20;

/// An eCash script, represented as a byte vector newtype.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create an empty script.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Create a script from a hex string.
    ///
    /// # Arguments
    /// * `hex_str` - Hex of the raw script bytes (e.g. "76a914...88ac").
    ///
    /// # Returns
    /// The script, or `HexDecode` if the string is not valid hex.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        Ok(Script(hex::decode(hex_str)?))
    }

    /// Concatenate ops into a script.
    ///
    /// Each push is written with its own length prefix.
    pub fn from_ops<I>(ops: I) -> Self
    where
        I: IntoIterator<Item = Op>,
    {
        let mut writer = ByteWriter::new();
        for op in ops {
            op.write_to(&mut writer);
        }
        Script(writer.into_bytes())
    }

    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`.
    pub fn p2pkh(pkh: &[u8; HASH_LEN]) -> Self {
        let mut bytes = Vec::with_capacity(25);
        bytes.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
        bytes.extend_from_slice(pkh);
        bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Script(bytes)
    }

    /// `OP_HASH160 <hash> OP_EQUAL`.
    pub fn p2sh(script_hash: &[u8; HASH_LEN]) -> Self {
        let mut bytes = Vec::with_capacity(23);
        bytes.extend_from_slice(&[OP_HASH160, OP_DATA_20]);
        bytes.extend_from_slice(script_hash);
        bytes.push(OP_EQUAL);
        Script(bytes)
    }

    /// `<pubkey> OP_CHECKSIG`.
    pub fn p2pk(pk: &PublicKey) -> Self {
        Script::from_ops([push_bytes_op(pk.as_bytes()), Op::Code(OP_CHECKSIG)])
    }

    /// Decode a CashAddr or legacy base58 address into its locking script.
    ///
    /// # Arguments
    /// * `address` - E.g. `ecash:qpm2qsznhks23z7629mms6s4cwef74vcwva87rkuu2`.
    ///
    /// # Returns
    /// The P2PKH or P2SH script, or `ScriptError::Decode` for a bad
    /// checksum, prefix, version byte or payload length.
    pub fn from_address(address: &str) -> Result<Self, ScriptError> {
        Ok(Address::parse(address)?.to_script())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The raw script bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex of the script bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Number of bytes in the script.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the script has no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the ops of the script.
    pub fn ops(&self) -> OpIter<'_> {
        OpIter::new(&self.0)
    }

    /// Size of the script when serialized inside a transaction
    /// (compact-size length prefix plus bytes).
    pub fn ser_size(&self) -> usize {
        VarSize::from(self.0.len()).length() + self.0.len()
    }

    /// Write the length-prefixed script.
    pub fn write_with_size(&self, writer: &mut ByteWriter) {
        writer.write_varsize_bytes(&self.0);
    }

    /// Render the script as space-separated ASM tokens.
    ///
    /// Returns an empty string if the script contains a truncated push.
    pub fn to_asm(&self) -> String {
        let ops: Result<Vec<Op>, ScriptError> = self.ops().collect();
        match ops {
            Ok(ops) => ops
                .iter()
                .map(Op::to_asm_string)
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => String::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    /// Whether this is a P2PKH locking script.
    pub fn is_p2pkh(&self) -> bool {
        self.p2pkh_hash().is_some()
    }

    /// Whether this is a P2SH locking script.
    pub fn is_p2sh(&self) -> bool {
        self.p2sh_hash().is_some()
    }

    /// The public key hash of a P2PKH script.
    pub fn p2pkh_hash(&self) -> Option<[u8; HASH_LEN]> {
        let b = &self.0;
        if b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == OP_DATA_20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
        {
            let mut hash = [0u8; HASH_LEN];
            hash.copy_from_slice(&b[3..23]);
            return Some(hash);
        }
        None
    }

    /// The script hash of a P2SH script.
    pub fn p2sh_hash(&self) -> Option<[u8; HASH_LEN]> {
        let b = &self.0;
        if b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL {
            let mut hash = [0u8; HASH_LEN];
            hash.copy_from_slice(&b[2..22]);
            return Some(hash);
        }
        None
    }

    /// The address type and hash of a P2PKH or P2SH script.
    pub fn address_payload(&self) -> Option<(AddressType, [u8; HASH_LEN])> {
        self.p2pkh_hash()
            .map(|hash| (AddressType::P2PKH, hash))
            .or_else(|| self.p2sh_hash().map(|hash| (AddressType::P2SH, hash)))
    }

    // -----------------------------------------------------------------------
    // OP_CODESEPARATOR handling
    // -----------------------------------------------------------------------

    /// Return the part of the script after the `n`-th OP_CODESEPARATOR.
    ///
    /// `n` counts from 1; `n == 0` returns the whole script. Bytes inside
    /// pushes are never mistaken for separators.
    ///
    /// # Returns
    /// The trailing script, or `CodesepIndexOutOfRange` if the script has
    /// fewer than `n` separators.
    pub fn cut_out_codesep(&self, n: usize) -> Result<Script, ScriptError> {
        if n == 0 {
            return Ok(self.clone());
        }
        let mut seen = 0;
        let mut ops = self.ops();
        while let Some(op) = ops.next() {
            if op?.opcode() == OP_CODESEPARATOR {
                seen += 1;
                if seen == n {
                    return Ok(Script(self.0[ops.position()..].to_vec()));
                }
            }
        }
        Err(ScriptError::CodesepIndexOutOfRange {
            requested: n,
            available: seen,
        })
    }

    /// Return the script with every OP_CODESEPARATOR removed.
    ///
    /// # Returns
    /// The filtered script, or `DataTooSmall` on a truncated push.
    pub fn strip_codeseps(&self) -> Result<Script, ScriptError> {
        let mut writer = ByteWriter::with_capacity(self.0.len());
        for op in self.ops() {
            let op = op?;
            if op.opcode() != OP_CODESEPARATOR {
                op.write_to(&mut writer);
            }
        }
        Ok(Script(writer.into_bytes()))
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Script {
    /// Display the script as a lowercase hex string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::push_number_op;

    const PKH_HEX: &str = "76a04053bda0a88bda5177b86a15c3b29f559873";

    fn pkh() -> [u8; 20] {
        let mut out = [0u8; 20];
        out.copy_from_slice(&hex::decode(PKH_HEX).expect("hex"));
        out
    }

    /// The canonical templates wrap the hash in fixed opcodes.
    #[test]
    fn test_templates() {
        assert_eq!(Script::p2pkh(&pkh()).to_hex(), format!("76a914{}88ac", PKH_HEX));
        assert_eq!(Script::p2sh(&pkh()).to_hex(), format!("a914{}87", PKH_HEX));
        assert!(Script::p2pkh(&pkh()).is_p2pkh());
        assert!(!Script::p2pkh(&pkh()).is_p2sh());
        assert_eq!(Script::p2sh(&pkh()).p2sh_hash(), Some(pkh()));

        let pk = PublicKey::from_hex(
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        )
        .expect("pubkey");
        assert_eq!(Script::p2pk(&pk).to_hex(), format!("21{}ac", pk.to_hex()));
    }

    #[test]
    fn test_from_ops_concatenates() {
        let script = Script::from_ops([
            push_number_op(2),
            push_bytes_op(vec![0xaa, 0xbb]),
            Op::Code(OP_CHECKMULTISIG),
        ]);
        assert_eq!(script.to_hex(), "5202aabbae");
        assert_eq!(script.to_asm(), "OP_2 aabb OP_CHECKMULTISIG");
        assert_eq!(script.ser_size(), 6);
    }

    #[test]
    fn test_from_address() {
        let script = Script::from_address("ecash:qpm2qsznhks23z7629mms6s4cwef74vcwva87rkuu2")
            .expect("p2pkh");
        assert_eq!(script, Script::p2pkh(&pkh()));
        let script = Script::from_address("ecash:ppm2qsznhks23z7629mms6s4cwef74vcwv2zrv3l8h")
            .expect("p2sh");
        assert_eq!(script, Script::p2sh(&pkh()));
        let script = Script::from_address("3CWFddi6m4ndiGyKqzYvsFYagqDLPVMTzC").expect("legacy");
        assert_eq!(script, Script::p2sh(&pkh()));
        assert!(matches!(
            Script::from_address("ecash:qpm2qsznhks23z7629mms6s4cwef74vcwva87rkuu3"),
            Err(ScriptError::Decode(_))
        ));
    }

    /// Cutting after separator n keeps everything after it, including later
    /// separators.
    #[test]
    fn test_cut_out_codesep() {
        let script = Script::from_hex("abacadaeafb0abac").expect("hex");
        assert_eq!(script.cut_out_codesep(0).expect("whole"), script);
        assert_eq!(script.cut_out_codesep(1).expect("1").to_hex(), "acadaeafb0abac");
        assert_eq!(script.cut_out_codesep(2).expect("2").to_hex(), "ac");
        assert!(matches!(
            script.cut_out_codesep(3),
            Err(ScriptError::CodesepIndexOutOfRange { requested: 3, available: 2 })
        ));
    }

    /// A 0xab byte inside a push is data, not a separator.
    #[test]
    fn test_codesep_inside_push_is_ignored() {
        let script = Script::from_hex("02abab51ab52").expect("hex");
        assert_eq!(script.cut_out_codesep(1).expect("1").to_hex(), "52");
        assert_eq!(script.strip_codeseps().expect("strip").to_hex(), "02abab5152");
    }

    #[test]
    fn test_strip_codeseps() {
        let script = Script::from_hex("abacadaeafb0abac").expect("hex");
        assert_eq!(script.strip_codeseps().expect("strip").to_hex(), "acadaeafb0ac");
        assert!(Script::from_hex("ab4c05").expect("hex").strip_codeseps().is_err());
    }

    #[test]
    fn test_display_and_debug() {
        let script = Script::from_hex("6a").expect("hex");
        assert_eq!(script.to_string(), "6a");
        assert_eq!(format!("{:?}", script), "Script(6a)");
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Holder {
        script: Script,
    }

    /// Scripts travel through config files as hex strings.
    #[test]
    fn test_serde_as_hex() {
        let holder: Holder = toml::from_str("script = \"76a9\"").expect("deserialize");
        assert_eq!(holder.script.as_bytes(), &[OP_DUP, OP_HASH160]);
        let text = toml::to_string(&holder).expect("serialize");
        assert_eq!(text.trim(), "script = \"76a9\"");
        assert!(toml::from_str::<Holder>("script = \"zz\"").is_err());
    }
}
