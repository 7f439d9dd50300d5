//! CashAddr and legacy base58 addresses.
//!
//! A CashAddr string is `prefix:payload` where the payload is base32 over
//! `version_byte || hash` followed by a 40-bit BCH checksum that also covers
//! the prefix. The version byte carries the address type in bits 3..7 and
//! the hash size in bits 0..2; only 160-bit hashes are accepted.
//!
//! Legacy addresses are base58check over `version || hash` with the
//! Bitcoin version bytes.

use std::fmt;
use std::str::FromStr;

use ecash_primitives::base58;
use tracing::debug;

use crate::script::{Script, HASH_LEN};
use crate::ScriptError;

/// Mainnet CashAddr prefix.
pub const ECASH_PREFIX: &str = "ecash";
/// Testnet CashAddr prefix.
pub const ECTEST_PREFIX: &str = "ectest";
/// Token-aware wallet prefix.
pub const ETOKEN_PREFIX: &str = "etoken";

/// Prefixes tried, in order, for an address written without one.
pub const VALID_PREFIXES: [&str; 3] = [ECASH_PREFIX, ECTEST_PREFIX, ETOKEN_PREFIX];

/// Base32 alphabet of CashAddr.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Generator coefficients of the BCH checksum.
const GENERATORS: [u64; 5] = [
    0x98f2_bc8e_61,
    0x79b7_6d99_e2,
    0xf33e_5fb3_c4,
    0xae2e_abe2_a8,
    0x1e4f_43e4_70,
];

/// Number of base32 characters in the checksum.
const CHECKSUM_CHARS: usize = 8;

/// Legacy version bytes.
const LEGACY_P2PKH_MAINNET: u8 = 0x00;
const LEGACY_P2SH_MAINNET: u8 = 0x05;
const LEGACY_P2PKH_TESTNET: u8 = 0x6f;
const LEGACY_P2SH_TESTNET: u8 = 0xc4;

/// What an address pays to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressType {
    /// Pay to public key hash.
    P2PKH,
    /// Pay to script hash.
    P2SH,
}

impl AddressType {
    fn version_byte(self) -> u8 {
        match self {
            AddressType::P2PKH => 0x00,
            AddressType::P2SH => 0x08,
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressType::P2PKH => f.write_str("p2pkh"),
            AddressType::P2SH => f.write_str("p2sh"),
        }
    }
}

/// Network selection for legacy base58 addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    /// Mainnet, version bytes 0x00 / 0x05.
    Mainnet,
    /// Testnet and regtest, version bytes 0x6f / 0xc4.
    Testnet,
}

/// A decoded address: prefix, type and 20-byte hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    /// The CashAddr prefix, lowercase, e.g. `"ecash"`.
    pub prefix: String,
    /// P2PKH or P2SH.
    pub kind: AddressType,
    /// The public key hash or script hash.
    pub hash: [u8; HASH_LEN],
}

impl Address {
    /// Build an address from its parts.
    pub fn new(prefix: &str, kind: AddressType, hash: [u8; HASH_LEN]) -> Self {
        Address {
            prefix: prefix.to_ascii_lowercase(),
            kind,
            hash,
        }
    }

    /// Parse either a CashAddr or a legacy base58 address.
    ///
    /// Legacy addresses get the `ecash` prefix (testnet ones `ectest`).
    pub fn parse(address: &str) -> Result<Self, ScriptError> {
        match Self::from_cash_address(address) {
            Ok(addr) => Ok(addr),
            Err(cash_err) => {
                if address.contains(':') {
                    return Err(cash_err);
                }
                Self::from_legacy(address).map_err(|_| cash_err)
            }
        }
    }

    /// Decode a CashAddr string.
    ///
    /// The prefix may be omitted, in which case the first of
    /// [`VALID_PREFIXES`] whose checksum matches is used. Upper and lower
    /// case are both accepted but not mixed.
    ///
    /// # Returns
    /// The address, or `ScriptError::Decode` describing the failure.
    pub fn from_cash_address(address: &str) -> Result<Self, ScriptError> {
        let has_lower = address.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = address.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper {
            return Err(ScriptError::Decode(format!("mixed case in '{}'", address)));
        }
        let address = address.to_ascii_lowercase();
        let (prefix, payload) = match address.split_once(':') {
            Some((prefix, payload)) => (Some(prefix), payload),
            None => (None, address.as_str()),
        };
        if prefix == Some("") {
            return Err(ScriptError::Decode("empty prefix".to_string()));
        }

        let data = payload
            .bytes()
            .map(|c| {
                CHARSET
                    .iter()
                    .position(|&x| x == c)
                    .map(|idx| idx as u8)
                    .ok_or_else(|| {
                        ScriptError::Decode(format!("invalid character '{}'", c as char))
                    })
            })
            .collect::<Result<Vec<u8>, ScriptError>>()?;
        if data.len() <= CHECKSUM_CHARS {
            return Err(ScriptError::Decode(format!("payload too short: '{}'", payload)));
        }
        let prefix = match prefix {
            Some(prefix) => {
                if polymod(&checksum_input(prefix, &data)) != 0 {
                    debug!(prefix, "cashaddr checksum mismatch");
                    return Err(ScriptError::Decode(format!(
                        "invalid checksum for '{}'",
                        address
                    )));
                }
                prefix
            }
            None => VALID_PREFIXES
                .into_iter()
                .find(|prefix| polymod(&checksum_input(prefix, &data)) == 0)
                .ok_or_else(|| {
                    debug!(payload, "no valid prefix matches cashaddr checksum");
                    ScriptError::Decode(format!(
                        "Prefixless address {} does not have valid checksum for any valid \
                         prefix ({})",
                        payload,
                        VALID_PREFIXES.join(", ")
                    ))
                })?,
        };

        let bytes = convert_bits(&data[..data.len() - CHECKSUM_CHARS], 5, 8, false)?;
        let Some((&version, hash)) = bytes.split_first() else {
            return Err(ScriptError::Decode("empty payload".to_string()));
        };
        let kind = match version >> 3 {
            0 => AddressType::P2PKH,
            1 => AddressType::P2SH,
            other => {
                debug!(prefix, version, "unsupported cashaddr type");
                return Err(ScriptError::Decode(format!("unsupported address type {}", other)));
            }
        };
        if version & 0x07 != 0 || hash.len() != HASH_LEN {
            return Err(ScriptError::Decode(format!(
                "unsupported hash size: version {:#04x}, {} bytes",
                version,
                hash.len()
            )));
        }
        let mut out = [0u8; HASH_LEN];
        out.copy_from_slice(hash);
        Ok(Address {
            prefix: prefix.to_string(),
            kind,
            hash: out,
        })
    }

    /// Decode a legacy base58check address.
    pub fn from_legacy(address: &str) -> Result<Self, ScriptError> {
        let payload = base58::check_decode(address)
            .map_err(|e| ScriptError::Decode(format!("{} in '{}'", e, address)))?;
        if payload.len() != HASH_LEN + 1 {
            return Err(ScriptError::Decode(format!(
                "invalid legacy address length {}",
                payload.len()
            )));
        }
        let (prefix, kind) = match payload[0] {
            LEGACY_P2PKH_MAINNET => (ECASH_PREFIX, AddressType::P2PKH),
            LEGACY_P2SH_MAINNET => (ECASH_PREFIX, AddressType::P2SH),
            LEGACY_P2PKH_TESTNET => (ECTEST_PREFIX, AddressType::P2PKH),
            LEGACY_P2SH_TESTNET => (ECTEST_PREFIX, AddressType::P2SH),
            other => {
                return Err(ScriptError::Decode(format!(
                    "unsupported legacy version byte {:#04x}",
                    other
                )))
            }
        };
        let mut hash = [0u8; HASH_LEN];
        hash.copy_from_slice(&payload[1..]);
        Ok(Address::new(prefix, kind, hash))
    }

    /// Extract the address of a P2PKH or P2SH locking script.
    pub fn from_script(script: &Script, prefix: &str) -> Option<Self> {
        script
            .address_payload()
            .map(|(kind, hash)| Address::new(prefix, kind, hash))
    }

    /// Encode as a CashAddr string including the prefix.
    pub fn to_cash_address(&self) -> String {
        let mut raw = Vec::with_capacity(HASH_LEN + 1);
        raw.push(self.kind.version_byte());
        raw.extend_from_slice(&self.hash);
        // 8-to-5 conversion with padding cannot fail.
        let mut data = convert_bits(&raw, 8, 5, true).unwrap_or_default();

        let mut input = checksum_input(&self.prefix, &data);
        input.extend_from_slice(&[0u8; CHECKSUM_CHARS]);
        let checksum = polymod(&input);
        for i in 0..CHECKSUM_CHARS {
            data.push(((checksum >> (5 * (CHECKSUM_CHARS - 1 - i))) & 0x1f) as u8);
        }

        let mut out = String::with_capacity(self.prefix.len() + 1 + data.len());
        out.push_str(&self.prefix);
        out.push(':');
        out.extend(data.iter().map(|&d| CHARSET[d as usize] as char));
        out
    }

    /// Encode as a legacy base58check address.
    pub fn to_legacy(&self, network: Network) -> String {
        let version = match (network, self.kind) {
            (Network::Mainnet, AddressType::P2PKH) => LEGACY_P2PKH_MAINNET,
            (Network::Mainnet, AddressType::P2SH) => LEGACY_P2SH_MAINNET,
            (Network::Testnet, AddressType::P2PKH) => LEGACY_P2PKH_TESTNET,
            (Network::Testnet, AddressType::P2SH) => LEGACY_P2SH_TESTNET,
        };
        let mut payload = Vec::with_capacity(HASH_LEN + 1);
        payload.push(version);
        payload.extend_from_slice(&self.hash);
        base58::check_encode(&payload)
    }

    /// The same hash and type under another prefix.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Address::new(prefix, self.kind, self.hash)
    }

    /// The locking script paying to this address.
    pub fn to_script(&self) -> Script {
        match self.kind {
            AddressType::P2PKH => Script::p2pkh(&self.hash),
            AddressType::P2SH => Script::p2sh(&self.hash),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cash_address())
    }
}

impl FromStr for Address {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl serde::Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_cash_address())
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Prefix characters reduced to their low 5 bits, a zero separator, then
/// the payload.
fn checksum_input(prefix: &str, payload: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(prefix.len() + 1 + payload.len() + CHECKSUM_CHARS);
    input.extend(prefix.bytes().map(|b| b & 0x1f));
    input.push(0);
    input.extend_from_slice(payload);
    input
}

fn polymod(values: &[u8]) -> u64 {
    let mut c: u64 = 1;
    for &d in values {
        let c0 = (c >> 35) as u8;
        c = ((c & 0x07_ffff_ffff) << 5) ^ d as u64;
        for (i, generator) in GENERATORS.iter().enumerate() {
            if (c0 >> i) & 1 == 1 {
                c ^= generator;
            }
        }
    }
    c ^ 1
}

/// Regroup bits from `from`-bit to `to`-bit words.
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, ScriptError> {
    let max = (1u32 << to) - 1;
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);
    for &value in data {
        acc = ((acc << from) | value as u32) & 0xffff;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max) as u8);
        }
    }
    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & max) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & max) != 0 {
        return Err(ScriptError::Decode("invalid padding".to_string()));
    }
    Ok(out)
}
