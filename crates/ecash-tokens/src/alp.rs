//! ALP: token sections meant to be bundled into an EMPP output.
//!
//! A section is a single push payload:
//!
//! ```text
//! "SLP2" <token_type: u8> <tx_type: varsize bytes> <fields...>
//! ```
//!
//! Strings are varsize-prefixed, token ids are in internal txid order and
//! atoms are 6-byte little-endian. Lists and the baton count are a single
//! size byte of at most 127.

use ecash_primitives::util::{ByteWriter, MAX_U48};

use crate::types::{GenesisInfo, MintData, ALP_STANDARD};
use crate::{TokenError, TokenId};

/// Protocol identifier at the start of every section.
pub const ALP_LOKAD_ID: &[u8; 4] = b"SLP2";

/// Largest atoms list or baton count a section can carry.
pub const ALP_MAX_SIZE: usize = 127;

/// Largest amount of atoms a single entry can carry, `2^48 - 1`.
pub const ALP_MAX_ATOMS: u64 = MAX_U48;

/// Most decimal places a GENESIS may declare.
pub const ALP_MAX_DECIMALS: u8 = 9;

/// GENESIS section: create a token with its initial atoms and batons.
///
/// # Arguments
/// * `token_type` - Must be [`ALP_STANDARD`].
/// * `genesis_info` - Ticker, name, url, data, auth pubkey and decimals.
/// * `mint_data` - Atoms for outputs 1.., followed by `num_batons` batons.
///
/// # Returns
/// The section bytes, or `Decode` for an unknown token type, atoms above
/// `2^48 - 1` or lists longer than 127.
pub fn alp_genesis(
    token_type: u8,
    genesis_info: &GenesisInfo,
    mint_data: &MintData,
) -> Result<Vec<u8>, TokenError> {
    check_token_type(token_type)?;
    let decimals = genesis_info.decimals.unwrap_or(0);
    if decimals > ALP_MAX_DECIMALS {
        return Err(TokenError::Decode(format!(
            "decimals must be at most {}, but got {}",
            ALP_MAX_DECIMALS, decimals
        )));
    }
    let mut writer = header(token_type, b"GENESIS");
    writer.write_varsize_bytes(text_bytes(&genesis_info.token_ticker));
    writer.write_varsize_bytes(text_bytes(&genesis_info.token_name));
    writer.write_varsize_bytes(text_bytes(&genesis_info.url));
    writer.write_varsize_bytes(genesis_info.data.as_deref().unwrap_or_default());
    writer.write_varsize_bytes(genesis_info.auth_pubkey.as_deref().unwrap_or_default());
    writer.write_u8(decimals);
    write_mint_data(&mut writer, mint_data)?;
    Ok(writer.into_bytes())
}

/// MINT section: create more atoms and batons of an existing token.
pub fn alp_mint(
    token_id: &TokenId,
    token_type: u8,
    mint_data: &MintData,
) -> Result<Vec<u8>, TokenError> {
    check_token_type(token_type)?;
    let mut writer = header(token_type, b"MINT");
    writer.write_bytes(&token_id.to_le_bytes());
    write_mint_data(&mut writer, mint_data)?;
    Ok(writer.into_bytes())
}

/// SEND section: move atoms to outputs 1, 2, ... in order.
///
/// An empty list is valid and sends nothing.
pub fn alp_send(
    token_id: &TokenId,
    token_type: u8,
    send_atoms_array: &[u64],
) -> Result<Vec<u8>, TokenError> {
    check_token_type(token_type)?;
    let mut writer = header(token_type, b"SEND");
    writer.write_bytes(&token_id.to_le_bytes());
    write_atoms_array(&mut writer, send_atoms_array)?;
    Ok(writer.into_bytes())
}

/// BURN section: destroy atoms without giving them to any output.
pub fn alp_burn(
    token_id: &TokenId,
    token_type: u8,
    burn_atoms: u64,
) -> Result<Vec<u8>, TokenError> {
    check_token_type(token_type)?;
    let mut writer = header(token_type, b"BURN");
    writer.write_bytes(&token_id.to_le_bytes());
    write_atoms(&mut writer, burn_atoms)?;
    Ok(writer.into_bytes())
}

// -----------------------------------------------------------------------
// Internal helpers
// -----------------------------------------------------------------------

fn check_token_type(token_type: u8) -> Result<(), TokenError> {
    if token_type != ALP_STANDARD {
        return Err(TokenError::Decode(format!("Unknown token type {}", token_type)));
    }
    Ok(())
}

fn header(token_type: u8, tx_type: &[u8]) -> ByteWriter {
    let mut writer = ByteWriter::new();
    writer.write_bytes(ALP_LOKAD_ID);
    writer.write_u8(token_type);
    writer.write_varsize_bytes(tx_type);
    writer
}

fn write_mint_data(writer: &mut ByteWriter, mint_data: &MintData) -> Result<(), TokenError> {
    write_atoms_array(writer, &mint_data.atoms_array)?;
    if mint_data.num_batons as usize > ALP_MAX_SIZE {
        return Err(TokenError::Decode(format!(
            "numBatons must be between 0 and {}, but got {}",
            ALP_MAX_SIZE, mint_data.num_batons
        )));
    }
    writer.write_u8(mint_data.num_batons);
    Ok(())
}

fn write_atoms_array(writer: &mut ByteWriter, atoms_array: &[u64]) -> Result<(), TokenError> {
    if atoms_array.len() > ALP_MAX_SIZE {
        return Err(TokenError::Decode(format!(
            "Size must be between 0 and {}, but got {}",
            ALP_MAX_SIZE,
            atoms_array.len()
        )));
    }
    writer.write_u8(atoms_array.len() as u8);
    for &atoms in atoms_array {
        write_atoms(writer, atoms)?;
    }
    Ok(())
}

fn write_atoms(writer: &mut ByteWriter, atoms: u64) -> Result<(), TokenError> {
    writer
        .write_u48_le(atoms)
        .map_err(|_| TokenError::Decode(format!("Atoms out of range: {}", atoms)))
}

fn text_bytes(text: &Option<String>) -> &[u8] {
    text.as_deref().map(str::as_bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRD: &str = "cdcdcdcdcdc9dda4c92bb1145aa84945c024346ea66fd4b699e344e45df2e145";
    const CRD_LE: &str = "45e1f25de444e399b6d46fa66e3424c04549a85a14b12bc9a4ddc9cdcdcdcdcd";

    fn crd() -> TokenId {
        TokenId::from_hex(CRD).expect("valid id")
    }

    /// Matches the CRD genesis cdcdcdcdcdc9dda4c92bb1145aa84945c024346ea66fd4b699e344e45df2e145.
    #[test]
    fn test_genesis_crd() {
        let info = GenesisInfo {
            token_ticker: Some("CRD".to_string()),
            token_name: Some("Credo In Unum Deo".to_string()),
            url: Some("https://crd.network/token".to_string()),
            auth_pubkey: Some(
                hex::decode("0334b744e6338ad438c92900c0ed1869c3fd2c0f35a4a9b97a88447b6e2b145f10")
                    .expect("hex"),
            ),
            decimals: Some(4),
            ..GenesisInfo::default()
        };
        let mint_data = MintData {
            atoms_array: vec![],
            num_batons: 1,
        };
        let section = alp_genesis(ALP_STANDARD, &info, &mint_data).expect("encodes");
        assert_eq!(
            hex::encode(section),
            concat!(
                "534c5032000747454e455349530343524411437265646f20496e20",
                "556e756d2044656f1968747470733a2f2f6372642e6e6574776f726b2f746f6b656e00210334b744e6338a",
                "d438c92900c0ed1869c3fd2c0f35a4a9b97a88447b6e2b145f10040001",
            )
        );
    }

    /// Matches CRD tx ff06c312bef229f6f27989326d9be7e0e142aaa84538967b104b262af69f7f00.
    #[test]
    fn test_mint_crd() {
        let mint_data = MintData {
            atoms_array: vec![],
            num_batons: 127,
        };
        let section = alp_mint(&crd(), ALP_STANDARD, &mint_data).expect("encodes");
        assert_eq!(hex::encode(section), format!("534c503200044d494e54{}007f", CRD_LE));
    }

    /// Matches CRD tx 0174a5c941b74d403ad9d7857f8b23fe83dc6245f19a5dc2be5f92f1d2dc336c.
    #[test]
    fn test_send_crd() {
        let section = alp_send(&crd(), ALP_STANDARD, &[1000, 298900, 100]).expect("encodes");
        assert_eq!(
            hex::encode(section),
            format!("534c5032000453454e44{}03e80300000000948f04000000640000000000", CRD_LE)
        );
    }

    /// Matches CRD tx 916da11ae0506683be31b20464ef6cfda258ca83f0032819acacc435ddda96b0.
    #[test]
    fn test_burn_crd() {
        let section = alp_burn(&crd(), ALP_STANDARD, 50491793).expect("encodes");
        assert_eq!(
            hex::encode(section),
            format!("534c503200044255524e{}917102030000", CRD_LE)
        );
    }

    #[test]
    fn test_genesis_with_atoms() {
        let mint_data = MintData {
            atoms_array: vec![0x060504030201, 0x030201090807, 0x090807060504],
            num_batons: 99,
        };
        let section =
            alp_genesis(ALP_STANDARD, &GenesisInfo::default(), &mint_data).expect("encodes");
        assert_eq!(
            hex::encode(section),
            concat!(
                "534c5032000747454e45534953",
                "000000000000",
                "03010203040506070809010203040506070809",
                "63",
            )
        );
    }

    #[test]
    fn test_limits() {
        let id = crd();
        let msg = |r: Result<Vec<u8>, TokenError>| r.expect_err("invalid").to_string();
        assert_eq!(msg(alp_send(&id, 1, &[])), "Unknown token type 1");
        assert_eq!(
            msg(alp_burn(&id, ALP_STANDARD, ALP_MAX_ATOMS + 1)),
            "Atoms out of range: 281474976710656"
        );
        assert!(alp_burn(&id, ALP_STANDARD, ALP_MAX_ATOMS).is_ok());
        assert_eq!(
            msg(alp_send(&id, ALP_STANDARD, &[0; 128])),
            "Size must be between 0 and 127, but got 128"
        );
        assert!(alp_send(&id, ALP_STANDARD, &[0; 127]).is_ok());
        let too_many_batons = MintData {
            atoms_array: vec![],
            num_batons: 128,
        };
        assert_eq!(
            msg(alp_mint(&id, ALP_STANDARD, &too_many_batons)),
            "numBatons must be between 0 and 127, but got 128"
        );
        let bad_decimals = GenesisInfo {
            decimals: Some(10),
            ..GenesisInfo::default()
        };
        assert!(alp_genesis(ALP_STANDARD, &bad_decimals, &MintData::default()).is_err());
    }
}
