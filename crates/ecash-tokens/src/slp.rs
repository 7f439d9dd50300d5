//! SLP: one token operation in a single `OP_RETURN` output.
//!
//! ```text
//! OP_RETURN "SLP\0" <token_type> <tx_type> <fields...>
//! ```
//!
//! Every field is a push, even single bytes (never `OP_1`..`OP_16`), and an
//! empty field is `OP_PUSHDATA1 0`. Atoms are 8-byte big-endian and token
//! ids are in display order.

use ecash_primitives::util::ByteWriter;
use ecash_script::opcodes::{OP_PUSHDATA1, OP_RETURN};
use ecash_script::{push_bytes_op, Op, PushOp, Script};

use crate::types::{GenesisInfo, SLP_FUNGIBLE, SLP_MINT_VAULT, SLP_NFT1_CHILD, SLP_NFT1_GROUP};
use crate::{TokenError, TokenId};

/// Protocol identifier pushed right after `OP_RETURN`.
pub const SLP_LOKAD_ID: &[u8; 4] = b"SLP\0";

/// Most atoms a SEND or mint-vault MINT can carry (outputs 1 to 19).
pub const SLP_MAX_SEND_OUTPUTS: usize = 19;

/// Most decimal places a GENESIS may declare.
pub const SLP_MAX_DECIMALS: u8 = 9;

/// GENESIS: create a token and mint its initial atoms to output 1.
///
/// # Arguments
/// * `token_type` - One of the `SLP_*` token types.
/// * `genesis_info` - Ticker, name, url, hash and decimals. Mint vault
///   tokens also need `mint_vault_scripthash`.
/// * `initial_atoms` - Atoms created on output 1.
/// * `mint_baton_out_idx` - Output of the mint baton (2 or higher); `None`
///   fixes the supply. Ignored for mint vault tokens.
///
/// # Returns
/// The `OP_RETURN` script, or `Decode` for an unknown token type or a
/// field of the wrong size.
pub fn slp_genesis(
    token_type: u8,
    genesis_info: &GenesisInfo,
    initial_atoms: u64,
    mint_baton_out_idx: Option<u8>,
) -> Result<Script, TokenError> {
    check_token_type(token_type)?;
    let hash = genesis_info.hash.as_deref().unwrap_or_default();
    if !hash.is_empty() && hash.len() != 32 {
        return Err(TokenError::Decode(format!(
            "hash must be 32 bytes, but got {}",
            hash.len()
        )));
    }
    let decimals = genesis_info.decimals.unwrap_or(0);
    if decimals > SLP_MAX_DECIMALS {
        return Err(TokenError::Decode(format!(
            "decimals must be at most {}, but got {}",
            SLP_MAX_DECIMALS, decimals
        )));
    }

    let mut ops = header(token_type, b"GENESIS");
    ops.push(slp_push(text_bytes(&genesis_info.token_ticker))?);
    ops.push(slp_push(text_bytes(&genesis_info.token_name))?);
    ops.push(slp_push(text_bytes(&genesis_info.url))?);
    ops.push(slp_push(hash.to_vec())?);
    ops.push(slp_push(vec![decimals])?);
    if token_type == SLP_MINT_VAULT {
        let scripthash = genesis_info.mint_vault_scripthash.as_deref().unwrap_or_default();
        if scripthash.len() != 20 {
            return Err(TokenError::Decode(format!(
                "mintVaultScripthash must be 20 bytes, but got {}",
                scripthash.len()
            )));
        }
        ops.push(slp_push(scripthash.to_vec())?);
    } else {
        ops.push(baton_push(mint_baton_out_idx)?);
    }
    ops.push(atoms_push(initial_atoms));
    Ok(Script::from_ops(ops))
}

/// MINT: create more atoms of a baton-minted token on output 1.
///
/// Mint vault tokens use [`slp_mint_vault`]; NFT1 children cannot mint.
///
/// # Returns
/// The `OP_RETURN` script, or `Decode` for a token type that cannot mint
/// with a baton.
pub fn slp_mint(
    token_id: &TokenId,
    token_type: u8,
    additional_atoms: u64,
    mint_baton_out_idx: Option<u8>,
) -> Result<Script, TokenError> {
    check_token_type(token_type)?;
    match token_type {
        SLP_MINT_VAULT => {
            return Err(TokenError::Decode(
                "SLP_MINT_VAULT tokens must be minted with slp_mint_vault".to_string(),
            ))
        }
        SLP_NFT1_CHILD => {
            return Err(TokenError::Decode(
                "SLP_NFT1_CHILD cannot have MINT transactions".to_string(),
            ))
        }
        _ => {}
    }
    let mut ops = header(token_type, b"MINT");
    ops.push(push_bytes_op(token_id.to_be_bytes()));
    ops.push(baton_push(mint_baton_out_idx)?);
    ops.push(atoms_push(additional_atoms));
    Ok(Script::from_ops(ops))
}

/// MINT of a mint vault token: atoms for outputs 1, 2, ... in order.
///
/// Valid only in a transaction that spends from the vault script.
pub fn slp_mint_vault(
    token_id: &TokenId,
    additional_atoms_array: &[u64],
) -> Result<Script, TokenError> {
    check_atoms_len(additional_atoms_array)?;
    let mut ops = header(SLP_MINT_VAULT, b"MINT");
    ops.push(push_bytes_op(token_id.to_be_bytes()));
    ops.extend(additional_atoms_array.iter().copied().map(atoms_push));
    Ok(Script::from_ops(ops))
}

/// SEND: move atoms to outputs 1, 2, ... in order.
///
/// # Returns
/// The `OP_RETURN` script, or `Decode` for an unknown token type or an
/// empty or longer than 19 atoms list.
pub fn slp_send(
    token_id: &TokenId,
    token_type: u8,
    send_atoms_array: &[u64],
) -> Result<Script, TokenError> {
    check_token_type(token_type)?;
    check_atoms_len(send_atoms_array)?;
    let mut ops = header(token_type, b"SEND");
    ops.push(push_bytes_op(token_id.to_be_bytes()));
    ops.extend(send_atoms_array.iter().copied().map(atoms_push));
    Ok(Script::from_ops(ops))
}

/// BURN: destroy atoms without giving them to any output.
pub fn slp_burn(token_id: &TokenId, token_type: u8, burn_atoms: u64) -> Result<Script, TokenError> {
    check_token_type(token_type)?;
    let mut ops = header(token_type, b"BURN");
    ops.push(push_bytes_op(token_id.to_be_bytes()));
    ops.push(atoms_push(burn_atoms));
    Ok(Script::from_ops(ops))
}

// -----------------------------------------------------------------------
// Internal helpers
// -----------------------------------------------------------------------

fn check_token_type(token_type: u8) -> Result<(), TokenError> {
    match token_type {
        SLP_FUNGIBLE | SLP_MINT_VAULT | SLP_NFT1_GROUP | SLP_NFT1_CHILD => Ok(()),
        _ => Err(TokenError::Decode(format!("Unknown token type {}", token_type))),
    }
}

fn check_atoms_len(atoms: &[u64]) -> Result<(), TokenError> {
    if atoms.is_empty() {
        return Err(TokenError::Decode("sendAtomsArray cannot be empty".to_string()));
    }
    if atoms.len() > SLP_MAX_SEND_OUTPUTS {
        return Err(TokenError::Decode(format!(
            "Cannot use more than {} amounts, but got {}",
            SLP_MAX_SEND_OUTPUTS,
            atoms.len()
        )));
    }
    Ok(())
}

fn header(token_type: u8, tx_type: &[u8]) -> Vec<Op> {
    vec![
        Op::Code(OP_RETURN),
        push_bytes_op(SLP_LOKAD_ID.to_vec()),
        push_bytes_op(vec![token_type]),
        push_bytes_op(tx_type),
    ]
}

/// A field push; empty fields use `OP_PUSHDATA1 0` instead of `OP_0`.
fn slp_push(data: Vec<u8>) -> Result<Op, TokenError> {
    if data.is_empty() {
        return Ok(Op::Push(PushOp::new(OP_PUSHDATA1, data)?));
    }
    Ok(push_bytes_op(data))
}

fn baton_push(mint_baton_out_idx: Option<u8>) -> Result<Op, TokenError> {
    match mint_baton_out_idx {
        None => slp_push(Vec::new()),
        Some(idx) if idx < 2 => Err(TokenError::Decode(format!(
            "mintBatonOutIdx must be at least 2, but got {}",
            idx
        ))),
        Some(idx) => slp_push(vec![idx]),
    }
}

fn atoms_push(atoms: u64) -> Op {
    let mut writer = ByteWriter::with_capacity(8);
    writer.write_u64_be(atoms);
    push_bytes_op(writer.into_bytes())
}

fn text_bytes(text: &Option<String>) -> Vec<u8> {
    text.as_deref().map(|s| s.as_bytes().to_vec()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUX: &str = "7e7dacd72dcdb14e00a03dd3aff47f019ed51a6f1f4e4f532ae50692f62bc4e5";

    fn bux() -> TokenId {
        TokenId::from_hex(BUX).expect("valid id")
    }

    /// Matches BUX mint tx 459a8dbf3b31750ddaaed4d2c6a12fb42ef1b83fc0f67175f43332962932aa7d.
    #[test]
    fn test_mint_bux() {
        let script = slp_mint(&bux(), SLP_FUNGIBLE, 12500, Some(2)).expect("encodes");
        assert_eq!(
            script.to_hex(),
            format!("6a04534c50000101044d494e5420{}01020800000000000030d4", BUX)
        );
    }

    /// Matches BUX burn tx 94006ad05803922d743a44a51145c13d91826c7e97ffbe8cb0c994653166762e.
    #[test]
    fn test_burn_bux() {
        let script = slp_burn(&bux(), SLP_FUNGIBLE, 21500000).expect("encodes");
        assert_eq!(
            script.to_hex(),
            format!("6a04534c50000101044255524e20{}080000000001481060", BUX)
        );
    }

    #[test]
    fn test_genesis_layout() {
        let info = GenesisInfo {
            token_ticker: Some("T".to_string()),
            decimals: Some(4),
            ..GenesisInfo::default()
        };
        let script = slp_genesis(SLP_FUNGIBLE, &info, 1000, None).expect("encodes");
        assert_eq!(
            script.to_hex(),
            concat!(
                "6a04534c500001010747454e45534953",
                "0154",         // ticker
                "4c00",         // name
                "4c00",         // url
                "4c00",         // hash
                "0104",         // decimals
                "4c00",         // no baton
                "0800000000000003e8",
            )
        );

        let with_baton = slp_genesis(SLP_NFT1_GROUP, &info, 0, Some(2)).expect("encodes");
        let ops: Vec<Op> = with_baton.ops().collect::<Result<_, _>>().expect("parses");
        assert_eq!(ops[2].push_data(), Some(&[SLP_NFT1_GROUP][..]));
        assert_eq!(ops[9].push_data(), Some(&[2u8][..]));
    }

    #[test]
    fn test_genesis_mint_vault() {
        let info = GenesisInfo {
            mint_vault_scripthash: Some(vec![0x11; 20]),
            ..GenesisInfo::default()
        };
        let script = slp_genesis(SLP_MINT_VAULT, &info, 5, Some(2)).expect("encodes");
        let ops: Vec<Op> = script.ops().collect::<Result<_, _>>().expect("parses");
        assert_eq!(ops[9].push_data(), Some(&[0x11; 20][..]));

        let err = slp_genesis(SLP_MINT_VAULT, &GenesisInfo::default(), 5, None)
            .expect_err("vault hash missing");
        assert_eq!(err.to_string(), "mintVaultScripthash must be 20 bytes, but got 0");
    }

    #[test]
    fn test_send_and_mint_vault() {
        let script = slp_send(&bux(), SLP_FUNGIBLE, &[1000, 1500]).expect("encodes");
        assert_eq!(
            script.to_hex(),
            format!(
                "6a04534c500001010453454e4420{}0800000000000003e808{}",
                BUX, "00000000000005dc"
            )
        );
        let vault = slp_mint_vault(&bux(), &[500, 600]).expect("encodes");
        assert!(vault.to_hex().starts_with("6a04534c50000102044d494e5420"));
    }

    #[test]
    fn test_invalid_usage() {
        let id = TokenId::from_hex(&"1".repeat(64)).expect("valid id");
        let msg = |r: Result<Script, TokenError>| r.expect_err("invalid").to_string();

        assert_eq!(msg(slp_genesis(99, &GenesisInfo::default(), 0, None)), "Unknown token type 99");
        assert_eq!(msg(slp_mint(&id, 77, 0, None)), "Unknown token type 77");
        assert_eq!(msg(slp_send(&id, 66, &[])), "Unknown token type 66");
        assert_eq!(msg(slp_burn(&id, 55, 0)), "Unknown token type 55");
        assert_eq!(msg(slp_mint_vault(&id, &[])), "sendAtomsArray cannot be empty");
        assert_eq!(msg(slp_send(&id, SLP_FUNGIBLE, &[])), "sendAtomsArray cannot be empty");
        assert_eq!(
            msg(slp_send(&id, SLP_FUNGIBLE, &[0; 20])),
            "Cannot use more than 19 amounts, but got 20"
        );
        assert_eq!(
            msg(slp_mint_vault(&id, &[0; 20])),
            "Cannot use more than 19 amounts, but got 20"
        );
        assert_eq!(
            msg(slp_mint(&id, SLP_NFT1_CHILD, 1, None)),
            "SLP_NFT1_CHILD cannot have MINT transactions"
        );
        assert!(slp_mint(&id, SLP_MINT_VAULT, 1, None).is_err());
        assert!(slp_mint(&id, SLP_FUNGIBLE, 1, Some(1)).is_err());
        let bad_hash = GenesisInfo {
            hash: Some(vec![0; 31]),
            ..GenesisInfo::default()
        };
        assert!(slp_genesis(SLP_FUNGIBLE, &bad_hash, 0, None).is_err());
        let bad_decimals = GenesisInfo {
            decimals: Some(10),
            ..GenesisInfo::default()
        };
        assert!(slp_genesis(SLP_FUNGIBLE, &bad_decimals, 0, None).is_err());
        assert!(slp_send(&id, SLP_NFT1_CHILD, &[0; 19]).is_ok());
    }
}
