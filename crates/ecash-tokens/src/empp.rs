//! EMPP: several pushes in one `OP_RETURN` output.
//!
//! ```text
//! OP_RETURN OP_RESERVED <push 0> <push 1> ...
//! ```
//!
//! Each push is an independent entry, addressed by its position (the entry
//! index). ALP sections are entries; a single raw push that is not an ALP
//! section is tolerated as filler.

use ecash_script::opcodes::{OP_RESERVED, OP_RETURN};
use ecash_script::{push_bytes_op, Op, Script};
use tracing::debug;

use crate::alp::ALP_LOKAD_ID;
use crate::TokenError;

/// Bundle `pushes` into an EMPP script.
///
/// # Returns
/// The script, or `MalformedBundle` if there are no pushes or one of them
/// is empty.
pub fn empp_script<I, P>(pushes: I) -> Result<Script, TokenError>
where
    I: IntoIterator<Item = P>,
    P: Into<Vec<u8>>,
{
    let mut ops = vec![Op::Code(OP_RETURN), Op::Code(OP_RESERVED)];
    for push in pushes {
        let push = push.into();
        if push.is_empty() {
            return Err(TokenError::MalformedBundle("pushdata cannot be empty".to_string()));
        }
        ops.push(push_bytes_op(push));
    }
    if ops.len() == 2 {
        return Err(TokenError::MalformedBundle("no pushes".to_string()));
    }
    Ok(Script::from_ops(ops))
}

/// Split an EMPP script into its entries, in entry-index order.
///
/// # Returns
/// The pushes, or `MalformedBundle` if the script does not start with
/// `OP_RETURN OP_RESERVED`, has no pushes, contains a non-push op or an
/// empty push, or has more than one push that is not an ALP section.
pub fn parse_empp(script: &Script) -> Result<Vec<Vec<u8>>, TokenError> {
    let mut ops = script.ops();
    match (ops.next().transpose()?, ops.next().transpose()?) {
        (Some(Op::Code(OP_RETURN)), Some(Op::Code(OP_RESERVED))) => {}
        _ => return Err(malformed("missing OP_RETURN OP_RESERVED prefix")),
    }

    let mut pushes = Vec::new();
    let mut num_filler = 0;
    for op in ops {
        let push = match op? {
            Op::Push(push) => push.into_data(),
            Op::Code(opcode) => {
                return Err(malformed(&format!("non-push opcode {:#04x}", opcode)));
            }
        };
        if push.is_empty() {
            return Err(malformed("empty push"));
        }
        if !push.starts_with(ALP_LOKAD_ID) {
            num_filler += 1;
            if num_filler > 1 {
                return Err(malformed("more than one non-ALP push"));
            }
        }
        pushes.push(push);
    }
    if pushes.is_empty() {
        return Err(malformed("no pushes"));
    }
    Ok(pushes)
}

fn malformed(reason: &str) -> TokenError {
    debug!(reason, "rejecting EMPP bundle");
    TokenError::MalformedBundle(reason.to_string())
}
