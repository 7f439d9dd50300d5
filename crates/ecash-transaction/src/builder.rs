//! Fee-aware transaction builder.
//!
//! A [`TxBuilder`] holds inputs (each with an optional [`Signatory`]) and
//! outputs, one of which may be a leftover output: a script without a
//! value that receives whatever the inputs have left after the fixed
//! outputs and the fee.
//!
//! Signing with a leftover output runs in two passes. The estimation pass
//! signs a dummy transaction with [`EccDummy`] to measure its size, which
//! fixes the fee and so the leftover amount. If the leftover would be dust
//! the output is dropped and the size measured again, since removing an
//! output can also shrink the output-count varint. The real pass then
//! signs the final transaction.

use ecash_primitives::ec::{Ecc, EccDummy, Secp256k1Ecc};
use ecash_script::Script;
use tracing::debug;

use crate::config::{FeeConfig, FeeRate};
use crate::input::TxInput;
use crate::output::TxOutput;
use crate::signatory::Signatory;
use crate::transaction::{Tx, DEFAULT_TX_VERSION};
use crate::unsigned_tx::UnsignedTx;
use crate::TransactionError;

/// An input together with the signatory that unlocks it.
pub struct TxBuilderInput {
    /// The input. Its `script` is kept as-is when there is no signatory.
    pub input: TxInput,
    /// Produces the unlocking script; `None` for pre-signed inputs.
    pub signatory: Option<Box<dyn Signatory + Send + Sync>>,
}

impl TxBuilderInput {
    /// An input without a signatory.
    pub fn new(input: TxInput) -> Self {
        TxBuilderInput {
            input,
            signatory: None,
        }
    }

    /// An input signed by `signatory`.
    pub fn with_signatory(
        input: TxInput,
        signatory: impl Signatory + Send + Sync + 'static,
    ) -> Self {
        TxBuilderInput {
            input,
            signatory: Some(Box::new(signatory)),
        }
    }
}

impl std::fmt::Debug for TxBuilderInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxBuilderInput")
            .field("input", &self.input)
            .field("signatory", &self.signatory.as_ref().map(|_| ".."))
            .finish()
    }
}

/// An output of the builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxBuilderOutput {
    /// An output with a fixed value.
    Fixed(TxOutput),
    /// Receives the remaining input value after fees.
    Leftover(Script),
}

impl From<TxOutput> for TxBuilderOutput {
    fn from(output: TxOutput) -> Self {
        TxBuilderOutput::Fixed(output)
    }
}

impl From<Script> for TxBuilderOutput {
    fn from(script: Script) -> Self {
        TxBuilderOutput::Leftover(script)
    }
}

/// Parameters of [`TxBuilder::sign`].
#[derive(Clone, Copy)]
pub struct SignOptions<'a> {
    /// Curve implementation used for the real signing pass.
    pub ecc: &'a dyn Ecc,
    /// Fee rate in sats per kB; required with a leftover output.
    pub fee_per_kb: Option<FeeRate>,
    /// Dust limit in sats; required with a leftover output.
    pub dust_sats: Option<u64>,
}

impl<'a> SignOptions<'a> {
    /// Sign with `ecc` and the settings of `config`.
    pub fn from_config(ecc: &'a dyn Ecc, config: &FeeConfig) -> Self {
        SignOptions {
            ecc,
            fee_per_kb: config.fee_per_kb,
            dust_sats: config.dust_sats,
        }
    }
}

impl Default for SignOptions<'static> {
    /// Real secp256k1 signing with no fee settings.
    fn default() -> Self {
        SignOptions {
            ecc: &Secp256k1Ecc,
            fee_per_kb: None,
            dust_sats: None,
        }
    }
}

impl std::fmt::Debug for SignOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignOptions")
            .field("fee_per_kb", &self.fee_per_kb)
            .field("dust_sats", &self.dust_sats)
            .finish_non_exhaustive()
    }
}

/// Builds and signs transactions.
#[derive(Debug)]
pub struct TxBuilder {
    /// Version of the built transaction.
    pub version: u32,
    /// Inputs in order.
    pub inputs: Vec<TxBuilderInput>,
    /// Outputs in order; at most one may be a leftover output.
    pub outputs: Vec<TxBuilderOutput>,
    /// Locktime of the built transaction.
    pub locktime: u32,
}

impl Default for TxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TxBuilder {
    /// An empty builder with the default version and locktime 0.
    pub fn new() -> Self {
        TxBuilder {
            version: DEFAULT_TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            locktime: 0,
        }
    }

    /// A builder reproducing `tx`.
    ///
    /// Inputs keep their unlocking scripts and get no signatory, so
    /// signing the builder returns `tx` unchanged.
    pub fn from_tx(tx: &Tx) -> Self {
        TxBuilder {
            version: tx.version,
            inputs: tx.inputs.iter().cloned().map(TxBuilderInput::new).collect(),
            outputs: tx.outputs.iter().cloned().map(TxBuilderOutput::Fixed).collect(),
            locktime: tx.locktime,
        }
    }

    /// Append an input without a signatory.
    pub fn add_input(&mut self, input: TxInput) -> &mut Self {
        self.inputs.push(TxBuilderInput::new(input));
        self
    }

    /// Append an input signed by `signatory`.
    pub fn add_signed_input(
        &mut self,
        input: TxInput,
        signatory: impl Signatory + Send + Sync + 'static,
    ) -> &mut Self {
        self.inputs.push(TxBuilderInput::with_signatory(input, signatory));
        self
    }

    /// Append a fixed output.
    pub fn add_output(&mut self, output: TxOutput) -> &mut Self {
        self.outputs.push(TxBuilderOutput::Fixed(output));
        self
    }

    /// Append a leftover output locked by `script`.
    pub fn add_leftover(&mut self, script: Script) -> &mut Self {
        self.outputs.push(TxBuilderOutput::Leftover(script));
        self
    }

    /// Sign all inputs and return the finished transaction.
    ///
    /// Without a leftover output this is a single signing pass and the fee
    /// settings are ignored. With one, the settings are validated first
    /// (sign data on every input, then `fee_per_kb` set and integral, then
    /// `dust_sats` set) and the leftover amount is computed as
    /// `inputs - fixed outputs - ceil(size * fee_per_kb / 1000)`.
    ///
    /// # Returns
    /// The signed transaction, `Config` for bad settings,
    /// `InsufficientFunds` if the inputs cannot pay the fixed outputs and
    /// the fee, or any error a signatory returns.
    pub fn sign(&self, options: SignOptions<'_>) -> Result<Tx, TransactionError> {
        let leftover_idx = self.leftover_idx()?;
        let Some(leftover_idx) = leftover_idx else {
            let outputs = self.fixed_outputs(None);
            return self.sign_pass(outputs, options.ecc, UnsignedTx::from_tx);
        };

        let input_sats = self.input_sats()?;
        let fee_per_kb = match options.fee_per_kb {
            None => {
                return Err(TransactionError::Config(
                    "Using a leftover output requires setting feePerKb".to_string(),
                ))
            }
            Some(rate) => rate.as_integral().ok_or_else(|| {
                TransactionError::Config("feePerKb must be an integer".to_string())
            })?,
        };
        let dust_sats = options.dust_sats.ok_or_else(|| {
            TransactionError::Config("Using a leftover output requires setting dustLimit".to_string())
        })?;

        let fixed_sats = self
            .outputs
            .iter()
            .map(|output| match output {
                TxBuilderOutput::Fixed(output) => output.value as u128,
                TxBuilderOutput::Leftover(_) => 0,
            })
            .sum::<u128>();
        let available = input_sats as i128 - fixed_sats as i128;

        // Estimate with the leftover present; its value does not change the size.
        let tentative = u64::try_from(available.max(0)).unwrap_or(u64::MAX);
        let size = self.estimate_size(self.fixed_outputs(Some((leftover_idx, tentative))))?;
        let mut fee = calc_fee(size, fee_per_kb);
        let leftover = available - fee as i128;
        debug!(size, fee, leftover = %leftover, "estimated tx with leftover output");

        let final_outputs = if leftover < dust_sats as i128 {
            let size = self.estimate_size(self.fixed_outputs(None))?;
            fee = calc_fee(size, fee_per_kb);
            debug!(size, fee, dust_sats, "leftover below dust, dropping leftover output");
            self.fixed_outputs(None)
        } else {
            let leftover = u64::try_from(leftover).map_err(|_| {
                TransactionError::Config(format!("leftover value {} out of range", leftover))
            })?;
            self.fixed_outputs(Some((leftover_idx, leftover)))
        };

        if available < fee as i128 {
            return Err(insufficient_funds(input_sats, available, fee));
        }

        self.sign_pass(final_outputs, options.ecc, UnsignedTx::from_tx)
    }

    // -----------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------

    fn leftover_idx(&self) -> Result<Option<usize>, TransactionError> {
        let mut leftovers = self
            .outputs
            .iter()
            .enumerate()
            .filter(|(_, output)| matches!(output, TxBuilderOutput::Leftover(_)))
            .map(|(idx, _)| idx);
        let first = leftovers.next();
        if leftovers.next().is_some() {
            return Err(TransactionError::Config(
                "Only one leftover output is allowed".to_string(),
            ));
        }
        Ok(first)
    }

    fn input_sats(&self) -> Result<u64, TransactionError> {
        let mut total = 0u64;
        for input in &self.inputs {
            let sign_data = input.input.sign_data.as_ref().ok_or_else(|| {
                TransactionError::Config(
                    "Using a leftover output requires setting SignData.value for all inputs"
                        .to_string(),
                )
            })?;
            total = total.checked_add(sign_data.value).ok_or_else(|| {
                TransactionError::Config("sum of input values overflows".to_string())
            })?;
        }
        Ok(total)
    }

    /// The output list with the leftover either valued or removed.
    fn fixed_outputs(&self, leftover: Option<(usize, u64)>) -> Vec<TxOutput> {
        self.outputs
            .iter()
            .enumerate()
            .filter_map(|(idx, output)| match output {
                TxBuilderOutput::Fixed(output) => Some(output.clone()),
                TxBuilderOutput::Leftover(script) => match leftover {
                    Some((leftover_idx, value)) if leftover_idx == idx => {
                        Some(TxOutput::new(value, script.clone()))
                    }
                    _ => None,
                },
            })
            .collect()
    }

    fn estimate_size(&self, outputs: Vec<TxOutput>) -> Result<usize, TransactionError> {
        Ok(self
            .sign_pass(outputs, &EccDummy, UnsignedTx::dummy_from_tx)?
            .ser_size())
    }

    /// Sign every input that has a signatory against `outputs`.
    fn sign_pass(
        &self,
        outputs: Vec<TxOutput>,
        ecc: &dyn Ecc,
        wrap: fn(Tx) -> UnsignedTx,
    ) -> Result<Tx, TransactionError> {
        let unsigned = wrap(Tx {
            version: self.version,
            inputs: self.inputs.iter().map(|input| input.input.clone()).collect(),
            outputs,
            locktime: self.locktime,
        });

        let mut scripts = Vec::with_capacity(self.inputs.len());
        for (builder_input, unsigned_input) in self.inputs.iter().zip(unsigned.inputs()) {
            let script = match &builder_input.signatory {
                Some(signatory) => Some(signatory.sign_input(ecc, &unsigned_input)?),
                None => None,
            };
            scripts.push(script);
        }

        let mut tx = unsigned.into_tx();
        for (input, script) in tx.inputs.iter_mut().zip(scripts) {
            if let Some(script) = script {
                input.script = Some(script);
            }
        }
        Ok(tx)
    }
}

/// `ceil(size * fee_per_kb / 1000)`.
pub fn calc_fee(size: usize, fee_per_kb: u64) -> u64 {
    let fee = (size as u128 * fee_per_kb as u128).div_ceil(1000);
    u64::try_from(fee).unwrap_or(u64::MAX)
}

fn insufficient_funds(input_sats: u64, available: i128, required_fee: u64) -> TransactionError {
    let shortfall = required_fee as i128 - available;
    TransactionError::InsufficientFunds {
        input_sats,
        available_fee: i64::try_from(available).unwrap_or(i64::MIN),
        required_fee,
        shortfall: u64::try_from(shortfall).unwrap_or(u64::MAX),
    }
}

impl From<Tx> for TxBuilder {
    fn from(tx: Tx) -> Self {
        TxBuilder::from_tx(&tx)
    }
}
