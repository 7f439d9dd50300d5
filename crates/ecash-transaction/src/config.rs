//! Fee and dust settings for the transaction builder.
//!
//! Settings can come from a TOML file or be assembled in code:
//!
//! ```toml
//! fee_per_kb = 1000
//! dust_sats = 546
//! ```

use serde::{Deserialize, Serialize};

use crate::TransactionError;

/// Network minimum relay fee in satoshis per 1000 bytes.
pub const DEFAULT_FEE_PER_KB: u64 = 1000;

/// Smallest output value the network relays.
pub const DEFAULT_DUST_SATS: u64 = 546;

/// A fee rate in satoshis per 1000 bytes.
///
/// Accepts any number so that a fractional rate read from a config file is
/// reported by `sign` instead of failing the whole config load.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeeRate {
    /// A whole number of satoshis per kB.
    Integral(u64),
    /// Any other number, including integral floats such as `1000.0`.
    Fractional(f64),
}

impl FeeRate {
    /// The rate as a whole number, if it is one and non-negative.
    pub fn as_integral(&self) -> Option<u64> {
        match *self {
            FeeRate::Integral(rate) => Some(rate),
            FeeRate::Fractional(rate)
                if rate.is_finite()
                    && rate >= 0.0
                    && rate.fract() == 0.0
                    && rate <= u64::MAX as f64 =>
            {
                Some(rate as u64)
            }
            FeeRate::Fractional(_) => None,
        }
    }
}

impl From<u64> for FeeRate {
    fn from(rate: u64) -> Self {
        FeeRate::Integral(rate)
    }
}

impl From<f64> for FeeRate {
    fn from(rate: f64) -> Self {
        FeeRate::Fractional(rate)
    }
}

/// Fee settings consumed by [`SignOptions`](crate::builder::SignOptions).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Fee rate; required when the builder has a leftover output.
    #[serde(default)]
    pub fee_per_kb: Option<FeeRate>,
    /// Dust limit; required when the builder has a leftover output.
    #[serde(default)]
    pub dust_sats: Option<u64>,
}

impl FeeConfig {
    /// The network defaults: 1000 sats/kB and a 546 sat dust limit.
    pub fn standard() -> Self {
        FeeConfig {
            fee_per_kb: Some(FeeRate::Integral(DEFAULT_FEE_PER_KB)),
            dust_sats: Some(DEFAULT_DUST_SATS),
        }
    }

    /// Create a new builder.
    pub fn builder() -> FeeConfigBuilder {
        FeeConfigBuilder::new()
    }

    /// Parse settings from TOML.
    ///
    /// # Returns
    /// The config, or `Config` if the text is not valid TOML or a field
    /// has the wrong type. Missing fields stay `None`.
    pub fn from_toml_str(text: &str) -> Result<Self, TransactionError> {
        toml::from_str(text)
            .map_err(|e| TransactionError::Config(format!("invalid fee config: {}", e)))
    }

    /// Render the settings as TOML.
    pub fn to_toml_string(&self) -> Result<String, TransactionError> {
        toml::to_string(self)
            .map_err(|e| TransactionError::Config(format!("invalid fee config: {}", e)))
    }
}

/// Builder for [`FeeConfig`].
#[derive(Debug, Default)]
pub struct FeeConfigBuilder {
    fee_per_kb: Option<FeeRate>,
    dust_sats: Option<u64>,
}

impl FeeConfigBuilder {
    /// Create a new builder with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fee rate in sats per kB.
    pub fn fee_per_kb(mut self, rate: impl Into<FeeRate>) -> Self {
        self.fee_per_kb = Some(rate.into());
        self
    }

    /// Set the dust limit in sats.
    pub fn dust_sats(mut self, dust_sats: u64) -> Self {
        self.dust_sats = Some(dust_sats);
        self
    }

    /// Build the config. Unset fields stay `None`.
    pub fn build(self) -> FeeConfig {
        FeeConfig {
            fee_per_kb: self.fee_per_kb,
            dust_sats: self.dust_sats,
        }
    }
}
