//! Configuration types for OpenMatch trading pairs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Per-pair configuration, overriding the engine-wide notional defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairConfig {
    /// Base asset (e.g., "BTC").
    pub base: String,
    /// Quote asset (e.g., "USDT").
    pub quote: String,
    /// Minimum notional (`price * amount`) accepted for this pair.
    pub min_notional: Decimal,
    /// Maximum notional accepted for this pair.
    pub max_notional: Decimal,
}

impl PairConfig {
    /// A pair config using the engine-wide default notional bounds.
    #[must_use]
    pub fn with_defaults(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
            min_notional: constants::MIN_NOTIONAL,
            max_notional: constants::MAX_NOTIONAL,
        }
    }

    /// Returns the pair symbol (e.g., "BTC/USDT").
    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }
}
