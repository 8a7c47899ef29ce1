//! Trading pair types.

use serde::{Deserialize, Serialize};

/// A named trading pair (e.g., BTC/USDT). Immutable after creation except
/// `is_active`, which gates new order placement without touching orders
/// already resting on the book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingPair {
    /// Unique short symbol, e.g. "BTC/USDT".
    pub symbol: String,
    /// Base currency code, e.g. "BTC".
    pub base_currency: String,
    /// Quote currency code, e.g. "USDT".
    pub quote_currency: String,
    /// Gate for new order placement. Deactivating a pair does not cancel
    /// orders already resting on it.
    pub is_active: bool,
}

impl TradingPair {
    #[must_use]
    pub fn new(base_currency: impl Into<String>, quote_currency: impl Into<String>) -> Self {
        let base_currency = base_currency.into();
        let quote_currency = quote_currency.into();
        let symbol = format!("{base_currency}/{quote_currency}");
        Self {
            symbol,
            base_currency,
            quote_currency,
            is_active: true,
        }
    }
}
