//! Trade types produced by the OpenMatch matching engine.
//!
//! A [`Trade`] is an ephemeral record of a single fill between a taker and
//! a maker order. It is never persisted — the logical schema has no trade
//! table (spec §6) — it exists only to carry the structured "trade" log
//! event and to let callers observe what happened during a `place_order`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MarketPair, OrderId, TradeId, UserId};

/// A single fill produced by the matching engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub market: MarketPair,
    pub taker_order_id: OrderId,
    pub taker_user_id: UserId,
    pub maker_order_id: OrderId,
    pub maker_user_id: UserId,
    /// Execution price — always the maker's resting price (price-improvement
    /// rule, spec §4.4).
    pub price: Decimal,
    /// Executed quantity in base currency.
    pub quantity: Decimal,
    /// Quote value of the fill: `price * quantity`, rounded half-even to
    /// scale 2.
    pub quote_value: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    #[must_use]
    pub fn buyer_id(&self, taker_is_buyer: bool) -> UserId {
        if taker_is_buyer {
            self.taker_user_id
        } else {
            self.maker_user_id
        }
    }

    #[must_use]
    pub fn seller_id(&self, taker_is_buyer: bool) -> UserId {
        if taker_is_buyer {
            self.maker_user_id
        } else {
            self.taker_user_id
        }
    }
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trade[{}] {} {} @ {} = {}",
            self.id, self.market, self.quantity, self.price, self.quote_value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_trade() -> Trade {
        Trade {
            id: TradeId::new(),
            market: MarketPair::new("BTC", "USDT"),
            taker_order_id: OrderId::new(1),
            taker_user_id: UserId::new(),
            maker_order_id: OrderId::new(2),
            maker_user_id: UserId::new(),
            price: Decimal::new(5000000, 2),
            quantity: Decimal::ONE,
            quote_value: Decimal::new(5000000, 2),
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn buyer_and_seller_resolve_by_taker_side() {
        let t = make_trade();
        assert_eq!(t.buyer_id(true), t.taker_user_id);
        assert_eq!(t.seller_id(true), t.maker_user_id);
        assert_eq!(t.buyer_id(false), t.maker_user_id);
        assert_eq!(t.seller_id(false), t.taker_user_id);
    }

    #[test]
    fn trade_display() {
        let t = make_trade();
        let s = format!("{t}");
        assert!(s.contains("BTC/USDT"));
    }

    #[test]
    fn trade_serde_roundtrip() {
        let trade = make_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade.id, back.id);
        assert_eq!(trade.price, back.price);
    }
}
