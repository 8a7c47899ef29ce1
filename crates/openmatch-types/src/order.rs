//! Order types for the OpenMatch matching engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MarketPair, OrderId, UserId};

/// Which side of the book this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// The type of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limit => write!(f, "LIMIT"),
            Self::Market => write!(f, "MARKET"),
        }
    }
}

/// Lifecycle status of an order.
///
/// `Pending` is transient (pre-lock, never observed by other transactions);
/// `Open` covers both resting-untouched and partially-filled — the spec
/// does not split those into separate states. `Filled` and `Cancelled` are
/// terminal: no field but observability metadata changes after reaching them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Open,
    Filled,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Open => write!(f, "OPEN"),
            Self::Filled => write!(f, "FILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl OrderStatus {
    /// `true` for the two terminal statuses, after which no field but
    /// observability metadata may change (P5).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled)
    }
}

/// Core order record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub market: MarketPair,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub status: OrderStatus,
    /// Scale-2 limit price. For MARKET orders this is not used to gate
    /// matches (see the matching engine); it is still stored, matching the
    /// original prototype's non-optional price column.
    pub price: Decimal,
    /// Scale-8 total base quantity requested.
    pub amount: Decimal,
    /// Scale-8 cumulative filled quantity. `0 <= filled_amount <= amount`.
    pub filled_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Quantity still unfilled: `amount - filled_amount`.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.amount - self.filled_amount
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.filled_amount >= self.amount
    }

    /// The currency and amount a fresh placement of this order must lock:
    /// BUY locks `price * amount` quote, SELL locks `amount` base.
    #[must_use]
    pub fn required_lock(&self) -> (&str, Decimal) {
        match self.side {
            OrderSide::Buy => (&self.market.quote, self.price * self.amount),
            OrderSide::Sell => (&self.market.base, self.amount),
        }
    }

    /// The currency and amount still reserved by the unfilled remainder,
    /// to release on cancellation: BUY unlocks `price * remaining` quote,
    /// SELL unlocks `remaining` base.
    #[must_use]
    pub fn residual_lock(&self) -> (&str, Decimal) {
        match self.side {
            OrderSide::Buy => (&self.market.quote, self.price * self.remaining()),
            OrderSide::Sell => (&self.market.base, self.remaining()),
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy_limit(side: OrderSide, price: Decimal, amount: Decimal) -> Self {
        Self {
            id: OrderId::new(0),
            user_id: UserId::new(),
            market: MarketPair::new("BTC", "USDT"),
            side,
            order_type: OrderType::Limit,
            status: OrderStatus::Open,
            price,
            amount,
            filled_amount: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
