//! The in-memory order book for a single trading pair.
//!
//! Uses `BTreeMap` for price-level ordering:
//! - **Bids** (buys): `BTreeMap<Reverse<Decimal>, PriceLevel>` -- highest price first
//! - **Asks** (sells): `BTreeMap<Decimal, PriceLevel>` -- lowest price first
//!
//! An auxiliary `HashMap<OrderId, (Side, Price)>` enables O(log N) cancellation.
//!
//! Only resting `LIMIT` orders with status `OPEN` ever live here (spec
//! §4.4): a `MARKET` order either fills immediately against this book or
//! is cancelled, but never rests on it.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use openmatch_types::{MarketPair, OpenmatchError, Order, OrderId, OrderSide, Result};
use rust_decimal::Decimal;

use crate::price_level::PriceLevel;

/// The order book for a single market pair.
#[derive(Debug)]
pub struct OrderBook {
    /// The market this book serves (e.g., BTC/USDT).
    pub market: MarketPair,
    /// Buy side: highest price first (`Reverse` key). `pub(crate)` so the
    /// matcher can walk and mutate levels directly during a fill loop.
    pub(crate) bids: BTreeMap<Reverse<Decimal>, PriceLevel>,
    /// Sell side: lowest price first.
    pub(crate) asks: BTreeMap<Decimal, PriceLevel>,
    /// Fast lookup: `OrderId -> (side, price)` for O(log N) cancel.
    pub(crate) index: HashMap<OrderId, (OrderSide, Decimal)>,
}

impl OrderBook {
    /// Create a new empty order book for the given market.
    #[must_use]
    pub fn new(market: MarketPair) -> Self {
        Self {
            market,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    // =================================================================
    // Insertion
    // =================================================================

    /// Insert a resting LIMIT order into the book at its price.
    ///
    /// # Errors
    /// Returns `InvalidOrder` if an order with this id is already resting.
    pub fn insert_order(&mut self, order: Order) -> Result<()> {
        if self.index.contains_key(&order.id) {
            return Err(OpenmatchError::InvalidOrder {
                reason: format!("order {} already in book", order.id),
            });
        }

        let price = order.price;
        self.index.insert(order.id, (order.side, price));

        match order.side {
            OrderSide::Buy => {
                self.bids
                    .entry(Reverse(price))
                    .or_insert_with(|| PriceLevel::new(price))
                    .push_back(order);
            }
            OrderSide::Sell => {
                self.asks
                    .entry(price)
                    .or_insert_with(|| PriceLevel::new(price))
                    .push_back(order);
            }
        }
        Ok(())
    }

    // =================================================================
    // Cancellation
    // =================================================================

    /// Cancel an order by ID. Returns the removed order.
    ///
    /// # Errors
    /// Returns `OrderNotFound` if no resting order has this id.
    pub fn cancel_order(&mut self, order_id: &OrderId) -> Result<Order> {
        let (side, price) = self
            .index
            .remove(order_id)
            .ok_or(OpenmatchError::OrderNotFound(*order_id))?;

        let order = match side {
            OrderSide::Buy => {
                let level = self
                    .bids
                    .get_mut(&Reverse(price))
                    .ok_or(OpenmatchError::OrderNotFound(*order_id))?;
                let order = level
                    .remove_order(order_id)
                    .ok_or(OpenmatchError::OrderNotFound(*order_id))?;
                if level.is_empty() {
                    self.bids.remove(&Reverse(price));
                }
                order
            }
            OrderSide::Sell => {
                let level = self
                    .asks
                    .get_mut(&price)
                    .ok_or(OpenmatchError::OrderNotFound(*order_id))?;
                let order = level
                    .remove_order(order_id)
                    .ok_or(OpenmatchError::OrderNotFound(*order_id))?;
                if level.is_empty() {
                    self.asks.remove(&price);
                }
                order
            }
        };

        Ok(order)
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Best (highest) bid price, or `None` if no bids.
    #[must_use]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next().map(|r| r.0)
    }

    /// Best (lowest) ask price, or `None` if no asks.
    #[must_use]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    /// Total number of orders currently resting in the book.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Number of distinct bid price levels.
    #[must_use]
    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    /// Number of distinct ask price levels.
    #[must_use]
    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    /// Returns `true` if the book has no orders on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check if an order exists in the book.
    #[must_use]
    pub fn contains_order(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    // =================================================================
    // Snapshot (for the read API)
    // =================================================================

    /// Order-book snapshot per spec §4.2: all OPEN orders, optionally
    /// filtered by side, in price-time priority order.
    #[must_use]
    pub fn snapshot(&self, side: Option<OrderSide>) -> Vec<Order> {
        let mut out = Vec::new();
        if side.is_none() || side == Some(OrderSide::Buy) {
            for level in self.bids.values() {
                out.extend(level.orders.iter().cloned());
            }
        }
        if side.is_none() || side == Some(OrderSide::Sell) {
            for level in self.asks.values() {
                out.extend(level.orders.iter().cloned());
            }
        }
        out
    }
}
