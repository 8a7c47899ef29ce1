//! The Order Service façade (spec §4 overview, §6): `place_order` and
//! `cancel_order`, plus the read-only `get_user_orders`/`get_order_book`.
//!
//! `place_order` runs validate → lock → insert OPEN → match as one
//! logical transaction. The per-pair `Mutex<OrderBook>` is the critical
//! section: it is held for the whole call, so the visible match sequence
//! for a pair is serializable in commit order of `place_order` calls
//! (spec §5). The Ledger enforces its own row-level serialization
//! underneath, in canonical `(user_id, currency)` order.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use openmatch_ledger::Ledger;
use openmatch_matchcore::OrderBook;
use openmatch_types::{
    MarketPair, OpenmatchError, Order, OrderId, OrderSide, OrderStatus, OrderType, PairConfig,
    Result, Trade, TradingPair, UserId,
};
use rust_decimal::Decimal;
use tracing::info;

use crate::store::OrderStore;
use crate::validator;

struct PairEntry {
    pair: TradingPair,
    config: PairConfig,
    book: Mutex<OrderBook>,
}

/// Orchestrates order placement and cancellation over the Ledger,
/// Order Store, and Matching Engine.
pub struct OrderService {
    ledger: Ledger,
    store: OrderStore,
    pairs: RwLock<HashMap<String, PairEntry>>,
}

impl OrderService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ledger: Ledger::new(),
            store: OrderStore::new(),
            pairs: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Registers a trading pair with the engine-wide default notional
    /// bounds. Must be called before orders can be placed against it.
    pub fn add_pair(&self, base: impl Into<String>, quote: impl Into<String>) {
        let base = base.into();
        let quote = quote.into();
        let pair = TradingPair::new(base.clone(), quote.clone());
        let config = PairConfig::with_defaults(base.clone(), quote.clone());
        let symbol = pair.symbol.clone();
        self.pairs.write().unwrap().insert(
            symbol,
            PairEntry {
                pair,
                config,
                book: Mutex::new(OrderBook::new(MarketPair::new(base, quote))),
            },
        );
    }

    /// Deactivates a pair: new orders are rejected, but resting orders
    /// are untouched and may still be cancelled.
    ///
    /// # Errors
    /// Returns `InvalidOrder` if the pair is unknown.
    pub fn deactivate_pair(&self, symbol: &str) -> Result<()> {
        let mut pairs = self.pairs.write().unwrap();
        let entry = pairs
            .get_mut(symbol)
            .ok_or_else(|| OpenmatchError::InvalidOrder {
                reason: format!("unknown pair {symbol}"),
            })?;
        entry.pair.is_active = false;
        Ok(())
    }

    /// Places an order: validate → lock → insert OPEN → match.
    ///
    /// # Errors
    /// Returns `InvalidOrder` for an unknown/inactive pair or a failed
    /// validation check, `InsufficientBalance` if funds are short.
    pub fn place_order(
        &self,
        user_id: UserId,
        pair_symbol: &str,
        side: OrderSide,
        order_type: OrderType,
        price: Decimal,
        amount: Decimal,
    ) -> Result<(Order, Vec<Trade>)> {
        let pairs = self.pairs.read().unwrap();
        let entry = pairs
            .get(pair_symbol)
            .ok_or_else(|| OpenmatchError::InvalidOrder {
                reason: format!("unknown pair {pair_symbol}"),
            })?;

        let required =
            validator::validate(&self.ledger, &entry.pair, &entry.config, user_id, side, order_type, price, amount)?;

        self.ledger.lock(user_id, &required.currency, required.amount)?;

        let now = chrono::Utc::now();
        let mut order = Order {
            id: self.store.next_id(),
            user_id,
            market: MarketPair::new(&entry.pair.base_currency, &entry.pair.quote_currency),
            side,
            order_type,
            status: OrderStatus::Open,
            price,
            amount,
            filled_amount: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(order.clone());
        info!(order_id = %order.id, %user_id, pair = pair_symbol, %side, "order-placed");

        let mut book = entry.book.lock().unwrap();
        let (trades, touched_makers) = openmatch_matchcore::match_order(&mut book, &self.ledger, &mut order)?;

        if order.remaining() > Decimal::ZERO {
            match order.order_type {
                OrderType::Limit => {
                    book.insert_order(order.clone())?;
                }
                OrderType::Market => {
                    // Redesigned per spec §9: drop the price gate for
                    // MARKET and cancel an unfillable remainder instead of
                    // leaving it resting at an unusable price.
                    let (currency, residual) = order.residual_lock();
                    self.ledger.unlock(order.user_id, currency, residual)?;
                    order.status = OrderStatus::Cancelled;
                    order.updated_at = chrono::Utc::now();
                }
            }
        }
        drop(book);

        // Every maker a fill touched was mutated in place inside the
        // book's own copy, not the Order Store's — persist each one now
        // so a later `cancel_order` (or read) on a maker doesn't see a
        // stale `filled_amount`/`status`.
        for maker in touched_makers {
            self.store.update(maker);
        }

        self.store.update(order.clone());

        Ok((order, trades))
    }

    /// Cancels a resting order, unlocking its residual reservation.
    ///
    /// # Errors
    /// Returns `OrderNotFound`, or `InvalidOrder` on owner mismatch or a
    /// terminal order.
    pub fn cancel_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
        let stored = self.store.get(order_id)?;
        validator::validate_cancellable(&stored, user_id)?;

        let pairs = self.pairs.read().unwrap();
        let entry = pairs
            .get(&stored.market.symbol())
            .ok_or_else(|| OpenmatchError::InvalidOrder {
                reason: format!("unknown pair {}", stored.market.symbol()),
            })?;

        // The book's copy, not the Order Store's, is the source of truth
        // for a resting order: a maker fill mutates `filled_amount` only
        // inside the book, and that state is persisted back to the store
        // lazily (see `place_order`). A MARKET order that already settled
        // fully and was never inserted won't be in the book — the store's
        // copy is then already authoritative, so fall back to it.
        let mut order = {
            let mut book = entry.book.lock().unwrap();
            book.cancel_order(&order_id).unwrap_or(stored)
        };

        let (currency, residual) = order.residual_lock();
        self.ledger.unlock(order.user_id, currency, residual)?;

        order.status = OrderStatus::Cancelled;
        order.updated_at = chrono::Utc::now();
        self.store.update(order.clone());
        info!(order_id = %order.id, %user_id, "order-cancelled");

        Ok(order)
    }

    /// Orders for a user, optionally filtered by status and/or pair.
    #[must_use]
    pub fn get_user_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        pair_symbol: Option<&str>,
    ) -> Vec<Order> {
        self.store.list_user_orders(user_id, status, pair_symbol)
    }

    /// Order-book snapshot for a pair, optionally filtered by side, in
    /// price-time priority order.
    ///
    /// # Errors
    /// Returns `InvalidOrder` if the pair is unknown.
    pub fn get_order_book(&self, pair_symbol: &str, side: Option<OrderSide>) -> Result<Vec<Order>> {
        let pairs = self.pairs.read().unwrap();
        let entry = pairs
            .get(pair_symbol)
            .ok_or_else(|| OpenmatchError::InvalidOrder {
                reason: format!("unknown pair {pair_symbol}"),
            })?;
        let book = entry.book.lock().unwrap();
        Ok(book.snapshot(side))
    }
}

impl Default for OrderService {
    fn default() -> Self {
        Self::new()
    }
}
