//! Continuous price-time priority matching engine (spec §4.4).
//!
//! Given a taker order, [`match_order`] walks the opposite side of the
//! book in price-time order and, for each crossing maker, settles the
//! fill through the [`Ledger`] before moving to the next candidate. The
//! whole walk for one taker is meant to run inside a single logical
//! transaction — callers own `BEGIN`/`COMMIT` around this call.
//!
//! ## Price-improvement rule
//!
//! Every fill executes at `maker.price` — the taker always gets the
//! resting book's price, never worse, sometimes better. A BUY taker's
//! lock was sized at its own limit price, so a better-priced fill leaves a
//! surplus in `locked` that was never transferred; that surplus is
//! unlocked back to the taker's quote wallet as part of the same fill
//! (spec §8 scenario 1's recommended rule), not deferred to cancellation.
//!
//! ## Self-trade policy
//!
//! If a candidate maker belongs to the same user as the taker, it is
//! skipped (left resting, untouched) and the next candidate in
//! price-time order is tried. See spec §9 open question: this crate picks
//! skip-and-continue over cancel-newest because it never disturbs a
//! resting order the user didn't ask to cancel.
//!
//! ## Market orders
//!
//! A MARKET taker carries no price gate: every candidate crosses by
//! definition. The walk stops only when the taker is filled or the
//! opposite side runs out of liquidity. Deciding what happens to an
//! unfillable MARKET remainder is the caller's job (see
//! `openmatch-core::service`), not the matcher's.

use std::cmp::Reverse;

use chrono::Utc;
use openmatch_types::{MarketPair, Order, OrderSide, OrderStatus, OrderType, Result, Trade, TradeId};
use openmatch_ledger::Ledger;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use tracing::{info, instrument};

use crate::orderbook::OrderBook;

/// Round `value` half-even to `scale` decimal places (spec §4.4 step 5).
fn round_half_even(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven)
}

/// Walk the opposite side of `book` against `taker`, settling each fill
/// through `ledger`. Mutates `taker` in place (`filled_amount`, `status`,
/// `updated_at`) and returns `(trades, touched_makers)`, oldest first.
///
/// A fill mutates the maker `Order` in place inside the book's own
/// `VecDeque` — that copy, not whatever the caller last read from the
/// Order Store, is the post-fill source of truth. `touched_makers` carries
/// a snapshot of each maker's state right after its fill (at most one
/// entry per distinct maker per call) so the caller can persist it back to
/// the Order Store; skipping that write leaves the store's copy stale.
///
/// The caller is responsible for:
/// - locking the taker's required funds *before* calling this (already
///   done by the time an order reaches the matcher),
/// - inserting the taker into `book` if it still has a remainder and is a
///   LIMIT order,
/// - deciding the fate of an unfilled MARKET remainder,
/// - persisting every `Order` in `touched_makers` to the Order Store.
///
/// # Errors
/// Propagates any `Ledger` settlement error. On error, trades produced so
/// far in this call have already settled; the caller's enclosing
/// transaction is responsible for treating the whole `place_order` as
/// failed and rolling back its own side effects.
#[instrument(skip(book, ledger, taker), fields(order_id = %taker.id))]
pub fn match_order(
    book: &mut OrderBook,
    ledger: &Ledger,
    taker: &mut Order,
) -> Result<(Vec<Trade>, Vec<Order>)> {
    let mut trades = Vec::new();
    let mut touched_makers = Vec::new();

    loop {
        if taker.remaining() <= Decimal::ZERO {
            break;
        }

        let Some(maker_id) = next_candidate(book, taker) else {
            break;
        };

        let (trade, maker) = fill_one(book, ledger, taker, maker_id)?;
        info!(
            trade_id = %trade.id, maker_order_id = %trade.maker_order_id,
            price = %trade.price, qty = %trade.quantity, "trade"
        );
        trades.push(trade);
        touched_makers.push(maker);
    }

    Ok((trades, touched_makers))
}

/// Finds the next maker order id the taker can fill, honoring the price
/// gate (LIMIT only) and skipping same-user candidates. Returns `None`
/// when the opposite side has nothing left this taker could ever cross —
/// either it is empty, or (LIMIT only) the best remaining price no longer
/// crosses.
fn next_candidate(book: &OrderBook, taker: &Order) -> Option<openmatch_types::OrderId> {
    match taker.side {
        OrderSide::Buy => {
            for (price, level) in &book.asks {
                if taker.order_type == OrderType::Limit && *price > taker.price {
                    return None;
                }
                if let Some(order) = level.orders.iter().find(|o| o.user_id != taker.user_id) {
                    return Some(order.id);
                }
                // Every order at this level belongs to the taker; this
                // level can never cross for this taker — try the next one.
            }
            None
        }
        OrderSide::Sell => {
            for (Reverse(price), level) in &book.bids {
                if taker.order_type == OrderType::Limit && *price < taker.price {
                    return None;
                }
                if let Some(order) = level.orders.iter().find(|o| o.user_id != taker.user_id) {
                    return Some(order.id);
                }
            }
            None
        }
    }
}

fn fill_one(
    book: &mut OrderBook,
    ledger: &Ledger,
    taker: &mut Order,
    maker_id: openmatch_types::OrderId,
) -> Result<(Trade, Order)> {
    let (maker_side, maker_price) = book.index[&maker_id];

    let qty;
    let trade_price;
    let maker_user_id;
    let maker_filled;
    let maker_snapshot;
    {
        let level = match maker_side {
            OrderSide::Buy => book.bids.get_mut(&Reverse(maker_price)).expect("level present"),
            OrderSide::Sell => book.asks.get_mut(&maker_price).expect("level present"),
        };
        let maker = level
            .orders
            .iter_mut()
            .find(|o| o.id == maker_id)
            .expect("maker present");

        qty = taker.remaining().min(maker.remaining());
        trade_price = maker.price;
        maker_user_id = maker.user_id;

        maker.filled_amount += qty;
        maker.updated_at = Utc::now();
        if maker.is_filled() {
            maker.status = OrderStatus::Filled;
        }
        maker_filled = maker.is_filled();
        maker_snapshot = maker.clone();
    }

    let value = round_half_even(trade_price * qty, 2);

    let (buyer, seller) = match taker.side {
        OrderSide::Buy => (taker.user_id, maker_user_id),
        OrderSide::Sell => (maker_user_id, taker.user_id),
    };
    let market: &MarketPair = &book.market;
    ledger.transfer_locked(seller, buyer, &market.base, qty)?;
    ledger.transfer_locked(buyer, seller, &market.quote, value)?;

    // Price-improvement rule (spec §8 scenario 1): a BUY taker's lock was
    // sized against its own price at placement; a fill at a better (lower)
    // price leaves a surplus still reserved in `locked` that was never
    // transferred. Release it back to the taker immediately, per fill,
    // rather than deferring it to cancellation.
    if taker.side == OrderSide::Buy {
        let improvement = round_half_even((taker.price - trade_price) * qty, 2);
        if improvement > Decimal::ZERO {
            ledger.unlock(taker.user_id, &market.quote, improvement)?;
        }
    }

    taker.filled_amount += qty;
    taker.updated_at = Utc::now();
    if taker.is_filled() {
        taker.status = OrderStatus::Filled;
    }

    if maker_filled {
        book.index.remove(&maker_id);
        match maker_side {
            OrderSide::Buy => {
                let level = book.bids.get_mut(&Reverse(maker_price)).expect("level present");
                if let Some(pos) = level.orders.iter().position(|o| o.id == maker_id) {
                    level.orders.remove(pos);
                }
                if level.is_empty() {
                    book.bids.remove(&Reverse(maker_price));
                }
            }
            OrderSide::Sell => {
                let level = book.asks.get_mut(&maker_price).expect("level present");
                if let Some(pos) = level.orders.iter().position(|o| o.id == maker_id) {
                    level.orders.remove(pos);
                }
                if level.is_empty() {
                    book.asks.remove(&maker_price);
                }
            }
        }
    }

    let (taker_order_id, maker_order_id) = (taker.id, maker_id);
    let trade = Trade {
        id: TradeId::new(),
        market: book.market.clone(),
        taker_order_id,
        taker_user_id: taker.user_id,
        maker_order_id,
        maker_user_id,
        price: trade_price,
        quantity: qty,
        quote_value: value,
        executed_at: Utc::now(),
    };
    Ok((trade, maker_snapshot))
}

#[cfg(test)]
mod tests {
    use openmatch_types::*;
    use rust_decimal::Decimal;

    use super::*;

    fn funded_order(
        ledger: &Ledger,
        side: OrderSide,
        price: Decimal,
        amount: Decimal,
    ) -> Order {
        let mut order = Order::dummy_limit(side, price, amount);
        order.id = OrderId::new(rand_id());
        let (currency, lock_amount) = order.required_lock();
        ledger.deposit(order.user_id, currency, lock_amount).unwrap();
        ledger.lock(order.user_id, currency, lock_amount).unwrap();
        order
    }

    // Deterministic-enough unique ids for test orders (no Ledger or
    // OrderId generator is exercised here, just uniqueness within a test).
    fn rand_id() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    #[test]
    fn full_fill_at_maker_price() {
        let ledger = Ledger::new();
        let mut book = OrderBook::new(MarketPair::new("BTC", "USDT"));

        let maker = funded_order(&ledger, OrderSide::Sell, Decimal::new(10000, 2), Decimal::ONE);
        book.insert_order(maker.clone()).unwrap();

        let mut taker = funded_order(&ledger, OrderSide::Buy, Decimal::new(10100, 2), Decimal::ONE);
        let (trades, touched) = match_order(&mut book, &ledger, &mut taker).unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Decimal::new(10000, 2), "price-improvement: taker pays maker price");
        assert!(taker.is_filled());
        assert!(book.is_empty());
        assert_eq!(touched.len(), 1);
        assert!(touched[0].is_filled(), "touched maker snapshot reflects the fill");
    }

    #[test]
    fn partial_fill_leaves_taker_remainder() {
        let ledger = Ledger::new();
        let mut book = OrderBook::new(MarketPair::new("BTC", "USDT"));

        let maker = funded_order(&ledger, OrderSide::Sell, Decimal::new(10000, 2), Decimal::new(5, 1));
        book.insert_order(maker).unwrap();

        let mut taker = funded_order(&ledger, OrderSide::Buy, Decimal::new(10100, 2), Decimal::ONE);
        let (trades, touched) = match_order(&mut book, &ledger, &mut taker).unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(taker.remaining(), Decimal::new(5, 1));
        assert!(!taker.is_filled());
        assert!(book.is_empty());
        assert_eq!(touched.len(), 1);
        assert!(touched[0].is_filled(), "maker's own remaining was fully taken");
    }

    #[test]
    fn price_time_priority_fills_oldest_first() {
        let ledger = Ledger::new();
        let mut book = OrderBook::new(MarketPair::new("BTC", "USDT"));

        let m1 = funded_order(&ledger, OrderSide::Sell, Decimal::new(10000, 2), Decimal::ONE);
        let m2 = funded_order(&ledger, OrderSide::Sell, Decimal::new(10000, 2), Decimal::ONE);
        let m1_id = m1.id;
        book.insert_order(m1).unwrap();
        book.insert_order(m2).unwrap();

        let mut taker = funded_order(&ledger, OrderSide::Buy, Decimal::new(10100, 2), Decimal::ONE);
        let (trades, _touched) = match_order(&mut book, &ledger, &mut taker).unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].maker_order_id, m1_id, "FIFO: first resting order fills first");
    }

    #[test]
    fn self_trade_is_skipped_and_matching_continues() {
        let ledger = Ledger::new();
        let mut book = OrderBook::new(MarketPair::new("BTC", "USDT"));

        let mut self_maker = funded_order(&ledger, OrderSide::Sell, Decimal::new(10000, 2), Decimal::ONE);
        let mut taker = funded_order(&ledger, OrderSide::Buy, Decimal::new(10100, 2), Decimal::ONE);
        self_maker.user_id = taker.user_id;

        let other_maker = funded_order(&ledger, OrderSide::Sell, Decimal::new(10000, 2), Decimal::ONE);
        let other_maker_id = other_maker.id;

        book.insert_order(self_maker.clone()).unwrap();
        book.insert_order(other_maker).unwrap();

        let (trades, _touched) = match_order(&mut book, &ledger, &mut taker).unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].maker_order_id, other_maker_id);
        // The self-trade maker is left untouched, still resting.
        assert!(book.contains_order(&self_maker.id));
    }

    #[test]
    fn market_taker_ignores_price_gate() {
        let ledger = Ledger::new();
        let mut book = OrderBook::new(MarketPair::new("BTC", "USDT"));

        let maker = funded_order(&ledger, OrderSide::Sell, Decimal::new(50000, 2), Decimal::ONE);
        book.insert_order(maker).unwrap();

        let mut taker = Order::dummy_limit(OrderSide::Buy, Decimal::ZERO, Decimal::ONE);
        taker.order_type = OrderType::Market;
        ledger
            .deposit(taker.user_id, "USDT", Decimal::new(100000, 2))
            .unwrap();
        ledger
            .lock(taker.user_id, "USDT", Decimal::new(100000, 2))
            .unwrap();

        let (trades, _touched) = match_order(&mut book, &ledger, &mut taker).unwrap();
        assert_eq!(trades.len(), 1);
        assert!(taker.is_filled());
    }

    #[test]
    fn buy_fill_below_taker_price_unlocks_the_improvement() {
        let ledger = Ledger::new();
        let mut book = OrderBook::new(MarketPair::new("BTC", "USDT"));

        let maker = funded_order(&ledger, OrderSide::Sell, Decimal::new(20000, 2), Decimal::new(1, 1));
        book.insert_order(maker).unwrap();

        // Taker locks at its own limit price (210.00), 21.00 for 0.1 BTC.
        let mut taker = funded_order(&ledger, OrderSide::Buy, Decimal::new(21000, 2), Decimal::new(1, 1));
        let before = ledger.get_wallet(taker.user_id, "USDT").unwrap();
        assert_eq!(before.locked, Decimal::new(21, 0));

        let (trades, _touched) = match_order(&mut book, &ledger, &mut taker).unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Decimal::new(20000, 2));
        // Trade settles 20.00; the 1.00 improvement is unlocked, not left
        // reserved against a FILLED order.
        let after = ledger.get_wallet(taker.user_id, "USDT").unwrap();
        assert_eq!(after.locked, Decimal::ZERO);
        assert_eq!(after.balance, Decimal::new(1, 0));
    }

    #[test]
    fn no_crossing_produces_no_trades() {
        let ledger = Ledger::new();
        let mut book = OrderBook::new(MarketPair::new("BTC", "USDT"));
        let maker = funded_order(&ledger, OrderSide::Sell, Decimal::new(10100, 2), Decimal::ONE);
        book.insert_order(maker).unwrap();

        let mut taker = funded_order(&ledger, OrderSide::Buy, Decimal::new(10000, 2), Decimal::ONE);
        let (trades, touched) = match_order(&mut book, &ledger, &mut taker).unwrap();
        assert!(trades.is_empty());
        assert!(touched.is_empty());
        assert_eq!(taker.remaining(), Decimal::ONE);
    }
}
