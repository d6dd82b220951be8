//! Simulated backtest broker.
//!
//! Market orders submitted on bar t are accepted and resolved on bar t+1 at
//! that bar's open, adjusted for slippage. A buy whose cost plus commission
//! exceeds available cash resolves to MARGIN.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::{Execution, OrderId, OrderSide, OrderStatus, StatusUpdate};
use crate::ports::broker_port::Broker;

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerConfig {
    pub cash: f64,
    pub size: f64,
    pub commission_pct: f64,
    pub slippage_pct: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            cash: 10_000.0,
            size: 1.0,
            commission_pct: 0.0,
            slippage_pct: 0.0,
        }
    }
}

/// commission = trade_value * pct / 100
pub fn calculate_commission(trade_value: f64, config: &BrokerConfig) -> f64 {
    trade_value * config.commission_pct / 100.0
}

/// Buys pay up, sells receive less.
pub fn apply_slippage(market_price: f64, side: OrderSide, slippage_pct: f64) -> f64 {
    match side {
        OrderSide::Buy => market_price * (1.0 + slippage_pct / 100.0),
        OrderSide::Sell => market_price * (1.0 - slippage_pct / 100.0),
    }
}

#[derive(Debug, Clone)]
struct PendingOrder {
    id: OrderId,
    side: OrderSide,
    submitted_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct SimulatedBroker {
    config: BrokerConfig,
    cash: f64,
    units: f64,
    next_id: u64,
    pending: Vec<PendingOrder>,
    reject_next: bool,
}

impl SimulatedBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            cash: config.cash,
            config,
            units: 0.0,
            next_id: 0,
            pending: Vec::new(),
            reject_next: false,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn units(&self) -> f64 {
        self.units
    }

    /// Cash plus held units marked at `price`.
    pub fn value(&self, price: f64) -> f64 {
        self.cash + self.units * price
    }

    /// The next resolved order will come back REJECTED.
    pub fn reject_next(&mut self) {
        self.reject_next = true;
    }

    fn resolve(&mut self, order: &PendingOrder, bar: &OhlcvBar) -> StatusUpdate {
        let update = |status, execution| StatusUpdate {
            order_id: order.id,
            status,
            at: bar.timestamp,
            execution,
        };

        if std::mem::take(&mut self.reject_next) {
            return update(OrderStatus::Rejected, None);
        }

        let size = match order.side {
            OrderSide::Buy => self.config.size,
            // Closing sells whatever is held.
            OrderSide::Sell => self.units,
        };
        if size <= 0.0 {
            return update(OrderStatus::Canceled, None);
        }

        let price = apply_slippage(bar.open, order.side, self.config.slippage_pct);
        let cost = price * size;
        let commission = calculate_commission(cost, &self.config);

        match order.side {
            OrderSide::Buy => {
                if cost + commission > self.cash {
                    return update(OrderStatus::Margin, None);
                }
                self.cash -= cost + commission;
                self.units += size;
            }
            OrderSide::Sell => {
                self.cash += cost - commission;
                self.units -= size;
            }
        }

        update(
            OrderStatus::Completed,
            Some(Execution {
                price,
                cost,
                commission,
            }),
        )
    }
}

impl Broker for SimulatedBroker {
    fn submit_order(&mut self, side: OrderSide, at: NaiveDateTime) -> OrderId {
        self.next_id += 1;
        let id = OrderId(self.next_id);
        self.pending.push(PendingOrder {
            id,
            side,
            submitted_at: at,
        });
        id
    }

    fn on_bar(&mut self, bar: &OhlcvBar) -> Vec<StatusUpdate> {
        let pending = std::mem::take(&mut self.pending);
        let mut updates = Vec::with_capacity(pending.len() * 3);

        for order in &pending {
            debug!(order = %order.id, submitted_at = %order.submitted_at, "resolving order");
            for status in [OrderStatus::Submitted, OrderStatus::Accepted] {
                updates.push(StatusUpdate {
                    order_id: order.id,
                    status,
                    at: bar.timestamp,
                    execution: None,
                });
            }
            updates.push(self.resolve(order, bar));
        }

        updates
    }
}
