//! Observer adapter that forwards evaluation events to `tracing`.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::order::{Order, OrderList};
use crate::domain::portfolio::RejectReason;
use crate::ports::observer_port::EvaluationObserver;

#[derive(Debug, Default)]
pub struct TracingObserver;

impl EvaluationObserver for TracingObserver {
    fn on_run_start(&self, portfolios: &[&str], ticks: usize) {
        info!(portfolios = ?portfolios, ticks, "starting evaluation");
    }

    fn on_tick(&self, date: NaiveDate) {
        debug!(%date, "tick");
    }

    fn on_decision(&self, portfolio: &str, date: NaiveDate, value: f64, orders: &OrderList) {
        if orders.is_empty() {
            return;
        }
        let placed: Vec<String> = orders.iter().map(Order::to_string).collect();
        debug!(portfolio, %date, value, orders = ?placed, "orders placed");
    }

    fn on_order_rejected(
        &self,
        portfolio: &str,
        date: NaiveDate,
        order: &Order,
        reason: RejectReason,
    ) {
        warn!(portfolio, %date, %order, ?reason, "order rejected");
    }

    fn on_run_end(&self, ticks: usize) {
        info!(ticks, "evaluation finished");
    }
}
