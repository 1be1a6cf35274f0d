//! Evaluation observer port: logging/observability hooks for a run.

use chrono::NaiveDate;

use crate::domain::order::{Order, OrderList};
use crate::domain::portfolio::RejectReason;

/// Hooks invoked by the evaluator. Every method defaults to a no-op.
pub trait EvaluationObserver {
    fn on_run_start(&self, _portfolios: &[&str], _ticks: usize) {}

    fn on_tick(&self, _date: NaiveDate) {}

    fn on_decision(&self, _portfolio: &str, _date: NaiveDate, _value: f64, _orders: &OrderList) {}

    fn on_order_rejected(
        &self,
        _portfolio: &str,
        _date: NaiveDate,
        _order: &Order,
        _reason: RejectReason,
    ) {
    }

    fn on_run_end(&self, _ticks: usize) {}
}

pub struct NullObserver;

impl EvaluationObserver for NullObserver {}
