//! Buy/sell orders emitted by traders for one tick.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::company::Company;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_type: OrderType,
    pub company: Company,
    pub amount: u32,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.order_type {
            OrderType::Buy => "BUY",
            OrderType::Sell => "SELL",
        };
        write!(f, "{} {} {}", verb, self.amount, self.company)
    }
}

/// Insertion-ordered orders for a single tick. Orders are never removed or
/// modified once added; zero-amount orders are not recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderList {
    orders: Vec<Order>,
}

impl OrderList {
    pub fn new() -> Self {
        OrderList::default()
    }

    pub fn buy(&mut self, company: Company, amount: u32) -> &mut Self {
        self.push(OrderType::Buy, company, amount)
    }

    pub fn sell(&mut self, company: Company, amount: u32) -> &mut Self {
        self.push(OrderType::Sell, company, amount)
    }

    fn push(&mut self, order_type: OrderType, company: Company, amount: u32) -> &mut Self {
        if amount > 0 {
            self.orders.push(Order {
                order_type,
                company,
                amount,
            });
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// First order for `company`, if any.
    pub fn get_by_company(&self, company: Company) -> Option<&Order> {
        self.orders.iter().find(|o| o.company == company)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Order> {
        self.orders.iter()
    }
}

impl<'a> IntoIterator for &'a OrderList {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}
