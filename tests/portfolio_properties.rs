//! Property tests for order application.

mod common;

use common::*;
use proptest::prelude::*;
use tradesim::domain::company::Company;
use tradesim::domain::order::{OrderList, OrderType};
use tradesim::domain::portfolio::Portfolio;

fn company() -> impl Strategy<Value = Company> {
    prop_oneof![Just(Company::CompanyA), Just(Company::CompanyB)]
}

fn order() -> impl Strategy<Value = (OrderType, Company, u32)> {
    (
        prop_oneof![Just(OrderType::Buy), Just(OrderType::Sell)],
        company(),
        0u32..500,
    )
}

fn order_list(orders: &[(OrderType, Company, u32)]) -> OrderList {
    let mut list = OrderList::new();
    for &(order_type, company, amount) in orders {
        match order_type {
            OrderType::Buy => list.buy(company, amount),
            OrderType::Sell => list.sell(company, amount),
        };
    }
    list
}

proptest! {
    #[test]
    fn cash_never_goes_negative(
        cash in 0.0f64..50_000.0,
        price_a in 0.01f64..1_000.0,
        price_b in 0.01f64..1_000.0,
        batches in prop::collection::vec(prop::collection::vec(order(), 0..8), 1..10),
    ) {
        let market = flat_market(1, price_a, price_b);
        let mut portfolio = Portfolio::new("p", cash);
        for batch in &batches {
            portfolio = portfolio.apply(&market, &order_list(batch)).unwrap();
            prop_assert!(portfolio.cash >= 0.0);
        }
    }

    #[test]
    fn rejected_orders_leave_no_trace(
        cash in 0.0f64..1_000.0,
        held in 0u32..50,
        batch in prop::collection::vec(order(), 0..8),
    ) {
        let market = flat_market(1, 10.0, 20.0);
        let start = Portfolio::new("p", cash).with_shares(Company::CompanyA, held);
        let outcome = start.apply_detailed(&market, &order_list(&batch)).unwrap();

        let mut replayed = OrderList::new();
        for order in &outcome.executed {
            match order.order_type {
                OrderType::Buy => replayed.buy(order.company, order.amount),
                OrderType::Sell => replayed.sell(order.company, order.amount),
            };
        }
        prop_assert_eq!(start.apply(&market, &replayed).unwrap(), outcome.portfolio);
        prop_assert_eq!(outcome.executed.len() + outcome.rejected.len(), order_list(&batch).len());
    }

    #[test]
    fn buy_sell_pair_cancels_in_either_order(
        amount in 1u32..200,
        held in 0u32..400,
        price in 1.0f64..200.0,
        company in company(),
    ) {
        let market = flat_market(1, price, price);
        let cash = amount as f64 * price * 2.0;
        let start = Portfolio::new("p", cash).with_shares(company, held.max(amount));

        let mut buy_first = OrderList::new();
        buy_first.buy(company, amount).sell(company, amount);
        let mut sell_first = OrderList::new();
        sell_first.sell(company, amount).buy(company, amount);

        let a = start.apply(&market, &buy_first).unwrap();
        let b = start.apply(&market, &sell_first).unwrap();
        prop_assert_eq!(a.get_amount(company), b.get_amount(company));
        prop_assert_eq!(a.get_amount(company), start.get_amount(company));
        prop_assert!((a.cash - b.cash).abs() < 1e-6);
        prop_assert!((a.cash - start.cash).abs() < 1e-6);
    }
}
