//! Tabular Q-learning trader with epsilon-greedy exploration.
//!
//! The state for each company is the direction of its forecast (down, flat,
//! up) combined with whether shares are held. A joint action picks hold, buy
//! or sell for every company. The reward of an action is the relative change
//! in portfolio value observed at the next decision. A market whose date
//! moves backwards starts a new run: the step still waiting for its reward
//! is discarded instead of being scored against the new run's first value.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::replay_memory::{Experience, ReplayMemory, StateKey};
use super::{Trader, affordable_shares};
use crate::domain::company::Company;
use crate::domain::error::TradesimError;
use crate::domain::market::MarketSnapshot;
use crate::domain::order::OrderList;
use crate::domain::portfolio::Portfolio;
use crate::domain::predictor::Predictor;

const ACTIONS_PER_COMPANY: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Hold,
    Buy,
    Sell,
}

impl Action {
    fn from_digit(digit: usize) -> Self {
        match digit {
            1 => Action::Buy,
            2 => Action::Sell,
            _ => Action::Hold,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QLearningConfig {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub epsilon_min: f64,
    pub memory_size: usize,
    pub batch_size: usize,
    /// Share of cash spent per tick, split across buy actions.
    pub trade_fraction: f64,
    /// Relative forecast move treated as "flat".
    pub threshold: f64,
    pub seed: u64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        QLearningConfig {
            alpha: 0.1,
            gamma: 0.95,
            epsilon: 1.0,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
            memory_size: 500,
            batch_size: 32,
            trade_fraction: 0.5,
            threshold: 0.005,
            seed: 42,
        }
    }
}

struct PendingStep {
    date: Option<NaiveDate>,
    state: StateKey,
    action: usize,
    value: f64,
}

pub struct QLearningTrader {
    config: QLearningConfig,
    predictors: BTreeMap<Company, Box<dyn Predictor>>,
    q_table: HashMap<(StateKey, usize), f64>,
    memory: ReplayMemory,
    epsilon: f64,
    rng: StdRng,
    pending: Option<PendingStep>,
}

impl QLearningTrader {
    pub fn new(config: QLearningConfig) -> Self {
        QLearningTrader {
            memory: ReplayMemory::new(config.memory_size),
            epsilon: config.epsilon.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(config.seed),
            predictors: BTreeMap::new(),
            q_table: HashMap::new(),
            pending: None,
            config,
        }
    }

    pub fn with_predictor(mut self, company: Company, predictor: Box<dyn Predictor>) -> Self {
        self.predictors.insert(company, predictor);
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    pub fn q_value(&self, state: &[u8], action: usize) -> f64 {
        self.q_table
            .get(&(state.to_vec(), action))
            .copied()
            .unwrap_or(0.0)
    }

    fn action_count(&self) -> usize {
        ACTIONS_PER_COMPANY.pow(self.predictors.len() as u32)
    }

    fn observe(
        &mut self,
        portfolio: &Portfolio,
        market: &MarketSnapshot,
    ) -> Result<StateKey, TradesimError> {
        let mut state = Vec::with_capacity(self.predictors.len());
        for (&company, predictor) in self.predictors.iter_mut() {
            let history = market
                .get(company)
                .ok_or(TradesimError::NoPriceData { company })?;
            let direction = if history.len() < predictor.lookback() {
                1
            } else {
                let last = market.last_price(company)?;
                let predicted = predictor.predict(history)?;
                let change = if last > 0.0 { (predicted - last) / last } else { 0.0 };
                if change < -self.config.threshold {
                    0
                } else if change > self.config.threshold {
                    2
                } else {
                    1
                }
            };
            let held = u8::from(portfolio.get_amount(company) > 0);
            state.push(direction * 2 + held);
        }
        Ok(state)
    }

    /// Highest-valued action; ties go to the lowest index (all hold).
    fn best_action(&self, state: &StateKey) -> usize {
        (0..self.action_count()).fold(0, |best, action| {
            if self.q_value(state, action) > self.q_value(state, best) {
                action
            } else {
                best
            }
        })
    }

    fn choose_action(&mut self, state: &StateKey) -> usize {
        if self.rng.gen_bool(self.epsilon.clamp(0.0, 1.0)) {
            self.rng.gen_range(0..self.action_count())
        } else {
            self.best_action(state)
        }
    }

    fn learn(&mut self) {
        let batch = self.memory.sample(self.config.batch_size, &mut self.rng);
        for experience in batch {
            let best_next = self.best_action(&experience.next_state);
            let target = experience.reward
                + self.config.gamma * self.q_value(&experience.next_state, best_next);
            let current = self.q_value(&experience.state, experience.action);
            let updated = current + self.config.alpha * (target - current);
            self.q_table
                .insert((experience.state, experience.action), updated);
        }
    }

    fn orders_for(
        &self,
        action: usize,
        portfolio: &Portfolio,
        market: &MarketSnapshot,
    ) -> Result<OrderList, TradesimError> {
        let mut orders = OrderList::new();
        let mut buys = Vec::new();
        let mut code = action;

        for &company in self.predictors.keys() {
            match Action::from_digit(code % ACTIONS_PER_COMPANY) {
                Action::Hold => {}
                Action::Buy => buys.push(company),
                Action::Sell => {
                    orders.sell(company, portfolio.get_amount(company));
                }
            }
            code /= ACTIONS_PER_COMPANY;
        }

        if !buys.is_empty() {
            let budget = portfolio.cash * self.config.trade_fraction / buys.len() as f64;
            for company in buys {
                let price = market.last_price(company)?;
                orders.buy(company, affordable_shares(budget, price));
            }
        }
        Ok(orders)
    }
}

impl Trader for QLearningTrader {
    fn decide(
        &mut self,
        portfolio: &Portfolio,
        portfolio_value: f64,
        market: &MarketSnapshot,
    ) -> Result<OrderList, TradesimError> {
        let state = self.observe(portfolio, market)?;
        let date = market.last_date();

        if let Some(previous) = self.pending.take_if(|p| p.date <= date) {
            let reward = if previous.value > 0.0 {
                (portfolio_value - previous.value) / previous.value
            } else {
                0.0
            };
            self.memory.push(Experience {
                state: previous.state,
                action: previous.action,
                reward,
                next_state: state.clone(),
            });
            self.learn();
        }

        let action = self.choose_action(&state);
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        debug!(
            portfolio = %portfolio.name,
            ?state,
            action,
            epsilon = self.epsilon,
            "q-learning decision"
        );

        let orders = self.orders_for(action, portfolio, market)?;
        self.pending = Some(PendingStep {
            date,
            state,
            action,
            value: portfolio_value,
        });
        Ok(orders)
    }
}
