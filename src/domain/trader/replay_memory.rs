//! Bounded experience memory for the learning trader.

use rand::Rng;
use std::collections::VecDeque;

pub type StateKey = Vec<u8>;

#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    pub state: StateKey,
    pub action: usize,
    pub reward: f64,
    pub next_state: StateKey,
}

/// FIFO buffer; the oldest experience is evicted once `capacity` is reached.
#[derive(Debug)]
pub struct ReplayMemory {
    buffer: VecDeque<Experience>,
    capacity: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        ReplayMemory {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, experience: Experience) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(experience);
    }

    /// Up to `batch_size` distinct experiences chosen uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Vec<Experience> {
        let amount = batch_size.min(self.buffer.len());
        if amount == 0 {
            return Vec::new();
        }
        rand::seq::index::sample(rng, self.buffer.len(), amount)
            .into_iter()
            .map(|i| self.buffer[i].clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
