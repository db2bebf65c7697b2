use std::collections::VecDeque;
use rand::Rng;

use super::encoder::State;
use crate::game::Action;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub reward: f32,
    pub next_state: State,
    pub done: bool
}

// FIFO: the oldest transition is dropped once capacity is reached
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay buffer capacity must be positive");
        Self {
            buffer: VecDeque::with_capacity(capacity.min(4096)),
            capacity
        }
    }

    pub fn remember(&mut self, transition: Transition) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    // n distinct transitions chosen uniformly, or everything when n covers the buffer
    pub fn sample_batch<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Vec<&Transition> {
        if self.buffer.len() <= batch_size {
            return self.buffer.iter().collect();
        }

        rand::seq::index::sample(rng, self.buffer.len(), batch_size)
            .iter()
            .map(|index| &self.buffer[index])
            .collect()
    }
}
