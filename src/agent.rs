pub mod encoder;
pub mod replaybuffer;
pub mod trainer;

use encoder::{State, STATE_SIZE, encode_state, states_to_tensor};
use replaybuffer::{ReplayBuffer, Transition};
use trainer::{QTrainer, TransitionBatch};
use crate::config::AgentConfig;
use crate::error::Result;
use crate::game::{ACTION_SIZE, Action, Environment, action_from_index};
use crate::sequential::{
    Sequential,
    loss::MeanSquaredError,
    optimizer::Adam
};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::path::Path;

pub struct Agent {
    model: Sequential,
    trainer: QTrainer,
    memory: ReplayBuffer,

    n_games: usize,
    epsilon: i64,
    config: AgentConfig,

    rng: StdRng
}

impl Agent {
    pub fn new(config: AgentConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn with_seed(config: AgentConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: AgentConfig, mut rng: StdRng) -> Self {
        let model = Sequential::two_layer(
            STATE_SIZE,
            config.hidden_size,
            ACTION_SIZE,
            Box::new(MeanSquaredError),
            Box::new(Adam::new(config.learning_rate)),
            &mut rng
        );

        Self {
            model,
            trainer: QTrainer::new(config.gamma),
            memory: ReplayBuffer::new(config.memory_capacity),
            n_games: 0,
            epsilon: 0,
            config,
            rng
        }
    }

    pub fn n_games(&self) -> usize {self.n_games}
    pub fn epsilon(&self) -> i64 {self.epsilon}
    pub fn memory(&self) -> &ReplayBuffer {&self.memory}
    pub fn model(&self) -> &Sequential {&self.model}

    pub fn finish_game(&mut self) {
        self.n_games += 1;
    }

    pub fn get_state<E: Environment + ?Sized>(&self, env: &E) -> State {
        encode_state(env)
    }

    pub fn q_values(&mut self, state: &State) -> Vec<f32> {
        self.model.predict(&states_to_tensor([state])).row(0)
    }

    // exploration shrinks linearly with games played and stops at epsilon_base games
    pub fn get_action(&mut self, state: &State) -> Action {
        self.epsilon = (self.config.epsilon_base - self.n_games as i64).max(0);
        self.select_action(state, self.epsilon)
    }

    pub fn select_action(&mut self, state: &State, epsilon: i64) -> Action {
        let draw = self.rng.random_range(0..self.config.epsilon_range) as i64;
        let move_index = if draw < epsilon {
            self.rng.random_range(0..ACTION_SIZE)
        } else {
            self.model.predict(&states_to_tensor([state])).argmax_rows()[0]
        };
        action_from_index(move_index)
    }

    pub fn remember(&mut self, transition: Transition) {
        self.memory.remember(transition);
    }

    pub fn train_short_memory(&mut self, transition: &Transition) -> f32 {
        self.trainer.train_step(&mut self.model, &TransitionBatch::single(transition))
    }

    // None when nothing has been remembered yet
    pub fn train_long_memory(&mut self) -> Option<f32> {
        let mini_sample = self.memory.sample_batch(self.config.batch_size, &mut self.rng);
        if mini_sample.is_empty() {
            return None;
        }
        let batch = TransitionBatch::from_transitions(mini_sample);
        Some(self.trainer.train_step(&mut self.model, &batch))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.model.save(path)
    }

    /// Restores a saved model; memory and the game counter start fresh.
    pub fn load(config: AgentConfig, path: impl AsRef<Path>) -> Result<Self> {
        let mut agent = Self::new(config);
        agent.model = Sequential::load(path)?;
        Ok(agent)
    }
}
