use serde::{Serialize, Deserialize};
use std::path::PathBuf;

pub const MAX_MEMORY: usize = 100_000;
pub const BATCH_SIZE: usize = 1000;
pub const LR: f32 = 0.001;
pub const GAMMA: f32 = 0.9;
pub const HIDDEN_SIZE: usize = 256;
pub const EPSILON_BASE: i64 = 80; // exploration ends after this many games
pub const EPSILON_RANGE: u32 = 200; // random draw in [0, EPSILON_RANGE)

pub const GRID_WIDTH: i32 = 32; // cells
pub const GRID_HEIGHT: i32 = 24; // cells

pub const CHECKPOINT_PATH: &str = "model/model.bin";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub memory_capacity: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub gamma: f32,
    pub hidden_size: usize,
    pub epsilon_base: i64,
    pub epsilon_range: u32
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            memory_capacity: MAX_MEMORY,
            batch_size: BATCH_SIZE,
            learning_rate: LR,
            gamma: GAMMA,
            hidden_size: HIDDEN_SIZE,
            epsilon_base: EPSILON_BASE,
            epsilon_range: EPSILON_RANGE
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub width: i32,
    pub height: i32
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub checkpoint_path: PathBuf,
    pub history_path: Option<PathBuf>,
    // None runs until the process is interrupted
    pub max_games: Option<usize>
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: PathBuf::from(CHECKPOINT_PATH),
            history_path: None,
            max_games: None
        }
    }
}
