pub mod error;
pub mod config;
pub mod sequential;

pub use error::{Error, Result};
pub use sequential::tensor::Tensor;
pub use sequential::layer::{
    Layer,
    Dense,
    ReLU,
};
pub use sequential::loss::{
    Loss,
    MeanSquaredError
};
pub use sequential::optimizer::{
    Optimizer,
    Adam,
};
pub use sequential::Sequential;

pub mod agent;

pub use agent::Agent;
pub use agent::replaybuffer::{ReplayBuffer, Transition};
pub use agent::encoder::{State, encode_state};
pub use agent::trainer::{QTrainer, TransitionBatch};

pub mod game;
pub mod history;
pub mod training;

pub use game::{Action, Direction, Environment, Point, SnakeGame, StepOutcome};
pub use history::{HistoryWriter, ScoreHistory};
pub use training::{train, GameSummary, TrainingReport};
