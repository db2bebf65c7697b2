use snake_dqn::agent::Agent;
use snake_dqn::config::{AgentConfig, GameConfig, TrainConfig};
use snake_dqn::game::SnakeGame;
use snake_dqn::history::ScoreHistory;
use snake_dqn::training::train;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let agent_config = AgentConfig::default();
    let game_config = GameConfig::default();
    let train_config = TrainConfig {
        history_path: Some("model/scores.csv".into()),
        ..TrainConfig::default()
    };

    info!(
        width = game_config.width,
        height = game_config.height,
        checkpoint = %train_config.checkpoint_path.display(),
        "initializing snake game and agent"
    );

    let mut game = SnakeGame::new(game_config);
    let mut agent = Agent::new(agent_config);
    let mut history = ScoreHistory::new();

    // runs until interrupted
    let report = train(&mut agent, &mut game, &mut history, &train_config)?;
    info!(games = report.games, record = report.record, "training finished");

    Ok(())
}
