use tracing::{debug, info};

use crate::agent::Agent;
use crate::agent::replaybuffer::Transition;
use crate::config::TrainConfig;
use crate::error::Result;
use crate::game::Environment;
use crate::history::{HistoryWriter, ScoreHistory};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameSummary {
    pub game: usize,
    pub score: u32,
    pub record: u32,
    pub mean_score: f32
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrainingReport {
    pub games: usize,
    pub record: u32,
    pub last_game: Option<GameSummary>
}

/// Plays games forever (or until `config.max_games`), training online every step
/// and from replay after every game. The model is saved whenever a game beats the record.
pub fn train<E: Environment>(
    agent: &mut Agent,
    env: &mut E,
    history: &mut ScoreHistory,
    config: &TrainConfig
) -> Result<TrainingReport> {
    let mut report = TrainingReport::default();
    let mut history_writer = config.history_path.as_ref().map(HistoryWriter::create).transpose()?;

    while config.max_games.is_none_or(|max| report.games < max) {
        if let Some(summary) = step(agent, env, history, history_writer.as_mut(), config, &mut report.record)? {
            report.games += 1;
            report.last_game = Some(summary);
        }
    }

    Ok(report)
}

// one tick of the game; Some when the tick ended a game
fn step<E: Environment>(
    agent: &mut Agent,
    env: &mut E,
    history: &mut ScoreHistory,
    history_writer: Option<&mut HistoryWriter>,
    config: &TrainConfig,
    record: &mut u32
) -> Result<Option<GameSummary>> {
    let state_old = agent.get_state(&*env);
    let final_move = agent.get_action(&state_old);

    let outcome = env.play_step(final_move);
    let state_new = agent.get_state(&*env);

    let transition = Transition {
        state: state_old,
        action: final_move,
        reward: outcome.reward,
        next_state: state_new,
        done: outcome.done
    };
    agent.train_short_memory(&transition);
    agent.remember(transition);

    if !outcome.done {
        return Ok(None);
    }

    env.reset();
    agent.finish_game();
    if let Some(loss) = agent.train_long_memory() {
        debug!(game = agent.n_games(), loss, "replay training");
    }

    if outcome.score > *record {
        *record = outcome.score;
        agent.save(&config.checkpoint_path)?;
        info!(record = *record, path = %config.checkpoint_path.display(), "new record, model saved");
    }

    let mean_score = history.push(outcome.score);
    if let Some(writer) = history_writer {
        writer.append(agent.n_games(), outcome.score, mean_score)?;
    }

    info!(game = agent.n_games(), score = outcome.score, record = *record, mean_score, "game finished");

    Ok(Some(GameSummary {
        game: agent.n_games(),
        score: outcome.score,
        record: *record,
        mean_score
    }))
}
