use std::fs::{self, File};
use std::path::Path;
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Serialize)]
struct HistoryRow {
    game: usize,
    score: u32,
    mean_score: f32
}

/// Per-game scores and the running mean, kept in step for plotting.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScoreHistory {
    scores: Vec<u32>,
    mean_scores: Vec<f32>,
    total_score: u64
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    // returns the new running mean
    pub fn push(&mut self, score: u32) -> f32 {
        self.scores.push(score);
        self.total_score += u64::from(score);
        let mean_score = self.total_score as f32 / self.scores.len() as f32;
        self.mean_scores.push(mean_score);
        mean_score
    }

    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    pub fn mean_scores(&self) -> &[f32] {
        &self.mean_scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Appends one `game,score,mean_score` row per finished game to a CSV file.
/// The header goes out with the first row.
pub struct HistoryWriter {
    writer: csv::Writer<File>
}

impl HistoryWriter {
    /// Truncates `path`, creating parent directories as needed.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::io("create history directory", parent, source))?;
        }
        let writer = csv::Writer::from_path(path)?;
        Ok(Self { writer })
    }

    // flushed per row so an interrupted run keeps every finished game
    pub fn append(&mut self, game: usize, score: u32, mean_score: f32) -> Result<()> {
        self.writer.serialize(HistoryRow { game, score, mean_score })?;
        self.writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}
