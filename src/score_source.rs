use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::ledger::ScoreRecord;

const UNKNOWN_PLAYER: &str = "Unknown";

#[derive(Debug, Error)]
pub enum ScoreSourceError {
    #[error("could not open score source {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not read scores: {0}")]
    Csv(#[from] csv::Error),
}

/// A previously recorded `{name, score}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedScore {
    #[serde(default)]
    pub name: String,
    pub score: u64,
}

impl From<SeedScore> for ScoreRecord {
    fn from(seed: SeedScore) -> Self {
        let name = seed.name.trim();
        let name = if name.is_empty() { UNKNOWN_PLAYER } else { name };
        ScoreRecord::new(name, seed.score)
    }
}

pub trait ScoreSource {
    fn fetch(&self) -> Result<Vec<SeedScore>, ScoreSourceError>;
}

/// CSV with a `name,score` header.
#[derive(Debug, Clone)]
pub struct CsvScoreSource {
    path: PathBuf,
}

impl CsvScoreSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ScoreSource for CsvScoreSource {
    fn fetch(&self) -> Result<Vec<SeedScore>, ScoreSourceError> {
        let file = File::open(&self.path).map_err(|source| ScoreSourceError::Open {
            path: self.path.clone(),
            source,
        })?;
        read_scores(file)
    }
}

/// Parses rows, skipping the ones that don't decode.
pub fn read_scores<R: Read>(reader: R) -> Result<Vec<SeedScore>, ScoreSourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    // fail early on an unreadable header rather than skipping every row
    rdr.headers()?;

    let mut scores = Vec::new();
    for (line, row) in rdr.deserialize::<SeedScore>().enumerate() {
        match row {
            Ok(score) => scores.push(score),
            Err(err) => warn!(row = line + 1, error = %err, "score_row_skipped"),
        }
    }
    Ok(scores)
}

/// Fetches seed records. Failures are logged and yield nothing.
pub fn load_seed<S: ScoreSource + ?Sized>(source: &S) -> Vec<ScoreRecord> {
    match source.fetch() {
        Ok(scores) => {
            info!(count = scores.len(), "scores_seeded");
            scores.into_iter().map(ScoreRecord::from).collect()
        }
        Err(err) => {
            warn!(error = %err, "score_source_failed");
            Vec::new()
        }
    }
}
