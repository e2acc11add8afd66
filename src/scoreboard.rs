use itertools::Itertools;

use crate::ledger::ScoreRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardRow {
    pub rank: usize,
    pub name: String,
    pub time_ms: u64,
}

/// Display rows for a ledger snapshot, ranked from 1 in snapshot order.
pub fn present(snapshot: &[ScoreRecord]) -> Vec<ScoreboardRow> {
    present_top(snapshot, snapshot.len())
}

pub fn present_top(snapshot: &[ScoreRecord], limit: usize) -> Vec<ScoreboardRow> {
    snapshot
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, record)| ScoreboardRow {
            rank: idx + 1,
            name: record.player_name().to_string(),
            time_ms: record.reaction_time_ms(),
        })
        .collect()
}

/// Aggregate over the rounds played this session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub attempts: usize,
    pub too_early: usize,
    pub best_ms: Option<u64>,
    pub worst_ms: Option<u64>,
    pub mean_ms: Option<f64>,
    pub std_dev_ms: Option<f64>,
}

impl SessionSummary {
    pub fn from_times(times: &[u64], too_early: usize) -> Self {
        let (best_ms, worst_ms) = match times.iter().minmax().into_option() {
            Some((best, worst)) => (Some(*best), Some(*worst)),
            None => (None, None),
        };
        let mean_ms = mean(times);
        let std_dev_ms = mean_ms.map(|m| {
            let variance = times
                .iter()
                .map(|&t| {
                    let diff = t as f64 - m;
                    diff * diff
                })
                .sum::<f64>()
                / times.len() as f64;
            variance.sqrt()
        });

        Self {
            attempts: times.len() + too_early,
            too_early,
            best_ms,
            worst_ms,
            mean_ms,
            std_dev_ms,
        }
    }

    pub fn line(&self) -> String {
        match (self.best_ms, self.mean_ms) {
            (Some(best), Some(mean)) => format!(
                "{} rounds   best {}ms   avg {:.0}ms   sd {:.1}   early {}",
                self.attempts,
                best,
                mean,
                self.std_dev_ms.unwrap_or_default(),
                self.too_early
            ),
            _ if self.attempts > 0 => {
                format!("{} rounds   early {}", self.attempts, self.too_early)
            }
            _ => String::new(),
        }
    }
}

fn mean(times: &[u64]) -> Option<f64> {
    match times.len() {
        0 => None,
        n => Some(times.iter().sum::<u64>() as f64 / n as f64),
    }
}
