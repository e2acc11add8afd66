use chrono::{DateTime, Local};

/// One recorded reaction. Seeded records carry no timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    player_name: String,
    reaction_time_ms: u64,
    recorded_at: Option<DateTime<Local>>,
}

impl ScoreRecord {
    pub fn new(player_name: impl Into<String>, reaction_time_ms: u64) -> Self {
        Self {
            player_name: player_name.into(),
            reaction_time_ms,
            recorded_at: None,
        }
    }

    pub fn recorded_now(player_name: impl Into<String>, reaction_time_ms: u64) -> Self {
        Self {
            recorded_at: Some(Local::now()),
            ..Self::new(player_name, reaction_time_ms)
        }
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn reaction_time_ms(&self) -> u64 {
        self.reaction_time_ms
    }

    pub fn recorded_at(&self) -> Option<DateTime<Local>> {
        self.recorded_at
    }
}

/// Session leaderboard, kept in ascending order of reaction time. Equal
/// times stay in arrival order.
#[derive(Debug, Default, Clone)]
pub struct ScoreLedger {
    records: Vec<ScoreRecord>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ScoreRecord) -> usize {
        // insert after every record with an equal time to keep ties stable
        let idx = self
            .records
            .partition_point(|r| r.reaction_time_ms <= record.reaction_time_ms);
        self.records.insert(idx, record);
        idx
    }

    pub fn seed<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = ScoreRecord>,
    {
        for record in records {
            self.insert(record);
        }
    }

    pub fn snapshot(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
