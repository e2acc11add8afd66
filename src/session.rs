use std::ops::Range;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::identity::{IdentityError, PlayerIdentity};
use crate::input::{Control, Edit, Signal};
use crate::ledger::{ScoreLedger, ScoreRecord};
use crate::round::{Outcome, Phase, Round, Transition};
use crate::scoreboard::{self, ScoreboardRow, SessionSummary};
use crate::settings::SettingsStore;
use crate::timer::{random_delay, TimerService, DEFAULT_DELAY_RANGE_MS};
use crate::update::{UpdateProgress, UpdateSubscription};

pub const TOO_EARLY_TEXT: &str = "Too early! Try again";
pub const MAX_NAME_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub delay_range_ms: Range<u64>,
    pub scoreboard_limit: usize,
    pub show_scoreboard: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            delay_range_ms: DEFAULT_DELAY_RANGE_MS,
            scoreboard_limit: 5,
            show_scoreboard: false,
        }
    }
}

/// Tells the shell what changed so it can redraw or exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    RoundArmed,
    CueShown,
    Resolved(Outcome),
    Recorded { rank: usize },
    NamePrompt,
    NameAccepted,
    NameRejected,
    NameEdited,
    ScoreboardToggled,
    UpdateChanged,
    Relaunch,
    Quit,
}

/// Name entry state while the prompt is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamePrompt {
    pub buffer: String,
    pub error: Option<String>,
}

/// Owns the round, ledger and identity and routes classified input to them.
pub struct Session<S: SettingsStore> {
    config: SessionConfig,
    round: Round,
    timers: TimerService,
    ledger: ScoreLedger,
    identity: PlayerIdentity<S>,
    update: UpdateSubscription,
    rng: StdRng,
    result_text: String,
    name_prompt: Option<NamePrompt>,
    show_scoreboard: bool,
    session_times: Vec<u64>,
    too_early: usize,
}

impl<S: SettingsStore> Session<S> {
    /// Resolves the player's name and seeds the ledger. Without a stored
    /// name the session opens the name prompt and refuses to start rounds.
    pub fn new(
        config: SessionConfig,
        store: S,
        seed: Vec<ScoreRecord>,
        update: UpdateSubscription,
    ) -> Self {
        Self::with_rng(config, store, seed, update, StdRng::from_entropy())
    }

    pub fn with_rng(
        config: SessionConfig,
        store: S,
        seed: Vec<ScoreRecord>,
        update: UpdateSubscription,
        rng: StdRng,
    ) -> Self {
        let mut identity = PlayerIdentity::new(store);
        let name_prompt = match identity.resolve() {
            Some(name) => {
                info!(name, "player_resolved");
                None
            }
            None => {
                info!("player_name_missing");
                Some(NamePrompt::default())
            }
        };

        let mut ledger = ScoreLedger::new();
        ledger.seed(seed);

        Self {
            show_scoreboard: config.show_scoreboard,
            config,
            round: Round::new(),
            timers: TimerService::new(),
            ledger,
            identity,
            update,
            rng,
            result_text: String::new(),
            name_prompt,
            session_times: Vec::new(),
            too_early: 0,
        }
    }

    /// Processes everything due at `now`: pending update events, then the
    /// cue timer.
    pub fn tick(&mut self, now: Instant) -> Vec<Notice> {
        let mut notices = Vec::new();

        if self.update.drain() {
            notices.push(Notice::UpdateChanged);
            if self.update.relaunch_requested() {
                notices.push(Notice::Relaunch);
            }
        }
        if self.update.in_progress().is_some() && !self.round.is_idle() {
            self.round.abort(&mut self.timers);
            self.result_text.clear();
        }

        if let Some(fired) = self.timers.poll(now) {
            if let Some(Transition::Ready) = self.round.on_timer(fired, now) {
                notices.push(Notice::CueShown);
            }
        }
        notices
    }

    /// Handles one input received at `now`. Timers due at or before `now`
    /// fire first, so an input landing in the same instant as the cue counts
    /// as a reaction to it.
    pub fn handle(&mut self, signal: Signal, now: Instant) -> Vec<Notice> {
        let mut notices = self.tick(now);

        if let Signal::Control(Control::Quit) = signal {
            notices.push(Notice::Quit);
            return notices;
        }
        if self.is_updating() {
            debug!(?signal, "input_suspended_for_update");
            return notices;
        }

        match signal {
            Signal::Control(Control::StartRound) => self.start_round(now, &mut notices),
            Signal::Control(Control::ToggleScoreboard) => {
                if self.name_prompt.is_none() {
                    self.show_scoreboard = !self.show_scoreboard;
                    notices.push(Notice::ScoreboardToggled);
                }
            }
            Signal::Control(Control::RequestRename) => {
                if self.round.is_idle() && self.name_prompt.is_none() {
                    self.name_prompt = Some(NamePrompt {
                        buffer: self.identity.name().unwrap_or_default().to_string(),
                        error: None,
                    });
                    notices.push(Notice::NamePrompt);
                }
            }
            Signal::Control(Control::SubmitName) => self.submit_name(&mut notices),
            Signal::Edit(edit) => self.edit_name(edit, &mut notices),
            Signal::React => self.react(now, &mut notices),
            Signal::Control(Control::Quit) | Signal::Ignore => {}
        }
        notices
    }

    fn start_round(&mut self, now: Instant, notices: &mut Vec<Notice>) {
        if self.name_prompt.is_some() || self.identity.name().is_none() {
            debug!("start_blocked_without_name");
            if self.name_prompt.is_none() {
                self.name_prompt = Some(NamePrompt::default());
                notices.push(Notice::NamePrompt);
            }
            return;
        }

        let delay = random_delay(&mut self.rng, &self.config.delay_range_ms);
        if self.round.start(&mut self.timers, delay, now).is_some() {
            self.result_text.clear();
            notices.push(Notice::RoundArmed);
        }
    }

    fn react(&mut self, now: Instant, notices: &mut Vec<Notice>) {
        if self.name_prompt.is_some() {
            return;
        }
        let Some(Transition::Resolved(outcome)) = self.round.interact(&mut self.timers, now)
        else {
            return;
        };
        notices.push(Notice::Resolved(outcome));

        match outcome {
            Outcome::Success { reaction_time_ms } => {
                self.result_text = format!("Reaction time: {reaction_time_ms}ms");
                self.session_times.push(reaction_time_ms);
                // rounds can only start with a name, so this always records
                if let Some(name) = self.identity.name() {
                    let idx = self
                        .ledger
                        .insert(ScoreRecord::recorded_now(name, reaction_time_ms));
                    info!(name, reaction_time_ms, rank = idx + 1, "score_recorded");
                    notices.push(Notice::Recorded { rank: idx + 1 });
                }
            }
            Outcome::TooEarly => {
                self.result_text = TOO_EARLY_TEXT.to_string();
                self.too_early += 1;
            }
        }
    }

    fn submit_name(&mut self, notices: &mut Vec<Notice>) {
        let Some(prompt) = self.name_prompt.as_mut() else {
            return;
        };

        match self.identity.set(&prompt.buffer) {
            Ok(_) => {
                self.name_prompt = None;
                notices.push(Notice::NameAccepted);
            }
            Err(IdentityError::InvalidName) => {
                prompt.error = Some("Please enter a name".to_string());
                notices.push(Notice::NameRejected);
            }
            Err(err @ IdentityError::Persistence(_)) => {
                // the name still applies for this session
                warn!(error = %err, "player_name_not_persisted");
                self.name_prompt = None;
                self.result_text = "Name could not be saved; using it for this session".into();
                notices.push(Notice::NameAccepted);
            }
        }
    }

    fn edit_name(&mut self, edit: Edit, notices: &mut Vec<Notice>) {
        let Some(prompt) = self.name_prompt.as_mut() else {
            return;
        };
        match edit {
            Edit::Char(c) if !c.is_control() && prompt.buffer.chars().count() < MAX_NAME_LEN => {
                prompt.buffer.push(c);
            }
            Edit::Char(_) => return,
            Edit::Backspace => {
                if prompt.buffer.pop().is_none() {
                    return;
                }
            }
        }
        prompt.error = None;
        notices.push(Notice::NameEdited);
    }

    pub fn phase(&self) -> Phase {
        self.round.phase()
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn player_name(&self) -> Option<&str> {
        self.identity.name()
    }

    pub fn identity(&self) -> &PlayerIdentity<S> {
        &self.identity
    }

    pub fn result_text(&self) -> &str {
        &self.result_text
    }

    pub fn name_prompt(&self) -> Option<&NamePrompt> {
        self.name_prompt.as_ref()
    }

    pub fn scoreboard_visible(&self) -> bool {
        self.show_scoreboard
    }

    pub fn scoreboard_rows(&self) -> Vec<ScoreboardRow> {
        scoreboard::present_top(self.ledger.snapshot(), self.config.scoreboard_limit)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_times(&self.session_times, self.too_early)
    }

    pub fn update_progress(&self) -> Option<&UpdateProgress> {
        self.update.in_progress()
    }

    pub fn is_updating(&self) -> bool {
        self.update.in_progress().is_some()
    }

    pub fn relaunch_requested(&self) -> bool {
        self.update.relaunch_requested()
    }

    /// Earliest instant at which `tick` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PLAYER_NAME_KEY;
    use crate::settings::MemorySettingsStore;
    use crate::update::{UpdateEvent, UpdateSubscription};
    use assert_matches::assert_matches;
    use std::sync::mpsc;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn fixed_delay(delay_ms: u64) -> SessionConfig {
        SessionConfig {
            delay_range_ms: delay_ms..delay_ms + 1,
            ..SessionConfig::default()
        }
    }

    fn session_for(name: Option<&str>, delay_ms: u64) -> Session<MemorySettingsStore> {
        let store = match name {
            Some(n) => MemorySettingsStore::with(PLAYER_NAME_KEY, n),
            None => MemorySettingsStore::new(),
        };
        Session::with_rng(
            fixed_delay(delay_ms),
            store,
            vec![],
            UpdateSubscription::none(),
            StdRng::seed_from_u64(3),
        )
    }

    const START: Signal = Signal::Control(Control::StartRound);

    #[test]
    fn successful_round_is_recorded() {
        let mut session = session_for(Some("Ana"), 1500);
        let t0 = Instant::now();

        assert_eq!(session.handle(START, t0), vec![Notice::RoundArmed]);
        assert_eq!(session.tick(t0 + ms(1500)), vec![Notice::CueShown]);
        let notices = session.handle(Signal::React, t0 + ms(1700));

        assert_eq!(
            notices,
            vec![
                Notice::Resolved(Outcome::Success {
                    reaction_time_ms: 200
                }),
                Notice::Recorded { rank: 1 },
            ]
        );
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.result_text(), "Reaction time: 200ms");
        let snapshot = session.ledger().snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].player_name(), "Ana");
        assert_eq!(snapshot[0].reaction_time_ms(), 200);
    }

    #[test]
    fn early_reaction_leaves_ledger_untouched() {
        let mut session = session_for(Some("Ana"), 1500);
        let t0 = Instant::now();

        session.handle(START, t0);
        let notices = session.handle(Signal::React, t0 + ms(300));

        assert_eq!(notices, vec![Notice::Resolved(Outcome::TooEarly)]);
        assert!(session.ledger().is_empty());
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.result_text(), TOO_EARLY_TEXT);
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn timer_fires_before_same_instant_input() {
        let mut session = session_for(Some("Ana"), 1500);
        let t0 = Instant::now();

        session.handle(START, t0);
        let notices = session.handle(Signal::React, t0 + ms(1500));

        assert_eq!(notices[0], Notice::CueShown);
        assert_eq!(
            notices[1],
            Notice::Resolved(Outcome::Success {
                reaction_time_ms: 0
            })
        );
    }

    #[test]
    fn queued_early_reaction_stays_too_early() {
        let mut session = session_for(Some("Ana"), 1000);
        let t0 = Instant::now();

        session.handle(START, t0);
        // cue observed late, the press was received well before it
        assert_eq!(session.tick(t0 + ms(1040)), vec![Notice::CueShown]);
        let notices = session.handle(Signal::React, t0 + ms(5));

        assert_eq!(notices, vec![Notice::Resolved(Outcome::TooEarly)]);
        assert!(session.ledger().is_empty());
        assert_eq!(session.summary().too_early, 1);
    }

    #[test]
    fn double_start_arms_once() {
        let mut session = session_for(Some("Ana"), 2000);
        let t0 = Instant::now();

        assert_eq!(session.handle(START, t0), vec![Notice::RoundArmed]);
        assert!(session.handle(START, t0).is_empty());
        assert_eq!(session.next_deadline(), Some(t0 + ms(2000)));
    }

    #[test]
    fn start_while_ready_is_ignored() {
        let mut session = session_for(Some("Ana"), 1000);
        let t0 = Instant::now();

        session.handle(START, t0);
        session.tick(t0 + ms(1000));
        assert!(session.handle(START, t0 + ms(1100)).is_empty());
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[test]
    fn missing_name_blocks_start_until_set() {
        let mut session = session_for(None, 1000);
        let t0 = Instant::now();
        assert!(session.name_prompt().is_some());

        assert!(session.handle(START, t0).is_empty());
        assert_eq!(session.phase(), Phase::Idle);

        session.handle(Signal::Edit(Edit::Char(' ')), t0);
        let notices = session.handle(Signal::Control(Control::SubmitName), t0);
        assert_eq!(notices, vec![Notice::NameRejected]);
        assert!(session.name_prompt().unwrap().error.is_some());

        for c in "Leo ".chars() {
            session.handle(Signal::Edit(Edit::Char(c)), t0);
        }
        let notices = session.handle(Signal::Control(Control::SubmitName), t0);
        assert_eq!(notices, vec![Notice::NameAccepted]);
        assert_eq!(session.player_name(), Some("Leo"));
        assert_eq!(
            session.identity().store().get(PLAYER_NAME_KEY),
            Some("Leo".to_string())
        );

        assert_eq!(session.handle(START, t0), vec![Notice::RoundArmed]);
    }

    #[test]
    fn reaction_keys_edit_name_instead_of_reacting() {
        let mut session = session_for(None, 1000);
        let t0 = Instant::now();

        session.handle(Signal::Edit(Edit::Char('z')), t0);
        session.handle(Signal::Edit(Edit::Char('x')), t0);
        session.handle(Signal::Edit(Edit::Backspace), t0);
        assert_eq!(session.name_prompt().unwrap().buffer, "z");
        assert!(session.handle(Signal::React, t0).is_empty());
    }

    #[test]
    fn rename_only_while_idle() {
        let mut session = session_for(Some("Ana"), 1000);
        let t0 = Instant::now();
        let rename = Signal::Control(Control::RequestRename);

        session.handle(START, t0);
        assert!(session.handle(rename, t0 + ms(10)).is_empty());
        session.handle(Signal::React, t0 + ms(20));

        assert_eq!(session.handle(rename, t0 + ms(30)), vec![Notice::NamePrompt]);
        assert_eq!(session.name_prompt().unwrap().buffer, "Ana");
    }

    #[test]
    fn scoreboard_toggle_and_limit() {
        let seed = (0..7)
            .map(|i| ScoreRecord::new(format!("p{i}"), 300 - i * 10))
            .collect();
        let mut session = Session::with_rng(
            SessionConfig::default(),
            MemorySettingsStore::with(PLAYER_NAME_KEY, "Ana"),
            seed,
            UpdateSubscription::none(),
            StdRng::seed_from_u64(1),
        );
        let t0 = Instant::now();

        assert!(!session.scoreboard_visible());
        session.handle(Signal::Control(Control::ToggleScoreboard), t0);
        assert!(session.scoreboard_visible());

        let rows = session.scoreboard_rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].name, "p6");
        assert_eq!(rows[0].time_ms, 240);
    }

    #[test]
    fn random_delays_stay_in_window() {
        let mut session = Session::with_rng(
            SessionConfig::default(),
            MemorySettingsStore::with(PLAYER_NAME_KEY, "Ana"),
            vec![],
            UpdateSubscription::none(),
            StdRng::seed_from_u64(11),
        );
        let t0 = Instant::now();

        for i in 0..50 {
            let at = t0 + ms(i * 10_000);
            session.handle(START, at);
            let waited = session.next_deadline().unwrap().duration_since(at);
            assert!(waited >= ms(1000) && waited < ms(4000));
            session.handle(Signal::React, at + ms(1));
        }
        assert_eq!(session.summary().too_early, 50);
    }

    #[test]
    fn update_suspends_round_input() {
        let (tx, rx) = mpsc::channel();
        let mut session = Session::with_rng(
            fixed_delay(1000),
            MemorySettingsStore::with(PLAYER_NAME_KEY, "Ana"),
            vec![],
            UpdateSubscription::new(rx),
            StdRng::seed_from_u64(5),
        );
        let t0 = Instant::now();

        session.handle(START, t0);
        tx.send(UpdateEvent::Started {
            total_bytes: Some(1000),
        })
        .unwrap();
        tx.send(UpdateEvent::Progress { chunk_bytes: 250 }).unwrap();

        let notices = session.tick(t0 + ms(100));
        assert_eq!(notices, vec![Notice::UpdateChanged]);
        assert!(session.is_updating());
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.next_deadline(), None);
        assert_eq!(session.update_progress().unwrap().percent(), Some(25));

        assert!(session.handle(START, t0 + ms(200)).is_empty());
        assert!(session.handle(Signal::React, t0 + ms(300)).is_empty());
        assert_eq!(
            session.handle(Signal::Control(Control::Quit), t0 + ms(300)),
            vec![Notice::Quit]
        );

        tx.send(UpdateEvent::Finished).unwrap();
        tx.send(UpdateEvent::Relaunch).unwrap();
        let notices = session.tick(t0 + ms(400));
        assert_eq!(notices, vec![Notice::UpdateChanged, Notice::Relaunch]);
        assert!(session.relaunch_requested());
    }

    #[test]
    fn failed_update_resumes_play() {
        let (tx, rx) = mpsc::channel();
        let mut session = Session::with_rng(
            fixed_delay(1000),
            MemorySettingsStore::with(PLAYER_NAME_KEY, "Ana"),
            vec![],
            UpdateSubscription::new(rx),
            StdRng::seed_from_u64(5),
        );
        let t0 = Instant::now();

        tx.send(UpdateEvent::Started { total_bytes: None }).unwrap();
        session.tick(t0);
        assert!(session.is_updating());

        tx.send(UpdateEvent::Failed("connection refused".into())).unwrap();
        session.tick(t0 + ms(10));
        assert!(!session.is_updating());
        assert_eq!(session.handle(START, t0 + ms(20)), vec![Notice::RoundArmed]);
    }

    #[test]
    fn summary_tracks_session_rounds_only() {
        let mut session = Session::with_rng(
            fixed_delay(1000),
            MemorySettingsStore::with(PLAYER_NAME_KEY, "Ana"),
            vec![ScoreRecord::new("Old", 90)],
            UpdateSubscription::none(),
            StdRng::seed_from_u64(5),
        );
        let t0 = Instant::now();

        session.handle(START, t0);
        session.tick(t0 + ms(1000));
        session.handle(Signal::React, t0 + ms(1250));
        session.handle(START, t0 + ms(2000));
        session.handle(Signal::React, t0 + ms(2100));

        let summary = session.summary();
        assert_eq!(summary.attempts, 2);
        assert_eq!(summary.too_early, 1);
        assert_eq!(summary.best_ms, Some(250));
        assert_eq!(session.ledger().len(), 2);
        assert_matches!(session.round().last_outcome(), Some(Outcome::TooEarly));
    }
}
