use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use reflex::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    identity::PLAYER_NAME_KEY,
    input::{classify_click, classify_key},
    runtime::{CrosstermEventSource, FixedTicker, ReflexEvent, Runner},
    score_source::{load_seed, CsvScoreSource},
    session::{Notice, Session},
    settings::{FileSettingsStore, SettingsStore},
    ui::{self, Hitboxes, View},
    update::{spawn_update_check, NoUpdateAvailable, UpdateSubscription},
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// reaction-time mini-game: wait for green, then react as fast as you can
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Wait for the screen to turn green, then click or press z/x as fast as you can. Reacting early costs you the round; every good reaction lands on the session leaderboard."
)]
pub struct Cli {
    /// shortest wait before the cue, in milliseconds
    #[clap(long)]
    min_delay_ms: Option<u64>,

    /// longest wait before the cue (exclusive), in milliseconds
    #[clap(long)]
    max_delay_ms: Option<u64>,

    /// number of leaderboard rows to display
    #[clap(short = 'l', long)]
    limit: Option<usize>,

    /// CSV file with `name,score` rows used to seed the leaderboard
    #[clap(short = 's', long)]
    scores: Option<PathBuf>,

    /// player name to play as (remembered for next time)
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// open with the scoreboard panel visible
    #[clap(long)]
    scoreboard: bool,

    /// where to write the log (default: data directory)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// persist the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layers the command line over the stored config
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(ms) = self.min_delay_ms {
            cfg.min_delay_ms = ms;
        }
        if let Some(ms) = self.max_delay_ms {
            cfg.max_delay_ms = ms;
        }
        if let Some(limit) = self.limit {
            cfg.scoreboard_limit = limit;
        }
        if let Some(path) = &self.scores {
            cfg.scores_file = Some(path.clone());
        }
        if self.scoreboard {
            cfg.show_scoreboard = true;
        }
        cfg
    }
}

#[derive(Debug, PartialEq)]
enum ExitType {
    Quit,
    Relaunch,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());

    if let Err(msg) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, msg).exit();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_tracing(&cli.log_file.clone().unwrap_or_else(AppDirs::log_path));
    info!(version = env!("CARGO_PKG_VERSION"), "reflex_startup");

    if cli.save_config {
        if let Err(err) = config_store.save(&config) {
            warn!(error = %err, "config_save_failed");
        }
    }

    let mut session = build_session(&cli, &config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(
        &mut terminal,
        &mut session,
        Duration::from_millis(config.tick_rate_ms),
    );

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if result? == ExitType::Relaunch {
        println!("reflex was updated, start it again to use the new version");
    }

    Ok(())
}

fn build_session(cli: &Cli, config: &Config) -> Session<FileSettingsStore> {
    let mut store = FileSettingsStore::open(AppDirs::settings_path());
    if let Some(name) = cli.name.as_deref().map(str::trim) {
        if name.is_empty() {
            warn!("blank_cli_name_ignored");
        } else {
            store.set(PLAYER_NAME_KEY, name);
            if let Err(err) = store.save() {
                warn!(error = %err, "player_name_save_failed");
            }
        }
    }

    let seed = config
        .scores_file
        .as_ref()
        .map(|path| load_seed(&CsvScoreSource::new(path)))
        .unwrap_or_default();

    let update = UpdateSubscription::new(spawn_update_check(Box::new(NoUpdateAvailable)));

    Session::new(config.session_config(), store, seed, update)
}

/// Logs go to a file so they never land on the alternate screen. If the
/// file can't be opened logging stays off.
fn init_tracing(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .compact()
        .try_init();
}

fn redraw<B: Backend, S: SettingsStore>(
    terminal: &mut Terminal<B>,
    session: &Session<S>,
) -> io::Result<Hitboxes> {
    let view = View::of(session);
    let mut hits = Hitboxes::default();
    terminal.draw(|f| hits = ui::draw(&view, f))?;
    Ok(hits)
}

fn start_tui<B: Backend, S: SettingsStore>(
    terminal: &mut Terminal<B>,
    session: &mut Session<S>,
    tick: Duration,
) -> Result<ExitType, Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick));
    let mut hits = redraw(terminal, session)?;

    loop {
        let event = runner.step_until(session.next_deadline());

        // inputs are judged by when they were read, not when they got here
        let notices = match event {
            ReflexEvent::Tick => session.tick(Instant::now()),
            ReflexEvent::Resize => {
                hits = redraw(terminal, session)?;
                continue;
            }
            ReflexEvent::Key(key, at) => {
                let signal = classify_key(&key, session.name_prompt().is_some());
                session.handle(signal, at)
            }
            ReflexEvent::Click { column, row, at } => {
                session.handle(classify_click(hits.hit(column, row)), at)
            }
        };

        if notices.contains(&Notice::Quit) {
            info!("shutdown_requested");
            return Ok(ExitType::Quit);
        }
        if notices.contains(&Notice::Relaunch) {
            return Ok(ExitType::Relaunch);
        }
        if !notices.is_empty() {
            hits = redraw(terminal, session)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use reflex::settings::MemorySettingsStore;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["reflex"]);

        assert_eq!(cli.min_delay_ms, None);
        assert_eq!(cli.max_delay_ms, None);
        assert_eq!(cli.limit, None);
        assert_eq!(cli.name, None);
        assert!(!cli.scoreboard);
        assert!(!cli.save_config);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "reflex",
            "--min-delay-ms",
            "500",
            "--max-delay-ms",
            "1500",
            "-l",
            "10",
            "--scores",
            "top.csv",
            "--scoreboard",
        ]);
        let cfg = cli.apply(Config::default());

        assert_eq!(cfg.min_delay_ms, 500);
        assert_eq!(cfg.max_delay_ms, 1500);
        assert_eq!(cfg.scoreboard_limit, 10);
        assert_eq!(cfg.scores_file, Some(PathBuf::from("top.csv")));
        assert!(cfg.show_scoreboard);
    }

    #[test]
    fn test_cli_keeps_config_when_unset() {
        let stored = Config {
            min_delay_ms: 2000,
            scoreboard_limit: 8,
            ..Config::default()
        };
        let cfg = Cli::parse_from(["reflex"]).apply(stored.clone());
        assert_eq!(cfg, stored);
    }

    #[test]
    fn test_cli_name_flag() {
        let cli = Cli::parse_from(["reflex", "-n", "Ana"]);
        assert_eq!(cli.name.as_deref(), Some("Ana"));

        let cli = Cli::parse_from(["reflex", "--name", "Leo"]);
        assert_eq!(cli.name.as_deref(), Some("Leo"));
    }

    #[test]
    fn test_inverted_delay_window_fails_validation() {
        let cli = Cli::parse_from(["reflex", "--min-delay-ms", "5000"]);
        assert!(cli.apply(Config::default()).validate().is_err());
    }

    #[test]
    fn test_redraw_reports_start_button() {
        use ratatui::backend::TestBackend;

        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        let session = Session::new(
            Config::default().session_config(),
            MemorySettingsStore::with(PLAYER_NAME_KEY, "Ana"),
            vec![],
            UpdateSubscription::none(),
        );

        let hits = redraw(&mut terminal, &session).unwrap();
        assert!(hits.start_button.is_some());
    }

    #[test]
    fn test_exit_type_debug() {
        assert_eq!(format!("{:?}", ExitType::Quit), "Quit");
        assert_eq!(format!("{:?}", ExitType::Relaunch), "Relaunch");
    }
}
