use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use tracing::{info, warn};

/// Lifecycle notifications from an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    Started { total_bytes: Option<u64> },
    Progress { chunk_bytes: u64 },
    Finished,
    NoUpdate,
    Relaunch,
    Failed(String),
}

/// Something that can look for, download and install an update, reporting
/// as it goes.
pub trait UpdateCheck: Send + 'static {
    fn run(self: Box<Self>, events: &Sender<UpdateEvent>);
}

/// Checker used when no update backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUpdateAvailable;

impl UpdateCheck for NoUpdateAvailable {
    fn run(self: Box<Self>, events: &Sender<UpdateEvent>) {
        let _ = events.send(UpdateEvent::NoUpdate);
    }
}

/// Replays a fixed list of events.
#[derive(Debug, Clone, Default)]
pub struct ScriptedUpdate {
    events: Vec<UpdateEvent>,
}

impl ScriptedUpdate {
    pub fn new(events: Vec<UpdateEvent>) -> Self {
        Self { events }
    }
}

impl UpdateCheck for ScriptedUpdate {
    fn run(self: Box<Self>, events: &Sender<UpdateEvent>) {
        for ev in self.events {
            if events.send(ev).is_err() {
                break;
            }
        }
    }
}

/// Runs `check` on a background thread and hands back the receiving end.
pub fn spawn_update_check(check: Box<dyn UpdateCheck>) -> Receiver<UpdateEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || check.run(&tx));
    rx
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    Downloading,
    Installing,
}

/// Download progress of the update in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProgress {
    pub stage: UpdateStage,
    pub downloaded: u64,
    pub total: Option<u64>,
}

impl UpdateProgress {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            stage: UpdateStage::Downloading,
            downloaded: 0,
            total: total.filter(|&t| t > 0),
        }
    }

    pub fn percent(&self) -> Option<u8> {
        self.total
            .map(|total| ((self.downloaded.min(total) * 100) / total) as u8)
    }

    pub fn text(&self) -> String {
        match (self.stage, self.percent()) {
            (UpdateStage::Installing, _) => "Installing update…".to_string(),
            (UpdateStage::Downloading, Some(pct)) => format!("Downloading update… {pct}%"),
            (UpdateStage::Downloading, None) => {
                format!("Downloading update… {} bytes", self.downloaded)
            }
        }
    }
}

/// Holds the channel and the progress folded from it.
#[derive(Debug)]
pub struct UpdateSubscription {
    rx: Option<Receiver<UpdateEvent>>,
    progress: Option<UpdateProgress>,
    relaunch: bool,
}

impl UpdateSubscription {
    pub fn new(rx: Receiver<UpdateEvent>) -> Self {
        Self {
            rx: Some(rx),
            progress: None,
            relaunch: false,
        }
    }

    pub fn none() -> Self {
        Self {
            rx: None,
            progress: None,
            relaunch: false,
        }
    }

    pub fn in_progress(&self) -> Option<&UpdateProgress> {
        self.progress.as_ref()
    }

    pub fn relaunch_requested(&self) -> bool {
        self.relaunch
    }

    pub fn is_open(&self) -> bool {
        self.rx.is_some()
    }

    /// Applies every event waiting on the channel. Returns true if anything
    /// changed.
    pub fn drain(&mut self) -> bool {
        let mut changed = false;
        while let Some(rx) = &self.rx {
            match rx.try_recv() {
                Ok(ev) => {
                    self.apply(ev);
                    changed = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.progress.take().is_some() {
                        warn!("update_check_disconnected");
                        changed = true;
                    }
                    self.rx = None;
                }
            }
        }
        changed
    }

    pub fn apply(&mut self, ev: UpdateEvent) {
        match ev {
            UpdateEvent::Started { total_bytes } => {
                info!(?total_bytes, "update_started");
                self.progress = Some(UpdateProgress::new(total_bytes));
            }
            UpdateEvent::Progress { chunk_bytes } => {
                let progress = self.progress.get_or_insert_with(|| UpdateProgress::new(None));
                progress.downloaded += chunk_bytes;
            }
            UpdateEvent::Finished => {
                info!("update_downloaded");
                let progress = self.progress.get_or_insert_with(|| UpdateProgress::new(None));
                progress.stage = UpdateStage::Installing;
            }
            UpdateEvent::NoUpdate => {
                info!("no_update_available");
                self.progress = None;
                self.rx = None;
            }
            UpdateEvent::Failed(reason) => {
                warn!(%reason, "update_check_failed");
                self.progress = None;
                self.rx = None;
            }
            UpdateEvent::Relaunch => {
                info!("update_installed_relaunch");
                self.relaunch = true;
                self.rx = None;
            }
        }
    }
}
