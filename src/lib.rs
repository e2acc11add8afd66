// Library surface for the binary and for headless/integration tests.
pub mod app_dirs;
pub mod config;
pub mod identity;
pub mod input;
pub mod ledger;
pub mod round;
pub mod runtime;
pub mod score_source;
pub mod scoreboard;
pub mod session;
pub mod settings;
pub mod timer;
pub mod ui;
pub mod update;
