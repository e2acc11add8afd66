use thiserror::Error;
use tracing::{info, warn};

use crate::settings::{SettingsError, SettingsStore};

pub const PLAYER_NAME_KEY: &str = "playerName";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("player name must not be empty")]
    InvalidName,
    #[error("could not persist player name: {0}")]
    Persistence(#[from] SettingsError),
}

/// Current player's display name, backed by a settings store.
pub struct PlayerIdentity<S: SettingsStore> {
    store: S,
    name: Option<String>,
}

impl<S: SettingsStore> PlayerIdentity<S> {
    pub fn new(store: S) -> Self {
        Self { store, name: None }
    }

    /// Reads the stored name. Blank values count as never set.
    pub fn resolve(&mut self) -> Option<&str> {
        self.name = self
            .store
            .get(PLAYER_NAME_KEY)
            .map(|raw| raw.trim().to_string())
            .filter(|name| !name.is_empty());
        self.name.as_deref()
    }

    /// Trims and stores `name`.
    ///
    /// When only the save fails the name is still adopted for this session
    /// and the error is returned so the caller can report it.
    pub fn set<'a>(&mut self, name: &'a str) -> Result<&'a str, IdentityError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::InvalidName);
        }

        self.store.set(PLAYER_NAME_KEY, trimmed);
        self.name = Some(trimmed.to_string());
        if let Err(err) = self.store.save() {
            warn!(error = %err, "player_name_save_failed");
            return Err(err.into());
        }
        info!(name = trimmed, "player_name_set");
        Ok(trimmed)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettingsStore;
    use assert_matches::assert_matches;

    struct BrokenStore;

    impl SettingsStore for BrokenStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, _key: &str, _value: &str) {}

        fn save(&mut self) -> Result<(), SettingsError> {
            Err(SettingsError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    #[test]
    fn resolve_absent() {
        let mut identity = PlayerIdentity::new(MemorySettingsStore::new());
        assert_eq!(identity.resolve(), None);
    }

    #[test]
    fn resolve_stored_name() {
        let mut identity = PlayerIdentity::new(MemorySettingsStore::with(PLAYER_NAME_KEY, "Ana"));
        assert_eq!(identity.resolve(), Some("Ana"));
    }

    #[test]
    fn resolve_blank_is_absent() {
        let mut identity = PlayerIdentity::new(MemorySettingsStore::with(PLAYER_NAME_KEY, "   "));
        assert_eq!(identity.resolve(), None);
    }

    #[test]
    fn set_rejects_whitespace() {
        let mut identity = PlayerIdentity::new(MemorySettingsStore::new());
        assert_matches!(identity.set(" \t "), Err(IdentityError::InvalidName));
        assert_eq!(identity.name(), None);
        assert_eq!(identity.store().saves, 0);
    }

    #[test]
    fn set_trims_and_saves() {
        let mut identity = PlayerIdentity::new(MemorySettingsStore::new());
        let raw = String::from("  Leo ");
        let accepted = identity.set(&raw).unwrap();
        assert_eq!(accepted, "Leo");
        assert_eq!(identity.name(), Some("Leo"));
        assert_eq!(identity.store().get(PLAYER_NAME_KEY), Some("Leo".to_string()));
        assert_eq!(identity.store().saves, 1);
    }

    #[test]
    fn save_failure_keeps_session_name() {
        let mut identity = PlayerIdentity::new(BrokenStore);
        assert_matches!(identity.set("Ana"), Err(IdentityError::Persistence(_)));
        assert_eq!(identity.name(), Some("Ana"));
    }
}
