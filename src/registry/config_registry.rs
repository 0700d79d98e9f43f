//! Identifier -> config mapping shared by the HTTP handlers and the
//! notification sessions.
//!
//! ## Locking
//! - The entry map and the active counter form one unit of consistency and
//!   live behind a single `parking_lot::Mutex`. `add`, `get`, `attach` and
//!   `remove` all run inside it, so the replace-or-reject decision in `add`
//!   is linearized against `attach` for the same id.
//! - The lock is never held across an `.await`. Pushes go through the
//!   per-entry channel lock, so notifying one entry never blocks another.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use prometheus::IntGauge;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::ConfigEntry;
use super::ConfigId;
use crate::NotificationChannel;
use crate::RegistryError;
use crate::ACTIVE_CONFIGS;

#[derive(Default)]
struct RegistryState {
    entries: HashMap<ConfigId, ConfigEntry>,
    /// Always equals `entries.len()`; kept next to the map so both change
    /// under the same guard.
    active_count: usize,
}

pub struct ConfigRegistry {
    state: Mutex<RegistryState>,
    active_gauge: IntGauge,
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRegistry {
    /// Registry reporting into the process-wide `pac_active_configs` gauge
    pub fn new() -> Self {
        Self::with_gauge(ACTIVE_CONFIGS.clone())
    }

    pub fn with_gauge(active_gauge: IntGauge) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            active_gauge,
        }
    }

    /// Store `content` under `id`.
    ///
    /// A fresh id creates a new entry. An existing entry without a listener
    /// gets its content replaced. An existing entry with a listener is left
    /// untouched and the call fails with `AlreadyActive`.
    pub fn add(
        &self,
        id: ConfigId,
        content: Bytes,
    ) -> std::result::Result<(), RegistryError> {
        let mut state = self.state.lock();

        match state.entries.get(&id) {
            Some(existing) if existing.is_active() => {
                warn!(%id, "Rejected upload: config is being served");
                return Err(RegistryError::AlreadyActive(id));
            }
            Some(_) => {
                state.entries.insert(id.clone(), ConfigEntry::new(content));
                info!(%id, "Replaced config");
            }
            None => {
                state.entries.insert(id.clone(), ConfigEntry::new(content));
                state.active_count += 1;
                info!(%id, "Added config");
            }
        }

        self.active_gauge.set(state.active_count as i64);
        Ok(())
    }

    pub fn get(
        &self,
        id: &ConfigId,
    ) -> Option<ConfigEntry> {
        self.state.lock().entries.get(id).cloned()
    }

    /// Bind a live notification channel to an existing entry.
    ///
    /// Fails with `NotFound` for unknown ids and `AlreadyAttached` when the
    /// entry has a listener. In both cases the caller still owns the
    /// connection and must close it.
    pub fn attach(
        &self,
        id: &ConfigId,
        channel: Arc<NotificationChannel>,
    ) -> std::result::Result<(), RegistryError> {
        let mut state = self.state.lock();

        let Some(entry) = state.entries.get_mut(id) else {
            return Err(RegistryError::NotFound(id.clone()));
        };
        if entry.is_active() {
            warn!(%id, "Rejected second listener");
            return Err(RegistryError::AlreadyAttached(id.clone()));
        }

        entry.set_channel(channel);
        info!(%id, "Websocket connection attached");
        Ok(())
    }

    /// Drop the entry and close its channel.
    ///
    /// Returns `false` when there was nothing to remove.
    pub async fn remove(
        &self,
        id: &ConfigId,
    ) -> bool {
        let channel = {
            let mut state = self.state.lock();
            let Some(mut entry) = state.entries.remove(id) else {
                debug!(%id, "Remove for unknown config ignored");
                return false;
            };
            state.active_count -= 1;
            self.active_gauge.set(state.active_count as i64);
            entry.take_channel()
        };

        if let Some(channel) = channel {
            channel.close().await;
        }
        info!(%id, "Deleted config");
        true
    }

    pub fn active_count(&self) -> usize {
        self.state.lock().active_count
    }

    /// True when `id` exists and has a listener attached
    pub fn is_active(
        &self,
        id: &ConfigId,
    ) -> bool {
        self.state
            .lock()
            .entries
            .get(id)
            .map(ConfigEntry::is_active)
            .unwrap_or(false)
    }
}
