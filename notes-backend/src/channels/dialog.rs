//! Per-user dialog state for multi-step note input.
//!
//! A user is `Idle` unless they pressed "new" or "edit" and the bot is waiting
//! for the next text message. State lives only in memory and has no expiry.
//! Entering a dialog while another one is open replaces it.

use dashmap::DashMap;
use strum::AsRefStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingNewText,
    AwaitingEditText {
        note_id: i64,
        /// List page to show again after the edit.
        page: u64,
    },
}

impl DialogState {
    pub fn is_awaiting_text(&self) -> bool {
        !matches!(self, DialogState::Idle)
    }
}

/// Thread-safe dialog slots, keyed by owner id. Idle users have no entry.
#[derive(Default)]
pub struct DialogStore {
    slots: DashMap<i64, DialogState>,
}

impl DialogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for the owner (`Idle` if nothing is open).
    pub fn get(&self, owner_id: i64) -> DialogState {
        self.slots
            .get(&owner_id)
            .map(|entry| *entry)
            .unwrap_or_default()
    }

    /// Open a dialog, replacing whatever the owner had open before.
    pub fn enter(&self, owner_id: i64, state: DialogState) {
        if !state.is_awaiting_text() {
            self.clear(owner_id);
            return;
        }
        if let Some(previous) = self.slots.insert(owner_id, state) {
            log::debug!(
                "[DIALOG] Owner {} abandoned {} for {}",
                owner_id,
                previous.as_ref(),
                state.as_ref()
            );
        } else {
            log::debug!("[DIALOG] Owner {} entered {}", owner_id, state.as_ref());
        }
    }

    /// Remove and return the owner's state, leaving them `Idle`.
    pub fn take(&self, owner_id: i64) -> DialogState {
        self.slots
            .remove(&owner_id)
            .map(|(_, state)| state)
            .unwrap_or_default()
    }

    /// Drop the owner's dialog. Returns the state that was open.
    pub fn clear(&self, owner_id: i64) -> DialogState {
        let previous = self.take(owner_id);
        if previous.is_awaiting_text() {
            log::debug!("[DIALOG] Owner {} left {}", owner_id, previous.as_ref());
        }
        previous
    }

    /// Number of users with an open dialog.
    pub fn open_count(&self) -> usize {
        self.slots.len()
    }
}
