/// Debounced autosave for the day being edited
///
/// Every field change (re)arms a short timer. When it fires the latest
/// snapshot is saved. Switching to another date drops the pending save, and
/// closing the editor flushes it immediately.
///
/// The session itself never touches storage or reads a clock: callers pass
/// `Instant`s in and get snapshots out. `Autosaver` wires a session to a
/// `DailyLogRepository` for the common case.

use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::domain::DailyConditionLog;
use crate::repository::DailyLogRepository;
use crate::storage::{JournalStore, StorageError};

/// Quiet period after the last change before a save is issued
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(400);

/// Where the session is in the save cycle
#[derive(Debug, Clone, PartialEq)]
pub enum EditState {
    /// Nothing waiting to be written
    Idle,
    /// A save is scheduled for `deadline` with the latest snapshot
    PendingSave {
        snapshot: DailyConditionLog,
        deadline: Instant,
    },
    /// A snapshot has been handed out and is being written
    Saving,
}

/// Debounce state for editing a single date
#[derive(Debug, Clone)]
pub struct EditSession {
    date: NaiveDate,
    delay: Duration,
    state: EditState,
}

impl EditSession {
    pub fn new(date: NaiveDate) -> Self {
        Self::with_delay(date, DEFAULT_SAVE_DELAY)
    }

    pub fn with_delay(date: NaiveDate, delay: Duration) -> Self {
        Self {
            date,
            delay,
            state: EditState::Idle,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn has_pending_save(&self) -> bool {
        matches!(self.state, EditState::PendingSave { .. })
    }

    /// When the pending save is due, if one is scheduled
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            EditState::PendingSave { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    /// Record an edit and restart the debounce timer
    ///
    /// Snapshots for a date other than the one being edited are ignored and
    /// `false` is returned.
    pub fn field_changed(&mut self, snapshot: DailyConditionLog, now: Instant) -> bool {
        if snapshot.recorded_date != self.date {
            tracing::debug!(
                "Ignoring edit for {} while editing {}",
                snapshot.recorded_date,
                self.date
            );
            return false;
        }

        self.state = EditState::PendingSave {
            snapshot,
            deadline: now + self.delay,
        };
        true
    }

    /// Hand out the snapshot to save once its deadline has passed
    ///
    /// The session moves to `Saving`; call `save_finished` when the write
    /// completes. An edit arriving while saving schedules a fresh save.
    pub fn poll(&mut self, now: Instant) -> Option<DailyConditionLog> {
        match &self.state {
            EditState::PendingSave { deadline, .. } if *deadline <= now => {}
            _ => return None,
        }

        match std::mem::replace(&mut self.state, EditState::Saving) {
            EditState::PendingSave { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    /// Mark the in-flight save as done
    pub fn save_finished(&mut self) {
        if self.state == EditState::Saving {
            self.state = EditState::Idle;
        }
    }

    /// Switch to editing another date
    ///
    /// Any save pending for the previous date is discarded, never written
    /// under the new date.
    pub fn date_changed(&mut self, date: NaiveDate) {
        if date == self.date {
            return;
        }
        if self.has_pending_save() {
            tracing::debug!("Dropping pending save for {}", self.date);
        }
        self.date = date;
        self.state = EditState::Idle;
    }

    /// Close the session, returning any snapshot that still needs saving
    pub fn unmount(&mut self) -> Option<DailyConditionLog> {
        match std::mem::replace(&mut self.state, EditState::Idle) {
            EditState::PendingSave { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}

/// An edit session that saves through a daily log repository
pub struct Autosaver<'a, S: JournalStore + ?Sized> {
    session: EditSession,
    repository: DailyLogRepository<'a, S>,
}

impl<'a, S: JournalStore + ?Sized> Autosaver<'a, S> {
    pub fn new(store: &'a S, date: NaiveDate) -> Self {
        Self::with_session(store, EditSession::new(date))
    }

    pub fn with_session(store: &'a S, session: EditSession) -> Self {
        Self {
            session,
            repository: DailyLogRepository::new(store),
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    /// Save the pending snapshot if its deadline has passed
    ///
    /// Returns the persisted log when a save happened.
    pub fn tick(&mut self, now: Instant) -> Result<Option<DailyConditionLog>, StorageError> {
        let Some(snapshot) = self.session.poll(now) else {
            return Ok(None);
        };

        let result = self.repository.upsert(snapshot);
        self.session.save_finished();
        result.map(Some)
    }

    /// Save the pending snapshot right away (editor closing)
    pub fn flush(&mut self) -> Result<Option<DailyConditionLog>, StorageError> {
        match self.session.unmount() {
            Some(snapshot) => self.repository.upsert(snapshot).map(Some),
            None => Ok(None),
        }
    }
}
