//! Runtime-mutable global settings.
//!
//! Admin operations mutate these between requests; every vote
//! transaction reads one [`SettingsSnapshot`] up front and never looks
//! again, so a concurrent change cannot alter an in-flight outcome.
//! Visibility-mode changes therefore apply only to broadcasts emitted
//! after the change.
//!
//! A pause also freezes credit accrual: balance reads taken while
//! voting is paused are evaluated at the pause start (see
//! [`SettingsState::accrual_instant`]), so an account that polls its
//! balance mid-pause accrues nothing an idle account would not.

use std::sync::RwLock;

use chrono::{DateTime, Utc};

use podium_types::{SettingsSnapshot, VisibilityMode};

/// The settings plus the pause bookkeeping, kept under one lock so the
/// paused flag and the pause start can never disagree.
#[derive(Debug)]
struct Inner {
    snapshot: SettingsSnapshot,
    /// When the current pause began; `None` while voting is live.
    pause_started_at: Option<DateTime<Utc>>,
}

/// Shared mutable settings state.
///
/// Wrapped in `Arc` by the application state. Reads clone the snapshot;
/// writes hold the lock only for the swap. No await happens under the
/// lock.
#[derive(Debug)]
pub struct SettingsState {
    inner: RwLock<Inner>,
}

impl SettingsState {
    /// Initialize from the configuration-derived snapshot.
    pub const fn new(initial: SettingsSnapshot) -> Self {
        Self {
            inner: RwLock::new(Inner {
                snapshot: initial,
                pause_started_at: None,
            }),
        }
    }

    /// Point-in-time copy of the current settings.
    pub fn snapshot(&self) -> SettingsSnapshot {
        self.inner
            .read()
            .map(|inner| inner.snapshot.clone())
            .unwrap_or_default()
    }

    /// The instant credit accrual should treat as "now".
    ///
    /// While voting is paused this is clamped to the pause start, so a
    /// balance read taken mid-pause cannot grant credits for paused
    /// wall-clock time; the resume anchor shift then accounts for the
    /// whole paused span exactly once.
    pub fn accrual_instant(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.inner.read().map_or(now, |inner| {
            if inner.snapshot.voting_paused {
                inner.pause_started_at.map_or(now, |started| now.min(started))
            } else {
                now
            }
        })
    }

    /// Pause voting, remembering when the pause began.
    ///
    /// Returns `false` if voting was already paused (the original pause
    /// start is kept, so overlapping pauses cannot shorten the shift).
    pub fn pause(&self, now: DateTime<Utc>) -> bool {
        let Ok(mut inner) = self.inner.write() else {
            return false;
        };
        if inner.snapshot.voting_paused {
            return false;
        }
        inner.snapshot.voting_paused = true;
        inner.pause_started_at = Some(now);
        true
    }

    /// Resume voting, returning when the pause began so the credit
    /// ledger can shift accrual anchors by the pause duration.
    ///
    /// Returns `None` if voting was not paused.
    pub fn resume(&self) -> Option<DateTime<Utc>> {
        let Ok(mut inner) = self.inner.write() else {
            return None;
        };
        if !inner.snapshot.voting_paused {
            return None;
        }
        inner.snapshot.voting_paused = false;
        inner.pause_started_at.take()
    }

    /// Switch the broadcast visibility mode.
    ///
    /// Takes effect for broadcasts emitted after the call; in-flight
    /// transactions keep the snapshot they started with.
    pub fn set_visibility(&self, mode: VisibilityMode) {
        if let Ok(mut inner) = self.inner.write() {
            inner.snapshot.visibility = mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SettingsState {
        SettingsState::new(SettingsSnapshot::default())
    }

    #[test]
    fn pause_and_resume_roundtrip() {
        let settings = state();
        let started = Utc::now();

        assert!(settings.pause(started));
        assert!(settings.snapshot().voting_paused);

        assert_eq!(settings.resume(), Some(started));
        assert!(!settings.snapshot().voting_paused);
    }

    #[test]
    fn double_pause_keeps_the_original_start() {
        let settings = state();
        let first = Utc::now();

        assert!(settings.pause(first));
        assert!(!settings.pause(first + chrono::Duration::seconds(60)));
        assert_eq!(settings.resume(), Some(first));
    }

    #[test]
    fn resume_without_pause_is_none() {
        assert_eq!(state().resume(), None);
    }

    #[test]
    fn paused_state_always_carries_its_start() {
        // The flag and the start live under one lock: whenever a
        // snapshot says paused, resume() must produce the start.
        let settings = state();
        assert!(settings.pause(Utc::now()));
        assert!(settings.snapshot().voting_paused);
        assert!(settings.resume().is_some());
    }

    #[test]
    fn accrual_instant_is_clamped_while_paused() {
        let settings = state();
        let started = Utc::now();
        let later = started + chrono::Duration::seconds(3000);

        // Live: the wall clock passes through.
        assert_eq!(settings.accrual_instant(later), later);

        // Paused: reads taken after the pause start are evaluated at
        // the start, so paused time never accrues.
        settings.pause(started);
        assert_eq!(settings.accrual_instant(later), started);

        // An instant before the pause start is untouched.
        let earlier = started - chrono::Duration::seconds(10);
        assert_eq!(settings.accrual_instant(earlier), earlier);

        // Resumed: the wall clock passes through again.
        settings.resume();
        assert_eq!(settings.accrual_instant(later), later);
    }

    #[test]
    fn visibility_change_shows_in_next_snapshot() {
        let settings = state();
        let before = settings.snapshot();
        assert_eq!(before.visibility, VisibilityMode::PerVoter);

        settings.set_visibility(VisibilityMode::AllSecret);
        assert_eq!(settings.snapshot().visibility, VisibilityMode::AllSecret);
        // The earlier snapshot is untouched: per-transaction isolation.
        assert_eq!(before.visibility, VisibilityMode::PerVoter);
    }
}
