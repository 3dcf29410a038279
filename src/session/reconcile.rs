//! View-mode reconciliation.
//!
//! [`Reconciler::reconcile`] is re-run whenever the conversation view is entered or
//! the active identity changes. It is the only writer of [`SessionFlags`]. Its result
//! depends on the flags, the store entry for the user, the user id, and whether a
//! transcript is active; nothing else.

use serde::Serialize;

use super::flags::SessionFlags;
use crate::identity::UserId;
use crate::preferences::{BackgroundRef, PreferenceStore};

/// Which top-level screen the UI should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Background/planet selection.
    Picker,
    /// Cinematic transition after a background was picked.
    Transition,
    /// The conversation itself.
    Main,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Picker => "picker",
            Self::Transition => "transition",
            Self::Main => "main",
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller must do with the in-memory transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptDirective {
    Keep,
    Clear,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub mode: ViewMode,
    pub transcript: TranscriptDirective,
}

impl Reconciliation {
    fn keep(mode: ViewMode) -> Self {
        Self {
            mode,
            transcript: TranscriptDirective::Keep,
        }
    }

    fn picker_with_clear() -> Self {
        Self {
            mode: ViewMode::Picker,
            transcript: TranscriptDirective::Clear,
        }
    }
}

/// Owns the session flags and decides the view mode.
#[derive(Debug, Default)]
pub struct Reconciler {
    flags: SessionFlags,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> &SessionFlags {
        &self.flags
    }

    /// Decide the view mode for `user_id`.
    ///
    /// A saved background for the user counts as stronger evidence of a continuing
    /// session than an empty transcript.
    pub fn reconcile(
        &mut self,
        user_id: &UserId,
        store: &mut PreferenceStore,
        has_active_transcript: bool,
    ) -> Reconciliation {
        if self.flags.owner() != Some(user_id) {
            let Some(previous) = self.flags.owner().cloned() else {
                tracing::debug!(user = %user_id, "fresh session, binding owner");
                self.flags.reset_for(user_id.clone());
                if let Err(e) = store.focus(user_id) {
                    tracing::warn!(error = %e, "failed to persist background focus");
                }
                return Reconciliation::picker_with_clear();
            };

            if store.get(user_id).is_some() {
                tracing::info!(from = %previous, to = %user_id, "identity changed mid-session, continuing");
                if let Err(e) = store.migrate(&previous, user_id) {
                    tracing::warn!(error = %e, "failed to persist background migration");
                }
                self.flags.bind(user_id.clone());
                return Reconciliation::keep(ViewMode::Main);
            }

            tracing::info!(from = %previous, to = %user_id, "identity changed with no saved background, new session");
            self.flags.reset_for(user_id.clone());
            if let Err(e) = store.focus(user_id) {
                tracing::warn!(error = %e, "failed to persist background focus");
            }
            return Reconciliation::picker_with_clear();
        }

        if !self.flags.choice_made() && !has_active_transcript {
            Reconciliation::keep(ViewMode::Picker)
        } else if store.get(user_id).is_some() {
            Reconciliation::keep(ViewMode::Main)
        } else {
            Reconciliation::keep(ViewMode::Picker)
        }
    }

    /// Record a picker selection and enter the transition.
    ///
    /// Only the choice is marked; ownership is bound by [`Reconciler::reconcile`]. A
    /// persistence failure is logged and the session proceeds.
    pub fn select_background(
        &mut self,
        user_id: &UserId,
        background: BackgroundRef,
        store: &mut PreferenceStore,
    ) -> ViewMode {
        tracing::info!(user = %user_id, background = %background, "background selected");
        if let Err(e) = store.set(user_id, background) {
            tracing::warn!(error = %e, "failed to persist background selection");
        }
        self.flags.mark_choice_made();
        ViewMode::Transition
    }
}
