//! The companion session facade.
//!
//! [`Companion`] ties the identity, preference store, reconciler, and moment
//! controller together. UIs call it instead of touching the pieces directly, so
//! every identity change or view re-entry goes through the one reconciliation path.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SessionConfig;
use crate::identity::{UserId, UserIdentity};
use crate::moment::{MomentController, SentMessage, SessionError};
use crate::preferences::{BackgroundRef, PreferenceStore};
use crate::service::{CompanionService, MomentCard, MomentSummary, ServiceResult};
use crate::session::{Reconciler, SessionFlags, TranscriptDirective, ViewMode};

pub struct Companion {
    identity: UserIdentity,
    store: PreferenceStore,
    reconciler: Reconciler,
    controller: MomentController,
    service: Arc<dyn CompanionService>,
    transition_delay: Duration,
    mode: ViewMode,
}

impl Companion {
    /// A fresh session for `identity`. Call [`Companion::enter`] to decide the first view.
    pub fn new(
        identity: UserIdentity,
        store: PreferenceStore,
        service: Arc<dyn CompanionService>,
        session: &SessionConfig,
    ) -> Self {
        let controller = MomentController::new(
            Arc::clone(&service),
            session.fallback_greeting.as_str(),
        );
        Self {
            identity,
            store,
            reconciler: Reconciler::new(),
            controller,
            service,
            transition_delay: session.transition_delay(),
            mode: ViewMode::Picker,
        }
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn user_id(&self) -> UserId {
        self.identity.user_id()
    }

    /// The view mode decided by the last reconciliation or picker selection.
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    pub fn flags(&self) -> &SessionFlags {
        self.reconciler.flags()
    }

    /// The moment controller. Cloning it allows concurrent sends.
    pub fn controller(&self) -> &MomentController {
        &self.controller
    }

    /// Enter (or re-enter) the conversation view and apply the reconciliation result.
    ///
    /// Landing on the main view with no live moment starts one.
    pub async fn enter(&mut self) -> ViewMode {
        let user_id = self.user_id();
        let has_transcript = self.controller.has_active_transcript();
        let outcome = self
            .reconciler
            .reconcile(&user_id, &mut self.store, has_transcript);

        if outcome.transcript == TranscriptDirective::Clear {
            self.controller.reset();
        }

        if outcome.mode == ViewMode::Main && !self.controller.has_live_moment() {
            self.controller.start_session(&user_id).await;
        }

        tracing::debug!(user = %user_id, mode = %outcome.mode, "view reconciled");
        self.mode = outcome.mode;
        self.mode
    }

    /// Record the picker choice. The returned mode is always
    /// [`ViewMode::Transition`]; follow with [`Companion::complete_transition`].
    pub fn select_background(&mut self, background: BackgroundRef) -> ViewMode {
        let user_id = self.user_id();
        self.mode = self
            .reconciler
            .select_background(&user_id, background, &mut self.store);
        self.mode
    }

    /// Hold the transition for the configured delay, then re-enter the view.
    pub async fn complete_transition(&mut self) -> ViewMode {
        if !self.transition_delay.is_zero() {
            tokio::time::sleep(self.transition_delay).await;
        }
        self.enter().await
    }

    /// Switch to a different identity, e.g. a new login within the same process.
    pub async fn switch_identity(&mut self, identity: UserIdentity) -> ViewMode {
        tracing::info!(from = %self.user_id(), to = %identity.user_id(), "switching identity");
        self.identity = identity;
        self.enter().await
    }

    /// Rename the traveler and/or companion.
    ///
    /// The service is asked first; if it refuses, the local identity stays as it was.
    /// On success the background is carried to the new id before reconciling.
    pub async fn rename(&mut self, traveler_name: &str, companion_name: &str) -> Result<ViewMode> {
        let renamed = UserIdentity::new(traveler_name, companion_name)?;
        let old_id = self.user_id();
        let new_id = renamed.user_id();
        if old_id == new_id {
            self.identity = renamed;
            return Ok(self.mode);
        }

        let outcome = self
            .service
            .rename_identity(&old_id, &renamed)
            .await
            .with_context(|| format!("failed to rename {old_id}"))?;
        if let Some(server_id) = outcome.new_user_id.as_deref() {
            if server_id != new_id.as_str() {
                tracing::warn!(local = %new_id, service = %server_id, "service derived a different user id");
            }
        }

        tracing::info!(from = %old_id, to = %new_id, "identity renamed");
        if let Err(e) = self.store.migrate(&old_id, &new_id) {
            tracing::warn!(error = %e, "failed to persist background migration");
        }
        self.identity = renamed;
        Ok(self.enter().await)
    }

    pub async fn send(&self, text: &str) -> Result<SentMessage, SessionError> {
        self.controller.send_message(&self.user_id(), text).await
    }

    pub async fn send_voice(
        &self,
        audio: Vec<u8>,
        file_name: &str,
    ) -> Result<SentMessage, SessionError> {
        self.controller
            .send_voice(&self.user_id(), audio, file_name)
            .await
    }

    pub async fn archive(&self) -> Option<MomentCard> {
        self.controller.archive(&self.user_id()).await
    }

    pub async fn fade(&self) -> Result<(), SessionError> {
        self.controller.fade(&self.user_id()).await.map(|_| ())
    }

    /// Begin a new moment without saving the current one.
    pub async fn restart(&self) -> Result<(), SessionError> {
        self.controller.restart(&self.user_id()).await.map(|_| ())
    }

    pub async fn moments(&self) -> ServiceResult<Vec<MomentSummary>> {
        self.controller.moments(&self.user_id()).await
    }
}
