//! Moment lifecycle and the conversation transcript.
//!
//! [`MomentController`] owns the current [`MomentHandle`] and bridges it to the
//! companion service. Its state sits behind a mutex that is never held across an
//! `.await`, so a clone of the controller can send a second message while the first
//! is still in flight. Replies are applied in arrival order.
//!
//! Handle lifecycle: `Unstarted → Active → (Archiving) → Discarded`. A discarded
//! handle is never revived; [`MomentController::start_session`] replaces it.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::types::{Emotion, Message};
use crate::identity::UserId;
use crate::service::{CompanionService, MomentCard, MomentSummary, ServiceError, ServiceResult};

/// Lifecycle state of a [`MomentHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleState {
    Unstarted,
    Active,
    /// Only while a save request is in flight.
    Archiving,
    Discarded,
}

/// One conversation segment.
#[derive(Debug, Clone, Serialize)]
pub struct MomentHandle {
    /// Local identity, distinct for every replacement.
    pub handle_id: Uuid,
    /// Service-side moment id; `None` until the service has started one.
    pub moment_id: Option<String>,
    pub transcript: Vec<Message>,
    pub state: HandleState,
}

impl MomentHandle {
    fn unstarted() -> Self {
        Self {
            handle_id: Uuid::now_v7(),
            moment_id: None,
            transcript: Vec::new(),
            state: HandleState::Unstarted,
        }
    }

    fn active(moment_id: Option<String>, transcript: Vec<Message>) -> Self {
        Self {
            handle_id: Uuid::now_v7(),
            moment_id,
            transcript,
            state: HandleState::Active,
        }
    }
}

/// Errors surfaced to the caller of a conversation action.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot {action} while the moment is {state:?}")]
    InvalidState {
        action: &'static str,
        state: HandleState,
    },

    #[error("message must not be empty")]
    EmptyMessage,

    #[error("speech was not recognized: {0}")]
    EmptyTranscription(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Result of a successful send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentMessage {
    pub reply: String,
    pub emotion: Emotion,
    pub audio_path: Option<String>,
    /// The handle was replaced before the reply arrived; the transcript was left alone.
    pub stale: bool,
}

struct ControllerState {
    handle: MomentHandle,
    emotion: Emotion,
    /// Shown instead of the transcript tail while sends are in flight.
    pending_display: Option<Message>,
    in_flight: usize,
    last_audio: Option<String>,
}

impl ControllerState {
    fn fresh() -> Self {
        Self {
            handle: MomentHandle::unstarted(),
            emotion: Emotion::Neutral,
            pending_display: None,
            in_flight: 0,
            last_audio: None,
        }
    }

    fn replace_handle(&mut self, handle: MomentHandle) {
        self.handle = handle;
        self.emotion = Emotion::Neutral;
        self.pending_display = None;
        self.in_flight = 0;
        self.last_audio = None;
    }

    fn finish_send(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.pending_display = None;
        }
    }
}

/// Owns the active moment and talks to the companion service on its behalf.
#[derive(Clone)]
pub struct MomentController {
    service: Arc<dyn CompanionService>,
    state: Arc<Mutex<ControllerState>>,
    /// Held while a send starts the remote moment, so concurrent sends start it once.
    start_lock: Arc<tokio::sync::Mutex<()>>,
    fallback_greeting: Arc<str>,
}

impl MomentController {
    pub fn new(service: Arc<dyn CompanionService>, fallback_greeting: impl Into<Arc<str>>) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(ControllerState::fresh())),
            start_lock: Arc::new(tokio::sync::Mutex::new(())),
            fallback_greeting: fallback_greeting.into(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A copy of the current handle.
    pub fn handle(&self) -> MomentHandle {
        self.lock().handle.clone()
    }

    pub fn state(&self) -> HandleState {
        self.lock().handle.state
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.lock().handle.transcript.clone()
    }

    pub fn has_active_transcript(&self) -> bool {
        !self.lock().handle.transcript.is_empty()
    }

    /// Whether a moment is running (active or being archived).
    pub fn has_live_moment(&self) -> bool {
        matches!(
            self.lock().handle.state,
            HandleState::Active | HandleState::Archiving
        )
    }

    pub fn emotion(&self) -> Emotion {
        self.lock().emotion
    }

    /// Audio for the most recent reply, if the service produced one.
    pub fn last_audio(&self) -> Option<String> {
        self.lock().last_audio.clone()
    }

    /// The line to display: the pending user message while a send is in flight,
    /// otherwise the last transcript entry.
    pub fn display_line(&self) -> Option<Message> {
        let state = self.lock();
        state
            .pending_display
            .clone()
            .or_else(|| state.handle.transcript.last().cloned())
    }

    /// Drop the current handle and start over from `Unstarted`.
    pub fn reset(&self) {
        tracing::debug!("resetting moment handle");
        self.lock().replace_handle(MomentHandle::unstarted());
    }

    /// Start a new moment and install it as the current handle.
    ///
    /// Never fails: if the service is unreachable the handle still becomes active,
    /// seeded with the fallback greeting and the error text.
    pub async fn start_session(&self, user_id: &UserId) -> MomentHandle {
        let handle = match self.service.start_moment(user_id).await {
            Ok(started) => {
                let greeting = [started.greeting.trim(), started.message.trim()]
                    .into_iter()
                    .find(|s| !s.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| self.fallback_greeting.to_string());
                tracing::info!(user = %user_id, moment_id = %started.moment_id, "moment started");
                let moment_id = Some(started.moment_id).filter(|id| !id.is_empty());
                MomentHandle::active(moment_id, vec![Message::assistant(greeting)])
            }
            Err(e) => {
                tracing::warn!(user = %user_id, error = %e, "failed to start moment, using fallback greeting");
                MomentHandle::active(
                    None,
                    vec![
                        Message::assistant(self.fallback_greeting.to_string()),
                        Message::assistant(format!("Connection failed: {e}")),
                    ],
                )
            }
        };

        self.lock().replace_handle(handle.clone());
        handle
    }

    /// Send a user message.
    ///
    /// The message is appended before the request goes out and stays in the
    /// transcript whether or not the request succeeds.
    pub async fn send_message(
        &self,
        user_id: &UserId,
        text: &str,
    ) -> Result<SentMessage, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let (handle_id, history, needs_start) = {
            let mut state = self.lock();
            if state.handle.state != HandleState::Active {
                return Err(SessionError::InvalidState {
                    action: "send a message",
                    state: state.handle.state,
                });
            }
            let message = Message::user(text);
            state.handle.transcript.push(message.clone());
            state.pending_display = Some(message);
            state.in_flight += 1;
            (
                state.handle.handle_id,
                state.handle.transcript.clone(),
                state.handle.moment_id.is_none(),
            )
        };

        if needs_start {
            if let Err(e) = self.ensure_moment(user_id, handle_id).await {
                tracing::warn!(user = %user_id, error = %e, "failed to start moment before send");
                let mut state = self.lock();
                if state.handle.handle_id == handle_id {
                    state.finish_send();
                }
                return Err(e.into());
            }
        }

        tracing::debug!(user = %user_id, history = history.len(), "sending chat message");
        let result = self.service.send_chat(user_id, text, &history).await;

        let mut state = self.lock();
        let current = state.handle.handle_id == handle_id
            && state.handle.state != HandleState::Discarded;
        if current {
            state.finish_send();
        }

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(user = %user_id, error = %e, "chat request failed");
                return Err(e.into());
            }
        };

        let emotion = Emotion::normalize(&reply.emotion);
        if !current {
            tracing::debug!(user = %user_id, "dropping reply for a replaced moment");
            return Ok(SentMessage {
                reply: reply.reply,
                emotion,
                audio_path: reply.audio_path,
                stale: true,
            });
        }

        state.handle.transcript.push(Message::assistant(reply.reply.clone()));
        state.emotion = emotion;
        state.last_audio = reply.audio_path.clone();
        if let Some(moment_id) = reply.moment_id.filter(|id| !id.is_empty()) {
            state.handle.moment_id = Some(moment_id);
        }

        Ok(SentMessage {
            reply: reply.reply,
            emotion,
            audio_path: reply.audio_path,
            stale: false,
        })
    }

    /// Start the remote moment for `handle_id` unless another send already did.
    /// The greeting is already shown; only the moment id is needed.
    async fn ensure_moment(&self, user_id: &UserId, handle_id: Uuid) -> ServiceResult<()> {
        let _starting = self.start_lock.lock().await;
        {
            let state = self.lock();
            if state.handle.handle_id != handle_id || state.handle.moment_id.is_some() {
                return Ok(());
            }
        }

        let started = self.service.start_moment(user_id).await?;
        let mut state = self.lock();
        if state.handle.handle_id == handle_id && state.handle.moment_id.is_none() {
            state.handle.moment_id = Some(started.moment_id);
        }
        Ok(())
    }

    /// Transcribe a recorded clip and send the recognized text.
    ///
    /// Nothing is appended if recognition fails or comes back blank.
    pub async fn send_voice(
        &self,
        user_id: &UserId,
        audio: Vec<u8>,
        file_name: &str,
    ) -> Result<SentMessage, SessionError> {
        let transcription = self.service.transcribe(audio, file_name).await?;
        let text = transcription.text.trim();
        if !transcription.success || text.is_empty() {
            let reason = transcription
                .message
                .unwrap_or_else(|| "empty recognition result".into());
            return Err(SessionError::EmptyTranscription(reason));
        }
        tracing::info!(chars = text.len(), "speech recognized");
        self.send_message(user_id, text).await
    }

    /// Crystallize the current moment into a card, then begin a fresh one.
    ///
    /// On failure the handle returns to `Active` so the archive can be retried. If the
    /// handle was replaced while the save was in flight, the card is still returned
    /// but the replacement is left alone.
    pub async fn archive(&self, user_id: &UserId) -> Option<MomentCard> {
        let handle_id = {
            let mut state = self.lock();
            if state.handle.state != HandleState::Active {
                tracing::warn!(state = ?state.handle.state, "archive requested with no active moment");
                return None;
            }
            state.handle.state = HandleState::Archiving;
            state.handle.handle_id
        };

        match self.service.save_moment(user_id).await {
            Ok(card) => {
                tracing::info!(user = %user_id, moment_id = %card.moment_id, title = %card.title, "moment crystallized");
                let current = {
                    let mut state = self.lock();
                    let current = state.handle.handle_id == handle_id
                        && state.handle.state == HandleState::Archiving;
                    if current {
                        state.handle.state = HandleState::Discarded;
                    }
                    current
                };
                if current {
                    self.start_session(user_id).await;
                } else {
                    tracing::debug!(user = %user_id, "moment replaced during save, not restarting");
                }
                Some(card)
            }
            Err(e) => {
                tracing::warn!(user = %user_id, error = %e, "failed to save moment");
                let mut state = self.lock();
                if state.handle.handle_id == handle_id
                    && state.handle.state == HandleState::Archiving
                {
                    state.handle.state = HandleState::Active;
                }
                None
            }
        }
    }

    /// Let the current moment fade without saving it, then begin a fresh one.
    ///
    /// Rejected while the moment is being archived.
    pub async fn fade(&self, user_id: &UserId) -> Result<MomentHandle, SessionError> {
        {
            let mut state = self.lock();
            if state.handle.state == HandleState::Archiving {
                return Err(SessionError::InvalidState {
                    action: "fade the moment",
                    state: HandleState::Archiving,
                });
            }
            tracing::info!(user = %user_id, lines = state.handle.transcript.len(), "moment faded");
            state.handle.state = HandleState::Discarded;
        }
        Ok(self.start_session(user_id).await)
    }

    /// Begin a new moment on request, without saving the current one.
    ///
    /// Rejected while the moment is being archived; the archive starts the next
    /// moment itself.
    pub async fn restart(&self, user_id: &UserId) -> Result<MomentHandle, SessionError> {
        let state = self.state();
        if state == HandleState::Archiving {
            return Err(SessionError::InvalidState {
                action: "start a new moment",
                state,
            });
        }
        Ok(self.start_session(user_id).await)
    }

    /// Archived moments, newest first.
    pub async fn moments(&self, user_id: &UserId) -> ServiceResult<Vec<MomentSummary>> {
        self.service.list_moments(user_id).await
    }
}
