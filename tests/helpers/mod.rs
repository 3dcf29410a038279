#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use moment_catcher::companion::Companion;
use moment_catcher::config::SessionConfig;
use moment_catcher::identity::{UserId, UserIdentity};
use moment_catcher::moment::Message;
use moment_catcher::preferences::{MemoryBackend, PreferenceStore};
use moment_catcher::service::{
    ChatReply, CompanionService, Health, MomentCard, MomentSummary, RenameOutcome, ServiceError,
    ServiceResult, StartedMoment, Transcription,
};

pub const FALLBACK: &str = "I'm here. What's on your mind?";

/// Companion service with scripted answers.
///
/// Chat replies echo the message (`"re: <text>"`) unless a gate is registered for
/// that text, in which case the reply is whatever the test sends through the gate.
#[derive(Default)]
pub struct ScriptedService {
    start_failures: Mutex<usize>,
    start_gate: Mutex<Option<oneshot::Receiver<()>>>,
    starts: Mutex<u32>,
    greeting: Mutex<Option<String>>,
    chat_gates: Mutex<HashMap<String, oneshot::Receiver<ChatReply>>>,
    chat_failures: Mutex<HashSet<String>>,
    chat_calls: Mutex<Vec<(String, Vec<Message>)>>,
    save_failures: Mutex<usize>,
    save_gate: Mutex<Option<oneshot::Receiver<()>>>,
    saves: Mutex<u32>,
    transcription: Mutex<Option<Transcription>>,
    rename_fails: Mutex<bool>,
}

pub fn failure(operation: &'static str) -> ServiceError {
    ServiceError::Status {
        operation,
        status: 500,
        body: "scripted failure".into(),
    }
}

pub fn reply(text: &str, emotion: &str) -> ChatReply {
    ChatReply {
        reply: text.to_string(),
        emotion: emotion.to_string(),
        audio_path: None,
        moment_id: None,
        message_count: 0,
    }
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next_starts(&self, n: usize) {
        *self.start_failures.lock().unwrap() = n;
    }

    /// Hold the next `start_moment` until the returned sender fires.
    pub fn gate_start(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.start_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn set_greeting(&self, greeting: &str) {
        *self.greeting.lock().unwrap() = Some(greeting.to_string());
    }

    /// Hold the reply to `text` until the returned sender fires.
    pub fn gate_chat(&self, text: &str) -> oneshot::Sender<ChatReply> {
        let (tx, rx) = oneshot::channel();
        self.chat_gates.lock().unwrap().insert(text.to_string(), rx);
        tx
    }

    pub fn fail_chat(&self, text: &str) {
        self.chat_failures.lock().unwrap().insert(text.to_string());
    }

    pub fn fail_next_saves(&self, n: usize) {
        *self.save_failures.lock().unwrap() = n;
    }

    /// Hold the next `save_moment` until the returned sender fires.
    pub fn gate_save(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.save_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn set_transcription(&self, transcription: Transcription) {
        *self.transcription.lock().unwrap() = Some(transcription);
    }

    pub fn fail_renames(&self) {
        *self.rename_fails.lock().unwrap() = true;
    }

    pub fn starts(&self) -> u32 {
        *self.starts.lock().unwrap()
    }

    pub fn saves(&self) -> u32 {
        *self.saves.lock().unwrap()
    }

    pub fn chat_calls(&self) -> Vec<(String, Vec<Message>)> {
        self.chat_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompanionService for ScriptedService {
    async fn start_moment(&self, user_id: &UserId) -> ServiceResult<StartedMoment> {
        let gate = self.start_gate.lock().unwrap().take();
        if let Some(rx) = gate {
            rx.await.map_err(|_| failure("start moment"))?;
        }
        {
            let mut failures = self.start_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(failure("start moment"));
            }
        }
        let n = {
            let mut starts = self.starts.lock().unwrap();
            *starts += 1;
            *starts
        };
        let greeting = self
            .greeting
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| format!("Welcome back, {user_id}"));
        Ok(StartedMoment {
            moment_id: format!("m-{n}"),
            greeting,
            message: "started".into(),
        })
    }

    async fn send_chat(
        &self,
        _user_id: &UserId,
        text: &str,
        history: &[Message],
    ) -> ServiceResult<ChatReply> {
        self.chat_calls
            .lock()
            .unwrap()
            .push((text.to_string(), history.to_vec()));
        if self.chat_failures.lock().unwrap().contains(text) {
            return Err(failure("chat"));
        }
        let gate = self.chat_gates.lock().unwrap().remove(text);
        match gate {
            Some(rx) => rx.await.map_err(|_| failure("chat")),
            None => Ok(reply(&format!("re: {text}"), "joy")),
        }
    }

    async fn save_moment(&self, _user_id: &UserId) -> ServiceResult<MomentCard> {
        let gate = self.save_gate.lock().unwrap().take();
        if let Some(rx) = gate {
            rx.await.map_err(|_| failure("save moment"))?;
        }
        {
            let mut failures = self.save_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(failure("save moment"));
            }
        }
        let n = {
            let mut saves = self.saves.lock().unwrap();
            *saves += 1;
            *saves
        };
        Ok(MomentCard {
            moment_id: format!("saved-{n}"),
            timestamp: "2026-03-01T21:04:00".into(),
            emotion: "平静".into(),
            title: "A quiet evening".into(),
            summary: "We talked about the stars.".into(),
            color: "#87CEEB".into(),
            message_count: 3,
        })
    }

    async fn list_moments(&self, _user_id: &UserId) -> ServiceResult<Vec<MomentSummary>> {
        Ok(Vec::new())
    }

    async fn transcribe(&self, _audio: Vec<u8>, _file_name: &str) -> ServiceResult<Transcription> {
        Ok(self
            .transcription
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_default())
    }

    async fn rename_identity(
        &self,
        _old: &UserId,
        renamed: &UserIdentity,
    ) -> ServiceResult<RenameOutcome> {
        if *self.rename_fails.lock().unwrap() {
            return Err(failure("rename"));
        }
        Ok(RenameOutcome {
            success: true,
            new_user_id: Some(renamed.user_id().to_string()),
            message: None,
        })
    }

    async fn health(&self) -> ServiceResult<Health> {
        Ok(Health {
            status: "ok".into(),
            message: String::new(),
        })
    }
}

/// Store over a fresh in-memory backend. The backend clone can reopen the same data.
pub fn memory_store() -> (PreferenceStore, MemoryBackend) {
    let backend = MemoryBackend::new();
    (PreferenceStore::open(Box::new(backend.clone())), backend)
}

/// Session settings with no transition delay.
pub fn instant_session() -> SessionConfig {
    SessionConfig {
        transition_delay_ms: 0,
        fallback_greeting: FALLBACK.into(),
    }
}

pub fn companion_for(
    traveler: &str,
    companion: &str,
    store: PreferenceStore,
    service: Arc<ScriptedService>,
) -> Companion {
    let identity = UserIdentity::new(traveler, companion).unwrap();
    Companion::new(identity, store, service, &instant_session())
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
