//! Request and response shapes of the companion service.
//!
//! Field names follow the service's snake_case JSON. Optional or late-added fields
//! carry `#[serde(default)]` so older servers still decode.

use serde::{Deserialize, Serialize};

use crate::moment::Message;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UserRequest<'a> {
    pub user_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub user_id: &'a str,
    pub message: &'a str,
    pub history: &'a [Message],
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RenameRequest<'a> {
    pub old_user_id: &'a str,
    pub new_user_name: &'a str,
    pub new_agent_name: &'a str,
}

/// Response to starting a new moment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartedMoment {
    pub moment_id: String,
    /// Companion's opening line. May be empty on older servers.
    #[serde(default)]
    pub greeting: String,
    /// Status text; used as a greeting fallback.
    #[serde(default)]
    pub message: String,
}

/// Response to a chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    /// Free-form emotion tag, normalized by [`crate::moment::Emotion::normalize`].
    #[serde(default)]
    pub emotion: String,
    /// Synthesized speech for the reply, absolute or relative to the service origin.
    #[serde(default)]
    pub audio_path: Option<String>,
    #[serde(default)]
    pub moment_id: Option<String>,
    #[serde(default)]
    pub message_count: u32,
}

/// Summary card produced when a moment is crystallized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentCard {
    pub moment_id: String,
    /// ISO 8601 timestamp.
    pub timestamp: String,
    #[serde(default)]
    pub emotion: String,
    pub title: String,
    /// Short excerpt of the conversation.
    pub summary: String,
    /// Display color, e.g. `"#FFD700"`.
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub message_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SavedMoment {
    pub card: MomentCard,
}

/// One archived moment as listed by the service, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentSummary {
    pub moment_id: String,
    /// ISO 8601 timestamp.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub emotion_tag: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub message_count: u32,
    /// 1 for the oldest moment.
    #[serde(default)]
    pub display_number: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MomentList {
    #[serde(default)]
    pub moments: Vec<MomentSummary>,
}

/// Speech recognition result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub text: String,
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome of renaming an identity on the service side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenameOutcome {
    pub success: bool,
    #[serde(default)]
    pub new_user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Service liveness probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub message: String,
}
