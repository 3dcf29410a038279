//! Transcript and mood types.

use serde::{Deserialize, Serialize};

/// Who spoke a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transcript line. Serializes as `{"role": ..., "content": ...}`, the shape the
/// service expects in chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The companion's displayed mood, normalized from the service's free-form tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Love,
    Surprise,
    #[default]
    Neutral,
    Frustration,
    Embarrassment,
    Shame,
    Awkward,
}

impl Emotion {
    /// Map an English (any case) or Chinese emotion tag onto the closed set.
    /// Unknown and empty tags become [`Emotion::Neutral`].
    pub fn normalize(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "joy" | "开心" | "喜悦" | "兴奋" => Self::Joy,
            "sadness" | "悲伤" | "失落" | "难过" => Self::Sadness,
            "anger" | "生气" | "愤怒" | "激动" => Self::Anger,
            "fear" | "恐惧" | "担心" | "焦虑" => Self::Fear,
            "love" | "爱" | "温暖" | "感动" => Self::Love,
            "surprise" | "惊讶" | "意外" => Self::Surprise,
            "frustration" => Self::Frustration,
            "embarrassment" => Self::Embarrassment,
            "shame" => Self::Shame,
            "awkward" => Self::Awkward,
            _ => Self::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Joy => "Joy",
            Self::Sadness => "Sadness",
            Self::Anger => "Anger",
            Self::Fear => "Fear",
            Self::Love => "Love",
            Self::Surprise => "Surprise",
            Self::Neutral => "Neutral",
            Self::Frustration => "Frustration",
            Self::Embarrassment => "Embarrassment",
            Self::Shame => "Shame",
            Self::Awkward => "Awkward",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_wire_shape() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn emotion_normalization() {
        assert_eq!(Emotion::normalize("JOY"), Emotion::Joy);
        assert_eq!(Emotion::normalize("焦虑"), Emotion::Fear);
        assert_eq!(Emotion::normalize("感动"), Emotion::Love);
        assert_eq!(Emotion::normalize(" awkward "), Emotion::Awkward);
        assert_eq!(Emotion::normalize("平静"), Emotion::Neutral);
        assert_eq!(Emotion::normalize(""), Emotion::Neutral);
        assert_eq!(Emotion::normalize("melancholy"), Emotion::Neutral);
    }
}
