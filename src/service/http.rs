use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::types::{ChatRequest, MomentList, RenameRequest, SavedMoment, UserRequest};
use super::{
    ChatReply, CompanionService, Health, MomentCard, MomentSummary, RenameOutcome, ServiceError,
    ServiceResult, StartedMoment, Transcription,
};
use crate::identity::{UserId, UserIdentity};
use crate::moment::Message;

const MAX_ERROR_BODY_CHARS: usize = 240;

/// [`CompanionService`] over the service's JSON HTTP API.
#[derive(Clone)]
pub struct HttpCompanionService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCompanionService {
    /// `base_url` includes the API prefix, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> ServiceResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| ServiceError::Transport {
            operation: "client setup",
            source,
        })?;

        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ServiceError::InvalidUrl {
            url: base_url.clone(),
            detail: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a reply's `audio_path` to a fetchable URL. Relative paths are served
    /// from the service origin, outside the API prefix.
    pub fn audio_url(&self, audio_path: &str) -> String {
        if audio_path.starts_with("http://") || audio_path.starts_with("https://") {
            return audio_path.to_string();
        }
        let origin = self
            .base_url
            .strip_suffix("/api")
            .unwrap_or(&self.base_url);
        if audio_path.starts_with('/') {
            format!("{origin}{audio_path}")
        } else {
            format!("{origin}/{audio_path}")
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, operation: &'static str, path: &str, body: &B) -> ServiceResult<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(operation, path, "companion service request");
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;
        decode(operation, response).await
    }
}

#[async_trait]
impl CompanionService for HttpCompanionService {
    async fn start_moment(&self, user_id: &UserId) -> ServiceResult<StartedMoment> {
        let request = UserRequest {
            user_id: user_id.as_str(),
        };
        self.post_json("start moment", "moments/start", &request).await
    }

    async fn send_chat(
        &self,
        user_id: &UserId,
        text: &str,
        history: &[Message],
    ) -> ServiceResult<ChatReply> {
        let request = ChatRequest {
            user_id: user_id.as_str(),
            message: text,
            history,
        };
        self.post_json("chat", "chat", &request).await
    }

    async fn save_moment(&self, user_id: &UserId) -> ServiceResult<MomentCard> {
        let request = UserRequest {
            user_id: user_id.as_str(),
        };
        let saved: SavedMoment = self.post_json("save moment", "moments/save", &request).await?;
        Ok(saved.card)
    }

    async fn list_moments(&self, user_id: &UserId) -> ServiceResult<Vec<MomentSummary>> {
        let operation = "list moments";
        let raw = self.endpoint("moments");
        let mut url = Url::parse(&raw).map_err(|e| ServiceError::InvalidUrl {
            url: raw.clone(),
            detail: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("user_id", user_id.as_str());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;
        let list: MomentList = decode(operation, response).await?;
        Ok(list.moments)
    }

    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> ServiceResult<Transcription> {
        let operation = "transcribe";
        let part = Part::bytes(audio).file_name(file_name.to_string());
        let form = Form::new().part("audio_file", part);

        let response = self
            .client
            .post(self.endpoint("asr"))
            .multipart(form)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;
        decode(operation, response).await
    }

    async fn rename_identity(
        &self,
        old: &UserId,
        renamed: &UserIdentity,
    ) -> ServiceResult<RenameOutcome> {
        let operation = "rename";
        let request = RenameRequest {
            old_user_id: old.as_str(),
            new_user_name: &renamed.traveler_name,
            new_agent_name: &renamed.companion_name,
        };
        let outcome: RenameOutcome = self.post_json(operation, "update-names", &request).await?;
        if !outcome.success {
            return Err(ServiceError::Rejected {
                operation,
                message: outcome
                    .message
                    .unwrap_or_else(|| "service reported failure".into()),
            });
        }
        Ok(outcome)
    }

    async fn health(&self) -> ServiceResult<Health> {
        let operation = "health";
        let response = self
            .client
            .get(self.endpoint("health"))
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;
        decode(operation, response).await
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: reqwest::Response,
) -> ServiceResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = sanitize_error_body(&response.text().await.unwrap_or_default());
        return Err(ServiceError::Status {
            operation,
            status: status.as_u16(),
            body,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| ServiceError::Transport { operation, source })?;
    serde_json::from_str(&body).map_err(|e| ServiceError::Decode {
        operation,
        detail: format!("{e}; body: {}", sanitize_error_body(&body)),
    })
}

/// Collapse whitespace and cap length so bodies are safe to log and display.
fn sanitize_error_body(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = collapsed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{truncated}…")
    } else {
        collapsed
    }
}
