//! Client side of the remote companion service.
//!
//! [`CompanionService`] is the seam the session controller talks through. The HTTP
//! implementation lives in [`http`]; tests substitute scripted implementations.

pub mod http;
pub mod types;

pub use http::HttpCompanionService;
pub use types::{
    ChatReply, Health, MomentCard, MomentSummary, RenameOutcome, StartedMoment, Transcription,
};

use async_trait::async_trait;

use crate::identity::{UserId, UserIdentity};
use crate::moment::Message;

/// Failures talking to the companion service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation} response could not be decoded: {detail}")]
    Decode {
        operation: &'static str,
        detail: String,
    },

    #[error("{operation} was rejected: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    #[error("invalid service URL {url}: {detail}")]
    InvalidUrl { url: String, detail: String },
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Remote operations consumed by the session controller.
///
/// None of these support cancellation; dropping the future only discards interest
/// in the result.
#[async_trait]
pub trait CompanionService: Send + Sync {
    /// Begin a new moment and fetch the companion's greeting.
    async fn start_moment(&self, user_id: &UserId) -> ServiceResult<StartedMoment>;

    /// Send one user message together with the conversation so far.
    async fn send_chat(
        &self,
        user_id: &UserId,
        text: &str,
        history: &[Message],
    ) -> ServiceResult<ChatReply>;

    /// Crystallize the current moment into a card.
    async fn save_moment(&self, user_id: &UserId) -> ServiceResult<MomentCard>;

    /// List archived moments, newest first.
    async fn list_moments(&self, user_id: &UserId) -> ServiceResult<Vec<MomentSummary>>;

    /// Speech-to-text for a recorded clip.
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> ServiceResult<Transcription>;

    /// Move the service's per-user data from `old` to `renamed`.
    async fn rename_identity(
        &self,
        old: &UserId,
        renamed: &UserIdentity,
    ) -> ServiceResult<RenameOutcome>;

    async fn health(&self) -> ServiceResult<Health>;
}

/// Create the HTTP-backed service from config.
pub fn create_service(config: &crate::config::AppConfig) -> ServiceResult<HttpCompanionService> {
    HttpCompanionService::new(&config.service.base_url, config.service.timeout())
}
