//! Moments: one conversation segment with the companion, from greeting to archive.

pub mod controller;
pub mod types;

pub use controller::{HandleState, MomentController, MomentHandle, SentMessage, SessionError};
pub use types::{Emotion, Message, Role};
