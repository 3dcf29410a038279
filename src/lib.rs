//! Companion session core: background reconciliation, moment lifecycle, and a client
//! for the companion chat service.
//!
//! A traveler talks to an AI companion in *moments*: a greeting, a stretch of
//! conversation, and finally either a crystallized summary card or a quiet fade.
//! Before the first moment of a session the traveler picks a background (planet),
//! which is remembered per identity across restarts.
//!
//! # Session model
//!
//! | State | Lifetime | Holder |
//! |-------|----------|--------|
//! | Background per user id | Durable | [`preferences::PreferenceStore`] |
//! | Picker completed / session owner | Process | [`session::SessionFlags`] |
//! | Transcript and moment id | Until archived or faded | [`moment::MomentController`] |
//!
//! Every time the conversation view is entered, [`session::Reconciler`] decides
//! between the picker, the transition, and the main view. A rename mid-session
//! keeps the conversation; a fresh start or an unknown identity goes back to the
//! picker.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`identity`]: Traveler/companion names and the derived user id
//! - [`preferences`]: Durable per-user background store with pluggable backends
//! - [`session`]: Session flags and the view-mode reconciler
//! - [`moment`]: Moment lifecycle, transcript, and mood
//! - [`service`]: Companion service trait and HTTP client
//! - [`companion`]: Facade wiring all of the above for a UI

pub mod companion;
pub mod config;
pub mod identity;
pub mod moment;
pub mod preferences;
pub mod service;
pub mod session;
