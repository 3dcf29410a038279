//! Session scoping and view-mode reconciliation.

pub mod flags;
pub mod reconcile;

pub use flags::SessionFlags;
pub use reconcile::{Reconciler, Reconciliation, TranscriptDirective, ViewMode};
