//! The preference store proper: get / set / migrate over the persisted document.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::PreferenceBackend;
use crate::identity::UserId;

/// Opaque reference to a selectable background (planet) asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackgroundRef(String);

impl BackgroundRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BackgroundRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for BackgroundRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The persisted document. Session flags are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferenceDocument {
    /// Display-continuity pointer: the background last shown.
    pub selected_background: Option<BackgroundRef>,
    /// One entry per user that has completed the picker.
    pub user_backgrounds: BTreeMap<UserId, BackgroundRef>,
}

/// Per-user background preferences, persisted on every mutation.
pub struct PreferenceStore {
    doc: PreferenceDocument,
    backend: Box<dyn PreferenceBackend>,
}

impl PreferenceStore {
    /// Load the document from `backend`.
    ///
    /// A missing, unreadable, or unparsable document yields an empty store; the
    /// failure is logged, never returned.
    pub fn open(backend: Box<dyn PreferenceBackend>) -> Self {
        let doc = match backend.load() {
            Ok(Some(raw)) => match serde_json::from_str::<PreferenceDocument>(&raw) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(
                        location = %backend.describe(),
                        error = %e,
                        "preference document is corrupt, starting empty"
                    );
                    PreferenceDocument::default()
                }
            },
            Ok(None) => PreferenceDocument::default(),
            Err(e) => {
                tracing::warn!(
                    location = %backend.describe(),
                    error = %e,
                    "failed to read preferences, starting empty"
                );
                PreferenceDocument::default()
            }
        };

        tracing::debug!(
            users = doc.user_backgrounds.len(),
            location = %backend.describe(),
            "preference store opened"
        );
        Self { doc, backend }
    }

    pub fn get(&self, user_id: &UserId) -> Option<&BackgroundRef> {
        self.doc.user_backgrounds.get(user_id)
    }

    /// Upsert `user_id → background` and point the selection at it.
    pub fn set(&mut self, user_id: &UserId, background: BackgroundRef) -> Result<()> {
        self.doc
            .user_backgrounds
            .insert(user_id.clone(), background.clone());
        self.doc.selected_background = Some(background);
        self.persist()
    }

    /// Copy `old`'s preference to `new` when `old` has one and `new` does not.
    ///
    /// The old entry is kept. Returns whether anything was copied.
    pub fn migrate(&mut self, old: &UserId, new: &UserId) -> Result<bool> {
        if old == new || self.doc.user_backgrounds.contains_key(new) {
            return Ok(false);
        }
        let Some(background) = self.doc.user_backgrounds.get(old).cloned() else {
            return Ok(false);
        };

        tracing::info!(from = %old, to = %new, background = %background, "migrating background");
        self.doc
            .user_backgrounds
            .insert(new.clone(), background.clone());
        self.doc.selected_background = Some(background);
        self.persist()?;
        Ok(true)
    }

    /// The background last selected or restored, for display continuity.
    pub fn selected(&self) -> Option<&BackgroundRef> {
        self.doc.selected_background.as_ref()
    }

    /// Point the selection at `user_id`'s preference (or at nothing).
    pub fn focus(&mut self, user_id: &UserId) -> Result<()> {
        let background = self.doc.user_backgrounds.get(user_id).cloned();
        if self.doc.selected_background == background {
            return Ok(());
        }
        self.doc.selected_background = background;
        self.persist()
    }

    /// Remove one user's entry. Returns the removed reference, if any.
    pub fn clear(&mut self, user_id: &UserId) -> Result<Option<BackgroundRef>> {
        let removed = self.doc.user_backgrounds.remove(user_id);
        if removed.is_some() {
            self.doc.selected_background = None;
            self.persist()?;
        }
        Ok(removed)
    }

    /// Known user ids, sorted.
    pub fn users(&self) -> impl Iterator<Item = &UserId> {
        self.doc.user_backgrounds.keys()
    }

    pub fn document(&self) -> &PreferenceDocument {
        &self.doc
    }

    pub fn location(&self) -> String {
        self.backend.describe()
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.doc)
            .context("failed to serialize preference document")?;
        self.backend
            .save(&json)
            .with_context(|| format!("failed to persist preferences to {}", self.backend.describe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryBackend;

    fn store() -> (PreferenceStore, MemoryBackend) {
        let backend = MemoryBackend::new();
        (PreferenceStore::open(Box::new(backend.clone())), backend)
    }

    #[test]
    fn set_then_get() {
        let (mut store, _) = store();
        let user = UserId::from("alice_tars");
        assert!(store.get(&user).is_none());

        store.set(&user, "planet-3".into()).unwrap();
        assert_eq!(store.get(&user), Some(&BackgroundRef::from("planet-3")));
        assert_eq!(store.selected(), Some(&BackgroundRef::from("planet-3")));
    }

    #[test]
    fn document_uses_camel_case_keys() {
        let (mut store, backend) = store();
        store.set(&UserId::from("alice_tars"), "planet-1".into()).unwrap();

        let raw = backend.contents().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["selectedBackground"], "planet-1");
        assert_eq!(value["userBackgrounds"]["alice_tars"], "planet-1");
        assert!(value.get("sessionChoiceMade").is_none());
    }

    #[test]
    fn migrate_does_not_overwrite_existing() {
        let (mut store, _) = store();
        let old = UserId::from("alice_tars");
        let new = UserId::from("alicia_tars");
        store.set(&old, "planet-1".into()).unwrap();
        store.set(&new, "planet-2".into()).unwrap();

        assert!(!store.migrate(&old, &new).unwrap());
        assert_eq!(store.get(&new), Some(&BackgroundRef::from("planet-2")));
    }

    #[test]
    fn migrate_without_source_is_noop() {
        let (mut store, backend) = store();
        assert!(!store
            .migrate(&UserId::from("nobody_x"), &UserId::from("someone_x"))
            .unwrap());
        assert!(backend.contents().is_none(), "no-op migrate must not write");
    }

    #[test]
    fn focus_follows_user() {
        let (mut store, _) = store();
        let alice = UserId::from("alice_tars");
        let bob = UserId::from("bob_kay");
        store.set(&alice, "planet-1".into()).unwrap();

        store.focus(&bob).unwrap();
        assert!(store.selected().is_none());
        store.focus(&alice).unwrap();
        assert_eq!(store.selected(), Some(&BackgroundRef::from("planet-1")));
    }

    #[test]
    fn clear_removes_entry() {
        let (mut store, _) = store();
        let alice = UserId::from("alice_tars");
        store.set(&alice, "planet-1".into()).unwrap();

        assert_eq!(store.clear(&alice).unwrap(), Some(BackgroundRef::from("planet-1")));
        assert!(store.get(&alice).is_none());
        assert!(store.selected().is_none());
        assert_eq!(store.users().count(), 0);
    }
}
