//! Traveler/companion identity and the derived user id.
//!
//! The companion service keys every piece of per-user data by a user id built from
//! the two display names. Renaming either name yields a new [`UserId`]; data held
//! under the old id has to be carried across explicitly.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Key under which per-user data (backgrounds, moments) is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The pair of names a session is opened with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// The human side of the conversation.
    pub traveler_name: String,
    /// The AI companion's name.
    pub companion_name: String,
}

impl UserIdentity {
    /// Build an identity from raw input. Names are trimmed and must not be empty.
    pub fn new(traveler_name: &str, companion_name: &str) -> Result<Self> {
        let traveler_name = traveler_name.trim();
        let companion_name = companion_name.trim();
        ensure!(!traveler_name.is_empty(), "traveler name must not be empty");
        ensure!(!companion_name.is_empty(), "companion name must not be empty");
        Ok(Self {
            traveler_name: traveler_name.to_string(),
            companion_name: companion_name.to_string(),
        })
    }

    /// `"{traveler}_{companion}"` with spaces folded to underscores, matching the
    /// id the service derives on rename.
    pub fn user_id(&self) -> UserId {
        UserId(format!("{}_{}", self.traveler_name, self.companion_name).replace(' ', "_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_joins_names() {
        let identity = UserIdentity::new("alice", "tars").unwrap();
        assert_eq!(identity.user_id().as_str(), "alice_tars");
    }

    #[test]
    fn user_id_folds_spaces() {
        let identity = UserIdentity::new("  Mary Ann ", "Kay").unwrap();
        assert_eq!(identity.traveler_name, "Mary Ann");
        assert_eq!(identity.user_id(), UserId::from("Mary_Ann_Kay"));
    }

    #[test]
    fn empty_names_rejected() {
        assert!(UserIdentity::new("", "tars").is_err());
        assert!(UserIdentity::new("alice", "   ").is_err());
    }
}
