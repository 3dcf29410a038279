use crate::identity::UserId;

/// Per-process session markers. Never persisted: every process start begins with
/// no owner and no choice made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFlags {
    choice_made: bool,
    owner: Option<UserId>,
}

impl SessionFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the picker flow has completed during this process lifetime.
    pub fn choice_made(&self) -> bool {
        self.choice_made
    }

    /// The user this session last bound to; `None` on a fresh start.
    pub fn owner(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }

    pub fn bind(&mut self, user_id: UserId) {
        self.owner = Some(user_id);
    }

    pub fn mark_choice_made(&mut self) {
        self.choice_made = true;
    }

    /// Bind to `user_id` and forget any earlier picker completion.
    pub fn reset_for(&mut self, user_id: UserId) {
        self.owner = Some(user_id);
        self.choice_made = false;
    }
}
