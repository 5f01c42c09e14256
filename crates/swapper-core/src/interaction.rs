//! Pending private-chat actions, one per user.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// What the bot expects next from a user in a private chat.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum UserState {
    /// Nothing pending.
    #[default]
    Idle,
    /// `/add <word>` was issued; the next media binds to `word`.
    AwaitingMediaForWord(String),
    /// `/remove` was issued; the next media is unbound.
    AwaitingMediaForRemoval,
    /// `/clear` was issued; waiting for "confirm".
    AwaitingClearConfirmation,
}

/// State map keyed by user id. Users without an entry are [`UserState::Idle`].
#[derive(Debug, Default)]
pub struct InteractionStates {
    states: RwLock<HashMap<i64, UserState>>,
}

impl InteractionStates {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `user_id`.
    #[must_use]
    pub fn get(&self, user_id: i64) -> UserState {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Set the pending state of `user_id`; `Idle` removes the entry.
    pub fn set(&self, user_id: i64, state: UserState) {
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        if state == UserState::Idle {
            states.remove(&user_id);
        } else {
            states.insert(user_id, state);
        }
    }

    /// Consume the pending state, leaving the user `Idle`.
    pub fn take(&self, user_id: i64) -> UserState {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user_id)
            .unwrap_or_default()
    }

    /// Number of users with a pending action.
    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_is_idle() {
        let states = InteractionStates::new();
        assert_eq!(states.get(42), UserState::Idle);
        assert_eq!(states.take(42), UserState::Idle);
    }

    #[test]
    fn take_is_single_shot() {
        let states = InteractionStates::new();
        states.set(1, UserState::AwaitingMediaForWord("meow".to_string()));

        assert_eq!(
            states.take(1),
            UserState::AwaitingMediaForWord("meow".to_string())
        );
        assert_eq!(states.take(1), UserState::Idle);
        assert_eq!(states.pending(), 0);
    }

    #[test]
    fn new_state_replaces_old_one() {
        let states = InteractionStates::new();
        states.set(1, UserState::AwaitingClearConfirmation);
        states.set(1, UserState::AwaitingMediaForRemoval);
        assert_eq!(states.get(1), UserState::AwaitingMediaForRemoval);

        states.set(1, UserState::Idle);
        assert_eq!(states.pending(), 0);
    }
}
