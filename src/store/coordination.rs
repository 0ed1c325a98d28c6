//! Cross-domain coordination.
//!
//! When one outcome must update several slices, the events for each domain
//! are built here and dispatched together as one batch. Slices never write
//! each other.

use crate::models::{Tokens, UserSummary};

use super::events::{AuthEvent, Domain, Event, UserEvent};

const USER_SCOPED: [Domain; 5] = [
    Domain::Team,
    Domain::Project,
    Domain::Task,
    Domain::User,
    Domain::Help,
];

/// A user signed in: session plus cached profile.
pub fn session_started(user: UserSummary, tokens: Tokens) -> Vec<Event> {
    vec![
        Event::Auth(AuthEvent::LoggedIn {
            user: user.clone(),
            tokens,
        }),
        Event::User(UserEvent::ProfileLoaded { user }),
    ]
}

/// A session was rebuilt from persistent storage.
pub fn session_restored(user: Option<UserSummary>, tokens: Tokens) -> Vec<Event> {
    let mut events = vec![Event::Auth(AuthEvent::Restored {
        user: user.clone(),
        tokens,
    })];
    if let Some(user) = user {
        events.push(Event::User(UserEvent::ProfileLoaded { user }));
    } else {
        events.push(Event::settled(Domain::User));
    }
    events
}

/// The profile changed: refresh both the profile and the session's user.
pub fn profile_updated(user: UserSummary) -> Vec<Event> {
    vec![
        Event::User(UserEvent::ProfileLoaded { user: user.clone() }),
        Event::Auth(AuthEvent::UserRefreshed { user }),
    ]
}

/// Logout: clear the session and every user-scoped slice.
pub fn session_ended() -> Vec<Event> {
    let mut events = vec![Event::Auth(AuthEvent::LoggedOut)];
    events.extend(USER_SCOPED.iter().map(|d| Event::cleared(*d)));
    events
}

/// A 401 survived the refresh attempt while `domain` was loading.
///
/// The failing domain's error is applied after the reset so it stays visible.
pub fn session_expired(domain: Domain, message: impl Into<String>) -> Vec<Event> {
    let mut events = session_ended();
    events.push(Event::failed(domain, message));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::reducers::reduce_all;
    use crate::store::state::AppState;

    fn user() -> UserSummary {
        UserSummary {
            id: 3,
            email: "salma@example.com".to_string(),
            username: "salma".to_string(),
            first_name: "Salma".to_string(),
            last_name: "Tazi".to_string(),
            avatar_url: None,
        }
    }

    fn tokens() -> Tokens {
        Tokens {
            access: "a".to_string(),
            refresh: "r".to_string(),
        }
    }

    #[test]
    fn test_profile_update_reaches_both_slices() {
        let state = reduce_all(&AppState::default(), &session_started(user(), tokens()));
        let mut renamed = user();
        renamed.first_name = "Salma-Z".to_string();

        let state = reduce_all(&state, &profile_updated(renamed.clone()));
        assert_eq!(state.auth.user.as_ref(), Some(&renamed));
        assert_eq!(state.user.profile.as_ref(), Some(&renamed));
    }

    #[test]
    fn test_session_expired_clears_and_reports() {
        let state = reduce_all(&AppState::default(), &session_started(user(), tokens()));
        let state = reduce_all(
            &state,
            &session_expired(Domain::Task, "Your session has expired"),
        );

        assert!(!state.auth.is_authenticated);
        assert!(state.auth.tokens.is_none());
        assert!(state.user.profile.is_none());
        assert_eq!(state.task.error.as_deref(), Some("Your session has expired"));
    }
}
