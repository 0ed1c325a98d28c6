use crate::store::events::AuthEvent;
use crate::store::state::AuthState;

pub fn reduce(state: &AuthState, event: &AuthEvent) -> AuthState {
    match event {
        AuthEvent::Started => AuthState {
            loading: true,
            error: None,
            ..state.clone()
        },
        AuthEvent::Failed { message } => AuthState {
            loading: false,
            error: Some(message.clone()),
            ..state.clone()
        },
        AuthEvent::Settled => AuthState {
            loading: false,
            ..state.clone()
        },
        AuthEvent::LoggedIn { user, tokens } => AuthState {
            is_authenticated: true,
            user: Some(user.clone()),
            tokens: Some(tokens.clone()),
            loading: false,
            error: None,
        },
        AuthEvent::Restored { user, tokens } => AuthState {
            is_authenticated: true,
            user: user.clone(),
            tokens: Some(tokens.clone()),
            loading: false,
            error: None,
        },
        AuthEvent::UserRefreshed { user } => AuthState {
            user: Some(user.clone()),
            ..state.clone()
        },
        // A rotation racing a logout must not resurrect the session.
        AuthEvent::TokensRotated { tokens } if state.is_authenticated => AuthState {
            tokens: Some(tokens.clone()),
            ..state.clone()
        },
        AuthEvent::TokensRotated { .. } => state.clone(),
        AuthEvent::LoggedOut => AuthState::default(),
    }
}
