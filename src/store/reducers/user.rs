use crate::store::events::UserEvent;
use crate::store::state::UserState;

pub fn reduce(state: &UserState, event: &UserEvent) -> UserState {
    match event {
        UserEvent::Started => UserState {
            loading: true,
            error: None,
            ..state.clone()
        },
        UserEvent::Failed { message } => UserState {
            loading: false,
            error: Some(message.clone()),
            ..state.clone()
        },
        UserEvent::Settled => UserState {
            loading: false,
            ..state.clone()
        },
        UserEvent::ProfileLoaded { user } => UserState {
            profile: Some(user.clone()),
            loading: false,
            error: None,
            ..state.clone()
        },
        UserEvent::SearchResults { query, users } => UserState {
            search_query: query.clone(),
            search_results: users.clone(),
            loading: false,
            error: None,
            ..state.clone()
        },
        UserEvent::Cleared => UserState::default(),
    }
}
