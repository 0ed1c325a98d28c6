//! Pure reducers, one per domain slice.
//!
//! `reduce` never mutates its input: slices untouched by an event keep their
//! `Arc` identity so memoized selectors over them stay valid.

mod auth;
mod help;
mod project;
mod task;
mod team;
mod user;

use std::sync::Arc;

use super::events::Event;
use super::state::AppState;

/// Apply one event to the tree.
pub fn reduce(state: &AppState, event: &Event) -> AppState {
    let mut next = state.clone();
    match event {
        Event::Auth(e) => next.auth = Arc::new(auth::reduce(&state.auth, e)),
        Event::Team(e) => next.team = Arc::new(team::reduce(&state.team, e)),
        Event::Project(e) => next.project = Arc::new(project::reduce(&state.project, e)),
        Event::Task(e) => next.task = Arc::new(task::reduce(&state.task, e)),
        Event::User(e) => next.user = Arc::new(user::reduce(&state.user, e)),
        Event::Help(e) => next.help = Arc::new(help::reduce(&state.help, e)),
    }
    next
}

/// Apply a batch of events in order.
pub fn reduce_all(state: &AppState, events: &[Event]) -> AppState {
    events
        .iter()
        .fold(state.clone(), |acc, event| reduce(&acc, event))
}

/// Replace the element with the same key in place, or append it.
pub(crate) fn upsert_by<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) {
    let k = key(&item);
    match items.iter_mut().find(|existing| key(existing) == k) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}
