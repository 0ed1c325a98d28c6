use super::upsert_by;
use crate::models::{HelpRequest, HelpStatus};
use crate::store::events::HelpEvent;
use crate::store::state::HelpState;

pub fn reduce(state: &HelpState, event: &HelpEvent) -> HelpState {
    match event {
        HelpEvent::Started => HelpState {
            loading: true,
            error: None,
            ..state.clone()
        },
        HelpEvent::Failed { message } => HelpState {
            loading: false,
            error: Some(message.clone()),
            ..state.clone()
        },
        HelpEvent::Settled => HelpState {
            loading: false,
            ..state.clone()
        },
        HelpEvent::PendingLoaded {
            project_id,
            requests,
        } => {
            let mut next = settled(state);
            let pending: Vec<HelpRequest> = requests
                .iter()
                .filter(|r| is_pending(r))
                .cloned()
                .collect();
            for request in requests {
                record(&mut next, request.clone());
            }
            next.pending_by_project.insert(*project_id, pending);
            next
        }
        HelpEvent::Requested {
            project_id,
            request,
        } => {
            let mut next = settled(state);
            record(&mut next, request.clone());
            if let Some(project_id) = project_id {
                let pending = next.pending_by_project.entry(*project_id).or_default();
                upsert_by(pending, request.clone(), |r| r.id);
            }
            next
        }
        HelpEvent::Resolved { request } => {
            let mut next = settled(state);
            for pending in next.pending_by_project.values_mut() {
                pending.retain(|r| r.id != request.id);
            }
            record(&mut next, request.clone());
            next
        }
        HelpEvent::Cleared => HelpState::default(),
    }
}

fn settled(state: &HelpState) -> HelpState {
    HelpState {
        loading: false,
        error: None,
        ..state.clone()
    }
}

fn is_pending(request: &HelpRequest) -> bool {
    request.status == HelpStatus::EnAttente && !request.completed
}

fn record(state: &mut HelpState, request: HelpRequest) {
    let requests = state.requests_by_task.entry(request.task_id).or_default();
    upsert_by(requests, request, |r| r.id);
}
