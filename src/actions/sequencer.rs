//! Ordering of concurrent status changes on the same task.
//!
//! The most recently initiated change wins: responses to older calls are
//! ignored, and only the latest call may roll the task back, to the last
//! status the server confirmed.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{TaskId, TaskStatus};

/// Handed out when a status change starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTicket {
    pub task_id: TaskId,
    seq: u64,
}

#[derive(Debug)]
struct Pending {
    latest: u64,
    /// Last status known to be on the server.
    confirmed: Option<TaskStatus>,
}

#[derive(Debug, Default)]
pub struct StatusSequencer {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_seq: u64,
    pending: HashMap<TaskId, Pending>,
}

impl StatusSequencer {
    /// Register a new change. `current` is the status shown before it.
    pub fn begin(&self, task_id: TaskId, current: Option<TaskStatus>) -> StatusTicket {
        let mut inner = self.lock();
        inner.next_seq += 1;
        let seq = inner.next_seq;

        inner
            .pending
            .entry(task_id)
            .and_modify(|p| p.latest = seq)
            .or_insert(Pending {
                latest: seq,
                confirmed: current,
            });

        StatusTicket { task_id, seq }
    }

    /// Whether no newer change on the same task was started after `ticket`.
    pub fn is_latest(&self, ticket: &StatusTicket) -> bool {
        self.lock()
            .pending
            .get(&ticket.task_id)
            .is_some_and(|p| p.latest == ticket.seq)
    }

    /// Record a status the server accepted, whichever call it came from.
    pub fn confirm(&self, ticket: &StatusTicket, status: TaskStatus) {
        if let Some(p) = self.lock().pending.get_mut(&ticket.task_id) {
            p.confirmed = Some(status);
        }
    }

    /// Status to restore if the latest call fails.
    pub fn rollback_target(&self, ticket: &StatusTicket) -> Option<TaskStatus> {
        self.lock()
            .pending
            .get(&ticket.task_id)
            .and_then(|p| p.confirmed)
    }

    /// Forget the task once its latest call has finished.
    pub fn finish(&self, ticket: &StatusTicket) {
        let mut inner = self.lock();
        if inner
            .pending
            .get(&ticket.task_id)
            .is_some_and(|p| p.latest == ticket.seq)
        {
            inner.pending.remove(&ticket.task_id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Nothing panics while the lock is held; recover the data regardless.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let seq = StatusSequencer::default();
        let first = seq.begin(1, Some(TaskStatus::AFaire));
        let second = seq.begin(1, Some(TaskStatus::EnCours));

        assert!(!seq.is_latest(&first));
        assert!(seq.is_latest(&second));
    }

    #[test]
    fn test_tasks_are_sequenced_independently() {
        let seq = StatusSequencer::default();
        let a = seq.begin(1, None);
        let b = seq.begin(2, None);
        assert!(seq.is_latest(&a));
        assert!(seq.is_latest(&b));
    }

    #[test]
    fn test_rollback_targets_last_confirmed_status() {
        let seq = StatusSequencer::default();
        let first = seq.begin(1, Some(TaskStatus::AFaire));
        let second = seq.begin(1, Some(TaskStatus::EnCours));

        // Without confirmation the status before the first change is restored.
        assert_eq!(seq.rollback_target(&second), Some(TaskStatus::AFaire));

        seq.confirm(&first, TaskStatus::EnCours);
        assert_eq!(seq.rollback_target(&second), Some(TaskStatus::EnCours));
    }

    #[test]
    fn test_finish_only_clears_for_latest() {
        let seq = StatusSequencer::default();
        let first = seq.begin(1, Some(TaskStatus::AFaire));
        let second = seq.begin(1, Some(TaskStatus::EnCours));

        seq.finish(&first);
        assert!(seq.is_latest(&second));

        seq.finish(&second);
        assert!(!seq.is_latest(&second));
        assert_eq!(seq.rollback_target(&second), None);
    }
}
