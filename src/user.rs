//! User entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::store::TaskStore;
use crate::task::Task;

/// A person who can own projects and be assigned tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    /// Back-index of tasks assigned to this user, in assignment order.
    ///
    /// Not owned: `Task::assigned_to` is authoritative. Entries can be stale
    /// after a re-assignment or a task deletion.
    pub tasks: Vec<TaskId>,
}

impl User {
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        User {
            id,
            name: name.into(),
            email: email.into(),
            created_at: now,
            tasks: Vec::new(),
        }
    }

    /// Resolve the back-index, skipping ids that no longer exist.
    pub fn resolve_tasks<'a>(&self, tasks: &'a TaskStore) -> Vec<&'a Task> {
        self.tasks.iter().filter_map(|id| tasks.get(*id)).collect()
    }

    /// Tasks whose status is anything but DONE.
    pub fn active_tasks<'a>(&self, tasks: &'a TaskStore) -> Vec<&'a Task> {
        self.resolve_tasks(tasks)
            .into_iter()
            .filter(|t| t.status != TaskStatus::Done)
            .collect()
    }

    pub fn completed_tasks<'a>(&self, tasks: &'a TaskStore) -> Vec<&'a Task> {
        self.resolve_tasks(tasks)
            .into_iter()
            .filter(|t| t.status == TaskStatus::Done)
            .collect()
    }

    /// "Name (email)" display form.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_and_completed_split() {
        let now = Utc::now();
        let mut tasks = TaskStore::new();
        let mut alice = User::new(1, "Alice", "alice@example.com", now);
        let a = tasks.create("a", "", Some(&mut alice), TaskPriority::Low).id;
        let b = tasks.create("b", "", Some(&mut alice), TaskPriority::Low).id;
        let c = tasks.create("c", "", Some(&mut alice), TaskPriority::Low).id;
        tasks.update_status(b, TaskStatus::Done);
        tasks.update_status(c, TaskStatus::Cancelled);

        let active: Vec<_> = alice.active_tasks(&tasks).iter().map(|t| t.id).collect();
        let done: Vec<_> = alice.completed_tasks(&tasks).iter().map(|t| t.id).collect();
        assert_eq!(active, vec![a, c]);
        assert_eq!(done, vec![b]);
    }

    #[test]
    fn test_deleted_tasks_are_skipped() {
        let now = Utc::now();
        let mut tasks = TaskStore::new();
        let mut alice = User::new(1, "Alice", "alice@example.com", now);
        let a = tasks.create("a", "", Some(&mut alice), TaskPriority::Low).id;
        tasks.delete(a);
        assert_eq!(alice.tasks, vec![a]);
        assert!(alice.resolve_tasks(&tasks).is_empty());
    }

    #[test]
    fn test_display_name() {
        let u = User::new(1, "Alice", "alice@example.com", Utc::now());
        assert_eq!(u.display_name(), "Alice (alice@example.com)");
    }
}
