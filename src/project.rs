//! Project entity: ownership, membership and task association.
//!
//! Members and tasks are held as ids. The owner is always the first member
//! and cannot be removed; task ids are appended without de-duplication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::store::TaskStore;
use crate::task::Task;

/// A named collection of tasks with an owner and a member list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub owner: UserId,
    pub members: Vec<UserId>,
    pub tasks: Vec<TaskId>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create a project whose only member is its owner.
    pub fn new(
        id: ProjectId,
        name: impl Into<String>,
        description: impl Into<String>,
        owner: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Project {
            id,
            name: name.into(),
            description: description.into(),
            owner,
            members: vec![owner],
            tasks: Vec::new(),
            created_at: now,
        }
    }

    /// Append a task id. Calling twice with the same id stores it twice.
    pub fn add_task(&mut self, task: TaskId) {
        self.tasks.push(task);
    }

    /// Add a member unless already present. Returns whether it was added.
    pub fn add_member(&mut self, user: UserId) -> bool {
        if self.members.contains(&user) {
            return false;
        }
        self.members.push(user);
        true
    }

    /// Remove a member. The owner is never removed.
    pub fn remove_member(&mut self, user: UserId) -> bool {
        if user == self.owner {
            return false;
        }
        let before = self.members.len();
        self.members.retain(|m| *m != user);
        self.members.len() != before
    }

    pub fn is_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }

    /// Resolve the task list in order, skipping ids that were deleted.
    pub fn resolve_tasks<'a>(&self, tasks: &'a TaskStore) -> Vec<&'a Task> {
        self.tasks.iter().filter_map(|id| tasks.get(*id)).collect()
    }

    pub fn tasks_by_status<'a>(&self, tasks: &'a TaskStore, status: TaskStatus) -> Vec<&'a Task> {
        self.resolve_tasks(tasks)
            .into_iter()
            .filter(|t| t.status == status)
            .collect()
    }

    /// Percentage of resolved tasks that are DONE; exactly 0.0 with no tasks.
    pub fn progress(&self, tasks: &TaskStore) -> f64 {
        let resolved = self.resolve_tasks(tasks);
        if resolved.is_empty() {
            return 0.0;
        }
        let done = resolved.iter().filter(|t| t.status == TaskStatus::Done).count();
        (done as f64 / resolved.len() as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::new(1, "Sprint1", "", 2, Utc::now())
    }

    #[test]
    fn test_owner_is_first_member() {
        let p = project();
        assert_eq!(p.members, vec![2]);
        assert!(p.is_member(2));
    }

    #[test]
    fn test_member_set_semantics() {
        let mut p = project();
        assert!(p.add_member(5));
        assert!(!p.add_member(5));
        assert!(!p.add_member(2));
        assert_eq!(p.members, vec![2, 5]);
    }

    #[test]
    fn test_owner_cannot_be_removed() {
        let mut p = project();
        p.add_member(5);
        assert!(!p.remove_member(2));
        assert!(p.remove_member(5));
        assert!(!p.remove_member(5));
        assert_eq!(p.members, vec![2]);
    }

    #[test]
    fn test_progress() {
        let mut tasks = TaskStore::new();
        let mut p = project();
        assert_eq!(p.progress(&tasks), 0.0);

        let ids: Vec<_> = (0..4)
            .map(|i| tasks.create(format!("t{i}"), "", None, TaskPriority::Medium).id)
            .collect();
        for id in &ids {
            p.add_task(*id);
        }
        assert_eq!(p.progress(&tasks), 0.0);
        tasks.update_status(ids[0], TaskStatus::Done);
        assert!((p.progress(&tasks) - 25.0).abs() < 1e-9);
        tasks.update_status(ids[1], TaskStatus::Done);
        tasks.update_status(ids[2], TaskStatus::Cancelled);
        assert!((p.progress(&tasks) - 50.0).abs() < 1e-9);
        assert_eq!(p.tasks_by_status(&tasks, TaskStatus::Done).len(), 2);
    }

    #[test]
    fn test_duplicate_tasks_are_kept() {
        let mut p = project();
        p.add_task(3);
        p.add_task(3);
        assert_eq!(p.tasks, vec![3, 3]);
    }
}
