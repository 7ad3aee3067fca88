//! Cross-store operations.
//!
//! `Database` bundles one store of each kind so that operations touching
//! two stores (assignment, project membership, project tasks) can resolve
//! ids and borrow both sides at once.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fields::*;
use crate::store::{ProjectStore, TaskStore, UserStore};

/// How re-assignment treats the previous assignee's task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentPolicy {
    /// The previous assignee keeps the task in its list.
    #[default]
    KeepStaleBackReference,
    /// The task is removed from the previous assignee's list first.
    MoveBackReference,
}

/// In-memory database holding the user, task and project stores.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub users: UserStore,
    pub tasks: TaskStore,
    pub projects: ProjectStore,
    pub policy: AssignmentPolicy,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: AssignmentPolicy) -> Self {
        Database {
            policy,
            ..Self::default()
        }
    }

    /// Create a task, optionally assigned at creation. Returns `None` when
    /// the assignee id does not resolve; no task is created in that case.
    pub fn create_task(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        assignee: Option<UserId>,
        priority: TaskPriority,
    ) -> Option<TaskId> {
        let user = match assignee {
            Some(id) => Some(self.users.get_mut(id)?),
            None => None,
        };
        Some(self.tasks.create(title, description, user, priority).id)
    }

    /// Assign a task to a user by id. Returns false if either id is unknown.
    pub fn assign_task(&mut self, task_id: TaskId, user_id: UserId) -> bool {
        let previous = match self.tasks.get(task_id) {
            Some(task) => task.assigned_to,
            None => return false,
        };
        let Some(user) = self.users.get_mut(user_id) else {
            return false;
        };
        if !self.tasks.assign(task_id, user) {
            return false;
        }
        if self.policy == AssignmentPolicy::MoveBackReference {
            if let Some(old) = previous.filter(|p| *p != user_id) {
                if let Some(old_user) = self.users.get_mut(old) {
                    old_user.tasks.retain(|t| *t != task_id);
                    debug!(task_id, user_id = old, "dropped stale back-reference");
                }
            }
        }
        true
    }

    /// Link a task to a project. Returns false if either id is unknown.
    pub fn add_task_to_project(&mut self, project_id: ProjectId, task_id: TaskId) -> bool {
        let Some(task) = self.tasks.get(task_id) else {
            return false;
        };
        self.projects.add_task(project_id, task)
    }

    /// Add a member to a project. Returns false if either id is unknown.
    pub fn add_member_to_project(&mut self, project_id: ProjectId, user_id: UserId) -> bool {
        let Some(user) = self.users.get(user_id) else {
            return false;
        };
        self.projects.add_member(project_id, user)
    }

    /// Remove a member from a project. Returns false if the project is
    /// unknown; the owner is never removed.
    pub fn remove_member_from_project(&mut self, project_id: ProjectId, user_id: UserId) -> bool {
        self.projects.remove_member(project_id, user_id)
    }

    /// Create a project owned by an existing user.
    pub fn create_project(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        owner: UserId,
    ) -> Option<ProjectId> {
        let owner = self.users.get(owner)?;
        Some(self.projects.create(name, description, owner).id)
    }
}
