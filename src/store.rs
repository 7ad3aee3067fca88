//! Entity stores.
//!
//! Each store is the sole owner of one entity type and its identity space.
//! Ids start at 1, increase with every `create` and are never reused, even
//! after deletes. Lookups report a missing id through `Option`, mutations
//! through a `bool`; nothing here returns an error. Deletes never cascade:
//! ids held elsewhere simply stop resolving.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::debug;

use crate::fields::*;
use crate::project::Project;
use crate::task::Task;
use crate::user::User;

/// Owns every `User` and hands out user ids.
#[derive(Debug, Clone)]
pub struct UserStore {
    users: BTreeMap<UserId, User>,
    next_id: UserId,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    pub fn new() -> Self {
        UserStore {
            users: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create a user with the next id. Format and uniqueness of the e-mail
    /// are the caller's responsibility.
    pub fn create(&mut self, name: impl Into<String>, email: impl Into<String>) -> &User {
        let id = self.next_id;
        self.next_id += 1;
        let user = User::new(id, name, email, Utc::now());
        debug!(user_id = id, "created user");
        self.users.entry(id).or_insert(user)
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn get_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.get_mut(&id)
    }

    /// All users in ascending id order.
    pub fn list(&self) -> Vec<&User> {
        self.users.values().collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Hard delete. Task assignments and project memberships that name this
    /// user are left in place.
    pub fn delete(&mut self, id: UserId) -> bool {
        let removed = self.users.remove(&id).is_some();
        if removed {
            debug!(user_id = id, "deleted user");
        }
        removed
    }

    /// First user whose e-mail matches exactly (case-sensitive).
    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email == email)
    }

    /// Users with at least one task that is not DONE.
    pub fn count_active_users(&self, tasks: &TaskStore) -> usize {
        self.users
            .values()
            .filter(|u| !u.active_tasks(tasks).is_empty())
            .count()
    }
}

/// Owns every `Task`, hands out task ids and applies state changes.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: BTreeMap<TaskId, Task>,
    next_id: TaskId,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        TaskStore {
            tasks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create a TODO task with the next id. When an assignee is given the
    /// assignment (both sides) happens as part of creation.
    pub fn create(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        assignee: Option<&mut User>,
        priority: TaskPriority,
    ) -> &Task {
        let id = self.next_id;
        self.next_id += 1;
        let now = Utc::now();
        let mut task = Task::new(id, title, description, priority, now);
        if let Some(user) = assignee {
            task.assign_to(user, now);
        }
        debug!(task_id = id, assigned_to = ?task.assigned_to, "created task");
        self.tasks.entry(id).or_insert(task)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// All tasks in ascending id order.
    pub fn list(&self) -> Vec<&Task> {
        self.tasks.values().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Set a task's status. Returns whether the task was found.
    pub fn update_status(&mut self, id: TaskId, status: TaskStatus) -> bool {
        self.replace_status(id, status).is_some()
    }

    /// Set a task's status and return the previous one.
    pub fn replace_status(&mut self, id: TaskId, status: TaskStatus) -> Option<TaskStatus> {
        let task = self.tasks.get_mut(&id)?;
        let old = task.update_status(status, Utc::now());
        debug!(task_id = id, from = %old, to = %status, "updated task status");
        Some(old)
    }

    /// Set a task's priority and return the previous one.
    pub fn update_priority(&mut self, id: TaskId, priority: TaskPriority) -> Option<TaskPriority> {
        let task = self.tasks.get_mut(&id)?;
        let old = task.set_priority(priority, Utc::now());
        debug!(task_id = id, from = %old, to = %priority, "updated task priority");
        Some(old)
    }

    /// Assign a task to `user`, appending it to the user's task list.
    ///
    /// A previous assignee keeps its (now stale) entry.
    pub fn assign(&mut self, id: TaskId, user: &mut User) -> bool {
        let Some(task) = self.tasks.get_mut(&id) else {
            return false;
        };
        task.assign_to(user, Utc::now());
        debug!(task_id = id, user_id = user.id, "assigned task");
        true
    }

    /// Remove a task. Project task lists and user back-indexes that hold the
    /// id are not touched.
    pub fn delete(&mut self, id: TaskId) -> bool {
        let removed = self.tasks.remove(&id).is_some();
        if removed {
            debug!(task_id = id, "deleted task");
        }
        removed
    }

    pub fn by_assignee(&self, user: &User) -> Vec<&Task> {
        self.tasks
            .values()
            .filter(|t| t.assigned_to == Some(user.id))
            .collect()
    }

    pub fn by_status(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.values().filter(|t| t.status == status).collect()
    }

    /// HIGH and CRITICAL tasks.
    pub fn high_priority(&self) -> Vec<&Task> {
        self.tasks.values().filter(|t| t.priority.is_high()).collect()
    }
}

/// Owns every `Project` and its membership and task lists.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    projects: BTreeMap<ProjectId, Project>,
    next_id: ProjectId,
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectStore {
    pub fn new() -> Self {
        ProjectStore {
            projects: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create a project owned by `owner`, who becomes its first member.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        owner: &User,
    ) -> &Project {
        let id = self.next_id;
        self.next_id += 1;
        let project = Project::new(id, name, description, owner.id, Utc::now());
        debug!(project_id = id, owner = owner.id, "created project");
        self.projects.entry(id).or_insert(project)
    }

    pub fn get(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn get_mut(&mut self, id: ProjectId) -> Option<&mut Project> {
        self.projects.get_mut(&id)
    }

    /// All projects in ascending id order.
    pub fn list(&self) -> Vec<&Project> {
        self.projects.values().collect()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Append a task to a project. Duplicates and tasks already linked to
    /// another project are not checked.
    pub fn add_task(&mut self, project_id: ProjectId, task: &Task) -> bool {
        let Some(project) = self.projects.get_mut(&project_id) else {
            return false;
        };
        project.add_task(task.id);
        debug!(project_id, task_id = task.id, "added task to project");
        true
    }

    /// Drop every occurrence of a task id from a project.
    pub fn remove_task(&mut self, project_id: ProjectId, task_id: TaskId) -> bool {
        let Some(project) = self.projects.get_mut(&project_id) else {
            return false;
        };
        project.tasks.retain(|t| *t != task_id);
        true
    }

    /// Add a member if not already present. Returns whether the project
    /// exists.
    pub fn add_member(&mut self, project_id: ProjectId, user: &User) -> bool {
        let Some(project) = self.projects.get_mut(&project_id) else {
            return false;
        };
        if project.add_member(user.id) {
            debug!(project_id, user_id = user.id, "added project member");
        }
        true
    }

    /// Remove a member; removing the owner silently does nothing. Returns
    /// whether the project exists.
    pub fn remove_member(&mut self, project_id: ProjectId, user_id: UserId) -> bool {
        let Some(project) = self.projects.get_mut(&project_id) else {
            return false;
        };
        if project.remove_member(user_id) {
            debug!(project_id, user_id, "removed project member");
        }
        true
    }

    /// Remove a project. Its tasks and users are not touched.
    pub fn delete(&mut self, project_id: ProjectId) -> bool {
        let removed = self.projects.remove(&project_id).is_some();
        if removed {
            debug!(project_id, "deleted project");
        }
        removed
    }

    /// Projects that list `user` as a member.
    pub fn projects_for_user(&self, user_id: UserId) -> Vec<&Project> {
        self.projects
            .values()
            .filter(|p| p.is_member(user_id))
            .collect()
    }

    pub fn progress(&self, project_id: ProjectId, tasks: &TaskStore) -> Option<f64> {
        self.projects.get(&project_id).map(|p| p.progress(tasks))
    }
}
