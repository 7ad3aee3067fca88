//! Request/response layer.
//!
//! `Api` wraps a `Database` with input validation, notification dispatch
//! and the `status`/`message`/`data`/`code` envelope. Typed methods return
//! `Result<_, TaskError>`; [`Api::handle`] turns a [`Request`] into an
//! [`ApiResponse`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::error::{Entity, TaskError};
use crate::fields::*;
use crate::notify::{
    NotificationKind, NotificationLogEntry, NotificationService, TaskEvent, TaskObserver,
};
use crate::project::Project;
use crate::report::{self, Dashboard, ProjectReport, UserPerformance};
use crate::tags::TagManager;
use crate::task::Task;
use crate::user::User;
use crate::validate::{sanitize_string, validate_email, validate_task};

pub const DEFAULT_TAG_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// The response envelope. Success carries `data`, error carries `code`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl ApiResponse {
    pub fn success(data: impl Serialize, message: impl Into<String>) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => ApiResponse {
                status: ResponseStatus::Success,
                message: message.into(),
                data: Some(data),
                code: None,
            },
            Err(e) => ApiResponse::error(format!("Failed to encode response: {e}"), 500),
        }
    }

    pub fn error(message: impl Into<String>, code: u16) -> Self {
        ApiResponse {
            status: ResponseStatus::Error,
            message: message.into(),
            data: None,
            code: Some(code),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

impl From<TaskError> for ApiResponse {
    fn from(e: TaskError) -> Self {
        ApiResponse::error(e.to_string(), e.code())
    }
}

fn respond<T: Serialize>(result: Result<T, TaskError>, message: &str) -> ApiResponse {
    match result {
        Ok(data) => ApiResponse::success(data, message),
        Err(e) => {
            warn!(code = e.code(), error = %e, "request rejected");
            e.into()
        }
    }
}

fn default_priority() -> u8 {
    TaskPriority::Medium.value()
}

fn default_tag_limit() -> usize {
    DEFAULT_TAG_LIMIT
}

/// One API call, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateUser {
        name: String,
        email: String,
    },
    GetUser {
        user_id: UserId,
    },
    ListUsers,
    DeleteUser {
        user_id: UserId,
    },
    CreateTask {
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        assigned_to: Option<UserId>,
        #[serde(default = "default_priority")]
        priority: u8,
    },
    GetTask {
        task_id: TaskId,
    },
    ListTasks,
    UpdateStatus {
        task_id: TaskId,
        status: String,
    },
    UpdatePriority {
        task_id: TaskId,
        priority: u8,
    },
    AssignTask {
        task_id: TaskId,
        user_id: UserId,
    },
    DeleteTask {
        task_id: TaskId,
    },
    CreateProject {
        name: String,
        #[serde(default)]
        description: String,
        owner_id: UserId,
    },
    GetProject {
        project_id: ProjectId,
    },
    ListProjects,
    DeleteProject {
        project_id: ProjectId,
    },
    AddProjectTask {
        project_id: ProjectId,
        task_id: TaskId,
    },
    AddMember {
        project_id: ProjectId,
        user_id: UserId,
    },
    RemoveMember {
        project_id: ProjectId,
        user_id: UserId,
    },
    AddTag {
        task_id: TaskId,
        tag: String,
    },
    RemoveTag {
        task_id: TaskId,
        tag: String,
    },
    TasksWithTag {
        tag: String,
    },
    MostUsedTags {
        #[serde(default = "default_tag_limit")]
        limit: usize,
    },
    UserPerformance {
        user_id: UserId,
    },
    ProjectReport {
        project_id: ProjectId,
    },
    Dashboard,
    NotificationLog {
        #[serde(default)]
        user_id: Option<UserId>,
        #[serde(default)]
        task_id: Option<TaskId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub tasks_count: usize,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        UserView {
            user_id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            tasks_count: u.tasks.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    pub task_id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Option<UserId>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Task> for TaskView {
    fn from(t: &Task) -> Self {
        TaskView {
            task_id: t.id,
            title: t.title.clone(),
            description: t.description.clone(),
            status: t.status,
            priority: t.priority,
            assigned_to: t.assigned_to,
            tags: t.tags.clone(),
            created_at: t.created_at,
            updated_at: t.updated_at,
            completed_at: t.completed_at,
        }
    }
}

/// A newly created task plus any business-rule warnings it raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedTask {
    #[serde(flatten)]
    pub task: TaskView,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectView {
    pub project_id: ProjectId,
    pub name: String,
    pub description: String,
    pub owner_id: UserId,
    pub members: Vec<UserId>,
    pub tasks_count: usize,
    pub members_count: usize,
    pub progress: f64,
}

impl ProjectView {
    fn new(p: &Project, db: &Database) -> Self {
        ProjectView {
            project_id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            owner_id: p.owner,
            members: p.members.clone(),
            tasks_count: p.tasks.len(),
            members_count: p.members.len(),
            progress: p.progress(&db.tasks),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// API façade over one in-memory session.
#[derive(Debug, Clone, Default)]
pub struct Api {
    db: Database,
    tags: TagManager,
    notifier: NotificationService,
    config: Config,
}

impl Api {
    pub fn new(config: Config) -> Self {
        Api {
            db: Database::with_policy(config.assignment_policy),
            tags: TagManager::new(),
            notifier: NotificationService::new(config.notifications.clone()),
            config,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    pub fn tag_manager(&self) -> &TagManager {
        &self.tags
    }

    pub fn notifier(&self) -> &NotificationService {
        &self.notifier
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dispatch a request and wrap the outcome in an envelope.
    pub fn handle(&mut self, request: Request) -> ApiResponse {
        debug!(?request, "handling request");
        match request {
            Request::CreateUser { name, email } => {
                respond(self.create_user(&name, &email), "User created successfully")
            }
            Request::GetUser { user_id } => respond(self.get_user(user_id), "Success"),
            Request::ListUsers => respond(Ok(self.list_users()), "Success"),
            Request::DeleteUser { user_id } => {
                respond(self.delete_user(user_id), "User deleted successfully")
            }
            Request::CreateTask {
                title,
                description,
                assigned_to,
                priority,
            } => respond(
                self.create_task(&title, &description, assigned_to, priority),
                "Task created successfully",
            ),
            Request::GetTask { task_id } => respond(self.get_task(task_id), "Success"),
            Request::ListTasks => respond(Ok(self.list_tasks()), "Success"),
            Request::UpdateStatus { task_id, status } => {
                respond(self.update_status(task_id, &status), "Task status updated")
            }
            Request::UpdatePriority { task_id, priority } => respond(
                self.update_priority(task_id, priority),
                "Task priority updated",
            ),
            Request::AssignTask { task_id, user_id } => {
                respond(self.assign_task(task_id, user_id), "Task assigned")
            }
            Request::DeleteTask { task_id } => {
                respond(self.delete_task(task_id), "Task deleted successfully")
            }
            Request::CreateProject {
                name,
                description,
                owner_id,
            } => respond(
                self.create_project(&name, &description, owner_id),
                "Project created successfully",
            ),
            Request::GetProject { project_id } => respond(self.get_project(project_id), "Success"),
            Request::ListProjects => respond(Ok(self.list_projects()), "Success"),
            Request::DeleteProject { project_id } => respond(
                self.delete_project(project_id),
                "Project deleted successfully",
            ),
            Request::AddProjectTask {
                project_id,
                task_id,
            } => respond(
                self.add_project_task(project_id, task_id),
                "Task added to project",
            ),
            Request::AddMember {
                project_id,
                user_id,
            } => respond(self.add_member(project_id, user_id), "Member added"),
            Request::RemoveMember {
                project_id,
                user_id,
            } => respond(self.remove_member(project_id, user_id), "Member removed"),
            Request::AddTag { task_id, tag } => respond(self.add_tag(task_id, &tag), "Tag added"),
            Request::RemoveTag { task_id, tag } => {
                respond(self.remove_tag(task_id, &tag), "Tag removed")
            }
            Request::TasksWithTag { tag } => respond(Ok(self.tasks_with_tag(&tag)), "Success"),
            Request::MostUsedTags { limit } => respond(Ok(self.most_used_tags(limit)), "Success"),
            Request::UserPerformance { user_id } => respond(
                self.user_performance(user_id, Utc::now()),
                "User performance summary generated",
            ),
            Request::ProjectReport { project_id } => respond(
                self.project_report(project_id, Utc::now()),
                "Project report generated",
            ),
            Request::Dashboard => respond(Ok(self.dashboard()), "Dashboard report generated"),
            Request::NotificationLog { user_id, task_id } => {
                respond(Ok(self.notification_log(user_id, task_id)), "Success")
            }
        }
    }

    // Users

    pub fn create_user(&mut self, name: &str, email: &str) -> Result<UserView, TaskError> {
        let name = sanitize_string(name);
        let email = email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(TaskError::invalid("name", "Name and email are required"));
        }
        let max = self.config.limits.max_username_length;
        if name.chars().count() > max {
            return Err(TaskError::invalid(
                "name",
                format!("Name must be at most {max} characters"),
            ));
        }
        if !validate_email(email) {
            return Err(TaskError::invalid("email", "Invalid email format"));
        }
        if self.db.users.find_by_email(email).is_some() {
            return Err(TaskError::Duplicate {
                field: "Email",
                value: email.to_string(),
            });
        }
        let user = self.db.users.create(name, email);
        info!(user_id = user.id, "user created");
        Ok(UserView::from(user))
    }

    pub fn get_user(&self, user_id: UserId) -> Result<UserView, TaskError> {
        self.db
            .users
            .get(user_id)
            .map(UserView::from)
            .ok_or(TaskError::not_found(Entity::User, user_id))
    }

    pub fn list_users(&self) -> Vec<UserView> {
        self.db.users.list().into_iter().map(UserView::from).collect()
    }

    pub fn delete_user(&mut self, user_id: UserId) -> Result<(), TaskError> {
        if !self.db.users.delete(user_id) {
            return Err(TaskError::not_found(Entity::User, user_id));
        }
        info!(user_id, "user deleted");
        Ok(())
    }

    // Tasks

    fn check_task_text(&self, title: &str, description: &str) -> Result<(), TaskError> {
        if title.is_empty() {
            return Err(TaskError::invalid("title", "Title is required"));
        }
        let limits = &self.config.limits;
        if title.chars().count() > limits.max_task_title_length {
            return Err(TaskError::invalid(
                "title",
                format!(
                    "Title must be at most {} characters",
                    limits.max_task_title_length
                ),
            ));
        }
        if description.chars().count() > limits.max_task_description_length {
            return Err(TaskError::invalid(
                "description",
                format!(
                    "Description must be at most {} characters",
                    limits.max_task_description_length
                ),
            ));
        }
        Ok(())
    }

    pub fn create_task(
        &mut self,
        title: &str,
        description: &str,
        assigned_to: Option<UserId>,
        priority: u8,
    ) -> Result<CreatedTask, TaskError> {
        let title = sanitize_string(title);
        let description = sanitize_string(description);
        self.check_task_text(&title, &description)?;
        let priority = TaskPriority::try_from(priority)?;
        let task_id = match self.db.create_task(title, description, assigned_to, priority) {
            Some(id) => id,
            None => {
                let user_id = assigned_to.unwrap_or_default();
                return Err(TaskError::not_found(Entity::User, user_id));
            }
        };
        info!(task_id, "task created");
        self.emit(task_id, |task, user| {
            TaskEvent::new(NotificationKind::Created, task, user)
        });

        let task = self.task(task_id)?;
        let warnings = validate_task(task, &self.db.users);
        if !warnings.is_empty() {
            warn!(task_id, ?warnings, "task breaks business rules");
        }
        Ok(CreatedTask {
            task: TaskView::from(task),
            warnings,
        })
    }

    fn task(&self, task_id: TaskId) -> Result<&Task, TaskError> {
        self.db
            .tasks
            .get(task_id)
            .ok_or(TaskError::not_found(Entity::Task, task_id))
    }

    pub fn get_task(&self, task_id: TaskId) -> Result<TaskView, TaskError> {
        self.task(task_id).map(TaskView::from)
    }

    pub fn list_tasks(&self) -> Vec<TaskView> {
        self.db.tasks.list().into_iter().map(TaskView::from).collect()
    }

    pub fn update_status(&mut self, task_id: TaskId, status: &str) -> Result<TaskView, TaskError> {
        let status: TaskStatus = status.parse()?;
        let old = self
            .db
            .tasks
            .replace_status(task_id, status)
            .ok_or(TaskError::not_found(Entity::Task, task_id))?;
        self.emit(task_id, |task, user| TaskEvent::status_changed(task, user, old));
        if status == TaskStatus::Done {
            self.emit(task_id, |task, user| {
                TaskEvent::new(NotificationKind::Completed, task, user)
            });
        }
        self.get_task(task_id)
    }

    pub fn update_priority(&mut self, task_id: TaskId, priority: u8) -> Result<TaskView, TaskError> {
        let priority = TaskPriority::try_from(priority)?;
        let old = self
            .db
            .tasks
            .update_priority(task_id, priority)
            .ok_or(TaskError::not_found(Entity::Task, task_id))?;
        self.emit(task_id, |task, user| TaskEvent::priority_changed(task, user, old));
        self.get_task(task_id)
    }

    pub fn assign_task(&mut self, task_id: TaskId, user_id: UserId) -> Result<TaskView, TaskError> {
        self.task(task_id)?;
        if self.db.users.get(user_id).is_none() {
            return Err(TaskError::not_found(Entity::User, user_id));
        }
        self.db.assign_task(task_id, user_id);
        self.emit(task_id, |task, user| {
            TaskEvent::new(NotificationKind::Assigned, task, user)
        });
        self.get_task(task_id)
    }

    pub fn delete_task(&mut self, task_id: TaskId) -> Result<(), TaskError> {
        if !self.db.tasks.delete(task_id) {
            return Err(TaskError::not_found(Entity::Task, task_id));
        }
        info!(task_id, "task deleted");
        Ok(())
    }

    /// Notify the task's current assignee, if it still resolves.
    fn emit(&mut self, task_id: TaskId, event: impl FnOnce(&Task, &User) -> TaskEvent) {
        let Some(task) = self.db.tasks.get(task_id) else {
            return;
        };
        let Some(user_id) = task.assigned_to else {
            return;
        };
        let Some(user) = self.db.users.get(user_id) else {
            warn!(task_id, user_id, "assignee no longer exists; notification skipped");
            return;
        };
        let event = event(task, user);
        self.notifier.observe(&event, user, task);
    }

    // Projects

    fn project(&self, project_id: ProjectId) -> Result<&Project, TaskError> {
        self.db
            .projects
            .get(project_id)
            .ok_or(TaskError::not_found(Entity::Project, project_id))
    }

    fn project_view(&self, project_id: ProjectId) -> Result<ProjectView, TaskError> {
        self.project(project_id).map(|p| ProjectView::new(p, &self.db))
    }

    pub fn create_project(
        &mut self,
        name: &str,
        description: &str,
        owner_id: UserId,
    ) -> Result<ProjectView, TaskError> {
        let name = sanitize_string(name);
        let description = sanitize_string(description);
        if name.is_empty() {
            return Err(TaskError::invalid("name", "Project name is required"));
        }
        let max = self.config.limits.max_project_name_length;
        if name.chars().count() > max {
            return Err(TaskError::invalid(
                "name",
                format!("Project name must be at most {max} characters"),
            ));
        }
        let project_id = self
            .db
            .create_project(name, description, owner_id)
            .ok_or(TaskError::not_found(Entity::User, owner_id))?;
        info!(project_id, owner_id, "project created");
        self.project_view(project_id)
    }

    pub fn get_project(&self, project_id: ProjectId) -> Result<ProjectView, TaskError> {
        self.project_view(project_id)
    }

    pub fn list_projects(&self) -> Vec<ProjectView> {
        self.db
            .projects
            .list()
            .into_iter()
            .map(|p| ProjectView::new(p, &self.db))
            .collect()
    }

    pub fn delete_project(&mut self, project_id: ProjectId) -> Result<(), TaskError> {
        if !self.db.projects.delete(project_id) {
            return Err(TaskError::not_found(Entity::Project, project_id));
        }
        info!(project_id, "project deleted");
        Ok(())
    }

    pub fn add_project_task(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<ProjectView, TaskError> {
        self.task(task_id)?;
        if !self.db.add_task_to_project(project_id, task_id) {
            return Err(TaskError::not_found(Entity::Project, project_id));
        }
        self.project_view(project_id)
    }

    pub fn add_member(
        &mut self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<ProjectView, TaskError> {
        if self.db.users.get(user_id).is_none() {
            return Err(TaskError::not_found(Entity::User, user_id));
        }
        let project = self.project(project_id)?;
        let max = self.config.limits.max_project_members;
        if !project.is_member(user_id) && project.members.len() >= max {
            return Err(TaskError::invalid(
                "members",
                format!("Project member limit of {max} reached"),
            ));
        }
        self.db.add_member_to_project(project_id, user_id);
        self.project_view(project_id)
    }

    /// Removing the owner succeeds without changing the member list.
    pub fn remove_member(
        &mut self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<ProjectView, TaskError> {
        if !self.db.remove_member_from_project(project_id, user_id) {
            return Err(TaskError::not_found(Entity::Project, project_id));
        }
        self.project_view(project_id)
    }

    // Tags

    pub fn add_tag(&mut self, task_id: TaskId, tag: &str) -> Result<TaskView, TaskError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(TaskError::invalid("tag", "Tag is required"));
        }
        let task = self
            .db
            .tasks
            .get_mut(task_id)
            .ok_or(TaskError::not_found(Entity::Task, task_id))?;
        self.tags.add_tag(task, tag);
        Ok(TaskView::from(&*task))
    }

    pub fn remove_tag(&mut self, task_id: TaskId, tag: &str) -> Result<TaskView, TaskError> {
        let task = self
            .db
            .tasks
            .get_mut(task_id)
            .ok_or(TaskError::not_found(Entity::Task, task_id))?;
        self.tags.remove_tag(task, tag.trim());
        Ok(TaskView::from(&*task))
    }

    pub fn tasks_with_tag(&self, tag: &str) -> Vec<TaskView> {
        let all = self.db.tasks.list();
        self.tags
            .tasks_with_tag(&all, tag)
            .into_iter()
            .map(TaskView::from)
            .collect()
    }

    pub fn most_used_tags(&self, limit: usize) -> Vec<TagCount> {
        let all = self.db.tasks.list();
        self.tags
            .most_used_tags(&all, limit)
            .into_iter()
            .map(|tag| {
                let count = self.tags.count_tasks_with_tag(&all, &tag);
                TagCount { tag, count }
            })
            .collect()
    }

    // Reports

    pub fn user_performance(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<UserPerformance, TaskError> {
        let user = self
            .db
            .users
            .get(user_id)
            .ok_or(TaskError::not_found(Entity::User, user_id))?;
        Ok(report::user_performance(user, &self.db.tasks, now))
    }

    pub fn project_report(
        &self,
        project_id: ProjectId,
        now: DateTime<Utc>,
    ) -> Result<ProjectReport, TaskError> {
        let project = self.project(project_id)?;
        Ok(report::project_report(project, &self.db, now))
    }

    pub fn dashboard(&self) -> Dashboard {
        report::dashboard(&self.db)
    }

    pub fn notification_log(
        &self,
        user_id: Option<UserId>,
        task_id: Option<TaskId>,
    ) -> Vec<NotificationLogEntry> {
        self.notifier
            .log(user_id, task_id)
            .into_iter()
            .cloned()
            .collect()
    }
}
