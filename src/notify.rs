//! Task-change notifications.
//!
//! Mutating operations produce a [`TaskEvent`]; an observer receives the
//! event together with the current user and task. [`NotificationService`]
//! is the stock observer: it renders an e-mail, simulates delivery and
//! keeps an in-memory log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::NotificationSettings;
use crate::fields::*;
use crate::task::Task;
use crate::user::User;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SIGN_OFF: &str = "Best regards,\nTask Management System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Created,
    Updated,
    Assigned,
    StatusChanged,
    PriorityChanged,
    Completed,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationKind::Created => "created",
            NotificationKind::Updated => "updated",
            NotificationKind::Assigned => "assigned",
            NotificationKind::StatusChanged => "status_changed",
            NotificationKind::PriorityChanged => "priority_changed",
            NotificationKind::Completed => "completed",
        })
    }
}

/// What happened to a task, with the prior value for change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskEvent {
    pub kind: NotificationKind,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub old_status: Option<TaskStatus>,
    pub old_priority: Option<TaskPriority>,
}

impl TaskEvent {
    pub fn new(kind: NotificationKind, task: &Task, user: &User) -> Self {
        TaskEvent {
            kind,
            task_id: task.id,
            user_id: user.id,
            old_status: None,
            old_priority: None,
        }
    }

    pub fn status_changed(task: &Task, user: &User, old: TaskStatus) -> Self {
        TaskEvent {
            old_status: Some(old),
            ..Self::new(NotificationKind::StatusChanged, task, user)
        }
    }

    pub fn priority_changed(task: &Task, user: &User, old: TaskPriority) -> Self {
        TaskEvent {
            old_priority: Some(old),
            ..Self::new(NotificationKind::PriorityChanged, task, user)
        }
    }
}

/// Receives task-change events after the mutation has been applied.
pub trait TaskObserver {
    fn observe(&mut self, event: &TaskEvent, user: &User, task: &Task);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("User {0} has no email address")]
    MissingEmail(UserId),
    #[error("Old status is required for status_changed notification")]
    MissingOldStatus,
    #[error("Old priority is required for priority_changed notification")]
    MissingOldPriority,
    #[error("SMTP is disabled")]
    SmtpDisabled,
}

/// A rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationLogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub user_id: UserId,
    pub task_id: TaskId,
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Simulated e-mail notifier with an in-memory delivery log.
#[derive(Debug, Clone, Default)]
pub struct NotificationService {
    settings: NotificationSettings,
    log: Vec<NotificationLogEntry>,
}

impl NotificationService {
    pub fn new(settings: NotificationSettings) -> Self {
        NotificationService {
            settings,
            log: Vec::new(),
        }
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    /// Validate, render and "send" a notification, recording the outcome.
    pub fn send(&mut self, event: &TaskEvent, user: &User, task: &Task) -> Result<Email, NotifyError> {
        let outcome = self.deliver(event, user, task);
        let (level, message, subject) = match &outcome {
            Ok(email) => (
                LogLevel::Success,
                format!("Notification sent successfully to {}", email.to),
                Some(email.subject.clone()),
            ),
            Err(NotifyError::SmtpDisabled) => (
                LogLevel::Warning,
                format!("SMTP is disabled. Notification would be sent to {}", user.email),
                None,
            ),
            Err(e) => (LogLevel::Error, e.to_string(), None),
        };
        match &outcome {
            Ok(_) => info!(user_id = user.id, task_id = task.id, kind = %event.kind, "notification sent"),
            Err(e) => warn!(user_id = user.id, task_id = task.id, kind = %event.kind, error = %e, "notification not sent"),
        }
        self.log.push(NotificationLogEntry {
            timestamp: Utc::now(),
            level,
            message,
            user_id: user.id,
            task_id: task.id,
            kind: event.kind,
            subject,
        });
        outcome
    }

    fn deliver(&self, event: &TaskEvent, user: &User, task: &Task) -> Result<Email, NotifyError> {
        if user.email.trim().is_empty() {
            return Err(NotifyError::MissingEmail(user.id));
        }
        let (subject, body) = render(event, user, task)?;
        if !self.settings.smtp_enabled {
            return Err(NotifyError::SmtpDisabled);
        }
        Ok(Email {
            to: user.email.clone(),
            subject,
            body,
        })
    }

    /// Log entries, optionally restricted to a user and/or a task.
    pub fn log(&self, user_id: Option<UserId>, task_id: Option<TaskId>) -> Vec<&NotificationLogEntry> {
        self.log
            .iter()
            .filter(|e| user_id.map_or(true, |u| e.user_id == u))
            .filter(|e| task_id.map_or(true, |t| e.task_id == t))
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl TaskObserver for NotificationService {
    fn observe(&mut self, event: &TaskEvent, user: &User, task: &Task) {
        // Failures are recorded in the log.
        let _ = self.send(event, user, task);
    }
}

fn render(event: &TaskEvent, user: &User, task: &Task) -> Result<(String, String), NotifyError> {
    let mut body = format!("Hello {},\n\n", user.name);
    let subject = match event.kind {
        NotificationKind::Created | NotificationKind::Assigned => {
            if event.kind == NotificationKind::Created {
                body.push_str("A new task has been assigned to you:\n\n");
            } else {
                body.push_str("You have been assigned to a new task:\n\n");
            }
            push_details(&mut body, task);
            body.push_str(&format!("Status: {}\n", task.status));
            if event.kind == NotificationKind::Created {
                body.push_str(&format!(
                    "Created at: {}\n",
                    task.created_at.format(DATETIME_FORMAT)
                ));
            }
            body.push_str("\nPlease review and start working on this task.\n\n");
            if event.kind == NotificationKind::Created {
                format!("New Task Assigned: {}", task.title)
            } else {
                format!("Task Assigned to You: {}", task.title)
            }
        }
        NotificationKind::Updated => {
            body.push_str("The following task has been updated:\n\n");
            push_details(&mut body, task);
            body.push_str(&format!("Status: {}\n", task.status));
            body.push_str(&format!(
                "Last updated: {}\n\n",
                task.updated_at.format(DATETIME_FORMAT)
            ));
            body.push_str("Please check the updated details.\n\n");
            format!("Task Updated: {}", task.title)
        }
        NotificationKind::StatusChanged => {
            let old = event.old_status.ok_or(NotifyError::MissingOldStatus)?;
            body.push_str("The status of your task has been changed:\n\n");
            body.push_str(&format!("Task ID: {}\nTitle: {}\n", task.id, task.title));
            body.push_str(&format!("Previous Status: {old}\nNew Status: {}\n", task.status));
            body.push_str(&format!(
                "Changed at: {}\n\n",
                task.updated_at.format(DATETIME_FORMAT)
            ));
            match task.status {
                TaskStatus::Done => {
                    body.push_str("Congratulations! This task has been completed.\n\n")
                }
                TaskStatus::InProgress => {
                    body.push_str("This task is now in progress. Keep up the good work!\n\n")
                }
                _ => {}
            }
            format!("Task Status Changed: {}", task.title)
        }
        NotificationKind::PriorityChanged => {
            let old = event.old_priority.ok_or(NotifyError::MissingOldPriority)?;
            body.push_str("The priority of your task has been changed:\n\n");
            body.push_str(&format!("Task ID: {}\nTitle: {}\n", task.id, task.title));
            body.push_str(&format!(
                "Previous Priority: {}\nNew Priority: {}\n",
                old.name(),
                task.priority.name()
            ));
            body.push_str(&format!(
                "Changed at: {}\n\n",
                task.updated_at.format(DATETIME_FORMAT)
            ));
            if task.priority > old {
                body.push_str(
                    "This task has been upgraded to a higher priority. Please prioritize accordingly.\n\n",
                );
            } else {
                body.push_str("This task priority has been lowered.\n\n");
            }
            format!("Task Priority Changed: {}", task.title)
        }
        NotificationKind::Completed => {
            body.push_str("Congratulations! You have completed the following task:\n\n");
            push_details(&mut body, task);
            if let Some(done) = task.completed_at {
                body.push_str(&format!("Completed at: {}\n", done.format(DATETIME_FORMAT)));
            }
            body.push_str("\nGreat job on completing this task!\n\n");
            format!("Task Completed: {}", task.title)
        }
    };
    body.push_str(SIGN_OFF);
    Ok((subject, body))
}

fn push_details(body: &mut String, task: &Task) {
    body.push_str(&format!("Task ID: {}\n", task.id));
    body.push_str(&format!("Title: {}\n", task.title));
    body.push_str(&format!("Description: {}\n", task.description));
    body.push_str(&format!("Priority: {}\n", task.priority.name()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (User, Task) {
        let now = Utc::now();
        let user = User::new(1, "Alice", "alice@example.com", now);
        let task = Task::new(7, "Fix bug", "Null deref", TaskPriority::High, now);
        (user, task)
    }

    #[test]
    fn test_created_notification() {
        let (user, task) = fixtures();
        let mut svc = NotificationService::default();
        let email = svc
            .send(&TaskEvent::new(NotificationKind::Created, &task, &user), &user, &task)
            .unwrap();
        assert_eq!(email.to, "alice@example.com");
        assert_eq!(email.subject, "New Task Assigned: Fix bug");
        assert!(email.body.starts_with("Hello Alice,"));
        assert!(email.body.contains("Priority: HIGH"));
        assert!(email.body.ends_with(SIGN_OFF));
        assert_eq!(svc.log(None, None)[0].level, LogLevel::Success);
    }

    #[test]
    fn test_status_change_requires_old_status() {
        let (user, task) = fixtures();
        let mut svc = NotificationService::default();
        let event = TaskEvent::new(NotificationKind::StatusChanged, &task, &user);
        assert_eq!(svc.send(&event, &user, &task), Err(NotifyError::MissingOldStatus));
        assert_eq!(svc.log(None, None)[0].level, LogLevel::Error);
    }

    #[test]
    fn test_status_change_body() {
        let (user, mut task) = fixtures();
        task.update_status(TaskStatus::Done, Utc::now());
        let mut svc = NotificationService::default();
        let event = TaskEvent::status_changed(&task, &user, TaskStatus::InProgress);
        let email = svc.send(&event, &user, &task).unwrap();
        assert!(email.body.contains("Previous Status: in_progress"));
        assert!(email.body.contains("New Status: done"));
        assert!(email.body.contains("Congratulations!"));
    }

    #[test]
    fn test_priority_change_direction() {
        let (user, task) = fixtures();
        let mut svc = NotificationService::default();
        let up = svc
            .send(&TaskEvent::priority_changed(&task, &user, TaskPriority::Low), &user, &task)
            .unwrap();
        assert!(up.body.contains("Previous Priority: LOW"));
        assert!(up.body.contains("upgraded to a higher priority"));
        let down = svc
            .send(&TaskEvent::priority_changed(&task, &user, TaskPriority::Critical), &user, &task)
            .unwrap();
        assert!(down.body.contains("priority has been lowered"));
    }

    #[test]
    fn test_missing_email() {
        let (mut user, task) = fixtures();
        user.email.clear();
        let mut svc = NotificationService::default();
        let event = TaskEvent::new(NotificationKind::Assigned, &task, &user);
        assert_eq!(svc.send(&event, &user, &task), Err(NotifyError::MissingEmail(1)));
    }

    #[test]
    fn test_smtp_disabled_logs_warning() {
        let (user, task) = fixtures();
        let mut svc = NotificationService::new(NotificationSettings {
            smtp_enabled: false,
            ..NotificationSettings::default()
        });
        let event = TaskEvent::new(NotificationKind::Completed, &task, &user);
        assert_eq!(svc.send(&event, &user, &task), Err(NotifyError::SmtpDisabled));
        let log = svc.log(None, None);
        assert_eq!(log[0].level, LogLevel::Warning);
        assert!(log[0].message.contains("alice@example.com"));
    }

    #[test]
    fn test_log_filters_and_clear() {
        let (user, task) = fixtures();
        let other = Task::new(8, "Other", "", TaskPriority::Low, Utc::now());
        let mut svc = NotificationService::default();
        svc.observe(&TaskEvent::new(NotificationKind::Assigned, &task, &user), &user, &task);
        svc.observe(&TaskEvent::new(NotificationKind::Assigned, &other, &user), &user, &other);
        assert_eq!(svc.log(Some(1), None).len(), 2);
        assert_eq!(svc.log(None, Some(8)).len(), 1);
        assert!(svc.log(Some(2), None).is_empty());
        svc.clear_log();
        assert!(svc.log(None, None).is_empty());
    }
}
