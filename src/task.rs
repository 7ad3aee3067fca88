//! Task data structure and related functionality.
//!
//! This module defines the core `Task` struct that represents a single work
//! item, together with the lifecycle methods that keep its timestamps honest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::user::User;

/// A work item with status, priority, assignment and tags.
///
/// `assigned_to` is the owning side of the user/task relationship; the
/// assignee's `User::tasks` list is a denormalised back-index maintained by
/// [`Task::assign_to`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set the first time the task reaches DONE and never cleared.
    pub completed_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

impl Task {
    /// A fresh TODO task, created and updated at `now`.
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: TaskPriority,
        now: DateTime<Utc>,
    ) -> Self {
        Task {
            id,
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Todo,
            priority,
            assigned_to: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            tags: Vec::new(),
        }
    }

    /// Set the status unconditionally and return the previous one.
    ///
    /// Entering DONE stamps `completed_at` only when it is still unset, so a
    /// task that leaves DONE and comes back keeps its first completion time.
    pub fn update_status(&mut self, status: TaskStatus, now: DateTime<Utc>) -> TaskStatus {
        let old = self.status;
        self.status = status;
        self.updated_at = now;
        if status == TaskStatus::Done && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        old
    }

    /// Set the priority and return the previous one.
    pub fn set_priority(&mut self, priority: TaskPriority, now: DateTime<Utc>) -> TaskPriority {
        let old = self.priority;
        self.priority = priority;
        self.updated_at = now;
        old
    }

    /// Point the task at `user` and append it to the user's back-index in
    /// the same step. A previous assignee's list is left untouched.
    pub fn assign_to(&mut self, user: &mut User, now: DateTime<Utc>) {
        self.assigned_to = Some(user.id);
        self.updated_at = now;
        user.tasks.push(self.id);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whole days elapsed since creation.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days()
    }

    /// A DONE task is never overdue.
    pub fn is_overdue(&self, deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if self.status == TaskStatus::Done {
            return false;
        }
        now > deadline
    }
}
