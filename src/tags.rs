//! Free-form task labels.
//!
//! Tags are case-sensitive strings stored on `Task::tags` in insertion
//! order. `TagManager` mutates those lists and remembers every tag it has
//! ever seen for global listing.

use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use crate::fields::*;
use crate::task::Task;

#[derive(Debug, Clone, Default)]
pub struct TagManager {
    all_tags: Vec<String>,
}

impl TagManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag to a task. Idempotent on the task; the tag is registered
    /// globally either way. Only an actual change bumps `updated_at`.
    pub fn add_tag(&mut self, task: &mut Task, tag: &str) {
        if !task.has_tag(tag) {
            task.tags.push(tag.to_string());
            task.touch(Utc::now());
            debug!(task_id = task.id, tag, "tagged task");
        }
        if !self.all_tags.iter().any(|t| t == tag) {
            self.all_tags.push(tag.to_string());
        }
    }

    /// Remove a tag from a task; no-op if absent.
    pub fn remove_tag(&mut self, task: &mut Task, tag: &str) {
        let before = task.tags.len();
        task.tags.retain(|t| t != tag);
        if task.tags.len() != before {
            task.touch(Utc::now());
            debug!(task_id = task.id, tag, "untagged task");
        }
    }

    pub fn has_tag(&self, task: &Task, tag: &str) -> bool {
        task.has_tag(tag)
    }

    pub fn task_tags<'a>(&self, task: &'a Task) -> &'a [String] {
        &task.tags
    }

    /// Every tag ever added through this manager, in first-use order.
    pub fn all_tags(&self) -> &[String] {
        &self.all_tags
    }

    /// Tag a task with its priority level.
    pub fn infer_priority_tags(&mut self, task: &mut Task) {
        let tag = match task.priority {
            TaskPriority::Low => "low_priority",
            TaskPriority::Medium => "medium_priority",
            TaskPriority::High => "high_priority",
            TaskPriority::Critical => "critical",
        };
        self.add_tag(task, tag);
    }

    /// Tag a task with its current status.
    pub fn infer_status_tags(&mut self, task: &mut Task) {
        let tag = task.status.as_str();
        self.add_tag(task, tag);
    }

    pub fn tasks_with_tag<'a>(&self, tasks: &[&'a Task], tag: &str) -> Vec<&'a Task> {
        tasks.iter().copied().filter(|t| t.has_tag(tag)).collect()
    }

    pub fn tasks_by_tag_and_status<'a>(
        &self,
        tasks: &[&'a Task],
        tag: &str,
        status: TaskStatus,
    ) -> Vec<&'a Task> {
        tasks
            .iter()
            .copied()
            .filter(|t| t.has_tag(tag) && t.status == status)
            .collect()
    }

    pub fn tasks_by_tag_and_priority<'a>(
        &self,
        tasks: &[&'a Task],
        tag: &str,
        priority: TaskPriority,
    ) -> Vec<&'a Task> {
        tasks
            .iter()
            .copied()
            .filter(|t| t.has_tag(tag) && t.priority == priority)
            .collect()
    }

    pub fn tasks_by_tag_and_assignee<'a>(
        &self,
        tasks: &[&'a Task],
        tag: &str,
        user: UserId,
    ) -> Vec<&'a Task> {
        tasks
            .iter()
            .copied()
            .filter(|t| t.has_tag(tag) && t.assigned_to == Some(user))
            .collect()
    }

    pub fn count_tasks_with_tag(&self, tasks: &[&Task], tag: &str) -> usize {
        tasks.iter().filter(|t| t.has_tag(tag)).count()
    }

    /// Up to `limit` tags ordered by descending occurrence count.
    ///
    /// Equal counts keep the order in which the tags were first met while
    /// walking `tasks` and each task's tag list.
    pub fn most_used_tags(&self, tasks: &[&Task], limit: usize) -> Vec<String> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for task in tasks {
            for tag in &task.tags {
                match index.get(tag.as_str()) {
                    Some(&i) => counts[i].1 += 1,
                    None => {
                        index.insert(tag.as_str(), counts.len());
                        counts.push((tag.as_str(), 1));
                    }
                }
            }
        }
        // Stable sort preserves first-seen order among ties.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
            .into_iter()
            .take(limit)
            .map(|(tag, _)| tag.to_string())
            .collect()
    }
}
