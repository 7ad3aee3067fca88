//! Enumerations and field types for task management.
//!
//! This module defines the status and priority values a task carries, the
//! identity aliases shared by the stores, and the boundary conversions that
//! turn external strings and ordinals into validated enum values.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Identity of a user within a `UserStore`.
pub type UserId = u64;
/// Identity of a task within a `TaskStore`.
pub type TaskId = u64;
/// Identity of a project within a `ProjectStore`.
pub type ProjectId = u64;

/// Task lifecycle status.
///
/// The set is flat: no ordering is implied and the store accepts any
/// transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Cancelled,
    ];

    /// Wire form used by the API layer and exports.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// DONE and CANCELLED tasks no longer count as open work.
    pub fn is_closed(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(TaskError::InvalidEnumValue {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Ordinal task priority, LOW=1 through CRITICAL=4.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum TaskPriority {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Critical,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    /// Upper-case name used in notification bodies.
    pub fn name(self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
            TaskPriority::Critical => "CRITICAL",
        }
    }

    /// Lower-case key used in distribution maps.
    pub fn key(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }

    /// HIGH or CRITICAL.
    pub fn is_high(self) -> bool {
        self >= TaskPriority::High
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<TaskPriority> for u8 {
    fn from(p: TaskPriority) -> u8 {
        p.value()
    }
}

impl TryFrom<u8> for TaskPriority {
    type Error = TaskError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(TaskPriority::Low),
            2 => Ok(TaskPriority::Medium),
            3 => Ok(TaskPriority::High),
            4 => Ok(TaskPriority::Critical),
            other => Err(TaskError::InvalidEnumValue {
                kind: "priority",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for TaskPriority {
    type Err = TaskError;

    /// Accepts the ordinal ("3") or the name in any case ("high").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u8>() {
            return TaskPriority::try_from(n);
        }
        match trimmed.to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "critical" => Ok(TaskPriority::Critical),
            _ => Err(TaskError::InvalidEnumValue {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!(matches!(
            "finished".parse::<TaskStatus>(),
            Err(TaskError::InvalidEnumValue { kind: "status", .. })
        ));
        // Case-sensitive wire form.
        assert!("DONE".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_priority_ordinals() {
        assert_eq!(TaskPriority::try_from(1).unwrap(), TaskPriority::Low);
        assert_eq!(TaskPriority::try_from(4).unwrap(), TaskPriority::Critical);
        assert!(TaskPriority::try_from(0).is_err());
        assert!(TaskPriority::try_from(5).is_err());
        assert_eq!(u8::from(TaskPriority::High), 3);
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("2".parse::<TaskPriority>().unwrap(), TaskPriority::Medium);
        assert_eq!("Critical".parse::<TaskPriority>().unwrap(), TaskPriority::Critical);
        assert!("urgent".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_high_priority_threshold() {
        assert!(!TaskPriority::Low.is_high());
        assert!(!TaskPriority::Medium.is_high());
        assert!(TaskPriority::High.is_high());
        assert!(TaskPriority::Critical.is_high());
    }

    #[test]
    fn test_serde_forms() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in_progress\"");
        assert_eq!(serde_json::to_string(&TaskPriority::High).unwrap(), "3");
        let p: TaskPriority = serde_json::from_str("4").unwrap();
        assert_eq!(p, TaskPriority::Critical);
        assert!(serde_json::from_str::<TaskPriority>("9").is_err());
    }
}
