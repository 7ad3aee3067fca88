//! JSON and CSV snapshots of the database.
//!
//! Snapshots are taken from complete store listings, so every record
//! reflects a finished mutation.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::db::Database;
use crate::fields::*;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub tasks_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to_id: Option<UserId>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRef {
    pub task_id: TaskId,
    /// `None` for a deleted task.
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRef {
    pub user_id: UserId,
    /// `None` for a deleted user.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecord {
    pub project_id: ProjectId,
    pub name: String,
    pub description: String,
    pub owner_id: UserId,
    pub tasks: Vec<TaskRef>,
    pub members: Vec<MemberRef>,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub users: usize,
    pub tasks: usize,
    pub projects: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub export_timestamp: DateTime<Utc>,
    pub counts: Counts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub users: Vec<UserRecord>,
    pub tasks: Vec<TaskRecord>,
    pub projects: Vec<ProjectRecord>,
    pub metadata: Metadata,
}

pub fn snapshot(db: &Database, now: DateTime<Utc>) -> Snapshot {
    let users: Vec<UserRecord> = db
        .users
        .list()
        .into_iter()
        .map(|u| UserRecord {
            user_id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            created_at: u.created_at,
            tasks_count: u.tasks.len(),
        })
        .collect();

    let tasks: Vec<TaskRecord> = db
        .tasks
        .list()
        .into_iter()
        .map(|t| TaskRecord {
            task_id: t.id,
            title: t.title.clone(),
            description: t.description.clone(),
            status: t.status,
            priority: t.priority,
            assigned_to_id: t.assigned_to,
            tags: t.tags.clone(),
            created_at: t.created_at,
            updated_at: t.updated_at,
            completed_at: t.completed_at,
        })
        .collect();

    let projects: Vec<ProjectRecord> = db
        .projects
        .list()
        .into_iter()
        .map(|p| ProjectRecord {
            project_id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            owner_id: p.owner,
            tasks: p
                .tasks
                .iter()
                .map(|&id| TaskRef {
                    task_id: id,
                    title: db.tasks.get(id).map(|t| t.title.clone()),
                })
                .collect(),
            members: p
                .members
                .iter()
                .map(|&id| MemberRef {
                    user_id: id,
                    name: db.users.get(id).map(|u| u.name.clone()),
                })
                .collect(),
            progress: p.progress(&db.tasks),
            created_at: p.created_at,
        })
        .collect();

    let counts = Counts {
        users: users.len(),
        tasks: tasks.len(),
        projects: projects.len(),
    };

    Snapshot {
        users,
        tasks,
        projects,
        metadata: Metadata {
            export_timestamp: now,
            counts,
        },
    }
}

pub fn to_json_string(db: &Database, now: DateTime<Utc>) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&snapshot(db, now))?)
}

/// Write a pretty JSON snapshot using temp file + rename.
pub fn write_json(db: &Database, path: &Path, now: DateTime<Utc>) -> Result<(), ExportError> {
    let data = to_json_string(db, now)?;
    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp)?;
    f.write_all(data.as_bytes())?;
    f.flush()?;
    fs::rename(tmp, path)?;
    info!(path = %path.display(), "wrote json export");
    Ok(())
}

#[derive(Debug, Serialize)]
struct TaskRow<'a> {
    id: TaskId,
    title: &'a str,
    description: &'a str,
    status: &'static str,
    priority: u8,
    assigned_to: Option<UserId>,
    tags: String,
    created_at: String,
    updated_at: String,
    completed_at: Option<String>,
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// One CSV row per task, with a header line.
pub fn write_tasks_csv<W: Write>(db: &Database, writer: W) -> Result<usize, ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let tasks = db.tasks.list();
    for t in &tasks {
        wtr.serialize(TaskRow {
            id: t.id,
            title: &t.title,
            description: &t.description,
            status: t.status.as_str(),
            priority: t.priority.value(),
            assigned_to: t.assigned_to,
            tags: t.tags.join(";"),
            created_at: rfc3339(t.created_at),
            updated_at: rfc3339(t.updated_at),
            completed_at: t.completed_at.map(rfc3339),
        })?;
    }
    if tasks.is_empty() {
        wtr.write_record([
            "id",
            "title",
            "description",
            "status",
            "priority",
            "assigned_to",
            "tags",
            "created_at",
            "updated_at",
            "completed_at",
        ])?;
    }
    wtr.flush()?;
    Ok(tasks.len())
}

pub fn write_tasks_csv_file(db: &Database, path: &Path) -> Result<usize, ExportError> {
    let file = File::create(path)?;
    let n = write_tasks_csv(db, file)?;
    info!(path = %path.display(), rows = n, "wrote csv export");
    Ok(n)
}
