//! Aggregate reporting.
//!
//! Read-only computations over the current state of the stores. Every
//! report takes an explicit `now` so results are reproducible; nothing here
//! is cached or persisted. Ids that no longer resolve (deleted tasks or
//! users) are skipped.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;

use crate::db::Database;
use crate::fields::*;
use crate::project::Project;
use crate::store::TaskStore;
use crate::task::Task;
use crate::user::User;

/// A project whose completion rate is below this percentage gets an advisory.
pub const LOW_COMPLETION_RATE: f64 = 30.0;
/// Open tasks older than this many days are overdue.
pub const OVERDUE_AFTER_DAYS: i64 = 30;
/// More overdue tasks than this triggers an advisory.
pub const OVERDUE_ALERT_COUNT: usize = 5;
/// Length of the most-recently-updated list.
pub const RECENT_UPDATES: usize = 5;

pub const LOW_COMPLETION_ADVICE: &str =
    "Completion rate is below 30%. Review task priorities and unblock work in progress.";

fn overdue_advice(count: usize) -> String {
    format!("{count} tasks are overdue. Consider redistributing workload or revisiting deadlines.")
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `completed / total * 100`, or 0 when there is nothing to complete.
pub fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64) * 100.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusDistribution {
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    pub cancelled: usize,
}

impl StatusDistribution {
    pub fn of<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut d = StatusDistribution::default();
        for t in tasks {
            match t.status {
                TaskStatus::Todo => d.todo += 1,
                TaskStatus::InProgress => d.in_progress += 1,
                TaskStatus::Done => d.done += 1,
                TaskStatus::Cancelled => d.cancelled += 1,
            }
        }
        d
    }

    pub fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Todo => self.todo,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Done => self.done,
            TaskStatus::Cancelled => self.cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl PriorityDistribution {
    pub fn of<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut d = PriorityDistribution::default();
        for t in tasks {
            match t.priority {
                TaskPriority::Low => d.low += 1,
                TaskPriority::Medium => d.medium += 1,
                TaskPriority::High => d.high += 1,
                TaskPriority::Critical => d.critical += 1,
            }
        }
        d
    }
}

/// Total plus per-status counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub total: usize,
    #[serde(flatten)]
    pub by_status: StatusDistribution,
}

pub fn task_summary(tasks: &[&Task]) -> TaskSummary {
    TaskSummary {
        total: tasks.len(),
        by_status: StatusDistribution::of(tasks.iter().copied()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskBrief {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskBrief {
    fn from(t: &Task) -> Self {
        TaskBrief {
            id: t.id,
            title: t.title.clone(),
            status: t.status,
            priority: t.priority,
            assigned_to: t.assigned_to,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OldestActiveTask {
    pub id: TaskId,
    pub title: String,
    pub days_old: i64,
}

/// Performance summary for one user, computed over the user's task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPerformance {
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub member_since: String,
    pub total_tasks: usize,
    pub active_tasks: usize,
    pub completed_tasks: usize,
    /// Percentage, two decimals.
    pub completion_rate: f64,
    /// Mean whole days from creation to completion, one decimal.
    pub avg_completion_days: f64,
    pub high_priority_tasks: usize,
    pub low_priority_tasks: usize,
    pub priority_distribution: PriorityDistribution,
    pub status_distribution: StatusDistribution,
    pub oldest_active_task: Option<OldestActiveTask>,
}

pub fn user_performance(user: &User, tasks: &TaskStore, now: DateTime<Utc>) -> UserPerformance {
    let all = user.resolve_tasks(tasks);
    if all.len() != user.tasks.len() {
        warn!(
            user_id = user.id,
            dangling = user.tasks.len() - all.len(),
            "user task list references deleted tasks"
        );
    }
    let active = user.active_tasks(tasks);
    let completed = user.completed_tasks(tasks);

    let avg_completion_days = if completed.is_empty() {
        0.0
    } else {
        let total_days: i64 = completed
            .iter()
            .filter_map(|t| t.completed_at.map(|c| (c - t.created_at).num_days()))
            .sum();
        round_to(total_days as f64 / completed.len() as f64, 1)
    };

    let high = all.iter().filter(|t| t.priority.is_high()).count();

    let oldest_active_task = active
        .iter()
        .min_by_key(|t| t.created_at)
        .map(|t| OldestActiveTask {
            id: t.id,
            title: t.title.clone(),
            days_old: t.age_days(now),
        });

    UserPerformance {
        user_id: user.id,
        user_name: user.name.clone(),
        user_email: user.email.clone(),
        member_since: user.created_at.format("%Y-%m-%d").to_string(),
        total_tasks: all.len(),
        active_tasks: active.len(),
        completed_tasks: completed.len(),
        completion_rate: round_to(completion_rate(completed.len(), all.len()), 2),
        avg_completion_days,
        high_priority_tasks: high,
        low_priority_tasks: all.len() - high,
        priority_distribution: PriorityDistribution::of(all.iter().copied()),
        status_distribution: StatusDistribution::of(all.iter().copied()),
        oldest_active_task,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberWorkload {
    pub user_id: UserId,
    /// `None` when the member id no longer resolves.
    pub name: Option<String>,
    pub total: usize,
    pub done: usize,
    pub in_progress: usize,
}

/// Health report for one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectReport {
    pub project_id: ProjectId,
    pub name: String,
    pub owner_id: UserId,
    pub total_tasks: usize,
    pub status_distribution: StatusDistribution,
    /// Percentage, two decimals.
    pub completion_rate: f64,
    pub priority_distribution: PriorityDistribution,
    /// Distinct assignees of the project's tasks.
    pub active_members: usize,
    pub member_workload: Vec<MemberWorkload>,
    pub overdue_tasks: Vec<TaskBrief>,
    pub recently_updated: Vec<TaskBrief>,
    pub recommendations: Vec<String>,
}

/// Open (not DONE, not CANCELLED) and created more than 30 days before `now`.
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    !task.status.is_closed() && now - task.created_at > Duration::days(OVERDUE_AFTER_DAYS)
}

pub fn project_report(project: &Project, db: &Database, now: DateTime<Utc>) -> ProjectReport {
    let tasks = project.resolve_tasks(&db.tasks);
    if tasks.len() != project.tasks.len() {
        warn!(
            project_id = project.id,
            dangling = project.tasks.len() - tasks.len(),
            "project references deleted tasks"
        );
    }

    let status_distribution = StatusDistribution::of(tasks.iter().copied());
    let rate = round_to(completion_rate(status_distribution.done, tasks.len()), 2);

    let assignees: HashSet<UserId> = tasks.iter().filter_map(|t| t.assigned_to).collect();

    let member_workload = project
        .members
        .iter()
        .map(|&member| {
            let mine: Vec<&&Task> = tasks
                .iter()
                .filter(|t| t.assigned_to == Some(member))
                .collect();
            MemberWorkload {
                user_id: member,
                name: db.users.get(member).map(|u| u.name.clone()),
                total: mine.len(),
                done: mine.iter().filter(|t| t.status == TaskStatus::Done).count(),
                in_progress: mine
                    .iter()
                    .filter(|t| t.status == TaskStatus::InProgress)
                    .count(),
            }
        })
        .collect();

    let overdue_tasks: Vec<TaskBrief> = tasks
        .iter()
        .filter(|t| is_overdue(t, now))
        .map(|t| TaskBrief::from(*t))
        .collect();

    let mut by_update = tasks.clone();
    by_update.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    let recently_updated = by_update
        .into_iter()
        .take(RECENT_UPDATES)
        .map(TaskBrief::from)
        .collect();

    let mut recommendations = Vec::new();
    if rate < LOW_COMPLETION_RATE {
        recommendations.push(LOW_COMPLETION_ADVICE.to_string());
    }
    if overdue_tasks.len() > OVERDUE_ALERT_COUNT {
        recommendations.push(overdue_advice(overdue_tasks.len()));
    }

    ProjectReport {
        project_id: project.id,
        name: project.name.clone(),
        owner_id: project.owner,
        total_tasks: tasks.len(),
        status_distribution,
        completion_rate: rate,
        priority_distribution: PriorityDistribution::of(tasks.iter().copied()),
        active_members: assignees.len(),
        member_workload,
        overdue_tasks,
        recently_updated,
        recommendations,
    }
}

/// Additive triage score: priority, status, age, assignee load, and how
/// much text the task carries. `assignee_load` is the assignee's task
/// count, `None` when unassigned.
pub fn task_score(task: &Task, assignee_load: Option<usize>, now: DateTime<Utc>) -> u32 {
    let mut score = match task.priority {
        TaskPriority::Low => 5,
        TaskPriority::Medium => 10,
        TaskPriority::High => 20,
        TaskPriority::Critical => 40,
    };

    score += match task.status {
        TaskStatus::Todo => 10,
        TaskStatus::InProgress => 25,
        TaskStatus::Done => 50,
        TaskStatus::Cancelled => 0,
    };

    score += match task.age_days(now) {
        d if d < 7 => 5,
        d if d < 14 => 10,
        d if d < 30 => 15,
        d if d < 60 => 20,
        d if d < 90 => 25,
        _ => 30,
    };

    score += match assignee_load {
        None => 20,
        Some(n) if n < 5 => 15,
        Some(n) if n < 10 => 10,
        Some(n) if n < 15 => 5,
        Some(n) if n < 20 => 2,
        Some(_) => 0,
    };

    let title_len = task.title.chars().count();
    score += match title_len {
        0 => 0,
        n if n < 20 => 3,
        n if n < 50 => 5,
        n if n < 100 => 2,
        _ => 1,
    };

    let desc_len = task.description.chars().count();
    score += match desc_len {
        0 => 0,
        n if n > 100 => 5,
        n if n > 50 => 3,
        _ => 1,
    };

    score
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardTask {
    pub task_id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardUser {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub tasks_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardProject {
    pub project_id: ProjectId,
    pub name: String,
    pub description: String,
    pub tasks_count: usize,
    pub members_count: usize,
    pub owner_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub tasks: Vec<DashboardTask>,
    pub users: Vec<DashboardUser>,
    pub projects: Vec<DashboardProject>,
}

/// One row per entity in every store.
pub fn dashboard(db: &Database) -> Dashboard {
    Dashboard {
        tasks: db
            .tasks
            .list()
            .into_iter()
            .map(|t| DashboardTask {
                task_id: t.id,
                title: t.title.clone(),
                description: t.description.clone(),
                status: t.status,
                priority: t.priority,
                assigned_to_id: t.assigned_to,
            })
            .collect(),
        users: db
            .users
            .list()
            .into_iter()
            .map(|u| DashboardUser {
                user_id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
                tasks_count: u.tasks.len(),
            })
            .collect(),
        projects: db
            .projects
            .list()
            .into_iter()
            .map(|p| DashboardProject {
                project_id: p.id,
                name: p.name.clone(),
                description: p.description.clone(),
                tasks_count: p.tasks.len(),
                members_count: p.members.len(),
                owner_id: p.owner,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backdate(db: &mut Database, id: TaskId, days: i64) {
        let t = db.tasks.get_mut(id).unwrap();
        t.created_at -= Duration::days(days);
    }

    #[test]
    fn test_completion_rate() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(1, 4), 25.0);
        assert!((completion_rate(1, 3) - 33.333333).abs() < 1e-4);
    }

    #[test]
    fn test_task_summary() {
        let now = Utc::now();
        let mut a = Task::new(1, "a", "", TaskPriority::Low, now);
        let b = Task::new(2, "b", "", TaskPriority::Low, now);
        a.update_status(TaskStatus::Done, now);
        let s = task_summary(&[&a, &b]);
        assert_eq!(s.total, 2);
        assert_eq!(s.by_status.done, 1);
        assert_eq!(s.by_status.todo, 1);
        let json = serde_json::to_value(s).unwrap();
        assert_eq!(json["total"], 2);
        assert_eq!(json["in_progress"], 0);
    }

    #[test]
    fn test_user_performance_empty() {
        let mut db = Database::new();
        let id = db.users.create("Alice", "alice@example.com").id;
        let perf = user_performance(db.users.get(id).unwrap(), &db.tasks, Utc::now());
        assert_eq!(perf.total_tasks, 0);
        assert_eq!(perf.completion_rate, 0.0);
        assert_eq!(perf.avg_completion_days, 0.0);
        assert!(perf.oldest_active_task.is_none());
    }

    #[test]
    fn test_user_performance() {
        let mut db = Database::new();
        let alice = db.users.create("Alice", "alice@example.com").id;
        let t1 = db.create_task("one", "", Some(alice), TaskPriority::Critical).unwrap();
        let t2 = db.create_task("two", "", Some(alice), TaskPriority::Low).unwrap();
        let t3 = db.create_task("three", "", Some(alice), TaskPriority::High).unwrap();
        backdate(&mut db, t1, 4);
        backdate(&mut db, t3, 10);
        db.tasks.update_status(t1, TaskStatus::Done);
        db.tasks.update_status(t2, TaskStatus::Cancelled);

        let now = Utc::now();
        let perf = user_performance(db.users.get(alice).unwrap(), &db.tasks, now);
        assert_eq!(perf.total_tasks, 3);
        assert_eq!(perf.completed_tasks, 1);
        assert_eq!(perf.active_tasks, 2);
        assert_eq!(perf.completion_rate, 33.33);
        assert_eq!(perf.avg_completion_days, 4.0);
        assert_eq!(perf.high_priority_tasks, 2);
        assert_eq!(perf.low_priority_tasks, 1);
        assert_eq!(perf.priority_distribution.critical, 1);
        assert_eq!(perf.status_distribution.cancelled, 1);
        let oldest = perf.oldest_active_task.unwrap();
        assert_eq!(oldest.id, t3);
        assert_eq!(oldest.days_old, 10);
    }

    #[test]
    fn test_project_report_distributions_and_workload() {
        let mut db = Database::new();
        let alice = db.users.create("Alice", "alice@example.com").id;
        let bob = db.users.create("Bob", "bob@example.com").id;
        let carol = db.users.create("Carol", "carol@example.com").id;
        let p = db.create_project("Sprint1", "", bob).unwrap();
        db.add_member_to_project(p, alice);
        db.add_member_to_project(p, carol);

        let a = db.create_task("a", "", Some(alice), TaskPriority::High).unwrap();
        let b = db.create_task("b", "", Some(alice), TaskPriority::Low).unwrap();
        let c = db.create_task("c", "", Some(bob), TaskPriority::Low).unwrap();
        let d = db.create_task("d", "", None, TaskPriority::Medium).unwrap();
        for t in [a, b, c, d] {
            db.add_task_to_project(p, t);
        }
        db.tasks.update_status(a, TaskStatus::Done);
        db.tasks.update_status(b, TaskStatus::InProgress);

        let report = project_report(db.projects.get(p).unwrap(), &db, Utc::now());
        assert_eq!(report.total_tasks, 4);
        assert_eq!(report.completion_rate, 25.0);
        assert_eq!(report.status_distribution.get(TaskStatus::Todo), 2);
        assert_eq!(report.priority_distribution.low, 2);
        assert_eq!(report.active_members, 2);

        let workload = &report.member_workload;
        assert_eq!(workload.len(), 3);
        assert_eq!(workload[0].user_id, bob);
        assert_eq!((workload[0].total, workload[0].done), (1, 0));
        assert_eq!(workload[1].user_id, alice);
        assert_eq!(
            (workload[1].total, workload[1].done, workload[1].in_progress),
            (2, 1, 1)
        );
        assert_eq!(workload[2].total, 0);

        assert_eq!(report.recently_updated.len(), 4);
        assert!(report.recommendations.iter().any(|r| r == LOW_COMPLETION_ADVICE));
        assert!(report.overdue_tasks.is_empty());
    }

    #[test]
    fn test_recently_updated_is_top_five() {
        let mut db = Database::new();
        let owner = db.users.create("Bob", "bob@example.com").id;
        let p = db.create_project("P", "", owner).unwrap();
        let ids: Vec<_> = (0..7)
            .map(|i| db.create_task(format!("t{i}"), "", None, TaskPriority::Low).unwrap())
            .collect();
        let base = Utc::now();
        for (i, id) in ids.iter().enumerate() {
            db.add_task_to_project(p, *id);
            db.tasks.get_mut(*id).unwrap().updated_at = base + Duration::minutes(i as i64);
        }
        let report = project_report(db.projects.get(p).unwrap(), &db, base);
        let recent: Vec<_> = report.recently_updated.iter().map(|t| t.id).collect();
        assert_eq!(recent, vec![ids[6], ids[5], ids[4], ids[3], ids[2]]);
    }

    #[test]
    fn test_overdue_boundary() {
        let now = Utc::now();
        let mut t = Task::new(1, "t", "", TaskPriority::Low, now - Duration::days(30));
        assert!(!is_overdue(&t, now));
        t.created_at -= Duration::seconds(1);
        assert!(is_overdue(&t, now));
        t.update_status(TaskStatus::Cancelled, now);
        assert!(!is_overdue(&t, now));
    }

    #[test]
    fn test_no_completion_advice_when_healthy() {
        let mut db = Database::new();
        let owner = db.users.create("Bob", "bob@example.com").id;
        let p = db.create_project("P", "", owner).unwrap();
        let t = db.create_task("t", "", None, TaskPriority::Low).unwrap();
        db.add_task_to_project(p, t);
        db.tasks.update_status(t, TaskStatus::Done);
        let report = project_report(db.projects.get(p).unwrap(), &db, Utc::now());
        assert_eq!(report.completion_rate, 100.0);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_task_score() {
        let now = Utc::now();
        let mut t = Task::new(1, "Fix bug", "", TaskPriority::Critical, now);
        // 40 priority + 10 todo + 5 age + 20 unassigned + 3 title + 0 description
        assert_eq!(task_score(&t, None, now), 78);
        t.status = TaskStatus::Done;
        t.description = "x".repeat(60);
        t.created_at = now - Duration::days(45);
        // 40 + 50 + 20 + 10 (load 7) + 3 + 3
        assert_eq!(task_score(&t, Some(7), now), 126);
        t.created_at = now - Duration::days(120);
        assert_eq!(task_score(&t, Some(25), now), 40 + 50 + 30 + 3 + 3);
    }

    #[test]
    fn test_dashboard() {
        let mut db = Database::new();
        let alice = db.users.create("Alice", "alice@example.com").id;
        let t = db.create_task("t", "d", Some(alice), TaskPriority::High).unwrap();
        let p = db.create_project("P", "desc", alice).unwrap();
        db.add_task_to_project(p, t);
        let d = dashboard(&db);
        assert_eq!(d.tasks[0].assigned_to_id, Some(alice));
        assert_eq!(d.users[0].tasks_count, 1);
        assert_eq!(d.projects[0].tasks_count, 1);
        assert_eq!(d.projects[0].owner_id, alice);
    }
}
