//! # taskdesk
//!
//! In-memory task, user and project management with derived reports.
//!
//! Entities live in id-keyed stores ([`store`]); every cross-entity link is
//! an id, so a deleted entity shows up as a lookup returning `None` rather
//! than an error. [`db::Database`] bundles the stores for operations that
//! touch two of them, [`report`] walks the relationships read-only, and
//! [`api::Api`] adds validation, notifications and the response envelope on
//! top.
//!
//! ```
//! use taskdesk::db::Database;
//! use taskdesk::fields::{TaskPriority, TaskStatus};
//!
//! let mut db = Database::new();
//! let alice = db.users.create("Alice", "alice@example.com").id;
//! let bob = db.users.create("Bob", "bob@example.com").id;
//! let task = db.create_task("Fix bug", "", Some(alice), TaskPriority::High).unwrap();
//! let sprint = db.create_project("Sprint1", "", bob).unwrap();
//! db.add_task_to_project(sprint, task);
//! assert_eq!(db.projects.progress(sprint, &db.tasks), Some(0.0));
//!
//! db.tasks.update_status(task, TaskStatus::Done);
//! assert_eq!(db.projects.progress(sprint, &db.tasks), Some(100.0));
//! ```

pub mod api;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod fields;
pub mod notify;
pub mod project;
pub mod report;
pub mod store;
pub mod tags;
pub mod task;
pub mod user;
pub mod validate;
