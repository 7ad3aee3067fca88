//! Command implementations for the CLI interface.
//!
//! Each command builds one in-memory [`Api`] session, feeds it requests and
//! prints every response envelope to stdout as pretty JSON.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Subcommand;
use clap_complete::{generate, Shell};
use thiserror::Error;
use tracing::info;

use crate::api::{Api, ApiResponse, Request};
use crate::config::{Config, ConfigError};
use crate::export::{self, ExportError};

#[derive(Subcommand)]
pub enum Commands {
    /// Run the demonstration workflow.
    Demo,

    /// Execute a JSON array of requests in one session.
    Run {
        /// Script file: `[{"op": "create_user", ...}, ...]`.
        script: PathBuf,
        /// Write a JSON snapshot of the final state.
        #[arg(long)]
        export_json: Option<PathBuf>,
        /// Write the final task list as CSV.
        #[arg(long)]
        export_csv: Option<PathBuf>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Error)]
pub enum CmdError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to read script {path}: {source}")]
    ReadScript {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid script {path}: {source}")]
    ParseScript {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Load the config file if one was given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config, CmdError> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::default()),
    }
}

/// The demonstration workflow: two users, three tasks, one project and a
/// few status changes, ending with the reports.
pub fn demo_script() -> Vec<Request> {
    vec![
        Request::CreateUser {
            name: "Alice Johnson".into(),
            email: "alice@example.com".into(),
        },
        Request::CreateUser {
            name: "Bob Smith".into(),
            email: "bob@example.com".into(),
        },
        Request::CreateProject {
            name: "Website Redesign".into(),
            description: "Refresh the public website and its build pipeline".into(),
            owner_id: 1,
        },
        Request::AddMember {
            project_id: 1,
            user_id: 2,
        },
        Request::CreateTask {
            title: "Design landing page".into(),
            description: "Create mockups for the new landing page layout".into(),
            assigned_to: Some(1),
            priority: 3,
        },
        Request::CreateTask {
            title: "Set up CI pipeline".into(),
            description: "Build, lint and test on every push to main".into(),
            assigned_to: Some(2),
            priority: 2,
        },
        Request::CreateTask {
            title: "Fix login redirect".into(),
            description: "Users land on a blank page after signing in".into(),
            assigned_to: Some(1),
            priority: 4,
        },
        Request::AddProjectTask {
            project_id: 1,
            task_id: 1,
        },
        Request::AddProjectTask {
            project_id: 1,
            task_id: 2,
        },
        Request::AddProjectTask {
            project_id: 1,
            task_id: 3,
        },
        Request::AddTag {
            task_id: 1,
            tag: "frontend".into(),
        },
        Request::AddTag {
            task_id: 3,
            tag: "frontend".into(),
        },
        Request::AddTag {
            task_id: 2,
            tag: "devops".into(),
        },
        Request::UpdateStatus {
            task_id: 1,
            status: "in_progress".into(),
        },
        Request::UpdateStatus {
            task_id: 3,
            status: "done".into(),
        },
        Request::UpdatePriority {
            task_id: 2,
            priority: 3,
        },
        Request::MostUsedTags { limit: 5 },
        Request::UserPerformance { user_id: 1 },
        Request::ProjectReport { project_id: 1 },
        Request::Dashboard,
        Request::NotificationLog {
            user_id: None,
            task_id: None,
        },
    ]
}

/// Feed requests to the session, writing one pretty JSON envelope each.
pub fn run_requests<W: Write>(
    api: &mut Api,
    requests: Vec<Request>,
    out: &mut W,
) -> Result<Vec<ApiResponse>, CmdError> {
    let mut responses = Vec::with_capacity(requests.len());
    for request in requests {
        let response = api.handle(request);
        writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
        responses.push(response);
    }
    Ok(responses)
}

pub fn read_script(path: &Path) -> Result<Vec<Request>, CmdError> {
    let raw = fs::read_to_string(path).map_err(|source| CmdError::ReadScript {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CmdError::ParseScript {
        path: path.display().to_string(),
        source,
    })
}

pub fn cmd_demo(config: Config) -> Result<(), CmdError> {
    let mut api = Api::new(config);
    let stdout = io::stdout();
    let responses = run_requests(&mut api, demo_script(), &mut stdout.lock())?;
    let failed = responses.iter().filter(|r| !r.is_success()).count();
    info!(requests = responses.len(), failed, "demo finished");
    Ok(())
}

pub fn cmd_run(
    config: Config,
    script: &Path,
    export_json: Option<&Path>,
    export_csv: Option<&Path>,
) -> Result<(), CmdError> {
    let requests = read_script(script)?;
    let mut api = Api::new(config);
    let stdout = io::stdout();
    let responses = run_requests(&mut api, requests, &mut stdout.lock())?;
    let failed = responses.iter().filter(|r| !r.is_success()).count();
    info!(script = %script.display(), requests = responses.len(), failed, "script finished");

    if let Some(path) = export_json {
        export::write_json(api.database(), path, Utc::now())?;
    }
    if let Some(path) = export_csv {
        export::write_tasks_csv_file(api.database(), path)?;
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ResponseStatus;
    use std::io::Write as _;

    #[test]
    fn test_demo_script_succeeds() {
        let mut api = Api::new(Config::default());
        let mut out = Vec::new();
        let responses = run_requests(&mut api, demo_script(), &mut out).unwrap();
        assert!(responses.iter().all(|r| r.status == ResponseStatus::Success));
        assert_eq!(api.database().tasks.len(), 3);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"Dashboard report generated\""));

        // created x3, status_changed x2, completed, priority_changed
        assert_eq!(api.notifier().log(None, None).len(), 7);
    }

    #[test]
    fn test_read_script() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"op": "create_user", "name": "Ann", "email": "ann@example.com"}}, {{"op": "list_users"}}]"#
        )
        .unwrap();
        let requests = read_script(file.path()).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1], Request::ListUsers);
    }

    #[test]
    fn test_read_script_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"op": "launch_rockets"}}]"#).unwrap();
        assert!(matches!(
            read_script(file.path()),
            Err(CmdError::ParseScript { .. })
        ));
        assert!(matches!(
            read_script(Path::new("/no/such/script.json")),
            Err(CmdError::ReadScript { .. })
        ));
    }

    #[test]
    fn test_run_writes_exports() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.json");
        fs::write(
            &script,
            r#"[
                {"op": "create_user", "name": "Ann", "email": "ann@example.com"},
                {"op": "create_task", "title": "Write docs", "assigned_to": 1}
            ]"#,
        )
        .unwrap();
        let json = dir.path().join("out.json");
        let csv = dir.path().join("out.csv");
        cmd_run(Config::default(), &script, Some(&json), Some(&csv)).unwrap();
        assert!(fs::read_to_string(&json).unwrap().contains("Write docs"));
        assert_eq!(fs::read_to_string(&csv).unwrap().lines().count(), 2);
    }
}
