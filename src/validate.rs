//! Input checks used at the API boundary.

use std::sync::OnceLock;

use regex::Regex;

use crate::store::UserStore;
use crate::task::Task;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is a valid regex")
    })
}

/// Basic `local@domain.tld` format check.
pub fn validate_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Drop `<>{}` characters, collapse whitespace runs and trim.
pub fn sanitize_string(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '{' | '}'))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut to `max_length` characters, ending in "..." when cut.
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let keep = max_length.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn significant_len(text: &str, ignore: &[char]) -> usize {
    text.trim().chars().filter(|c| !ignore.contains(c)).count()
}

/// Business-rule warnings for a task and its assignee. An empty list means
/// the task passes.
pub fn validate_task(task: &Task, users: &UserStore) -> Vec<String> {
    let mut errors = Vec::new();

    if !task.title.is_empty() && significant_len(&task.title, &[' ', '.', '-']) <= 3 {
        errors.push("Title must be a non-empty string with more than 3 characters".to_string());
    }

    if !task.description.is_empty()
        && significant_len(&task.description, &[' ', '.', ',', '!']) <= 10
    {
        errors.push(
            "Description must be a non-empty string with more than 10 characters".to_string(),
        );
    }

    if let Some(user) = task.assigned_to.and_then(|id| users.get(id)) {
        if !user.email.is_empty() {
            let local = user.email.trim().split('@').next().unwrap_or("");
            if significant_len(local, &['.', '_', '-']) == 0 {
                errors.push("Assigned user email validation failed".to_string());
            }
        }
        if !user.name.is_empty() && significant_len(&user.name, &[' ', '.', ',', '-']) <= 2 {
            errors.push("Assigned user name must have more than 2 characters".to_string());
        }
    }

    errors
}
