//! taskwatch task command implementations.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::authz::{Caller, TaskPatch};
use crate::cli::{emit_cli_event, AppContext};
use crate::error::{Error, Result};
use crate::events::{Event, EventKind};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{NewTaskRequest, TaskView};
use crate::user::Role;

pub struct NewOptions {
    pub title: String,
    pub description: Option<String>,
    pub deadline: String,
    pub assign: String,
    pub events: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct ListOptions {
    pub assignee: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct ShowOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct UpdateOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub assign: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub user: Option<String>,
    pub events: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct RmOptions {
    pub id: String,
    pub events: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

/// Parse a deadline as RFC 3339, or as a bare date meaning midnight UTC
pub(crate) fn parse_deadline(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(timestamp) = trimmed.parse::<DateTime<Utc>>() {
        return Ok(timestamp);
    }

    if let Ok(date) = trimmed.parse::<NaiveDate>() {
        let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
        return Ok(DateTime::from_naive_utc_and_offset(midnight, Utc));
    }

    Err(Error::Validation(format!(
        "invalid deadline: {trimmed} (expected RFC 3339 or YYYY-MM-DD)"
    )))
}

/// Resolve the asserted caller from the global --role/--user flags.
///
/// A missing role is a policy violation, matching the update gate: the core
/// never guesses an identity for the caller.
fn resolve_caller(role: Option<&str>, user: Option<&str>) -> Result<Caller> {
    let role = role
        .ok_or_else(|| Error::Forbidden("a role is required for task updates".to_string()))?
        .parse::<Role>()?;

    Ok(Caller {
        role,
        user_id: user.map(str::to_string),
    })
}

fn summarize(human: &mut HumanOutput, view: &TaskView) {
    human.push_summary("id", &view.id);
    human.push_summary("title", &view.title);
    human.push_summary("status", view.status.as_str());
    human.push_summary("assignee", format!("{} <{}>", view.assigned_user.name, view.assigned_user.email));
    human.push_summary("deadline", view.deadline.to_rfc3339());
    if view.is_overdue {
        human.push_warning("task is overdue");
    }
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    let deadline = parse_deadline(&options.deadline)?;

    let view = context.tasks.create(NewTaskRequest {
        title: options.title,
        description: options.description,
        deadline,
        assigned_user: options.assign,
    })?;

    emit_cli_event(
        &options.events,
        Event::new(EventKind::TaskCreated).with_data(&view)?,
    )?;

    let mut human = HumanOutput::new("Created task");
    summarize(&mut human, &view);

    emit_success(options.output, "task new", &view, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;

    let views = match options.assignee.as_deref() {
        Some(user_id) => context.tasks.list_for_user(user_id)?,
        None => context.tasks.list_all()?,
    };

    let mut human = HumanOutput::new(format!("{} task(s)", views.len()));
    for view in &views {
        let overdue = if view.is_overdue { " [OVERDUE]" } else { "" };
        human.push_detail(format!(
            "{} {} ({}, due {}){}",
            view.id,
            view.title,
            view.status.as_str(),
            view.deadline.format("%Y-%m-%d"),
            overdue
        ));
    }

    emit_success(options.output, "task list", &views, Some(&human))
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    let view = context.tasks.get(&options.id)?;

    let mut human = HumanOutput::new("Task");
    summarize(&mut human, &view);
    if !view.description.is_empty() {
        human.push_detail(view.description.clone());
    }

    emit_success(options.output, "task show", &view, Some(&human))
}

pub fn run_update(options: UpdateOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    let caller = resolve_caller(options.role.as_deref(), options.user.as_deref())?;

    let patch = TaskPatch {
        title: options.title,
        description: options.description,
        deadline: options.deadline.as_deref().map(parse_deadline).transpose()?,
        assigned_user: options.assign,
        status: options
            .status
            .as_deref()
            .map(str::parse)
            .transpose()?,
    };

    let view = context.tasks.update(&options.id, patch, &caller)?;

    emit_cli_event(
        &options.events,
        Event::new(EventKind::TaskUpdated).with_data(&view)?,
    )?;

    let mut human = HumanOutput::new("Updated task");
    summarize(&mut human, &view);

    emit_success(options.output, "task update", &view, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    context.tasks.delete(&options.id)?;

    emit_cli_event(
        &options.events,
        Event::new(EventKind::TaskDeleted)
            .with_data(serde_json::json!({ "id": options.id }))?,
    )?;

    #[derive(Serialize)]
    struct Deleted<'a> {
        id: &'a str,
    }

    let mut human = HumanOutput::new("Deleted task");
    human.push_summary("id", &options.id);

    emit_success(
        options.output,
        "task rm",
        &Deleted { id: &options.id },
        Some(&human),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_accepts_rfc3339_and_bare_dates() {
        let full = parse_deadline("2026-03-05T17:30:00Z").unwrap();
        assert_eq!(full.to_rfc3339(), "2026-03-05T17:30:00+00:00");

        let bare = parse_deadline("2026-03-05").unwrap();
        assert_eq!(bare.to_rfc3339(), "2026-03-05T00:00:00+00:00");

        assert!(matches!(
            parse_deadline("next tuesday"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn caller_resolution_requires_a_role() {
        assert!(matches!(
            resolve_caller(None, None),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            resolve_caller(Some("ADMIN"), None),
            Err(Error::Forbidden(_))
        ));

        let caller = resolve_caller(Some("USER"), Some("u1")).unwrap();
        assert_eq!(caller.role, Role::User);
        assert_eq!(caller.user_id.as_deref(), Some("u1"));
    }
}
