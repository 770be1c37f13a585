//! taskwatch notify command implementations.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::{emit_cli_event, AppContext};
use crate::error::Result;
use crate::events::{Event, EventKind};
use crate::notification::NotificationView;
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct ListOptions {
    pub user: String,
    pub unread: bool,
    pub limit: Option<usize>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct CountOptions {
    pub user: String,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct ReadOptions {
    pub id: String,
    pub events: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct ReadAllOptions {
    pub user: String,
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

fn describe(view: &NotificationView) -> String {
    let marker = if view.read { " " } else { "*" };
    format!(
        "{marker} {} [{}] {}",
        view.sent_at.format("%Y-%m-%d %H:%M"),
        view.kind.as_str(),
        view.message
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;

    let views = if options.unread {
        context.notifications.list_unread(&options.user)?
    } else {
        let limit = options
            .limit
            .unwrap_or(context.config.notifications.list_limit);
        context.notifications.list(&options.user, Some(limit))?
    };

    let mut human = HumanOutput::new(format!("{} notification(s)", views.len()));
    for view in &views {
        human.push_detail(describe(view));
    }

    emit_success(options.output, "notify list", &views, Some(&human))
}

pub fn run_count(options: CountOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    let count = context.notifications.unread_count(&options.user)?;

    #[derive(Serialize)]
    struct UnreadCount {
        count: usize,
    }

    let mut human = HumanOutput::new("Unread notifications");
    human.push_summary("count", count.to_string());

    emit_success(
        options.output,
        "notify count",
        &UnreadCount { count },
        Some(&human),
    )
}

pub fn run_read(options: ReadOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    context.notifications.mark_read(&options.id)?;

    emit_cli_event(
        &options.events,
        Event::new(EventKind::NotificationRead)
            .with_data(serde_json::json!({ "id": options.id }))?,
    )?;

    #[derive(Serialize)]
    struct MarkedRead<'a> {
        id: &'a str,
    }

    let mut human = HumanOutput::new("Marked notification read");
    human.push_summary("id", &options.id);

    emit_success(
        options.output,
        "notify read",
        &MarkedRead { id: &options.id },
        Some(&human),
    )
}

pub fn run_read_all(options: ReadAllOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    let marked = context.notifications.mark_all_read(&options.user)?;

    emit_cli_event(
        &options.events,
        Event::new(EventKind::NotificationsAllRead)
            .with_data(serde_json::json!({ "user": options.user, "marked": marked }))?,
    )?;

    #[derive(Serialize)]
    struct MarkedAll {
        marked: usize,
    }

    let mut human = HumanOutput::new("Marked all notifications read");
    human.push_summary("marked", marked.to_string());

    emit_success(
        options.output,
        "notify read-all",
        &MarkedAll { marked },
        Some(&human),
    )
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    context.notifications.delete(&options.id)?;

    emit_cli_event(
        &options.events,
        Event::new(EventKind::NotificationDeleted)
            .with_data(serde_json::json!({ "id": options.id }))?,
    )?;

    #[derive(Serialize)]
    struct Deleted<'a> {
        id: &'a str,
    }

    let mut human = HumanOutput::new("Deleted notification");
    human.push_summary("id", &options.id);

    emit_success(
        options.output,
        "notify rm",
        &Deleted { id: &options.id },
        Some(&human),
    )
}
