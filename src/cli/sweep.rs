//! taskwatch sweep command implementations.
//!
//! `sweep overdue` and `sweep approaching` are one-shot triggers for the two
//! sweep operations. `sweep run` is the reference scheduler: both sweeps on a
//! recurring interval, with failures logged and the loop kept alive.

use std::path::PathBuf;
use std::time::Duration;

use tracing::error;

use crate::cli::{emit_cli_event, AppContext};
use crate::error::Result;
use crate::events::{Event, EventKind};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::sweep::SweepReport;

pub struct OverdueOptions {
    pub events: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct ApproachingOptions {
    pub hours: Option<i64>,
    pub events: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct RunOptions {
    pub interval_minutes: Option<u64>,
    pub cycles: Option<u64>,
    pub events: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

fn summarize(report: &SweepReport) -> HumanOutput {
    let mut human = HumanOutput::new(format!("{} sweep completed", report.kind.as_str()));
    human.push_summary("tasks matched", report.tasks.len().to_string());
    human.push_summary(
        "notifications created",
        report.notifications_created.to_string(),
    );
    for view in &report.tasks {
        human.push_detail(format!(
            "{} {} (due {}, assigned to {})",
            view.id,
            view.title,
            view.deadline.format("%Y-%m-%d"),
            view.assigned_user.name
        ));
    }
    human
}

fn emit_sweep_event(events: &Option<String>, report: &SweepReport) -> Result<()> {
    emit_cli_event(
        events,
        Event::new(EventKind::SweepCompleted).with_data(serde_json::json!({
            "kind": report.kind.as_str(),
            "tasks": report.tasks.len(),
            "notifications_created": report.notifications_created,
        }))?,
    )
}

pub fn run_overdue(options: OverdueOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    let report = context.sweeper().check_overdue()?;

    emit_sweep_event(&options.events, &report)?;
    let human = summarize(&report);
    emit_success(options.output, "sweep overdue", &report, Some(&human))
}

pub fn run_approaching(options: ApproachingOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    let hours = options.hours.or(Some(context.config.sweep.approaching_hours));
    let report = context.sweeper().check_approaching(hours)?;

    emit_sweep_event(&options.events, &report)?;
    let human = summarize(&report);
    emit_success(options.output, "sweep approaching", &report, Some(&human))
}

/// Run both sweeps on a fixed interval.
///
/// A failing cycle is logged and the loop keeps going; the dedup gate makes
/// the next cycle self-healing. The loop only terminates on its own when
/// `cycles` is set (used by tests and one-off invocations).
pub fn run_recurring(options: RunOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    let interval_minutes = options
        .interval_minutes
        .unwrap_or(context.config.sweep.interval_minutes);
    let hours = context.config.sweep.approaching_hours;
    let sweeper = context.sweeper();

    let mut completed: u64 = 0;
    loop {
        // Nothing inside a cycle may kill the loop: sweep and event-sink
        // failures alike are logged, and the next cycle retries.
        match sweeper.check_overdue() {
            Ok(report) => {
                if let Err(err) = emit_sweep_event(&options.events, &report) {
                    error!(%err, "failed to emit overdue sweep event");
                }
            }
            Err(err) => error!(%err, "overdue sweep failed"),
        }
        match sweeper.check_approaching(Some(hours)) {
            Ok(report) => {
                if let Err(err) = emit_sweep_event(&options.events, &report) {
                    error!(%err, "failed to emit approaching sweep event");
                }
            }
            Err(err) => error!(%err, "approaching sweep failed"),
        }

        completed += 1;
        if let Some(cycles) = options.cycles {
            if completed >= cycles {
                break;
            }
        }

        std::thread::sleep(Duration::from_secs(interval_minutes * 60));
    }

    #[derive(serde::Serialize)]
    struct RunSummary {
        cycles: u64,
        interval_minutes: u64,
    }

    let mut human = HumanOutput::new("Sweep loop finished");
    human.push_summary("cycles", completed.to_string());
    human.push_summary("interval minutes", interval_minutes.to_string());

    emit_success(
        options.output,
        "sweep run",
        &RunSummary {
            cycles: completed,
            interval_minutes,
        },
        Some(&human),
    )
}
