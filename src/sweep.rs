//! Overdue and approaching-deadline sweeps.
//!
//! A sweep scans the task store against a point in time, fans out over every
//! PM, and inserts at most one notification per (PM, task, kind) through the
//! notification store's dedup gate. Sweeps are idempotent: re-running one
//! with no intervening changes creates nothing new, which is what makes a
//! 30-minute recurring trigger safe.
//!
//! The sweeper holds no timer state. The recurring trigger is an external
//! collaborator (the CLI's `sweep run`, or anything else that calls these two
//! operations periodically). The `*_at` variants take an explicit instant so
//! tests never wait on the wall clock.
//!
//! A storage failure aborts the remainder of the sweep and propagates.
//! Notifications created before the failure stay; the dedup check makes the
//! next sweep self-healing.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::notification::{NotificationKind, NotificationStore};
use crate::task::{is_overdue, TaskStatus, TaskStore, TaskView};
use crate::user::{UserDirectory, UserProfile};

/// Default approaching-deadline window in hours
pub const DEFAULT_APPROACHING_HOURS: i64 = 24;

/// Outcome of one sweep.
///
/// `tasks` is every task currently matching the sweep's window, whether or
/// not it produced a new notification this cycle; `notifications_created`
/// counts only the newly inserted records. Callers must not conflate the two.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub kind: NotificationKind,
    pub checked_at: DateTime<Utc>,
    pub tasks: Vec<TaskView>,
    pub notifications_created: usize,
}

/// Scan-and-notify over the task, user, and notification stores
#[derive(Debug, Clone)]
pub struct Sweeper {
    tasks: TaskStore,
    users: UserDirectory,
    notifications: NotificationStore,
}

impl Sweeper {
    pub fn new(tasks: TaskStore, users: UserDirectory, notifications: NotificationStore) -> Self {
        Self {
            tasks,
            users,
            notifications,
        }
    }

    /// Notify every PM about tasks whose deadline has passed
    pub fn check_overdue(&self) -> Result<SweepReport> {
        self.check_overdue_at(Utc::now())
    }

    /// Deterministic variant of [`Sweeper::check_overdue`]
    pub fn check_overdue_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        self.run(now, NotificationKind::Overdue, |deadline, status| {
            is_overdue(deadline, status, now)
        })
    }

    /// Notify every PM about tasks whose deadline falls within the next
    /// `hours` hours. Absent or non-positive thresholds fall back to the
    /// default of 24 rather than failing.
    pub fn check_approaching(&self, hours: Option<i64>) -> Result<SweepReport> {
        self.check_approaching_at(hours, Utc::now())
    }

    /// Deterministic variant of [`Sweeper::check_approaching`]
    pub fn check_approaching_at(
        &self,
        hours: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<SweepReport> {
        let hours = match hours {
            Some(hours) if hours > 0 => hours,
            _ => DEFAULT_APPROACHING_HOURS,
        };
        let threshold = now + Duration::hours(hours);

        self.run(
            now,
            NotificationKind::DeadlineApproaching,
            |deadline, status| now <= deadline && deadline <= threshold && status != TaskStatus::Done,
        )
    }

    fn run<F>(&self, now: DateTime<Utc>, kind: NotificationKind, window: F) -> Result<SweepReport>
    where
        F: Fn(DateTime<Utc>, TaskStatus) -> bool,
    {
        let records = self.tasks.records()?;
        let profiles: HashMap<String, UserProfile> = self
            .users
            .list()?
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();
        let pms = self.users.pms()?;

        let mut matched = Vec::new();
        let mut created = 0usize;

        for record in records
            .iter()
            .filter(|record| window(record.deadline, record.status))
        {
            let assignee = profiles
                .get(&record.assigned_user)
                .ok_or_else(|| Error::UserNotFound(record.assigned_user.clone()))?;

            let message = sweep_message(kind, &record.title, &assignee.name, record.deadline);

            for pm in &pms {
                if self
                    .notifications
                    .insert_if_absent(&pm.id, &record.id, kind, &message)?
                {
                    debug!(task = %record.id, recipient = %pm.id, kind = %kind, "notification created");
                    created += 1;
                }
            }

            matched.push(TaskView::build(record, assignee.clone(), now));
        }

        info!(
            kind = %kind,
            tasks = matched.len(),
            notifications_created = created,
            "sweep completed"
        );

        Ok(SweepReport {
            kind,
            checked_at: now,
            tasks: matched,
            notifications_created: created,
        })
    }
}

fn sweep_message(
    kind: NotificationKind,
    title: &str,
    assignee_name: &str,
    deadline: DateTime<Utc>,
) -> String {
    let date = deadline.format("%Y-%m-%d");
    match kind {
        NotificationKind::Overdue => {
            format!("Task \"{title}\" assigned to {assignee_name} is overdue (Deadline: {date})")
        }
        NotificationKind::DeadlineApproaching => format!(
            "Task \"{title}\" assigned to {assignee_name} deadline is approaching (Deadline: {date})"
        ),
        NotificationKind::TaskCompleted => {
            format!("Task \"{title}\" assigned to {assignee_name} was completed")
        }
    }
}
