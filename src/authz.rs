//! Role-gated task mutation policy.
//!
//! Every task update passes through [`apply_patch`] before the store is
//! touched. PMs get partial-update semantics over every field; assignees may
//! only move the status of their own tasks. The policy is deliberately a flat
//! permission check, not a workflow graph: any status may move to any other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::{TaskRecord, TaskStatus};
use crate::user::Role;

/// The asserted identity behind an update request.
///
/// PMs act by role alone; USER callers must also present their own user id so
/// the assignment check has something to compare against.
#[derive(Debug, Clone)]
pub struct Caller {
    pub role: Role,
    pub user_id: Option<String>,
}

impl Caller {
    pub fn pm() -> Self {
        Self {
            role: Role::Pm,
            user_id: None,
        }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            user_id: Some(user_id.into()),
        }
    }
}

/// Partial update of a task. Absent fields are left untouched; they are never
/// nulled out because they were merely omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.deadline.is_none()
            && self.assigned_user.is_none()
            && self.status.is_none()
    }
}

/// Apply a patch to a task under the caller's role policy.
///
/// - PM: every present field is overwritten.
/// - USER: only `status` is applied, only on a task assigned to the caller;
///   other supplied fields are silently ignored for this role.
///
/// The task is left unchanged when the result is an error.
pub fn apply_patch(task: &mut TaskRecord, patch: &TaskPatch, caller: &Caller) -> Result<()> {
    match caller.role {
        Role::Pm => {
            if let Some(title) = &patch.title {
                let title = title.trim();
                if title.is_empty() {
                    return Err(Error::Validation("title cannot be blank".to_string()));
                }
                task.title = title.to_string();
            }
            if let Some(description) = &patch.description {
                task.description = description.clone();
            }
            if let Some(deadline) = patch.deadline {
                task.deadline = deadline;
            }
            if let Some(assigned_user) = &patch.assigned_user {
                task.assigned_user = assigned_user.trim().to_string();
            }
            if let Some(status) = patch.status {
                task.status = status;
            }
            Ok(())
        }
        Role::User => {
            let caller_id = caller
                .user_id
                .as_deref()
                .ok_or_else(|| Error::Forbidden("caller identity is required".to_string()))?;

            if task.assigned_user != caller_id {
                return Err(Error::Forbidden(
                    "you can only update your own tasks".to_string(),
                ));
            }

            if let Some(status) = patch.status {
                task.status = status;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task_for(assignee: &str) -> TaskRecord {
        let now = Utc::now();
        TaskRecord {
            id: "t1".to_string(),
            title: "Ship report".to_string(),
            description: "quarterly numbers".to_string(),
            deadline: now + Duration::days(2),
            assigned_user: assignee.to_string(),
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pm_partial_update_touches_only_present_fields() {
        let mut task = task_for("u1");
        let before = task.clone();

        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            ..TaskPatch::default()
        };
        apply_patch(&mut task, &patch, &Caller::pm()).unwrap();

        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.title, before.title);
        assert_eq!(task.description, before.description);
        assert_eq!(task.deadline, before.deadline);
        assert_eq!(task.assigned_user, before.assigned_user);
    }

    #[test]
    fn pm_may_overwrite_everything() {
        let mut task = task_for("u1");
        let new_deadline = Utc::now() + Duration::days(7);

        let patch = TaskPatch {
            title: Some("Ship final report".to_string()),
            description: Some(String::new()),
            deadline: Some(new_deadline),
            assigned_user: Some("u2".to_string()),
            status: Some(TaskStatus::InProgress),
        };
        apply_patch(&mut task, &patch, &Caller::pm()).unwrap();

        assert_eq!(task.title, "Ship final report");
        assert_eq!(task.description, "");
        assert_eq!(task.deadline, new_deadline);
        assert_eq!(task.assigned_user, "u2");
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[test]
    fn pm_cannot_blank_the_title() {
        let mut task = task_for("u1");
        let patch = TaskPatch {
            title: Some("   ".to_string()),
            ..TaskPatch::default()
        };
        assert!(matches!(
            apply_patch(&mut task, &patch, &Caller::pm()),
            Err(Error::Validation(_))
        ));
        assert_eq!(task.title, "Ship report");
    }

    #[test]
    fn user_updates_status_on_own_task_only() {
        let mut task = task_for("u1");
        let patch = TaskPatch {
            status: Some(TaskStatus::InProgress),
            ..TaskPatch::default()
        };
        apply_patch(&mut task, &patch, &Caller::user("u1")).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[test]
    fn user_is_forbidden_on_foreign_task_and_task_is_unchanged() {
        let mut task = task_for("u1");
        let before = task.clone();

        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            ..TaskPatch::default()
        };
        let result = apply_patch(&mut task, &patch, &Caller::user("u2"));

        assert!(matches!(result, Err(Error::Forbidden(_))));
        assert_eq!(task.status, before.status);
        assert_eq!(task.updated_at, before.updated_at);
    }

    #[test]
    fn user_extra_fields_are_silently_ignored() {
        let mut task = task_for("u1");
        let patch = TaskPatch {
            title: Some("hijacked".to_string()),
            assigned_user: Some("u2".to_string()),
            status: Some(TaskStatus::Done),
            ..TaskPatch::default()
        };
        apply_patch(&mut task, &patch, &Caller::user("u1")).unwrap();

        assert_eq!(task.title, "Ship report");
        assert_eq!(task.assigned_user, "u1");
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[test]
    fn user_with_status_omitted_changes_nothing() {
        let mut task = task_for("u1");
        let patch = TaskPatch {
            title: Some("ignored".to_string()),
            ..TaskPatch::default()
        };
        apply_patch(&mut task, &patch, &Caller::user("u1")).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.title, "Ship report");
    }

    #[test]
    fn user_without_identity_is_forbidden() {
        let mut task = task_for("u1");
        let caller = Caller {
            role: Role::User,
            user_id: None,
        };
        assert!(matches!(
            apply_patch(&mut task, &TaskPatch::default(), &caller),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn done_may_move_back_to_pending() {
        let mut task = task_for("u1");
        task.status = TaskStatus::Done;

        let patch = TaskPatch {
            status: Some(TaskStatus::Pending),
            ..TaskPatch::default()
        };
        apply_patch(&mut task, &patch, &Caller::user("u1")).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
    }
}
