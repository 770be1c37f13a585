//! Task store and the derived overdue flag.
//!
//! Tasks are stored as plain records in `tasks.json`. The overdue flag is
//! never persisted: it is a pure function of (deadline, status, now) and is
//! recomputed at every read boundary, because "now" moves independently of
//! task mutation.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::authz::{self, Caller, TaskPatch};
use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::user::{Role, UserDirectory, UserProfile};

/// Closed task status set. Transitions are a flat set: any status may move to
/// any other, including DONE back to PENDING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "DONE")]
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "PENDING" => Ok(TaskStatus::Pending),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(Error::Validation(format!(
                "invalid status: {other} (expected PENDING, IN_PROGRESS, or DONE)"
            ))),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored task record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub assigned_user: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether a task counts as overdue at the given instant.
///
/// A DONE task is never overdue, no matter how old its deadline is.
pub fn is_overdue(deadline: DateTime<Utc>, status: TaskStatus, now: DateTime<Utc>) -> bool {
    deadline < now && status != TaskStatus::Done
}

/// Read-time view of a task: the record plus the resolved assignee and the
/// overdue flag computed at the moment of the read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub assigned_user: UserProfile,
    pub status: TaskStatus,
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskView {
    pub(crate) fn build(record: &TaskRecord, assignee: UserProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            deadline: record.deadline,
            assigned_user: assignee,
            status: record.status,
            is_overdue: is_overdue(record.deadline, record.status, now),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Request payload for task creation
#[derive(Debug, Clone)]
pub struct NewTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub assigned_user: String,
}

/// Task store over the shared storage layer
#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
    users: UserDirectory,
}

impl TaskStore {
    pub fn new(storage: Storage, users: UserDirectory) -> Self {
        Self { storage, users }
    }

    /// Create a task. The assignee must resolve to an existing user.
    pub fn create(&self, request: NewTaskRequest) -> Result<TaskView> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }
        if request.assigned_user.trim().is_empty() {
            return Err(Error::Validation("assignedUser is required".to_string()));
        }

        let assignee = self.users.get(request.assigned_user.trim())?;

        let now = Utc::now();
        let record = TaskRecord {
            id: Ulid::new().to_string().to_lowercase(),
            title,
            description: request.description.unwrap_or_default(),
            deadline: request.deadline,
            assigned_user: assignee.id.clone(),
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let view = TaskView::build(&record, assignee, now);

        self.storage
            .update_file(&self.storage.tasks_file(), |tasks: &mut Vec<TaskRecord>| {
                tasks.push(record);
                Ok(())
            })?;

        Ok(view)
    }

    /// All tasks with the overdue flag derived at read time
    pub fn list_all(&self) -> Result<Vec<TaskView>> {
        self.list_filtered(None)
    }

    /// Tasks assigned to one user. A user with no tasks gets an empty list,
    /// not an error.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<TaskView>> {
        self.list_filtered(Some(user_id))
    }

    /// Look up a single task by id
    pub fn get(&self, task_id: &str) -> Result<TaskView> {
        let tasks: Vec<TaskRecord> = self.storage.read_file(&self.storage.tasks_file())?;
        let record = tasks
            .iter()
            .find(|task| task.id == task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;

        let assignee = self.users.get(&record.assigned_user)?;
        Ok(TaskView::build(record, assignee, Utc::now()))
    }

    /// Apply a role-gated partial update to a task.
    ///
    /// The authorization policy lives in [`crate::authz`]; this method adds
    /// entity resolution on top: the task must exist, and a reassignment
    /// target must resolve to an existing user before the store is touched.
    pub fn update(&self, task_id: &str, patch: TaskPatch, caller: &Caller) -> Result<TaskView> {
        if caller.role == Role::Pm {
            if let Some(assigned_user) = patch.assigned_user.as_deref() {
                // Resolve before taking the store lock: a PM pointing a task
                // at a ghost user fails with NotFound before the store is
                // touched. USER callers never reach this; their non-status
                // fields are ignored by the policy, resolvable or not.
                self.users.get(assigned_user)?;
            }
        }

        let updated = self.storage.update_file(
            &self.storage.tasks_file(),
            |tasks: &mut Vec<TaskRecord>| {
                let task = tasks
                    .iter_mut()
                    .find(|task| task.id == task_id)
                    .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;

                authz::apply_patch(task, &patch, caller)?;
                task.updated_at = Utc::now();
                Ok(task.clone())
            },
        )?;

        let assignee = self.users.get(&updated.assigned_user)?;
        Ok(TaskView::build(&updated, assignee, Utc::now()))
    }

    /// Delete a task by id
    pub fn delete(&self, task_id: &str) -> Result<()> {
        self.storage
            .update_file(&self.storage.tasks_file(), |tasks: &mut Vec<TaskRecord>| {
                let before = tasks.len();
                tasks.retain(|task| task.id != task_id);
                if tasks.len() == before {
                    return Err(Error::TaskNotFound(task_id.to_string()));
                }
                Ok(())
            })
    }

    /// Raw records, for the sweeper's window queries
    pub(crate) fn records(&self) -> Result<Vec<TaskRecord>> {
        self.storage.read_file(&self.storage.tasks_file())
    }

    /// Look up a task view without erroring when the task is gone; read-time
    /// joins tolerate tasks deleted after their notification was created.
    pub(crate) fn find_view(&self, task_id: &str) -> Result<Option<TaskView>> {
        let tasks: Vec<TaskRecord> = self.storage.read_file(&self.storage.tasks_file())?;
        let record = match tasks.into_iter().find(|task| task.id == task_id) {
            Some(record) => record,
            None => return Ok(None),
        };
        let assignee = self.users.get(&record.assigned_user)?;
        Ok(Some(TaskView::build(&record, assignee, Utc::now())))
    }

    fn list_filtered(&self, user_id: Option<&str>) -> Result<Vec<TaskView>> {
        let tasks: Vec<TaskRecord> = self.storage.read_file(&self.storage.tasks_file())?;
        let profiles: HashMap<String, UserProfile> = self
            .users
            .list()?
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();

        let now = Utc::now();
        let mut views = Vec::new();
        for record in &tasks {
            if let Some(user_id) = user_id {
                if record.assigned_user != user_id {
                    continue;
                }
            }
            let assignee = profiles
                .get(&record.assigned_user)
                .cloned()
                .ok_or_else(|| Error::UserNotFound(record.assigned_user.clone()))?;
            views.push(TaskView::build(record, assignee, now));
        }

        Ok(views)
    }
}
