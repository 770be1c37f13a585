//! Notification store and query/mutation API.
//!
//! Notifications are produced by the deadline sweeps and consumed by polling
//! clients. The store's one hard invariant: at most one notification exists
//! per (recipient, task, kind) triple. [`NotificationStore::insert_if_absent`]
//! enforces it by holding the store's file lock across the existence check
//! and the write, so overlapping sweeps cannot double-notify.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::task::{TaskStore, TaskView};
use crate::user::{UserDirectory, UserProfile};

/// Default cap for notification listings
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Notification kinds.
///
/// TASK_COMPLETED is reserved: it round-trips through storage and the dedup
/// key space, but no sweep produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "OVERDUE")]
    Overdue,
    #[serde(rename = "DEADLINE_APPROACHING")]
    DeadlineApproaching,
    #[serde(rename = "TASK_COMPLETED")]
    TaskCompleted,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Overdue => "OVERDUE",
            NotificationKind::DeadlineApproaching => "DEADLINE_APPROACHING",
            NotificationKind::TaskCompleted => "TASK_COMPLETED",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored notification record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub recipient: String,
    pub task: String,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub sent_at: DateTime<Utc>,
}

/// Read-time view: the record joined with the related task (if it still
/// exists) and a credential-free recipient projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: String,
    pub recipient: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskView>,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub sent_at: DateTime<Utc>,
}

/// Notification store over the shared storage layer
#[derive(Debug, Clone)]
pub struct NotificationStore {
    storage: Storage,
    users: UserDirectory,
    tasks: TaskStore,
}

impl NotificationStore {
    pub fn new(storage: Storage, users: UserDirectory, tasks: TaskStore) -> Self {
        Self {
            storage,
            users,
            tasks,
        }
    }

    /// Insert a notification unless one already exists for the same
    /// (recipient, task, kind) triple. Returns whether a record was created.
    ///
    /// The check and the write happen under one exclusive lock on the store
    /// document; this is the compare-and-set upgrade of the naive
    /// read-check-then-write pattern.
    pub fn insert_if_absent(
        &self,
        recipient: &str,
        task_id: &str,
        kind: NotificationKind,
        message: &str,
    ) -> Result<bool> {
        let record = NotificationRecord {
            id: Ulid::new().to_string().to_lowercase(),
            recipient: recipient.to_string(),
            task: task_id.to_string(),
            kind,
            message: message.to_string(),
            read: false,
            sent_at: Utc::now(),
        };

        self.storage.update_file(
            &self.storage.notifications_file(),
            |notifications: &mut Vec<NotificationRecord>| {
                let exists = notifications.iter().any(|existing| {
                    existing.recipient == record.recipient
                        && existing.task == record.task
                        && existing.kind == record.kind
                });
                if exists {
                    return Ok(false);
                }
                notifications.push(record);
                Ok(true)
            },
        )
    }

    /// All notifications for a recipient, newest first, capped at `limit`
    /// (default 50)
    pub fn list(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<NotificationView>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let mut records = self.records_for(user_id)?;
        records.sort_by(|left, right| right.sent_at.cmp(&left.sent_at));
        records.truncate(limit);
        self.join(records)
    }

    /// Unread notifications for a recipient, newest first
    pub fn list_unread(&self, user_id: &str) -> Result<Vec<NotificationView>> {
        let mut records = self.records_for(user_id)?;
        records.retain(|record| !record.read);
        records.sort_by(|left, right| right.sent_at.cmp(&left.sent_at));
        self.join(records)
    }

    /// Number of unread notifications for a recipient
    pub fn unread_count(&self, user_id: &str) -> Result<usize> {
        let records = self.records_for(user_id)?;
        Ok(records.iter().filter(|record| !record.read).count())
    }

    /// Mark one notification read
    pub fn mark_read(&self, notification_id: &str) -> Result<()> {
        self.storage.update_file(
            &self.storage.notifications_file(),
            |notifications: &mut Vec<NotificationRecord>| {
                let record = notifications
                    .iter_mut()
                    .find(|record| record.id == notification_id)
                    .ok_or_else(|| Error::NotificationNotFound(notification_id.to_string()))?;
                record.read = true;
                Ok(())
            },
        )
    }

    /// Mark every unread notification for a recipient read. Returns how many
    /// were flipped; zero is a no-op, not an error.
    pub fn mark_all_read(&self, user_id: &str) -> Result<usize> {
        self.storage.update_file(
            &self.storage.notifications_file(),
            |notifications: &mut Vec<NotificationRecord>| {
                let mut flipped = 0;
                for record in notifications
                    .iter_mut()
                    .filter(|record| record.recipient == user_id && !record.read)
                {
                    record.read = true;
                    flipped += 1;
                }
                Ok(flipped)
            },
        )
    }

    /// Delete a notification by id
    pub fn delete(&self, notification_id: &str) -> Result<()> {
        self.storage.update_file(
            &self.storage.notifications_file(),
            |notifications: &mut Vec<NotificationRecord>| {
                let before = notifications.len();
                notifications.retain(|record| record.id != notification_id);
                if notifications.len() == before {
                    return Err(Error::NotificationNotFound(notification_id.to_string()));
                }
                Ok(())
            },
        )
    }

    fn records_for(&self, user_id: &str) -> Result<Vec<NotificationRecord>> {
        let records: Vec<NotificationRecord> =
            self.storage.read_file(&self.storage.notifications_file())?;
        Ok(records
            .into_iter()
            .filter(|record| record.recipient == user_id)
            .collect())
    }

    fn join(&self, records: Vec<NotificationRecord>) -> Result<Vec<NotificationView>> {
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let recipient = self.users.get(&record.recipient)?;
            let task = self.tasks.find_view(&record.task)?;
            views.push(NotificationView {
                id: record.id,
                recipient,
                task,
                kind: record.kind,
                message: record.message,
                read: record.read,
                sent_at: record.sent_at,
            });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{Role, SignupRequest};
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        store: NotificationStore,
        pm: UserProfile,
        task_id: String,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());
        storage.init_all().unwrap();

        let users = UserDirectory::new(storage.clone());
        let pm = users
            .signup(SignupRequest {
                name: "Priya".to_string(),
                email: "priya@example.com".to_string(),
                password: "pw".to_string(),
                role: Role::Pm,
            })
            .unwrap();

        let tasks = TaskStore::new(storage.clone(), users.clone());
        let task = tasks
            .create(crate::task::NewTaskRequest {
                title: "Write minutes".to_string(),
                description: None,
                deadline: Utc::now(),
                assigned_user: pm.id.clone(),
            })
            .unwrap();

        let store = NotificationStore::new(storage, users, tasks);
        Fixture {
            _temp: temp,
            store,
            pm,
            task_id: task.id,
        }
    }

    #[test]
    fn insert_if_absent_enforces_the_dedup_key() {
        let fx = fixture();

        let created = fx
            .store
            .insert_if_absent(&fx.pm.id, &fx.task_id, NotificationKind::Overdue, "late")
            .unwrap();
        assert!(created);

        let again = fx
            .store
            .insert_if_absent(&fx.pm.id, &fx.task_id, NotificationKind::Overdue, "late")
            .unwrap();
        assert!(!again);

        // A different kind for the same (recipient, task) is a new triple
        let other_kind = fx
            .store
            .insert_if_absent(
                &fx.pm.id,
                &fx.task_id,
                NotificationKind::DeadlineApproaching,
                "soon",
            )
            .unwrap();
        assert!(other_kind);

        assert_eq!(fx.store.unread_count(&fx.pm.id).unwrap(), 2);
    }

    #[test]
    fn list_is_newest_first_and_capped() {
        let fx = fixture();
        for i in 0..4 {
            // Distinct task ids make distinct dedup triples
            fx.store
                .insert_if_absent(
                    &fx.pm.id,
                    &format!("task-{i}"),
                    NotificationKind::Overdue,
                    &format!("msg {i}"),
                )
                .unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let listed = fx.store.list(&fx.pm.id, Some(3)).unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed
            .windows(2)
            .all(|pair| pair[0].sent_at >= pair[1].sent_at));
        assert_eq!(listed[0].message, "msg 3");
    }

    #[test]
    fn join_tolerates_a_deleted_task() {
        let fx = fixture();
        fx.store
            .insert_if_absent(&fx.pm.id, "gone-task", NotificationKind::Overdue, "late")
            .unwrap();

        let listed = fx.store.list(&fx.pm.id, None).unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].task.is_none());
        assert_eq!(listed[0].recipient.email, "priya@example.com");
    }

    #[test]
    fn mark_all_read_flips_only_unread() {
        let fx = fixture();
        for i in 0..5 {
            fx.store
                .insert_if_absent(
                    &fx.pm.id,
                    &format!("task-{i}"),
                    NotificationKind::Overdue,
                    "late",
                )
                .unwrap();
        }
        let listed = fx.store.list(&fx.pm.id, None).unwrap();
        fx.store.mark_read(&listed[0].id).unwrap();
        fx.store.mark_read(&listed[1].id).unwrap();

        assert_eq!(fx.store.unread_count(&fx.pm.id).unwrap(), 3);
        let flipped = fx.store.mark_all_read(&fx.pm.id).unwrap();
        assert_eq!(flipped, 3);
        assert_eq!(fx.store.unread_count(&fx.pm.id).unwrap(), 0);

        // Second pass is a no-op
        assert_eq!(fx.store.mark_all_read(&fx.pm.id).unwrap(), 0);
    }

    #[test]
    fn mark_read_and_delete_missing_are_not_found() {
        let fx = fixture();
        assert!(matches!(
            fx.store.mark_read("missing"),
            Err(Error::NotificationNotFound(_))
        ));
        assert!(matches!(
            fx.store.delete("missing"),
            Err(Error::NotificationNotFound(_))
        ));
    }

    #[test]
    fn delete_removes_the_record() {
        let fx = fixture();
        fx.store
            .insert_if_absent(&fx.pm.id, &fx.task_id, NotificationKind::Overdue, "late")
            .unwrap();
        let listed = fx.store.list(&fx.pm.id, None).unwrap();
        fx.store.delete(&listed[0].id).unwrap();
        assert!(fx.store.list(&fx.pm.id, None).unwrap().is_empty());
    }

    #[test]
    fn kind_serializes_in_wire_case() {
        let json = serde_json::to_string(&NotificationKind::DeadlineApproaching).unwrap();
        assert_eq!(json, "\"DEADLINE_APPROACHING\"");
        let back: NotificationKind = serde_json::from_str("\"TASK_COMPLETED\"").unwrap();
        assert_eq!(back, NotificationKind::TaskCompleted);
    }
}
