#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

use taskwatch::notification::NotificationStore;
use taskwatch::storage::Storage;
use taskwatch::sweep::Sweeper;
use taskwatch::task::{NewTaskRequest, TaskStore, TaskView};
use taskwatch::user::{Role, SignupRequest, UserDirectory, UserProfile};

pub struct TestEnv {
    dir: TempDir,
    pub storage: Storage,
    pub users: UserDirectory,
    pub tasks: TaskStore,
    pub notifications: NotificationStore,
}

impl TestEnv {
    pub fn init() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init_all().expect("init storage");

        let users = UserDirectory::new(storage.clone());
        let tasks = TaskStore::new(storage.clone(), users.clone());
        let notifications =
            NotificationStore::new(storage.clone(), users.clone(), tasks.clone());

        Self {
            dir,
            storage,
            users,
            tasks,
            notifications,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(
            self.tasks.clone(),
            self.users.clone(),
            self.notifications.clone(),
        )
    }

    pub fn signup(&self, name: &str, email: &str, role: Role) -> UserProfile {
        self.users
            .signup(SignupRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: "pw".to_string(),
                role,
            })
            .expect("signup")
    }

    pub fn create_task(&self, title: &str, assignee: &str, deadline: DateTime<Utc>) -> TaskView {
        self.tasks
            .create(NewTaskRequest {
                title: title.to_string(),
                description: None,
                deadline,
                assigned_user: assignee.to_string(),
            })
            .expect("create task")
    }

    pub fn create_task_due_in(&self, title: &str, assignee: &str, hours: i64) -> TaskView {
        self.create_task(title, assignee, Utc::now() + Duration::hours(hours))
    }

    /// A CLI command pointed at this environment's data directory
    pub fn cmd(&self) -> Command {
        let mut cmd = taskwatch_cmd();
        cmd.env_remove("TASKWATCH_ROLE")
            .env_remove("TASKWATCH_USER")
            .env_remove("TASKWATCH_EVENTS");
        cmd.arg("--data-dir").arg(self.path());
        cmd
    }
}

pub fn taskwatch_cmd() -> Command {
    Command::cargo_bin("taskwatch").expect("binary")
}
