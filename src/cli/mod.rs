//! Command-line interface for taskwatch
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule. The CLI plays the role of
//! the HTTP layer and the scheduler: it translates commands into core
//! operations and can run the deadline sweeps once or on an interval.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::notification::NotificationStore;
use crate::storage::Storage;
use crate::sweep::Sweeper;
use crate::task::TaskStore;
use crate::user::UserDirectory;

mod init;
mod notify;
mod sweep;
mod task;
mod user;

/// taskwatch - deadline-aware task tracking
///
/// PMs create and assign tasks, assignees update status, and periodic sweeps
/// notify every PM about overdue and approaching-deadline tasks exactly once
/// per task and condition.
#[derive(Parser, Debug)]
#[command(name = "taskwatch")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "TASKWATCH_DATA")]
    pub data_dir: Option<PathBuf>,

    /// Asserted role for task mutations: PM or USER
    #[arg(long, global = true, env = "TASKWATCH_ROLE")]
    pub role: Option<String>,

    /// Caller's own user id (required for USER-role mutations)
    #[arg(long, global = true, env = "TASKWATCH_USER")]
    pub user: Option<String>,

    /// Emit integration events to a file, or "-" for stdout
    #[arg(long, global = true, env = "TASKWATCH_EVENTS")]
    pub events: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the data directory
    Init,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// User directory
    #[command(subcommand)]
    User(UserCommands),

    /// Notification queries and mutations
    #[command(subcommand)]
    Notify(NotifyCommands),

    /// Deadline sweeps (one-shot or recurring)
    #[command(subcommand)]
    Sweep(SweepCommands),
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    New {
        /// Task title
        #[arg(long)]
        title: String,

        /// Task description
        #[arg(long)]
        description: Option<String>,

        /// Deadline (RFC 3339 timestamp or YYYY-MM-DD)
        #[arg(long)]
        deadline: String,

        /// User id of the assignee
        #[arg(long)]
        assign: String,
    },

    /// List tasks with the derived overdue flag
    List {
        /// Only tasks assigned to this user
        #[arg(long)]
        assignee: Option<String>,
    },

    /// Show one task
    Show {
        /// Task id
        id: String,
    },

    /// Update a task (role-gated partial update)
    Update {
        /// Task id
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New deadline (RFC 3339 timestamp or YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,

        /// Reassign to this user id
        #[arg(long)]
        assign: Option<String>,

        /// New status: PENDING, IN_PROGRESS, or DONE
        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a task
    Rm {
        /// Task id
        id: String,
    },
}

/// User subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a user
    Signup {
        /// Display name
        #[arg(long)]
        name: String,

        /// Email (unique, case-insensitive)
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long)]
        password: String,

        /// Role: PM or USER
        #[arg(long)]
        role: String,
    },

    /// Check credentials
    Login {
        /// Email
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long)]
        password: String,
    },

    /// List users
    List,
}

/// Notification subcommands
#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// List notifications for a recipient, newest first
    List {
        /// Recipient user id
        #[arg(long)]
        user: String,

        /// Only unread notifications
        #[arg(long)]
        unread: bool,

        /// Cap the result count (default from config, reference 50)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Count unread notifications for a recipient
    Count {
        /// Recipient user id
        #[arg(long)]
        user: String,
    },

    /// Mark one notification read
    Read {
        /// Notification id
        id: String,
    },

    /// Mark all of a recipient's notifications read
    ReadAll {
        /// Recipient user id
        #[arg(long)]
        user: String,
    },

    /// Delete a notification
    Rm {
        /// Notification id
        id: String,
    },
}

/// Sweep subcommands
#[derive(Subcommand, Debug)]
pub enum SweepCommands {
    /// Scan for overdue tasks and notify every PM once per task
    Overdue,

    /// Scan for tasks whose deadline falls within the next N hours
    Approaching {
        /// Window in hours (non-positive falls back to the default)
        #[arg(long)]
        hours: Option<i64>,
    },

    /// Run both sweeps on a recurring interval (the reference scheduler)
    Run {
        /// Minutes between cycles (default from config, reference 30)
        #[arg(long)]
        interval_minutes: Option<u64>,

        /// Stop after this many cycles (runs forever when omitted)
        #[arg(long)]
        cycles: Option<u64>,
    },
}

/// Shared handles for one command invocation
pub struct AppContext {
    pub storage: Storage,
    pub config: Config,
    pub users: UserDirectory,
    pub tasks: TaskStore,
    pub notifications: NotificationStore,
}

impl AppContext {
    /// Open the stores rooted at the resolved data directory
    pub fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir)?;
        let storage = Storage::new(data_dir);
        let config = Config::load_from_dir(storage.data_dir());

        let users = UserDirectory::new(storage.clone());
        let tasks = TaskStore::new(storage.clone(), users.clone());
        let notifications =
            NotificationStore::new(storage.clone(), users.clone(), tasks.clone());

        Ok(Self {
            storage,
            config,
            users,
            tasks,
            notifications,
        })
    }

    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(
            self.tasks.clone(),
            self.users.clone(),
            self.notifications.clone(),
        )
    }
}

/// Resolve the data directory: explicit flag/env first, then the platform
/// data dir.
fn resolve_data_dir(data_dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = data_dir {
        return Ok(dir);
    }

    directories::ProjectDirs::from("", "", "taskwatch")
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .ok_or_else(|| {
            Error::InvalidConfig(
                "cannot determine a data directory; pass --data-dir".to_string(),
            )
        })
}

/// Emit an integration event when the caller asked for one
pub(crate) fn emit_cli_event(
    events: &Option<String>,
    event: crate::events::Event,
) -> Result<()> {
    if let Some(destination) = crate::events::EventDestination::parse(events.as_deref()) {
        let mut sink = destination.open()?;
        sink.emit(&event)?;
    }
    Ok(())
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        // With --events -, stdout carries only the JSONL event stream: the
        // JSON envelope and human summaries are suppressed on success, same
        // as the error path in main.
        let events_to_stdout = self
            .events
            .as_deref()
            .map(|value| value.trim() == "-")
            .unwrap_or(false);
        let output = crate::output::OutputOptions {
            json: self.json && !events_to_stdout,
            quiet: self.quiet || events_to_stdout,
        };

        match self.command {
            Commands::Init => init::run(init::Options {
                data_dir: self.data_dir,
                output,
            }),
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    title,
                    description,
                    deadline,
                    assign,
                } => task::run_new(task::NewOptions {
                    title,
                    description,
                    deadline,
                    assign,
                    events: self.events,
                    data_dir: self.data_dir,
                    output,
                }),
                TaskCommands::List { assignee } => task::run_list(task::ListOptions {
                    assignee,
                    data_dir: self.data_dir,
                    output,
                }),
                TaskCommands::Show { id } => task::run_show(task::ShowOptions {
                    id,
                    data_dir: self.data_dir,
                    output,
                }),
                TaskCommands::Update {
                    id,
                    title,
                    description,
                    deadline,
                    assign,
                    status,
                } => task::run_update(task::UpdateOptions {
                    id,
                    title,
                    description,
                    deadline,
                    assign,
                    status,
                    role: self.role,
                    user: self.user,
                    events: self.events,
                    data_dir: self.data_dir,
                    output,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::RmOptions {
                    id,
                    events: self.events,
                    data_dir: self.data_dir,
                    output,
                }),
            },
            Commands::User(cmd) => match cmd {
                UserCommands::Signup {
                    name,
                    email,
                    password,
                    role,
                } => user::run_signup(user::SignupOptions {
                    name,
                    email,
                    password,
                    role,
                    events: self.events,
                    data_dir: self.data_dir,
                    output,
                }),
                UserCommands::Login { email, password } => {
                    user::run_login(user::LoginOptions {
                        email,
                        password,
                        data_dir: self.data_dir,
                        output,
                    })
                }
                UserCommands::List => user::run_list(user::ListOptions {
                    data_dir: self.data_dir,
                    output,
                }),
            },
            Commands::Notify(cmd) => match cmd {
                NotifyCommands::List {
                    user,
                    unread,
                    limit,
                } => notify::run_list(notify::ListOptions {
                    user,
                    unread,
                    limit,
                    data_dir: self.data_dir,
                    output,
                }),
                NotifyCommands::Count { user } => notify::run_count(notify::CountOptions {
                    user,
                    data_dir: self.data_dir,
                    output,
                }),
                NotifyCommands::Read { id } => notify::run_read(notify::ReadOptions {
                    id,
                    events: self.events,
                    data_dir: self.data_dir,
                    output,
                }),
                NotifyCommands::ReadAll { user } => {
                    notify::run_read_all(notify::ReadAllOptions {
                        user,
                        events: self.events,
                        data_dir: self.data_dir,
                        output,
                    })
                }
                NotifyCommands::Rm { id } => notify::run_rm(notify::RmOptions {
                    id,
                    events: self.events,
                    data_dir: self.data_dir,
                    output,
                }),
            },
            Commands::Sweep(cmd) => match cmd {
                SweepCommands::Overdue => sweep::run_overdue(sweep::OverdueOptions {
                    events: self.events,
                    data_dir: self.data_dir,
                    output,
                }),
                SweepCommands::Approaching { hours } => {
                    sweep::run_approaching(sweep::ApproachingOptions {
                        hours,
                        events: self.events,
                        data_dir: self.data_dir,
                        output,
                    })
                }
                SweepCommands::Run {
                    interval_minutes,
                    cycles,
                } => sweep::run_recurring(sweep::RunOptions {
                    interval_minutes,
                    cycles,
                    events: self.events,
                    data_dir: self.data_dir,
                    output,
                }),
            },
        }
    }
}
