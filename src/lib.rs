//! taskwatch - deadline-aware task tracking library
//!
//! This library provides the core functionality for the taskwatch CLI:
//! a small multi-role task tracker in which PMs create and assign tasks,
//! assignees update status, and periodic sweeps turn overdue and
//! approaching-deadline tasks into per-PM notifications.
//!
//! # Core Concepts
//!
//! - **Tasks**: records with a deadline and a derived, never-stored overdue
//!   flag computed at every read
//! - **Roles**: a closed {PM, USER} set gating every task mutation
//! - **Sweeps**: idempotent scan-and-notify passes over the task store
//! - **Dedup key**: at most one notification per (recipient, task, kind)
//!
//! # Module Organization
//!
//! - `cli`: command-line interface using clap
//! - `config`: configuration loading from `taskwatch.toml`
//! - `error`: error types and result aliases
//! - `storage`: data directory and JSON document persistence
//! - `lock`: file locking and atomic writes for concurrency safety
//! - `user`: user directory, roles, credential checks
//! - `task`: task store and the overdue flag
//! - `authz`: role-gated task mutation policy
//! - `notification`: notification store and query API
//! - `sweep`: overdue and approaching-deadline sweeps
//! - `events`: JSONL event output for external integrations
//! - `output`: shared CLI output formatting

pub mod authz;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod lock;
pub mod notification;
pub mod output;
pub mod storage;
pub mod sweep;
pub mod task;
pub mod user;

pub use error::{Error, Result};
