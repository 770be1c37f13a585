//! taskwatch user command implementations.

use std::path::PathBuf;

use crate::cli::{emit_cli_event, AppContext};
use crate::error::Result;
use crate::events::{Event, EventKind};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::user::{Role, SignupRequest};

pub struct SignupOptions {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub events: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct LoginOptions {
    pub email: String,
    pub password: String,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct ListOptions {
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub fn run_signup(options: SignupOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    let role = options.role.parse::<Role>()?;

    let profile = context.users.signup(SignupRequest {
        name: options.name,
        email: options.email,
        password: options.password,
        role,
    })?;

    emit_cli_event(
        &options.events,
        Event::new(EventKind::UserSignedUp).with_data(&profile)?,
    )?;

    let mut human = HumanOutput::new("Registered user");
    human.push_summary("id", &profile.id);
    human.push_summary("email", &profile.email);
    human.push_summary("role", profile.role.as_str());

    emit_success(options.output, "user signup", &profile, Some(&human))
}

pub fn run_login(options: LoginOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    let profile = context.users.login(&options.email, &options.password)?;

    let mut human = HumanOutput::new("Login ok");
    human.push_summary("id", &profile.id);
    human.push_summary("name", &profile.name);
    human.push_summary("role", profile.role.as_str());

    emit_success(options.output, "user login", &profile, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;
    let profiles = context.users.list()?;

    let mut human = HumanOutput::new(format!("{} user(s)", profiles.len()));
    for profile in &profiles {
        human.push_detail(format!(
            "{} {} <{}> ({})",
            profile.id,
            profile.name,
            profile.email,
            profile.role.as_str()
        ));
    }

    emit_success(options.output, "user list", &profiles, Some(&human))
}
