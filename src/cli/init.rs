//! taskwatch init command.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::AppContext;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct Options {
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct InitData {
    data_dir: String,
    already_initialized: bool,
}

pub fn run(options: Options) -> Result<()> {
    let context = AppContext::open(options.data_dir)?;

    let already_initialized = context.storage.is_initialized();
    context.storage.init_all()?;

    let data = InitData {
        data_dir: context.storage.data_dir().display().to_string(),
        already_initialized,
    };

    let mut human = HumanOutput::new("Initialized taskwatch data directory");
    human.push_summary("path", &data.data_dir);
    if already_initialized {
        human.push_detail("store documents already existed; left unchanged");
    }

    emit_success(options.output, "init", &data, Some(&human))
}
