mod buffer;
mod cat;
mod config;
mod grow;

use std::path::PathBuf;
use std::process::ExitCode;

use log::LevelFilter;
use structopt::StructOpt;
use thiserror::Error;

#[derive(StructOpt)]
enum Opt {
    /// Concatenate inputs through one buffer and write it to stdout
    Cat(cat::CatOpt),
    /// Append chunks of the given sizes and report capacity after each
    Grow(grow::GrowOpt),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("reading config {0}: {1}")]
    Config(PathBuf, toml::de::Error),
    #[error("creating buffer: {0}")]
    Create(#[from] growbuf_core::CreateError),
    #[error("appending to buffer: {0}")]
    Append(#[from] growbuf_core::AppendError),
    #[error("reading {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("writing output: {0}")]
    Write(std::io::Error),
}

fn main() -> Result<(), ExitCode> {
    init_log();

    let result = config::read()
        .map(|config| {
            if let Some(config) = config {
                config::load_into_env(&config);
            }
        })
        .and_then(|()| match Opt::from_args() {
            Opt::Cat(opt) => cat::run(opt),
            Opt::Grow(opt) => grow::run(opt),
        });

    result.map_err(|err| {
        log::error!("fatal: {err}");
        ExitCode::FAILURE
    })
}

fn init_log() {
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(default_log_level())
        .parse_default_env()
        .init();
}

fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}
