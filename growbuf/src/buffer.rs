use growbuf_core::{Buffer, BufferConfig};
use structopt::StructOpt;

use crate::RunError;

#[derive(StructOpt)]
pub struct BufferOpt {
    /// Size of the first allocation in bytes
    #[structopt(long, env = "GROWBUF_INITIAL_CAPACITY", default_value = "64")]
    pub initial_capacity: usize,

    /// Fail instead of growing the buffer past this many bytes
    #[structopt(long, env = "GROWBUF_MAX_CAPACITY")]
    pub max_capacity: Option<usize>,

    /// Check buffer invariants after every append
    #[structopt(long)]
    pub sanity_check: bool,
}

impl BufferOpt {
    pub fn config(&self) -> BufferConfig {
        BufferConfig {
            initial_capacity: self.initial_capacity,
            max_capacity: self.max_capacity,
            sanity_check: self.sanity_check || cfg!(debug_assertions),
        }
    }
}

pub fn open(opt: &BufferOpt) -> Result<Buffer, RunError> {
    let buffer = Buffer::with_config(&opt.config())?;

    log::debug!("created buffer: capacity={}, max_capacity={:?}",
        buffer.capacity(), opt.max_capacity);

    Ok(buffer)
}
