use std::io::{self, Write};

use growbuf_core::{append, Buffer};
use structopt::StructOpt;

use crate::buffer::{self, BufferOpt};
use crate::RunError;

#[derive(StructOpt)]
pub struct GrowOpt {
    #[structopt(flatten)]
    pub buffer: BufferOpt,

    /// Chunk sizes to append, in bytes
    #[structopt(required = true)]
    pub sizes: Vec<usize>,
}

pub fn run(opt: GrowOpt) -> Result<(), RunError> {
    let mut buf = buffer::open(&opt.buffer)?;
    let mut report = Buffer::new(opt.buffer.initial_capacity)?;

    append!(report, "{:>6} {:>10} {:>10} {:>10} {:>10}\n",
        "step", "chunk", "len", "capacity", "leftover")?;

    for (step, &size) in opt.sizes.iter().enumerate() {
        let capacity = buf.capacity();

        buf.append_bytes(&vec![b'#'; size])?;

        if buf.capacity() != capacity {
            log::debug!("step {}: grew {} -> {}", step + 1, capacity, buf.capacity());
        }

        append!(report, "{:>6} {:>10} {:>10} {:>10} {:>10}\n",
            step + 1, size, buf.len(), buf.capacity(), buf.leftover())?;
    }

    io::stdout().lock()
        .write_all(report.as_bytes())
        .map_err(RunError::Write)
}
