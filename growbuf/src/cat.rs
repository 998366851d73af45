use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use growbuf_core::{append, Buffer};
use structopt::StructOpt;

use crate::buffer::{self, BufferOpt};
use crate::RunError;

#[derive(StructOpt)]
pub struct CatOpt {
    #[structopt(flatten)]
    pub buffer: BufferOpt,

    /// Print a header line before each input
    #[structopt(long)]
    pub headers: bool,

    /// Input files, stdin is read when none are given
    #[structopt(parse(from_os_str))]
    pub files: Vec<PathBuf>,
}

pub fn run(opt: CatOpt) -> Result<(), RunError> {
    let mut buf = buffer::open(&opt.buffer)?;

    if opt.files.is_empty() {
        append_input(&mut buf, opt.headers, Path::new("-"), io::stdin().lock())?;
    }

    for path in &opt.files {
        let file = File::open(path)
            .map_err(|e| RunError::Read(path.clone(), e))?;

        append_input(&mut buf, opt.headers, path, file)?;
    }

    log::info!("buffered {} bytes: capacity={}, leftover={}",
        buf.len(), buf.capacity(), buf.leftover());

    io::stdout().lock()
        .write_all(buf.as_bytes())
        .map_err(RunError::Write)?;

    buf.release();
    Ok(())
}

fn append_input(buf: &mut Buffer, headers: bool, path: &Path, mut input: impl Read) -> Result<(), RunError> {
    if headers {
        append!(buf, "==> {} <==\n", path.display())?;
    }

    let before = buf.len();

    io::copy(&mut input, buf)
        .map_err(|e| RunError::Read(path.to_owned(), e))?;

    log::debug!("appended {} bytes from {}", buf.len() - before, path.display());
    Ok(())
}
