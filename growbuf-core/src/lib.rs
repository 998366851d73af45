//! Growable byte buffer for assembling text and payloads incrementally.
//!
//! A [`Buffer`] owns one contiguous, zero-initialised block. Appends copy into
//! the free tail and double the block when it runs out of room. Unused bytes
//! past the written length always read as zero.
//!
//! ```
//! use growbuf_core::{append, Buffer};
//!
//! let mut buf = Buffer::new(4)?;
//! buf.append_str("answer=")?;
//! append!(buf, "{}", 42)?;
//! assert_eq!(buf.as_bytes(), b"answer=42");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod buffer;
pub mod config;
pub mod error;

pub use buffer::Buffer;
pub use config::BufferConfig;
pub use error::{AllocError, AppendError, CreateError};

/// Appends `format!`-style output to a [`Buffer`], growing it as needed.
/// Evaluates to `Result<(), AppendError>`.
#[macro_export]
macro_rules! append {
    ($buf:expr, $($arg:tt)*) => {
        $buf.append_fmt(::core::format_args!($($arg)*))
    };
}
