use core::fmt::{self, Debug, Write as _};
use core::str::Utf8Error;
use std::collections::TryReserveError;
use std::io;

pub mod raw;

use raw::Block;

use crate::config::BufferConfig;
use crate::error::{AllocError, AppendError, CreateError};

/// Growable byte buffer.
///
/// Capacity doubles whenever an append would overflow it. Bytes between
/// [`len`](Buffer::len) and [`capacity`](Buffer::capacity) are always zero
/// after a growth, a clear, or a successful append.
///
/// The slices returned by [`as_bytes`](Buffer::as_bytes) and
/// [`spare`](Buffer::spare) borrow the backing block directly. Any append may
/// move that block to a new allocation, so those borrows must be dropped
/// before the next mutation.
pub struct Buffer {
    block: Block,
    len: usize,
    limit: Option<usize>,
    sanity_check: bool,
}

impl Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer {{ len = {}; capacity = {}; {:x?} }}",
            self.len(), self.capacity(), self.as_bytes())
    }
}

impl Buffer {
    pub fn new(capacity: usize) -> Result<Self, CreateError> {
        Self::with_config(&BufferConfig::with_capacity(capacity))
    }

    pub fn with_config(config: &BufferConfig) -> Result<Self, CreateError> {
        if config.initial_capacity == 0 {
            return Err(CreateError::InvalidCapacity);
        }

        let block = Block::alloc_zeroed(config.initial_capacity, config.max_capacity)?;

        Ok(Buffer {
            block,
            len: 0,
            limit: config.max_capacity,
            sanity_check: config.sanity_check,
        })
    }

    /// Frees the backing block. Equivalent to dropping the buffer.
    pub fn release(self) {}

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.block.len()
    }

    pub fn leftover(&self) -> usize {
        self.capacity() - self.len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.block[..self.len]
    }

    /// The unused tail of the block, `leftover()` bytes long. Always zeroed.
    pub fn spare(&self) -> &[u8] {
        &self.block[self.len..]
    }

    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        core::str::from_utf8(self.as_bytes())
    }

    /// Zeroes the whole block and resets length. Capacity is kept.
    pub fn clear(&mut self) {
        self.block.fill(0);
        self.len = 0;
        self.check_sanity();
    }

    /// Grows the buffer so that at least `extra` more bytes fit without
    /// another allocation.
    pub fn reserve(&mut self, extra: usize) -> Result<(), AllocError> {
        self.inflate(extra)?;
        self.check_sanity();
        Ok(())
    }

    pub fn append_str(&mut self, text: &str) -> Result<(), AppendError> {
        self.append_bytes(text.as_bytes())
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), AppendError> {
        self.inflate(bytes.len())?;

        let end = self.len + bytes.len();
        self.block[self.len..end].copy_from_slice(bytes);
        self.len = end;

        self.check_sanity();
        Ok(())
    }

    /// Appends formatted text, usually called through [`append!`](crate::append).
    ///
    /// The arguments are formatted once. Output goes straight into the
    /// leftover space; whatever does not fit is captured in a scratch vector
    /// and copied in after the buffer has grown. On failure the buffer is
    /// left exactly as it was.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), AppendError> {
        let start = self.len;

        let mut probe = Probe::new(&mut self.block[start..]);
        let result = probe.write_fmt(args);
        let Probe { written, spill, spill_error, .. } = probe;

        let failure = match (result, spill_error) {
            (Ok(()), _) => None,
            (Err(_), Some(err)) => Some(AppendError::Grow(err)),
            (Err(err), None) => Some(AppendError::Format(err)),
        };

        if let Some(err) = failure {
            self.block.zero(start..start + written);
            return Err(err);
        }

        match spill {
            None => {
                self.len += written;
            }
            Some(output) => {
                if let Err(err) = self.inflate(output.len()) {
                    self.block.zero(start..start + written);
                    return Err(err.into());
                }

                let end = start + output.len();
                self.block[start..end].copy_from_slice(&output);
                self.len = end;
            }
        }

        self.check_sanity();
        Ok(())
    }

    fn inflate(&mut self, extra: usize) -> Result<(), AllocError> {
        let required = self.len.checked_add(extra)
            .ok_or(AllocError { requested_bytes: usize::MAX })?;

        let capacity = self.capacity();
        if required <= capacity {
            return Ok(());
        }

        let new_capacity = inflated_capacity(capacity, required);
        let block = self.block.realloc_zeroed(new_capacity, self.len, self.limit)?;

        log::trace!("inflating buffer: capacity={capacity} -> {new_capacity}, len={}", self.len);

        self.block = block;
        Ok(())
    }

    fn check_sanity(&self) {
        if !self.sanity_check {
            return;
        }

        assert!(self.len <= self.capacity(),
            "buffer went insane: len={} capacity={}", self.len, self.capacity());

        assert!(self.spare().iter().all(|&b| b == 0),
            "buffer went insane: non-zero bytes past len={}", self.len);
    }
}

/// Doubles `capacity` until `required` fits. A zero capacity starts from one
/// so the loop always makes progress, and doubling past `usize::MAX` settles
/// on exactly `required`.
fn inflated_capacity(capacity: usize, required: usize) -> usize {
    let mut capacity = capacity.max(1);

    while capacity < required {
        capacity = capacity.checked_mul(2).unwrap_or(required);
    }

    capacity
}

/// Bounded writer over the leftover space. Once a write no longer fits, the
/// bytes written so far are copied into `spill` and all further output goes
/// there, so `spill` always holds the complete output when present.
struct Probe<'a> {
    space: &'a mut [u8],
    written: usize,
    spill: Option<Vec<u8>>,
    spill_error: Option<AllocError>,
}

impl<'a> Probe<'a> {
    fn new(space: &'a mut [u8]) -> Self {
        Probe { space, written: 0, spill: None, spill_error: None }
    }

    fn spill_str(&mut self, s: &str) -> Result<(), TryReserveError> {
        if self.spill.is_none() {
            let mut spill = Vec::new();
            spill.try_reserve(self.written + s.len())?;
            spill.extend_from_slice(&self.space[..self.written]);
            self.spill = Some(spill);
        }

        if let Some(spill) = &mut self.spill {
            spill.try_reserve(s.len())?;
            spill.extend_from_slice(s.as_bytes());
        }

        Ok(())
    }
}

impl fmt::Write for Probe<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.space.len() - self.written;

        if self.spill.is_none() && s.len() <= room {
            let end = self.written + s.len();
            self.space[self.written..end].copy_from_slice(s.as_bytes());
            self.written = end;
            return Ok(());
        }

        self.spill_str(s).map_err(|_| {
            let spilled = self.spill.as_ref().map_or(self.written, Vec::len);
            self.spill_error = Some(AllocError {
                requested_bytes: spilled.saturating_add(s.len()),
            });
            fmt::Error
        })
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append_str(s).map_err(|_| fmt::Error)
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append_bytes(buf)
            .map_err(|err| io::Error::new(io::ErrorKind::OutOfMemory, err))?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::append;

    fn limited(initial_capacity: usize, max_capacity: usize) -> Buffer {
        Buffer::with_config(&BufferConfig {
            initial_capacity,
            max_capacity: Some(max_capacity),
            sanity_check: true,
        }).unwrap()
    }

    struct Failing;

    impl fmt::Display for Failing {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(Buffer::new(0).err(), Some(CreateError::InvalidCapacity));
    }

    #[test]
    fn initial_capacity_over_limit() {
        let config = BufferConfig {
            initial_capacity: 32,
            max_capacity: Some(16),
            sanity_check: true,
        };

        let err = Buffer::with_config(&config).err();
        assert_eq!(err, Some(CreateError::Alloc(AllocError { requested_bytes: 32 })));
    }

    #[test]
    fn new_buffer_is_empty_and_zeroed() {
        let buf = Buffer::new(16).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.leftover(), 16);
        assert_eq!(buf.as_bytes(), b"");
        assert!(buf.spare().iter().all(|&b| b == 0));
    }

    #[test]
    fn append_concatenates() {
        let mut buf = Buffer::new(8).unwrap();
        buf.append_str("foo").unwrap();
        buf.append_str("bar").unwrap();

        assert_eq!(buf.as_bytes(), b"foobar");
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.to_str(), Ok("foobar"));
    }

    #[test]
    fn append_exactly_filling_capacity_does_not_grow() {
        let mut buf = Buffer::new(4).unwrap();
        buf.append_str("abcd").unwrap();

        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.leftover(), 0);
    }

    #[test]
    fn growth_doubles_until_fit() {
        let mut buf = Buffer::new(4).unwrap();
        let text = "x".repeat(100);
        buf.append_str(&text).unwrap();

        assert_eq!(buf.capacity(), 128);
        assert_eq!(buf.as_bytes(), text.as_bytes());
        assert!(buf.spare().iter().all(|&b| b == 0));
    }

    #[test]
    fn growth_keeps_existing_content() {
        let mut buf = Buffer::new(2).unwrap();
        buf.append_str("ab").unwrap();
        buf.append_str("cde").unwrap();

        assert_eq!(buf.as_bytes(), b"abcde");
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn inflated_capacity_policy() {
        assert_eq!(inflated_capacity(4, 4), 4);
        assert_eq!(inflated_capacity(4, 5), 8);
        assert_eq!(inflated_capacity(3, 100), 192);
        assert_eq!(inflated_capacity(0, 5), 8);
        assert_eq!(inflated_capacity(0, 0), 1);
        assert_eq!(inflated_capacity(usize::MAX / 2 + 1, usize::MAX), usize::MAX);
    }

    #[test]
    fn clear_zeroes_whole_block() {
        let mut buf = Buffer::new(4).unwrap();
        buf.append_str("hello").unwrap();
        buf.clear();

        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 8);
        assert!(buf.spare().iter().all(|&b| b == 0));
    }

    #[test]
    fn clear_on_empty_buffer() {
        let mut buf = Buffer::new(4).unwrap();
        assert_eq!(buf.len(), 0);
        buf.clear();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 4);
    }

    #[test]
    fn failed_growth_leaves_buffer_unchanged() {
        let mut buf = limited(8, 16);
        buf.append_str("12345678").unwrap();

        let err = buf.append_str("0123456789").unwrap_err();
        assert_eq!(err, AppendError::Grow(AllocError { requested_bytes: 32 }));

        assert_eq!(buf.as_bytes(), b"12345678");
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn doubling_past_limit_fails() {
        // 12 bytes would fit under the limit but doubling asks for 16
        let mut buf = limited(8, 12);
        buf.append_str("abcdefgh").unwrap();

        assert!(buf.append_str("ijkl").is_err());
        assert_eq!(buf.as_bytes(), b"abcdefgh");
    }

    #[test]
    fn length_overflow_is_an_alloc_error() {
        let mut buf = Buffer::new(1).unwrap();
        buf.append_str("a").unwrap();

        let err = buf.reserve(usize::MAX).unwrap_err();
        assert_eq!(err, AllocError { requested_bytes: usize::MAX });
        assert_eq!(buf.as_bytes(), b"a");
    }

    #[test]
    fn reserve_grows_ahead_of_append() {
        let mut buf = Buffer::new(4).unwrap();
        buf.append_str("ab").unwrap();
        buf.reserve(10).unwrap();

        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.as_bytes(), b"ab");
    }

    #[test]
    fn formatted_append_in_place() {
        let mut buf = Buffer::new(32).unwrap();
        append!(buf, "{}-{}", 42, "x").unwrap();

        assert_eq!(buf.as_bytes(), b"42-x");
        assert_eq!(buf.capacity(), 32);
    }

    #[test]
    fn formatted_append_grows() {
        let mut buf = Buffer::new(1).unwrap();
        append!(buf, "{}-{}", 42, "x").unwrap();

        assert_eq!(buf.as_bytes(), b"42-x");
        assert_eq!(buf.capacity(), 4);
        assert!(buf.spare().is_empty());
    }

    #[test]
    fn formatted_append_after_existing_content() {
        let mut buf = Buffer::new(4).unwrap();
        buf.append_str("ab").unwrap();
        append!(buf, "[{:>5}]", 7).unwrap();

        assert_eq!(buf.as_bytes(), b"ab[    7]");
        assert_eq!(buf.capacity(), 16);
        assert!(buf.spare().iter().all(|&b| b == 0));
    }

    #[test]
    fn formatted_append_of_nothing() {
        let mut buf = Buffer::new(1).unwrap();
        append!(buf, "").unwrap();

        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 1);
    }

    #[test]
    fn format_error_leaves_buffer_unchanged() {
        let mut buf = Buffer::new(16).unwrap();
        buf.append_str("ok").unwrap();

        let err = append!(buf, "abc{}", Failing).unwrap_err();
        assert_eq!(err, AppendError::Format(fmt::Error));

        assert_eq!(buf.as_bytes(), b"ok");
        assert!(buf.spare().iter().all(|&b| b == 0));
    }

    #[test]
    fn format_error_after_spill() {
        let mut buf = Buffer::new(2).unwrap();

        let err = append!(buf, "abcdef{}", Failing).unwrap_err();
        assert!(matches!(err, AppendError::Format(_)));

        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 2);
        assert!(buf.spare().iter().all(|&b| b == 0));
    }

    #[test]
    fn failed_formatted_growth_leaves_buffer_unchanged() {
        let mut buf = limited(4, 4);

        let err = append!(buf, "{}", "hello world").unwrap_err();
        assert_eq!(err, AppendError::Grow(AllocError { requested_bytes: 16 }));

        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.spare(), b"\0\0\0\0");
    }

    #[test]
    fn fmt_write_appends() {
        use core::fmt::Write as _;

        let mut buf = Buffer::new(2).unwrap();
        write!(buf, "{}+{}={}", 1, 2, 3).unwrap();

        assert_eq!(buf.as_bytes(), b"1+2=3");
    }

    #[test]
    fn io_write_appends_bytes() {
        use std::io::Write as _;

        let mut buf = Buffer::new(2).unwrap();
        buf.write_all(&[0xff, 0x00, 0x7f]).unwrap();

        assert_eq!(buf.as_bytes(), &[0xff, 0x00, 0x7f]);
        assert!(buf.to_str().is_err());
    }

    #[test]
    fn io_write_reports_out_of_memory() {
        use std::io::Write as _;

        let mut buf = limited(2, 2);
        let err = buf.write_all(b"abc").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::OutOfMemory);
        assert!(buf.is_empty());
    }

    #[test]
    fn debug_shows_len_and_capacity() {
        let mut buf = Buffer::new(4).unwrap();
        buf.append_str("hi").unwrap();

        assert_eq!(format!("{buf:?}"), "Buffer { len = 2; capacity = 4; [68, 69] }");
    }
}
