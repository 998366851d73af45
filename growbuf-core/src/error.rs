use core::fmt;

use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("failed to allocate {requested_bytes} bytes")]
pub struct AllocError {
    pub requested_bytes: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum CreateError {
    #[error("initial capacity must be non-zero")]
    InvalidCapacity,
    #[error("allocating buffer: {0}")]
    Alloc(#[from] AllocError),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum AppendError {
    #[error("growing buffer: {0}")]
    Grow(#[from] AllocError),
    #[error("formatting arguments: {0}")]
    Format(#[from] fmt::Error),
}
