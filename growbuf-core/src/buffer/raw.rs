extern crate alloc;

use alloc::boxed::Box;
use core::ops::Range;

use derive_more::{Deref, DerefMut};

use crate::error::AllocError;

/// Owned, zero-initialised backing block. Its length is the buffer capacity.
#[repr(transparent)]
#[derive(Deref, DerefMut)]
#[deref(forward)]
#[deref_mut(forward)]
pub struct Block(Box<[u8]>);

impl Block {
    pub fn alloc_zeroed(len: usize, limit: Option<usize>) -> Result<Self, AllocError> {
        let err = AllocError { requested_bytes: len };

        if limit.is_some_and(|limit| len > limit) {
            return Err(err);
        }

        let bytes = bytemuck::allocation::try_zeroed_slice_box(len)
            .map_err(|()| err)?;

        Ok(Block(bytes))
    }

    /// Allocates a fresh zeroed block of `len` bytes holding a copy of the
    /// first `keep` bytes of this one. `self` is not touched, so a failed
    /// reallocation leaves the original contents intact.
    pub fn realloc_zeroed(&self, len: usize, keep: usize, limit: Option<usize>) -> Result<Self, AllocError> {
        debug_assert!(keep <= self.len() && keep <= len);

        let mut block = Block::alloc_zeroed(len, limit)?;
        block[..keep].copy_from_slice(&self[..keep]);
        Ok(block)
    }

    pub fn zero(&mut self, range: Range<usize>) {
        self[range].fill(0);
    }
}
