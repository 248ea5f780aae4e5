//! Fixed-capacity allocation pools with free-list semantics.
//!
//! Both the inode table and the data-block pool are instances of [`Pool`]:
//! a fixed number of slots, a parallel occupancy bitmap, and first-fit
//! allocation over that bitmap. Allocation order is an implementation
//! detail; callers must not depend on anything beyond "the smallest free
//! index wins".

use bit_field::BitField;
use log::trace;

use crate::error::{FsError, Result};

const WORD_BITS: usize = 64;

/// A packed occupancy bitmap, one bit per pool slot.
#[derive(Debug, Clone)]
struct Bitmap {
    words: Vec<u64>,
    len: usize,
}

impl Bitmap {
    fn new(len: usize) -> Self {
        let word_count = (len + WORD_BITS - 1) / WORD_BITS;
        Bitmap {
            words: vec![0; word_count],
            len,
        }
    }

    fn is_set(&self, i: usize) -> bool {
        self.words[i / WORD_BITS].get_bit(i % WORD_BITS)
    }

    fn set(&mut self, i: usize, value: bool) {
        self.words[i / WORD_BITS].set_bit(i % WORD_BITS, value);
    }

    /// Index of the lowest unset bit, if any.
    fn first_unset(&self) -> Option<usize> {
        (0..self.len).find(|&i| !self.is_set(i))
    }
}

/// A fixed-capacity pool of slots of type `T`, with free-list semantics
/// driven by an occupancy [`Bitmap`].
#[derive(Debug)]
pub struct Pool<T> {
    occupied: Bitmap,
    slots: Vec<Option<T>>,
    name: &'static str,
}

impl<T> Pool<T> {
    /// Create a pool with `capacity` slots, all initially free.
    pub fn new(capacity: usize, name: &'static str) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Pool {
            occupied: Bitmap::new(capacity),
            slots,
            name,
        }
    }

    /// Total number of slots in this pool.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Reserve the smallest free index, store `value` in it, and return the
    /// index. Fails with [`FsError::OutOfSpace`] if every slot is occupied.
    pub fn alloc(&mut self, value: T) -> Result<usize> {
        let i = self.occupied.first_unset().ok_or(FsError::OutOfSpace)?;
        self.occupied.set(i, true);
        self.slots[i] = Some(value);
        trace!("{}: allocated slot {}", self.name, i);
        Ok(i)
    }

    /// Mark slot `i` free, returning its previous contents. The index may be
    /// reused by a later `alloc` call.
    pub fn free(&mut self, i: usize) -> Result<T> {
        if i >= self.capacity() || !self.occupied.is_set(i) {
            return Err(FsError::NotFound);
        }
        self.occupied.set(i, false);
        trace!("{}: freed slot {}", self.name, i);
        Ok(self.slots[i].take().expect("bitmap/slots out of sync"))
    }

    /// Borrow the occupant of slot `i`.
    pub fn get(&self, i: usize) -> Result<&T> {
        if i >= self.capacity() || !self.occupied.is_set(i) {
            return Err(FsError::NotFound);
        }
        Ok(self.slots[i].as_ref().expect("bitmap/slots out of sync"))
    }

    /// Mutably borrow the occupant of slot `i`.
    pub fn get_mut(&mut self, i: usize) -> Result<&mut T> {
        if i >= self.capacity() || !self.occupied.is_set(i) {
            return Err(FsError::NotFound);
        }
        Ok(self.slots[i].as_mut().expect("bitmap/slots out of sync"))
    }

    /// Whether slot `i` is currently occupied.
    pub fn is_occupied(&self, i: usize) -> bool {
        i < self.capacity() && self.occupied.is_set(i)
    }
}
