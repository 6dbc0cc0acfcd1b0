// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The frame arena: a fixed-capacity bump allocator with bulk reset.
//!
//! Everything recorded during one frame — render blocks and encoded
//! parameter streams — lives in this heap. The cursor only moves forward;
//! the single "free" operation is [`FrameArena::reset`], which reclaims the
//! whole frame at once and invalidates every slot handed out since the last
//! reset.
//!
//! Allocation returns *offsets* ([`ArenaSlot`]), never long-lived
//! references, so queues can keep handles to blocks while producers continue
//! to allocate. Arena residents are bounded by `Copy`: the compiler-checked
//! form of "needs no destructor", which is what makes never-destructing
//! bulk reclamation sound.

use crate::error::{fatal, RenderError};
use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Alignment of the arena base. No arena resident may require more.
const BASE_ALIGN: usize = 16;

/// A typed offset into a [`FrameArena`], valid until the next `reset`.
///
/// Slots are `Copy` and carry the frame epoch they were allocated in;
/// dereferencing a slot after the arena has been reset is a programmer
/// error, caught by a debug assertion.
pub struct ArenaSlot<T> {
    offset: u32,
    epoch: u32,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Clone for ArenaSlot<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaSlot<T> {}

impl<T> std::fmt::Debug for ArenaSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaSlot")
            .field("offset", &self.offset)
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl<T> ArenaSlot<T> {
    /// Byte offset of the value inside the arena.
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// A fixed-capacity byte heap with a monotonically advancing cursor.
pub struct FrameArena {
    data: NonNull<u8>,
    capacity: usize,
    cursor: usize,
    epoch: u32,
    high_water: usize,
    allocations: u64,
}

// The arena is exclusively owned by one render context; the raw pointer is
// never aliased across threads.
unsafe impl Send for FrameArena {}

impl FrameArena {
    /// Creates an arena of `capacity` bytes, zero-initialized.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the backing allocation fails.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame arena capacity must be non-zero");
        let layout = Layout::from_size_align(capacity, BASE_ALIGN)
            .expect("frame arena capacity overflows a Layout");
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc_zeroed(layout) };
        let Some(data) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };
        Self {
            data,
            capacity,
            cursor: 0,
            epoch: 0,
            high_water: 0,
            allocations: 0,
        }
    }

    /// Bump-allocates `size` bytes at `align`, returning the offset.
    ///
    /// This is the fallible inner path; the recording surface wraps it with
    /// the fatal policy.
    pub fn try_alloc(&mut self, size: usize, align: usize) -> Result<u32, RenderError> {
        debug_assert!(align.is_power_of_two() && align <= BASE_ALIGN);
        let offset = align_up(self.cursor, align);
        let end = match offset.checked_add(size) {
            Some(end) if end <= self.capacity => end,
            _ => {
                return Err(RenderError::CapacityExceeded {
                    requested: size,
                    remaining: self.capacity - self.cursor,
                    capacity: self.capacity,
                });
            }
        };
        self.cursor = end;
        self.note_allocation();
        Ok(offset as u32)
    }

    /// Bump-allocates `size` bytes at `align`. Exhaustion is fatal.
    pub fn alloc(&mut self, size: usize, align: usize) -> u32 {
        match self.try_alloc(size, align) {
            Ok(offset) => offset,
            Err(error) => fatal(error),
        }
    }

    /// Allocates and writes `value`, returning a typed slot.
    pub fn try_alloc_value<T: Copy>(&mut self, value: T) -> Result<ArenaSlot<T>, RenderError> {
        const { assert!(std::mem::align_of::<T>() <= BASE_ALIGN) };
        let offset = self.try_alloc(std::mem::size_of::<T>(), std::mem::align_of::<T>())?;
        // SAFETY: the offset is in bounds, aligned for T, and exclusively
        // ours until the value is committed.
        unsafe {
            self.data
                .as_ptr()
                .add(offset as usize)
                .cast::<T>()
                .write(value);
        }
        Ok(ArenaSlot {
            offset,
            epoch: self.epoch,
            _ty: PhantomData,
        })
    }

    /// Allocates and writes `value`. Exhaustion is fatal.
    pub fn alloc_value<T: Copy>(&mut self, value: T) -> ArenaSlot<T> {
        match self.try_alloc_value(value) {
            Ok(slot) => slot,
            Err(error) => fatal(error),
        }
    }

    /// Reads the value a slot refers to.
    pub fn get<T: Copy>(&self, slot: ArenaSlot<T>) -> T {
        debug_assert!(
            slot.epoch == self.epoch,
            "{}",
            RenderError::StaleSlot {
                slot_epoch: slot.epoch,
                arena_epoch: self.epoch,
            }
        );
        let offset = slot.offset as usize;
        assert!(offset + std::mem::size_of::<T>() <= self.cursor);
        // SAFETY: bounds asserted above; alignment guaranteed by allocation.
        unsafe { self.data.as_ptr().add(offset).cast::<T>().read() }
    }

    /// Returns the committed bytes in `[first, last)`.
    pub fn bytes(&self, first: u32, last: u32) -> &[u8] {
        let (first, last) = (first as usize, last as usize);
        assert!(first <= last && last <= self.cursor);
        // SAFETY: in bounds, and the arena was zero-initialized so every
        // byte is initialized.
        unsafe { std::slice::from_raw_parts(self.data.as_ptr().add(first), last - first) }
    }

    /// Writes bytes beyond the committed cursor without advancing it.
    ///
    /// Used by the parameter encoder's two-phase commit: entries are written
    /// speculatively as setters run, and [`commit_to`](Self::commit_to)
    /// folds them into a single allocation once the stream is sealed.
    pub(crate) fn speculative_write(&mut self, at: usize, bytes: &[u8]) -> Result<(), RenderError> {
        debug_assert!(at >= self.cursor);
        if at + bytes.len() > self.capacity {
            return Err(RenderError::CapacityExceeded {
                requested: bytes.len(),
                remaining: self.capacity.saturating_sub(at),
                capacity: self.capacity,
            });
        }
        // SAFETY: in bounds; the region above the cursor belongs to at most
        // one live writer.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.data.as_ptr().add(at), bytes.len());
        }
        Ok(())
    }

    /// Commits speculative writes by advancing the cursor to `end`.
    pub(crate) fn commit_to(&mut self, end: usize) {
        debug_assert!(end >= self.cursor && end <= self.capacity);
        self.cursor = end;
        self.note_allocation();
    }

    /// Rewinds the cursor to the base and starts a new frame epoch,
    /// invalidating every slot and span handed out since the last reset.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.allocations = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Bytes currently committed this frame.
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes still unallocated this frame.
    pub fn remaining(&self) -> usize {
        self.capacity - self.cursor
    }

    /// Highest cursor position seen over the arena's lifetime.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Number of committed allocations this frame.
    pub fn allocation_count(&self) -> u64 {
        self.allocations
    }

    /// The current frame epoch.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    fn note_allocation(&mut self) {
        self.allocations += 1;
        if self.cursor > self.high_water {
            self.high_water = self.cursor;
        }
    }
}

impl Drop for FrameArena {
    fn drop(&mut self) {
        let layout = Layout::from_size_align(self.capacity, BASE_ALIGN)
            .expect("layout was validated at construction");
        // SAFETY: allocated in `new` with the identical layout.
        unsafe { dealloc(self.data.as_ptr(), layout) };
    }
}

impl std::fmt::Debug for FrameArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameArena")
            .field("capacity", &self.capacity)
            .field("cursor", &self.cursor)
            .field("epoch", &self.epoch)
            .field("high_water", &self.high_water)
            .finish()
    }
}

#[inline]
fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
