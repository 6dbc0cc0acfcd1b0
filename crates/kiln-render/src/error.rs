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

//! Error types for the deferred command pipeline.
//!
//! Fallible internals (`try_alloc` and friends) return these; the public
//! recording surface treats them as fatal, because submitting a partially
//! recorded frame to the GPU is worse than crashing deterministically.

/// Errors that can occur while recording or replaying a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The frame arena has no room for the requested allocation. The arena
    /// never grows: resizing would invalidate previously returned slots.
    #[error(
        "frame arena capacity exceeded: requested {requested} bytes with {remaining} of {capacity} remaining"
    )]
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Bytes still unallocated at the time of the request.
        remaining: usize,
        /// Total arena capacity.
        capacity: usize,
    },

    /// An operation was called outside the Building → Merging → Replaying
    /// sequence.
    #[error("`{operation}` called while the render context is {state}")]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the context was in.
        state: &'static str,
    },

    /// An arena slot from a frame that has since been reset was dereferenced.
    #[error("arena slot from frame epoch {slot_epoch} used in epoch {arena_epoch}")]
    StaleSlot {
        /// Epoch recorded in the slot.
        slot_epoch: u32,
        /// The arena's current epoch.
        arena_epoch: u32,
    },
}

/// Aborts on an unrecoverable error.
///
/// Fatal conditions are never caught or retried; the panic is deterministic
/// and carries the full error text.
#[cold]
pub(crate) fn fatal(error: RenderError) -> ! {
    log::error!("fatal render error: {error}");
    panic!("{error}");
}
