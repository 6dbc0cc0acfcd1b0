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

//! Double-buffered producer state.
//!
//! Producers that compute frame data on worker threads keep two copies of
//! that data: the one the render thread reads for the current frame, and the
//! one being written for the next. [`PingPong::swap`] is called exactly once
//! per frame at a well-defined point, so a writer filling `next` can never
//! race a reader of `current` within the same frame.

/// A two-slot buffer with a `current`/`next` role that flips on [`swap`].
///
/// [`swap`]: PingPong::swap
#[derive(Debug, Default)]
pub struct PingPong<T> {
    slots: [T; 2],
    current: usize,
}

impl<T> PingPong<T> {
    /// Creates a buffer from its two initial slot values; `current` starts
    /// in the first.
    pub fn new(current: T, next: T) -> Self {
        Self {
            slots: [current, next],
            current: 0,
        }
    }

    /// The slot the render thread reads this frame.
    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    /// The slot producers write for the next frame.
    pub fn next_mut(&mut self) -> &mut T {
        &mut self.slots[self.current ^ 1]
    }

    /// Borrows both roles at once, for producers that read the current
    /// frame's state while building the next (e.g. motion vectors).
    pub fn split_mut(&mut self) -> (&T, &mut T) {
        let (a, b) = self.slots.split_at_mut(1);
        if self.current == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    /// Flips the roles. Call once per frame, after replay and before any
    /// producer starts writing the new `next`.
    pub fn swap(&mut self) {
        self.current ^= 1;
    }
}
