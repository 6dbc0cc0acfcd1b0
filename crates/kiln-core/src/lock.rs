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

//! CPU/GPU buffer-access discipline.
//!
//! GPU-visible buffers alternate between exclusive CPU write access
//! (`lock`..`unlock`) and GPU-exclusive access (everything else). The
//! discipline is a producer-side convention, not a mutex: [`LockFlag`] only
//! asserts that the convention holds, it does not block.

use std::sync::atomic::{AtomicBool, Ordering};

/// An assertion-backed flag tracking whether a buffer is currently
/// CPU-locked.
///
/// Owning subsystems embed one flag per GPU-visible buffer. `lock` and
/// `unlock` panic on double-lock/double-unlock in all builds; the check is
/// two atomic operations, cheap enough to keep on.
#[derive(Debug, Default)]
pub struct LockFlag(AtomicBool);

impl LockFlag {
    /// Creates an unlocked flag.
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Marks the buffer CPU-locked.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is already locked.
    pub fn lock(&self) {
        let was_locked = self.0.swap(true, Ordering::AcqRel);
        assert!(!was_locked, "buffer locked while already CPU-locked");
    }

    /// Hands the buffer back to GPU-exclusive access.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is not locked.
    pub fn unlock(&self) {
        let was_locked = self.0.swap(false, Ordering::AcqRel);
        assert!(was_locked, "buffer unlocked without a matching lock");
    }

    /// Whether the buffer is currently CPU-locked.
    pub fn is_locked(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_unlock_round_trip() {
        let flag = LockFlag::new();
        assert!(!flag.is_locked());
        flag.lock();
        assert!(flag.is_locked());
        flag.unlock();
        assert!(!flag.is_locked());
    }

    #[test]
    #[should_panic(expected = "already CPU-locked")]
    fn double_lock_panics() {
        let flag = LockFlag::new();
        flag.lock();
        flag.lock();
    }

    #[test]
    #[should_panic(expected = "without a matching lock")]
    fn unlock_without_lock_panics() {
        let flag = LockFlag::new();
        flag.unlock();
    }
}
