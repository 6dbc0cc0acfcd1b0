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

//! Interned shader-parameter handles.
//!
//! Producers identify shader inputs by name ("World", "Eye",
//! "Terrain_Heightfield", ...) but the encoded parameter stream stores a
//! 16-bit handle. The [`HandleRegistry`] owns that mapping. It is created
//! explicitly by whoever owns the renderer — there are no global tables and
//! no static-initialization-order dependencies — and can be freely
//! instantiated in tests.

use ahash::AHashMap;

/// A 16-bit interned identifier for one shader input.
///
/// Handles are only meaningful relative to the [`HandleRegistry`] that
/// produced them. The encoded parameter stream stores handles verbatim, so
/// encoder and decoder must share a registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterHandle(pub u16);

impl ParameterHandle {
    /// A handle value never returned by a registry. Used by stream entries
    /// that address the program itself rather than a named input
    /// (stencil reference, attached child streams).
    pub const INVALID: Self = Self(u16::MAX);
}

/// An explicit name → [`ParameterHandle`] interning table.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    names: AHashMap<String, ParameterHandle>,
    by_handle: Vec<String>,
}

impl HandleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `name`, interning it on first use.
    ///
    /// # Panics
    ///
    /// Panics if more than `u16::MAX - 1` distinct names are interned; a
    /// renderer uses a few hundred at most, so this indicates a leak of
    /// generated names.
    pub fn handle(&mut self, name: &str) -> ParameterHandle {
        if let Some(&handle) = self.names.get(name) {
            return handle;
        }
        let index = self.by_handle.len();
        assert!(
            index < ParameterHandle::INVALID.0 as usize,
            "parameter handle space exhausted while interning `{name}`"
        );
        let handle = ParameterHandle(index as u16);
        log::trace!("interned parameter \"{name}\" as handle {index}");
        self.names.insert(name.to_owned(), handle);
        self.by_handle.push(name.to_owned());
        handle
    }

    /// Looks up an already-interned name without interning it.
    pub fn get(&self, name: &str) -> Option<ParameterHandle> {
        self.names.get(name).copied()
    }

    /// Returns the name a handle was interned under, for diagnostics.
    pub fn name(&self, handle: ParameterHandle) -> Option<&str> {
        self.by_handle.get(handle.0 as usize).map(String::as_str)
    }

    /// Number of interned names.
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut registry = HandleRegistry::new();
        let world = registry.handle("World");
        let eye = registry.handle("Eye");
        assert_ne!(world, eye);
        assert_eq!(registry.handle("World"), world);
        assert_eq!(registry.get("Eye"), Some(eye));
        assert_eq!(registry.get("Missing"), None);
        assert_eq!(registry.name(world), Some("World"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn invalid_handle_is_reserved() {
        let registry = HandleRegistry::new();
        assert_eq!(registry.name(ParameterHandle::INVALID), None);
    }
}
