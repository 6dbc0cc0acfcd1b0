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

//! Opaque, non-owning handles to GPU resources held in external tables.
//!
//! Render blocks never own the resources they reference; they carry one of
//! these IDs and the owning subsystem guarantees the resource outlives the
//! frame in which the block executes. Backends map each ID to their native
//! object when the command is replayed.

/// An opaque handle to a compiled shader program.
///
/// Resolved to a [`crate::ShaderProgram`] by the [`crate::RenderView`] when a
/// recorded parameter stream is decoded during replay.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u64);

/// An opaque handle to a view over a GPU buffer (vertex, index, storage,
/// or indirect-argument data).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferViewId(pub u64);

/// An opaque handle to a sampled texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// An opaque handle to a storage-image view (read/write access from
/// compute shaders).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageViewId(pub u64);

/// An opaque handle to a vertex input layout description.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexLayoutId(pub u64);
