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

//! Geometry and pipeline-stage descriptions carried by render blocks.

use crate::ids::BufferViewId;

/// The primitive topology of a draw call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// A list of independent points.
    Points,
    /// A list of independent line segments.
    Lines,
    /// A connected strip of line segments.
    LineStrip,
    /// A list of independent triangles.
    Triangles,
    /// A connected strip of triangles.
    TriangleStrip,
}

/// A primitive range within the bound geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Primitives {
    /// Primitive topology.
    pub ty: PrimitiveType,
    /// First vertex (non-indexed) or first index (indexed).
    pub offset: u32,
    /// Number of primitives to draw.
    pub count: u32,
}

impl Primitives {
    /// Creates a primitive range.
    pub const fn new(ty: PrimitiveType, offset: u32, count: u32) -> Self {
        Self { ty, offset, count }
    }

    /// A range of `count` triangles starting at `offset`.
    pub const fn triangles(offset: u32, count: u32) -> Self {
        Self::new(PrimitiveType::Triangles, offset, count)
    }
}

/// The element width of an index buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// 16-bit indices.
    UInt16,
    /// 32-bit indices.
    UInt32,
}

/// A non-owning view over vertex data in an externally held buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexBufferView {
    /// The buffer holding the vertex data.
    pub buffer: BufferViewId,
    /// Byte offset of the first vertex.
    pub offset: u64,
    /// Byte stride between consecutive vertices.
    pub stride: u32,
}

/// A non-owning view over index data in an externally held buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IndexBufferView {
    /// The buffer holding the index data.
    pub buffer: BufferViewId,
    /// Byte offset of the first index.
    pub offset: u64,
    /// Element width of the indices.
    pub index_type: IndexType,
}

/// A pipeline stage participating in a GPU barrier.
///
/// A barrier block expresses a stage-to-stage hazard, e.g. a compute write
/// that must be visible before a vertex fetch reads the same buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BarrierStage {
    /// Compute shader execution.
    Compute,
    /// Vertex fetch and vertex shader execution.
    Vertex,
    /// Fragment shader execution.
    Fragment,
    /// Indirect-argument consumption by the command processor.
    Indirect,
}
