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

//! The GPU-facing replay target.

use crate::geometry::{BarrierStage, IndexBufferView, PrimitiveType, Primitives, VertexBufferView};
use crate::ids::{BufferViewId, ProgramId, VertexLayoutId};
use crate::program::ShaderProgram;

/// The interface a render queue is replayed against.
///
/// Replay is the sole caller: it walks the merged render queue front to back
/// on one thread and issues each block's work through these methods. All
/// parameter state for a draw or dispatch has already been applied to the
/// program (via [`RenderView::program_mut`] and the stream decoder) by the
/// time the issuing call arrives.
pub trait RenderView {
    /// Resolves a program handle to its parameter sink.
    ///
    /// Returning `None` means the program is not (or no longer) available;
    /// the block referencing it is skipped.
    fn program_mut(&mut self, program: ProgramId) -> Option<&mut dyn ShaderProgram>;

    /// Issues a non-indexed draw.
    fn draw(
        &mut self,
        program: ProgramId,
        vertex_buffer: VertexBufferView,
        vertex_layout: VertexLayoutId,
        primitives: Primitives,
    );

    /// Issues an indexed draw.
    fn draw_indexed(
        &mut self,
        program: ProgramId,
        vertex_buffer: VertexBufferView,
        vertex_layout: VertexLayoutId,
        index_buffer: IndexBufferView,
        primitives: Primitives,
    );

    /// Issues an instanced draw, indexed if `index_buffer` is present.
    #[allow(clippy::too_many_arguments)]
    fn draw_instanced(
        &mut self,
        program: ProgramId,
        vertex_buffer: VertexBufferView,
        vertex_layout: VertexLayoutId,
        index_buffer: Option<IndexBufferView>,
        primitives: Primitives,
        instance_count: u32,
    );

    /// Issues a GPU-driven draw whose arguments live in `args`.
    fn draw_indirect(
        &mut self,
        program: ProgramId,
        primitive: PrimitiveType,
        args: BufferViewId,
        draw_count: u32,
    );

    /// Dispatches a compute program over `work_size` workgroups.
    fn dispatch(&mut self, program: ProgramId, work_size: [u32; 3]);

    /// Inserts a stage-to-stage execution/memory barrier.
    fn barrier(&mut self, from: BarrierStage, to: BarrierStage);
}
