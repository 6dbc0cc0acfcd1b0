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

//! Render blocks: polymorphic, arena-allocated units of deferred GPU work.
//!
//! A block owns nothing. It references externally held GPU objects through
//! opaque IDs and its parameters through a [`ParameterBlock`] span; every
//! resource it points at must outlive the frame in which it executes. All
//! variants are `Copy`, which is what allows them to live in the frame arena
//! and be reclaimed in bulk without destructors.

use crate::arena::FrameArena;
use crate::params::ParameterBlock;
use kiln_core::{
    BarrierStage, BufferViewId, IndexBufferView, PrimitiveType, Primitives, ProgramId, RenderView,
    VertexBufferView, VertexLayoutId,
};

/// Index into the render context's side table of host callbacks.
///
/// Callback closures capture arbitrary state and therefore live on the
/// normal heap, not in the arena; the block carries only this index.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallbackId(pub(crate) u32);

/// A host callback invoked with the render view during replay.
pub type RenderCallback = Box<dyn FnMut(&mut dyn RenderView) + Send>;

/// A non-indexed draw.
#[derive(Debug, Copy, Clone)]
pub struct DrawBlock {
    /// Sort key within a priority bucket.
    pub distance: f32,
    /// The program to draw with.
    pub program: ProgramId,
    /// Parameters decoded onto the program just before the draw is issued.
    pub params: Option<ParameterBlock>,
    /// The vertex data.
    pub vertex_buffer: VertexBufferView,
    /// The vertex input layout.
    pub vertex_layout: VertexLayoutId,
    /// The primitive range to draw.
    pub primitives: Primitives,
}

/// An indexed draw.
#[derive(Debug, Copy, Clone)]
pub struct IndexedDrawBlock {
    /// Sort key within a priority bucket.
    pub distance: f32,
    /// The program to draw with.
    pub program: ProgramId,
    /// Parameters decoded onto the program just before the draw is issued.
    pub params: Option<ParameterBlock>,
    /// The vertex data.
    pub vertex_buffer: VertexBufferView,
    /// The vertex input layout.
    pub vertex_layout: VertexLayoutId,
    /// The index data.
    pub index_buffer: IndexBufferView,
    /// The primitive range to draw.
    pub primitives: Primitives,
}

/// An instanced draw, indexed when `index_buffer` is present.
#[derive(Debug, Copy, Clone)]
pub struct InstancedDrawBlock {
    /// Sort key within a priority bucket.
    pub distance: f32,
    /// The program to draw with.
    pub program: ProgramId,
    /// Parameters decoded onto the program just before the draw is issued.
    pub params: Option<ParameterBlock>,
    /// The vertex data.
    pub vertex_buffer: VertexBufferView,
    /// The vertex input layout.
    pub vertex_layout: VertexLayoutId,
    /// Index data, when drawing indexed instances.
    pub index_buffer: Option<IndexBufferView>,
    /// The primitive range drawn per instance.
    pub primitives: Primitives,
    /// Number of instances.
    pub instance_count: u32,
}

/// A GPU-driven draw whose count and arguments live in a buffer written by
/// an earlier compute dispatch.
#[derive(Debug, Copy, Clone)]
pub struct IndirectDrawBlock {
    /// Sort key within a priority bucket.
    pub distance: f32,
    /// The program to draw with.
    pub program: ProgramId,
    /// Parameters decoded onto the program just before the draw is issued.
    pub params: Option<ParameterBlock>,
    /// Primitive topology of the indirect draws.
    pub primitive: PrimitiveType,
    /// The buffer holding packed draw arguments.
    pub args: BufferViewId,
    /// Number of packed argument records to consume.
    pub draw_count: u32,
}

/// A compute dispatch.
#[derive(Debug, Copy, Clone)]
pub struct ComputeBlock {
    /// The compute program.
    pub program: ProgramId,
    /// Parameters decoded onto the program just before the dispatch.
    pub params: Option<ParameterBlock>,
    /// Workgroup counts in up to three dimensions.
    pub work_size: [u32; 3],
}

/// A stage-to-stage dependency the backend must resolve before proceeding,
/// e.g. a compute write that a later vertex fetch reads.
#[derive(Debug, Copy, Clone)]
pub struct BarrierBlock {
    /// The producing stage.
    pub from: BarrierStage,
    /// The consuming stage.
    pub to: BarrierStage,
}

/// A host callback, for work that fits neither the draw nor the compute
/// shape (cross-resource copies, readbacks, ...).
#[derive(Debug, Copy, Clone)]
pub struct CallbackBlock {
    /// Index of the closure in the context's callback table.
    pub callback: CallbackId,
}

/// One unit of deferred GPU work. A closed sum over the materially
/// different command payloads.
#[derive(Debug, Copy, Clone)]
pub enum RenderBlock {
    /// Non-indexed draw.
    Draw(DrawBlock),
    /// Indexed draw.
    IndexedDraw(IndexedDrawBlock),
    /// Instanced (optionally indexed) draw.
    InstancedDraw(InstancedDrawBlock),
    /// GPU-driven indirect draw.
    IndirectDraw(IndirectDrawBlock),
    /// Compute dispatch.
    Compute(ComputeBlock),
    /// Stage-to-stage barrier.
    Barrier(BarrierBlock),
    /// Host callback.
    Callback(CallbackBlock),
}

impl RenderBlock {
    /// The block's sort key. Non-drawable blocks sort as distance zero.
    pub fn distance(&self) -> f32 {
        match self {
            RenderBlock::Draw(b) => b.distance,
            RenderBlock::IndexedDraw(b) => b.distance,
            RenderBlock::InstancedDraw(b) => b.distance,
            RenderBlock::IndirectDraw(b) => b.distance,
            RenderBlock::Compute(_) | RenderBlock::Barrier(_) | RenderBlock::Callback(_) => 0.0,
        }
    }

    /// Whether the block belongs in a draw queue lane.
    pub fn is_drawable(&self) -> bool {
        matches!(
            self,
            RenderBlock::Draw(_)
                | RenderBlock::IndexedDraw(_)
                | RenderBlock::InstancedDraw(_)
                | RenderBlock::IndirectDraw(_)
                | RenderBlock::Callback(_)
        )
    }

    /// Whether the block belongs in the compute queue.
    pub fn is_computable(&self) -> bool {
        matches!(
            self,
            RenderBlock::Compute(_) | RenderBlock::Barrier(_) | RenderBlock::Callback(_)
        )
    }

    /// Executes the block against `view`, decoding its parameter stream
    /// onto the resolved program first.
    ///
    /// A program the view can no longer resolve skips the block; the object
    /// silently doesn't render this frame rather than bringing the frame
    /// down.
    pub(crate) fn execute(
        &self,
        arena: &FrameArena,
        callbacks: &mut [RenderCallback],
        view: &mut dyn RenderView,
    ) {
        match *self {
            RenderBlock::Draw(b) => {
                if apply_params(arena, view, b.program, b.params) {
                    view.draw(b.program, b.vertex_buffer, b.vertex_layout, b.primitives);
                }
            }
            RenderBlock::IndexedDraw(b) => {
                if apply_params(arena, view, b.program, b.params) {
                    view.draw_indexed(
                        b.program,
                        b.vertex_buffer,
                        b.vertex_layout,
                        b.index_buffer,
                        b.primitives,
                    );
                }
            }
            RenderBlock::InstancedDraw(b) => {
                if apply_params(arena, view, b.program, b.params) {
                    view.draw_instanced(
                        b.program,
                        b.vertex_buffer,
                        b.vertex_layout,
                        b.index_buffer,
                        b.primitives,
                        b.instance_count,
                    );
                }
            }
            RenderBlock::IndirectDraw(b) => {
                if apply_params(arena, view, b.program, b.params) {
                    view.draw_indirect(b.program, b.primitive, b.args, b.draw_count);
                }
            }
            RenderBlock::Compute(b) => {
                if apply_params(arena, view, b.program, b.params) {
                    view.dispatch(b.program, b.work_size);
                }
            }
            RenderBlock::Barrier(b) => view.barrier(b.from, b.to),
            RenderBlock::Callback(b) => {
                let callback = &mut callbacks[b.callback.0 as usize];
                callback(view);
            }
        }
    }
}

/// Decodes `params` onto the block's program. Returns `false` when the view
/// cannot resolve the program, in which case the block is skipped.
fn apply_params(
    arena: &FrameArena,
    view: &mut dyn RenderView,
    program: ProgramId,
    params: Option<ParameterBlock>,
) -> bool {
    let Some(target) = view.program_mut(program) else {
        log::debug!("program {program:?} unavailable at replay; block skipped");
        return false;
    };
    if let Some(params) = params {
        params.fixup(arena, target);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_lane_classification() {
        let barrier = RenderBlock::Barrier(BarrierBlock {
            from: BarrierStage::Compute,
            to: BarrierStage::Vertex,
        });
        assert!(barrier.is_computable());
        assert!(!barrier.is_drawable());

        let compute = RenderBlock::Compute(ComputeBlock {
            program: ProgramId(1),
            params: None,
            work_size: [8, 8, 1],
        });
        assert!(compute.is_computable());
        assert!(!compute.is_drawable());

        let callback = RenderBlock::Callback(CallbackBlock {
            callback: CallbackId(0),
        });
        assert!(callback.is_computable());
        assert!(callback.is_drawable());
    }

    #[test]
    fn non_drawables_sort_at_distance_zero() {
        let compute = RenderBlock::Compute(ComputeBlock {
            program: ProgramId(1),
            params: None,
            work_size: [1, 1, 1],
        });
        assert_eq!(compute.distance(), 0.0);
    }
}
