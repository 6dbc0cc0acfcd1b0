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

//! The render context: arena, parameter API, and the four queue stages.
//!
//! Producers allocate blocks and parameter streams from the context's arena
//! and enqueue them into the compute queue or a priority bucket. Once all
//! producers for a pass have run, the owner merges: priority buckets (each
//! stable-sorted by distance) into the draw queue in bucket order, then
//! compute and draw queues into the final render queue. A single replay
//! pass walks the render queue front to back on one thread, issuing each
//! block against the [`RenderView`].
//!
//! Exactly one producer thread builds into a given context at a time;
//! parallelism is achieved with one context per job or view, not by sharing
//! one context.

use crate::arena::{ArenaSlot, FrameArena};
use crate::block::{CallbackBlock, CallbackId, RenderBlock, RenderCallback};
use crate::error::{fatal, RenderError};
use crate::params::ParameterWriter;
use kiln_core::RenderView;

/// A draw-ordering lane. Buckets are merged in declaration order, so the
/// bucket index is the coarse priority; distance sorts within a bucket.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RenderPriority {
    /// Pass setup work (clears, fullscreen primes).
    Setup = 0,
    /// Opaque geometry, front to back.
    Opaque = 1,
    /// Effects that follow opaque geometry (decals, skin).
    PostOpaque = 2,
    /// Blended geometry, back to front.
    AlphaBlend = 3,
    /// Effects that follow blended geometry.
    PostAlphaBlend = 4,
    /// Screen-space overlays.
    Overlay = 5,
}

impl RenderPriority {
    /// Number of priority buckets.
    pub const COUNT: usize = 6;

    /// All priorities in merge order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Setup,
        Self::Opaque,
        Self::PostOpaque,
        Self::AlphaBlend,
        Self::PostAlphaBlend,
        Self::Overlay,
    ];

    /// The bucket index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The single-bucket mask.
    #[inline]
    pub const fn mask(self) -> RenderPriorityMask {
        RenderPriorityMask::from_bits(1 << self as u32)
    }
}

/// A set of priority buckets, used to select which buckets a merge step
/// consumes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RenderPriorityMask {
    bits: u32,
}

impl RenderPriorityMask {
    /// No buckets.
    pub const NONE: Self = Self { bits: 0 };
    /// The setup bucket.
    pub const SETUP: Self = RenderPriority::Setup.mask();
    /// The opaque bucket.
    pub const OPAQUE: Self = RenderPriority::Opaque.mask();
    /// The post-opaque bucket.
    pub const POST_OPAQUE: Self = RenderPriority::PostOpaque.mask();
    /// The alpha-blend bucket.
    pub const ALPHA_BLEND: Self = RenderPriority::AlphaBlend.mask();
    /// The post-alpha-blend bucket.
    pub const POST_ALPHA_BLEND: Self = RenderPriority::PostAlphaBlend.mask();
    /// The overlay bucket.
    pub const OVERLAY: Self = RenderPriority::Overlay.mask();
    /// Every bucket.
    pub const ALL: Self = Self {
        bits: (1 << RenderPriority::COUNT) - 1,
    };

    /// Creates a mask from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two masks.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Whether the mask selects `priority`.
    pub const fn contains(&self, priority: RenderPriority) -> bool {
        (self.bits & priority.mask().bits) != 0
    }

    /// Whether the mask selects nothing.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

/// The distance convention a bucket sorts by.
///
/// This is renderer policy, not arena policy: opaque geometry draws front to
/// back for early-z, blended geometry back to front for correctness.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending distance.
    FrontToBack,
    /// Descending distance.
    BackToFront,
}

/// Default per-bucket sort conventions.
pub const DEFAULT_BUCKET_ORDERS: [SortOrder; RenderPriority::COUNT] = [
    SortOrder::FrontToBack, // Setup
    SortOrder::FrontToBack, // Opaque
    SortOrder::FrontToBack, // PostOpaque
    SortOrder::BackToFront, // AlphaBlend
    SortOrder::BackToFront, // PostAlphaBlend
    SortOrder::FrontToBack, // Overlay
];

/// Per-frame recording statistics, for tooling and logs.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RenderContextStats {
    /// Drawable blocks enqueued this frame.
    pub draws: u32,
    /// Compute/barrier blocks enqueued this frame.
    pub computes: u32,
    /// Host callbacks recorded this frame.
    pub callbacks: u32,
    /// Arena bytes committed this frame.
    pub arena_used: usize,
    /// Lifetime arena high-water mark.
    pub arena_high_water: usize,
}

/// Recording lifecycle of a context within one frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum FrameState {
    /// Producers may allocate and enqueue.
    Building,
    /// Queues are being linearized; allocation still allowed, enqueue not.
    Merging,
    /// The render queue is being (or has been) replayed.
    Replaying,
}

impl FrameState {
    const fn name(self) -> &'static str {
        match self {
            FrameState::Building => "building",
            FrameState::Merging => "merging",
            FrameState::Replaying => "replaying",
        }
    }
}

struct DrawEntry {
    distance: f32,
    slot: ArenaSlot<RenderBlock>,
}

/// Composes the frame arena, the parameter-stream API, and the four queue
/// stages; the sole recording surface for producers and the frame driver.
pub struct RenderContext {
    arena: FrameArena,
    callbacks: Vec<RenderCallback>,
    compute_queue: Vec<ArenaSlot<RenderBlock>>,
    buckets: [Vec<DrawEntry>; RenderPriority::COUNT],
    bucket_orders: [SortOrder; RenderPriority::COUNT],
    draw_queue: Vec<ArenaSlot<RenderBlock>>,
    render_queue: Vec<ArenaSlot<RenderBlock>>,
    state: FrameState,
    draws: u32,
    computes: u32,
}

impl RenderContext {
    /// Creates a context with an arena of `arena_capacity` bytes and the
    /// default bucket sort conventions.
    pub fn new(arena_capacity: usize) -> Self {
        Self::with_bucket_orders(arena_capacity, DEFAULT_BUCKET_ORDERS)
    }

    /// Creates a context with explicit per-bucket sort conventions.
    pub fn with_bucket_orders(
        arena_capacity: usize,
        bucket_orders: [SortOrder; RenderPriority::COUNT],
    ) -> Self {
        Self {
            arena: FrameArena::new(arena_capacity),
            callbacks: Vec::new(),
            compute_queue: Vec::new(),
            buckets: Default::default(),
            bucket_orders,
            draw_queue: Vec::new(),
            render_queue: Vec::new(),
            state: FrameState::Building,
            draws: 0,
            computes: 0,
        }
    }

    /// Starts a new frame: resets the arena (invalidating every slot and
    /// parameter block from the previous frame), clears all queues and
    /// callbacks, and returns to the building state.
    ///
    /// The context owner calls this once per frame, after replay.
    pub fn begin_frame(&mut self) {
        self.arena.reset();
        self.callbacks.clear();
        self.compute_queue.clear();
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.draw_queue.clear();
        self.render_queue.clear();
        self.state = FrameState::Building;
        self.draws = 0;
        self.computes = 0;
    }

    /// Allocates `value` from the frame arena. Exhaustion is fatal; the
    /// arena never grows because growth would invalidate previously
    /// returned slots.
    pub fn alloc<T: Copy>(&mut self, value: T) -> ArenaSlot<T> {
        self.expect_not_replaying("alloc");
        self.arena.alloc_value(value)
    }

    /// Like [`alloc`](Self::alloc), with a debug name for tooling.
    pub fn alloc_named<T: Copy>(&mut self, name: &str, value: T) -> ArenaSlot<T> {
        self.expect_not_replaying("alloc_named");
        let slot = self.arena.alloc_value(value);
        log::trace!(
            "alloc \"{name}\": {} bytes at offset {}",
            std::mem::size_of::<T>(),
            slot.offset()
        );
        slot
    }

    /// Begins encoding a parameter stream into the arena.
    ///
    /// The returned writer mutably borrows the context, so streams cannot
    /// nest and no block can be enqueued until the stream is sealed with
    /// [`ParameterWriter::end`] (or discarded by dropping the writer).
    pub fn begin_parameters(&mut self) -> ParameterWriter<'_> {
        self.expect_not_replaying("begin_parameters");
        ParameterWriter::begin(&mut self.arena)
    }

    /// Records a host callback and returns the block that invokes it.
    ///
    /// The closure lives on the normal heap; the returned block is `Copy`
    /// like every other and can be allocated and enqueued into either lane.
    /// Like `alloc`, recording is allowed while building or merging; only
    /// enqueueing requires the building state.
    pub fn callback(
        &mut self,
        callback: impl FnMut(&mut dyn RenderView) + Send + 'static,
    ) -> RenderBlock {
        self.expect_not_replaying("callback");
        let id = CallbackId(self.callbacks.len() as u32);
        self.callbacks.push(Box::new(callback));
        RenderBlock::Callback(CallbackBlock { callback: id })
    }

    /// Enqueues a drawable block directly into the draw queue, bypassing
    /// the priority buckets (and therefore distance sorting).
    pub fn draw(&mut self, block: ArenaSlot<RenderBlock>) {
        self.expect_building("draw");
        debug_assert!(self.arena.get(block).is_drawable());
        self.draw_queue.push(block);
        self.draws += 1;
    }

    /// Enqueues a drawable block into a priority bucket, to be distance-
    /// sorted when the bucket is merged.
    pub fn draw_prioritized(&mut self, priority: RenderPriority, block: ArenaSlot<RenderBlock>) {
        self.expect_building("draw_prioritized");
        let value = self.arena.get(block);
        debug_assert!(value.is_drawable());
        self.buckets[priority.index()].push(DrawEntry {
            distance: value.distance(),
            slot: block,
        });
        self.draws += 1;
    }

    /// Enqueues a compute or barrier block; the compute queue preserves
    /// enqueue order.
    pub fn compute(&mut self, block: ArenaSlot<RenderBlock>) {
        self.expect_building("compute");
        debug_assert!(self.arena.get(block).is_computable());
        self.compute_queue.push(block);
        self.computes += 1;
    }

    /// Merges the buckets selected by `mask`, in bucket-index order, into
    /// the draw queue. Each bucket is stable-sorted by distance under its
    /// configured convention before being appended.
    pub fn merge_priority_into_draw(&mut self, mask: RenderPriorityMask) {
        self.expect_merge("merge_priority_into_draw");
        for priority in RenderPriority::ALL {
            if !mask.contains(priority) {
                continue;
            }
            let bucket = &mut self.buckets[priority.index()];
            if bucket.is_empty() {
                continue;
            }
            match self.bucket_orders[priority.index()] {
                SortOrder::FrontToBack => {
                    bucket.sort_by(|a, b| a.distance.total_cmp(&b.distance));
                }
                SortOrder::BackToFront => {
                    bucket.sort_by(|a, b| b.distance.total_cmp(&a.distance));
                }
            }
            log::debug!(
                "merge {} blocks from {priority:?} into draw queue",
                bucket.len()
            );
            self.draw_queue.extend(bucket.drain(..).map(|e| e.slot));
        }
    }

    /// Appends the compute queue to the render queue. Called before the
    /// draw merge by convention: draws frequently consume buffers written
    /// by a preceding dispatch, with the hazard expressed by an explicit
    /// barrier block between them.
    pub fn merge_compute_into_render(&mut self) {
        self.expect_merge("merge_compute_into_render");
        self.render_queue.append(&mut self.compute_queue);
    }

    /// Appends the draw queue to the render queue.
    pub fn merge_draw_into_render(&mut self) {
        self.expect_merge("merge_draw_into_render");
        self.render_queue.append(&mut self.draw_queue);
    }

    /// Performs the full merge: selected buckets into the draw queue, then
    /// compute, then draw, into the render queue.
    pub fn merge(&mut self, mask: RenderPriorityMask) {
        self.merge_priority_into_draw(mask);
        self.merge_compute_into_render();
        self.merge_draw_into_render();
    }

    /// Replays the merged render queue, in order, against `view`.
    ///
    /// Once merged, a block's position is fixed; no reordering happens
    /// here. Calling `render` before any merge is a fatal usage error.
    pub fn render(&mut self, view: &mut dyn RenderView) {
        if self.state != FrameState::Merging {
            fatal(RenderError::InvalidState {
                operation: "render",
                state: self.state.name(),
            });
        }
        self.state = FrameState::Replaying;
        log::debug!(
            "replay {} blocks ({} bytes recorded)",
            self.render_queue.len(),
            self.arena.used()
        );
        for i in 0..self.render_queue.len() {
            let block = self.arena.get(self.render_queue[i]);
            block.execute(&self.arena, &mut self.callbacks, view);
        }
    }

    /// Discards queued-but-unmerged work. Used when a pass is aborted;
    /// arena memory is not reclaimed until the next [`begin_frame`].
    ///
    /// [`begin_frame`]: Self::begin_frame
    pub fn flush(&mut self) {
        let discarded = self.compute_queue.len()
            + self.buckets.iter().map(Vec::len).sum::<usize>()
            + self.draw_queue.len()
            + self.render_queue.len();
        if discarded > 0 {
            log::warn!("flush discarding {discarded} queued blocks");
        }
        self.compute_queue.clear();
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.draw_queue.clear();
        self.render_queue.clear();
        self.state = FrameState::Building;
    }

    /// Whether compute work awaits a merge.
    pub fn have_pending_computes(&self) -> bool {
        !self.compute_queue.is_empty()
    }

    /// Whether draw work awaits a merge, in a bucket or in the draw queue.
    pub fn have_pending_draws(&self) -> bool {
        !self.draw_queue.is_empty() || self.buckets.iter().any(|b| !b.is_empty())
    }

    /// The frame arena, for decoding parameter blocks outside replay.
    pub fn arena(&self) -> &FrameArena {
        &self.arena
    }

    /// Current frame statistics.
    pub fn stats(&self) -> RenderContextStats {
        RenderContextStats {
            draws: self.draws,
            computes: self.computes,
            callbacks: self.callbacks.len() as u32,
            arena_used: self.arena.used(),
            arena_high_water: self.arena.high_water(),
        }
    }

    fn expect_building(&self, operation: &'static str) {
        if self.state != FrameState::Building {
            fatal(RenderError::InvalidState {
                operation,
                state: self.state.name(),
            });
        }
    }

    fn expect_not_replaying(&self, operation: &'static str) {
        if self.state == FrameState::Replaying {
            fatal(RenderError::InvalidState {
                operation,
                state: self.state.name(),
            });
        }
    }

    fn expect_merge(&mut self, operation: &'static str) {
        match self.state {
            FrameState::Building => self.state = FrameState::Merging,
            FrameState::Merging => {}
            FrameState::Replaying => fatal(RenderError::InvalidState {
                operation,
                state: self.state.name(),
            }),
        }
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("state", &self.state.name())
            .field("arena", &self.arena)
            .field("compute_queue", &self.compute_queue.len())
            .field("draw_queue", &self.draw_queue.len())
            .field("render_queue", &self.render_queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BarrierBlock, ComputeBlock, DrawBlock};
    use kiln_core::{
        BarrierStage, BufferViewId, IndexBufferView, PrimitiveType, Primitives, ProgramId,
        ShaderProgram, VertexBufferView, VertexLayoutId,
    };

    /// A view that records the order draws and dispatches arrive in.
    #[derive(Default)]
    struct OrderView {
        order: Vec<String>,
    }

    impl RenderView for OrderView {
        fn program_mut(&mut self, _program: ProgramId) -> Option<&mut dyn ShaderProgram> {
            None
        }
        fn draw(
            &mut self,
            program: ProgramId,
            _vertex_buffer: VertexBufferView,
            _vertex_layout: VertexLayoutId,
            _primitives: Primitives,
        ) {
            self.order.push(format!("draw:{}", program.0));
        }
        fn draw_indexed(
            &mut self,
            program: ProgramId,
            _vertex_buffer: VertexBufferView,
            _vertex_layout: VertexLayoutId,
            _index_buffer: IndexBufferView,
            _primitives: Primitives,
        ) {
            self.order.push(format!("indexed:{}", program.0));
        }
        fn draw_instanced(
            &mut self,
            program: ProgramId,
            _vertex_buffer: VertexBufferView,
            _vertex_layout: VertexLayoutId,
            _index_buffer: Option<IndexBufferView>,
            _primitives: Primitives,
            _instance_count: u32,
        ) {
            self.order.push(format!("instanced:{}", program.0));
        }
        fn draw_indirect(
            &mut self,
            program: ProgramId,
            _primitive: PrimitiveType,
            _args: BufferViewId,
            _draw_count: u32,
        ) {
            self.order.push(format!("indirect:{}", program.0));
        }
        fn dispatch(&mut self, program: ProgramId, _work_size: [u32; 3]) {
            self.order.push(format!("dispatch:{}", program.0));
        }
        fn barrier(&mut self, from: BarrierStage, to: BarrierStage) {
            self.order.push(format!("barrier:{from:?}->{to:?}"));
        }
    }

    // Draw blocks skip when the program can't be resolved, so for ordering
    // tests the view records the issuing call regardless.
    impl OrderView {
        fn with_programs() -> ResolvingView {
            ResolvingView {
                inner: OrderView::default(),
                program: NullProgram,
            }
        }
    }

    struct NullProgram;
    impl ShaderProgram for NullProgram {
        fn set_float(&mut self, _: kiln_core::ParameterHandle, _: f32) {}
        fn set_float_array(&mut self, _: kiln_core::ParameterHandle, _: &[f32]) {}
        fn set_vector(&mut self, _: kiln_core::ParameterHandle, _: kiln_core::Vector4) {}
        fn set_vector_array(&mut self, _: kiln_core::ParameterHandle, _: &[kiln_core::Vector4]) {}
        fn set_matrix(&mut self, _: kiln_core::ParameterHandle, _: kiln_core::Matrix44) {}
        fn set_matrix_array(&mut self, _: kiln_core::ParameterHandle, _: &[kiln_core::Matrix44]) {}
        fn set_texture(&mut self, _: kiln_core::ParameterHandle, _: kiln_core::TextureId) {}
        fn set_image_view(&mut self, _: kiln_core::ParameterHandle, _: kiln_core::ImageViewId) {}
        fn set_buffer_view(&mut self, _: kiln_core::ParameterHandle, _: BufferViewId) {}
        fn set_stencil_reference(&mut self, _: u32) {}
    }

    struct ResolvingView {
        inner: OrderView,
        program: NullProgram,
    }

    impl RenderView for ResolvingView {
        fn program_mut(&mut self, _program: ProgramId) -> Option<&mut dyn ShaderProgram> {
            Some(&mut self.program)
        }
        fn draw(
            &mut self,
            program: ProgramId,
            vertex_buffer: VertexBufferView,
            vertex_layout: VertexLayoutId,
            primitives: Primitives,
        ) {
            self.inner.draw(program, vertex_buffer, vertex_layout, primitives);
        }
        fn draw_indexed(
            &mut self,
            program: ProgramId,
            vertex_buffer: VertexBufferView,
            vertex_layout: VertexLayoutId,
            index_buffer: IndexBufferView,
            primitives: Primitives,
        ) {
            self.inner
                .draw_indexed(program, vertex_buffer, vertex_layout, index_buffer, primitives);
        }
        fn draw_instanced(
            &mut self,
            program: ProgramId,
            vertex_buffer: VertexBufferView,
            vertex_layout: VertexLayoutId,
            index_buffer: Option<IndexBufferView>,
            primitives: Primitives,
            instance_count: u32,
        ) {
            self.inner.draw_instanced(
                program,
                vertex_buffer,
                vertex_layout,
                index_buffer,
                primitives,
                instance_count,
            );
        }
        fn draw_indirect(
            &mut self,
            program: ProgramId,
            primitive: PrimitiveType,
            args: BufferViewId,
            draw_count: u32,
        ) {
            self.inner.draw_indirect(program, primitive, args, draw_count);
        }
        fn dispatch(&mut self, program: ProgramId, work_size: [u32; 3]) {
            self.inner.dispatch(program, work_size);
        }
        fn barrier(&mut self, from: BarrierStage, to: BarrierStage) {
            self.inner.barrier(from, to);
        }
    }

    fn draw_block(program: u64, distance: f32) -> RenderBlock {
        RenderBlock::Draw(DrawBlock {
            distance,
            program: ProgramId(program),
            params: None,
            vertex_buffer: VertexBufferView {
                buffer: BufferViewId(1),
                offset: 0,
                stride: 16,
            },
            vertex_layout: VertexLayoutId(1),
            primitives: Primitives::triangles(0, 1),
        })
    }

    fn compute_block(program: u64) -> RenderBlock {
        RenderBlock::Compute(ComputeBlock {
            program: ProgramId(program),
            params: None,
            work_size: [1, 1, 1],
        })
    }

    #[test]
    fn ascending_bucket_sorts_by_distance() {
        let mut ctx = RenderContext::new(4096);
        for (program, distance) in [(1u64, 5.0f32), (2, 1.0), (3, 3.0)] {
            let slot = ctx.alloc(draw_block(program, distance));
            ctx.draw_prioritized(RenderPriority::Opaque, slot);
        }
        ctx.merge(RenderPriorityMask::ALL);

        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
        assert_eq!(view.inner.order, vec!["draw:2", "draw:3", "draw:1"]);
    }

    #[test]
    fn back_to_front_bucket_reverses() {
        let mut ctx = RenderContext::new(4096);
        for (program, distance) in [(1u64, 5.0f32), (2, 1.0), (3, 3.0)] {
            let slot = ctx.alloc(draw_block(program, distance));
            ctx.draw_prioritized(RenderPriority::AlphaBlend, slot);
        }
        ctx.merge(RenderPriorityMask::ALL);

        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
        assert_eq!(view.inner.order, vec!["draw:1", "draw:3", "draw:2"]);
    }

    #[test]
    fn equal_distances_keep_enqueue_order() {
        let mut ctx = RenderContext::new(4096);
        for program in 1u64..=4 {
            let slot = ctx.alloc(draw_block(program, 2.5));
            ctx.draw_prioritized(RenderPriority::Opaque, slot);
        }
        ctx.merge(RenderPriorityMask::ALL);

        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
        assert_eq!(
            view.inner.order,
            vec!["draw:1", "draw:2", "draw:3", "draw:4"]
        );
    }

    #[test]
    fn lower_bucket_precedes_regardless_of_distance() {
        let mut ctx = RenderContext::new(4096);
        let far = ctx.alloc(draw_block(1, 1000.0));
        ctx.draw_prioritized(RenderPriority::Setup, far);
        let near = ctx.alloc(draw_block(2, 0.1));
        ctx.draw_prioritized(RenderPriority::Opaque, near);
        ctx.merge(RenderPriorityMask::ALL);

        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
        assert_eq!(view.inner.order, vec!["draw:1", "draw:2"]);
    }

    #[test]
    fn compute_merges_ahead_of_draw() {
        let mut ctx = RenderContext::new(4096);
        let draw = ctx.alloc(draw_block(1, 1.0));
        ctx.draw_prioritized(RenderPriority::Opaque, draw);
        let dispatch = ctx.alloc(compute_block(9));
        ctx.compute(dispatch);
        ctx.merge(RenderPriorityMask::ALL);

        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
        assert_eq!(view.inner.order, vec!["dispatch:9", "draw:1"]);
    }

    #[test]
    fn barriers_keep_their_place_in_the_compute_queue() {
        let mut ctx = RenderContext::new(4096);
        let a = ctx.alloc(compute_block(1));
        ctx.compute(a);
        let barrier = ctx.alloc(RenderBlock::Barrier(BarrierBlock {
            from: BarrierStage::Compute,
            to: BarrierStage::Vertex,
        }));
        ctx.compute(barrier);
        let b = ctx.alloc(compute_block(2));
        ctx.compute(b);
        ctx.merge(RenderPriorityMask::NONE);

        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
        assert_eq!(
            view.inner.order,
            vec!["dispatch:1", "barrier:Compute->Vertex", "dispatch:2"]
        );
    }

    #[test]
    fn selective_merge_leaves_other_buckets_pending() {
        let mut ctx = RenderContext::new(4096);
        let opaque = ctx.alloc(draw_block(1, 1.0));
        ctx.draw_prioritized(RenderPriority::Opaque, opaque);
        let blend = ctx.alloc(draw_block(2, 1.0));
        ctx.draw_prioritized(RenderPriority::AlphaBlend, blend);

        ctx.merge_priority_into_draw(RenderPriorityMask::OPAQUE);
        assert!(ctx.have_pending_draws(), "alpha bucket still holds a block");
        ctx.merge_priority_into_draw(RenderPriorityMask::ALPHA_BLEND);
        ctx.merge_draw_into_render();

        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
        assert_eq!(view.inner.order, vec!["draw:1", "draw:2"]);
    }

    #[test]
    fn pending_queries_track_queues() {
        let mut ctx = RenderContext::new(4096);
        assert!(!ctx.have_pending_computes());
        assert!(!ctx.have_pending_draws());

        let dispatch = ctx.alloc(compute_block(1));
        ctx.compute(dispatch);
        let draw = ctx.alloc(draw_block(2, 1.0));
        ctx.draw(draw);
        assert!(ctx.have_pending_computes());
        assert!(ctx.have_pending_draws());

        ctx.merge(RenderPriorityMask::ALL);
        assert!(!ctx.have_pending_computes());
        assert!(!ctx.have_pending_draws());
    }

    #[test]
    fn flush_discards_and_returns_to_building() {
        let mut ctx = RenderContext::new(4096);
        let draw = ctx.alloc(draw_block(1, 1.0));
        ctx.draw_prioritized(RenderPriority::Opaque, draw);
        let dispatch = ctx.alloc(compute_block(2));
        ctx.compute(dispatch);
        ctx.merge_compute_into_render();

        ctx.flush();
        assert!(!ctx.have_pending_computes());
        assert!(!ctx.have_pending_draws());

        // Recording continues after an aborted pass.
        let draw = ctx.alloc(draw_block(3, 1.0));
        ctx.draw_prioritized(RenderPriority::Opaque, draw);
        ctx.merge(RenderPriorityMask::ALL);
        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
        assert_eq!(view.inner.order, vec!["draw:3"]);
    }

    #[test]
    fn begin_frame_recycles_the_context() {
        let mut ctx = RenderContext::new(4096);
        let draw = ctx.alloc(draw_block(1, 1.0));
        ctx.draw_prioritized(RenderPriority::Opaque, draw);
        ctx.merge(RenderPriorityMask::ALL);
        let mut view = OrderView::with_programs();
        ctx.render(&mut view);

        ctx.begin_frame();
        assert_eq!(ctx.stats().draws, 0);
        assert_eq!(ctx.stats().arena_used, 0);

        let draw = ctx.alloc(draw_block(7, 1.0));
        ctx.draw_prioritized(RenderPriority::Opaque, draw);
        ctx.merge(RenderPriorityMask::ALL);
        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
        assert_eq!(view.inner.order, vec!["draw:7"]);
    }

    #[test]
    #[should_panic(expected = "`render` called while the render context is building")]
    fn render_before_merge_is_fatal() {
        let mut ctx = RenderContext::new(4096);
        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
    }

    #[test]
    #[should_panic(expected = "`alloc` called while the render context is replaying")]
    fn alloc_after_replay_is_fatal() {
        let mut ctx = RenderContext::new(4096);
        ctx.merge(RenderPriorityMask::ALL);
        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
        let _ = ctx.alloc(draw_block(1, 1.0));
    }

    #[test]
    #[should_panic(expected = "`draw` called while the render context is merging")]
    fn enqueue_after_merge_is_fatal() {
        let mut ctx = RenderContext::new(4096);
        let draw = ctx.alloc(draw_block(1, 1.0));
        ctx.merge(RenderPriorityMask::ALL);
        ctx.draw(draw);
    }

    #[test]
    fn recording_stays_open_while_merging() {
        let mut ctx = RenderContext::new(4096);
        ctx.merge_compute_into_render();

        // Allocation, parameter encoding, and callback recording are all
        // still legal between merge steps; only enqueueing is not.
        let _slot = ctx.alloc(draw_block(1, 1.0));
        let mut params = ctx.begin_parameters();
        params.set_float(kiln_core::ParameterHandle(0), 1.0);
        let _params = params.end();
        let _callback = ctx.callback(|_| {});
        assert_eq!(ctx.stats().callbacks, 1);
    }

    #[test]
    #[should_panic(expected = "`callback` called while the render context is replaying")]
    fn callback_after_replay_is_fatal() {
        let mut ctx = RenderContext::new(4096);
        ctx.merge(RenderPriorityMask::ALL);
        let mut view = OrderView::with_programs();
        ctx.render(&mut view);
        let _ = ctx.callback(|_| {});
    }

    #[test]
    fn stats_reflect_recording() {
        let mut ctx = RenderContext::new(4096);
        let draw = ctx.alloc(draw_block(1, 1.0));
        ctx.draw(draw);
        let dispatch = ctx.alloc_named("cull", compute_block(2));
        ctx.compute(dispatch);
        let callback = ctx.callback(|_| {});
        let callback = ctx.alloc(callback);
        ctx.draw(callback);

        let stats = ctx.stats();
        assert_eq!(stats.draws, 2);
        assert_eq!(stats.computes, 1);
        assert_eq!(stats.callbacks, 1);
        assert!(stats.arena_used > 0);
    }

    #[test]
    fn mask_operations() {
        let mask = RenderPriorityMask::OPAQUE.union(RenderPriorityMask::ALPHA_BLEND);
        assert!(mask.contains(RenderPriority::Opaque));
        assert!(mask.contains(RenderPriority::AlphaBlend));
        assert!(!mask.contains(RenderPriority::Setup));
        assert!(RenderPriorityMask::NONE.is_empty());
        assert_eq!(RenderPriorityMask::ALL.bits(), 0b11_1111);
    }
}
