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

//! # Kiln Render
//!
//! The deferred render-command arena: scene-traversal code records draw and
//! compute work for a frame without touching the graphics API, so that
//! recording can run ahead of (or parallel to) GPU submission and final
//! submission order is decided centrally after all producers have run.
//!
//! The pieces, bottom up:
//!
//! - [`FrameArena`] — a fixed-capacity bump heap with frame-scoped lifetime;
//!   the sole memory owner for everything recorded during one frame.
//! - [`ParameterWriter`] / [`ParameterBlock`] — a binary, type-tagged
//!   encoding of shader inputs, staged before the real program object needs
//!   to exist and decoded (`fixup`) at submission time.
//! - [`RenderBlock`] — the command variants: draws in four shapes, compute
//!   dispatches, barriers, and host callbacks.
//! - [`RenderContext`] — the arena plus four queue stages (compute queue,
//!   priority buckets, draw queue, render queue) with explicit merge and
//!   single-threaded replay.

#![warn(missing_docs)]

pub mod arena;
pub mod block;
pub mod context;
pub mod error;
pub mod params;

pub use arena::{ArenaSlot, FrameArena};
pub use block::{
    BarrierBlock, CallbackBlock, ComputeBlock, DrawBlock, IndexedDrawBlock, IndirectDrawBlock,
    InstancedDrawBlock, RenderBlock, RenderCallback,
};
pub use context::{
    RenderContext, RenderContextStats, RenderPriority, RenderPriorityMask, SortOrder,
    DEFAULT_BUCKET_ORDERS,
};
pub use error::RenderError;
pub use params::{ParameterBlock, ParameterWriter};
