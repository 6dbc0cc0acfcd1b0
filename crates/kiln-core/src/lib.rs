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

//! # Kiln Core
//!
//! Foundational crate containing the types and interface contracts shared by
//! every part of the renderer: opaque resource IDs, the parameter-handle
//! registry, POD math types, geometry descriptions, and the two traits the
//! deferred command pipeline is written against — [`ShaderProgram`] (the
//! parameter sink) and [`RenderView`] (the GPU-facing replay target).

#![warn(missing_docs)]

pub mod geometry;
pub mod handles;
pub mod ids;
pub mod lock;
pub mod math;
pub mod pingpong;
pub mod program;
pub mod view;

pub use geometry::{
    BarrierStage, IndexBufferView, IndexType, PrimitiveType, Primitives, VertexBufferView,
};
pub use handles::{HandleRegistry, ParameterHandle};
pub use ids::{BufferViewId, ImageViewId, ProgramId, TextureId, VertexLayoutId};
pub use lock::LockFlag;
pub use math::{Matrix44, Vector4};
pub use pingpong::PingPong;
pub use program::ShaderProgram;
pub use view::RenderView;
