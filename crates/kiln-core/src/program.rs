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

//! The shader-program parameter sink.

use crate::handles::ParameterHandle;
use crate::ids::{BufferViewId, ImageViewId, TextureId};
use crate::math::{Matrix44, Vector4};

/// A compiled shader program, seen purely as a sink for decoded parameter
/// values.
///
/// This vocabulary is exactly what the parameter-stream decoder replays: one
/// call per encoded entry, in encode order, with bit-identical values.
/// Backends implement it on their native program objects.
pub trait ShaderProgram {
    /// Sets a scalar float input.
    fn set_float(&mut self, handle: ParameterHandle, value: f32);

    /// Sets a float-array input.
    fn set_float_array(&mut self, handle: ParameterHandle, values: &[f32]);

    /// Sets a 4-component vector input.
    fn set_vector(&mut self, handle: ParameterHandle, value: Vector4);

    /// Sets a vector-array input.
    fn set_vector_array(&mut self, handle: ParameterHandle, values: &[Vector4]);

    /// Sets a 4x4 matrix input.
    fn set_matrix(&mut self, handle: ParameterHandle, value: Matrix44);

    /// Sets a matrix-array input.
    fn set_matrix_array(&mut self, handle: ParameterHandle, values: &[Matrix44]);

    /// Binds a sampled texture.
    fn set_texture(&mut self, handle: ParameterHandle, texture: TextureId);

    /// Binds a storage-image view.
    fn set_image_view(&mut self, handle: ParameterHandle, image: ImageViewId);

    /// Binds a buffer view (storage or uniform data).
    fn set_buffer_view(&mut self, handle: ParameterHandle, buffer: BufferViewId);

    /// Sets the stencil reference value used while this program draws.
    fn set_stencil_reference(&mut self, reference: u32);
}
