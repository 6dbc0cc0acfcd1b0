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

//! The binary parameter-encoding protocol.
//!
//! Producers stage shader inputs *before* the real program object is
//! necessarily known: a [`ParameterWriter`] encodes each typed assignment
//! into arena memory as a self-describing entry, and the sealed
//! [`ParameterBlock`] is decoded once — by [`ParameterBlock::fixup`] —
//! when the command finally reaches GPU submission and the program is
//! resolvable. Decoupling *when parameters are known* from *when they are
//! consumable* is the entire reason this format exists.
//!
//! Wire layout per entry: a 16-bit parameter handle, an 8-bit type tag,
//! padding to the payload's natural alignment, then the payload. Array
//! payloads carry a 32-bit element count. Because every payload is written
//! at its natural alignment, the decoder hands array payloads back as
//! borrowed slices with no copy.
//!
//! Encoding uses a two-phase commit: setters write speculatively past the
//! arena's committed cursor, and [`ParameterWriter::end`] folds the whole
//! span into one committed allocation by advancing the cursor — no copy. A
//! writer dropped without `end` leaves the cursor untouched and the stream
//! is discarded.

use crate::arena::FrameArena;
use crate::error::fatal;
use kiln_core::{
    BufferViewId, ImageViewId, Matrix44, ParameterHandle, ShaderProgram, TextureId, Vector4,
};

/// A sealed `[first, last)` parameter span inside the frame arena.
///
/// Immutable once created; decoded zero or more times during replay;
/// invalidated by the arena reset like everything else in the frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParameterBlock {
    first: u32,
    last: u32,
}

impl ParameterBlock {
    /// Length of the encoded span in bytes.
    pub fn len(&self) -> usize {
        (self.last - self.first) as usize
    }

    /// Whether the span holds no entries.
    pub fn is_empty(&self) -> bool {
        self.first == self.last
    }

    /// Decodes the span, replaying every entry onto `program` in encode
    /// order. Attached child spans are visited, in full, at the point they
    /// were attached.
    pub fn fixup(&self, arena: &FrameArena, program: &mut dyn ShaderProgram) {
        let mut at = self.first as usize;
        let end = self.last as usize;
        while at < end {
            let handle = ParameterHandle(read_pod::<u16>(arena, at));
            let tag = read_pod::<u8>(arena, at + 2);
            at += 3;
            match tag {
                tag::FLOAT => {
                    at = align_up(at, 4);
                    program.set_float(handle, read_pod::<f32>(arena, at));
                    at += 4;
                }
                tag::FLOAT_ARRAY => {
                    at = align_up(at, 4);
                    let count = read_pod::<u32>(arena, at) as usize;
                    at += 4;
                    program.set_float_array(handle, read_slice::<f32>(arena, at, count));
                    at += count * 4;
                }
                tag::VECTOR => {
                    at = align_up(at, 16);
                    program.set_vector(handle, read_pod::<Vector4>(arena, at));
                    at += 16;
                }
                tag::VECTOR_ARRAY => {
                    at = align_up(at, 4);
                    let count = read_pod::<u32>(arena, at) as usize;
                    at = align_up(at + 4, 16);
                    program.set_vector_array(handle, read_slice::<Vector4>(arena, at, count));
                    at += count * 16;
                }
                tag::MATRIX => {
                    at = align_up(at, 16);
                    program.set_matrix(handle, read_pod::<Matrix44>(arena, at));
                    at += 64;
                }
                tag::MATRIX_ARRAY => {
                    at = align_up(at, 4);
                    let count = read_pod::<u32>(arena, at) as usize;
                    at = align_up(at + 4, 16);
                    program.set_matrix_array(handle, read_slice::<Matrix44>(arena, at, count));
                    at += count * 64;
                }
                tag::TEXTURE => {
                    at = align_up(at, 8);
                    program.set_texture(handle, TextureId(read_pod::<u64>(arena, at)));
                    at += 8;
                }
                tag::IMAGE_VIEW => {
                    at = align_up(at, 8);
                    program.set_image_view(handle, ImageViewId(read_pod::<u64>(arena, at)));
                    at += 8;
                }
                tag::BUFFER_VIEW => {
                    at = align_up(at, 8);
                    program.set_buffer_view(handle, BufferViewId(read_pod::<u64>(arena, at)));
                    at += 8;
                }
                tag::STENCIL_REFERENCE => {
                    at = align_up(at, 4);
                    program.set_stencil_reference(read_pod::<u32>(arena, at));
                    at += 4;
                }
                tag::ATTACH => {
                    at = align_up(at, 4);
                    let child = ParameterBlock {
                        first: read_pod::<u32>(arena, at),
                        last: read_pod::<u32>(arena, at + 4),
                    };
                    at += 8;
                    child.fixup(arena, program);
                }
                unknown => {
                    // Unreachable by construction: the encoder only emits
                    // tags this decoder handles.
                    debug_assert!(false, "unknown parameter tag {unknown:#x} at offset {at}");
                    return;
                }
            }
        }
        debug_assert_eq!(at, end, "parameter stream length mismatch");
    }
}

/// Entry type tags. Encoder and decoder are kept in lock-step; an unknown
/// tag during decode is a programming error.
mod tag {
    pub const FLOAT: u8 = 0;
    pub const FLOAT_ARRAY: u8 = 1;
    pub const VECTOR: u8 = 2;
    pub const VECTOR_ARRAY: u8 = 3;
    pub const MATRIX: u8 = 4;
    pub const MATRIX_ARRAY: u8 = 5;
    pub const TEXTURE: u8 = 6;
    pub const IMAGE_VIEW: u8 = 7;
    pub const BUFFER_VIEW: u8 = 8;
    pub const STENCIL_REFERENCE: u8 = 9;
    pub const ATTACH: u8 = 10;
}

/// An in-progress parameter stream.
///
/// Obtained from [`RenderContext::begin_parameters`]; the mutable borrow it
/// holds on the arena is what makes begin/end nesting exactly 1:1 — a second
/// stream cannot be started until this one is sealed or dropped.
///
/// [`RenderContext::begin_parameters`]: crate::context::RenderContext::begin_parameters
#[must_use = "a parameter stream is discarded unless sealed with `end`"]
pub struct ParameterWriter<'a> {
    arena: &'a mut FrameArena,
    first: usize,
    cursor: usize,
}

impl<'a> ParameterWriter<'a> {
    pub(crate) fn begin(arena: &'a mut FrameArena) -> Self {
        let first = arena.used();
        Self {
            arena,
            first,
            cursor: first,
        }
    }

    /// Seals the stream: commits the speculative span as one allocation and
    /// returns the immutable block.
    pub fn end(self) -> ParameterBlock {
        self.arena.commit_to(self.cursor);
        ParameterBlock {
            first: self.first as u32,
            last: self.cursor as u32,
        }
    }

    /// Encodes a scalar float assignment.
    pub fn set_float(&mut self, handle: ParameterHandle, value: f32) {
        self.header(handle, tag::FLOAT);
        self.align_to(4);
        self.push(bytemuck::bytes_of(&value));
    }

    /// Encodes a float-array assignment.
    pub fn set_float_array(&mut self, handle: ParameterHandle, values: &[f32]) {
        self.header(handle, tag::FLOAT_ARRAY);
        self.align_to(4);
        self.push(bytemuck::bytes_of(&(values.len() as u32)));
        self.push(bytemuck::cast_slice(values));
    }

    /// Encodes a vector assignment.
    pub fn set_vector(&mut self, handle: ParameterHandle, value: Vector4) {
        self.header(handle, tag::VECTOR);
        self.align_to(16);
        self.push(bytemuck::bytes_of(&value));
    }

    /// Encodes a vector-array assignment.
    pub fn set_vector_array(&mut self, handle: ParameterHandle, values: &[Vector4]) {
        self.header(handle, tag::VECTOR_ARRAY);
        self.align_to(4);
        self.push(bytemuck::bytes_of(&(values.len() as u32)));
        self.align_to(16);
        self.push(bytemuck::cast_slice(values));
    }

    /// Encodes a matrix assignment.
    pub fn set_matrix(&mut self, handle: ParameterHandle, value: Matrix44) {
        self.header(handle, tag::MATRIX);
        self.align_to(16);
        self.push(bytemuck::bytes_of(&value));
    }

    /// Encodes a matrix-array assignment.
    pub fn set_matrix_array(&mut self, handle: ParameterHandle, values: &[Matrix44]) {
        self.header(handle, tag::MATRIX_ARRAY);
        self.align_to(4);
        self.push(bytemuck::bytes_of(&(values.len() as u32)));
        self.align_to(16);
        self.push(bytemuck::cast_slice(values));
    }

    /// Encodes a sampled-texture binding.
    pub fn set_texture(&mut self, handle: ParameterHandle, texture: TextureId) {
        self.header(handle, tag::TEXTURE);
        self.align_to(8);
        self.push(bytemuck::bytes_of(&texture.0));
    }

    /// Encodes a storage-image binding.
    pub fn set_image_view(&mut self, handle: ParameterHandle, image: ImageViewId) {
        self.header(handle, tag::IMAGE_VIEW);
        self.align_to(8);
        self.push(bytemuck::bytes_of(&image.0));
    }

    /// Encodes a buffer-view binding.
    pub fn set_buffer_view(&mut self, handle: ParameterHandle, buffer: BufferViewId) {
        self.header(handle, tag::BUFFER_VIEW);
        self.align_to(8);
        self.push(bytemuck::bytes_of(&buffer.0));
    }

    /// Encodes the stencil reference value.
    pub fn set_stencil_reference(&mut self, reference: u32) {
        self.header(ParameterHandle::INVALID, tag::STENCIL_REFERENCE);
        self.align_to(4);
        self.push(bytemuck::bytes_of(&reference));
    }

    /// Attaches a previously sealed stream as a child of this one.
    ///
    /// The child's entries are replayed, in full, at this position during
    /// `fixup`. Attachment is by reference — the common case is one shared
    /// per-pass block attached ahead of many per-draw blocks, without
    /// copying it for every draw.
    pub fn attach(&mut self, child: ParameterBlock) {
        self.header(ParameterHandle::INVALID, tag::ATTACH);
        self.align_to(4);
        self.push(bytemuck::bytes_of(&child.first));
        self.push(bytemuck::bytes_of(&child.last));
    }

    fn header(&mut self, handle: ParameterHandle, tag: u8) {
        self.push(bytemuck::bytes_of(&handle.0));
        self.push(&[tag]);
    }

    fn align_to(&mut self, align: usize) {
        // Skipped bytes stay as-is; the decoder recomputes the same padding
        // arithmetically and never reads them.
        self.cursor = align_up(self.cursor, align);
    }

    fn push(&mut self, bytes: &[u8]) {
        if let Err(error) = self.arena.speculative_write(self.cursor, bytes) {
            fatal(error);
        }
        self.cursor += bytes.len();
    }
}

fn read_pod<T: bytemuck::AnyBitPattern>(arena: &FrameArena, at: usize) -> T {
    bytemuck::pod_read_unaligned(arena.bytes(at as u32, (at + std::mem::size_of::<T>()) as u32))
}

fn read_slice<T: bytemuck::AnyBitPattern + bytemuck::NoUninit>(
    arena: &FrameArena,
    at: usize,
    count: usize,
) -> &[T] {
    bytemuck::cast_slice(arena.bytes(
        at as u32,
        (at + count * std::mem::size_of::<T>()) as u32,
    ))
}

#[inline]
fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
