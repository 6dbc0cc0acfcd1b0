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

//! POD math types carried by the parameter-encoding protocol.
//!
//! These are deliberately minimal: the command pipeline only needs values it
//! can copy into and out of arena memory bit-for-bit, so both types are
//! `bytemuck::Pod` with explicit 16-byte alignment matching what GPU constant
//! uploads expect.

/// A 4-component `f32` vector.
///
/// 16-byte aligned so encoded payloads never straddle unaligned memory.
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, align(16))]
pub struct Vector4 {
    /// The x component of the vector.
    pub x: f32,
    /// The y component of the vector.
    pub y: f32,
    /// The z component of the vector.
    pub z: f32,
    /// The w component of the vector.
    pub w: f32,
}

impl Vector4 {
    /// A vector with all components set to `0.0`.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    /// A vector with all components set to `1.0`.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new `Vector4` with the specified components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Creates a point (`w` = 1.0) from three components.
    #[inline]
    pub const fn point(x: f32, y: f32, z: f32) -> Self {
        Self::new(x, y, z, 1.0)
    }

    /// Computes the dot product with another vector.
    #[inline]
    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }
}

/// A 4x4 `f32` matrix in column-major order.
///
/// 16-byte aligned for the same reason as [`Vector4`].
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, align(16))]
pub struct Matrix44 {
    /// The matrix elements, column-major: `elements[column * 4 + row]`.
    pub elements: [f32; 16],
}

impl Matrix44 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        elements: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Creates a matrix from column-major elements.
    #[inline]
    pub const fn from_elements(elements: [f32; 16]) -> Self {
        Self { elements }
    }

    /// Creates a translation matrix.
    #[inline]
    pub const fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.elements[12] = x;
        m.elements[13] = y;
        m.elements[14] = z;
        m
    }

    /// Returns a single column as a [`Vector4`].
    #[inline]
    pub fn column(&self, index: usize) -> Vector4 {
        Vector4::new(
            self.elements[index * 4],
            self.elements[index * 4 + 1],
            self.elements[index * 4 + 2],
            self.elements[index * 4 + 3],
        )
    }
}

impl Default for Matrix44 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
