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

//! Records a small frame against a logging backend and replays it.
//!
//! Run with `RUST_LOG=debug cargo run -p kiln-render --example deferred_frame`
//! to watch the merge and replay stages.

use kiln_core::{
    BarrierStage, BufferViewId, HandleRegistry, ImageViewId, IndexBufferView, Matrix44,
    ParameterHandle, PingPong, PrimitiveType, Primitives, ProgramId, RenderView, ShaderProgram,
    TextureId, Vector4, VertexBufferView, VertexLayoutId,
};
use kiln_render::{
    ComputeBlock, DrawBlock, RenderBlock, RenderContext, RenderPriority, RenderPriorityMask,
};

/// A backend that logs every call it receives. It only knows two programs,
/// so the third draw below demonstrates the skip-on-missing-program policy.
struct LoggingView {
    programs: Vec<(u64, LoggingProgram)>,
}

struct LoggingProgram {
    id: u64,
}

impl ShaderProgram for LoggingProgram {
    fn set_float(&mut self, handle: ParameterHandle, value: f32) {
        log::info!("program {}: float[{}] = {value}", self.id, handle.0);
    }
    fn set_float_array(&mut self, handle: ParameterHandle, values: &[f32]) {
        log::info!(
            "program {}: float[{}] = {} elements",
            self.id,
            handle.0,
            values.len()
        );
    }
    fn set_vector(&mut self, handle: ParameterHandle, value: Vector4) {
        log::info!(
            "program {}: vector[{}] = ({}, {}, {}, {})",
            self.id,
            handle.0,
            value.x,
            value.y,
            value.z,
            value.w
        );
    }
    fn set_vector_array(&mut self, handle: ParameterHandle, values: &[Vector4]) {
        log::info!(
            "program {}: vector[{}] = {} elements",
            self.id,
            handle.0,
            values.len()
        );
    }
    fn set_matrix(&mut self, handle: ParameterHandle, value: Matrix44) {
        let t = value.column(3);
        log::info!(
            "program {}: matrix[{}], translation ({}, {}, {})",
            self.id,
            handle.0,
            t.x,
            t.y,
            t.z
        );
    }
    fn set_matrix_array(&mut self, handle: ParameterHandle, values: &[Matrix44]) {
        log::info!(
            "program {}: matrix[{}] = {} elements",
            self.id,
            handle.0,
            values.len()
        );
    }
    fn set_texture(&mut self, handle: ParameterHandle, texture: TextureId) {
        log::info!(
            "program {}: texture[{}] = {:?}",
            self.id,
            handle.0,
            texture
        );
    }
    fn set_image_view(&mut self, handle: ParameterHandle, image: ImageViewId) {
        log::info!("program {}: image[{}] = {image:?}", self.id, handle.0);
    }
    fn set_buffer_view(&mut self, handle: ParameterHandle, buffer: BufferViewId) {
        log::info!("program {}: buffer[{}] = {buffer:?}", self.id, handle.0);
    }
    fn set_stencil_reference(&mut self, reference: u32) {
        log::info!("program {}: stencil reference = {reference:#x}", self.id);
    }
}

impl RenderView for LoggingView {
    fn program_mut(&mut self, program: ProgramId) -> Option<&mut dyn ShaderProgram> {
        self.programs
            .iter_mut()
            .find(|(id, _)| *id == program.0)
            .map(|(_, p)| p as &mut dyn ShaderProgram)
    }
    fn draw(
        &mut self,
        program: ProgramId,
        _vertex_buffer: VertexBufferView,
        _vertex_layout: VertexLayoutId,
        primitives: Primitives,
    ) {
        log::info!("draw {program:?}, {} primitives", primitives.count);
    }
    fn draw_indexed(
        &mut self,
        program: ProgramId,
        _vertex_buffer: VertexBufferView,
        _vertex_layout: VertexLayoutId,
        _index_buffer: IndexBufferView,
        primitives: Primitives,
    ) {
        log::info!("draw indexed {program:?}, {} primitives", primitives.count);
    }
    fn draw_instanced(
        &mut self,
        program: ProgramId,
        _vertex_buffer: VertexBufferView,
        _vertex_layout: VertexLayoutId,
        _index_buffer: Option<IndexBufferView>,
        _primitives: Primitives,
        instance_count: u32,
    ) {
        log::info!("draw {instance_count} instances with {program:?}");
    }
    fn draw_indirect(
        &mut self,
        program: ProgramId,
        _primitive: PrimitiveType,
        args: BufferViewId,
        draw_count: u32,
    ) {
        log::info!("draw indirect {program:?}, {draw_count} records from {args:?}");
    }
    fn dispatch(&mut self, program: ProgramId, work_size: [u32; 3]) {
        log::info!(
            "dispatch {program:?}, {}x{}x{}",
            work_size[0],
            work_size[1],
            work_size[2]
        );
    }
    fn barrier(&mut self, from: BarrierStage, to: BarrierStage) {
        log::info!("barrier {from:?} -> {to:?}");
    }
}

/// One renderable object: a program and its distance from the eye.
type Scene = Vec<(u64, f32)>;

fn simulate(frame: u32) -> Scene {
    // Program 3 does not exist in the view and will be skipped at replay.
    vec![
        (1, 14.0 + frame as f32),
        (3, 2.0),
        (2, 7.5 - frame as f32),
    ]
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut registry = HandleRegistry::new();
    let h_world = registry.handle("World");
    let h_eye = registry.handle("Eye");
    let h_albedo = registry.handle("Albedo");

    let vertex_buffer = VertexBufferView {
        buffer: BufferViewId(1),
        offset: 0,
        stride: 32,
    };

    let jobs = kiln_jobs::JobSystem::new();
    let mut ctx = RenderContext::new(64 * 1024);
    let mut view = LoggingView {
        programs: vec![
            (100, LoggingProgram { id: 100 }),
            (1, LoggingProgram { id: 1 }),
            (2, LoggingProgram { id: 2 }),
        ],
    };

    // Frame N renders the scene simulated during frame N-1 while a worker
    // simulates the next one into the other ping-pong slot.
    let mut scenes = PingPong::new(simulate(0), Scene::new());

    for frame in 1..=2u32 {
        let next = std::sync::Arc::new(std::sync::Mutex::new(Scene::new()));
        let produced = {
            let next = next.clone();
            jobs.add(move || {
                *next.lock().unwrap() = simulate(frame);
            })
        };

        // Shared per-pass parameters, attached to every draw below.
        let mut shared = ctx.begin_parameters();
        shared.set_vector(h_eye, Vector4::point(0.0, 2.0, -10.0));
        let shared = shared.end();

        // A culling dispatch that runs ahead of every draw.
        let cull = ctx.alloc_named(
            "cull",
            RenderBlock::Compute(ComputeBlock {
                program: ProgramId(100),
                params: None,
                work_size: [128, 1, 1],
            }),
        );
        ctx.compute(cull);

        for &(program, distance) in scenes.current() {
            let mut params = ctx.begin_parameters();
            params.attach(shared);
            params.set_matrix(h_world, Matrix44::translation(distance, 0.0, 0.0));
            params.set_texture(h_albedo, TextureId(program));
            let params = params.end();

            let block = ctx.alloc(RenderBlock::Draw(DrawBlock {
                distance,
                program: ProgramId(program),
                params: Some(params),
                vertex_buffer,
                vertex_layout: VertexLayoutId(1),
                primitives: Primitives::triangles(0, 36),
            }));
            ctx.draw_prioritized(RenderPriority::Opaque, block);
        }

        ctx.merge(RenderPriorityMask::ALL);
        ctx.render(&mut view);

        let stats = ctx.stats();
        log::info!(
            "frame {frame} done: {} draws, {} computes, {} of {} arena bytes",
            stats.draws,
            stats.computes,
            stats.arena_used,
            ctx.arena().capacity()
        );

        produced.wait();
        *scenes.next_mut() = next.lock().unwrap().clone();
        scenes.swap();
        ctx.begin_frame();
    }
}
