use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kiln_core::{
    BufferViewId, Matrix44, ParameterHandle, Primitives, ProgramId, Vector4, VertexBufferView,
    VertexLayoutId,
};
use kiln_render::{
    DrawBlock, FrameArena, RenderBlock, RenderContext, RenderPriority, RenderPriorityMask,
};

fn draw_block(distance: f32) -> RenderBlock {
    RenderBlock::Draw(DrawBlock {
        distance,
        program: ProgramId(1),
        params: None,
        vertex_buffer: VertexBufferView {
            buffer: BufferViewId(1),
            offset: 0,
            stride: 32,
        },
        vertex_layout: VertexLayoutId(1),
        primitives: Primitives::triangles(0, 36),
    })
}

fn bench_arena(c: &mut Criterion) {
    let mut group = c.benchmark_group("Frame Arena");

    group.bench_function("alloc 10k blocks", |b| {
        let mut arena = FrameArena::new(4 * 1024 * 1024);
        b.iter(|| {
            arena.reset();
            for i in 0..10_000 {
                let slot = arena.alloc_value(draw_block(i as f32));
                black_box(slot);
            }
        });
    });

    group.bench_function("encode 1k parameter streams", |b| {
        let mut ctx = RenderContext::new(4 * 1024 * 1024);
        let world = Matrix44::translation(1.0, 2.0, 3.0);
        b.iter(|| {
            ctx.begin_frame();
            for i in 0..1_000u16 {
                let mut writer = ctx.begin_parameters();
                writer.set_matrix(ParameterHandle(0), world);
                writer.set_vector(ParameterHandle(1), Vector4::point(0.0, 1.0, 0.0));
                writer.set_float(ParameterHandle(2), i as f32);
                black_box(writer.end());
            }
        });
    });

    group.finish();
}

fn bench_record_and_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("Render Context");

    group.bench_function("record + merge 10k prioritized draws", |b| {
        let mut ctx = RenderContext::new(4 * 1024 * 1024);
        b.iter(|| {
            ctx.begin_frame();
            for i in 0..10_000u32 {
                // Reverse distances so the sort does real work.
                let slot = ctx.alloc(draw_block((10_000 - i) as f32));
                ctx.draw_prioritized(RenderPriority::Opaque, slot);
            }
            ctx.merge(RenderPriorityMask::ALL);
            black_box(ctx.stats());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_arena, bench_record_and_merge);
criterion_main!(benches);
