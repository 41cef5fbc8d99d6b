//! Steady-state frames must not touch the heap.
//!
//! A counting global allocator tracks allocations made by the test thread
//! while armed. GPU writes go through a context that only counts them, since
//! the recording mock itself allocates per call.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use astrelis_hud::*;
use astrelis_hud_test_utils::{
    GpuBindGroup, GpuBindGroupDescriptor, GpuBindGroupLayout, GpuBuffer, GpuRenderPipeline,
    GpuRenderPipelineDescriptor, GpuSampler, GpuShaderModule, GpuTexture, GpuTextureView,
    MockRenderContext, TextureLayerWrite,
};
use glam::Vec3;

struct CountingAllocator;

thread_local! {
    static ARMED: Cell<bool> = const { Cell::new(false) };
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

fn note_allocation() {
    let armed = ARMED.try_with(Cell::get).unwrap_or(false);
    if armed {
        let _ = ALLOCATIONS.try_with(|count| count.set(count.get() + 1));
    }
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        note_allocation();
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        note_allocation();
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

/// Allocations made by `f` on this thread.
fn count_allocations(f: impl FnOnce()) -> usize {
    ALLOCATIONS.with(|count| count.set(0));
    ARMED.with(|armed| armed.set(true));
    f();
    ARMED.with(|armed| armed.set(false));
    ALLOCATIONS.with(Cell::get)
}

/// Creates resources through the mock but only counts queue writes.
#[derive(Default)]
struct CountingContext {
    inner: MockRenderContext,
    buffer_writes: AtomicUsize,
    texture_writes: AtomicUsize,
}

impl RenderContext for CountingContext {
    fn create_buffer(&self, desc: &wgpu::BufferDescriptor) -> GpuBuffer {
        self.inner.create_buffer(desc)
    }

    fn write_buffer(&self, _buffer: &GpuBuffer, _offset: u64, _data: &[u8]) {
        self.buffer_writes.fetch_add(1, Ordering::Relaxed);
    }

    fn create_texture(&self, desc: &wgpu::TextureDescriptor) -> GpuTexture {
        self.inner.create_texture(desc)
    }

    fn write_texture_layer(&self, _texture: &GpuTexture, _write: TextureLayerWrite, _data: &[u8]) {
        self.texture_writes.fetch_add(1, Ordering::Relaxed);
    }

    fn create_texture_view(
        &self,
        texture: &GpuTexture,
        desc: &wgpu::TextureViewDescriptor,
    ) -> GpuTextureView {
        self.inner.create_texture_view(texture, desc)
    }

    fn create_sampler(&self, desc: &wgpu::SamplerDescriptor) -> GpuSampler {
        self.inner.create_sampler(desc)
    }

    fn create_shader_module(&self, desc: &wgpu::ShaderModuleDescriptor) -> GpuShaderModule {
        self.inner.create_shader_module(desc)
    }

    fn create_bind_group_layout(
        &self,
        desc: &wgpu::BindGroupLayoutDescriptor,
    ) -> GpuBindGroupLayout {
        self.inner.create_bind_group_layout(desc)
    }

    fn create_bind_group(&self, desc: &GpuBindGroupDescriptor) -> GpuBindGroup {
        self.inner.create_bind_group(desc)
    }

    fn create_render_pipeline(&self, desc: &GpuRenderPipelineDescriptor) -> GpuRenderPipeline {
        self.inner.create_render_pipeline(desc)
    }
}

#[derive(Default)]
struct CountingPass {
    draws: usize,
}

impl DrawTarget for CountingPass {
    fn draw_indexed_indirect(&mut self, _draw: &IndexedIndirectDraw<'_>) {
        self.draws += 1;
    }
}

const FRAME: f32 = 1.0 / 60.0;

fn populated_hud() -> (Arc<CountingContext>, ManualClock, HudSystem, Vec<EntityId>) {
    let ctx = Arc::new(CountingContext::default());
    let clock = ManualClock::new(0.0);
    let config = HudConfig::default()
        .with_capacity(HudCapacity {
            max_entities: 256,
            ..Default::default()
        })
        .with_avatars(AvatarConfig {
            slice_size: 4,
            slice_count: 16,
            ..Default::default()
        });
    let mut hud = HudSystem::new(
        ctx.clone(),
        HudDescriptor::default()
            .with_config(config)
            .with_clock(Arc::new(clock.clone())),
    )
    .unwrap();

    let spawns: Vec<EntitySpawn> = (0..200)
        .map(|i| EntitySpawn {
            position: Vec3::new(i as f32, 0.0, 0.0),
            label: "Skeleton",
            health: 1.0,
            avatar: AvatarId(i % 8),
        })
        .collect();
    let ids = hud.register_entities(&spawns).unwrap();
    (ctx, clock, hud, ids)
}

/// Run frames until avatar fetches and initial uploads have settled.
fn warm_up(hud: &mut HudSystem, clock: &ManualClock, pass: &mut CountingPass) {
    for _ in 0..64 {
        clock.advance(FRAME);
        hud.frame(pass);
    }
    assert_eq!(hud.avatars().queued(), 0);
    assert_eq!(hud.avatars().in_flight(), 0);
}

#[test]
fn test_idle_frames_do_not_allocate() {
    let (ctx, clock, mut hud, _ids) = populated_hud();
    let mut pass = CountingPass::default();
    warm_up(&mut hud, &clock, &mut pass);
    pass.draws = 0;
    let texture_writes = ctx.texture_writes.load(Ordering::Relaxed);

    let allocations = count_allocations(|| {
        for _ in 0..1000 {
            clock.advance(FRAME);
            hud.prepare();
            hud.render(&mut pass);
        }
    });

    assert_eq!(allocations, 0);
    assert_eq!(pass.draws, 1000);
    assert!(ctx.buffer_writes.load(Ordering::Relaxed) >= 2000);
    assert_eq!(ctx.texture_writes.load(Ordering::Relaxed), texture_writes);
}

#[test]
fn test_busy_frames_do_not_allocate() {
    let (_ctx, clock, mut hud, ids) = populated_hud();
    let mut pass = CountingPass::default();

    // One round of every mutation so lazily initialised paths run before counting.
    hud.update_health(ids[0], 0.5).unwrap();
    hud.update_position(ids[0], Vec3::ONE).unwrap();
    hud.spawn_floating_text(Vec3::ZERO, 12.0, FloatingTextStyle::Damage);
    warm_up(&mut hud, &clock, &mut pass);

    let allocations = count_allocations(|| {
        for frame in 0..1000usize {
            let id = ids[frame % ids.len()];
            clock.advance(FRAME);
            hud.update_health(id, (frame % 100) as f32 / 100.0).unwrap();
            hud.update_position(id, Vec3::new(frame as f32, 0.0, 0.0))
                .unwrap();
            hud.spawn_floating_text(Vec3::ZERO, frame as f32, FloatingTextStyle::Critical);
            hud.frame(&mut pass);
        }
    });

    assert_eq!(allocations, 0);
}
