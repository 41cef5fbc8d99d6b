//! Fixed-capacity CPU mirror of the instance storage buffer.
//!
//! Writes land in the CPU array only. Dirty tracking is per chunk of
//! `chunk_size` records and is decoupled from writes, so a batch writer can
//! mark its whole range once. [`InstanceStore::upload_dirty`] then copies each
//! dirty chunk (clamped to the active count) with one queue write.

use std::ops::Range;
use std::sync::Arc;

use astrelis_hud_test_utils::{GpuBuffer, RenderContext};

use crate::instance::HudInstance;
use crate::profiling::profile_function;

/// Work done by one [`InstanceStore::upload_dirty`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    /// Chunks copied to the GPU.
    pub chunks_uploaded: usize,
    /// Records copied to the GPU.
    pub instances_uploaded: usize,
    /// Dirty chunks past the active count, cleared without a copy.
    pub chunks_skipped: usize,
}

pub struct InstanceStore {
    ctx: Arc<dyn RenderContext>,
    instances: Box<[HudInstance]>,
    dirty_chunks: Box<[bool]>,
    chunk_size: usize,
    active_count: usize,
    buffer: GpuBuffer,
}

impl InstanceStore {
    /// Allocate the CPU array and a matching `STORAGE | COPY_DST` buffer.
    ///
    /// Every record starts as [`HudInstance::EMPTY`] and every chunk clean.
    ///
    /// # Panics
    /// Panics if `chunk_size` is zero.
    pub fn new(ctx: Arc<dyn RenderContext>, capacity: usize, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be non-zero");

        let buffer = ctx.create_buffer(&wgpu::BufferDescriptor {
            label: Some("HUD Instance Buffer"),
            size: capacity as u64 * HudInstance::SIZE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            ctx,
            instances: vec![HudInstance::EMPTY; capacity].into_boxed_slice(),
            dirty_chunks: vec![false; capacity.div_ceil(chunk_size)].into_boxed_slice(),
            chunk_size,
            active_count: 0,
            buffer,
        }
    }

    pub fn capacity(&self) -> usize {
        self.instances.len()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.dirty_chunks.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// The GPU storage buffer mirrored by this store.
    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }

    /// Overwrite one record. Does not mark anything dirty.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn write(&mut self, index: usize, record: HudInstance) {
        self.instances[index] = record;
    }

    #[inline]
    pub fn get(&self, index: usize) -> &HudInstance {
        &self.instances[index]
    }

    /// Mutable access to one record. Does not mark anything dirty.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut HudInstance {
        &mut self.instances[index]
    }

    /// Mutable access to a run of records. Does not mark anything dirty.
    pub fn slice_mut(&mut self, range: Range<usize>) -> &mut [HudInstance] {
        &mut self.instances[range]
    }

    pub fn slice(&self, range: Range<usize>) -> &[HudInstance] {
        &self.instances[range]
    }

    /// Move `src` so it starts at `dest`. Does not mark anything dirty.
    pub fn copy_within(&mut self, src: Range<usize>, dest: usize) {
        self.instances.copy_within(src, dest);
    }

    #[inline]
    pub fn chunk_of(&self, index: usize) -> usize {
        index / self.chunk_size
    }

    /// Out-of-range chunks are ignored.
    pub fn mark_chunk_dirty(&mut self, chunk: usize) {
        if let Some(flag) = self.dirty_chunks.get_mut(chunk) {
            *flag = true;
        }
    }

    /// Mark every chunk touched by `start..start + count`.
    pub fn mark_range_dirty(&mut self, start: usize, count: usize) {
        if count == 0 {
            return;
        }
        let first = self.chunk_of(start);
        let last = self.chunk_of(start + count - 1).min(self.dirty_chunks.len().saturating_sub(1));
        for chunk in first..=last {
            self.mark_chunk_dirty(chunk);
        }
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty_chunks.fill(true);
    }

    pub fn is_chunk_dirty(&self, chunk: usize) -> bool {
        self.dirty_chunks.get(chunk).copied().unwrap_or(false)
    }

    pub fn dirty_chunk_count(&self) -> usize {
        self.dirty_chunks.iter().filter(|&&dirty| dirty).count()
    }

    /// Set the number of live records, clamped to capacity.
    ///
    /// Returns the stored value.
    pub fn set_active_count(&mut self, count: usize) -> usize {
        self.active_count = count.min(self.capacity());
        self.active_count
    }

    /// Copy every dirty chunk's active part to the GPU and clear all flags.
    ///
    /// Chunks entirely past the active count are cleared without a copy.
    pub fn upload_dirty(&mut self) -> UploadStats {
        profile_function!();

        let mut stats = UploadStats::default();
        for chunk in 0..self.dirty_chunks.len() {
            if !self.dirty_chunks[chunk] {
                continue;
            }
            self.dirty_chunks[chunk] = false;

            let start = chunk * self.chunk_size;
            let end = (start + self.chunk_size).min(self.active_count);
            if end <= start {
                stats.chunks_skipped += 1;
                continue;
            }

            self.ctx.write_buffer(
                &self.buffer,
                start as u64 * HudInstance::SIZE,
                bytemuck::cast_slice(&self.instances[start..end]),
            );
            stats.chunks_uploaded += 1;
            stats.instances_uploaded += end - start;
        }

        if stats.chunks_uploaded > 0 {
            tracing::trace!(
                chunks = stats.chunks_uploaded,
                instances = stats.instances_uploaded,
                "uploaded dirty instance chunks"
            );
        }
        stats
    }
}
