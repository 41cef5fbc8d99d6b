//! Ring buffer of floating-text animation records.
//!
//! The GPU reads every record each frame and derives rise, bounce and fade
//! from the running time; the CPU only writes a record when text spawns. The
//! pool is small and bursty, so it is uploaded whole whenever it is dirty.

use std::sync::Arc;

use astrelis_hud_test_utils::{GpuBuffer, RenderContext};
use bytemuck::{Pod, Zeroable};

use crate::profiling::profile_function;

/// Per-animation metadata read by the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FloatingTextRecord {
    /// Clock reading at spawn, in seconds.
    pub start_time: f32,
    pub duration: f32,
    pub value: f32,
    /// See [`FloatingTextFlags`](crate::FloatingTextFlags).
    pub style_flags: u32,
}

impl FloatingTextRecord {
    /// A record whose time window ended long ago. Never visible.
    pub const EXPIRED: FloatingTextRecord = FloatingTextRecord {
        start_time: -999.0,
        duration: 0.01,
        value: 0.0,
        style_flags: 0,
    };

    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Whether the animation has finished at time `now`.
    pub fn is_expired(&self, now: f32) -> bool {
        now - self.start_time >= self.duration
    }
}

pub struct AnimationPool {
    ctx: Arc<dyn RenderContext>,
    records: Box<[FloatingTextRecord]>,
    cursor: usize,
    dirty: bool,
    /// Latest end time of any record written so far.
    live_until: f32,
    buffer: GpuBuffer,
}

impl AnimationPool {
    /// Create a pool of `capacity` expired records and upload it once.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(ctx: Arc<dyn RenderContext>, capacity: usize) -> Self {
        assert!(capacity > 0, "floating text pool must not be empty");

        let buffer = ctx.create_buffer(&wgpu::BufferDescriptor {
            label: Some("HUD Floating Text Buffer"),
            size: capacity as u64 * FloatingTextRecord::SIZE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let records = vec![FloatingTextRecord::EXPIRED; capacity].into_boxed_slice();
        ctx.write_buffer(&buffer, 0, bytemuck::cast_slice(&records));

        Self {
            ctx,
            records,
            cursor: 0,
            dirty: false,
            live_until: f32::NEG_INFINITY,
            buffer,
        }
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }

    pub fn get(&self, slot: usize) -> &FloatingTextRecord {
        &self.records[slot]
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Slot the next [`write`](Self::write) will overwrite.
    pub fn next_slot(&self) -> usize {
        self.cursor
    }

    /// Overwrite the next slot in ring order and return its index.
    ///
    /// On wraparound the oldest animation is replaced even if it is still
    /// running.
    pub fn write(&mut self, record: FloatingTextRecord) -> usize {
        let slot = self.cursor;
        self.cursor = (slot + 1) % self.records.len();
        self.records[slot] = record;
        self.dirty = true;
        self.live_until = self.live_until.max(record.start_time + record.duration);
        slot
    }

    /// Whether every animation has finished at time `now`.
    pub fn is_idle(&self, now: f32) -> bool {
        now >= self.live_until
    }

    /// Whether the animation in `slot` is still running at time `now`.
    pub fn is_live(&self, slot: usize, now: f32) -> bool {
        !self.records[slot].is_expired(now)
    }

    /// Upload the whole pool if anything changed. Returns whether it did.
    pub fn upload(&mut self) -> bool {
        profile_function!();

        if !self.dirty {
            return false;
        }
        self.ctx
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.records));
        self.dirty = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrelis_hud_test_utils::MockRenderContext;

    fn record(start_time: f32) -> FloatingTextRecord {
        FloatingTextRecord {
            start_time,
            duration: 0.8,
            value: 10.0,
            style_flags: 0,
        }
    }

    #[test]
    fn test_record_size() {
        assert_eq!(std::mem::size_of::<FloatingTextRecord>(), 16);
    }

    #[test]
    fn test_initial_upload_is_expired() {
        let mock = Arc::new(MockRenderContext::new());
        let pool = AnimationPool::new(mock.clone(), 4);

        assert_eq!(mock.count_buffer_writes(), 1);
        assert!(!pool.is_dirty());
        let contents = mock.buffer_contents(pool.buffer());
        let first: FloatingTextRecord = bytemuck::pod_read_unaligned(&contents[..16]);
        assert_eq!(first, FloatingTextRecord::EXPIRED);
        assert!(first.is_expired(0.0));
    }

    #[test]
    fn test_ring_wraps_and_clobbers_oldest() {
        let mock = Arc::new(MockRenderContext::new());
        let mut pool = AnimationPool::new(mock, 3);

        let slots: Vec<usize> = (0..5).map(|i| pool.write(record(i as f32))).collect();

        assert_eq!(slots, vec![0, 1, 2, 0, 1]);
        assert_eq!(pool.get(0).start_time, 3.0);
        assert_eq!(pool.get(1).start_time, 4.0);
        assert_eq!(pool.get(2).start_time, 2.0);
        assert_eq!(pool.next_slot(), 2);
    }

    #[test]
    fn test_upload_only_when_dirty() {
        let mock = Arc::new(MockRenderContext::new());
        let mut pool = AnimationPool::new(mock.clone(), 8);
        mock.clear_calls();

        assert!(!pool.upload());
        pool.write(record(1.0));
        pool.write(record(2.0));
        assert!(pool.upload());
        assert!(!pool.upload());

        assert_eq!(mock.buffer_writes(pool.buffer()), vec![(0, 8 * 16)]);
    }

    #[test]
    fn test_idle_tracks_latest_end() {
        let mock = Arc::new(MockRenderContext::new());
        let mut pool = AnimationPool::new(mock, 4);
        assert!(pool.is_idle(0.0));

        pool.write(record(2.0));
        pool.write(record(1.0));
        assert!(!pool.is_idle(2.5));
        assert!(pool.is_live(0, 2.5));
        assert!(!pool.is_live(1, 2.5));
        assert!(!pool.is_live(2, 2.5));
        assert!(pool.is_idle(2.9));
    }

    #[test]
    fn test_expiry_window() {
        let r = record(1.0);
        assert!(!r.is_expired(1.5));
        assert!(r.is_expired(1.9));
    }
}
