//! Streaming avatar cache backed by a fixed-depth texture array.
//!
//! Each external avatar id is mapped to one array slice. Misses evict the
//! slice under a round-robin cursor and queue a fetch; [`AvatarCache::pump`]
//! launches queued fetches up to a concurrency budget, ticks them on an
//! executor owned by the cache and writes finished images into the array.
//!
//! Eviction does not cancel in-flight fetches. Every completion re-checks
//! that its slice still belongs to the id it was fetched for and is dropped
//! otherwise.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use ahash::{HashMap, HashMapExt};
use astrelis_hud_test_utils::{GpuTexture, GpuTextureView, RenderContext, TextureLayerWrite};
use async_executor::{Executor, Task};

use crate::{
    config::AvatarConfig,
    error::{HudError, HudResult},
    profiling::{profile_function, profile_scope},
};

/// External avatar identity (user id, portrait id, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AvatarId(pub u64);

impl std::fmt::Display for AvatarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded, tightly packed RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl AvatarImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// A square image filled with one color.
    pub fn solid(size: u32, rgba: [u8; 4]) -> Self {
        let texels = (size * size) as usize;
        Self::new(size, size, rgba.repeat(texels))
    }

    fn check_fits(&self, size: u32) -> HudResult<()> {
        let expected_len = (size as usize) * (size as usize) * 4;
        if self.width != size || self.height != size || self.rgba.len() != expected_len {
            return Err(HudError::ImageSizeMismatch {
                expected: (size, size),
                actual: (self.width, self.height),
                len: self.rgba.len(),
            });
        }
        Ok(())
    }
}

/// Future returned by an [`AvatarSource`].
pub type FetchFuture = Pin<Box<dyn Future<Output = HudResult<AvatarImage>> + Send + 'static>>;

/// The asynchronous image-fetch collaborator.
///
/// Implementations download and decode `url`; the cache only awaits the
/// returned future. Closures of the matching shape implement this trait.
pub trait AvatarSource: Send + Sync {
    fn fetch(&self, id: AvatarId, url: &str) -> FetchFuture;
}

impl<F> AvatarSource for F
where
    F: Fn(AvatarId, &str) -> FetchFuture + Send + Sync,
{
    fn fetch(&self, id: AvatarId, url: &str) -> FetchFuture {
        self(id, url)
    }
}

/// Source that fails every fetch, leaving placeholders in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAvatarSource;

impl AvatarSource for NoAvatarSource {
    fn fetch(&self, id: AvatarId, _url: &str) -> FetchFuture {
        Box::pin(async move {
            Err(HudError::FetchFailed {
                avatar_id: id.0,
                reason: "no avatar source configured".to_string(),
            })
        })
    }
}

/// A queued fetch for `id` into `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchJob {
    pub id: AvatarId,
    pub slot: usize,
}

/// The continuation of a fetch: which id and slot it was for, and the result.
#[derive(Debug)]
pub struct FetchCompletion {
    pub id: AvatarId,
    pub slot: usize,
    pub result: HudResult<AvatarImage>,
}

/// What [`AvatarCache::complete`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The image was written into the slot.
    Applied,
    /// The slot was reassigned meanwhile; the image was discarded.
    Stale,
    /// The fetch failed or returned a mis-sized image; the placeholder stays.
    Failed,
}

/// Work done by one [`AvatarCache::pump`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub launched: usize,
    /// Queued jobs dropped because their slot changed owner before launch.
    pub dropped: usize,
    pub applied: usize,
    pub stale: usize,
    pub failed: usize,
}

impl PumpStats {
    pub fn completed(&self) -> usize {
        self.applied + self.stale + self.failed
    }
}

pub struct AvatarCache {
    ctx: Arc<dyn RenderContext>,
    source: Arc<dyn AvatarSource>,
    config: AvatarConfig,
    texture: GpuTexture,
    view: GpuTextureView,
    placeholder: Box<[u8]>,
    slot_to_id: Box<[Option<AvatarId>]>,
    id_to_slot: HashMap<AvatarId, usize>,
    cursor: usize,
    load_queue: VecDeque<FetchJob>,
    executor: Executor<'static>,
    in_flight: Vec<Task<FetchCompletion>>,
}

impl AvatarCache {
    /// Opaque mid-gray shown until an avatar arrives.
    pub const PLACEHOLDER_RGBA: [u8; 4] = [128, 128, 128, 255];

    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Create the texture array and fill every slice with the placeholder.
    pub fn new(
        ctx: Arc<dyn RenderContext>,
        source: Arc<dyn AvatarSource>,
        config: AvatarConfig,
    ) -> Self {
        let capacity = config.slice_count as usize;
        let texture = ctx.create_texture(&wgpu::TextureDescriptor {
            label: Some("HUD Avatar Array"),
            size: wgpu::Extent3d {
                width: config.slice_size,
                height: config.slice_size,
                depth_or_array_layers: config.slice_count,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = ctx.create_texture_view(
            &texture,
            &wgpu::TextureViewDescriptor {
                label: Some("HUD Avatar Array View"),
                dimension: Some(wgpu::TextureViewDimension::D2Array),
                ..Default::default()
            },
        );

        let placeholder = AvatarImage::solid(config.slice_size, Self::PLACEHOLDER_RGBA)
            .rgba
            .into_boxed_slice();

        let cache = Self {
            ctx,
            source,
            texture,
            view,
            placeholder,
            slot_to_id: vec![None; capacity].into_boxed_slice(),
            id_to_slot: HashMap::with_capacity(capacity),
            cursor: 0,
            load_queue: VecDeque::with_capacity(capacity),
            executor: Executor::new(),
            in_flight: Vec::with_capacity(config.loads_per_frame),
            config,
        };
        for slot in 0..capacity {
            cache.write_slice(slot, &cache.placeholder);
        }

        tracing::debug!(
            "Avatar cache created: {} slices of {}px",
            capacity,
            cache.config.slice_size
        );
        cache
    }

    pub fn capacity(&self) -> usize {
        self.slot_to_id.len()
    }

    pub fn texture(&self) -> &GpuTexture {
        &self.texture
    }

    /// `D2Array` view over every slice.
    pub fn view(&self) -> &GpuTextureView {
        &self.view
    }

    /// Slot currently assigned to `id`.
    pub fn slot_of(&self, id: AvatarId) -> Option<usize> {
        self.id_to_slot.get(&id).copied()
    }

    /// Id currently owning `slot`.
    pub fn owner(&self, slot: usize) -> Option<AvatarId> {
        self.slot_to_id.get(slot).copied().flatten()
    }

    /// Jobs waiting for a launch.
    pub fn queued(&self) -> usize {
        self.load_queue.len()
    }

    /// Fetches launched and not yet harvested.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// The slot for `id`, assigning (and queueing a fetch) on a miss.
    ///
    /// A miss takes the slot under the round-robin cursor, unmapping its
    /// previous owner and resetting it to the placeholder.
    pub fn get_or_assign(&mut self, id: AvatarId) -> usize {
        if let Some(&slot) = self.id_to_slot.get(&id) {
            return slot;
        }

        let slot = self.cursor;
        self.cursor = (slot + 1) % self.slot_to_id.len();

        if let Some(evicted) = self.slot_to_id[slot].take() {
            self.id_to_slot.remove(&evicted);
            self.write_slice(slot, &self.placeholder);
            tracing::trace!("Avatar {} evicted from slot {} for {}", evicted, slot, id);
        }

        self.slot_to_id[slot] = Some(id);
        self.id_to_slot.insert(id, slot);

        // An id can come back to the slot it was evicted from before its
        // first job was launched.
        let job = FetchJob { id, slot };
        if !self.load_queue.contains(&job) {
            self.load_queue.push_back(job);
        }
        slot
    }

    /// Launch queued fetches while fewer than `max_concurrent` are in flight,
    /// drive the executor, and apply every finished fetch.
    pub fn pump(&mut self, max_concurrent: usize) -> PumpStats {
        profile_function!();

        let mut stats = PumpStats::default();
        if self.load_queue.is_empty() && self.in_flight.is_empty() {
            return stats;
        }

        while self.in_flight.len() < max_concurrent {
            let Some(job) = self.load_queue.pop_front() else {
                break;
            };
            if self.owner(job.slot) != Some(job.id) {
                tracing::trace!(
                    "Dropping queued fetch of {} for reassigned slot {}",
                    job.id,
                    job.slot
                );
                stats.dropped += 1;
                continue;
            }
            self.launch(job);
            stats.launched += 1;
        }

        {
            profile_scope!("drive_fetches");
            // One poll per in-flight fetch at most; a fetch that keeps waking
            // itself finishes on a later frame.
            for _ in 0..self.in_flight.len() {
                if !self.executor.try_tick() {
                    break;
                }
            }
        }

        let mut i = 0;
        while i < self.in_flight.len() {
            if !self.in_flight[i].is_finished() {
                i += 1;
                continue;
            }
            let task = self.in_flight.swap_remove(i);
            let completion = futures_lite::future::block_on(task);
            match self.complete(completion) {
                CompletionOutcome::Applied => stats.applied += 1,
                CompletionOutcome::Stale => stats.stale += 1,
                CompletionOutcome::Failed => stats.failed += 1,
            }
        }

        stats
    }

    fn launch(&mut self, job: FetchJob) {
        let url = self.config.url_for(job.id.0);
        let fetch = self.source.fetch(job.id, &url);
        let FetchJob { id, slot } = job;
        let task = self.executor.spawn(async move {
            FetchCompletion {
                id,
                slot,
                result: fetch.await,
            }
        });
        self.in_flight.push(task);
    }

    /// Apply a finished fetch.
    ///
    /// The image is written only if `slot` still belongs to `id`. Stale
    /// completions and failures are logged and otherwise ignored.
    pub fn complete(&mut self, completion: FetchCompletion) -> CompletionOutcome {
        let FetchCompletion { id, slot, result } = completion;

        if self.owner(slot) != Some(id) {
            tracing::trace!("Discarding avatar {} for slot {} (reassigned)", id, slot);
            return CompletionOutcome::Stale;
        }

        let image = match result.and_then(|image| {
            image.check_fits(self.config.slice_size)?;
            Ok(image)
        }) {
            Ok(image) => image,
            Err(err) => {
                tracing::debug!("Avatar {} stays on placeholder: {}", id, err);
                return CompletionOutcome::Failed;
            }
        };

        self.write_slice(slot, &image.rgba);
        CompletionOutcome::Applied
    }

    /// Write a local image straight into `slot`, bypassing the id mapping.
    pub fn set_slice_direct(&mut self, slot: usize, image: &AvatarImage) -> HudResult<()> {
        if slot >= self.capacity() {
            return Err(HudError::SlotOutOfRange {
                slot,
                capacity: self.capacity(),
            });
        }
        image.check_fits(self.config.slice_size)?;
        self.write_slice(slot, &image.rgba);
        Ok(())
    }

    fn write_slice(&self, slot: usize, rgba: &[u8]) {
        let size = self.config.slice_size;
        self.ctx.write_texture_layer(
            &self.texture,
            TextureLayerWrite {
                layer: slot as u32,
                width: size,
                height: size,
                bytes_per_row: size * 4,
            },
            rgba,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrelis_hud_test_utils::MockRenderContext;
    use std::sync::atomic::{AtomicBool, Ordering};

    const SIZE: u32 = 2;

    #[derive(Default)]
    struct SeenUrls(std::sync::Mutex<Vec<String>>);

    impl SeenUrls {
        fn push(&self, url: &str) {
            self.0.lock().unwrap().push(url.to_string());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    fn config(slices: u32) -> AvatarConfig {
        AvatarConfig {
            slice_size: SIZE,
            slice_count: slices,
            loads_per_frame: 2,
            cdn_base_url: "https://cdn.test".into(),
        }
    }

    /// Source that answers immediately with a solid image whose red channel
    /// is the low byte of the id.
    fn instant_source() -> Arc<dyn AvatarSource> {
        Arc::new(|id: AvatarId, _url: &str| -> FetchFuture {
            Box::pin(async move { Ok(AvatarImage::solid(SIZE, [id.0 as u8, 0, 0, 255])) })
        })
    }

    fn cache(slices: u32, source: Arc<dyn AvatarSource>) -> (Arc<MockRenderContext>, AvatarCache) {
        let mock = Arc::new(MockRenderContext::new());
        let cache = AvatarCache::new(mock.clone(), source, config(slices));
        (mock, cache)
    }

    #[test]
    fn test_slices_start_as_placeholder() {
        let (mock, cache) = cache(3, instant_source());
        assert_eq!(mock.count_texture_writes(), 3);
        assert_eq!(
            mock.texture_layer(cache.texture(), 2),
            Some(AvatarCache::PLACEHOLDER_RGBA.repeat(4))
        );
    }

    #[test]
    fn test_get_or_assign_idempotent() {
        let (_mock, mut cache) = cache(4, instant_source());

        let slot = cache.get_or_assign(AvatarId(7));
        assert_eq!(cache.get_or_assign(AvatarId(7)), slot);
        assert_eq!(cache.queued(), 1);
        assert_eq!(cache.owner(slot), Some(AvatarId(7)));
    }

    #[test]
    fn test_round_robin_evicts_oldest() {
        let (_mock, mut cache) = cache(3, instant_source());

        let slots: Vec<usize> = (1..=3).map(|id| cache.get_or_assign(AvatarId(id))).collect();
        assert_eq!(slots, vec![0, 1, 2]);

        // Reusing id 1 does not refresh it; it is still evicted first.
        cache.get_or_assign(AvatarId(1));
        assert_eq!(cache.get_or_assign(AvatarId(4)), 0);
        assert_eq!(cache.slot_of(AvatarId(1)), None);
        assert_eq!(cache.slot_of(AvatarId(4)), Some(0));
        assert_eq!(cache.get_or_assign(AvatarId(5)), 1);
        assert_eq!(cache.slot_of(AvatarId(2)), None);
    }

    #[test]
    fn test_pump_respects_budget() {
        let (mock, mut cache) = cache(8, instant_source());
        for id in 1..=5 {
            cache.get_or_assign(AvatarId(id));
        }
        mock.clear_calls();

        let stats = cache.pump(2);
        assert_eq!(stats.launched, 2);
        assert_eq!(stats.applied, 2);
        assert_eq!(cache.queued(), 3);
        assert_eq!(mock.texture_layer_writes(cache.texture()), vec![0, 1]);
        assert_eq!(
            mock.texture_layer(cache.texture(), 1),
            Some([2, 0, 0, 255].repeat(4))
        );

        cache.pump(2);
        cache.pump(2);
        assert_eq!(cache.queued(), 0);
        assert_eq!(cache.in_flight(), 0);
        assert_eq!(mock.count_texture_writes(), 5);
    }

    #[test]
    fn test_stale_completion_discarded() {
        let (mock, mut cache) = cache(1, instant_source());

        let slot_a = cache.get_or_assign(AvatarId(10));
        let slot_b = cache.get_or_assign(AvatarId(20));
        assert_eq!(slot_a, slot_b);
        mock.clear_calls();

        let outcome = cache.complete(FetchCompletion {
            id: AvatarId(10),
            slot: slot_a,
            result: Ok(AvatarImage::solid(SIZE, [10, 0, 0, 255])),
        });

        assert_eq!(outcome, CompletionOutcome::Stale);
        assert_eq!(mock.count_texture_writes(), 0);
        assert_eq!(
            mock.texture_layer(cache.texture(), 0),
            Some(AvatarCache::PLACEHOLDER_RGBA.repeat(4))
        );
    }

    #[test]
    fn test_queued_job_for_reassigned_slot_dropped() {
        let (_mock, mut cache) = cache(1, instant_source());
        cache.get_or_assign(AvatarId(1));
        cache.get_or_assign(AvatarId(2));

        let stats = cache.pump(1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.launched, 1);
        assert_eq!(stats.applied, 1);
    }

    #[test]
    fn test_reassigned_to_same_slot_fetched_once() {
        let seen = Arc::new(SeenUrls::default());
        let sink = seen.clone();
        let source: Arc<dyn AvatarSource> = Arc::new(move |id: AvatarId, url: &str| -> FetchFuture {
            sink.push(url);
            Box::pin(async move { Ok(AvatarImage::solid(SIZE, [id.0 as u8, 0, 0, 255])) })
        });
        let (mock, mut cache) = cache(1, source);

        cache.get_or_assign(AvatarId(1));
        cache.get_or_assign(AvatarId(2));
        assert_eq!(cache.get_or_assign(AvatarId(1)), 0);
        assert_eq!(cache.queued(), 2);

        let stats = cache.pump(2);
        assert_eq!(stats.launched, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.applied, 1);
        assert_eq!(cache.queued(), 0);
        assert_eq!(seen.take(), vec!["https://cdn.test/avatars/1.png".to_string()]);
        assert_eq!(
            mock.texture_layer(cache.texture(), 0),
            Some([1, 0, 0, 255].repeat(4))
        );
    }

    #[test]
    fn test_self_waking_fetch_does_not_block_pump() {
        let ready = Arc::new(AtomicBool::new(false));
        let flag = ready.clone();
        let source: Arc<dyn AvatarSource> = Arc::new(move |_id: AvatarId, _url: &str| -> FetchFuture {
            let flag = flag.clone();
            Box::pin(async move {
                while !flag.load(Ordering::Acquire) {
                    futures_lite::future::yield_now().await;
                }
                Ok(AvatarImage::solid(SIZE, [9, 9, 9, 255]))
            })
        });
        let (mock, mut cache) = cache(2, source);
        cache.get_or_assign(AvatarId(1));

        let stats = cache.pump(1);
        assert_eq!(stats.launched, 1);
        assert_eq!(stats.completed(), 0);
        assert_eq!(cache.in_flight(), 1);

        // Still pending on the next frame without a new launch.
        assert_eq!(cache.pump(1), PumpStats::default());
        assert_eq!(cache.in_flight(), 1);

        ready.store(true, Ordering::Release);
        assert_eq!(cache.pump(1).applied, 1);
        assert_eq!(cache.in_flight(), 0);
        assert_eq!(
            mock.texture_layer(cache.texture(), 0),
            Some([9, 9, 9, 255].repeat(4))
        );
    }

    #[test]
    fn test_failed_fetch_keeps_placeholder() {
        let (mock, mut cache) = cache(2, Arc::new(NoAvatarSource));
        cache.get_or_assign(AvatarId(3));
        mock.clear_calls();

        let stats = cache.pump(2);
        assert_eq!(stats.failed, 1);
        assert_eq!(mock.count_texture_writes(), 0);

        // Not retried.
        assert_eq!(cache.pump(2), PumpStats::default());
    }

    #[test]
    fn test_mis_sized_image_rejected() {
        let source: Arc<dyn AvatarSource> = Arc::new(|_id: AvatarId, _url: &str| -> FetchFuture {
            Box::pin(async { Ok(AvatarImage::solid(SIZE + 1, [0; 4])) })
        });
        let (_mock, mut cache) = cache(2, source);
        cache.get_or_assign(AvatarId(1));
        assert_eq!(cache.pump(1).failed, 1);
    }

    #[test]
    fn test_fetch_receives_cdn_url() {
        let seen = Arc::new(SeenUrls::default());
        let sink = seen.clone();
        let source: Arc<dyn AvatarSource> = Arc::new(move |_id: AvatarId, url: &str| -> FetchFuture {
            sink.push(url);
            Box::pin(async { Ok(AvatarImage::solid(SIZE, [0; 4])) })
        });
        let (_mock, mut cache) = cache(2, source);
        cache.get_or_assign(AvatarId(99));
        cache.pump(1);

        assert_eq!(seen.take(), vec!["https://cdn.test/avatars/99.png".to_string()]);
    }

    #[test]
    fn test_set_slice_direct() {
        let (mock, mut cache) = cache(2, instant_source());
        let image = AvatarImage::solid(SIZE, [1, 2, 3, 4]);

        cache.set_slice_direct(1, &image).unwrap();
        assert_eq!(mock.texture_layer(cache.texture(), 1), Some(image.rgba.clone()));

        assert!(matches!(
            cache.set_slice_direct(2, &image),
            Err(HudError::SlotOutOfRange { slot: 2, capacity: 2 })
        ));
        assert!(matches!(
            cache.set_slice_direct(0, &AvatarImage::solid(1, [0; 4])),
            Err(HudError::ImageSizeMismatch { .. })
        ));
    }
}
