//! Avatar fetches that finish after their slot was reassigned must not land.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Poll, Waker};

use astrelis_hud::*;
use astrelis_hud_test_utils::MockRenderContext;
use glam::Vec3;

const SLICE: u32 = 2;

/// Per-avatar gates that hold a fetch pending until opened.
#[derive(Default)]
struct Gates {
    state: Mutex<HashMap<u64, Gate>>,
}

#[derive(Default)]
struct Gate {
    open: bool,
    waker: Option<Waker>,
}

impl Gates {
    fn open(&self, id: u64) {
        let mut state = self.state.lock().unwrap();
        let gate = state.entry(id).or_default();
        gate.open = true;
        if let Some(waker) = gate.waker.take() {
            waker.wake();
        }
    }

    fn poll_open(&self, id: u64, waker: &Waker) -> bool {
        let mut state = self.state.lock().unwrap();
        let gate = state.entry(id).or_default();
        if !gate.open {
            gate.waker = Some(waker.clone());
        }
        gate.open
    }
}

fn color_of(id: AvatarId) -> [u8; 4] {
    [id.0 as u8 * 40, 0, 255, 255]
}

fn gated_source(gates: Arc<Gates>) -> Arc<dyn AvatarSource> {
    Arc::new(move |id: AvatarId, _url: &str| -> FetchFuture {
        let gates = gates.clone();
        Box::pin(async move {
            futures_lite::future::poll_fn(|cx| {
                if gates.poll_open(id.0, cx.waker()) {
                    Poll::Ready(())
                } else {
                    Poll::Pending
                }
            })
            .await;
            Ok(AvatarImage::solid(SLICE, color_of(id)))
        })
    })
}

fn layer(mock: &MockRenderContext, hud: &HudSystem, slot: u32) -> Vec<u8> {
    mock.texture_layer(hud.avatars().texture(), slot).unwrap()
}

fn solid(rgba: [u8; 4]) -> Vec<u8> {
    rgba.repeat((SLICE * SLICE) as usize)
}

#[test]
fn test_stale_completion_keeps_placeholder() {
    logging::try_init();

    let gates = Arc::new(Gates::default());
    let mock = Arc::new(MockRenderContext::new());
    let config = HudConfig::default()
        .with_capacity(HudCapacity {
            max_entities: 8,
            chunk_size: 16,
            floating_text_pool: 4,
            ..Default::default()
        })
        .with_avatars(AvatarConfig {
            slice_size: SLICE,
            slice_count: 2,
            loads_per_frame: 2,
            ..Default::default()
        });
    let mut hud = HudSystem::new(
        mock.clone(),
        HudDescriptor::default()
            .with_config(config)
            .with_avatar_source(gated_source(gates.clone())),
    )
    .unwrap();

    hud.register_entity(Vec3::ZERO, "A", 1.0, AvatarId(1))
        .unwrap();
    hud.register_entity(Vec3::ZERO, "B", 1.0, AvatarId(2))
        .unwrap();
    let stats = hud.prepare();
    assert_eq!(stats.fetches_launched, 2);
    assert_eq!(hud.avatars().in_flight(), 2);

    // Avatar 3 takes slot 0 from avatar 1 while 1 is still downloading.
    hud.register_entity(Vec3::ZERO, "C", 1.0, AvatarId(3))
        .unwrap();
    assert_eq!(hud.avatars().slot_of(AvatarId(3)), Some(0));
    assert_eq!(hud.avatars().slot_of(AvatarId(1)), None);
    assert_eq!(hud.avatars().queued(), 1);

    gates.open(1);
    let stats = hud.prepare();
    assert_eq!(stats.fetches_launched, 0);
    assert_eq!(stats.fetches_completed, 1);

    let placeholder = solid(AvatarCache::PLACEHOLDER_RGBA);
    assert_eq!(layer(&mock, &hud, 0), placeholder);
    assert_eq!(layer(&mock, &hud, 1), placeholder);

    gates.open(3);
    gates.open(2);
    for _ in 0..4 {
        hud.prepare();
        if hud.avatars().in_flight() == 0 && hud.avatars().queued() == 0 {
            break;
        }
    }

    assert_eq!(hud.avatars().in_flight(), 0);
    assert_eq!(layer(&mock, &hud, 0), solid(color_of(AvatarId(3))));
    assert_eq!(layer(&mock, &hud, 1), solid(color_of(AvatarId(2))));
}

#[test]
fn test_failed_fetch_keeps_placeholder() {
    let mock = Arc::new(MockRenderContext::new());
    let config = HudConfig::default().with_avatars(AvatarConfig {
        slice_size: SLICE,
        slice_count: 4,
        ..Default::default()
    });
    let mut hud = HudSystem::new(mock.clone(), HudDescriptor::default().with_config(config))
        .unwrap();

    hud.register_entity(Vec3::ZERO, "A", 1.0, AvatarId(1))
        .unwrap();
    let stats = hud.prepare();

    assert_eq!(stats.fetches_launched, 1);
    assert_eq!(stats.fetches_completed, 1);
    assert_eq!(layer(&mock, &hud, 0), solid(AvatarCache::PLACEHOLDER_RGBA));
}
