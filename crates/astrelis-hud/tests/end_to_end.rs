//! One full frame through the public API against the mock GPU.

use std::sync::Arc;

use astrelis_hud::*;
use astrelis_hud_test_utils::{MockRenderContext, MockRenderPass};
use glam::Vec3;

fn instances_in(bytes: &[u8], range: std::ops::Range<usize>) -> Vec<HudInstance> {
    let size = HudInstance::SIZE as usize;
    range
        .map(|i| bytemuck::pod_read_unaligned(&bytes[i * size..(i + 1) * size]))
        .collect()
}

#[test]
fn test_three_entities_and_a_critical_hit() {
    logging::try_init();

    let mock = Arc::new(MockRenderContext::new());
    let clock = ManualClock::new(5.0);
    let mut hud = HudSystem::new(
        mock.clone(),
        HudDescriptor::default().with_clock(Arc::new(clock.clone())),
    )
    .unwrap();

    let positions = [
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(4.0, 1.0, 0.0),
        Vec3::new(8.0, 1.0, 0.0),
    ];
    let ids: Vec<EntityId> = positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            hud.register_entity(position, "Goblin", 1.0, AvatarId(100 + i as u64))
                .unwrap()
        })
        .collect();

    hud.update_health(ids[1], 0.25).unwrap();
    let slot = hud.spawn_floating_text(positions[2], 999.0, FloatingTextStyle::Critical);

    let mut pass = MockRenderPass::new();
    let stats = hud.prepare();
    assert!(hud.render(&mut pass));

    // Entity spans then the whole floating-text region.
    let expected_count = 3 * 16 + 512 * 6;
    assert_eq!(hud.total_instance_count(), expected_count);
    assert_eq!(stats.instance_count, expected_count);
    assert!(stats.pool_uploaded);

    // CPU mirror
    let region_start = hud.animator().region_start();
    assert_eq!(region_start, 48);
    let span = hud.animator().digit_span(slot);
    let digits: Vec<&HudInstance> = hud
        .store()
        .slice(span.clone())
        .iter()
        .filter(|r| r.is_visible())
        .collect();
    assert_eq!(digits.len(), 3);

    let nine = UvRect::new(0.5625, 0.9375, 0.0625, 0.0625);
    for digit in &digits {
        assert_eq!(digit.kind(), Some(ElementKind::FloatingText));
        assert_eq!(digit.uv_rect, nine.to_array());
        assert_eq!(digit.size, [42.0, 42.0]);
        assert_eq!(digit.world_position, [8.0, 1.0, 0.0]);
        assert_eq!(digit.color[3], 5.0);
        assert_eq!(digit.flags.reserved(), slot as u32);
    }

    // GPU shadow of the instance buffer
    let gpu = mock.buffer_contents(hud.store().buffer());
    let uploaded = instances_in(&gpu, span);
    assert_eq!(uploaded.iter().filter(|r| r.is_visible()).count(), 3);
    assert_eq!(uploaded.as_slice(), hud.store().slice(hud.animator().digit_span(slot)));

    let foreground = instances_in(&gpu, 16 + 2..16 + 3)[0];
    assert_eq!(foreground.color, health_color(0.25).to_array());

    // Pool record
    let record = hud.pool().get(slot);
    assert_eq!(record.style_flags, 0b110);
    assert_eq!(record.start_time, 5.0);
    assert_eq!(record.value, 999.0);

    // Exactly one indirect draw covering every active instance
    assert_eq!(pass.draw_count(), 1);
    let args = mock.buffer_contents(hud.renderer().indirect_buffer());
    let instance_count: u32 = bytemuck::pod_read_unaligned(&args[4..8]);
    let index_count: u32 = bytemuck::pod_read_unaligned(&args[0..4]);
    assert_eq!(instance_count as usize, expected_count);
    assert_eq!(index_count, 6);
    assert_eq!(pass.draws()[0].indirect_offset, 0);
}

#[test]
fn test_idle_frame_uploads_nothing() {
    let mock = Arc::new(MockRenderContext::new());
    let clock = ManualClock::new(0.0);
    let mut hud = HudSystem::new(
        mock.clone(),
        HudDescriptor::default().with_clock(Arc::new(clock.clone())),
    )
    .unwrap();
    hud.register_entity(Vec3::ZERO, "Idle", 1.0, AvatarId(1))
        .unwrap();

    let mut pass = MockRenderPass::new();
    hud.frame(&mut pass);
    // Let the failed placeholder fetch settle.
    hud.frame(&mut pass);

    let stats = hud.frame(&mut pass);
    assert_eq!(stats.chunks_uploaded, 0);
    assert!(!stats.pool_uploaded);
    assert_eq!(stats.draws, 1);
    assert_eq!(pass.draw_count(), 3);
}
