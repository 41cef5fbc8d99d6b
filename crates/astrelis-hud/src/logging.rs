//! `tracing` subscriber setup.
//!
//! The HUD itself only emits events; installing a subscriber is left to the
//! host. These helpers cover tests, benches and small tools.

/// Default filter: HUD events at debug, GPU stack at warn.
pub const DEFAULT_FILTER: &str = "info,astrelis_hud=debug,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Install a global fmt subscriber.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`] when set.
///
/// # Panics
/// Panics if a global subscriber is already installed.
pub fn init() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

/// Like [`init`], but returns `false` instead of panicking when a subscriber
/// is already installed. Safe to call from every test.
pub fn try_init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init()
        .is_ok()
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER))
}
