//! Profiling utilities based on the `puffin` crate.
//!
//! Scopes are recorded only while `puffin::set_scopes_on(true)` is in effect,
//! so the per-frame scopes cost a single atomic load when profiling is off.

pub use puffin::{GlobalProfiler, profile_function, profile_scope};

#[cfg(feature = "profiling-server")]
static PROFILING_SERVER: std::sync::OnceLock<puffin_http::Server> = std::sync::OnceLock::new();

/// Default address of the puffin HTTP server.
#[cfg(feature = "profiling-server")]
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8585";

/// Enable puffin scopes and serve profiling data to `puffin_viewer`.
///
/// # Example
/// ```no_run
/// use astrelis_hud::profiling::{init_profiling, DEFAULT_SERVER_ADDR};
///
/// init_profiling(DEFAULT_SERVER_ADDR);
/// ```
#[cfg(feature = "profiling-server")]
pub fn init_profiling(addr: &str) {
    puffin::set_scopes_on(true);

    match puffin_http::Server::new(addr) {
        Ok(server) => {
            tracing::info!("Puffin profiler server started on http://{}", addr);
            let _ = PROFILING_SERVER.set(server);
        }
        Err(e) => {
            tracing::error!("Failed to start puffin server: {}", e);
        }
    }
}

/// Mark the start of a new frame for profiling.
///
/// Call this once per frame, after [`HudSystem::frame`](crate::HudSystem::frame).
#[inline]
pub fn new_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}
