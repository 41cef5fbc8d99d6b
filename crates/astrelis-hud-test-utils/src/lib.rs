//! GPU abstraction and test utilities for the Astrelis HUD.
//!
//! The HUD never talks to `wgpu` directly. Every buffer, texture and pipeline
//! it owns is created through the [`RenderContext`] trait, and its single draw
//! per frame is handed to a [`DrawTarget`]. Both seams can be backed by a real
//! GPU or, with the `mock` feature, by recorders that keep a shadow copy of
//! everything written so tests can inspect GPU-visible state.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use astrelis_hud_test_utils::{MockRenderContext, RenderContext};
//! use wgpu::*;
//!
//! let mock = MockRenderContext::new();
//!
//! let buffer = mock.create_buffer(&BufferDescriptor {
//!     label: Some("instances"),
//!     size: 64,
//!     usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
//!     mapped_at_creation: false,
//! });
//! mock.write_buffer(&buffer, 16, &[1, 2, 3, 4]);
//!
//! assert_eq!(mock.count_buffer_writes(), 1);
//! assert_eq!(&mock.buffer_contents(&buffer)[16..20], &[1, 2, 3, 4]);
//! # }
//! ```
//!
//! # Design
//!
//! Wrapper types are owned and cheap to clone, so no lifetimes leak into the
//! HUD components that hold them. The mock uses `parking_lot::Mutex` for
//! interior mutability so that `RenderContext` stays `Send + Sync` and every
//! method takes `&self`.

pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_render;
pub mod render_context;

pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_render::*;
pub use render_context::*;
