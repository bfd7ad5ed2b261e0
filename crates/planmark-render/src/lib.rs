//! PlanMark Render Library
//!
//! Renderer abstraction and implementations for PlanMark.
//! The default implementation uses Vello for GPU-accelerated rendering.

pub mod labels;
pub mod patterns;
mod renderer;
pub mod symbol_cache;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use renderer::{RenderContext, RenderMode, RenderResult, Renderer, RendererError};
pub use symbol_cache::SymbolCache;

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;
