use crate::backend::{Backend, DeviceBackend};
use crate::context::NativeWindowHandle;
use crate::render_pass::RenderPass;
use crate::resource::{Res, Resource, ResourceMeta};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Backend-agnostic description of a [`SwapChain`] (spec.md §3.1 "SwapChain",
/// §4.6): a compatible [`RenderPass`] bound to a native window. The render
/// pass supplies the attachment formats (and, if it declares one, the depth
/// format); the backend allocates the presentable color images (and depth
/// image) to match.
#[derive(Debug, Clone)]
pub struct SwapChainDescriptor<B: Backend> {
    pub compatible_render_pass: Res<RenderPass<B>>,
    pub native_window_handle: NativeWindowHandle,
    /// `0` disables vsync (present as fast as the present mode allows);
    /// matches the source's `setVerticalSynchronizationInterval` (spec.md
    /// §3.1 "SwapChain").
    pub vsync_interval: u32,
}

/// Adapter for an externally driven present path (spec.md §3.1
/// `set_render_window`, supplemented from `original_source/`'s
/// `IRenderWindow`): a windowing toolkit that owns frame pacing can install
/// one of these instead of calling [`crate::renderer::Renderer::present`]
/// itself.
pub trait RenderWindow: fmt::Debug + Send + Sync {
    fn present(&self);
    fn get_width_and_height(&self) -> (u32, u32);
}

/// A [`RenderPass`] bound to an OS window's presentable images (spec.md
/// §3.1 "SwapChain", §4.6, §4.7). Width/height, vsync interval, and
/// fullscreen state are tracked here so they read back correctly regardless
/// of backend; the presentable images, depth image, and synchronization
/// primitives live in the backend-native `raw` object.
pub struct SwapChain<B: Backend> {
    meta: ResourceMeta,
    pub render_pass: Res<RenderPass<B>>,
    pub(crate) raw: Option<B::SwapChain>,
    width: AtomicU32,
    height: AtomicU32,
    vsync_interval: AtomicU32,
    fullscreen: AtomicBool,
    render_window: Mutex<Option<Box<dyn RenderWindow>>>,
    device: Arc<B::Device>,
}

impl<B: Backend> SwapChain<B> {
    pub fn new(
        meta: ResourceMeta,
        render_pass: Res<RenderPass<B>>,
        raw: B::SwapChain,
        width: u32,
        height: u32,
        vsync_interval: u32,
        device: Arc<B::Device>,
    ) -> Self {
        Self {
            meta,
            render_pass,
            raw: Some(raw),
            width: AtomicU32::new(width),
            height: AtomicU32::new(height),
            vsync_interval: AtomicU32::new(vsync_interval),
            fullscreen: AtomicBool::new(false),
            render_window: Mutex::new(None),
            device,
        }
    }

    pub fn raw(&self) -> &B::SwapChain {
        self.raw.as_ref().expect("SwapChain accessed after destruction")
    }

    /// Queried from the OS window every call, per spec.md §3.1
    /// "get_width_and_height (queried from the OS window)" — here backed by
    /// whatever the last successful `present`/`resize_buffers` observed,
    /// since this crate has no windowing system of its own to query.
    pub fn get_width_and_height(&self) -> (u32, u32) {
        (self.width.load(Ordering::Acquire), self.height.load(Ordering::Acquire))
    }

    pub(crate) fn set_width_and_height(&self, width: u32, height: u32) {
        self.width.store(width, Ordering::Release);
        self.height.store(height, Ordering::Release);
    }

    pub fn vsync_interval(&self) -> u32 {
        self.vsync_interval.load(Ordering::Acquire)
    }

    pub fn set_vsync_interval(&self, interval: u32) {
        self.vsync_interval.store(interval, Ordering::Release);
    }

    pub fn get_fullscreen_state(&self) -> bool {
        self.fullscreen.load(Ordering::Acquire)
    }

    /// Backends without a native fullscreen transition (the null backend;
    /// Vulkan without `VK_EXT_full_screen_exclusive`) simply record the
    /// requested state.
    pub fn set_fullscreen_state(&self, fullscreen: bool) {
        self.fullscreen.store(fullscreen, Ordering::Release);
    }

    /// Installs (or clears, with `None`) an externally driven present
    /// adapter (spec.md §3.1 `set_render_window`).
    pub fn set_render_window(&self, render_window: Option<Box<dyn RenderWindow>>) {
        *self.render_window.lock().unwrap() = render_window;
    }

    pub fn has_render_window(&self) -> bool {
        self.render_window.lock().unwrap().is_some()
    }
}

impl<B: Backend> fmt::Debug for SwapChain<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapChain")
            .field("width", &self.width.load(Ordering::Relaxed))
            .field("height", &self.height.load(Ordering::Relaxed))
            .field("vsync_interval", &self.vsync_interval.load(Ordering::Relaxed))
            .field("fullscreen", &self.fullscreen.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Resource for SwapChain<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for SwapChain<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_swap_chain(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    // `SwapChain<B>` stores its live (width, height, vsync, fullscreen)
    // state plain-Rust-side regardless of backend; exercised end to end
    // against the null backend's conformance suite, which can construct a
    // full `B::SwapChain`.
}
