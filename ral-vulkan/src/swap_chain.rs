//! Surface/swap chain creation, resize, acquire, and present (spec.md §4.6),
//! grounded on wgpu-hal's own `vulkan::Surface` capability enumeration and
//! `egl`/`vulkan` swap chain configuration, via `ash-window` for the
//! platform-specific `VkSurfaceKHR` creation this crate's own `platform`
//! module already resolves a [`NativeWindowHandle`] for.
use crate::conv::map_texture_format;
use crate::device::{map_creation_error, map_device_error, VulkanDevice};
use crate::platform::{raw_display_handle, raw_window_handle};
use crate::render_pass::build_present_render_pass;
use crate::texture::{create_texture, destroy_texture};
use crate::types::{VulkanBackend, VulkanFramebuffer, VulkanSwapChain, VulkanSwapChainState};
use ash::vk;
use ral_core::error::{CreationError, SurfaceError};
use ral_core::render_pass::{RenderPass, RenderPassDescriptor};
use ral_core::swap_chain::SwapChainDescriptor;
use ral_core::texture::{TextureDescriptor, TextureKind};
use ral_types::TextureFlags;

/// Picks an `sRGB` surface format matching `preferred` when offered, else
/// any `sRGB` format, else whatever the surface lists first.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR], preferred: vk::Format) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .find(|f| f.format == preferred && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
        .or_else(|| formats.iter().find(|f| f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR))
        .copied()
        .unwrap_or(formats[0])
}

/// `vsync_interval == 0` asks for the lowest-latency mode the surface
/// offers (spec.md §3.1 `setVerticalSynchronizationInterval`); any nonzero
/// interval falls back to `FIFO`, the one present mode every Vulkan
/// implementation is required to support.
fn choose_present_mode(modes: &[vk::PresentModeKHR], vsync_interval: u32) -> vk::PresentModeKHR {
    if vsync_interval == 0 {
        if modes.contains(&vk::PresentModeKHR::IMMEDIATE) {
            return vk::PresentModeKHR::IMMEDIATE;
        }
        if modes.contains(&vk::PresentModeKHR::MAILBOX) {
            return vk::PresentModeKHR::MAILBOX;
        }
    }
    vk::PresentModeKHR::FIFO
}

/// `current_extent.width == u32::MAX` means the surface defers to whatever
/// extent the swap chain requests (common on Wayland); this crate has no OS
/// window to query for the actual client size in that case, so it falls back
/// to a reasonable default clamped into the surface's reported bounds.
fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR) -> (u32, u32) {
    if capabilities.current_extent.width != u32::MAX {
        (capabilities.current_extent.width, capabilities.current_extent.height)
    } else {
        let width = 1280.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width.max(1));
        let height = 720.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height.max(1));
        (width, height)
    }
}

/// Builds (or rebuilds, on resize) the images/views/depth buffer/framebuffers
/// for one `VkSwapchainKHR`. `old_swapchain` lets the driver hand over
/// presentation state from a swap chain being replaced (spec.md §4.6
/// `resize_buffers`); pass `vk::SwapchainKHR::null()` for a first creation.
fn build_swap_chain_state(
    device: &VulkanDevice,
    surface_loader: &ash::extensions::khr::Surface,
    surface: vk::SurfaceKHR,
    swapchain_loader: &ash::extensions::khr::Swapchain,
    present_render_pass: vk::RenderPass,
    descriptor: &RenderPassDescriptor,
    vsync_interval: u32,
    old_swapchain: vk::SwapchainKHR,
) -> Result<VulkanSwapChainState, CreationError> {
    let shared = &device.shared;

    let capabilities = unsafe { surface_loader.get_physical_device_surface_capabilities(shared.physical_device, surface) }
        .map_err(map_creation_error)?;
    let formats = unsafe { surface_loader.get_physical_device_surface_formats(shared.physical_device, surface) }
        .map_err(map_creation_error)?;
    let present_modes =
        unsafe { surface_loader.get_physical_device_surface_present_modes(shared.physical_device, surface) }
            .map_err(map_creation_error)?;
    if formats.is_empty() || present_modes.is_empty() {
        return Err(CreationError::Backend("surface reports no formats or present modes".to_string()));
    }

    let preferred_format =
        descriptor.color_attachments.first().map(|a| map_texture_format(a.format)).unwrap_or(vk::Format::B8G8R8A8_UNORM);
    let surface_format = choose_surface_format(&formats, preferred_format);
    let present_mode = choose_present_mode(&present_modes, vsync_interval);
    let (width, height) = choose_extent(&capabilities);

    let mut image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count = image_count.min(capabilities.max_image_count);
    }

    let create_info = vk::SwapchainCreateInfoKHR::default()
        .surface(surface)
        .min_image_count(image_count)
        .image_format(surface_format.format)
        .image_color_space(surface_format.color_space)
        .image_extent(vk::Extent2D { width, height })
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        .pre_transform(capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true)
        .old_swapchain(old_swapchain);

    let raw = unsafe { swapchain_loader.create_swapchain(&create_info, None) }.map_err(map_creation_error)?;

    let images = unsafe { swapchain_loader.get_swapchain_images(raw) }.map_err(|e| {
        unsafe { swapchain_loader.destroy_swapchain(raw, None) };
        map_creation_error(e)
    })?;

    let build_views = || -> Result<Vec<vk::ImageView>, CreationError> {
        let mut views = Vec::with_capacity(images.len());
        for &image in &images {
            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(surface_format.format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            let view = unsafe { shared.raw.create_image_view(&view_info, None) }.map_err(map_creation_error)?;
            views.push(view);
        }
        Ok(views)
    };
    let views = build_views().map_err(|e| {
        unsafe { swapchain_loader.destroy_swapchain(raw, None) };
        e
    })?;

    let depth_result = if let Some(ds) = &descriptor.depth_stencil_attachment {
        let texture_descriptor = TextureDescriptor {
            kind: TextureKind::Texture2D,
            width,
            height,
            depth_or_slices: 1,
            format: ds.format,
            flags: TextureFlags::RENDER_TARGET,
            usage: ral_types::TextureUsage::Default,
            multisample_count: ds.samples,
            clear_value: None,
        };
        match create_texture(device, &texture_descriptor, None) {
            Ok((texture, Some(view))) => Ok((Some(texture), Some(view.raw))),
            Ok((texture, None)) => {
                destroy_texture(device, texture, None);
                Err(CreationError::Backend("depth image did not receive a view".to_string()))
            }
            Err(e) => Err(e),
        }
    } else {
        Ok((None, None))
    };
    let (depth_image, depth_view) = depth_result.map_err(|e| {
        for &view in &views {
            unsafe { shared.raw.destroy_image_view(view, None) };
        }
        unsafe { swapchain_loader.destroy_swapchain(raw, None) };
        e
    })?;

    let build_framebuffers = || -> Result<Vec<vk::Framebuffer>, CreationError> {
        let mut framebuffers = Vec::with_capacity(views.len());
        for &view in &views {
            let mut attachments = vec![view];
            if let Some(depth_view) = depth_view {
                attachments.push(depth_view);
            }
            let fb_info = vk::FramebufferCreateInfo::default()
                .render_pass(present_render_pass)
                .attachments(&attachments)
                .width(width)
                .height(height)
                .layers(1);
            let framebuffer = unsafe { shared.raw.create_framebuffer(&fb_info, None) }.map_err(map_creation_error)?;
            framebuffers.push(framebuffer);
        }
        Ok(framebuffers)
    };
    let framebuffers = build_framebuffers().map_err(|e| {
        if let Some(depth_view) = depth_view {
            unsafe { shared.raw.destroy_image_view(depth_view, None) };
        }
        if let Some(depth_image) = depth_image {
            destroy_texture(device, depth_image, None);
        }
        for &view in &views {
            unsafe { shared.raw.destroy_image_view(view, None) };
        }
        unsafe { swapchain_loader.destroy_swapchain(raw, None) };
        e
    })?;

    let semaphore_info = vk::SemaphoreCreateInfo::default();
    let image_available = unsafe { shared.raw.create_semaphore(&semaphore_info, None) }.map_err(map_creation_error)?;
    let rendering_finished = unsafe { shared.raw.create_semaphore(&semaphore_info, None) }.map_err(map_creation_error)?;

    Ok(VulkanSwapChainState {
        raw,
        images,
        views,
        framebuffers,
        depth_image,
        depth_view,
        format: surface_format.format,
        width,
        height,
        image_available,
        rendering_finished,
        current_image_index: None,
    })
}

fn destroy_state(device: &VulkanDevice, swapchain_loader: &ash::extensions::khr::Swapchain, state: VulkanSwapChainState) {
    let shared = &device.shared;
    unsafe {
        shared.raw.destroy_semaphore(state.image_available, None);
        shared.raw.destroy_semaphore(state.rendering_finished, None);
        for framebuffer in state.framebuffers {
            shared.raw.destroy_framebuffer(framebuffer, None);
        }
        for view in state.views {
            shared.raw.destroy_image_view(view, None);
        }
        if let Some(depth_view) = state.depth_view {
            shared.raw.destroy_image_view(depth_view, None);
        }
    }
    if let Some(depth_image) = state.depth_image {
        destroy_texture(device, depth_image, None);
    }
    unsafe { swapchain_loader.destroy_swapchain(state.raw, None) };
}

/// Creates a `VkSurfaceKHR` against the window named by `descriptor`, then
/// the swap chain images (and, if `render_pass` declares one, the depth
/// image) compatible with a dedicated `VkRenderPass` ending in
/// `PRESENT_SRC_KHR` (spec.md §4.6).
pub fn create_swap_chain(
    device: &VulkanDevice,
    render_pass: &RenderPass<VulkanBackend>,
    descriptor: &SwapChainDescriptor<VulkanBackend>,
) -> Result<(VulkanSwapChain, u32, u32), CreationError> {
    let shared = &device.shared;
    let instance = &shared.instance;

    let surface_loader = ash::extensions::khr::Surface::new(&instance.entry, &instance.raw);
    let display_handle = raw_display_handle(instance.platform_display);
    let window_handle = raw_window_handle(instance.platform_display, descriptor.native_window_handle);
    let surface = unsafe { ash_window::create_surface(&instance.entry, &instance.raw, display_handle, window_handle, None) }
        .map_err(|e| CreationError::Backend(format!("failed to create Vulkan surface: {e}")))?;

    let supported = unsafe {
        surface_loader.get_physical_device_surface_support(shared.physical_device, shared.queue_family_index, surface)
    }
    .map_err(map_creation_error);
    match supported {
        Ok(true) => {}
        Ok(false) => {
            unsafe { surface_loader.destroy_surface(surface, None) };
            return Err(CreationError::Backend("queue family cannot present to this surface".to_string()));
        }
        Err(e) => {
            unsafe { surface_loader.destroy_surface(surface, None) };
            return Err(e);
        }
    }

    let swapchain_loader = ash::extensions::khr::Swapchain::new(&instance.raw, &shared.raw);

    let render_pass_descriptor = render_pass.descriptor.clone();
    let present_render_pass = build_present_render_pass(shared, &render_pass_descriptor).map_err(|e| {
        unsafe { surface_loader.destroy_surface(surface, None) };
        e
    })?;

    let state = build_swap_chain_state(
        device,
        &surface_loader,
        surface,
        &swapchain_loader,
        present_render_pass,
        &render_pass_descriptor,
        descriptor.vsync_interval,
        vk::SwapchainKHR::null(),
    )
    .map_err(|e| {
        unsafe {
            shared.raw.destroy_render_pass(present_render_pass, None);
            surface_loader.destroy_surface(surface, None);
        }
        e
    })?;

    let (width, height) = (state.width, state.height);
    Ok((
        VulkanSwapChain {
            surface_loader,
            surface,
            swapchain_loader,
            render_pass: present_render_pass,
            render_pass_descriptor,
            state: parking_lot::Mutex::new(state),
        },
        width,
        height,
    ))
}

pub fn destroy_swap_chain(device: &VulkanDevice, swap_chain: VulkanSwapChain) {
    let state = swap_chain.state.into_inner();
    destroy_state(device, &swap_chain.swapchain_loader, state);
    unsafe {
        device.shared.raw.destroy_render_pass(swap_chain.render_pass, None);
        swap_chain.surface_loader.destroy_surface(swap_chain.surface, None);
    }
}

/// Rebuilds the swap chain's images against its existing surface (spec.md
/// §4.6 `resize_buffers`/`recreate`), on an OS-driven resize or after an
/// `OUT_OF_DATE`/`SUBOPTIMAL` present or acquire. The device is idled first:
/// this crate has no frames-in-flight overlap (see `SPEC_FULL.md` §13), so
/// no GPU work can still be reading the old images.
pub fn resize_swap_chain(device: &VulkanDevice, swap_chain: &VulkanSwapChain) -> Result<(u32, u32), SurfaceError> {
    device.wait_idle()?;

    let mut guard = swap_chain.state.lock();
    let old_raw = guard.raw;
    let new_state = build_swap_chain_state(
        device,
        &swap_chain.surface_loader,
        swap_chain.surface,
        &swap_chain.swapchain_loader,
        swap_chain.render_pass,
        &swap_chain.render_pass_descriptor,
        0,
        old_raw,
    )
    .map_err(|e| {
        log::error!("failed to rebuild swap chain: {e}");
        SurfaceError::Device(ral_core::error::DeviceError::Lost)
    })?;

    let width = new_state.width;
    let height = new_state.height;
    let old_state = std::mem::replace(&mut *guard, new_state);
    drop(guard);
    destroy_state(device, &swap_chain.swapchain_loader, old_state);
    Ok((width, height))
}

/// Also blocks on a transient fence until the acquired image is actually
/// usable, consistent with this crate's fully synchronous submission model
/// (spec.md §4.8): no GPU work is ever in flight across an `acquire`/
/// `present` pair. `image_available` is still signalled alongside the fence
/// so `present`'s submit has something real to wait on (spec.md §4.6).
pub fn acquire_next_image(device: &VulkanDevice, swap_chain: &VulkanSwapChain) -> Result<u32, SurfaceError> {
    let mut state = swap_chain.state.lock();

    let fence_info = vk::FenceCreateInfo::default();
    let fence = unsafe { device.shared.raw.create_fence(&fence_info, None) }.map_err(map_device_error)?;

    let result =
        unsafe { swap_chain.swapchain_loader.acquire_next_image(state.raw, u64::MAX, state.image_available, fence) };

    let outcome = match result {
        Ok((index, suboptimal)) => {
            unsafe { device.shared.raw.wait_for_fences(&[fence], true, u64::MAX) }.map_err(map_device_error)?;
            if suboptimal {
                Err(SurfaceError::Outdated)
            } else {
                state.current_image_index = Some(index);
                Ok(index)
            }
        }
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(SurfaceError::Outdated),
        Err(vk::Result::ERROR_SURFACE_LOST_KHR) => Err(SurfaceError::Lost),
        Err(e) => Err(SurfaceError::Device(map_device_error(e))),
    };

    unsafe { device.shared.raw.destroy_fence(fence, None) };
    outcome
}

/// Presents the image last returned by [`acquire_next_image`] (spec.md
/// §4.6). The trait carries no image-index parameter, so the swap chain
/// tracks the last acquired one itself. Submits an empty batch that waits on
/// `image_available` and signals `rendering_finished` before
/// `vkQueuePresentKHR` waits on `rendering_finished` in turn — the relay
/// pair spec.md §4.6 describes, even though this backend's own render-pass
/// submission (`command_buffer::submit`) has already completed by the time
/// `present` runs.
pub fn present(device: &VulkanDevice, swap_chain: &VulkanSwapChain) -> Result<(), SurfaceError> {
    let mut state = swap_chain.state.lock();
    let image_index = state.current_image_index.take().ok_or(SurfaceError::Outdated)?;

    let wait = [state.image_available];
    let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
    let signal = [state.rendering_finished];
    let submit_info = vk::SubmitInfo::default()
        .wait_semaphores(&wait)
        .wait_dst_stage_mask(&wait_stages)
        .signal_semaphores(&signal);

    let fence_info = vk::FenceCreateInfo::default();
    let fence = unsafe { device.shared.raw.create_fence(&fence_info, None) }.map_err(map_device_error)?;
    let submit_result = unsafe { device.shared.raw.queue_submit(device.shared.queue, &[submit_info], fence) };
    if let Err(e) = submit_result {
        unsafe { device.shared.raw.destroy_fence(fence, None) };
        return Err(SurfaceError::Device(map_device_error(e)));
    }
    unsafe {
        device.shared.raw.wait_for_fences(&[fence], true, u64::MAX).map_err(map_device_error)?;
        device.shared.raw.destroy_fence(fence, None);
    }

    let swapchains = [state.raw];
    let indices = [image_index];
    let present_info =
        vk::PresentInfoKHR::default().wait_semaphores(&signal).swapchains(&swapchains).image_indices(&indices);

    match unsafe { swap_chain.swapchain_loader.queue_present(device.shared.queue, &present_info) } {
        Ok(false) => Ok(()),
        Ok(true) => Err(SurfaceError::Outdated),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(SurfaceError::Outdated),
        Err(vk::Result::ERROR_SURFACE_LOST_KHR) => Err(SurfaceError::Lost),
        Err(e) => Err(SurfaceError::Device(map_device_error(e))),
    }
}

/// Wraps the framebuffer for `image_index`, already built by
/// [`build_swap_chain_state`] and cached for the swap chain's lifetime
/// (spec.md §3.1: "a swap chain is itself a RenderPass bound to an OS window
/// plus presentable color images").
pub fn swap_chain_framebuffer(swap_chain: &VulkanSwapChain, image_index: u32) -> VulkanFramebuffer {
    let state = swap_chain.state.lock();
    let framebuffer = state.framebuffers[image_index as usize];
    let mut views = vec![state.views[image_index as usize]];
    if let Some(depth_view) = state.depth_view {
        views.push(depth_view);
    }
    VulkanFramebuffer {
        raw: parking_lot::Mutex::new(Some(framebuffer)),
        render_pass: swap_chain.render_pass,
        views,
        width: state.width,
        height: state.height,
    }
}

// Destroying the wrapper this hands back reuses `framebuffer::destroy_framebuffer`,
// already a no-op over the raw handle: the real `VkFramebuffer` here is owned by
// the swap chain's own state (rebuilt wholesale on resize), not by the wrapper.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_mode_prefers_immediate_when_vsync_disabled() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(choose_present_mode(&modes, 0), vk::PresentModeKHR::IMMEDIATE);
    }

    #[test]
    fn present_mode_is_fifo_when_vsync_enabled() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::MAILBOX];
        assert_eq!(choose_present_mode(&modes, 1), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn extent_falls_back_to_a_default_when_surface_defers_to_the_caller() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
            ..Default::default()
        };
        assert_eq!(choose_extent(&capabilities), (1280, 720));
    }
}
