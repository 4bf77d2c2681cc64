//! `VkRenderPass`/`VkFramebuffer` creation, cached by key the way the
//! teacher's own `vulkan::mod` caches compatible render passes and
//! framebuffers per [`DeviceShared`](crate::device::DeviceShared) rather than
//! per draw call.
use crate::conv::map_texture_format;
use crate::device::{map_creation_error, DeviceShared, VulkanDevice};
use crate::types::VulkanRenderPass;
use ash::vk;
use ral_core::error::CreationError;
use ral_core::{LoadOp, RenderPassDescriptor, StoreOp};
use ral_types::MAX_RENDER_PASS_COLOR_ATTACHMENTS;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct ColorAttachmentKey {
    format: vk::Format,
    load_op: LoadOpKey,
    store_op: StoreOpKey,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct DepthStencilAttachmentKey {
    format: vk::Format,
    depth_load_op: LoadOpKey,
    depth_store_op: StoreOpKey,
    stencil_load_op: LoadOpKey,
    stencil_store_op: StoreOpKey,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum LoadOpKey {
    Load,
    Clear,
    DontCare,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum StoreOpKey {
    Store,
    DontCare,
}

impl From<LoadOp> for LoadOpKey {
    fn from(op: LoadOp) -> Self {
        match op {
            LoadOp::Load => LoadOpKey::Load,
            LoadOp::Clear => LoadOpKey::Clear,
            LoadOp::DontCare => LoadOpKey::DontCare,
        }
    }
}

impl From<StoreOp> for StoreOpKey {
    fn from(op: StoreOp) -> Self {
        match op {
            StoreOp::Store => StoreOpKey::Store,
            StoreOp::DontCare => StoreOpKey::DontCare,
        }
    }
}

#[derive(Clone, Default, Eq, Hash, PartialEq)]
pub struct RenderPassKey {
    colors: arrayvec::ArrayVec<Option<ColorAttachmentKey>, { MAX_RENDER_PASS_COLOR_ATTACHMENTS }>,
    depth_stencil: Option<DepthStencilAttachmentKey>,
    samples: u8,
}

impl RenderPassKey {
    pub fn from_descriptor(descriptor: &RenderPassDescriptor) -> Self {
        let mut colors = arrayvec::ArrayVec::new();
        let mut samples = 1;
        for attachment in &descriptor.color_attachments {
            samples = attachment.samples;
            colors.push(Some(ColorAttachmentKey {
                format: map_texture_format(attachment.format),
                load_op: attachment.load_op.into(),
                store_op: attachment.store_op.into(),
            }));
        }
        let depth_stencil = descriptor.depth_stencil_attachment.as_ref().map(|ds| {
            samples = ds.samples;
            DepthStencilAttachmentKey {
                format: map_texture_format(ds.format),
                depth_load_op: ds.depth_load_op.into(),
                depth_store_op: ds.depth_store_op.into(),
                stencil_load_op: ds.stencil_load_op.into(),
                stencil_store_op: ds.stencil_store_op.into(),
            }
        });
        Self { colors, depth_stencil, samples }
    }
}

#[derive(Clone, Eq, Hash, PartialEq)]
pub struct FramebufferKey {
    render_pass: vk::RenderPass,
    views: arrayvec::ArrayVec<vk::ImageView, { MAX_RENDER_PASS_COLOR_ATTACHMENTS + 1 }>,
    width: u32,
    height: u32,
}

impl FramebufferKey {
    pub fn new(render_pass: vk::RenderPass, views: &[vk::ImageView], width: u32, height: u32) -> Self {
        Self {
            render_pass,
            views: views.iter().copied().collect(),
            width,
            height,
        }
    }
}

fn load_op_to_vk(op: LoadOp) -> vk::AttachmentLoadOp {
    match op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

fn store_op_to_vk(op: StoreOp) -> vk::AttachmentStoreOp {
    match op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

/// Builds (or returns the cached) `VkRenderPass` compatible with `descriptor`.
pub fn get_or_create_render_pass(
    shared: &DeviceShared,
    descriptor: &RenderPassDescriptor,
) -> Result<vk::RenderPass, CreationError> {
    let key = RenderPassKey::from_descriptor(descriptor);
    if let Some(&pass) = shared.render_passes.lock().get(&key) {
        return Ok(pass);
    }

    let samples = vk::SampleCountFlags::from_raw(
        descriptor
            .color_attachments
            .first()
            .map(|a| a.samples as u32)
            .or(descriptor.depth_stencil_attachment.as_ref().map(|d| d.samples as u32))
            .unwrap_or(1),
    );

    let mut attachment_descriptions = Vec::new();
    let mut color_refs = Vec::new();
    for attachment in &descriptor.color_attachments {
        let index = attachment_descriptions.len() as u32;
        attachment_descriptions.push(
            vk::AttachmentDescription::default()
                .format(map_texture_format(attachment.format))
                .samples(samples)
                .load_op(load_op_to_vk(attachment.load_op))
                .store_op(store_op_to_vk(attachment.store_op))
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
        );
        color_refs.push(vk::AttachmentReference {
            attachment: index,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        });
    }

    let depth_stencil_ref = descriptor.depth_stencil_attachment.as_ref().map(|ds| {
        let index = attachment_descriptions.len() as u32;
        attachment_descriptions.push(
            vk::AttachmentDescription::default()
                .format(map_texture_format(ds.format))
                .samples(samples)
                .load_op(load_op_to_vk(ds.depth_load_op))
                .store_op(store_op_to_vk(ds.depth_store_op))
                .stencil_load_op(load_op_to_vk(ds.stencil_load_op))
                .stencil_store_op(store_op_to_vk(ds.stencil_store_op))
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        );
        vk::AttachmentReference {
            attachment: index,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        }
    });

    let mut subpass = vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs);
    if let Some(ref depth_ref) = depth_stencil_ref {
        subpass = subpass.depth_stencil_attachment(depth_ref);
    }
    let subpasses = [subpass];

    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachment_descriptions)
        .subpasses(&subpasses);

    let pass = unsafe { shared.raw.create_render_pass(&create_info, None) }.map_err(map_creation_error)?;
    shared.render_passes.lock().insert(key, pass);
    Ok(pass)
}

/// Builds (or returns the cached) `VkFramebuffer` for the given render pass
/// and concrete image views.
pub fn get_or_create_framebuffer(
    shared: &DeviceShared,
    render_pass: vk::RenderPass,
    views: &[vk::ImageView],
    width: u32,
    height: u32,
) -> Result<vk::Framebuffer, CreationError> {
    let key = FramebufferKey::new(render_pass, views, width, height);
    if let Some(&fb) = shared.framebuffers.lock().get(&key) {
        return Ok(fb);
    }

    let create_info = vk::FramebufferCreateInfo::default()
        .render_pass(render_pass)
        .attachments(views)
        .width(width)
        .height(height)
        .layers(1);

    let framebuffer = unsafe { shared.raw.create_framebuffer(&create_info, None) }.map_err(map_creation_error)?;
    shared.framebuffers.lock().insert(key, framebuffer);
    Ok(framebuffer)
}

/// Builds a one-off `VkRenderPass` compatible with `descriptor` but with its
/// first color attachment's final layout set to `PRESENT_SRC_KHR`, for a
/// swap chain's own render pass (spec.md §4.6). Unlike
/// [`get_or_create_render_pass`] this is never cached: it's owned directly by
/// the `VulkanSwapChain` that built it and torn down with it.
pub fn build_present_render_pass(
    shared: &DeviceShared,
    descriptor: &RenderPassDescriptor,
) -> Result<vk::RenderPass, CreationError> {
    let samples = vk::SampleCountFlags::from_raw(
        descriptor
            .color_attachments
            .first()
            .map(|a| a.samples as u32)
            .or(descriptor.depth_stencil_attachment.as_ref().map(|d| d.samples as u32))
            .unwrap_or(1),
    );

    let mut attachment_descriptions = Vec::new();
    let mut color_refs = Vec::new();
    for (index, attachment) in descriptor.color_attachments.iter().enumerate() {
        let final_layout =
            if index == 0 { vk::ImageLayout::PRESENT_SRC_KHR } else { vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL };
        let attachment_index = attachment_descriptions.len() as u32;
        attachment_descriptions.push(
            vk::AttachmentDescription::default()
                .format(map_texture_format(attachment.format))
                .samples(samples)
                .load_op(load_op_to_vk(attachment.load_op))
                .store_op(store_op_to_vk(attachment.store_op))
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(final_layout),
        );
        color_refs.push(vk::AttachmentReference { attachment: attachment_index, layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL });
    }

    let depth_stencil_ref = descriptor.depth_stencil_attachment.as_ref().map(|ds| {
        let index = attachment_descriptions.len() as u32;
        attachment_descriptions.push(
            vk::AttachmentDescription::default()
                .format(map_texture_format(ds.format))
                .samples(samples)
                .load_op(load_op_to_vk(ds.depth_load_op))
                .store_op(store_op_to_vk(ds.depth_store_op))
                .stencil_load_op(load_op_to_vk(ds.stencil_load_op))
                .stencil_store_op(store_op_to_vk(ds.stencil_store_op))
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        );
        vk::AttachmentReference { attachment: index, layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL }
    });

    let mut subpass =
        vk::SubpassDescription::default().pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS).color_attachments(&color_refs);
    if let Some(ref depth_ref) = depth_stencil_ref {
        subpass = subpass.depth_stencil_attachment(depth_ref);
    }
    let subpasses = [subpass];

    let create_info = vk::RenderPassCreateInfo::default().attachments(&attachment_descriptions).subpasses(&subpasses);
    unsafe { shared.raw.create_render_pass(&create_info, None) }.map_err(map_creation_error)
}

/// Wraps [`get_or_create_render_pass`] as the [`ral_core::backend::DeviceBackend::create_render_pass`]
/// entry point, recording the attachment counts `command_buffer.rs`'s
/// render-target state machine needs to size its clear-value array.
pub fn create_render_pass(
    device: &VulkanDevice,
    descriptor: &RenderPassDescriptor,
) -> Result<VulkanRenderPass, CreationError> {
    let raw = get_or_create_render_pass(&device.shared, descriptor)?;
    Ok(VulkanRenderPass {
        raw,
        color_attachment_count: descriptor.color_attachments.len() as u32,
        has_depth_stencil: descriptor.depth_stencil_attachment.is_some(),
    })
}

/// The underlying `VkRenderPass` is owned by `DeviceShared`'s cache, keyed on
/// the attachment layout, so destroying a [`VulkanRenderPass`] only drops
/// this wrapper's handle to it, the same rationale as `framebuffer.rs`.
pub fn destroy_render_pass(_device: &VulkanDevice, _render_pass: VulkanRenderPass) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_descriptors_produce_equal_keys() {
        let descriptor = RenderPassDescriptor {
            color_attachments: vec![ral_core::ColorAttachmentDescriptor {
                format: ral_types::TextureFormat::R8G8B8A8,
                load_op: LoadOp::Clear,
                store_op: StoreOp::Store,
                samples: 1,
            }],
            depth_stencil_attachment: None,
        };
        assert_eq!(
            RenderPassKey::from_descriptor(&descriptor),
            RenderPassKey::from_descriptor(&descriptor)
        );
    }
}
