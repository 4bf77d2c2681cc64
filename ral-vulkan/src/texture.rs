//! `VkImage`/`VkImageView` creation, initial-data upload, and mip-chain
//! generation via blits (spec.md §4.3), grounded on wgpu-hal's own
//! `vulkan::Device::create_texture` plus its one-time-submit upload helper.
use crate::conv::map_texture_format;
use crate::device::{map_creation_error, map_device_error, VulkanDevice};
use crate::types::{VulkanTexture, VulkanTextureView};
use ash::vk;
use gpu_alloc::{Request, UsageFlags};
use parking_lot::Mutex;
use ral_core::error::{CreationError, DeviceError};
use ral_core::texture::{TextureDescriptor, TextureKind};
use ral_types::TextureFlags;

fn image_type_and_view_type(kind: TextureKind) -> (vk::ImageType, vk::ImageViewType) {
    match kind {
        TextureKind::Texture1D => (vk::ImageType::TYPE_1D, vk::ImageViewType::TYPE_1D),
        TextureKind::Texture2D => (vk::ImageType::TYPE_2D, vk::ImageViewType::TYPE_2D),
        TextureKind::Texture2DArray => (vk::ImageType::TYPE_2D, vk::ImageViewType::TYPE_2D_ARRAY),
        TextureKind::Texture3D => (vk::ImageType::TYPE_3D, vk::ImageViewType::TYPE_3D),
        TextureKind::TextureCube => (vk::ImageType::TYPE_2D, vk::ImageViewType::CUBE),
    }
}

fn usage_flags(descriptor: &TextureDescriptor) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::TRANSFER_DST;
    if descriptor.flags.contains(TextureFlags::SHADER_RESOURCE) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if descriptor.flags.contains(TextureFlags::UNORDERED_ACCESS) {
        flags |= vk::ImageUsageFlags::STORAGE;
    }
    if descriptor.flags.contains(TextureFlags::RENDER_TARGET) {
        flags |= if descriptor.format.is_depth() {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
        };
    }
    if descriptor.flags.contains(TextureFlags::GENERATE_MIPMAPS) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    flags
}

fn aspect_mask(descriptor: &TextureDescriptor) -> vk::ImageAspectFlags {
    if descriptor.format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// One-time-submit command buffer helper (spec.md §5 "blocking points ...
/// around one-time image uploads and mip generation"), grounded on the
/// wgpu-hal's `Device::with_transfer_cmd_buf`-equivalent internal helper.
pub(crate) fn one_time_submit<F>(device: &VulkanDevice, body: F) -> Result<(), DeviceError>
where
    F: FnOnce(vk::CommandBuffer),
{
    let shared = &device.shared;
    let pool_info = vk::CommandPoolCreateInfo::default()
        .queue_family_index(shared.queue_family_index)
        .flags(vk::CommandPoolCreateFlags::TRANSIENT);
    let pool = unsafe { shared.raw.create_command_pool(&pool_info, None) }.map_err(map_device_error)?;

    let alloc_info = vk::CommandBufferAllocateInfo::default()
        .command_pool(pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(1);
    let command_buffer = unsafe { shared.raw.allocate_command_buffers(&alloc_info) }.map_err(map_device_error)?[0];

    let begin_info = vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    unsafe { shared.raw.begin_command_buffer(command_buffer, &begin_info) }.map_err(map_device_error)?;
    body(command_buffer);
    unsafe { shared.raw.end_command_buffer(command_buffer) }.map_err(map_device_error)?;

    let command_buffers = [command_buffer];
    let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
    unsafe {
        shared.raw.queue_submit(shared.queue, &[submit_info], vk::Fence::null()).map_err(map_device_error)?;
        shared.raw.queue_wait_idle(shared.queue).map_err(map_device_error)?;
        shared.raw.destroy_command_pool(pool, None);
    }
    Ok(())
}

pub(crate) fn transition_image(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    image: vk::Image,
    aspect: vk::ImageAspectFlags,
    base_mip: u32,
    mip_count: u32,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) {
    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: base_mip,
            level_count: mip_count,
            base_array_layer: 0,
            layer_count: vk::REMAINING_ARRAY_LAYERS,
        })
        .src_access_mask(vk::AccessFlags::MEMORY_WRITE | vk::AccessFlags::MEMORY_READ)
        .dst_access_mask(vk::AccessFlags::MEMORY_WRITE | vk::AccessFlags::MEMORY_READ);
    unsafe {
        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    }
}

pub fn create_texture(
    device: &VulkanDevice,
    descriptor: &TextureDescriptor,
    initial_data: Option<&[u8]>,
) -> Result<(VulkanTexture, Option<VulkanTextureView>), CreationError> {
    let shared = &device.shared;
    let (image_type, view_type) = image_type_and_view_type(descriptor.kind);
    let format = map_texture_format(descriptor.format);
    let mip_level_count = descriptor.mip_level_count();
    let array_layers = descriptor.array_layer_count();
    let depth = if descriptor.kind == TextureKind::Texture3D { descriptor.depth_or_slices.max(1) } else { 1 };

    let mut create_flags = vk::ImageCreateFlags::empty();
    if descriptor.kind == TextureKind::TextureCube {
        create_flags |= vk::ImageCreateFlags::CUBE_COMPATIBLE;
    }

    let samples = vk::SampleCountFlags::from_raw(descriptor.multisample_count.max(1) as u32);

    let create_info = vk::ImageCreateInfo::default()
        .flags(create_flags)
        .image_type(image_type)
        .format(format)
        .extent(vk::Extent3D { width: descriptor.width.max(1), height: descriptor.height.max(1), depth })
        .mip_levels(mip_level_count)
        .array_layers(array_layers)
        .samples(samples)
        .tiling(vk::ImageTiling::OPTIMAL)
        .usage(usage_flags(descriptor))
        .sharing_mode(vk::SharingMode::EXCLUSIVE)
        .initial_layout(vk::ImageLayout::PREINITIALIZED);

    let raw = unsafe { shared.raw.create_image(&create_info, None) }.map_err(map_creation_error)?;
    let requirements = unsafe { shared.raw.get_image_memory_requirements(raw) };

    let mut block = unsafe {
        device.mem_allocator.lock().alloc(
            device.ash_memory_device(),
            Request {
                size: requirements.size,
                align_mask: requirements.alignment - 1,
                usage: UsageFlags::FAST_DEVICE_ACCESS,
                memory_types: requirements.memory_type_bits,
            },
        )
    }
    .map_err(|e| {
        unsafe { shared.raw.destroy_image(raw, None) };
        CreationError::Backend(format!("image memory allocation failed: {e}"))
    })?;

    unsafe { shared.raw.bind_image_memory(raw, *block.memory(), block.offset()) }.map_err(|e| {
        unsafe { shared.raw.destroy_image(raw, None) };
        map_creation_error(e)
    })?;

    let aspect = aspect_mask(descriptor);

    if let Some(data) = initial_data {
        upload_initial_data(device, raw, descriptor, aspect, data).map_err(|e| CreationError::Backend(e.to_string()))?;
    } else {
        // No upload path to drive the PREINITIALIZED -> SHADER_READ_ONLY_OPTIMAL
        // transition; leave the image PREINITIALIZED, matching an
        // uninitialized render-target/UAV texture's expected starting state.
    }

    if descriptor.flags.contains(TextureFlags::GENERATE_MIPMAPS) && initial_data.is_some() {
        generate_mip_chain(device, raw, descriptor, aspect).map_err(|e| CreationError::Backend(e.to_string()))?;
    }

    let needs_view = descriptor
        .flags
        .intersects(TextureFlags::SHADER_RESOURCE | TextureFlags::RENDER_TARGET | TextureFlags::UNORDERED_ACCESS);
    let view = if needs_view {
        let view_info = vk::ImageViewCreateInfo::default()
            .image(raw)
            .view_type(view_type)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: mip_level_count,
                base_array_layer: 0,
                layer_count: array_layers,
            });
        let raw_view = unsafe { shared.raw.create_image_view(&view_info, None) }.map_err(map_creation_error)?;
        Some(VulkanTextureView { raw: raw_view, mip_range: Mutex::new((0, mip_level_count.saturating_sub(1))) })
    } else {
        None
    };

    Ok((
        VulkanTexture {
            raw,
            block: Mutex::new(Some(block)),
            format,
            width: descriptor.width,
            height: descriptor.height,
            depth_or_array_layers: depth.max(array_layers),
            mip_level_count,
        },
        view,
    ))
}

fn upload_initial_data(
    device: &VulkanDevice,
    image: vk::Image,
    descriptor: &TextureDescriptor,
    aspect: vk::ImageAspectFlags,
    data: &[u8],
) -> Result<(), DeviceError> {
    let shared = &device.shared;
    let staging_info = vk::BufferCreateInfo::default()
        .size(data.len() as u64)
        .usage(vk::BufferUsageFlags::TRANSFER_SRC)
        .sharing_mode(vk::SharingMode::EXCLUSIVE);
    let staging_buffer = unsafe { shared.raw.create_buffer(&staging_info, None) }.map_err(map_device_error)?;
    let requirements = unsafe { shared.raw.get_buffer_memory_requirements(staging_buffer) };

    let mut staging_block = unsafe {
        device.mem_allocator.lock().alloc(
            device.ash_memory_device(),
            Request {
                size: requirements.size,
                align_mask: requirements.alignment - 1,
                usage: UsageFlags::UPLOAD | UsageFlags::HOST_ACCESS,
                memory_types: requirements.memory_type_bits,
            },
        )
    }
    .map_err(|_| DeviceError::Unsupported("staging buffer memory allocation failed"))?;

    unsafe {
        shared
            .raw
            .bind_buffer_memory(staging_buffer, *staging_block.memory(), staging_block.offset())
            .map_err(map_device_error)?;
        staging_block
            .write_bytes(device.ash_memory_device(), 0, data)
            .map_err(|_| DeviceError::Unsupported("staging buffer write failed"))?;
    }

    let mip_level_count = if descriptor.flags.contains(TextureFlags::GENERATE_MIPMAPS) { 1 } else { descriptor.mip_level_count() };
    let array_layers = descriptor.array_layer_count();

    let mut regions = Vec::with_capacity(mip_level_count as usize);
    let mut buffer_offset = 0u64;
    for mip in 0..mip_level_count {
        let (w, h) = ((descriptor.width >> mip).max(1), (descriptor.height >> mip).max(1));
        let level_bytes = descriptor.format.level_size_bytes(w, h) as u64 * array_layers as u64;
        regions.push(vk::BufferImageCopy {
            buffer_offset,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: aspect,
                mip_level: mip,
                base_array_layer: 0,
                layer_count: array_layers,
            },
            image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            image_extent: vk::Extent3D { width: w, height: h, depth: 1 },
        });
        buffer_offset += level_bytes;
    }

    one_time_submit(device, |cmd| {
        transition_image(
            &shared.raw,
            cmd,
            image,
            aspect,
            0,
            vk::REMAINING_MIP_LEVELS,
            vk::ImageLayout::PREINITIALIZED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        unsafe {
            shared.raw.cmd_copy_buffer_to_image(
                cmd,
                staging_buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &regions,
            );
        }
        if !descriptor.flags.contains(TextureFlags::GENERATE_MIPMAPS) {
            transition_image(
                &shared.raw,
                cmd,
                image,
                aspect,
                0,
                vk::REMAINING_MIP_LEVELS,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            );
        }
    })?;

    unsafe {
        shared.raw.destroy_buffer(staging_buffer, None);
        device.mem_allocator.lock().dealloc(device.ash_memory_device(), staging_block);
    }
    Ok(())
}

/// Blits mip 0 down the chain (spec.md §4.3 "Mip-chain generation"): each mip
/// `i` is generated from mip `i-1` at half resolution, then immediately
/// transitioned to `TRANSFER_SRC_OPTIMAL` so the next iteration can read it.
fn generate_mip_chain(
    device: &VulkanDevice,
    image: vk::Image,
    descriptor: &TextureDescriptor,
    aspect: vk::ImageAspectFlags,
) -> Result<(), DeviceError> {
    let shared = &device.shared;
    let mip_level_count = descriptor.mip_level_count();
    let array_layers = descriptor.array_layer_count();

    one_time_submit(device, |cmd| {
        // Mip 0 already sits in TRANSFER_DST_OPTIMAL from the upload step;
        // make it a blit source before generating mip 1.
        transition_image(
            &shared.raw, cmd, image, aspect, 0, 1,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        );

        for mip in 1..mip_level_count {
            let (src_w, src_h) = ((descriptor.width >> (mip - 1)).max(1) as i32, (descriptor.height >> (mip - 1)).max(1) as i32);
            let (dst_w, dst_h) = ((descriptor.width >> mip).max(1) as i32, (descriptor.height >> mip).max(1) as i32);

            transition_image(
                &shared.raw, cmd, image, aspect, mip, 1,
                vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            );

            let blit = vk::ImageBlit {
                src_subresource: vk::ImageSubresourceLayers {
                    aspect_mask: aspect,
                    mip_level: mip - 1,
                    base_array_layer: 0,
                    layer_count: array_layers,
                },
                src_offsets: [
                    vk::Offset3D { x: 0, y: 0, z: 0 },
                    vk::Offset3D { x: src_w, y: src_h, z: 1 },
                ],
                dst_subresource: vk::ImageSubresourceLayers {
                    aspect_mask: aspect,
                    mip_level: mip,
                    base_array_layer: 0,
                    layer_count: array_layers,
                },
                dst_offsets: [
                    vk::Offset3D { x: 0, y: 0, z: 0 },
                    vk::Offset3D { x: dst_w, y: dst_h, z: 1 },
                ],
            };
            unsafe {
                shared.raw.cmd_blit_image(
                    cmd,
                    image,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[blit],
                    vk::Filter::LINEAR,
                );
            }

            transition_image(
                &shared.raw, cmd, image, aspect, mip, 1,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            );
        }

        // All mips now sit in TRANSFER_SRC_OPTIMAL; move the whole chain to
        // its steady-state sampled layout in one barrier.
        transition_image(
            &shared.raw, cmd, image, aspect, 0, mip_level_count,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
    })
}

pub fn destroy_texture(device: &VulkanDevice, texture: VulkanTexture, view: Option<VulkanTextureView>) {
    unsafe {
        if let Some(view) = view {
            device.shared.raw.destroy_image_view(view.raw, None);
        }
        device.shared.raw.destroy_image(texture.raw, None);
    }
    if let Some(block) = texture.block.into_inner() {
        unsafe {
            device.mem_allocator.lock().dealloc(device.ash_memory_device(), block);
        }
    }
}
