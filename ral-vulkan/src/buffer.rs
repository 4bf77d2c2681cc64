//! `VkBuffer`/`VkDeviceMemory` creation and initial-data upload (spec.md
//! §4.3 "Buffer creation (common path)"), grounded on wgpu-hal's
//! `vulkan::Device::create_buffer` and its `gpu_alloc` usage.
use crate::conv::map_texture_format;
use crate::device::{map_creation_error, VulkanDevice};
use crate::types::VulkanBuffer;
use ash::vk;
use gpu_alloc::{Request, UsageFlags};
use ral_core::buffer::{BufferDescriptor, BufferKind};
use ral_core::error::CreationError;
use ral_types::BufferFlags;

fn usage_flags(descriptor: &BufferDescriptor) -> vk::BufferUsageFlags {
    let has_srv_or_uav =
        descriptor.flags.intersects(BufferFlags::SHADER_RESOURCE | BufferFlags::UNORDERED_ACCESS);
    match descriptor.kind {
        BufferKind::Index => {
            let mut flags = vk::BufferUsageFlags::INDEX_BUFFER;
            if has_srv_or_uav {
                flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
            }
            flags
        }
        BufferKind::Vertex => {
            let mut flags = vk::BufferUsageFlags::VERTEX_BUFFER;
            if has_srv_or_uav {
                flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
            }
            flags
        }
        BufferKind::Texture => {
            let mut flags = vk::BufferUsageFlags::empty();
            if descriptor.flags.contains(BufferFlags::SHADER_RESOURCE) {
                flags |= vk::BufferUsageFlags::UNIFORM_TEXEL_BUFFER;
            }
            if descriptor.flags.contains(BufferFlags::UNORDERED_ACCESS) {
                flags |= vk::BufferUsageFlags::STORAGE_TEXEL_BUFFER;
            }
            flags
        }
        BufferKind::Structured => vk::BufferUsageFlags::STORAGE_BUFFER,
        BufferKind::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER | vk::BufferUsageFlags::STORAGE_BUFFER,
        BufferKind::Indirect => {
            let mut flags = vk::BufferUsageFlags::INDIRECT_BUFFER;
            if has_srv_or_uav {
                flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
            }
            flags
        }
    }
}

pub fn create_buffer(
    device: &VulkanDevice,
    descriptor: &BufferDescriptor,
    initial_data: Option<&[u8]>,
) -> Result<VulkanBuffer, CreationError> {
    let shared = &device.shared;
    let usage = usage_flags(descriptor) | vk::BufferUsageFlags::TRANSFER_DST;
    let size = descriptor.byte_size as u64;

    let create_info = vk::BufferCreateInfo::default().size(size).usage(usage).sharing_mode(vk::SharingMode::EXCLUSIVE);
    let raw = unsafe { shared.raw.create_buffer(&create_info, None) }.map_err(map_creation_error)?;
    let requirements = unsafe { shared.raw.get_buffer_memory_requirements(raw) };

    let buffer_usage = if initial_data.is_some() {
        UsageFlags::UPLOAD | UsageFlags::HOST_ACCESS
    } else {
        UsageFlags::FAST_DEVICE_ACCESS
    };

    let mut block = unsafe {
        device.mem_allocator.lock().alloc(
            device.ash_memory_device(),
            Request {
                size: requirements.size,
                align_mask: requirements.alignment - 1,
                usage: buffer_usage,
                memory_types: requirements.memory_type_bits,
            },
        )
    }
    .map_err(|e| {
        unsafe { shared.raw.destroy_buffer(raw, None) };
        CreationError::Backend(format!("buffer memory allocation failed: {e}"))
    })?;

    unsafe { shared.raw.bind_buffer_memory(raw, *block.memory(), block.offset()) }.map_err(|e| {
        unsafe { shared.raw.destroy_buffer(raw, None) };
        map_creation_error(e)
    })?;

    if let Some(data) = initial_data {
        unsafe {
            block
                .write_bytes(device.ash_memory_device(), 0, data)
                .map_err(|e| CreationError::Backend(format!("buffer upload failed: {e}")))?;
        }
    }

    let view = if descriptor.kind == BufferKind::Texture {
        let format = descriptor.texel_format.map(map_texture_format).unwrap_or(vk::Format::R32_UINT);
        let view_info =
            vk::BufferViewCreateInfo::default().buffer(raw).format(format).offset(0).range(vk::WHOLE_SIZE);
        let raw_view = unsafe { shared.raw.create_buffer_view(&view_info, None) }.map_err(|e| {
            unsafe { shared.raw.destroy_buffer(raw, None) };
            map_creation_error(e)
        })?;
        Some(raw_view)
    } else {
        None
    };

    Ok(VulkanBuffer {
        raw,
        block: parking_lot::Mutex::new(Some(block)),
        size,
        view,
    })
}

pub fn destroy_buffer(device: &VulkanDevice, buffer: VulkanBuffer) {
    unsafe {
        if let Some(view) = buffer.view {
            device.shared.raw.destroy_buffer_view(view, None);
        }
        device.shared.raw.destroy_buffer(buffer.raw, None);
    }
    if let Some(block) = buffer.block.into_inner() {
        unsafe {
            device.mem_allocator.lock().dealloc(device.ash_memory_device(), block);
        }
    }
}

/// # Safety
/// `buffer` must have been allocated with a host-visible usage (the common
/// path always requests `HOST_ACCESS` when `initial_data` is absent but the
/// caller intends to map it later is out of scope here — see spec.md §12).
pub unsafe fn map_buffer(
    device: &VulkanDevice,
    buffer: &VulkanBuffer,
) -> Result<*mut u8, ral_core::error::DeviceError> {
    let mut guard = buffer.block.lock();
    let block = guard.as_mut().ok_or(ral_core::error::DeviceError::Unsupported("buffer has no backing memory"))?;
    let ptr = unsafe { block.map(device.ash_memory_device(), 0, buffer.size as usize) }
        .map_err(|_| ral_core::error::DeviceError::Unsupported("buffer is not host-visible"))?;
    Ok(ptr.as_ptr())
}

/// # Safety
/// Must be called exactly once per successful `map_buffer`.
pub unsafe fn unmap_buffer(device: &VulkanDevice, buffer: &VulkanBuffer) {
    let mut guard = buffer.block.lock();
    if let Some(block) = guard.as_mut() {
        unsafe { block.unmap(device.ash_memory_device()) };
    }
}
