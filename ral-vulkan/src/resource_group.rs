//! `VkDescriptorSet` allocation and descriptor writes, grounded on the
//! teacher's own `vulkan::Device::create_bind_group` and its `gpu_descriptor`
//! usage, generalized to this crate's `ResourceGroupLayout`/`BoundResource`
//! binding model (spec.md §3.1 "ResourceGroup", §4.4).
use crate::conv::map_descriptor_range_type;
use crate::device::VulkanDevice;
use crate::types::{VulkanBackend, VulkanResourceGroup};
use ash::vk;
use gpu_descriptor::{DescriptorSetLayoutCreateFlags, DescriptorTotalCount};
use ral_core::error::CreationError;
use ral_core::resource_group::{BoundResource, ResourceGroupDescriptor, ResourceGroupLayout};
use ral_types::DescriptorRangeType;

fn total_count(layout: &ResourceGroupLayout) -> Result<DescriptorTotalCount, CreationError> {
    let mut total = DescriptorTotalCount::default();
    for (range_type, resource_kind, count) in &layout.ranges {
        match map_descriptor_range_type(*resource_kind, *range_type)? {
            vk::DescriptorType::SAMPLER => total.sampler += count,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER => total.combined_image_sampler += count,
            vk::DescriptorType::SAMPLED_IMAGE => total.sampled_image += count,
            vk::DescriptorType::STORAGE_IMAGE => total.storage_image += count,
            vk::DescriptorType::UNIFORM_BUFFER => total.uniform_buffer += count,
            vk::DescriptorType::UNIFORM_TEXEL_BUFFER => total.uniform_texel_buffer += count,
            vk::DescriptorType::STORAGE_TEXEL_BUFFER => total.storage_texel_buffer += count,
            _ => total.storage_buffer += count,
        }
    }
    Ok(total)
}

fn create_set_layout(
    device: &VulkanDevice,
    layout: &ResourceGroupLayout,
) -> Result<vk::DescriptorSetLayout, CreationError> {
    let bindings: Vec<vk::DescriptorSetLayoutBinding> = layout
        .ranges
        .iter()
        .enumerate()
        .map(|(index, (range_type, resource_kind, count))| {
            let descriptor_type = map_descriptor_range_type(*resource_kind, *range_type)?;
            Ok(vk::DescriptorSetLayoutBinding::default()
                .binding(index as u32)
                .descriptor_type(descriptor_type)
                .descriptor_count((*count).max(1))
                .stage_flags(vk::ShaderStageFlags::ALL))
        })
        .collect::<Result<_, CreationError>>()?;
    let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
    unsafe { device.shared.raw.create_descriptor_set_layout(&create_info, None) }
        .map_err(crate::device::map_creation_error)
}

pub fn create_resource_group(
    device: &VulkanDevice,
    layout: &ResourceGroupLayout,
    descriptor: &ResourceGroupDescriptor<VulkanBackend>,
) -> Result<VulkanResourceGroup, CreationError> {
    let set_layout = create_set_layout(device, layout)?;
    let count = total_count(layout)?;

    let allocate_result = unsafe {
        device.desc_allocator.lock().allocate(
            &device.ash_descriptor_device(),
            &set_layout,
            DescriptorSetLayoutCreateFlags::empty(),
            &count,
            1,
        )
    };
    // The set layout is only needed to describe the allocation; Vulkan
    // doesn't require it to outlive the descriptor set itself.
    unsafe { device.shared.raw.destroy_descriptor_set_layout(set_layout, None) };

    let mut sets = allocate_result.map_err(|e| CreationError::Backend(format!("descriptor set allocation failed: {e}")))?;
    let set = sets.pop().ok_or_else(|| CreationError::Backend("descriptor allocator returned no sets".into()))?;
    let raw = *set.raw();

    write_descriptors(device, raw, layout, descriptor)?;

    Ok(VulkanResourceGroup { set: parking_lot::Mutex::new(Some(set)), raw })
}

/// One binding's resolved native descriptor type and write payload. Buffer
/// and texel-buffer bindings borrow `vk::DescriptorBufferInfo`/
/// `vk::BufferView`; texture and sampler bindings borrow
/// `vk::DescriptorImageInfo` — kept in separate `Vec`s so every value the
/// eventual `vk::WriteDescriptorSet`s borrow outlives the writes themselves.
fn write_descriptors(
    device: &VulkanDevice,
    set: vk::DescriptorSet,
    layout: &ResourceGroupLayout,
    descriptor: &ResourceGroupDescriptor<VulkanBackend>,
) -> Result<(), CreationError> {
    let mut buffer_infos = Vec::with_capacity(descriptor.bindings.len());
    let mut texel_views = Vec::new();
    let mut image_infos = Vec::with_capacity(descriptor.bindings.len());

    for (index, bound) in descriptor.bindings.iter().enumerate() {
        let range = layout.ranges.get(index).copied();
        let descriptor_type = match range {
            Some((range_type, resource_kind, _)) => map_descriptor_range_type(resource_kind, range_type)?,
            None => continue,
        };
        match bound {
            BoundResource::Buffer(buffer) => {
                if descriptor_type == vk::DescriptorType::UNIFORM_TEXEL_BUFFER
                    || descriptor_type == vk::DescriptorType::STORAGE_TEXEL_BUFFER
                {
                    if let Some(view) = buffer.raw().view {
                        texel_views.push((index, descriptor_type, view));
                    }
                } else {
                    buffer_infos.push((
                        index,
                        descriptor_type,
                        vk::DescriptorBufferInfo::default().buffer(buffer.raw().raw).offset(0).range(vk::WHOLE_SIZE),
                    ));
                }
            }
            BoundResource::Texture(texture) => {
                if let Some(view) = texture.view() {
                    // spec.md §4.4: a texture bound as a UAV sits in GENERAL;
                    // one that also doubles as a render target rests in
                    // SHADER_READ_ONLY_OPTIMAL; everything else defaults to
                    // the texture's own PREINITIALIZED resting layout.
                    let image_layout = if range.map(|(rt, _, _)| rt) == Some(DescriptorRangeType::Uav) {
                        vk::ImageLayout::GENERAL
                    } else if texture.descriptor.flags.contains(ral_types::TextureFlags::RENDER_TARGET) {
                        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
                    } else {
                        vk::ImageLayout::PREINITIALIZED
                    };
                    image_infos.push((
                        index,
                        descriptor_type,
                        vk::DescriptorImageInfo::default().image_view(view.raw).image_layout(image_layout),
                    ));
                }
            }
            BoundResource::Sampler(sampler) => {
                image_infos.push((index, descriptor_type, vk::DescriptorImageInfo::default().sampler(sampler.raw().raw)));
            }
            BoundResource::Empty => {}
        }
    }

    let mut writes = Vec::with_capacity(buffer_infos.len() + texel_views.len() + image_infos.len());
    for (index, descriptor_type, info) in &buffer_infos {
        writes.push(
            vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(*index as u32)
                .descriptor_type(*descriptor_type)
                .buffer_info(std::slice::from_ref(info)),
        );
    }
    for (index, descriptor_type, view) in &texel_views {
        writes.push(
            vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(*index as u32)
                .descriptor_type(*descriptor_type)
                .texel_buffer_view(std::slice::from_ref(view)),
        );
    }
    for (index, descriptor_type, info) in &image_infos {
        writes.push(
            vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(*index as u32)
                .descriptor_type(*descriptor_type)
                .image_info(std::slice::from_ref(info)),
        );
    }

    if !writes.is_empty() {
        unsafe { device.shared.raw.update_descriptor_sets(&writes, &[]) };
    }
    Ok(())
}

pub fn destroy_resource_group(device: &VulkanDevice, resource_group: VulkanResourceGroup) {
    if let Some(set) = resource_group.set.into_inner() {
        unsafe {
            device.desc_allocator.lock().free(&device.ash_descriptor_device(), Some(set));
        }
    }
}
