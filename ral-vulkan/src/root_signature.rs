//! `VkDescriptorSetLayout`/`VkPipelineLayout` construction from a
//! [`RootSignatureDescriptor`], grounded on wgpu-hal's own
//! `vulkan::Device::create_pipeline_layout` and generalized to this crate's
//! descriptor-table binding model (spec.md §4.4).
use crate::conv::{map_address_mode, map_descriptor_range_type, map_filter_mode, map_shader_visibility};
use crate::device::{map_creation_error, VulkanDevice};
use crate::types::VulkanRootSignature;
use ash::vk;
use ral_core::error::CreationError;
use ral_core::root_signature::{RootParameter, RootSignatureDescriptor};

/// One static sampler becomes its own single-binding set layout with the
/// sampler baked in as `pImmutableSamplers`, since the descriptor model has
/// no separate "binding slot" concept for them.
fn create_static_sampler_layout(
    device: &VulkanDevice,
    sampler: &ral_core::root_signature::StaticSampler,
) -> Result<(vk::DescriptorSetLayout, vk::Sampler), CreationError> {
    let (min_filter, mag_filter, mipmap_mode, _, _) = map_filter_mode(sampler.filter);
    let sampler_info = vk::SamplerCreateInfo::default()
        .min_filter(min_filter)
        .mag_filter(mag_filter)
        .mipmap_mode(mipmap_mode)
        .address_mode_u(map_address_mode(sampler.address_u))
        .address_mode_v(map_address_mode(sampler.address_v))
        .address_mode_w(map_address_mode(sampler.address_w));
    let raw_sampler =
        unsafe { device.shared.raw.create_sampler(&sampler_info, None) }.map_err(map_creation_error)?;

    let immutable = [raw_sampler];
    let binding = vk::DescriptorSetLayoutBinding::default()
        .binding(sampler.shader_register)
        .descriptor_type(vk::DescriptorType::SAMPLER)
        .descriptor_count(1)
        .stage_flags(map_shader_visibility(sampler.visibility))
        .immutable_samplers(&immutable);
    let bindings = [binding];
    let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
    let layout = unsafe { device.shared.raw.create_descriptor_set_layout(&layout_info, None) }.map_err(|e| {
        unsafe { device.shared.raw.destroy_sampler(raw_sampler, None) };
        map_creation_error(e)
    })?;
    Ok((layout, raw_sampler))
}

fn create_table_layout(
    device: &VulkanDevice,
    ranges: &[ral_core::root_signature::DescriptorRange],
    visibility: ral_types::ShaderVisibility,
) -> Result<vk::DescriptorSetLayout, CreationError> {
    let stage_flags = map_shader_visibility(visibility);
    let bindings: Vec<vk::DescriptorSetLayoutBinding> = ranges
        .iter()
        .map(|range| {
            let descriptor_type = map_descriptor_range_type(range.resource_kind, range.range_type)?;
            Ok(vk::DescriptorSetLayoutBinding::default()
                .binding(range.base_shader_register)
                .descriptor_type(descriptor_type)
                .descriptor_count(range.descriptor_count.max(1))
                .stage_flags(stage_flags))
        })
        .collect::<Result<_, CreationError>>()?;
    let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
    unsafe { device.shared.raw.create_descriptor_set_layout(&layout_info, None) }.map_err(map_creation_error)
}

pub fn create_root_signature(
    device: &VulkanDevice,
    descriptor: &RootSignatureDescriptor,
) -> Result<VulkanRootSignature, CreationError> {
    descriptor.validate().map_err(CreationError::InvalidArgument)?;

    let mut descriptor_set_layouts = Vec::new();
    let mut push_constant_ranges = Vec::new();
    let mut static_samplers = Vec::new();
    let mut push_constant_offset = 0u32;

    for parameter in &descriptor.parameters {
        match parameter {
            RootParameter::DescriptorTable { ranges, visibility } => {
                descriptor_set_layouts.push(create_table_layout(device, ranges, *visibility)?);
            }
            RootParameter::RootConstantBufferView { shader_register: _, visibility } => {
                // A directly-bound CBV is realized as its own one-binding
                // descriptor table; Vulkan has no "root descriptor" concept
                // distinct from a descriptor set.
                let range = ral_core::root_signature::DescriptorRange {
                    range_type: ral_types::DescriptorRangeType::Ubv,
                    resource_kind: ral_types::ResourceKind::UniformBuffer,
                    base_shader_register: 0,
                    descriptor_count: 1,
                };
                descriptor_set_layouts.push(create_table_layout(device, std::slice::from_ref(&range), *visibility)?);
            }
            RootParameter::RootConstants { value_count, visibility, .. } => {
                let size = value_count * 4;
                push_constant_ranges.push(
                    vk::PushConstantRange::default()
                        .stage_flags(map_shader_visibility(*visibility))
                        .offset(push_constant_offset)
                        .size(size),
                );
                push_constant_offset += size;
            }
        }
    }

    for sampler in &descriptor.static_samplers {
        let result = create_static_sampler_layout(device, sampler);
        match result {
            Ok((layout, raw_sampler)) => {
                descriptor_set_layouts.push(layout);
                static_samplers.push(raw_sampler);
            }
            Err(err) => {
                destroy_layouts_and_samplers(device, &descriptor_set_layouts, &static_samplers);
                return Err(err);
            }
        }
    }

    let layout_info = vk::PipelineLayoutCreateInfo::default()
        .set_layouts(&descriptor_set_layouts)
        .push_constant_ranges(&push_constant_ranges);
    let pipeline_layout = match unsafe { device.shared.raw.create_pipeline_layout(&layout_info, None) } {
        Ok(l) => l,
        Err(e) => {
            destroy_layouts_and_samplers(device, &descriptor_set_layouts, &static_samplers);
            return Err(map_creation_error(e));
        }
    };

    Ok(VulkanRootSignature { descriptor_set_layouts, pipeline_layout, push_constant_ranges, static_samplers })
}

fn destroy_layouts_and_samplers(device: &VulkanDevice, layouts: &[vk::DescriptorSetLayout], samplers: &[vk::Sampler]) {
    unsafe {
        for layout in layouts {
            device.shared.raw.destroy_descriptor_set_layout(*layout, None);
        }
        for sampler in samplers {
            device.shared.raw.destroy_sampler(*sampler, None);
        }
    }
}

pub fn destroy_root_signature(device: &VulkanDevice, root_signature: VulkanRootSignature) {
    unsafe {
        device.shared.raw.destroy_pipeline_layout(root_signature.pipeline_layout, None);
    }
    destroy_layouts_and_samplers(device, &root_signature.descriptor_set_layouts, &root_signature.static_samplers);
}
