//! `VkSampler` creation, grounded on wgpu-hal's own
//! `vulkan::Device::create_sampler`.
use crate::conv::{map_address_mode, map_compare_function, map_filter_mode};
use crate::device::{map_creation_error, VulkanDevice};
use crate::types::VulkanSampler;
use ash::vk;
use ral_core::error::CreationError;
use ral_core::sampler::SamplerDescriptor;

/// Vulkan only offers a handful of fixed border colors without the
/// `VK_EXT_custom_border_color` extension this crate doesn't enable, so an
/// arbitrary RGBA border snaps to whichever of those it's closest to.
fn map_border_color(color: [f32; 4]) -> vk::BorderColor {
    let opaque = color[3] >= 0.5;
    let white = color[0] >= 0.5 && color[1] >= 0.5 && color[2] >= 0.5;
    match (white, opaque) {
        (true, true) => vk::BorderColor::FLOAT_OPAQUE_WHITE,
        (_, true) => vk::BorderColor::FLOAT_OPAQUE_BLACK,
        _ => vk::BorderColor::FLOAT_TRANSPARENT_BLACK,
    }
}

pub fn create_sampler(
    device: &VulkanDevice,
    descriptor: &SamplerDescriptor,
) -> Result<VulkanSampler, CreationError> {
    let (min_filter, mag_filter, mipmap_mode, anisotropy_enable, compare_enable) =
        map_filter_mode(descriptor.filter);

    let create_info = vk::SamplerCreateInfo::default()
        .min_filter(min_filter)
        .mag_filter(mag_filter)
        .mipmap_mode(mipmap_mode)
        .address_mode_u(map_address_mode(descriptor.address_u))
        .address_mode_v(map_address_mode(descriptor.address_v))
        .address_mode_w(map_address_mode(descriptor.address_w))
        .mip_lod_bias(descriptor.mip_lod_bias)
        .anisotropy_enable(anisotropy_enable)
        .max_anisotropy(descriptor.max_anisotropy.max(1.0))
        .compare_enable(compare_enable)
        .compare_op(map_compare_function(ral_types::CompareFunction::LessEqual))
        .min_lod(descriptor.min_lod)
        .max_lod(descriptor.max_lod)
        .border_color(map_border_color(descriptor.border_color));

    let raw =
        unsafe { device.shared.raw.create_sampler(&create_info, None) }.map_err(map_creation_error)?;
    Ok(VulkanSampler { raw })
}

pub fn destroy_sampler(device: &VulkanDevice, sampler: VulkanSampler) {
    unsafe {
        device.shared.raw.destroy_sampler(sampler.raw, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_black_border_maps_to_the_fixed_vulkan_constant() {
        assert_eq!(map_border_color([0.0, 0.0, 0.0, 1.0]), vk::BorderColor::FLOAT_OPAQUE_BLACK);
    }

    #[test]
    fn transparent_border_maps_to_the_fixed_vulkan_constant() {
        assert_eq!(map_border_color([0.0, 0.0, 0.0, 0.0]), vk::BorderColor::FLOAT_TRANSPARENT_BLACK);
    }
}
