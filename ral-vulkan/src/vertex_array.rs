//! Builds the `VkVertexInputBindingDescription`/`VkVertexInputAttributeDescription`
//! tables a [`VertexArrayDescriptor`] implies. Vulkan has no VAO object the
//! way OpenGL does, so unlike every other `create_*`/`destroy_*` pair in this
//! crate this one allocates nothing — it only translates data, the way the
//! teacher's own `vulkan::Device::create_vertex_buffers` precomputes the
//! binding tables it later feeds straight into `vkCmdBindVertexBuffers`.
use crate::conv::map_index_buffer_format;
use crate::types::{VulkanBackend, VulkanVertexArray};
use ash::vk;
use ral_core::error::CreationError;
use ral_core::vertex_array::VertexArrayDescriptor;

pub fn create_vertex_array(
    descriptor: &VertexArrayDescriptor<VulkanBackend>,
) -> Result<VulkanVertexArray, CreationError> {
    let mut buffers = Vec::with_capacity(descriptor.vertex_buffers.len());
    let mut bindings = Vec::with_capacity(descriptor.vertex_buffers.len());
    let mut attributes = Vec::new();

    for (binding_index, vertex_buffer) in descriptor.vertex_buffers.iter().enumerate() {
        let binding_index = binding_index as u32;
        buffers.push((vertex_buffer.buffer.raw().raw, 0u64));

        let input_rate = if vertex_buffer.instance_step_rate.is_some() {
            vk::VertexInputRate::INSTANCE
        } else {
            vk::VertexInputRate::VERTEX
        };
        bindings.push(
            vk::VertexInputBindingDescription2EXT::default()
                .binding(binding_index)
                .stride(vertex_buffer.stride)
                .input_rate(input_rate)
                .divisor(vertex_buffer.instance_step_rate.unwrap_or(1).max(1)),
        );

        for attribute in &vertex_buffer.attributes {
            attributes.push(
                vk::VertexInputAttributeDescription2EXT::default()
                    .location(attribute.shader_location)
                    .binding(binding_index)
                    .format(crate::conv::map_texture_format(attribute.format))
                    .offset(attribute.offset),
            );
        }
    }

    let index_buffer = descriptor
        .index_buffer
        .as_ref()
        .map(|(buffer, format)| {
            map_index_buffer_format(*format).map(|index_type| (buffer.raw().raw, 0u64, index_type))
        })
        .transpose()?;

    Ok(VulkanVertexArray { buffers, index_buffer, bindings, attributes })
}

pub fn destroy_vertex_array(_vertex_array: VulkanVertexArray) {
    // Nothing to release: no Vulkan object was ever created for it.
}
