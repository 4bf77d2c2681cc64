//! Vulkan realization of the rendering abstraction layer (spec.md §6.2),
//! grounded on wgpu-hal's own `vulkan` module: thin `ash`
//! wrappers per resource kind, wired together here as
//! [`ral_core::backend::DeviceBackend`]'s single dispatch surface.
#![warn(trivial_casts, trivial_numeric_casts, unused_extern_crates)]

mod buffer;
mod command_buffer;
mod conv;
mod debug;
mod device;
mod framebuffer;
mod instance;
mod pipeline;
mod platform;
mod render_pass;
mod resource_group;
mod root_signature;
mod sampler;
mod shader;
mod swap_chain;
mod texture;
mod types;
mod vertex_array;

pub use device::VulkanDevice;
pub use instance::Instance;
pub use types::VulkanBackend;

use ral_core::backend::DeviceBackend;
use ral_core::buffer::BufferDescriptor;
use ral_core::command_buffer::Command;
use ral_core::context::Context;
use ral_core::error::{CreationError, DeviceError, SurfaceError};
use ral_core::framebuffer::FramebufferDescriptor;
use ral_core::pipeline::{ComputePipelineStateDescriptor, GraphicsPipelineStateDescriptor};
use ral_core::render_pass::{RenderPass, RenderPassDescriptor};
use ral_core::renderer::{Renderer, RendererDescriptor};
use ral_core::resource_group::{ResourceGroupDescriptor, ResourceGroupLayout};
use ral_core::root_signature::RootSignatureDescriptor;
use ral_core::sampler::SamplerDescriptor;
use ral_core::shader::{ShaderSource, ShaderStage};
use ral_core::swap_chain::SwapChainDescriptor;
use ral_core::texture::TextureDescriptor;
use ral_core::vertex_array::VertexArrayDescriptor;
use ral_types::MapType;
use std::sync::Arc;

/// Library entry point (spec.md §6.1 "Library entry point"): loads the
/// Vulkan loader, selects a physical device per `descriptor.gpu_preference`,
/// and returns a fully constructed [`Renderer`] bound to this backend.
///
/// Per the Open Question decision recorded in `DESIGN.md`, this lives here
/// rather than behind a `vulkan` feature re-exported from `ral-core`: since
/// `ral-vulkan` already depends on `ral-core`, a reverse optional dependency
/// the other way would be a cycle. Application code that wants the Vulkan
/// backend depends on both crates directly and calls this function.
pub fn create_vulkan_renderer_instance(
    descriptor: RendererDescriptor,
    context: Arc<dyn Context>,
) -> Result<Renderer<VulkanBackend>, CreationError> {
    let instance = Instance::new(
        &descriptor.application_name,
        descriptor.enable_validation,
        context.platform_display_handle(),
    )?;
    let (device, capabilities) =
        VulkanDevice::new(&instance, descriptor.gpu_preference, descriptor.max_descriptor_sets)?;
    Ok(Renderer::new(descriptor, context, device, capabilities))
}

impl DeviceBackend<VulkanBackend> for VulkanDevice {
    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<types::VulkanBuffer, CreationError> {
        buffer::create_buffer(self, descriptor, initial_data)
    }

    fn destroy_buffer(&self, buffer: types::VulkanBuffer) {
        buffer::destroy_buffer(self, buffer)
    }

    /// `map_type` is accepted to satisfy the trait but otherwise unused: a
    /// `gpu_alloc::MemoryBlock` mapping is coherent/host-visible regardless of
    /// read/write/write-discard intent on this backend. See `DESIGN.md` for
    /// the flush-on-write-types optimization this leaves on the table.
    unsafe fn map_buffer(&self, buffer: &types::VulkanBuffer, _map_type: MapType) -> Result<*mut u8, DeviceError> {
        unsafe { buffer::map_buffer(self, buffer) }
    }

    unsafe fn unmap_buffer(&self, buffer: &types::VulkanBuffer) {
        unsafe { buffer::unmap_buffer(self, buffer) }
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<(types::VulkanTexture, Option<types::VulkanTextureView>), CreationError> {
        texture::create_texture(self, descriptor, initial_data)
    }

    fn destroy_texture(&self, texture: types::VulkanTexture, view: Option<types::VulkanTextureView>) {
        texture::destroy_texture(self, texture, view)
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<types::VulkanSampler, CreationError> {
        sampler::create_sampler(self, descriptor)
    }

    fn destroy_sampler(&self, sampler: types::VulkanSampler) {
        sampler::destroy_sampler(self, sampler)
    }

    fn create_shader_module(
        &self,
        stage: ShaderStage,
        source: &ShaderSource,
    ) -> Result<types::VulkanShaderModule, CreationError> {
        shader::create_shader_module(self, stage, source)
    }

    fn destroy_shader_module(&self, module: types::VulkanShaderModule) {
        shader::destroy_shader_module(self, module)
    }

    fn shader_language_name(&self) -> &'static str {
        self.shader_language_name
    }

    fn create_root_signature(
        &self,
        descriptor: &RootSignatureDescriptor,
    ) -> Result<types::VulkanRootSignature, CreationError> {
        root_signature::create_root_signature(self, descriptor)
    }

    fn destroy_root_signature(&self, root_signature: types::VulkanRootSignature) {
        root_signature::destroy_root_signature(self, root_signature)
    }

    fn create_resource_group(
        &self,
        layout: &ResourceGroupLayout,
        descriptor: &ResourceGroupDescriptor<VulkanBackend>,
    ) -> Result<types::VulkanResourceGroup, CreationError> {
        resource_group::create_resource_group(self, layout, descriptor)
    }

    fn destroy_resource_group(&self, group: types::VulkanResourceGroup) {
        resource_group::destroy_resource_group(self, group)
    }

    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor<VulkanBackend>,
    ) -> Result<types::VulkanVertexArray, CreationError> {
        vertex_array::create_vertex_array(descriptor)
    }

    fn destroy_vertex_array(&self, vertex_array: types::VulkanVertexArray) {
        vertex_array::destroy_vertex_array(vertex_array)
    }

    fn create_render_pass(&self, descriptor: &RenderPassDescriptor) -> Result<types::VulkanRenderPass, CreationError> {
        render_pass::create_render_pass(self, descriptor)
    }

    fn destroy_render_pass(&self, render_pass: types::VulkanRenderPass) {
        render_pass::destroy_render_pass(self, render_pass)
    }

    fn create_framebuffer(
        &self,
        render_pass: &types::VulkanRenderPass,
        descriptor: &FramebufferDescriptor<VulkanBackend>,
    ) -> Result<types::VulkanFramebuffer, CreationError> {
        framebuffer::create_framebuffer(self, render_pass, descriptor)
    }

    fn destroy_framebuffer(&self, framebuffer: types::VulkanFramebuffer) {
        framebuffer::destroy_framebuffer(self, framebuffer)
    }

    fn create_graphics_pipeline_state(
        &self,
        descriptor: &GraphicsPipelineStateDescriptor<VulkanBackend>,
    ) -> Result<types::VulkanGraphicsPipeline, CreationError> {
        pipeline::create_graphics_pipeline_state(self, descriptor)
    }

    fn destroy_graphics_pipeline_state(&self, pipeline: types::VulkanGraphicsPipeline) {
        pipeline::destroy_graphics_pipeline_state(self, pipeline)
    }

    fn create_compute_pipeline_state(
        &self,
        descriptor: &ComputePipelineStateDescriptor<VulkanBackend>,
    ) -> Result<types::VulkanComputePipeline, CreationError> {
        pipeline::create_compute_pipeline_state(self, descriptor)
    }

    fn destroy_compute_pipeline_state(&self, pipeline: types::VulkanComputePipeline) {
        pipeline::destroy_compute_pipeline_state(self, pipeline)
    }

    fn submit(&self, commands: &[Command<VulkanBackend>]) -> Result<(), DeviceError> {
        command_buffer::submit(self, commands)
    }

    fn wait_idle(&self) -> Result<(), DeviceError> {
        VulkanDevice::wait_idle(self)
    }

    fn create_swap_chain(
        &self,
        render_pass: &RenderPass<VulkanBackend>,
        descriptor: &SwapChainDescriptor<VulkanBackend>,
    ) -> Result<(types::VulkanSwapChain, u32, u32), CreationError> {
        swap_chain::create_swap_chain(self, render_pass, descriptor)
    }

    fn destroy_swap_chain(&self, swap_chain: types::VulkanSwapChain) {
        swap_chain::destroy_swap_chain(self, swap_chain)
    }

    fn resize_swap_chain(&self, swap_chain: &types::VulkanSwapChain) -> Result<(u32, u32), SurfaceError> {
        swap_chain::resize_swap_chain(self, swap_chain)
    }

    fn present(&self, swap_chain: &types::VulkanSwapChain) -> Result<(), SurfaceError> {
        swap_chain::present(self, swap_chain)
    }

    fn acquire_next_image(&self, swap_chain: &types::VulkanSwapChain) -> Result<u32, SurfaceError> {
        swap_chain::acquire_next_image(self, swap_chain)
    }

    fn swap_chain_framebuffer(&self, swap_chain: &types::VulkanSwapChain, image_index: u32) -> types::VulkanFramebuffer {
        swap_chain::swap_chain_framebuffer(swap_chain, image_index)
    }
}
