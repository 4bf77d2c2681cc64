use crate::buffer::{Buffer, BufferDescriptor};
use crate::command_buffer::Command;
use crate::error::{CreationError, DeviceError, SurfaceError};
use crate::framebuffer::{Framebuffer, FramebufferDescriptor};
use crate::pipeline::{ComputePipelineStateDescriptor, GraphicsPipelineStateDescriptor};
use crate::render_pass::{RenderPass, RenderPassDescriptor};
use crate::resource_group::{ResourceGroupDescriptor, ResourceGroupLayout};
use crate::root_signature::RootSignatureDescriptor;
use crate::sampler::SamplerDescriptor;
use crate::shader::{ShaderModule, ShaderSource, ShaderStage};
use crate::swap_chain::SwapChainDescriptor;
use crate::texture::{Texture, TextureDescriptor};
use crate::vertex_array::VertexArrayDescriptor;
use ral_types::MapType;

/// Associated-type family tying every data-model struct in this crate to a
/// concrete backend's native object types (e.g. Vulkan `VkBuffer`/`VkImage`
/// handles, or the null backend's unit types). Mirrors the shape of the
/// wgpu-hal's own `hal::Api` trait, collapsed to the single object family this
/// crate's data model needs rather than `Api::{Instance,Adapter,Device,...}`
/// each owning their own associated types.
pub trait Backend: Sized + 'static {
    type Buffer: std::fmt::Debug + Send + Sync;
    type Texture: std::fmt::Debug + Send + Sync;
    type TextureView: std::fmt::Debug + Send + Sync;
    type Sampler: std::fmt::Debug + Send + Sync;
    type ShaderModule: std::fmt::Debug + Send + Sync;
    type RootSignature: std::fmt::Debug + Send + Sync;
    type ResourceGroup: std::fmt::Debug + Send + Sync;
    type VertexArray: std::fmt::Debug + Send + Sync;
    type RenderPass: std::fmt::Debug + Send + Sync;
    type Framebuffer: std::fmt::Debug + Send + Sync;
    type GraphicsPipeline: std::fmt::Debug + Send + Sync;
    type ComputePipeline: std::fmt::Debug + Send + Sync;
    type SwapChain: std::fmt::Debug + Send + Sync;
    /// Opaque recorded-command-buffer handle the backend replays at submit
    /// time (spec.md §4.5 "recorded, then replayed").
    type CommandBuffer: std::fmt::Debug + Send + Sync;
    /// The concrete device type implementing [`DeviceBackend`] for this
    /// family of associated types.
    type Device: DeviceBackend<Self>;
}

/// The actual creation/destruction/dispatch surface a backend (`ral-null`,
/// `ral-vulkan`) implements. Kept separate from [`Backend`] so the data
/// model's generic structs only need to name associated types, not every
/// method — the same split wgpu-hal draws between `hal::Api` (types) and
/// `hal::Api::Device` (the trait with the methods).
///
/// All `Result`-returning methods here surface spec.md's recoverable error
/// paths (§7 out-of-memory, device-lost, missing capability). Violations
/// spec.md marks CRITICAL (misuse, not environment failure — e.g. a
/// validate() failure the caller should have caught) are asserted by the
/// caller in `ral-core` before a backend method is ever invoked; backends
/// are not expected to re-check them.
pub trait DeviceBackend<B: Backend>: std::fmt::Debug + Send + Sync {
    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<B::Buffer, CreationError>;
    fn destroy_buffer(&self, buffer: B::Buffer);
    /// Persistent mapping (spec.md §12, supplemented from `original_source/`
    /// `map`/`unmap`). Only valid for buffers created with a CPU-visible
    /// usage; backends return [`DeviceError::Unsupported`] otherwise.
    unsafe fn map_buffer(&self, buffer: &B::Buffer, map_type: MapType) -> Result<*mut u8, DeviceError>;
    unsafe fn unmap_buffer(&self, buffer: &B::Buffer);

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<(B::Texture, Option<B::TextureView>), CreationError>;
    fn destroy_texture(&self, texture: B::Texture, view: Option<B::TextureView>);

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<B::Sampler, CreationError>;
    fn destroy_sampler(&self, sampler: B::Sampler);

    /// Decodes backend-native bytecode (Vulkan: SMOL-V -> SPIR-V, spec.md
    /// §6.3) or compiles source (GLSL, gated on the `glsl-to-spirv` feature).
    fn create_shader_module(
        &self,
        stage: ShaderStage,
        source: &ShaderSource,
    ) -> Result<B::ShaderModule, CreationError>;
    fn destroy_shader_module(&self, module: B::ShaderModule);
    /// Tag identifying the backend's shader dialect (e.g. `"GLSL"`), used for
    /// the [`crate::shader::GraphicsProgram`] linkage check (spec.md §3.1).
    fn shader_language_name(&self) -> &'static str;

    fn create_root_signature(&self, descriptor: &RootSignatureDescriptor) -> Result<B::RootSignature, CreationError>;
    fn destroy_root_signature(&self, root_signature: B::RootSignature);

    fn create_resource_group(
        &self,
        layout: &ResourceGroupLayout,
        descriptor: &ResourceGroupDescriptor<B>,
    ) -> Result<B::ResourceGroup, CreationError>;
    fn destroy_resource_group(&self, group: B::ResourceGroup);

    fn create_vertex_array(&self, descriptor: &VertexArrayDescriptor<B>) -> Result<B::VertexArray, CreationError>;
    fn destroy_vertex_array(&self, vertex_array: B::VertexArray);

    fn create_render_pass(&self, descriptor: &RenderPassDescriptor) -> Result<B::RenderPass, CreationError>;
    fn destroy_render_pass(&self, render_pass: B::RenderPass);

    fn create_framebuffer(
        &self,
        render_pass: &B::RenderPass,
        descriptor: &FramebufferDescriptor<B>,
    ) -> Result<B::Framebuffer, CreationError>;
    fn destroy_framebuffer(&self, framebuffer: B::Framebuffer);

    fn create_graphics_pipeline_state(
        &self,
        descriptor: &GraphicsPipelineStateDescriptor<B>,
    ) -> Result<B::GraphicsPipeline, CreationError>;
    fn destroy_graphics_pipeline_state(&self, pipeline: B::GraphicsPipeline);

    fn create_compute_pipeline_state(
        &self,
        descriptor: &ComputePipelineStateDescriptor<B>,
    ) -> Result<B::ComputePipeline, CreationError>;
    fn destroy_compute_pipeline_state(&self, pipeline: B::ComputePipeline);

    /// Replays a fully recorded [`Command`] stream (spec.md §4.5). The
    /// backend owns command-buffer/fence/semaphore lifetime internally;
    /// callers never see raw synchronization primitives.
    fn submit(&self, commands: &[Command<B>]) -> Result<(), DeviceError>;

    /// Blocks until all work submitted so far has completed (spec.md §12
    /// `finish`).
    fn wait_idle(&self) -> Result<(), DeviceError>;

    /// Creates the presentable images (and, if `render_pass` declares one,
    /// the depth image) for a native window (spec.md §3.1 "SwapChain",
    /// §4.6). Returns the backend-native handle plus the `(width, height)`
    /// the backend chose (clamped extent, per §4.6).
    fn create_swap_chain(
        &self,
        render_pass: &RenderPass<B>,
        descriptor: &SwapChainDescriptor<B>,
    ) -> Result<(B::SwapChain, u32, u32), CreationError>;
    fn destroy_swap_chain(&self, swap_chain: B::SwapChain);

    /// Recreates a swap chain's images against its existing surface after an
    /// OS-driven resize or an `OUT_OF_DATE`/`SUBOPTIMAL` present result
    /// (spec.md §4.6 `resize_buffers`/`recreate`). Returns the new
    /// `(width, height)`.
    fn resize_swap_chain(&self, swap_chain: &B::SwapChain) -> Result<(u32, u32), SurfaceError>;

    fn present(&self, swap_chain: &B::SwapChain) -> Result<(), SurfaceError>;
    fn acquire_next_image(&self, swap_chain: &B::SwapChain) -> Result<u32, SurfaceError>;

    /// Wraps the image at `image_index` (as last returned by
    /// [`Self::acquire_next_image`]) in a backend-native framebuffer
    /// compatible with the swap chain's own render pass, so it can be bound
    /// as a [`crate::command_buffer::Command::SetGraphicsRenderTarget`]
    /// the same way an application-owned framebuffer would (spec.md §3.1: a
    /// swap chain is itself "a RenderPass bound to an OS window plus
    /// presentable color images"). Backends that cache per-image
    /// framebuffers (Vulkan) just hand back the cached handle.
    fn swap_chain_framebuffer(&self, swap_chain: &B::SwapChain, image_index: u32) -> B::Framebuffer;

    fn set_debug_name<T: std::fmt::Debug>(&self, _object: &T, _name: &str) {}
}

#[cfg(test)]
mod tests {
    // `Backend`/`DeviceBackend` are pure trait definitions; their
    // implementations (`ral-null`, `ral-vulkan`) carry the behavioral tests.
}
