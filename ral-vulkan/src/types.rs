//! The concrete handle types this crate plugs into
//! [`ral_core::backend::Backend`]'s associated types, plus the
//! [`VulkanBackend`] marker itself.
use crate::device::VulkanDevice;
use ash::vk;
use gpu_alloc::MemoryBlock;
use gpu_descriptor::DescriptorSet;
use parking_lot::Mutex;

#[derive(Debug)]
pub struct VulkanBuffer {
    pub raw: vk::Buffer,
    pub block: Mutex<Option<MemoryBlock<vk::DeviceMemory>>>,
    pub size: u64,
    /// Set for `BufferKind::Texture` buffers only (spec.md §4.3): the
    /// texel-format view `UNIFORM_TEXEL_BUFFER`/`STORAGE_TEXEL_BUFFER`
    /// descriptor writes bind through.
    pub view: Option<vk::BufferView>,
}

#[derive(Debug)]
pub struct VulkanTexture {
    pub raw: vk::Image,
    pub block: Mutex<Option<MemoryBlock<vk::DeviceMemory>>>,
    pub format: vk::Format,
    pub width: u32,
    pub height: u32,
    pub depth_or_array_layers: u32,
    pub mip_level_count: u32,
}

#[derive(Debug)]
pub struct VulkanTextureView {
    pub raw: vk::ImageView,
    /// (min_mip, max_mip) last set by `SetTextureMinimumMaximumMipmapIndex`.
    pub mip_range: Mutex<(u32, u32)>,
}

#[derive(Debug)]
pub struct VulkanSampler {
    pub raw: vk::Sampler,
}

#[derive(Debug)]
pub struct VulkanShaderModule {
    pub raw: vk::ShaderModule,
    pub entry_point: std::ffi::CString,
}

#[derive(Debug)]
pub struct VulkanRootSignature {
    pub descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
    pub pipeline_layout: vk::PipelineLayout,
    /// Offsets into the push-constant block for each `RootConstants`
    /// parameter, in declaration order.
    pub push_constant_ranges: Vec<vk::PushConstantRange>,
    /// Immutable samplers baked into their own single-binding descriptor
    /// sets, one per `StaticSampler`; owned here since nothing else
    /// references them once the layout is built.
    pub static_samplers: Vec<vk::Sampler>,
}

pub struct VulkanResourceGroup {
    pub set: Mutex<Option<DescriptorSet<vk::DescriptorSet>>>,
    pub raw: vk::DescriptorSet,
}

impl std::fmt::Debug for VulkanResourceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulkanResourceGroup").field("raw", &self.raw).finish()
    }
}

/// Built once at `create_vertex_array` time and replayed at every draw via
/// `vkCmdSetVertexInputEXT` (`VK_EXT_vertex_input_dynamic_state`) since
/// pipelines here carry no baked-in vertex input state; see
/// `device::DeviceShared::vertex_input_dynamic_state_fn`.
#[derive(Debug)]
pub struct VulkanVertexArray {
    pub buffers: Vec<(vk::Buffer, u64)>,
    pub index_buffer: Option<(vk::Buffer, u64, vk::IndexType)>,
    pub bindings: Vec<vk::VertexInputBindingDescription2EXT>,
    pub attributes: Vec<vk::VertexInputAttributeDescription2EXT>,
}

#[derive(Debug)]
pub struct VulkanRenderPass {
    pub raw: vk::RenderPass,
    pub color_attachment_count: u32,
    pub has_depth_stencil: bool,
}

#[derive(Debug)]
pub struct VulkanFramebuffer {
    pub raw: Mutex<Option<vk::Framebuffer>>,
    pub render_pass: vk::RenderPass,
    pub views: Vec<vk::ImageView>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub struct VulkanGraphicsPipeline {
    pub raw: vk::Pipeline,
}

#[derive(Debug)]
pub struct VulkanComputePipeline {
    pub raw: vk::Pipeline,
}

/// A presentable swap chain and everything that gets torn down and rebuilt
/// together on resize: the depth image, the swap chain's own render pass
/// (ending in `PRESENT_SRC_KHR`, spec.md §4.6), and one framebuffer per
/// image. The surface itself outlives resizes, so it lives outside the
/// `Mutex`.
pub struct VulkanSwapChain {
    pub surface_loader: ash::extensions::khr::Surface,
    pub surface: vk::SurfaceKHR,
    pub swapchain_loader: ash::extensions::khr::Swapchain,
    pub render_pass: vk::RenderPass,
    /// Kept so `resize_swap_chain` can rebuild images/depth buffer against
    /// the same attachment layout without the caller re-supplying it.
    pub render_pass_descriptor: ral_core::render_pass::RenderPassDescriptor,
    pub state: Mutex<VulkanSwapChainState>,
}

/// The part of a [`VulkanSwapChain`] replaced wholesale by
/// `resize_swap_chain` (spec.md §4.6 `resize_buffers`).
pub struct VulkanSwapChainState {
    pub raw: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub views: Vec<vk::ImageView>,
    pub framebuffers: Vec<vk::Framebuffer>,
    pub depth_image: Option<VulkanTexture>,
    pub depth_view: Option<vk::ImageView>,
    pub format: vk::Format,
    pub width: u32,
    pub height: u32,
    /// Signalled by `vkAcquireNextImageKHR`, waited on by the first submit
    /// touching the acquired image (spec.md §4.6 `image_available`).
    pub image_available: vk::Semaphore,
    /// Signalled by the submit that renders into the acquired image, waited
    /// on by `vkQueuePresentKHR` (spec.md §4.6 `rendering_finished`).
    pub rendering_finished: vk::Semaphore,
    /// Set by `acquire_next_image`, read back by `present` and
    /// `swap_chain_framebuffer` — neither takes an image index of its own
    /// (spec.md §4.6), so the swap chain tracks the last acquired one.
    pub current_image_index: Option<u32>,
}

impl std::fmt::Debug for VulkanSwapChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulkanSwapChain").finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct VulkanCommandBuffer {
    pub raw: vk::CommandBuffer,
    pub pool: vk::CommandPool,
}

/// Marker type tying together every concrete Vulkan resource type as
/// [`ral_core::backend::Backend`]'s associated types, mirroring the role
/// wgpu-hal's own `vulkan::Api` marker plays for it.
#[derive(Debug, Clone, Copy)]
pub struct VulkanBackend;

impl ral_core::backend::Backend for VulkanBackend {
    type Buffer = VulkanBuffer;
    type Texture = VulkanTexture;
    type TextureView = VulkanTextureView;
    type Sampler = VulkanSampler;
    type ShaderModule = VulkanShaderModule;
    type RootSignature = VulkanRootSignature;
    type ResourceGroup = VulkanResourceGroup;
    type VertexArray = VulkanVertexArray;
    type RenderPass = VulkanRenderPass;
    type Framebuffer = VulkanFramebuffer;
    type GraphicsPipeline = VulkanGraphicsPipeline;
    type ComputePipeline = VulkanComputePipeline;
    type SwapChain = VulkanSwapChain;
    type CommandBuffer = VulkanCommandBuffer;
    type Device = VulkanDevice;
}
