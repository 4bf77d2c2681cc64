//! Backend-agnostic data model, resource validation, and command recording
//! for the rendering abstraction layer. Generic over a [`backend::Backend`]
//! implementation (see the `ral-null` and `ral-vulkan` crates); this crate
//! never touches a concrete graphics API itself.
#![warn(trivial_casts, trivial_numeric_casts, unused_extern_crates)]

pub mod backend;
pub mod buffer;
pub mod command_buffer;
pub mod context;
pub mod error;
pub mod framebuffer;
pub mod pipeline;
pub mod render_pass;
pub mod renderer;
pub mod resource;
pub mod resource_group;
pub mod root_signature;
pub mod sampler;
pub mod shader;
#[cfg(feature = "statistics")]
pub mod statistics;
pub mod swap_chain;
pub mod texture;
pub mod vertex_array;

pub use backend::{Backend, DeviceBackend};
pub use buffer::{Buffer, BufferDescriptor, BufferKind};
pub use command_buffer::{Command, CommandBuffer, CommandBufferRecorder, DrawIndexedSource, DrawSource};
pub use context::{Context, NativeWindowHandle, PlatformDisplayHandle};
pub use error::{CreationError, DeviceError, SurfaceError};
pub use framebuffer::{Framebuffer, FramebufferAttachment, FramebufferDescriptor};
pub use pipeline::{
    BlendState, ComputePipelineState, ComputePipelineStateDescriptor, DepthStencilState,
    GraphicsPipelineState, GraphicsPipelineStateDescriptor, RasterizerState,
    RenderTargetBlendState, StencilOp, StencilOpState,
};
pub use render_pass::{
    ColorAttachmentDescriptor, DepthStencilAttachmentDescriptor, LoadOp, RenderPass,
    RenderPassDescriptor, StoreOp,
};
pub use renderer::{GpuPreference, Renderer, RendererDescriptor, SceneState};
pub use resource::{AffinityMismatch, Res, Resource, ResourceMeta, RendererId};
pub use resource_group::{BoundResource, ResourceGroup, ResourceGroupDescriptor, ResourceGroupLayout};
pub use root_signature::{DescriptorRange, RootParameter, RootSignature, RootSignatureDescriptor, StaticSampler};
pub use sampler::{SamplerDescriptor, SamplerState};
pub use shader::{GraphicsProgram, ShaderLanguage, ShaderModule, ShaderSource, ShaderStage};
pub use swap_chain::{RenderWindow, SwapChain, SwapChainDescriptor};
pub use texture::{OptimizedTextureClearValue, Texture, TextureDescriptor, TextureKind};
pub use vertex_array::{VertexArray, VertexArrayDescriptor, VertexArrayVertexBuffer, VertexAttribute};
