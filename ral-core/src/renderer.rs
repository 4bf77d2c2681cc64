use crate::backend::{Backend, DeviceBackend};
use crate::buffer::{Buffer, BufferDescriptor};
use crate::command_buffer::{CommandBuffer, CommandBufferRecorder};
use crate::context::Context;
use crate::error::{CreationError, DeviceError, SurfaceError};
use crate::framebuffer::{Framebuffer, FramebufferDescriptor};
use crate::pipeline::{ComputePipelineState, ComputePipelineStateDescriptor, GraphicsPipelineState, GraphicsPipelineStateDescriptor};
use crate::render_pass::{RenderPass, RenderPassDescriptor};
use crate::resource::{Res, Resource, ResourceMeta, RendererId};
use crate::resource_group::{ResourceGroup, ResourceGroupDescriptor, ResourceGroupLayout};
use crate::root_signature::{RootSignature, RootSignatureDescriptor};
use crate::sampler::{SamplerDescriptor, SamplerState};
use crate::shader::{GraphicsProgram, ShaderModule, ShaderSource, ShaderStage};
use crate::swap_chain::{SwapChain, SwapChainDescriptor};
use crate::texture::{Texture, TextureDescriptor};
use crate::vertex_array::{VertexArray, VertexArrayDescriptor};
use ral_types::{Capabilities, MapType};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Construction-time configuration for a [`Renderer`] (spec.md §3.1
/// "Renderer creation", §6.2). Fields beyond what spec.md names are the
/// ambient ones every backend needs regardless of API (validation toggle,
/// descriptor-pool sizing) rather than rendering features, so they live here
/// instead of in a Non-goal's excluded surface.
#[derive(Debug, Clone)]
pub struct RendererDescriptor {
    pub application_name: String,
    pub enable_validation: bool,
    /// GPU selection preference; `None` lets the backend pick its own
    /// heuristic (discrete > integrated > CPU).
    pub gpu_preference: Option<GpuPreference>,
    /// Upper bound on descriptor sets a backend's internal descriptor pool(s)
    /// may allocate. Per the Open Question decision recorded in
    /// `SPEC_FULL.md` §13, this was previously a hardcoded constant in the
    /// source; it is a configuration field here, defaulting to that same
    /// constant.
    pub max_descriptor_sets: u32,
}

impl RendererDescriptor {
    /// The source's hardcoded `maxSets` value for its descriptor pool.
    pub const DEFAULT_MAX_DESCRIPTOR_SETS: u32 = 4242;
}

impl Default for RendererDescriptor {
    fn default() -> Self {
        Self {
            application_name: "RAL application".to_string(),
            enable_validation: cfg!(debug_assertions),
            gpu_preference: None,
            max_descriptor_sets: Self::DEFAULT_MAX_DESCRIPTOR_SETS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuPreference {
    Discrete,
    Integrated,
    Cpu,
}

/// Whether a [`Renderer`] currently has an open command-buffer recording
/// session (spec.md §4.5 scene state machine: `begin_scene`/`end_scene`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Idle,
    Recording,
}

/// The top-level façade applications drive (spec.md §3.1 "Renderer"):
/// resource factory, command-buffer recorder, and submission point, backed
/// by one [`DeviceBackend`] implementation.
///
/// Resource creation methods return [`Res`] (`Arc`) handles; dropping the
/// last handle destroys the backend object synchronously, matching spec.md
/// §4.1's "resources are reference counted, destroyed at zero" rule without
/// a separate garbage-collection pass.
#[derive(Debug)]
pub struct Renderer<B: Backend> {
    id: RendererId,
    descriptor: RendererDescriptor,
    context: Arc<dyn Context>,
    device: Arc<B::Device>,
    capabilities: Capabilities,
    recording: AtomicBool,
}

impl<B: Backend> Renderer<B> {
    pub fn new(
        descriptor: RendererDescriptor,
        context: Arc<dyn Context>,
        device: B::Device,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            id: RendererId::next(),
            descriptor,
            context,
            device: Arc::new(device),
            capabilities,
            recording: AtomicBool::new(false),
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn descriptor(&self) -> &RendererDescriptor {
        &self.descriptor
    }

    fn meta(&self, kind: ral_types::ResourceKind) -> ResourceMeta {
        ResourceMeta::new(kind, self.id)
    }

    /// Backend-affinity check (spec.md §4.1 "using a resource with a
    /// different Renderer is a CRITICAL error in debug builds", §4.8). Run
    /// at the point a resource is bound into another object — resource
    /// group, framebuffer, vertex array, pipeline state — rather than
    /// deferred until command replay. Logs CRITICAL and returns an error the
    /// caller propagates as a failed creation (no object is created), mirroring
    /// every other validation failure in this module.
    fn check_affinity(&self, resource: &impl crate::resource::Resource) -> Result<(), CreationError> {
        resource.meta().check_affinity(self.id).map_err(|e| {
            self.log_critical(&format!("{e}"));
            CreationError::from(e)
        })
    }

    // -- Resource factories (spec.md §3.1 "Resource creation") ----------

    pub fn create_buffer(
        &self,
        descriptor: BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<Res<Buffer<B>>, CreationError> {
        descriptor
            .validate()
            .map_err(CreationError::InvalidArgument)?;
        let raw = self.device.create_buffer(&descriptor, initial_data)?;
        let kind = descriptor.kind.resource_kind();
        Ok(Arc::new(Buffer::new(self.meta(kind), descriptor, raw, Arc::clone(&self.device))))
    }

    pub fn create_texture(
        &self,
        descriptor: TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<Res<Texture<B>>, CreationError> {
        descriptor
            .validate()
            .map_err(CreationError::InvalidArgument)?;
        descriptor
            .validate_initial_data(initial_data.is_some())
            .map_err(CreationError::InvalidArgument)?;
        let (raw, view) = self.device.create_texture(&descriptor, initial_data)?;
        let kind = descriptor.kind.resource_kind();
        Ok(Arc::new(Texture::new(self.meta(kind), descriptor, raw, view, Arc::clone(&self.device))))
    }

    pub fn create_sampler(&self, descriptor: SamplerDescriptor) -> Result<Res<SamplerState<B>>, CreationError> {
        descriptor
            .validate(self.capabilities.max_anisotropy)
            .map_err(CreationError::InvalidArgument)?;
        let raw = self.device.create_sampler(&descriptor)?;
        Ok(Arc::new(SamplerState::new(
            self.meta(ral_types::ResourceKind::SamplerState),
            descriptor,
            raw,
            Arc::clone(&self.device),
        )))
    }

    pub fn create_shader_module(
        &self,
        stage: ShaderStage,
        source: ShaderSource,
    ) -> Result<Res<ShaderModule<B>>, CreationError> {
        let raw = self.device.create_shader_module(stage, &source)?;
        let language_name = self.device.shader_language_name();
        Ok(Arc::new(ShaderModule::new(
            self.meta(stage.resource_kind()),
            stage,
            language_name,
            raw,
            Arc::clone(&self.device),
        )))
    }

    pub fn create_graphics_program(
        &self,
        vertex_shader: Res<ShaderModule<B>>,
        tessellation_control_shader: Option<Res<ShaderModule<B>>>,
        tessellation_evaluation_shader: Option<Res<ShaderModule<B>>>,
        geometry_shader: Option<Res<ShaderModule<B>>>,
        fragment_shader: Option<Res<ShaderModule<B>>>,
    ) -> Result<Res<GraphicsProgram<B>>, CreationError> {
        self.check_affinity(vertex_shader.as_ref())?;
        for stage in [
            tessellation_control_shader.as_deref(),
            tessellation_evaluation_shader.as_deref(),
            geometry_shader.as_deref(),
            fragment_shader.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            self.check_affinity(stage)?;
        }
        GraphicsProgram::validate(
            &vertex_shader,
            tessellation_control_shader.as_deref(),
            tessellation_evaluation_shader.as_deref(),
            geometry_shader.as_deref(),
            fragment_shader.as_deref(),
        )
        .map_err(CreationError::InvalidArgument)?;
        Ok(Arc::new(GraphicsProgram::new(
            self.meta(ral_types::ResourceKind::GraphicsProgram),
            vertex_shader,
            tessellation_control_shader,
            tessellation_evaluation_shader,
            geometry_shader,
            fragment_shader,
        )))
    }

    pub fn create_root_signature(
        &self,
        descriptor: RootSignatureDescriptor,
    ) -> Result<Res<RootSignature<B>>, CreationError> {
        descriptor.validate().map_err(CreationError::InvalidArgument)?;
        let raw = self.device.create_root_signature(&descriptor)?;
        Ok(Arc::new(RootSignature::new(
            self.meta(ral_types::ResourceKind::RootSignature),
            descriptor,
            raw,
            Arc::clone(&self.device),
        )))
    }

    pub fn create_resource_group(
        &self,
        layout: &ResourceGroupLayout,
        descriptor: ResourceGroupDescriptor<B>,
    ) -> Result<Res<ResourceGroup<B>>, CreationError> {
        use crate::resource_group::BoundResource;
        for binding in &descriptor.bindings {
            match binding {
                BoundResource::Buffer(b) => self.check_affinity(b.as_ref())?,
                BoundResource::Texture(t) => self.check_affinity(t.as_ref())?,
                BoundResource::Sampler(s) => self.check_affinity(s.as_ref())?,
                BoundResource::Empty => {}
            }
        }
        let raw = self.device.create_resource_group(layout, &descriptor)?;
        Ok(Arc::new(ResourceGroup::new(
            self.meta(ral_types::ResourceKind::ResourceGroup),
            descriptor,
            raw,
            Arc::clone(&self.device),
        )))
    }

    pub fn create_vertex_array(
        &self,
        descriptor: VertexArrayDescriptor<B>,
    ) -> Result<Res<VertexArray<B>>, CreationError> {
        for vb in &descriptor.vertex_buffers {
            self.check_affinity(vb.buffer.as_ref())?;
        }
        if let Some((index_buffer, _)) = &descriptor.index_buffer {
            self.check_affinity(index_buffer.as_ref())?;
        }
        let raw = self.device.create_vertex_array(&descriptor)?;
        Ok(Arc::new(VertexArray::new(self.meta(ral_types::ResourceKind::VertexArray), raw, Arc::clone(&self.device))))
    }

    pub fn create_render_pass(
        &self,
        descriptor: RenderPassDescriptor,
    ) -> Result<Res<RenderPass<B>>, CreationError> {
        descriptor.validate().map_err(CreationError::InvalidArgument)?;
        let raw = self.device.create_render_pass(&descriptor)?;
        Ok(Arc::new(RenderPass::new(
            self.meta(ral_types::ResourceKind::RenderPass),
            descriptor,
            raw,
            Arc::clone(&self.device),
        )))
    }

    pub fn create_framebuffer(
        &self,
        render_pass: &RenderPass<B>,
        descriptor: FramebufferDescriptor<B>,
    ) -> Result<Res<Framebuffer<B>>, CreationError> {
        self.check_affinity(render_pass)?;
        for attachment in descriptor.color_attachments.iter().chain(descriptor.depth_stencil_attachment.iter()) {
            self.check_affinity(attachment.texture.as_ref())?;
        }
        let raw = self.device.create_framebuffer(render_pass.raw(), &descriptor)?;
        Ok(Arc::new(Framebuffer::new(
            self.meta(ral_types::ResourceKind::Framebuffer),
            descriptor,
            raw,
            Arc::clone(&self.device),
        )))
    }

    pub fn create_graphics_pipeline_state(
        &self,
        descriptor: GraphicsPipelineStateDescriptor<B>,
    ) -> Result<Res<GraphicsPipelineState<B>>, CreationError> {
        self.check_affinity(descriptor.program.as_ref())?;
        self.check_affinity(descriptor.root_signature.as_ref())?;
        self.check_affinity(descriptor.compatible_render_pass.as_ref())?;
        let raw = self.device.create_graphics_pipeline_state(&descriptor)?;
        Ok(Arc::new(GraphicsPipelineState::new(
            self.meta(ral_types::ResourceKind::GraphicsPipelineState),
            descriptor,
            raw,
            Arc::clone(&self.device),
        )))
    }

    pub fn create_compute_pipeline_state(
        &self,
        descriptor: ComputePipelineStateDescriptor<B>,
    ) -> Result<Res<ComputePipelineState<B>>, CreationError> {
        self.check_affinity(descriptor.compute_shader.as_ref())?;
        self.check_affinity(descriptor.root_signature.as_ref())?;
        let raw = self.device.create_compute_pipeline_state(&descriptor)?;
        Ok(Arc::new(ComputePipelineState::new(
            self.meta(ral_types::ResourceKind::ComputePipelineState),
            descriptor,
            raw,
            Arc::clone(&self.device),
        )))
    }

    pub fn create_swap_chain(
        &self,
        descriptor: SwapChainDescriptor<B>,
    ) -> Result<Res<SwapChain<B>>, CreationError> {
        self.check_affinity(descriptor.compatible_render_pass.as_ref())?;
        let (raw, width, height) = self
            .device
            .create_swap_chain(descriptor.compatible_render_pass.as_ref(), &descriptor)?;
        Ok(Arc::new(SwapChain::new(
            self.meta(ral_types::ResourceKind::SwapChain),
            descriptor.compatible_render_pass,
            raw,
            width,
            height,
            descriptor.vsync_interval,
            Arc::clone(&self.device),
        )))
    }

    /// Wraps a swap chain's currently acquired image as a [`Framebuffer`], so
    /// it can be bound with the ordinary
    /// [`crate::command_buffer::Command::SetGraphicsRenderTarget`] command
    /// instead of a separate "render to swap chain" command (spec.md §3.1,
    /// §4.5). Call after [`Self::acquire_next_image`] and before recording
    /// the draw commands that target it.
    pub fn swap_chain_framebuffer(&self, swap_chain: &SwapChain<B>, image_index: u32) -> Res<Framebuffer<B>> {
        let raw = self.device.swap_chain_framebuffer(swap_chain.raw(), image_index);
        let (width, height) = swap_chain.get_width_and_height();
        Arc::new(Framebuffer::from_swap_chain_image(
            self.meta(ral_types::ResourceKind::Framebuffer),
            width,
            height,
            raw,
            Arc::clone(&self.device),
        ))
    }

    /// Destroys and re-creates a swap chain's presentable images against its
    /// existing surface, keeping the same [`SwapChain`] handle (spec.md §4.6
    /// `resize_buffers`). Called automatically by [`Self::present`] and
    /// [`Self::acquire_next_image`] on `OUT_OF_DATE`/`SUBOPTIMAL`.
    pub fn resize_swap_chain(&self, swap_chain: &SwapChain<B>) -> Result<(u32, u32), SurfaceError> {
        let (width, height) = self.device.resize_swap_chain(swap_chain.raw())?;
        swap_chain.set_width_and_height(width, height);
        Ok((width, height))
    }

    // -- Mapping (spec.md §12, supplemented from `original_source/`) ----

    /// # Safety
    /// The returned pointer is valid only until the matching [`Self::unmap`]
    /// call, and only for `buffer.byte_size()` bytes.
    pub unsafe fn map(&self, buffer: &Buffer<B>, map_type: MapType) -> Result<*mut u8, DeviceError> {
        self.device.map_buffer(buffer.raw(), map_type)
    }

    /// # Safety
    /// Must be called exactly once for each successful [`Self::map`] call,
    /// with no outstanding pointers derived from it in use afterward.
    pub unsafe fn unmap(&self, buffer: &Buffer<B>) {
        self.device.unmap_buffer(buffer.raw());
    }

    // -- Recording / submission (spec.md §4.5) ---------------------------

    /// Opens a new recording session. CRITICAL programmer error (spec.md
    /// §4.5) to call while already recording; logged and a no-op recorder
    /// handed back rather than panicking.
    pub fn begin_scene(&self) -> CommandBufferRecorder<B> {
        if self.recording.swap(true, Ordering::AcqRel) {
            self.log_critical("begin_scene called while already recording");
        }
        CommandBufferRecorder::new()
    }

    /// Closes the recording session started by [`Self::begin_scene`] and
    /// returns the finished, submittable [`CommandBuffer`].
    pub fn end_scene(
        &self,
        recorder: CommandBufferRecorder<B>,
    ) -> Result<Res<CommandBuffer<B>>, &'static str> {
        self.recording.store(false, Ordering::Release);
        recorder.finish().map(Arc::new)
    }

    pub fn submit_command_buffer(&self, command_buffer: &CommandBuffer<B>) -> Result<(), DeviceError> {
        self.device.submit(command_buffer.commands())
    }

    /// Submits `command_buffer` without waiting for completion (spec.md §12
    /// `flush`, distinct from [`Self::finish`]'s blocking wait). On every
    /// backend here `submit` is already a non-blocking queue submission, so
    /// this is the same call under the name the original device interface
    /// uses for it.
    pub fn flush(&self, command_buffer: &CommandBuffer<B>) -> Result<(), DeviceError> {
        self.submit_command_buffer(command_buffer)
    }

    /// Blocks until all submitted work completes (spec.md §12 `finish`).
    pub fn finish(&self) -> Result<(), DeviceError> {
        self.device.wait_idle()
    }

    /// Submits the current frame and presents (spec.md §4.6 `present`).
    /// `OUT_OF_DATE`/`SUBOPTIMAL` is recovered automatically by recreating
    /// the swap chain (spec.md §4.8); any other error is propagated and the
    /// frame is considered dropped.
    pub fn present(&self, swap_chain: &SwapChain<B>) -> Result<(), SurfaceError> {
        match self.device.present(swap_chain.raw()) {
            Ok(()) => Ok(()),
            Err(SurfaceError::Outdated) => {
                self.resize_swap_chain(swap_chain)?;
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    /// Acquires the next presentable image index (spec.md §4.6, §4.7
    /// acquisition state machine). On `OUT_OF_DATE` the swap chain is
    /// recreated and acquisition retried once.
    pub fn acquire_next_image(&self, swap_chain: &SwapChain<B>) -> Result<u32, SurfaceError> {
        match self.device.acquire_next_image(swap_chain.raw()) {
            Ok(index) => Ok(index),
            Err(SurfaceError::Outdated) => {
                self.resize_swap_chain(swap_chain)?;
                self.device.acquire_next_image(swap_chain.raw())
            }
            Err(other) => Err(other),
        }
    }

    fn log_critical(&self, message: &str) {
        self.context.log(ral_types::Severity::Critical, file!(), line!(), message);
    }
}

/// spec.md §4.1: a conforming implementation built with `statistics` logs
/// CRITICAL if any resource is still alive when its owning `Renderer` is
/// torn down — an application holding a `Res<T>` past `Renderer` teardown
/// means the handle outlived the device it was created against.
#[cfg(feature = "statistics")]
impl<B: Backend> Drop for Renderer<B> {
    fn drop(&mut self) {
        let live = crate::statistics::live_count();
        if live > 0 {
            self.log_critical(&format!(
                "{live} resource(s) still alive at Renderer teardown: {:?}",
                crate::statistics::live_counts_by_kind()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    // `Renderer<B>` is generic over `Backend`; its factory/recording
    // behavior is covered end-to-end against the null backend's conformance
    // suite, which can construct a full `B::Device`.
}
