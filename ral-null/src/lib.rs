//! A conformance backend that performs no GPU work at all (grounded on
//! `NullRenderer.cpp`'s role as an always-available software/no-op backend
//! for headless testing and compliance suites). Every `create_*` call
//! succeeds and hands back a unique opaque handle; every dispatch call is a
//! no-op. This lets application code and `ral-core`'s own logic be exercised
//! without a GPU, a windowing system, or validation layers at all.
#![warn(trivial_casts, trivial_numeric_casts, unused_extern_crates)]

use ral_core::backend::{Backend, DeviceBackend};
use ral_core::buffer::BufferDescriptor;
use ral_core::command_buffer::Command;
use ral_core::error::{CreationError, DeviceError, SurfaceError};
use ral_core::framebuffer::FramebufferDescriptor;
use ral_core::pipeline::{ComputePipelineStateDescriptor, GraphicsPipelineStateDescriptor};
use ral_core::render_pass::{RenderPass, RenderPassDescriptor};
use ral_core::resource_group::{ResourceGroupDescriptor, ResourceGroupLayout};
use ral_core::root_signature::RootSignatureDescriptor;
use ral_core::sampler::SamplerDescriptor;
use ral_core::shader::{ShaderSource, ShaderStage};
use ral_core::swap_chain::SwapChainDescriptor;
use ral_core::texture::TextureDescriptor;
use ral_core::vertex_array::VertexArrayDescriptor;
use ral_types::{Capabilities, MapType};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A unique, otherwise-meaningless handle. Every null-backend object type
/// wraps one, so their `Debug` output still lets tests tell two objects of
/// the same kind apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NullHandle(u64);

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

impl NullHandle {
    fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Backing storage for a mapped [`NullHandle`] buffer (spec.md §12
/// `map`/`unmap`), so `map_buffer` can hand back a real, dereferenceable
/// pointer instead of a dangling one.
#[derive(Debug)]
struct MappedAllocation {
    bytes: Box<[u8]>,
}

#[derive(Debug)]
pub struct NullBackend;

impl Backend for NullBackend {
    type Buffer = NullHandle;
    type Texture = NullHandle;
    type TextureView = NullHandle;
    type Sampler = NullHandle;
    type ShaderModule = NullHandle;
    type RootSignature = NullHandle;
    type ResourceGroup = NullHandle;
    type VertexArray = NullHandle;
    type RenderPass = NullHandle;
    type Framebuffer = NullHandle;
    type GraphicsPipeline = NullHandle;
    type ComputePipeline = NullHandle;
    type SwapChain = NullHandle;
    type CommandBuffer = NullHandle;
    type Device = NullDevice;
}

/// The null device: tracks live buffer allocations (so `map`/`unmap` work)
/// and otherwise just mints handles.
#[derive(Debug, Default)]
pub struct NullDevice {
    allocations: Mutex<std::collections::HashMap<u64, MappedAllocation>>,
    /// Width/height handed back on creation, so `resize_swap_chain` has
    /// something plausible to report without a real OS window to query.
    swap_chains: Mutex<std::collections::HashMap<u64, (u32, u32)>>,
}

impl NullDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capabilities advertised by the null backend: generous limits so
    /// application-level validation never fails against it (spec.md §3.1
    /// "Capabilities" describes these as backend-reported, not fixed).
    pub fn capabilities() -> Capabilities {
        Capabilities {
            device_name: "RAL null backend".to_string(),
            preferred_swap_chain_color_format: ral_types::TextureFormat::R8G8B8A8,
            preferred_swap_chain_depth_format: ral_types::TextureFormat::D32Float,
            max_viewports: 16,
            max_simultaneous_render_targets: ral_types::MAX_SIMULTANEOUS_RENDER_TARGETS as u32,
            max_texture_dimension: 16384,
            max_2d_texture_array_slices: 2048,
            max_uniform_buffer_bytes: 65536,
            max_texture_buffer_texels: 1 << 27,
            max_indirect_buffer_bytes: 1 << 20,
            max_multisamples: 8,
            max_anisotropy: 16.0,
            upper_left_origin: true,
            zero_to_one_clip_z: true,
            individual_uniforms: true,
            instanced_arrays: true,
            draw_instanced: true,
            base_vertex: true,
            native_multi_threading: true,
            shader_bytecode_supported: true,
            vertex_shader_supported: true,
            tessellation_control_shader_supported: true,
            tessellation_evaluation_shader_supported: true,
            geometry_shader_supported: true,
            fragment_shader_supported: true,
            compute_shader_supported: true,
            max_patch_vertices: 32,
            max_gs_output_vertices: 1024,
        }
    }
}

impl DeviceBackend<NullBackend> for NullDevice {
    fn create_buffer(&self, _descriptor: &BufferDescriptor, _initial_data: Option<&[u8]>) -> Result<NullHandle, CreationError> {
        let handle = NullHandle::next();
        let size = _descriptor.byte_size as usize;
        self.allocations
            .lock()
            .unwrap()
            .insert(handle.0, MappedAllocation { bytes: vec![0u8; size].into_boxed_slice() });
        Ok(handle)
    }

    fn destroy_buffer(&self, buffer: NullHandle) {
        self.allocations.lock().unwrap().remove(&buffer.0);
    }

    unsafe fn map_buffer(&self, buffer: &NullHandle, _map_type: MapType) -> Result<*mut u8, DeviceError> {
        let mut allocations = self.allocations.lock().unwrap();
        let allocation = allocations
            .get_mut(&buffer.0)
            .ok_or(DeviceError::Unsupported("map_buffer called on an unknown buffer"))?;
        Ok(allocation.bytes.as_mut_ptr())
    }

    unsafe fn unmap_buffer(&self, _buffer: &NullHandle) {}

    fn create_texture(
        &self,
        _descriptor: &TextureDescriptor,
        _initial_data: Option<&[u8]>,
    ) -> Result<(NullHandle, Option<NullHandle>), CreationError> {
        Ok((NullHandle::next(), Some(NullHandle::next())))
    }

    fn destroy_texture(&self, _texture: NullHandle, _view: Option<NullHandle>) {}

    fn create_sampler(&self, _descriptor: &SamplerDescriptor) -> Result<NullHandle, CreationError> {
        Ok(NullHandle::next())
    }

    fn destroy_sampler(&self, _sampler: NullHandle) {}

    fn create_shader_module(&self, _stage: ShaderStage, source: &ShaderSource) -> Result<NullHandle, CreationError> {
        if let ShaderSource::Bytecode(bytes) = source {
            if bytes.is_empty() {
                return Err(CreationError::InvalidArgument("empty shader bytecode"));
            }
        }
        Ok(NullHandle::next())
    }

    fn destroy_shader_module(&self, _module: NullHandle) {}

    fn shader_language_name(&self) -> &'static str {
        "NULL"
    }

    fn create_root_signature(&self, descriptor: &RootSignatureDescriptor) -> Result<NullHandle, CreationError> {
        descriptor.validate().map_err(CreationError::InvalidArgument)?;
        Ok(NullHandle::next())
    }

    fn destroy_root_signature(&self, _root_signature: NullHandle) {}

    fn create_resource_group(
        &self,
        _layout: &ResourceGroupLayout,
        _descriptor: &ResourceGroupDescriptor<NullBackend>,
    ) -> Result<NullHandle, CreationError> {
        Ok(NullHandle::next())
    }

    fn destroy_resource_group(&self, _group: NullHandle) {}

    fn create_vertex_array(&self, _descriptor: &VertexArrayDescriptor<NullBackend>) -> Result<NullHandle, CreationError> {
        Ok(NullHandle::next())
    }

    fn destroy_vertex_array(&self, _vertex_array: NullHandle) {}

    fn create_render_pass(&self, descriptor: &RenderPassDescriptor) -> Result<NullHandle, CreationError> {
        descriptor.validate().map_err(CreationError::InvalidArgument)?;
        Ok(NullHandle::next())
    }

    fn destroy_render_pass(&self, _render_pass: NullHandle) {}

    fn create_framebuffer(
        &self,
        _render_pass: &NullHandle,
        _descriptor: &FramebufferDescriptor<NullBackend>,
    ) -> Result<NullHandle, CreationError> {
        Ok(NullHandle::next())
    }

    fn destroy_framebuffer(&self, _framebuffer: NullHandle) {}

    fn create_graphics_pipeline_state(
        &self,
        _descriptor: &GraphicsPipelineStateDescriptor<NullBackend>,
    ) -> Result<NullHandle, CreationError> {
        Ok(NullHandle::next())
    }

    fn destroy_graphics_pipeline_state(&self, _pipeline: NullHandle) {}

    fn create_compute_pipeline_state(
        &self,
        _descriptor: &ComputePipelineStateDescriptor<NullBackend>,
    ) -> Result<NullHandle, CreationError> {
        Ok(NullHandle::next())
    }

    fn destroy_compute_pipeline_state(&self, _pipeline: NullHandle) {}

    fn submit(&self, _commands: &[Command<NullBackend>]) -> Result<(), DeviceError> {
        Ok(())
    }

    fn wait_idle(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// No native window to query, so this just mints a handle and reports
    /// back a plausible default extent (spec.md §3.1 "SwapChain" leaves the
    /// initial extent to the backend's discovery of the OS window).
    fn create_swap_chain(
        &self,
        _render_pass: &RenderPass<NullBackend>,
        _descriptor: &SwapChainDescriptor<NullBackend>,
    ) -> Result<(NullHandle, u32, u32), CreationError> {
        let handle = NullHandle::next();
        let (width, height) = (640, 480);
        self.swap_chains.lock().unwrap().insert(handle.0, (width, height));
        Ok((handle, width, height))
    }

    fn destroy_swap_chain(&self, swap_chain: NullHandle) {
        self.swap_chains.lock().unwrap().remove(&swap_chain.0);
    }

    fn resize_swap_chain(&self, swap_chain: &NullHandle) -> Result<(u32, u32), SurfaceError> {
        let swap_chains = self.swap_chains.lock().unwrap();
        let (width, height) = swap_chains
            .get(&swap_chain.0)
            .copied()
            .ok_or(SurfaceError::Lost)?;
        Ok((width, height))
    }

    fn present(&self, _swap_chain: &NullHandle) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn acquire_next_image(&self, _swap_chain: &NullHandle) -> Result<u32, SurfaceError> {
        Ok(0)
    }

    fn swap_chain_framebuffer(&self, _swap_chain: &NullHandle, _image_index: u32) -> NullHandle {
        NullHandle::next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ral_core::renderer::{Renderer, RendererDescriptor};
    use ral_types::{BufferFlags, BufferUsage};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestContext;

    impl ral_core::Context for TestContext {
        fn log(&self, severity: ral_types::Severity, _file: &str, _line: u32, message: &str) -> bool {
            log::log!(severity.to_log_level(), "{message}");
            false
        }

        unsafe fn allocate(&self, _ptr: *mut u8, _old: usize, _new: usize, _align: usize) -> *mut u8 {
            std::ptr::null_mut()
        }

        fn native_window_handle(&self) -> ral_core::NativeWindowHandle {
            0
        }
    }

    fn renderer() -> Renderer<NullBackend> {
        Renderer::new(
            RendererDescriptor::default(),
            Arc::new(TestContext),
            NullDevice::new(),
            NullDevice::capabilities(),
        )
    }

    #[test]
    fn create_buffer_then_map_round_trips_bytes() {
        let renderer = renderer();
        let descriptor = ral_core::BufferDescriptor {
            kind: ral_core::BufferKind::Vertex,
            byte_size: 64,
            flags: BufferFlags::empty(),
            usage: BufferUsage::StaticDraw,
            texel_format: None,
            element_stride: None,
        };
        let buffer = renderer.create_buffer(descriptor, None).unwrap();
        unsafe {
            let ptr = renderer.map(&buffer, MapType::WRITE).unwrap();
            *ptr = 0xAB;
            renderer.unmap(&buffer);
            let ptr = renderer.map(&buffer, MapType::READ).unwrap();
            assert_eq!(*ptr, 0xAB);
            renderer.unmap(&buffer);
        }
    }

    #[test]
    fn empty_bytecode_is_rejected() {
        let renderer = renderer();
        let result = renderer.create_shader_module(ShaderStage::Vertex, ShaderSource::Bytecode(Vec::new()));
        assert!(result.is_err());
    }

    #[test]
    fn begin_scene_then_end_scene_produces_empty_command_buffer() {
        let renderer = renderer();
        let recorder = renderer.begin_scene();
        let command_buffer = renderer.end_scene(recorder).unwrap();
        assert!(command_buffer.commands().is_empty());
        renderer.submit_command_buffer(&command_buffer).unwrap();
        renderer.finish().unwrap();
    }

    #[test]
    fn unbalanced_debug_event_nesting_is_rejected() {
        let renderer = renderer();
        let mut recorder = renderer.begin_scene();
        recorder.push(Command::BeginDebugEvent("frame".to_string()));
        assert!(renderer.end_scene(recorder).is_err());
    }

    #[test]
    fn emulated_draw_indexed_source_reports_packet_count_as_draw_count() {
        use ral_core::command_buffer::DrawIndexedSource;
        use ral_types::DrawIndexedArguments;

        let single = DrawIndexedSource::<NullBackend>::Emulated(vec![DrawIndexedArguments {
            index_count_per_instance: 3,
            instance_count: 1,
            start_index_location: 0,
            base_vertex_location: 0,
            start_instance_location: 0,
        }]);
        assert_eq!(single.draw_count(), 1);

        let triple = DrawIndexedSource::<NullBackend>::Emulated(vec![
            DrawIndexedArguments::default(),
            DrawIndexedArguments::default(),
            DrawIndexedArguments::default(),
        ]);
        assert_eq!(triple.draw_count(), 3);
    }

    #[test]
    fn indirect_draw_source_reports_configured_draw_count() {
        use ral_core::command_buffer::DrawSource;

        let renderer = renderer();
        let descriptor = ral_core::BufferDescriptor {
            kind: ral_core::BufferKind::Indirect,
            byte_size: std::mem::size_of::<ral_types::DrawArguments>() as u32 * 4,
            flags: BufferFlags::DRAW_ARGUMENTS,
            usage: BufferUsage::StaticDraw,
            texel_format: None,
            element_stride: None,
        };
        let buffer = renderer.create_buffer(descriptor, None).unwrap();
        let source = DrawSource::Indirect { buffer, offset: 0, draw_count: 4 };
        assert_eq!(source.draw_count(), 4);
    }

    #[test]
    fn binding_a_resource_from_another_renderer_is_rejected() {
        let a = renderer();
        let b = renderer();
        let descriptor = ral_core::BufferDescriptor {
            kind: ral_core::BufferKind::Vertex,
            byte_size: 64,
            flags: BufferFlags::empty(),
            usage: BufferUsage::StaticDraw,
            texel_format: None,
            element_stride: None,
        };
        let buffer_from_a = a.create_buffer(descriptor, None).unwrap();

        let result = b.create_vertex_array(ral_core::VertexArrayDescriptor {
            vertex_buffers: vec![ral_core::VertexArrayVertexBuffer {
                buffer: buffer_from_a,
                stride: 12,
                instance_step_rate: None,
                attributes: vec![],
            }],
            index_buffer: None,
        });
        assert!(result.is_err(), "binding renderer A's buffer into renderer B's vertex array must fail");
    }

    #[test]
    fn framebuffer_extent_is_the_minimum_over_all_attachments() {
        let renderer = renderer();
        let big = renderer
            .create_texture(
                ral_core::TextureDescriptor {
                    kind: ral_core::TextureKind::Texture2D,
                    width: 256,
                    height: 256,
                    depth_or_slices: 1,
                    format: ral_types::TextureFormat::R8G8B8A8,
                    flags: ral_types::TextureFlags::RENDER_TARGET,
                    usage: ral_types::TextureUsage::Default,
                    multisample_count: 1,
                    clear_value: None,
                },
                None,
            )
            .unwrap();
        let small = renderer
            .create_texture(
                ral_core::TextureDescriptor {
                    kind: ral_core::TextureKind::Texture2D,
                    width: 64,
                    height: 128,
                    depth_or_slices: 1,
                    format: ral_types::TextureFormat::D32Float,
                    flags: ral_types::TextureFlags::RENDER_TARGET,
                    usage: ral_types::TextureUsage::Default,
                    multisample_count: 1,
                    clear_value: None,
                },
                None,
            )
            .unwrap();

        let render_pass = renderer
            .create_render_pass(ral_core::RenderPassDescriptor {
                color_attachments: vec![ral_core::ColorAttachmentDescriptor {
                    format: ral_types::TextureFormat::R8G8B8A8,
                    load_op: ral_core::LoadOp::Clear,
                    store_op: ral_core::StoreOp::Store,
                    samples: 1,
                }],
                depth_stencil_attachment: Some(ral_core::DepthStencilAttachmentDescriptor {
                    format: ral_types::TextureFormat::D32Float,
                    depth_load_op: ral_core::LoadOp::Clear,
                    depth_store_op: ral_core::StoreOp::DontCare,
                    stencil_load_op: ral_core::LoadOp::DontCare,
                    stencil_store_op: ral_core::StoreOp::DontCare,
                    samples: 1,
                }),
            })
            .unwrap();

        let framebuffer = renderer
            .create_framebuffer(
                &render_pass,
                ral_core::FramebufferDescriptor {
                    color_attachments: vec![ral_core::FramebufferAttachment { texture: big, mip_level: 0 }],
                    depth_stencil_attachment: Some(ral_core::FramebufferAttachment { texture: small, mip_level: 0 }),
                },
            )
            .unwrap();

        // min(256, 64) x min(256, 128), not the first attachment's 256x256.
        assert_eq!(framebuffer.get_width_and_height(), (64, 128));
    }

    #[test]
    fn swap_chain_create_present_resize_round_trips() {
        let renderer = renderer();
        let render_pass = renderer
            .create_render_pass(ral_core::RenderPassDescriptor {
                color_attachments: vec![ral_core::ColorAttachmentDescriptor {
                    format: ral_types::TextureFormat::R8G8B8A8,
                    load_op: ral_core::LoadOp::Clear,
                    store_op: ral_core::StoreOp::Store,
                    samples: 1,
                }],
                depth_stencil_attachment: None,
            })
            .unwrap();

        let swap_chain = renderer
            .create_swap_chain(ral_core::SwapChainDescriptor {
                compatible_render_pass: render_pass,
                native_window_handle: 0,
                vsync_interval: 1,
            })
            .unwrap();
        assert_eq!(swap_chain.get_width_and_height(), (640, 480));

        let index = renderer.acquire_next_image(&swap_chain).unwrap();
        assert_eq!(index, 0);
        renderer.present(&swap_chain).unwrap();

        let (width, height) = renderer.resize_swap_chain(&swap_chain).unwrap();
        assert_eq!((width, height), (640, 480));
        assert_eq!(swap_chain.get_width_and_height(), (640, 480));
    }
}
