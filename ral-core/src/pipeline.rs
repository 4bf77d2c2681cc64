use crate::backend::{Backend, DeviceBackend};
use crate::resource::{Res, Resource, ResourceMeta};
use crate::render_pass::RenderPass;
use crate::root_signature::RootSignature;
use crate::shader::{GraphicsProgram, ShaderModule};
use ral_types::{BlendFactor, BlendOp, CompareFunction, CullMode, FillMode, FrontFace, PrimitiveTopology};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct RasterizerState {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub depth_bias: i32,
    pub depth_bias_clamp: f32,
    pub slope_scaled_depth_bias: f32,
    pub depth_clip_enable: bool,
    pub multisample_enable: bool,
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::Back,
            front_face: FrontFace::Clockwise,
            depth_bias: 0,
            depth_bias_clamp: 0.0,
            slope_scaled_depth_bias: 0.0,
            depth_clip_enable: true,
            multisample_enable: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StencilOpState {
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub compare: CompareFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

#[derive(Debug, Clone, Copy)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare: CompareFunction,
    pub stencil_test_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub front_face_stencil: StencilOpState,
    pub back_face_stencil: StencilOpState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        let no_op = StencilOpState {
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            compare: CompareFunction::Always,
        };
        Self {
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare: CompareFunction::Less,
            stencil_test_enable: false,
            stencil_read_mask: 0xff,
            stencil_write_mask: 0xff,
            front_face_stencil: no_op,
            back_face_stencil: no_op,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderTargetBlendState {
    pub blend_enable: bool,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub color_op: BlendOp,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub alpha_op: BlendOp,
    pub write_mask: u8,
}

impl Default for RenderTargetBlendState {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_color: BlendFactor::One,
            dst_color: BlendFactor::Zero,
            color_op: BlendOp::Add,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            alpha_op: BlendOp::Add,
            write_mask: 0b1111,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlendState {
    pub alpha_to_coverage_enable: bool,
    pub independent_blend_enable: bool,
    pub render_targets: Vec<RenderTargetBlendState>,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            alpha_to_coverage_enable: false,
            independent_blend_enable: false,
            render_targets: vec![RenderTargetBlendState::default()],
        }
    }
}

/// Backend-agnostic description of an immutable [`GraphicsPipelineState`]
/// object (spec.md §3.1, §4.5): the full fixed-function state plus the
/// shader program, root signature, and compatible render pass it was baked
/// against. Nothing here is mutable post-creation, matching the
/// pipeline/render-pass immutability spec.md requires throughout.
#[derive(Debug, Clone)]
pub struct GraphicsPipelineStateDescriptor<B: Backend> {
    pub program: Res<GraphicsProgram<B>>,
    pub root_signature: Res<RootSignature<B>>,
    pub compatible_render_pass: Res<RenderPass<B>>,
    pub primitive_topology: PrimitiveTopology,
    pub rasterizer_state: RasterizerState,
    pub depth_stencil_state: DepthStencilState,
    pub blend_state: BlendState,
}

#[derive(Debug)]
pub struct GraphicsPipelineState<B: Backend> {
    meta: ResourceMeta,
    pub descriptor: GraphicsPipelineStateDescriptor<B>,
    pub(crate) raw: Option<B::GraphicsPipeline>,
    device: Arc<B::Device>,
}

impl<B: Backend> GraphicsPipelineState<B> {
    pub fn new(
        meta: ResourceMeta,
        descriptor: GraphicsPipelineStateDescriptor<B>,
        raw: B::GraphicsPipeline,
        device: Arc<B::Device>,
    ) -> Self {
        Self { meta, descriptor, raw: Some(raw), device }
    }

    pub fn raw(&self) -> &B::GraphicsPipeline {
        self.raw.as_ref().expect("GraphicsPipelineState accessed after destruction")
    }
}

impl<B: Backend> Resource for GraphicsPipelineState<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for GraphicsPipelineState<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_graphics_pipeline_state(raw);
        }
    }
}

/// Backend-agnostic description of an immutable [`ComputePipelineState`]
/// object (spec.md §3.1): a single compute shader plus root signature.
#[derive(Debug, Clone)]
pub struct ComputePipelineStateDescriptor<B: Backend> {
    pub compute_shader: Res<ShaderModule<B>>,
    pub root_signature: Res<RootSignature<B>>,
}

#[derive(Debug)]
pub struct ComputePipelineState<B: Backend> {
    meta: ResourceMeta,
    pub descriptor: ComputePipelineStateDescriptor<B>,
    pub(crate) raw: Option<B::ComputePipeline>,
    device: Arc<B::Device>,
}

impl<B: Backend> ComputePipelineState<B> {
    pub fn new(
        meta: ResourceMeta,
        descriptor: ComputePipelineStateDescriptor<B>,
        raw: B::ComputePipeline,
        device: Arc<B::Device>,
    ) -> Self {
        Self { meta, descriptor, raw: Some(raw), device }
    }

    pub fn raw(&self) -> &B::ComputePipeline {
        self.raw.as_ref().expect("ComputePipelineState accessed after destruction")
    }
}

impl<B: Backend> Resource for ComputePipelineState<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for ComputePipelineState<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_compute_pipeline_state(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasterizer_default_culls_back_faces_clockwise_front() {
        let r = RasterizerState::default();
        assert_eq!(r.cull_mode, CullMode::Back);
        assert_eq!(r.front_face, FrontFace::Clockwise);
    }

    #[test]
    fn depth_stencil_default_enables_depth_test_less() {
        let d = DepthStencilState::default();
        assert!(d.depth_test_enable);
        assert_eq!(d.depth_compare, CompareFunction::Less);
        assert!(!d.stencil_test_enable);
    }

    #[test]
    fn blend_default_is_opaque_replace() {
        let b = BlendState::default();
        assert!(!b.render_targets[0].blend_enable);
        assert_eq!(b.render_targets[0].write_mask, 0b1111);
    }
}
