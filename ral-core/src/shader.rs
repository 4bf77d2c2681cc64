use crate::backend::{Backend, DeviceBackend};
use crate::resource::{Res, Resource, ResourceMeta};
use ral_types::ResourceKind;
use std::sync::Arc;

/// One pipeline stage (spec.md §3.1 "Shader").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessellationControl,
    TessellationEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    pub const fn resource_kind(self) -> ResourceKind {
        match self {
            Self::Vertex => ResourceKind::VertexShader,
            Self::TessellationControl => ResourceKind::TessellationControlShader,
            Self::TessellationEvaluation => ResourceKind::TessellationEvaluationShader,
            Self::Geometry => ResourceKind::GeometryShader,
            Self::Fragment => ResourceKind::FragmentShader,
            Self::Compute => ResourceKind::ComputeShader,
        }
    }
}

/// How a shader module's contents were supplied (spec.md §6.3).
#[derive(Debug, Clone)]
pub enum ShaderSource {
    /// Compact (SMOL-V-like) encoded SPIR-V, decoded by the backend before
    /// `vkCreateShaderModule` (spec.md §6.3).
    Bytecode(Vec<u8>),
    /// GLSL source, compiled on the fly. Only accepted when the backend was
    /// built with the `glsl-to-spirv` feature (spec.md §6.5
    /// `VULKAN_GLSLTOSPIRV`); otherwise a backend returns
    /// [`crate::CreationError::MissingCapability`].
    Glsl { source: String, entry_point: String },
}

/// A single compiled shader-stage module (spec.md §3.1 "Shader").
///
/// Carries the "shader language name" tag spec.md requires for linkage
/// validation (e.g. `"GLSL"`); two stages with different tags cannot be
/// combined into one [`GraphicsProgram`].
#[derive(Debug)]
pub struct ShaderModule<B: Backend> {
    meta: ResourceMeta,
    pub stage: ShaderStage,
    pub language_name: &'static str,
    pub(crate) raw: Option<B::ShaderModule>,
    device: Arc<B::Device>,
}

impl<B: Backend> ShaderModule<B> {
    pub fn new(
        meta: ResourceMeta,
        stage: ShaderStage,
        language_name: &'static str,
        raw: B::ShaderModule,
        device: Arc<B::Device>,
    ) -> Self {
        Self { meta, stage, language_name, raw: Some(raw), device }
    }

    pub fn raw(&self) -> &B::ShaderModule {
        self.raw.as_ref().expect("ShaderModule accessed after destruction")
    }
}

impl<B: Backend> Resource for ShaderModule<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for ShaderModule<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_shader_module(raw);
        }
    }
}

/// A bundle of compatible shader stages (spec.md §3.1 "GraphicsProgram"):
/// VS required, optional TCS+TES pair, optional GS, FS. Holds strong
/// references to each stage (owning edge of the resource DAG, spec.md §4.1).
#[derive(Debug)]
pub struct GraphicsProgram<B: Backend> {
    meta: ResourceMeta,
    pub vertex_shader: Res<ShaderModule<B>>,
    pub tessellation_control_shader: Option<Res<ShaderModule<B>>>,
    pub tessellation_evaluation_shader: Option<Res<ShaderModule<B>>>,
    pub geometry_shader: Option<Res<ShaderModule<B>>>,
    pub fragment_shader: Option<Res<ShaderModule<B>>>,
}

impl<B: Backend> GraphicsProgram<B> {
    /// Validates the linkage rule from spec.md §3.1: all present stages
    /// must share the same shader-language tag, and a TCS/TES pair must be
    /// supplied together or not at all.
    pub fn validate(
        vertex_shader: &ShaderModule<B>,
        tessellation_control_shader: Option<&ShaderModule<B>>,
        tessellation_evaluation_shader: Option<&ShaderModule<B>>,
        geometry_shader: Option<&ShaderModule<B>>,
        fragment_shader: Option<&ShaderModule<B>>,
    ) -> Result<(), &'static str> {
        if tessellation_control_shader.is_some() != tessellation_evaluation_shader.is_some() {
            return Err("tessellation control and evaluation shaders must be supplied together");
        }
        let language = vertex_shader.language_name;
        let stages = [
            tessellation_control_shader,
            tessellation_evaluation_shader,
            geometry_shader,
            fragment_shader,
        ];
        if stages.into_iter().flatten().any(|s| s.language_name != language) {
            return Err("all shader stages in a program must share the same shader-language tag");
        }
        Ok(())
    }

    pub fn new(
        meta: ResourceMeta,
        vertex_shader: Res<ShaderModule<B>>,
        tessellation_control_shader: Option<Res<ShaderModule<B>>>,
        tessellation_evaluation_shader: Option<Res<ShaderModule<B>>>,
        geometry_shader: Option<Res<ShaderModule<B>>>,
        fragment_shader: Option<Res<ShaderModule<B>>>,
    ) -> Self {
        Self {
            meta,
            vertex_shader,
            tessellation_control_shader,
            tessellation_evaluation_shader,
            geometry_shader,
            fragment_shader,
        }
    }
}

impl<B: Backend> Resource for GraphicsProgram<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

/// The active backend's shader dialect, queryable per spec.md §12
/// (`IShaderLanguage`, supplemented from `original_source/`).
pub trait ShaderLanguage {
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Linkage validation is exercised against concrete `ShaderModule<B>`
    // values in the null-backend integration tests, since constructing one
    // here would require a `Backend` impl. The pure-data rule (language-tag
    // mismatch, lone TCS) is covered there.
}
