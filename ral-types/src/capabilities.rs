use crate::TextureFormat;

/// Immutable record of what the active backend supports, queried once at
/// device init and never mutated afterward (spec.md §3.1 "Capabilities").
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub device_name: String,
    pub preferred_swap_chain_color_format: TextureFormat,
    pub preferred_swap_chain_depth_format: TextureFormat,
    pub max_viewports: u32,
    pub max_simultaneous_render_targets: u32,
    pub max_texture_dimension: u32,
    pub max_2d_texture_array_slices: u32,
    pub max_uniform_buffer_bytes: u32,
    pub max_texture_buffer_texels: u32,
    pub max_indirect_buffer_bytes: u32,
    pub max_multisamples: u8,
    pub max_anisotropy: f32,
    pub upper_left_origin: bool,
    pub zero_to_one_clip_z: bool,
    pub individual_uniforms: bool,
    pub instanced_arrays: bool,
    pub draw_instanced: bool,
    pub base_vertex: bool,
    pub native_multi_threading: bool,
    pub shader_bytecode_supported: bool,
    pub vertex_shader_supported: bool,
    pub tessellation_control_shader_supported: bool,
    pub tessellation_evaluation_shader_supported: bool,
    pub geometry_shader_supported: bool,
    pub fragment_shader_supported: bool,
    pub compute_shader_supported: bool,
    pub max_patch_vertices: u32,
    pub max_gs_output_vertices: u32,
}

impl Capabilities {
    /// Sanity-checks the invariants spec.md §3.1 documents as load-bearing:
    /// `maxSimultaneousRenderTargets <= 8` and `maxMultisamples` a power of
    /// two `<= 8`. Backends should call this once after populating their
    /// `Capabilities` and treat a failure as a construction bug, not a
    /// runtime error.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_simultaneous_render_targets as usize > crate::MAX_SIMULTANEOUS_RENDER_TARGETS {
            return Err("maxSimultaneousRenderTargets exceeds 8");
        }
        if self.max_multisamples > 8 || !self.max_multisamples.is_power_of_two() {
            return Err("maxMultisamples must be a power of two <= 8");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Capabilities {
        Capabilities {
            device_name: "test".into(),
            preferred_swap_chain_color_format: TextureFormat::R8G8B8A8,
            preferred_swap_chain_depth_format: TextureFormat::D32Float,
            max_viewports: 16,
            max_simultaneous_render_targets: 8,
            max_texture_dimension: 16384,
            max_2d_texture_array_slices: 2048,
            max_uniform_buffer_bytes: 65536,
            max_texture_buffer_texels: 1 << 27,
            max_indirect_buffer_bytes: 1 << 20,
            max_multisamples: 8,
            max_anisotropy: 16.0,
            upper_left_origin: true,
            zero_to_one_clip_z: true,
            individual_uniforms: false,
            instanced_arrays: true,
            draw_instanced: true,
            base_vertex: true,
            native_multi_threading: false,
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

    #[test]
    fn rejects_too_many_render_targets() {
        let mut caps = sample();
        caps.max_simultaneous_render_targets = 9;
        assert!(caps.validate().is_err());
    }

    #[test]
    fn rejects_non_power_of_two_multisamples() {
        let mut caps = sample();
        caps.max_multisamples = 6;
        assert!(caps.validate().is_err());
    }

    #[test]
    fn accepts_sane_capabilities() {
        assert!(sample().validate().is_ok());
    }
}
