use crate::backend::{Backend, DeviceBackend};
use crate::resource::{Resource, ResourceMeta};
use ral_types::{ResourceKind, TextureFlags, TextureFormat, TextureUsage};
use std::sync::Arc;

/// Which of the five texture shapes spec.md §3.1 distinguishes. Mirrors
/// [`crate::buffer::BufferKind`]'s rationale: one generic [`Texture`] struct,
/// dimension-tagged, rather than five distinct types — the same collapse the
/// teacher's own `wgpu_types::TextureDimension` performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture1D,
    Texture2D,
    Texture2DArray,
    Texture3D,
    /// Materially a 2D array of 6 layers (spec.md §3.1).
    TextureCube,
}

impl TextureKind {
    pub const fn resource_kind(self) -> ResourceKind {
        match self {
            Self::Texture1D => ResourceKind::Texture1D,
            Self::Texture2D => ResourceKind::Texture2D,
            Self::Texture2DArray => ResourceKind::Texture2DArray,
            Self::Texture3D => ResourceKind::Texture3D,
            Self::TextureCube => ResourceKind::TextureCube,
        }
    }

    pub const fn array_layers(self, requested_slices: u32) -> u32 {
        match self {
            Self::TextureCube => 6,
            Self::Texture2DArray => requested_slices,
            _ => 1,
        }
    }
}

/// Clear value recorded at texture-creation time so the backend can create
/// the image with an optimized clear layout (spec.md §3.1).
#[derive(Debug, Clone, Copy)]
pub enum OptimizedTextureClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

/// Backend-agnostic description of a texture (spec.md §3.1 "Textures").
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    /// Depth (Texture3D) or slice count (Texture2DArray); ignored otherwise.
    pub depth_or_slices: u32,
    pub format: TextureFormat,
    pub flags: TextureFlags,
    pub usage: TextureUsage,
    /// 2D only; 1 for all other kinds.
    pub multisample_count: u8,
    pub clear_value: Option<OptimizedTextureClearValue>,
}

impl TextureDescriptor {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.flags.contains(TextureFlags::RENDER_TARGET)
            && self.flags.contains(TextureFlags::DATA_CONTAINS_MIPMAPS)
        {
            // RENDER_TARGET implies no initial data is supplied at all, so this
            // is only reachable if a caller sets flags inconsistently with the
            // data they pass to create_texture*; checked again there against
            // the actual `Option<&[u8]>`.
        }
        if self.flags.contains(TextureFlags::DATA_CONTAINS_MIPMAPS)
            && self.flags.contains(TextureFlags::GENERATE_MIPMAPS)
        {
            return Err("DATA_CONTAINS_MIPMAPS and GENERATE_MIPMAPS are mutually exclusive");
        }
        if self.kind != TextureKind::Texture2D && self.multisample_count > 1 {
            return Err("multisampling is only supported for Texture2D");
        }
        Ok(())
    }

    /// RENDER_TARGET and non-null initial data are mutually exclusive
    /// (spec.md §3.1). Checked against the actual data pointer passed to
    /// `create_texture*`, not just the flags, since the invariant is about
    /// their combination.
    pub fn validate_initial_data(&self, has_initial_data: bool) -> Result<(), &'static str> {
        if has_initial_data && self.flags.contains(TextureFlags::RENDER_TARGET) {
            return Err("RENDER_TARGET textures must not be created with initial data");
        }
        Ok(())
    }

    /// Number of mip levels: 1 unless a mipmap flag is set, else
    /// `floor(log2(max(w, h))) + 1` (spec.md §4.3).
    pub fn mip_level_count(&self) -> u32 {
        let has_mips = self.flags.intersects(TextureFlags::DATA_CONTAINS_MIPMAPS | TextureFlags::GENERATE_MIPMAPS);
        if !has_mips {
            1
        } else {
            let max_dim = self.width.max(self.height).max(1);
            32 - max_dim.leading_zeros()
        }
    }

    pub fn array_layer_count(&self) -> u32 {
        self.kind.array_layers(self.depth_or_slices)
    }
}

/// A texture resource bound to a concrete backend image + optional view
/// (spec.md §3.1, §4.3).
#[derive(Debug)]
pub struct Texture<B: Backend> {
    meta: ResourceMeta,
    pub descriptor: TextureDescriptor,
    pub(crate) raw: Option<B::Texture>,
    pub(crate) view: Option<B::TextureView>,
    device: Arc<B::Device>,
}

impl<B: Backend> Texture<B> {
    pub fn new(
        meta: ResourceMeta,
        descriptor: TextureDescriptor,
        raw: B::Texture,
        view: Option<B::TextureView>,
        device: Arc<B::Device>,
    ) -> Self {
        Self { meta, descriptor, raw: Some(raw), view, device }
    }

    pub fn raw(&self) -> &B::Texture {
        self.raw.as_ref().expect("Texture accessed after destruction")
    }

    pub fn view(&self) -> Option<&B::TextureView> {
        self.view.as_ref()
    }

    pub fn mip_level_count(&self) -> u32 {
        self.descriptor.mip_level_count()
    }

    /// Mip-0 `(width, height)`, each `>>mip_index` and clamped to `>= 1`
    /// (spec.md §8, testable property 5).
    pub fn mip_size(&self, mip_index: u32) -> (u32, u32) {
        let w = (self.descriptor.width >> mip_index).max(1);
        let h = (self.descriptor.height >> mip_index).max(1);
        (w, h)
    }
}

impl<B: Backend> Resource for Texture<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for Texture<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_texture(raw, self.view.take());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> TextureDescriptor {
        TextureDescriptor {
            kind: TextureKind::Texture2D,
            width: 256,
            height: 256,
            depth_or_slices: 1,
            format: TextureFormat::R8G8B8A8,
            flags: TextureFlags::empty(),
            usage: TextureUsage::Default,
            multisample_count: 1,
            clear_value: None,
        }
    }

    #[test]
    fn mip_level_count_without_mips_is_one() {
        assert_eq!(desc().mip_level_count(), 1);
    }

    #[test]
    fn mip_level_count_matches_floor_log2_plus_one() {
        let mut d = desc();
        d.flags = TextureFlags::GENERATE_MIPMAPS;
        // 256 = 2^8 -> floor(log2(256)) + 1 = 9
        assert_eq!(d.mip_level_count(), 9);
        d.width = 300;
        d.height = 1;
        // floor(log2(300)) = 8 -> 9
        assert_eq!(d.mip_level_count(), 9);
    }

    #[test]
    fn mipmap_flags_are_mutually_exclusive() {
        let mut d = desc();
        d.flags = TextureFlags::DATA_CONTAINS_MIPMAPS | TextureFlags::GENERATE_MIPMAPS;
        assert!(d.validate().is_err());
    }

    #[test]
    fn render_target_rejects_initial_data() {
        let mut d = desc();
        d.flags = TextureFlags::RENDER_TARGET;
        assert!(d.validate_initial_data(true).is_err());
        assert!(d.validate_initial_data(false).is_ok());
    }

    #[test]
    fn cube_is_six_array_layers() {
        let mut d = desc();
        d.kind = TextureKind::TextureCube;
        assert_eq!(d.array_layer_count(), 6);
    }
}
