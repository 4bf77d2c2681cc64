/// Closed set of pixel/texel formats a texture or texture-buffer may be
/// created with.
///
/// Per spec.md §3.2: every variant must answer "how many bytes per element or
/// per compressed block" and "is this a depth format". Compressed formats
/// (`BC*`, `ETC1`) report their size per 4×4 block; callers must divide the
/// surface into `ceil(width/4) * ceil(height/4)` blocks when computing a mip
/// level's byte size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum TextureFormat {
    R8,
    R8G8B8,
    R8G8B8A8,
    R8G8B8A8Srgb,
    B8G8R8A8,
    R11G11B10F,
    R16G16B16A16F,
    R32G32B32A32F,
    Bc1,
    Bc1Srgb,
    Bc2,
    Bc2Srgb,
    Bc3,
    Bc3Srgb,
    Bc4,
    Bc5,
    Etc1,
    R16Unorm,
    R32Uint,
    R32Float,
    D32Float,
    R16G16Snorm,
    R16G16Float,
    Unknown,
}

impl TextureFormat {
    /// Number of uncompressed texels (or, for block formats, 4×4 blocks)
    /// this format is addressed in.
    pub const fn block_dimensions(self) -> (u32, u32) {
        match self {
            Self::Bc1
            | Self::Bc1Srgb
            | Self::Bc2
            | Self::Bc2Srgb
            | Self::Bc3
            | Self::Bc3Srgb
            | Self::Bc4
            | Self::Bc5
            | Self::Etc1 => (4, 4),
            _ => (1, 1),
        }
    }

    /// Bytes occupied by one element: one texel for uncompressed formats, one
    /// 4×4 block for compressed formats.
    ///
    /// Returns `0` for [`Self::Unknown`]; callers must reject `Unknown`
    /// before sizing an allocation.
    pub const fn block_size_bytes(self) -> u32 {
        match self {
            Self::R8 => 1,
            Self::R8G8B8 => 3,
            Self::R8G8B8A8 | Self::R8G8B8A8Srgb | Self::B8G8R8A8 => 4,
            Self::R11G11B10F => 4,
            Self::R16G16B16A16F => 8,
            Self::R32G32B32A32F => 16,
            // BC1/ETC1 pack a 4x4 block into 8 bytes; the rest pack into 16.
            Self::Bc1 | Self::Bc1Srgb | Self::Bc4 | Self::Etc1 => 8,
            Self::Bc2 | Self::Bc2Srgb | Self::Bc3 | Self::Bc3Srgb | Self::Bc5 => 16,
            Self::R16Unorm => 2,
            Self::R32Uint | Self::R32Float => 4,
            Self::D32Float => 4,
            Self::R16G16Snorm | Self::R16G16Float => 4,
            Self::Unknown => 0,
        }
    }

    /// Byte size of one full mip level of `width` x `height` texels.
    pub fn level_size_bytes(self, width: u32, height: u32) -> u64 {
        let (bw, bh) = self.block_dimensions();
        let blocks_wide = (width.max(1) as u64 + bw as u64 - 1) / bw as u64;
        let blocks_high = (height.max(1) as u64 + bh as u64 - 1) / bh as u64;
        blocks_wide * blocks_high * self.block_size_bytes() as u64
    }

    pub const fn is_depth(self) -> bool {
        matches!(self, Self::D32Float)
    }

    pub const fn is_compressed(self) -> bool {
        matches!(
            self,
            Self::Bc1
                | Self::Bc1Srgb
                | Self::Bc2
                | Self::Bc2Srgb
                | Self::Bc3
                | Self::Bc3Srgb
                | Self::Bc4
                | Self::Bc5
                | Self::Etc1
        )
    }

    pub const fn is_srgb(self) -> bool {
        matches!(self, Self::R8G8B8A8Srgb | Self::Bc1Srgb | Self::Bc2Srgb | Self::Bc3Srgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_level_size() {
        assert_eq!(TextureFormat::R8G8B8A8.level_size_bytes(4, 4), 64);
        assert_eq!(TextureFormat::R32G32B32A32F.level_size_bytes(1, 1), 16);
    }

    #[test]
    fn compressed_level_size_rounds_up_to_block() {
        // A 5x5 BC1 texture occupies 2x2 blocks of 8 bytes each.
        assert_eq!(TextureFormat::Bc1.level_size_bytes(5, 5), 32);
        assert_eq!(TextureFormat::Bc3.level_size_bytes(5, 5), 64);
    }

    #[test]
    fn depth_predicate() {
        assert!(TextureFormat::D32Float.is_depth());
        assert!(!TextureFormat::R8G8B8A8.is_depth());
    }

    #[test]
    fn unknown_has_no_size() {
        assert_eq!(TextureFormat::Unknown.block_size_bytes(), 0);
    }
}
