use crate::backend::{Backend, DeviceBackend};
use crate::resource::{Resource, ResourceMeta};
use ral_types::{AddressMode, DescriptorRangeType, FilterMode, ResourceKind, ShaderVisibility};
use std::sync::Arc;

/// One entry of a root signature's flat parameter list (spec.md §3.1
/// "RootSignature"). Mirrors the D3D12/Vulkan-binding-model split spec.md
/// §4.4 describes: a parameter is either a descriptor table (range of
/// contiguous bindings translated into one `VkDescriptorSetLayout`), a single
/// root constant, or a directly-bound constant buffer.
#[derive(Debug, Clone)]
pub enum RootParameter {
    DescriptorTable {
        ranges: Vec<DescriptorRange>,
        visibility: ShaderVisibility,
    },
    RootConstants {
        shader_register: u32,
        value_count: u32,
        visibility: ShaderVisibility,
    },
    RootConstantBufferView {
        shader_register: u32,
        visibility: ShaderVisibility,
    },
}

/// A single binding slot of a descriptor table (spec.md §3.1 "RootSignature":
/// "a RangeType ..., a ResourceKind it binds, and a binding slot"). Both
/// `range_type` and `resource_kind` are needed to pick a native descriptor
/// type — spec.md §4.4's table keys off the pair, not `range_type` alone
/// (e.g. `Srv` means `COMBINED_IMAGE_SAMPLER` for a texture but
/// `UNIFORM_TEXEL_BUFFER` for a `TextureBuffer`).
#[derive(Debug, Clone, Copy)]
pub struct DescriptorRange {
    pub range_type: DescriptorRangeType,
    pub resource_kind: ResourceKind,
    pub base_shader_register: u32,
    pub descriptor_count: u32,
}

/// An immutable sampler baked directly into the root signature (spec.md
/// §3.1), avoiding a separate `SamplerState` object and binding slot for the
/// common "always clamp+point/trilinear" case.
#[derive(Debug, Clone, Copy)]
pub struct StaticSampler {
    pub shader_register: u32,
    pub filter: FilterMode,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    pub visibility: ShaderVisibility,
}

#[derive(Debug, Clone, Default)]
pub struct RootSignatureDescriptor {
    pub parameters: Vec<RootParameter>,
    pub static_samplers: Vec<StaticSampler>,
}

impl RootSignatureDescriptor {
    /// spec.md §3.1 caps a root signature at 64 DWORDs of root-constant
    /// budget (the same accounting D3D12 uses: a descriptor table or a CBV
    /// costs 1 DWORD, root constants cost `value_count` DWORDs each).
    pub const MAX_DWORDS: u32 = 64;

    pub fn dword_cost(&self) -> u32 {
        self.parameters
            .iter()
            .map(|p| match p {
                RootParameter::DescriptorTable { .. } => 1,
                RootParameter::RootConstantBufferView { .. } => 1,
                RootParameter::RootConstants { value_count, .. } => *value_count,
            })
            .sum()
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.dword_cost() > Self::MAX_DWORDS {
            return Err("RootSignature exceeds the 64 DWORD root-constant budget");
        }
        Ok(())
    }
}

/// A compiled, backend-native binding layout (spec.md §3.1, §4.4). Vulkan
/// realizes each descriptor table as its own `VkDescriptorSetLayout`, root
/// constants as `VkPushConstantRange`s, and the whole signature as one
/// `VkPipelineLayout`.
#[derive(Debug)]
pub struct RootSignature<B: Backend> {
    meta: ResourceMeta,
    pub descriptor: RootSignatureDescriptor,
    pub(crate) raw: Option<B::RootSignature>,
    device: Arc<B::Device>,
}

impl<B: Backend> RootSignature<B> {
    pub fn new(meta: ResourceMeta, descriptor: RootSignatureDescriptor, raw: B::RootSignature, device: Arc<B::Device>) -> Self {
        Self { meta, descriptor, raw: Some(raw), device }
    }

    pub fn raw(&self) -> &B::RootSignature {
        self.raw.as_ref().expect("RootSignature accessed after destruction")
    }
}

impl<B: Backend> Resource for RootSignature<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for RootSignature<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_root_signature(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dword_cost_sums_table_and_constant_costs() {
        let d = RootSignatureDescriptor {
            parameters: vec![
                RootParameter::DescriptorTable { ranges: vec![], visibility: ShaderVisibility::ALL },
                RootParameter::RootConstants { shader_register: 0, value_count: 4, visibility: ShaderVisibility::ALL },
            ],
            static_samplers: vec![],
        };
        assert_eq!(d.dword_cost(), 5);
    }

    #[test]
    fn exceeding_budget_is_rejected() {
        let d = RootSignatureDescriptor {
            parameters: vec![RootParameter::RootConstants {
                shader_register: 0,
                value_count: 65,
                visibility: ShaderVisibility::ALL,
            }],
            static_samplers: vec![],
        };
        assert!(d.validate().is_err());
    }
}
