use crate::backend::{Backend, DeviceBackend};
use crate::buffer::Buffer;
use crate::resource::{Res, Resource, ResourceMeta};
use crate::sampler::SamplerState;
use crate::texture::Texture;
use ral_types::{DescriptorRangeType, ResourceKind};
use std::sync::Arc;

/// Describes the shape a [`ResourceGroup`] must match: one entry per
/// descriptor-table range declared in the owning
/// [`crate::root_signature::RootSignatureDescriptor`] (spec.md §3.1
/// "ResourceGroup", §4.4). Backends use this to pick the right
/// `VkDescriptorSetLayout` when allocating the group's descriptor set. Each
/// entry is `(range_type, resource_kind, descriptor_count)` — both axes of
/// spec.md §4.4's table are needed to resolve a native descriptor type.
#[derive(Debug, Clone)]
pub struct ResourceGroupLayout {
    pub ranges: Vec<(DescriptorRangeType, ResourceKind, u32)>,
}

/// One bound resource slot within a [`ResourceGroup`] (spec.md §3.1).
#[derive(Debug, Clone)]
pub enum BoundResource<B: Backend> {
    Buffer(Res<Buffer<B>>),
    Texture(Res<Texture<B>>),
    Sampler(Res<SamplerState<B>>),
    /// An unbound slot; backends write a null/dummy descriptor. Spec.md §4.1
    /// treats reading through an unbound slot from a shader as a CRITICAL
    /// programmer error, not something this layer can prevent at bind time.
    Empty,
}

/// Backend-agnostic description of a [`ResourceGroup`]'s contents, matching
/// the shape `ResourceGroupLayout` declares (spec.md §3.1). Holds strong
/// references to every bound resource so a `ResourceGroup` keeps its
/// dependencies alive (spec.md §4.1 resource-DAG rule).
#[derive(Debug, Clone, Default)]
pub struct ResourceGroupDescriptor<B: Backend> {
    pub bindings: Vec<BoundResource<B>>,
}

/// A bundle of bound resources realized as one backend-native descriptor set
/// (spec.md §3.1 "ResourceGroup", §4.4). Immutable once created: rebinding
/// means creating a new group, mirroring the immutable-pipeline-state model
/// spec.md applies throughout.
#[derive(Debug)]
pub struct ResourceGroup<B: Backend> {
    meta: ResourceMeta,
    pub descriptor: ResourceGroupDescriptor<B>,
    pub(crate) raw: Option<B::ResourceGroup>,
    device: Arc<B::Device>,
}

impl<B: Backend> ResourceGroup<B> {
    pub fn new(meta: ResourceMeta, descriptor: ResourceGroupDescriptor<B>, raw: B::ResourceGroup, device: Arc<B::Device>) -> Self {
        Self { meta, descriptor, raw: Some(raw), device }
    }

    pub fn raw(&self) -> &B::ResourceGroup {
        self.raw.as_ref().expect("ResourceGroup accessed after destruction")
    }
}

impl<B: Backend> Resource for ResourceGroup<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for ResourceGroup<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_resource_group(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_ranges_preserve_declaration_order() {
        let layout = ResourceGroupLayout {
            ranges: vec![
                (DescriptorRangeType::Srv, ResourceKind::Texture2D, 2),
                (DescriptorRangeType::Sampler, ResourceKind::SamplerState, 1),
            ],
        };
        assert_eq!(layout.ranges[0].2, 2);
        assert_eq!(layout.ranges[1].0, DescriptorRangeType::Sampler);
    }
}
