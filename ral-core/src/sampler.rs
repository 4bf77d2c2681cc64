use crate::backend::{Backend, DeviceBackend};
use crate::resource::{Resource, ResourceMeta};
use ral_types::{AddressMode, FilterMode};
use std::sync::Arc;

/// Backend-agnostic description of a sampler (spec.md §3.1 "SamplerState").
#[derive(Debug, Clone, Copy)]
pub struct SamplerDescriptor {
    pub filter: FilterMode,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    pub mip_lod_bias: f32,
    pub max_anisotropy: f32,
    pub border_color: [f32; 4],
    pub min_lod: f32,
    pub max_lod: f32,
}

impl Default for SamplerDescriptor {
    /// Point filtering, clamp addressing, opaque black border — the
    /// documented default border color (spec.md §6.4).
    fn default() -> Self {
        Self {
            filter: FilterMode::MinMagMipPoint,
            address_u: AddressMode::Clamp,
            address_v: AddressMode::Clamp,
            address_w: AddressMode::Clamp,
            mip_lod_bias: 0.0,
            max_anisotropy: 1.0,
            border_color: [0.0, 0.0, 0.0, 1.0],
            min_lod: -1000.0,
            max_lod: 1000.0,
        }
    }
}

impl SamplerDescriptor {
    /// `maxAnisotropy` must not exceed `Capabilities::max_anisotropy`
    /// (spec.md §3.1).
    pub fn validate(&self, device_max_anisotropy: f32) -> Result<(), &'static str> {
        if self.max_anisotropy > device_max_anisotropy {
            Err("SamplerState max anisotropy exceeds device capability")
        } else {
            Ok(())
        }
    }
}

#[derive(Debug)]
pub struct SamplerState<B: Backend> {
    meta: ResourceMeta,
    pub descriptor: SamplerDescriptor,
    pub(crate) raw: Option<B::Sampler>,
    device: Arc<B::Device>,
}

impl<B: Backend> SamplerState<B> {
    pub fn new(meta: ResourceMeta, descriptor: SamplerDescriptor, raw: B::Sampler, device: Arc<B::Device>) -> Self {
        Self { meta, descriptor, raw: Some(raw), device }
    }

    pub fn raw(&self) -> &B::Sampler {
        self.raw.as_ref().expect("SamplerState accessed after destruction")
    }
}

impl<B: Backend> Resource for SamplerState<B> {
    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }
}

impl<B: Backend> Drop for SamplerState<B> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_sampler(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_border_color_is_opaque_black() {
        assert_eq!(SamplerDescriptor::default().border_color, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn anisotropy_above_device_cap_is_rejected() {
        let mut d = SamplerDescriptor::default();
        d.max_anisotropy = 32.0;
        assert!(d.validate(16.0).is_err());
        assert!(d.validate(32.0).is_ok());
    }
}
