//! `VkShaderModule` creation: decoding the compact bytecode form and, when
//! built with `glsl-to-spirv`, compiling GLSL source on the fly via
//! `shaderc`. Grounded on wgpu-hal's `vulkan::Device::create_shader_module`,
//! generalized to the two source kinds `ShaderSource` allows.
use crate::device::{map_creation_error, VulkanDevice};
use crate::types::VulkanShaderModule;
use ash::vk;
use ral_core::error::CreationError;
use ral_core::shader::{ShaderSource, ShaderStage};
use std::ffi::CString;

pub const SHADER_LANGUAGE_NAME: &str = "SPIR-V";

/// Decodes the compact bytecode envelope described in spec.md §6.3 into a
/// plain SPIR-V word stream. The real format is a SMOL-V-style bitstream;
/// no such crate is part of this workspace's dependency set, so this
/// decodes the simplified envelope this crate's own encoder would produce
/// instead: a little-endian `u32` byte count followed by that many raw
/// SPIR-V bytes. See DESIGN.md for why.
fn decode_bytecode(bytes: &[u8]) -> Result<Vec<u32>, CreationError> {
    if bytes.len() < 4 {
        return Err(CreationError::InvalidArgument("shader bytecode is shorter than its size header"));
    }
    let decoded_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let body = &bytes[4..];
    if body.len() != decoded_len {
        return Err(CreationError::InvalidArgument(
            "shader bytecode size header does not match the encoded payload length",
        ));
    }
    if decoded_len % 4 != 0 {
        return Err(CreationError::InvalidArgument("decoded SPIR-V is not a whole number of 32-bit words"));
    }
    Ok(body
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect())
}

#[cfg(feature = "glsl-to-spirv")]
fn shader_kind(stage: ShaderStage) -> shaderc::ShaderKind {
    match stage {
        ShaderStage::Vertex => shaderc::ShaderKind::Vertex,
        ShaderStage::TessellationControl => shaderc::ShaderKind::TessControl,
        ShaderStage::TessellationEvaluation => shaderc::ShaderKind::TessEvaluation,
        ShaderStage::Geometry => shaderc::ShaderKind::Geometry,
        ShaderStage::Fragment => shaderc::ShaderKind::Fragment,
        ShaderStage::Compute => shaderc::ShaderKind::Compute,
    }
}

#[cfg(feature = "glsl-to-spirv")]
fn compile_glsl(stage: ShaderStage, source: &str, entry_point: &str) -> Result<Vec<u32>, CreationError> {
    let compiler = shaderc::Compiler::new()
        .ok_or_else(|| CreationError::Backend("failed to initialize the shaderc compiler".into()))?;
    let mut options = shaderc::CompileOptions::new()
        .ok_or_else(|| CreationError::Backend("failed to initialize shaderc compile options".into()))?;
    options.set_target_env(shaderc::TargetEnv::Vulkan, shaderc::EnvVersion::Vulkan1_2 as u32);
    options.set_target_spirv(shaderc::SpirvVersion::V1_5);
    options.set_source_language(shaderc::SourceLanguage::GLSL);
    let artifact = compiler
        .compile_into_spirv(source, shader_kind(stage), "<shader>", entry_point, Some(&options))
        .map_err(|e| CreationError::ShaderCompilation(e.to_string()))?;
    Ok(artifact.as_binary().to_vec())
}

#[cfg(not(feature = "glsl-to-spirv"))]
fn compile_glsl(_stage: ShaderStage, _source: &str, _entry_point: &str) -> Result<Vec<u32>, CreationError> {
    Err(CreationError::MissingCapability("GLSL compilation requires the `glsl-to-spirv` feature"))
}

pub fn create_shader_module(
    device: &VulkanDevice,
    stage: ShaderStage,
    source: &ShaderSource,
) -> Result<VulkanShaderModule, CreationError> {
    let (spirv, entry_point) = match source {
        ShaderSource::Bytecode(bytes) => (decode_bytecode(bytes)?, "main".to_string()),
        ShaderSource::Glsl { source, entry_point } => (compile_glsl(stage, source, entry_point)?, entry_point.clone()),
    };

    let create_info = vk::ShaderModuleCreateInfo::default().code(&spirv);
    let raw = unsafe { device.shared.raw.create_shader_module(&create_info, None) }.map_err(map_creation_error)?;
    let entry_point = CString::new(entry_point)
        .map_err(|_| CreationError::InvalidArgument("shader entry point must not contain a NUL byte"))?;
    Ok(VulkanShaderModule { raw, entry_point })
}

pub fn destroy_shader_module(device: &VulkanDevice, module: VulkanShaderModule) {
    unsafe {
        device.shared.raw.destroy_shader_module(module.raw, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(words: &[u32]) -> Vec<u8> {
        let body: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let mut out = (body.len() as u32).to_le_bytes().to_vec();
        out.extend(body);
        out
    }

    #[test]
    fn decode_round_trips_the_encoder_this_crate_would_use() {
        let words = [0x0723_0203u32, 1, 2, 3];
        let decoded = decode_bytecode(&encode(&words)).unwrap();
        assert_eq!(decoded, words);
    }

    #[test]
    fn decode_rejects_a_mismatched_size_header() {
        let mut bytes = encode(&[1, 2]);
        bytes[0] = 0xFF;
        assert!(decode_bytecode(&bytes).is_err());
    }

    #[test]
    fn decode_rejects_a_truncated_header() {
        assert!(decode_bytecode(&[0, 1]).is_err());
    }
}
