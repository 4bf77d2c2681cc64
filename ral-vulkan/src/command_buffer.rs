//! Replays a recorded [`Command`] stream against the primary queue,
//! grounded on wgpu-hal's own `vulkan::CommandEncoder` submission path but
//! generalized to spec.md §4.5/§4.7's lazy render-pass state machine: a
//! `ClearGraphics` only records clear values, `SetGraphicsRenderTarget`
//! closes whatever pass is currently open, and the render pass itself is not
//! begun until the first draw or clear actually needs it.
use crate::device::{map_device_error, VulkanDevice};
use crate::pipeline::to_vk_viewport;
use crate::types::VulkanBackend;
use ash::vk;
use ral_core::command_buffer::{Command, DrawIndexedSource, DrawSource};
use ral_core::error::DeviceError;
use ral_types::ClearFlags;

/// Tracks the render target currently bound via `SetGraphicsRenderTarget`
/// and whether its `VkRenderPass` has actually been begun yet. Clear values
/// recorded by `ClearGraphics` are held here until the first command that
/// needs the pass open forces `begin_render_pass`.
#[derive(Default)]
struct RenderTargetState {
    /// (framebuffer, render pass, attachment count, width, height).
    framebuffer: Option<(vk::Framebuffer, vk::RenderPass, u32, u32, u32)>,
    pass_open: bool,
    clear_values: Vec<vk::ClearValue>,
}

/// Bound root signatures and the render-pass state machine, threaded through
/// [`replay_command`] so a nested `ExecuteCommandBuffer` replays against the
/// same state its parent was in (spec.md §4.5 invariant 3: replay preserves
/// recorded order, nesting included).
#[derive(Default)]
struct ReplayState {
    target: RenderTargetState,
    graphics_root_signature: Option<vk::PipelineLayout>,
    compute_root_signature: Option<vk::PipelineLayout>,
}

impl RenderTargetState {
    fn close(&mut self, device: &ash::Device, cmd: vk::CommandBuffer) {
        if self.pass_open {
            unsafe { device.cmd_end_render_pass(cmd) };
            self.pass_open = false;
        }
    }

    fn begin(&mut self, device: &ash::Device, cmd: vk::CommandBuffer) {
        if self.pass_open {
            return;
        }
        if let Some((framebuffer, render_pass, attachment_count, width, height)) = self.framebuffer {
            let mut clear_values = self.clear_values.clone();
            clear_values.resize(attachment_count as usize, vk::ClearValue::default());
            let begin_info = vk::RenderPassBeginInfo::default()
                .render_pass(render_pass)
                .framebuffer(framebuffer)
                .render_area(vk::Rect2D { offset: vk::Offset2D::default(), extent: vk::Extent2D { width, height } })
                .clear_values(&clear_values);
            unsafe { device.cmd_begin_render_pass(cmd, &begin_info, vk::SubpassContents::INLINE) };
            self.pass_open = true;
        }
    }
}

fn clear_value_from(flags: ClearFlags, color: [f32; 4], depth: f32, stencil: u8) -> Vec<vk::ClearValue> {
    // One `VkClearValue` per attachment slot this target has (color slots
    // first, depth-stencil last); since the command doesn't distinguish
    // which color attachment it targets, the same color clear applies to
    // every color slot of the currently bound framebuffer.
    let mut values = Vec::new();
    if flags.contains(ClearFlags::COLOR) {
        values.push(vk::ClearValue { color: vk::ClearColorValue { float32: color } });
    }
    if flags.intersects(ClearFlags::DEPTH | ClearFlags::STENCIL) {
        values.push(vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil: stencil as u32 },
        });
    }
    values
}

/// Replays `commands` against the device's single primary command buffer,
/// then submits and waits for it to complete on the relay semaphore pair
/// (spec.md §4.5, §4.8). This crate has no notion of overlapping frames in
/// flight (see `SPEC_FULL.md` §13), so `submit` is itself a blocking point:
/// record, submit, wait, return.
pub fn submit(device: &VulkanDevice, commands: &[Command<VulkanBackend>]) -> Result<(), DeviceError> {
    let shared = &device.shared;

    let pool_info = vk::CommandPoolCreateInfo::default()
        .queue_family_index(shared.queue_family_index)
        .flags(vk::CommandPoolCreateFlags::TRANSIENT);
    let pool = unsafe { shared.raw.create_command_pool(&pool_info, None) }.map_err(map_device_error)?;

    let alloc_info = vk::CommandBufferAllocateInfo::default()
        .command_pool(pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(1);
    let cmd = unsafe { shared.raw.allocate_command_buffers(&alloc_info) }.map_err(map_device_error)?[0];

    let begin_info = vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    unsafe { shared.raw.begin_command_buffer(cmd, &begin_info) }.map_err(map_device_error)?;

    let mut state = ReplayState::default();
    for command in commands {
        replay_command(device, cmd, &mut state, command);
    }

    state.target.close(&shared.raw, cmd);
    unsafe { shared.raw.end_command_buffer(cmd) }.map_err(map_device_error)?;

    let relay_index = (shared.relay_index.fetch_add(1, std::sync::atomic::Ordering::AcqRel) + 1) & 1;
    let signal = [shared.relay_semaphores[relay_index as usize]];
    let command_buffers = [cmd];
    let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers).signal_semaphores(&signal);

    unsafe {
        shared.raw.queue_submit(shared.queue, &[submit_info], vk::Fence::null()).map_err(map_device_error)?;
        shared.raw.queue_wait_idle(shared.queue).map_err(map_device_error)?;
        shared.raw.destroy_command_pool(pool, None);
    }
    Ok(())
}

/// Replays one recorded command against `cmd`, threading `state` through so
/// a nested [`Command::ExecuteCommandBuffer`] recurses into its own command
/// stream in place rather than being skipped (spec.md §4.5 invariant 3).
fn replay_command(
    device: &VulkanDevice,
    cmd: vk::CommandBuffer,
    state: &mut ReplayState,
    command: &Command<VulkanBackend>,
) {
    let shared = &device.shared;
    match command {
        Command::ExecuteCommandBuffer(nested) => {
            for nested_command in nested.commands() {
                replay_command(device, cmd, state, nested_command);
            }
        }
        Command::SetGraphicsRootSignature(root_signature) => {
            state.graphics_root_signature = Some(root_signature.raw().pipeline_layout);
        }
        Command::SetGraphicsPipelineState(pipeline) => {
            unsafe {
                shared.raw.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline.raw().raw);
            }
        }
        Command::SetGraphicsResourceGroup { slot, group } => {
            if let Some(layout) = state.graphics_root_signature {
                let sets = [group.raw().raw];
                unsafe {
                    shared.raw.cmd_bind_descriptor_sets(cmd, vk::PipelineBindPoint::GRAPHICS, layout, *slot, &sets, &[]);
                }
            }
        }
        Command::SetGraphicsVertexArray(vertex_array) => {
            let raw = vertex_array.raw();
            device.cmd_set_vertex_input(cmd, &raw.bindings, &raw.attributes);
            if !raw.buffers.is_empty() {
                let buffers: Vec<vk::Buffer> = raw.buffers.iter().map(|(b, _)| *b).collect();
                let offsets: Vec<vk::DeviceSize> = raw.buffers.iter().map(|(_, o)| *o).collect();
                unsafe { shared.raw.cmd_bind_vertex_buffers(cmd, 0, &buffers, &offsets) };
            }
            if let Some((buffer, offset, index_type)) = raw.index_buffer {
                unsafe { shared.raw.cmd_bind_index_buffer(cmd, buffer, offset, index_type) };
            }
        }
        Command::SetGraphicsViewports(viewports) => {
            let vk_viewports: Vec<vk::Viewport> = viewports.iter().map(to_vk_viewport).collect();
            unsafe { shared.raw.cmd_set_viewport(cmd, 0, &vk_viewports) };
        }
        Command::SetGraphicsScissorRectangles(rects) => {
            let vk_rects: Vec<vk::Rect2D> = rects
                .iter()
                .map(|r| vk::Rect2D {
                    offset: vk::Offset2D { x: r.top_left_x as i32, y: r.top_left_y as i32 },
                    extent: vk::Extent2D {
                        width: r.bottom_right_x.saturating_sub(r.top_left_x),
                        height: r.bottom_right_y.saturating_sub(r.top_left_y),
                    },
                })
                .collect();
            unsafe { shared.raw.cmd_set_scissor(cmd, 0, &vk_rects) };
        }
        Command::SetGraphicsRenderTarget(framebuffer) => {
            state.target.close(&shared.raw, cmd);
            let raw = framebuffer.raw();
            let fb = raw.raw.lock().as_ref().copied().expect("Framebuffer accessed after destruction");
            state.target.framebuffer = Some((fb, raw.render_pass, raw.views.len() as u32, raw.width, raw.height));
            state.target.clear_values.clear();
        }
        Command::ClearGraphics { flags, color, depth, stencil } => {
            state.target.clear_values = clear_value_from(*flags, *color, *depth, *stencil);
        }
        Command::DrawGraphics(source) => {
            state.target.begin(&shared.raw, cmd);
            replay_draw_graphics(shared, cmd, source);
        }
        Command::DrawIndexedGraphics(source) => {
            state.target.begin(&shared.raw, cmd);
            replay_draw_indexed_graphics(shared, cmd, source);
        }
        Command::SetComputeRootSignature(root_signature) => {
            state.compute_root_signature = Some(root_signature.raw().pipeline_layout);
        }
        Command::SetComputePipelineState(pipeline) => {
            unsafe {
                shared.raw.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::COMPUTE, pipeline.raw().raw);
            }
        }
        Command::SetComputeResourceGroup { slot, group } => {
            if let Some(layout) = state.compute_root_signature {
                let sets = [group.raw().raw];
                unsafe {
                    shared.raw.cmd_bind_descriptor_sets(cmd, vk::PipelineBindPoint::COMPUTE, layout, *slot, &sets, &[]);
                }
            }
        }
        Command::DispatchCompute { group_count_x, group_count_y, group_count_z } => {
            unsafe { shared.raw.cmd_dispatch(cmd, *group_count_x, *group_count_y, *group_count_z) };
        }
        Command::SetTextureMinimumMaximumMipmapIndex { texture, min_mip, max_mip } => {
            if let Some(view) = texture.view() {
                *view.mip_range.lock() = (*min_mip, *max_mip);
            }
        }
        Command::ResolveMultisampleFramebuffer { src, dst } => {
            state.target.close(&shared.raw, cmd);
            let src_attachments = src.descriptor.color_attachments.iter();
            let dst_attachments = dst.descriptor.color_attachments.iter();
            for (src_attachment, dst_attachment) in src_attachments.zip(dst_attachments) {
                let src_texture = src_attachment.texture.raw();
                let dst_texture = dst_attachment.texture.raw();
                let aspect = if src_attachment.texture.descriptor.format.is_depth() {
                    vk::ImageAspectFlags::DEPTH
                } else {
                    vk::ImageAspectFlags::COLOR
                };
                let subresource = vk::ImageSubresourceLayers {
                    aspect_mask: aspect,
                    mip_level: src_attachment.mip_level,
                    base_array_layer: 0,
                    layer_count: 1,
                };
                let region = vk::ImageResolve {
                    src_subresource: subresource,
                    src_offset: vk::Offset3D::default(),
                    dst_subresource: vk::ImageSubresourceLayers { mip_level: dst_attachment.mip_level, ..subresource },
                    dst_offset: vk::Offset3D::default(),
                    extent: vk::Extent3D { width: dst_texture.width.max(1), height: dst_texture.height.max(1), depth: 1 },
                };
                crate::texture::transition_image(
                    &shared.raw, cmd, src_texture.raw, aspect, src_attachment.mip_level, 1,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                );
                crate::texture::transition_image(
                    &shared.raw, cmd, dst_texture.raw, aspect, dst_attachment.mip_level, 1,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                );
                unsafe {
                    shared.raw.cmd_resolve_image(
                        cmd,
                        src_texture.raw,
                        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                        dst_texture.raw,
                        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                        &[region],
                    );
                }
                crate::texture::transition_image(
                    &shared.raw, cmd, src_texture.raw, aspect, src_attachment.mip_level, 1,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                );
                crate::texture::transition_image(
                    &shared.raw, cmd, dst_texture.raw, aspect, dst_attachment.mip_level, 1,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                );
            }
        }
        Command::CopyResource { src, dst } => {
            let extent = vk::Extent3D { width: src.raw().width.min(dst.raw().width), height: src.raw().height.min(dst.raw().height), depth: 1 };
            let aspect = if src.descriptor.format.is_depth() { vk::ImageAspectFlags::DEPTH } else { vk::ImageAspectFlags::COLOR };
            let region = vk::ImageCopy {
                src_subresource: vk::ImageSubresourceLayers { aspect_mask: aspect, mip_level: 0, base_array_layer: 0, layer_count: 1 },
                src_offset: vk::Offset3D::default(),
                dst_subresource: vk::ImageSubresourceLayers { aspect_mask: aspect, mip_level: 0, base_array_layer: 0, layer_count: 1 },
                dst_offset: vk::Offset3D::default(),
                extent,
            };
            crate::texture::transition_image(
                &shared.raw, cmd, src.raw().raw, aspect, 0, vk::REMAINING_MIP_LEVELS,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            );
            crate::texture::transition_image(
                &shared.raw, cmd, dst.raw().raw, aspect, 0, vk::REMAINING_MIP_LEVELS,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            );
            unsafe {
                shared.raw.cmd_copy_image(
                    cmd,
                    src.raw().raw,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    dst.raw().raw,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );
            }
            crate::texture::transition_image(
                &shared.raw, cmd, src.raw().raw, aspect, 0, vk::REMAINING_MIP_LEVELS,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            );
            crate::texture::transition_image(
                &shared.raw, cmd, dst.raw().raw, aspect, 0, vk::REMAINING_MIP_LEVELS,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            );
        }
        Command::SetDebugMarker(label) => {
            insert_debug_label(shared, cmd, label);
        }
        Command::BeginDebugEvent(label) => {
            begin_debug_label(shared, cmd, label);
        }
        Command::EndDebugEvent => {
            end_debug_label(shared, cmd);
        }
    }
}

/// Replays a non-indexed draw (spec.md §4.5 "DrawGraphics"): either one real
/// `vkCmdDrawIndirect` against an `IndirectBuffer`, or, absent one, a loop of
/// `vkCmdDraw` per recorded [`DrawArguments`](ral_types::DrawArguments)
/// packet — "Draw emulation" bracketed with debug-event markers when more
/// than one draw is emulated (spec.md §4.5 scenario 4).
fn replay_draw_graphics(shared: &crate::device::DeviceShared, cmd: vk::CommandBuffer, source: &DrawSource<VulkanBackend>) {
    match source {
        DrawSource::Indirect { buffer, offset, draw_count } => {
            let stride = std::mem::size_of::<ral_types::DrawArguments>() as u32;
            unsafe { shared.raw.cmd_draw_indirect(cmd, buffer.raw().raw, *offset, *draw_count, stride) };
        }
        DrawSource::Emulated(args) => {
            let bracket = args.len() > 1;
            if bracket {
                begin_debug_label(shared, cmd, "Multi-draw-indirect emulation");
            }
            for a in args {
                unsafe {
                    shared.raw.cmd_draw(
                        cmd,
                        a.vertex_count_per_instance,
                        a.instance_count,
                        a.start_vertex_location,
                        a.start_instance_location,
                    );
                }
            }
            if bracket {
                end_debug_label(shared, cmd);
            }
        }
    }
}

/// Indexed-draw counterpart of [`replay_draw_graphics`] (spec.md §4.5
/// "DrawIndexedGraphics", scenario 3/4).
fn replay_draw_indexed_graphics(
    shared: &crate::device::DeviceShared,
    cmd: vk::CommandBuffer,
    source: &DrawIndexedSource<VulkanBackend>,
) {
    match source {
        DrawIndexedSource::Indirect { buffer, offset, draw_count } => {
            let stride = std::mem::size_of::<ral_types::DrawIndexedArguments>() as u32;
            unsafe { shared.raw.cmd_draw_indexed_indirect(cmd, buffer.raw().raw, *offset, *draw_count, stride) };
        }
        DrawIndexedSource::Emulated(args) => {
            let bracket = args.len() > 1;
            if bracket {
                begin_debug_label(shared, cmd, "Multi-indexed-draw-indirect emulation");
            }
            for a in args {
                unsafe {
                    shared.raw.cmd_draw_indexed(
                        cmd,
                        a.index_count_per_instance,
                        a.instance_count,
                        a.start_index_location,
                        a.base_vertex_location,
                        a.start_instance_location,
                    );
                }
            }
            if bracket {
                end_debug_label(shared, cmd);
            }
        }
    }
}

/// Debug-marker/event emission via `VK_EXT_debug_utils`'s command-buffer
/// labels, a no-op when the extension wasn't loaded (validation disabled).
fn insert_debug_label(shared: &crate::device::DeviceShared, cmd: vk::CommandBuffer, label: &str) {
    if let Some(messenger) = &shared.instance.debug_messenger {
        let name = std::ffi::CString::new(label).unwrap_or_default();
        let info = vk::DebugUtilsLabelEXT::default().label_name(&name);
        unsafe { messenger.extension().cmd_insert_debug_utils_label(cmd, &info) };
    }
}

fn begin_debug_label(shared: &crate::device::DeviceShared, cmd: vk::CommandBuffer, label: &str) {
    if let Some(messenger) = &shared.instance.debug_messenger {
        let name = std::ffi::CString::new(label).unwrap_or_default();
        let info = vk::DebugUtilsLabelEXT::default().label_name(&name);
        unsafe { messenger.extension().cmd_begin_debug_utils_label(cmd, &info) };
    }
}

fn end_debug_label(shared: &crate::device::DeviceShared, cmd: vk::CommandBuffer) {
    if let Some(messenger) = &shared.instance.debug_messenger {
        unsafe { messenger.extension().cmd_end_debug_utils_label(cmd) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_value_contains_one_entry_per_requested_aspect() {
        let color_only = clear_value_from(ClearFlags::COLOR, [1.0, 0.0, 0.0, 1.0], 1.0, 0);
        assert_eq!(color_only.len(), 1);

        let color_and_depth = clear_value_from(ClearFlags::COLOR | ClearFlags::DEPTH, [0.0; 4], 1.0, 0);
        assert_eq!(color_and_depth.len(), 2);
    }
}
