use crate::backend::Backend;
use crate::buffer::Buffer;
use crate::framebuffer::Framebuffer;
use crate::pipeline::{ComputePipelineState, GraphicsPipelineState};
use crate::resource::Res;
use crate::resource_group::ResourceGroup;
use crate::root_signature::RootSignature;
use crate::texture::Texture;
use crate::vertex_array::VertexArray;
use ral_types::{ClearFlags, DrawArguments, DrawIndexedArguments, ScissorRectangle, Viewport};

/// Source of the argument packets a draw command consumes (spec.md §4.5
/// "DrawGraphics"/"DrawIndexedGraphics": an indirect buffer pointer, an
/// offset, and a draw count; when the buffer is null, the argument packets
/// are recorded inline as "auxiliary memory" instead). `Emulated` is that
/// inline case — a `Vec<DrawArguments>` is this crate's auxiliary memory.
#[derive(Debug)]
pub enum DrawSource<B: Backend> {
    /// Draws read from an `IndirectBuffer` resource (spec.md §3.1
    /// "IndirectBuffer"). `draw_count` is the number of argument packets
    /// starting at `offset`.
    Indirect { buffer: Res<Buffer<B>>, offset: u64, draw_count: u32 },
    /// No indirect buffer was supplied; the argument packets are carried
    /// directly in the command. A backend without native multi-draw-indirect
    /// replays each entry as a separate draw call (spec.md §4.5 "Draw
    /// emulation").
    Emulated(Vec<DrawArguments>),
}

impl<B: Backend> DrawSource<B> {
    pub fn draw_count(&self) -> u32 {
        match self {
            Self::Indirect { draw_count, .. } => *draw_count,
            Self::Emulated(args) => args.len() as u32,
        }
    }
}

/// Indexed-draw counterpart of [`DrawSource`].
#[derive(Debug)]
pub enum DrawIndexedSource<B: Backend> {
    Indirect { buffer: Res<Buffer<B>>, offset: u64, draw_count: u32 },
    Emulated(Vec<DrawIndexedArguments>),
}

impl<B: Backend> DrawIndexedSource<B> {
    pub fn draw_count(&self) -> u32 {
        match self {
            Self::Indirect { draw_count, .. } => *draw_count,
            Self::Emulated(args) => args.len() as u32,
        }
    }
}

/// A single recorded command (spec.md §4.5 "recorded, then replayed"). Held
/// as a plain tagged enum in a `Vec` rather than a packet-arena byte layout
/// with manual offsets — spec.md's own Design Notes §9 explicitly allow this
/// simplification for a safe-Rust rendition, and it is what lets
/// [`CommandBuffer::commands`] be replayed by a straightforward `match` in
/// each backend's `submit`.
#[derive(Debug)]
pub enum Command<B: Backend> {
    ExecuteCommandBuffer(Res<CommandBuffer<B>>),

    SetGraphicsRootSignature(Res<RootSignature<B>>),
    SetGraphicsPipelineState(Res<GraphicsPipelineState<B>>),
    SetGraphicsResourceGroup { slot: u32, group: Res<ResourceGroup<B>> },
    SetGraphicsVertexArray(Res<VertexArray<B>>),
    SetGraphicsViewports(Vec<Viewport>),
    SetGraphicsScissorRectangles(Vec<ScissorRectangle>),
    /// Also used to target a swap chain's currently acquired image: see
    /// [`crate::renderer::Renderer::swap_chain_framebuffer`].
    SetGraphicsRenderTarget(Res<Framebuffer<B>>),
    ClearGraphics { flags: ClearFlags, color: [f32; 4], depth: f32, stencil: u8 },
    DrawGraphics(DrawSource<B>),
    DrawIndexedGraphics(DrawIndexedSource<B>),

    SetComputeRootSignature(Res<RootSignature<B>>),
    SetComputePipelineState(Res<ComputePipelineState<B>>),
    SetComputeResourceGroup { slot: u32, group: Res<ResourceGroup<B>> },
    DispatchCompute { group_count_x: u32, group_count_y: u32, group_count_z: u32 },

    SetTextureMinimumMaximumMipmapIndex { texture: Res<Texture<B>>, min_mip: u32, max_mip: u32 },
    ResolveMultisampleFramebuffer { src: Res<Framebuffer<B>>, dst: Res<Framebuffer<B>> },
    CopyResource { src: Res<Texture<B>>, dst: Res<Texture<B>> },

    SetDebugMarker(String),
    BeginDebugEvent(String),
    EndDebugEvent,
}

/// A sequence of [`Command`]s recorded against one [`crate::renderer::Renderer`]
/// and submitted as a unit (spec.md §3.1 "CommandBuffer", §4.5). Immutable
/// once [`CommandBufferRecorder::finish`] is called; a finished command
/// buffer can itself be nested into another via `ExecuteCommandBuffer`.
#[derive(Debug, Default)]
pub struct CommandBuffer<B: Backend> {
    commands: Vec<Command<B>>,
}

impl<B: Backend> CommandBuffer<B> {
    pub fn commands(&self) -> &[Command<B>] {
        &self.commands
    }
}

/// Records commands into a [`CommandBuffer`] (spec.md §4.5). Mirrors the
/// scene-state machine spec.md describes: a renderer is either `Idle` or
/// `Recording`, and a recorder exists only while `Recording`.
#[derive(Debug, Default)]
pub struct CommandBufferRecorder<B: Backend> {
    commands: Vec<Command<B>>,
    /// Tracks whether a `BeginDebugEvent` is currently open, so `finish`
    /// can catch an unbalanced debug-event nest as a CRITICAL programmer
    /// error (spec.md §6.6) instead of silently emitting a dangling pop.
    open_debug_events: u32,
}

impl<B: Backend> CommandBufferRecorder<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command<B>) {
        match &command {
            Command::BeginDebugEvent(_) => self.open_debug_events += 1,
            Command::EndDebugEvent => self.open_debug_events = self.open_debug_events.saturating_sub(1),
            _ => {}
        }
        self.commands.push(command);
    }

    /// Finalizes recording. Returns an error if a `BeginDebugEvent` was
    /// never matched with `EndDebugEvent` (spec.md §6.6 debug-event nesting).
    pub fn finish(self) -> Result<CommandBuffer<B>, &'static str> {
        if self.open_debug_events != 0 {
            return Err("unbalanced BeginDebugEvent/EndDebugEvent nesting");
        }
        Ok(CommandBuffer { commands: self.commands })
    }
}

#[cfg(test)]
mod tests {
    // `Command<B>`/`DrawSource<B>` carry backend-generic resource handles,
    // so recorder behavior (ordering, debug-event balancing) and draw-source
    // bookkeeping are exercised against the null backend's concrete
    // `Backend` impl in its own test suite.
}
