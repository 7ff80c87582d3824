//! Retained-mode graphics backend contract.
//!
//! The model is view based:
//! - a view is a numbered render-target slot with persistent clear/name/
//!   transform/rect state and a per-frame list of drawcalls
//! - drawcalls are recorded through an [`Encoder`] and executed when the host
//!   calls [`GraphicsBackend::frame`], views in ascending id order
//! - per-frame geometry lives in transient buffers carved from a bounded pool
//!
//! [`RecordingBackend`] records calls without a GPU; [`WgpuBackend`] executes
//! them with wgpu.

mod error;
mod handle;
mod layout;
mod recording;
mod state;
mod transient;
pub mod gpu;

pub use error::BackendError;
pub use handle::{FrameBufferHandle, ProgramHandle, TextureHandle, UniformHandle, ViewId, INVALID_HANDLE};
pub(crate) use handle::HandleAlloc;
pub use layout::{Attrib, AttribType, VertexAttribute, VertexLayout, VertexLayoutBuilder};
pub use recording::{Call, RecordedDraw, RecordingBackend};
pub(crate) use transient::TransientPool;
pub use state::{Caps, ClearFlags, RenderState, SamplerMode, ScissorRect, ViewClear, ViewMode};
pub use gpu::{SurfaceErrorAction, WgpuBackend, WgpuEncoder, WgpuInit};

pub use glam::Mat4;

/// Shader sources compiled into the crate.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EmbeddedShader {
    pub name: &'static str,
    pub wgsl: &'static str,
    pub vs_entry: &'static str,
    pub fs_entry: &'static str,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformType {
    Sampler,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureFormat {
    /// 8-bit RGBA, 4 bytes per texel.
    Rgba8,
}

impl TextureFormat {
    #[inline]
    pub const fn bytes_per_texel(self) -> usize {
        match self {
            TextureFormat::Rgba8 => 4,
        }
    }
}

/// Region of the transient vertex pool valid for the current frame.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransientVertexBuffer {
    /// Byte offset into the pool.
    pub offset: u32,
    /// Byte length of the region.
    pub size: u32,
    /// Index of the first vertex of the region within the pool.
    pub start_vertex: u32,
    pub stride: u16,
}

/// Region of the transient index pool valid for the current frame.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransientIndexBuffer {
    /// Byte offset into the pool.
    pub offset: u32,
    /// Byte length of the region.
    pub size: u32,
    /// Index of the first index of the region within the pool.
    pub start_index: u32,
}

/// Records one submission batch.
///
/// State set before [`submit`](Encoder::submit) applies to that drawcall only;
/// it is reset afterwards.
pub trait Encoder {
    fn set_scissor(&mut self, rect: ScissorRect);
    fn set_state(&mut self, state: RenderState);
    fn set_texture(
        &mut self,
        stage: u8,
        sampler: UniformHandle,
        texture: TextureHandle,
        mode: SamplerMode,
    );
    /// Binds vertices `[start, start + num)` of `tvb`. Indices are relative to
    /// `start`.
    fn set_vertex_buffer(&mut self, stream: u8, tvb: &TransientVertexBuffer, start: u32, num: u32);
    /// Binds indices `[first, first + num)` of `tib`.
    fn set_index_buffer(&mut self, tib: &TransientIndexBuffer, first: u32, num: u32);
    fn submit(&mut self, view: ViewId, program: ProgramHandle);
    /// Closes the batch.
    fn end(self)
    where
        Self: Sized;
}

/// Resource and submission API of a retained-mode backend.
pub trait GraphicsBackend {
    /// Native window token accepted by [`create_frame_buffer`](Self::create_frame_buffer).
    type NativeWindow;

    type Encoder<'a>: Encoder
    where
        Self: 'a;

    fn caps(&self) -> Caps;

    // ── views ─────────────────────────────────────────────────────────────

    /// Marks the view as used this frame so it executes (and clears) even
    /// without drawcalls.
    fn touch(&mut self, view: ViewId);
    fn set_view_clear(&mut self, view: ViewId, clear: ViewClear);
    fn set_view_name(&mut self, view: ViewId, name: &str);
    fn set_view_mode(&mut self, view: ViewId, mode: ViewMode);
    fn set_view_transform(&mut self, view: ViewId, view_mtx: Option<&Mat4>, proj: &Mat4);
    fn set_view_rect(&mut self, view: ViewId, x: u16, y: u16, width: u16, height: u16);
    /// Redirects the view to `fb`; `FrameBufferHandle::INVALID` restores the
    /// main surface.
    fn set_view_frame_buffer(&mut self, view: ViewId, fb: FrameBufferHandle);

    // ── transient pool ────────────────────────────────────────────────────

    /// Number of vertices (at most `num`) that still fit this frame.
    fn avail_transient_vertex_buffer(&self, num: u32, layout: &VertexLayout) -> u32;
    /// Number of 16-bit indices (at most `num`) that still fit this frame.
    fn avail_transient_index_buffer(&self, num: u32) -> u32;
    fn alloc_transient_vertex_buffer(
        &mut self,
        num: u32,
        layout: &VertexLayout,
    ) -> Option<TransientVertexBuffer>;
    fn alloc_transient_index_buffer(&mut self, num: u32) -> Option<TransientIndexBuffer>;
    fn transient_vertex_data_mut(&mut self, tvb: &TransientVertexBuffer) -> &mut [u8];
    fn transient_index_data_mut(&mut self, tib: &TransientIndexBuffer) -> &mut [u8];

    // ── resources ─────────────────────────────────────────────────────────

    fn create_program(
        &mut self,
        shader: &EmbeddedShader,
        layout: &VertexLayout,
    ) -> Result<ProgramHandle, BackendError>;
    fn create_uniform(&mut self, name: &str, ty: UniformType) -> Result<UniformHandle, BackendError>;
    fn create_texture_2d(
        &mut self,
        width: u16,
        height: u16,
        format: TextureFormat,
        data: &[u8],
    ) -> Result<TextureHandle, BackendError>;
    fn create_frame_buffer(
        &mut self,
        native: Self::NativeWindow,
        width: u16,
        height: u16,
    ) -> Result<FrameBufferHandle, BackendError>;

    fn destroy_program(&mut self, handle: ProgramHandle);
    fn destroy_uniform(&mut self, handle: UniformHandle);
    fn destroy_texture(&mut self, handle: TextureHandle);
    fn destroy_frame_buffer(&mut self, handle: FrameBufferHandle);

    // ── submission ────────────────────────────────────────────────────────

    fn begin(&mut self) -> Self::Encoder<'_>;

    /// Executes every touched view, recycles the transient pool and returns
    /// the number of the frame just completed.
    fn frame(&mut self) -> u64;
}
