use std::collections::BTreeSet;

use glam::Mat4;

use super::{
    BackendError, Caps, EmbeddedShader, Encoder, FrameBufferHandle, GraphicsBackend, HandleAlloc,
    ProgramHandle, RenderState, SamplerMode, ScissorRect, TextureFormat, TextureHandle,
    TransientIndexBuffer, TransientPool, TransientVertexBuffer, UniformHandle, UniformType, VertexLayout,
    ViewClear, ViewId, ViewMode,
};

/// Default transient pool sizes (bytes).
const DEFAULT_VERTEX_POOL: usize = 6 << 20;
const DEFAULT_INDEX_POOL: usize = 2 << 20;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Touch(ViewId),
    SetViewClear(ViewId, ViewClear),
    SetViewName(ViewId, String),
    SetViewMode(ViewId, ViewMode),
    SetViewTransform(ViewId, Mat4),
    SetViewRect {
        view: ViewId,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    },
    SetViewFrameBuffer(ViewId, FrameBufferHandle),
    AllocTransientVertices(u32),
    AllocTransientIndices(u32),
    Begin,
    Submit(RecordedDraw),
    End,
    CreateProgram(ProgramHandle),
    CreateUniform(UniformHandle, String),
    CreateTexture {
        handle: TextureHandle,
        width: u16,
        height: u16,
    },
    CreateFrameBuffer {
        handle: FrameBufferHandle,
        native: u64,
        width: u16,
        height: u16,
    },
    DestroyProgram(ProgramHandle),
    DestroyUniform(UniformHandle),
    DestroyTexture(TextureHandle),
    DestroyFrameBuffer(FrameBufferHandle),
    Frame(u64),
}

/// Encoder state captured at `submit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedDraw {
    pub view: ViewId,
    pub program: ProgramHandle,
    pub state: Option<RenderState>,
    pub scissor: Option<ScissorRect>,
    pub texture: Option<(UniformHandle, TextureHandle, SamplerMode)>,
    /// `(start, num)` relative to the bound transient vertex buffer.
    pub vertices: Option<(u32, u32)>,
    /// `(first, num)` relative to the bound transient index buffer.
    pub indices: Option<(u32, u32)>,
}

/// Headless backend that records every call.
///
/// Resource creation can be made to fail through the `fail_*` switches, and
/// the transient pool capacity is configurable, which makes it the
/// collaborator of choice for exercising failure paths.
#[derive(Debug)]
pub struct RecordingBackend {
    calls: Vec<Call>,
    frame: u64,
    caps: Caps,

    vertices: TransientPool,
    indices: TransientPool,

    programs: HandleAlloc,
    uniforms: HandleAlloc,
    textures: HandleAlloc,
    frame_buffers: HandleAlloc,

    live_programs: BTreeSet<ProgramHandle>,
    live_uniforms: BTreeSet<UniformHandle>,
    live_textures: BTreeSet<TextureHandle>,
    live_frame_buffers: BTreeSet<FrameBufferHandle>,

    pub fail_programs: bool,
    pub fail_textures: bool,
    pub fail_frame_buffers: bool,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::with_pool_sizes(DEFAULT_VERTEX_POOL, DEFAULT_INDEX_POOL)
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend whose transient pools hold `vertex_bytes` and
    /// `index_bytes` per frame.
    pub fn with_pool_sizes(vertex_bytes: usize, index_bytes: usize) -> Self {
        Self {
            calls: Vec::new(),
            frame: 0,
            caps: Caps {
                homogeneous_depth: false,
                max_view_id: 255,
            },
            vertices: TransientPool::new(vertex_bytes),
            indices: TransientPool::new(index_bytes),
            programs: HandleAlloc::default(),
            uniforms: HandleAlloc::default(),
            textures: HandleAlloc::default(),
            frame_buffers: HandleAlloc::default(),
            live_programs: BTreeSet::new(),
            live_uniforms: BTreeSet::new(),
            live_textures: BTreeSet::new(),
            live_frame_buffers: BTreeSet::new(),
            fail_programs: false,
            fail_textures: false,
            fail_frame_buffers: false,
        }
    }

    pub fn with_caps(mut self, caps: Caps) -> Self {
        self.caps = caps;
        self
    }

    #[inline]
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Drawcalls submitted since the last [`clear_calls`](Self::clear_calls).
    pub fn submits(&self) -> impl Iterator<Item = &RecordedDraw> {
        self.calls.iter().filter_map(|c| match c {
            Call::Submit(d) => Some(d),
            _ => None,
        })
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.len()
    }

    pub fn live_programs(&self) -> usize {
        self.live_programs.len()
    }

    pub fn live_uniforms(&self) -> usize {
        self.live_uniforms.len()
    }

    pub fn live_frame_buffers(&self) -> usize {
        self.live_frame_buffers.len()
    }

    pub fn is_frame_buffer_live(&self, handle: FrameBufferHandle) -> bool {
        self.live_frame_buffers.contains(&handle)
    }

    /// Bytes of the transient vertex pool used this frame.
    pub fn vertex_bytes(&self) -> &[u8] {
        self.vertices.used()
    }

    /// Bytes of the transient index pool used this frame.
    pub fn index_bytes(&self) -> &[u8] {
        self.indices.used()
    }

    fn record(&mut self, call: Call) {
        log::trace!("recorded {call:?}");
        self.calls.push(call);
    }
}

/// Encoder produced by [`RecordingBackend::begin`].
pub struct RecordingEncoder<'a> {
    backend: &'a mut RecordingBackend,
    pending: RecordedDraw,
}

impl Encoder for RecordingEncoder<'_> {
    fn set_scissor(&mut self, rect: ScissorRect) {
        self.pending.scissor = Some(rect);
    }

    fn set_state(&mut self, state: RenderState) {
        self.pending.state = Some(state);
    }

    fn set_texture(
        &mut self,
        _stage: u8,
        sampler: UniformHandle,
        texture: TextureHandle,
        mode: SamplerMode,
    ) {
        self.pending.texture = Some((sampler, texture, mode));
    }

    fn set_vertex_buffer(&mut self, _stream: u8, _tvb: &TransientVertexBuffer, start: u32, num: u32) {
        self.pending.vertices = Some((start, num));
    }

    fn set_index_buffer(&mut self, _tib: &TransientIndexBuffer, first: u32, num: u32) {
        self.pending.indices = Some((first, num));
    }

    fn submit(&mut self, view: ViewId, program: ProgramHandle) {
        let mut draw = std::mem::take(&mut self.pending);
        draw.view = view;
        draw.program = program;
        self.backend.record(Call::Submit(draw));
    }

    fn end(self) {
        self.backend.record(Call::End);
    }
}

impl GraphicsBackend for RecordingBackend {
    type NativeWindow = u64;
    type Encoder<'a> = RecordingEncoder<'a>;

    fn caps(&self) -> Caps {
        self.caps
    }

    fn touch(&mut self, view: ViewId) {
        self.record(Call::Touch(view));
    }

    fn set_view_clear(&mut self, view: ViewId, clear: ViewClear) {
        self.record(Call::SetViewClear(view, clear));
    }

    fn set_view_name(&mut self, view: ViewId, name: &str) {
        self.record(Call::SetViewName(view, name.to_owned()));
    }

    fn set_view_mode(&mut self, view: ViewId, mode: ViewMode) {
        self.record(Call::SetViewMode(view, mode));
    }

    fn set_view_transform(&mut self, view: ViewId, _view_mtx: Option<&Mat4>, proj: &Mat4) {
        self.record(Call::SetViewTransform(view, *proj));
    }

    fn set_view_rect(&mut self, view: ViewId, x: u16, y: u16, width: u16, height: u16) {
        self.record(Call::SetViewRect {
            view,
            x,
            y,
            width,
            height,
        });
    }

    fn set_view_frame_buffer(&mut self, view: ViewId, fb: FrameBufferHandle) {
        self.record(Call::SetViewFrameBuffer(view, fb));
    }

    fn avail_transient_vertex_buffer(&self, num: u32, layout: &VertexLayout) -> u32 {
        self.vertices.avail(num, usize::from(layout.stride()))
    }

    fn avail_transient_index_buffer(&self, num: u32) -> u32 {
        self.indices.avail_indices(num)
    }

    fn alloc_transient_vertex_buffer(
        &mut self,
        num: u32,
        layout: &VertexLayout,
    ) -> Option<TransientVertexBuffer> {
        let tvb = self.vertices.alloc_vertices(num, layout)?;
        self.record(Call::AllocTransientVertices(num));
        Some(tvb)
    }

    fn alloc_transient_index_buffer(&mut self, num: u32) -> Option<TransientIndexBuffer> {
        let tib = self.indices.alloc_indices(num)?;
        self.record(Call::AllocTransientIndices(num));
        Some(tib)
    }

    fn transient_vertex_data_mut(&mut self, tvb: &TransientVertexBuffer) -> &mut [u8] {
        self.vertices.region_mut(tvb.offset, tvb.size)
    }

    fn transient_index_data_mut(&mut self, tib: &TransientIndexBuffer) -> &mut [u8] {
        self.indices.region_mut(tib.offset, tib.size)
    }

    fn create_program(
        &mut self,
        _shader: &EmbeddedShader,
        _layout: &VertexLayout,
    ) -> Result<ProgramHandle, BackendError> {
        if self.fail_programs {
            return Err(BackendError::Injected("program"));
        }
        let handle = ProgramHandle(self.programs.alloc().ok_or(BackendError::HandlesExhausted("program"))?);
        self.live_programs.insert(handle);
        self.record(Call::CreateProgram(handle));
        Ok(handle)
    }

    fn create_uniform(&mut self, name: &str, _ty: UniformType) -> Result<UniformHandle, BackendError> {
        let handle = UniformHandle(self.uniforms.alloc().ok_or(BackendError::HandlesExhausted("uniform"))?);
        self.live_uniforms.insert(handle);
        self.record(Call::CreateUniform(handle, name.to_owned()));
        Ok(handle)
    }

    fn create_texture_2d(
        &mut self,
        width: u16,
        height: u16,
        format: TextureFormat,
        data: &[u8],
    ) -> Result<TextureHandle, BackendError> {
        if self.fail_textures {
            return Err(BackendError::Injected("texture"));
        }
        let expected = usize::from(width) * usize::from(height) * format.bytes_per_texel();
        if data.len() != expected {
            return Err(BackendError::DataSize {
                what: "texture",
                expected,
                actual: data.len(),
            });
        }
        let handle = TextureHandle(self.textures.alloc().ok_or(BackendError::HandlesExhausted("texture"))?);
        self.live_textures.insert(handle);
        self.record(Call::CreateTexture {
            handle,
            width,
            height,
        });
        Ok(handle)
    }

    fn create_frame_buffer(
        &mut self,
        native: u64,
        width: u16,
        height: u16,
    ) -> Result<FrameBufferHandle, BackendError> {
        if self.fail_frame_buffers {
            return Err(BackendError::Injected("frame buffer"));
        }
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidSize {
                what: "frame buffer",
                width: width.into(),
                height: height.into(),
            });
        }
        let handle = FrameBufferHandle(
            self.frame_buffers
                .alloc()
                .ok_or(BackendError::HandlesExhausted("frame buffer"))?,
        );
        self.live_frame_buffers.insert(handle);
        self.record(Call::CreateFrameBuffer {
            handle,
            native,
            width,
            height,
        });
        Ok(handle)
    }

    fn destroy_program(&mut self, handle: ProgramHandle) {
        if self.live_programs.remove(&handle) {
            self.programs.release(handle.index());
            self.record(Call::DestroyProgram(handle));
        }
    }

    fn destroy_uniform(&mut self, handle: UniformHandle) {
        if self.live_uniforms.remove(&handle) {
            self.uniforms.release(handle.index());
            self.record(Call::DestroyUniform(handle));
        }
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        if self.live_textures.remove(&handle) {
            self.textures.release(handle.index());
            self.record(Call::DestroyTexture(handle));
        }
    }

    fn destroy_frame_buffer(&mut self, handle: FrameBufferHandle) {
        if self.live_frame_buffers.remove(&handle) {
            self.frame_buffers.release(handle.index());
            self.record(Call::DestroyFrameBuffer(handle));
        }
    }

    fn begin(&mut self) -> RecordingEncoder<'_> {
        self.record(Call::Begin);
        RecordingEncoder {
            backend: self,
            pending: RecordedDraw::default(),
        }
    }

    fn frame(&mut self) -> u64 {
        let completed = self.frame;
        self.frame += 1;
        self.vertices.reset();
        self.indices.reset();
        self.record(Call::Frame(completed));
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Attrib, AttribType};

    fn layout() -> VertexLayout {
        VertexLayout::builder()
            .add(Attrib::Position, 2, AttribType::Float, false)
            .build()
    }

    #[test]
    fn transient_pool_reports_partial_availability() {
        let backend = RecordingBackend::with_pool_sizes(8 * 10, 2 * 4);
        assert_eq!(backend.avail_transient_vertex_buffer(4, &layout()), 4);
        assert_eq!(backend.avail_transient_vertex_buffer(40, &layout()), 10);
        assert_eq!(backend.avail_transient_index_buffer(9), 4);
    }

    #[test]
    fn transient_pool_recycles_on_frame() {
        let mut backend = RecordingBackend::with_pool_sizes(8 * 10, 64);
        assert!(backend.alloc_transient_vertex_buffer(10, &layout()).is_some());
        assert!(backend.alloc_transient_vertex_buffer(1, &layout()).is_none());
        backend.frame();
        let tvb = backend.alloc_transient_vertex_buffer(10, &layout()).unwrap();
        assert_eq!(tvb.start_vertex, 0);
        assert_eq!(tvb.size, 80);
    }

    #[test]
    fn texture_data_size_is_validated() {
        let mut backend = RecordingBackend::new();
        let err = backend.create_texture_2d(2, 2, TextureFormat::Rgba8, &[0; 15]);
        assert!(matches!(err, Err(BackendError::DataSize { expected: 16, actual: 15, .. })));
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn destroying_unknown_handle_is_ignored() {
        let mut backend = RecordingBackend::new();
        backend.destroy_texture(TextureHandle(3));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn submit_resets_pending_state() {
        let mut backend = RecordingBackend::new();
        {
            let mut enc = backend.begin();
            enc.set_state(RenderState::BASE);
            enc.submit(ViewId(1), ProgramHandle(0));
            enc.submit(ViewId(1), ProgramHandle(0));
            enc.end();
        }
        let draws: Vec<_> = backend.submits().cloned().collect();
        assert_eq!(draws[0].state, Some(RenderState::BASE));
        assert_eq!(draws[1].state, None);
    }
}
