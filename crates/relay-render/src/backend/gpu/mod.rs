//! wgpu implementation of [`GraphicsBackend`].
//!
//! - views are numbered slots; a view without a frame buffer draws to the
//!   main surface
//! - frame buffers are extra surfaces created from native window handles
//! - transient geometry is staged on the CPU and uploaded once per frame
//!
//! Targets carry no depth attachment, so depth clears are ignored.

mod init;
mod pipeline;
mod slots;
mod surface;

use std::collections::HashMap;

use anyhow::{Context, Result};
use glam::Mat4;

use super::{
    BackendError, Caps, ClearFlags, EmbeddedShader, Encoder, FrameBufferHandle, GraphicsBackend,
    ProgramHandle, RenderState, SamplerMode, ScissorRect, TextureFormat, TextureHandle,
    TransientIndexBuffer, TransientPool, TransientVertexBuffer, UniformHandle, UniformType,
    VertexLayout, ViewClear, ViewId, ViewMode,
};
use pipeline::{Layouts, Program, VIEW_UNIFORM_SIZE};
use slots::Slots;
use surface::Target;

pub use init::WgpuInit;

/// Native window token accepted by [`WgpuBackend`].
pub type NativeWindow = wgpu::SurfaceTarget<'static>;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; the target is skipped this frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Encoder state pending the next submit.
#[derive(Debug, Copy, Clone, Default)]
struct Pending {
    state: Option<RenderState>,
    scissor: Option<ScissorRect>,
    texture: Option<(TextureHandle, SamplerMode)>,
    base_vertex: Option<u32>,
    indices: Option<(u32, u32)>,
}

#[derive(Debug, Copy, Clone)]
struct DrawItem {
    program: ProgramHandle,
    state: RenderState,
    scissor: Option<ScissorRect>,
    texture: Option<(TextureHandle, SamplerMode)>,
    base_vertex: u32,
    first_index: u32,
    num_indices: u32,
}

struct ViewSlot {
    name: String,
    clear: Option<ViewClear>,
    transform: Mat4,
    rect: ScissorRect,
    frame_buffer: FrameBufferHandle,
    touched: bool,
    draws: Vec<DrawItem>,
    uniform: Option<(wgpu::Buffer, wgpu::BindGroup)>,
}

impl Default for ViewSlot {
    fn default() -> Self {
        Self {
            name: String::new(),
            clear: None,
            transform: Mat4::IDENTITY,
            rect: ScissorRect::default(),
            frame_buffer: FrameBufferHandle::INVALID,
            touched: false,
            draws: Vec::new(),
            uniform: None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum TargetKey {
    Main,
    FrameBuffer(FrameBufferHandle),
}

struct Acquired {
    key: TargetKey,
    frame: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    size: (u32, u32),
}

type PipelineKey = (ProgramHandle, RenderState, wgpu::TextureFormat);
type TextureKey = (TextureHandle, SamplerMode);

/// Retained-mode backend on top of wgpu.
pub struct WgpuBackend {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    init: WgpuInit,

    main: Target,
    frame_buffers: Slots<Target>,

    layouts: Layouts,
    linear_sampler: wgpu::Sampler,
    point_sampler: wgpu::Sampler,
    white: GpuTexture,

    programs: Slots<Program>,
    uniforms: Slots<String>,
    textures: Slots<GpuTexture>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    bind_groups: HashMap<TextureKey, wgpu::BindGroup>,

    views: Vec<ViewSlot>,

    vertices: TransientPool,
    indices: TransientPool,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,

    frame: u64,
    surface_action: Option<SurfaceErrorAction>,
}

impl WgpuBackend {
    /// Creates the device and configures the main surface for `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: impl Into<NativeWindow>, width: u32, height: u32, init: WgpuInit) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.into())
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("relay-render device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let config = surface_config(&init, &caps, format, width, height);
        surface.configure(&device, &config);
        log::info!("main surface {width}x{height} {format:?}");

        let layouts = Layouts::new(&device);
        let linear_sampler = create_sampler(&device, wgpu::FilterMode::Linear);
        let point_sampler = create_sampler(&device, wgpu::FilterMode::Nearest);
        let white = upload_texture(&device, &queue, 1, 1, &[0xff; 4]);

        // Upload sizes must be multiples of COPY_BUFFER_ALIGNMENT.
        let vertices = TransientPool::new(init.transient_vertex_bytes.next_multiple_of(4) as usize);
        let indices = TransientPool::new(init.transient_index_bytes.next_multiple_of(4) as usize);
        let vertex_buffer = create_pool_buffer(&device, "relay transient vbo", &vertices, wgpu::BufferUsages::VERTEX);
        let index_buffer = create_pool_buffer(&device, "relay transient ibo", &indices, wgpu::BufferUsages::INDEX);

        let mut views = Vec::new();
        views.resize_with(usize::from(init.max_view_id) + 1, ViewSlot::default);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            init,
            main: Target { surface, config },
            frame_buffers: Slots::default(),
            layouts,
            linear_sampler,
            point_sampler,
            white,
            programs: Slots::default(),
            uniforms: Slots::default(),
            textures: Slots::default(),
            pipelines: HashMap::new(),
            bind_groups: HashMap::new(),
            views,
            vertices,
            indices,
            vertex_buffer,
            index_buffer,
            frame: 0,
            surface_action: None,
        })
    }

    /// Returns the main surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.main.config.format
    }

    /// Returns the main surface size (physical pixels).
    pub fn size(&self) -> (u32, u32) {
        self.main.size()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Reconfigures the main surface after a window resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.main.resize(&self.device, width, height);
    }

    /// Surface error reaction recorded by the last [`frame`](GraphicsBackend::frame)
    /// for the main surface, if any.
    pub fn take_surface_action(&mut self) -> Option<SurfaceErrorAction> {
        self.surface_action.take()
    }

    fn view_mut(&mut self, view: ViewId) -> Option<&mut ViewSlot> {
        let slot = self.views.get_mut(usize::from(view.get()));
        if slot.is_none() {
            log::warn!("{view} exceeds the configured view range");
        }
        slot
    }

    fn upload_transients(&mut self) {
        let vertices = self.vertices.used_padded(4);
        if !vertices.is_empty() {
            self.queue.write_buffer(&self.vertex_buffer, 0, vertices);
        }
        let indices = self.indices.used_padded(4);
        if !indices.is_empty() {
            self.queue.write_buffer(&self.index_buffer, 0, indices);
        }
    }

    fn acquire(&mut self, key: TargetKey) -> Option<Acquired> {
        let target = match key {
            TargetKey::Main => &self.main,
            TargetKey::FrameBuffer(fb) => match self.frame_buffers.get(fb.index()) {
                Some(t) => t,
                None => {
                    log::trace!("frame buffer {fb:?} is gone; views on it are skipped");
                    return None;
                }
            },
        };

        let action = match target.surface.get_current_texture() {
            Ok(frame) => {
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                return Some(Acquired {
                    key,
                    frame,
                    view,
                    format: target.config.format,
                    size: target.size(),
                });
            }
            Err(err) => {
                let action = surface::map_surface_error(target, &self.device, err);
                log::debug!("surface {key:?} unavailable ({action:?})");
                action
            }
        };

        if action == SurfaceErrorAction::Fatal {
            log::error!("surface {key:?} reported a fatal error");
        }
        if key == TargetKey::Main {
            self.surface_action = Some(action);
        }
        None
    }

    /// Creates everything the view's drawcalls need for `format`.
    fn prepare_view(&mut self, idx: usize, format: wgpu::TextureFormat) {
        if self.views[idx].uniform.is_none() {
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("relay view ubo"),
                size: VIEW_UNIFORM_SIZE,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("relay view bind group"),
                layout: &self.layouts.view,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            self.views[idx].uniform = Some((buffer, bind_group));
        }
        if let Some((buffer, _)) = &self.views[idx].uniform {
            let cols = self.views[idx].transform.to_cols_array();
            self.queue.write_buffer(buffer, 0, bytemuck::cast_slice(&cols));
        }

        let needs: Vec<_> = self.views[idx]
            .draws
            .iter()
            .map(|d| (d.program, pipeline::pipeline_state(d.state), d.texture))
            .collect();
        for (program, state, texture) in needs {
            self.ensure_pipeline((program, state, format));
            let key = self.texture_key(texture);
            self.ensure_bind_group(key);
        }
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let (handle, state, format) = key;
        let Some(program) = self.programs.get(handle.index()) else {
            return;
        };
        let pipeline = pipeline::create_pipeline(&self.device, &self.layouts, program, state, format);
        log::debug!("pipeline for {handle:?} {state:?} {format:?}");
        self.pipelines.insert(key, pipeline);
    }

    /// Bind-group key for a drawcall's texture; unbound or destroyed
    /// textures fall back to a white texel.
    fn texture_key(&self, texture: Option<TextureKey>) -> TextureKey {
        let (handle, mode) = texture.unwrap_or((TextureHandle::INVALID, SamplerMode::Default));
        if self.textures.get(handle.index()).is_some() {
            (handle, mode)
        } else {
            (TextureHandle::INVALID, mode)
        }
    }

    fn ensure_bind_group(&mut self, key: TextureKey) {
        if self.bind_groups.contains_key(&key) {
            return;
        }
        let view = match key.0 {
            h if h.is_valid() => match self.textures.get(h.index()) {
                Some(t) => &t.view,
                None => return,
            },
            _ => &self.white.view,
        };
        let sampler = match key.1 {
            SamplerMode::Default => &self.linear_sampler,
            SamplerMode::Point => &self.point_sampler,
        };
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("relay texture bind group"),
            layout: &self.layouts.texture,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        self.bind_groups.insert(key, bind_group);
    }

    fn encode_view(&self, encoder: &mut wgpu::CommandEncoder, idx: usize, target: &Acquired) {
        let slot = &self.views[idx];
        let load = match slot.clear {
            Some(clear) if clear.flags.contains(ClearFlags::COLOR) => {
                let [r, g, b, a] = clear.color_f64();
                wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a })
            }
            _ => wgpu::LoadOp::Load,
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: (!slot.name.is_empty()).then_some(slot.name.as_str()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let (tw, th) = target.size;
        let full = (0, 0, tw, th);
        let viewport = clamp_to_target(slot.rect, tw, th).unwrap_or(full);
        let Some((_, view_bind_group)) = &slot.uniform else {
            return;
        };

        rpass.set_viewport(
            viewport.0 as f32,
            viewport.1 as f32,
            viewport.2 as f32,
            viewport.3 as f32,
            0.0,
            1.0,
        );
        rpass.set_bind_group(0, view_bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

        for draw in &slot.draws {
            let key = (draw.program, pipeline::pipeline_state(draw.state), target.format);
            let Some(pipeline) = self.pipelines.get(&key) else {
                continue;
            };
            let Some(bind_group) = self.bind_groups.get(&self.texture_key(draw.texture)) else {
                continue;
            };
            // wgpu rejects scissors that leave the target.
            let scissor = match draw.scissor {
                Some(s) => match clamp_to_target(s, tw, th) {
                    Some(r) => r,
                    None => continue,
                },
                None => viewport,
            };
            let Ok(base_vertex) = i32::try_from(draw.base_vertex) else {
                continue;
            };

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(1, bind_group, &[]);
            rpass.set_scissor_rect(scissor.0, scissor.1, scissor.2, scissor.3);
            rpass.draw_indexed(draw.first_index..draw.first_index + draw.num_indices, base_vertex, 0..1);
        }
    }
}

fn surface_config(
    init: &WgpuInit,
    caps: &wgpu::SurfaceCapabilities,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> wgpu::SurfaceConfiguration {
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: init.present_mode,
        alpha_mode: surface::choose_alpha_mode(caps, init.alpha_mode),
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    }
}

fn create_sampler(device: &wgpu::Device, filter: wgpu::FilterMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("relay sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

fn create_pool_buffer(
    device: &wgpu::Device,
    label: &str,
    pool: &TransientPool,
    usage: wgpu::BufferUsages,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (pool.capacity() as u64).max(4),
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32, rgba: &[u8]) -> GpuTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("relay texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        _texture: texture,
        view,
    }
}

/// Clips `rect` to a `tw` x `th` target. `None` when nothing is left.
fn clamp_to_target(rect: ScissorRect, tw: u32, th: u32) -> Option<(u32, u32, u32, u32)> {
    let x = u32::from(rect.x).min(tw);
    let y = u32::from(rect.y).min(th);
    let w = u32::from(rect.width).min(tw - x);
    let h = u32::from(rect.height).min(th - y);
    (w > 0 && h > 0).then_some((x, y, w, h))
}

/// Encoder produced by [`WgpuBackend::begin`].
pub struct WgpuEncoder<'a> {
    backend: &'a mut WgpuBackend,
    pending: Pending,
}

impl Encoder for WgpuEncoder<'_> {
    fn set_scissor(&mut self, rect: ScissorRect) {
        self.pending.scissor = Some(rect);
    }

    fn set_state(&mut self, state: RenderState) {
        self.pending.state = Some(state);
    }

    fn set_texture(
        &mut self,
        stage: u8,
        sampler: UniformHandle,
        texture: TextureHandle,
        mode: SamplerMode,
    ) {
        debug_assert_eq!(stage, 0, "only texture stage 0 is bound");
        if self.backend.uniforms.get(sampler.index()).is_none() {
            log::trace!("set_texture with unknown sampler uniform {sampler:?}");
        }
        self.pending.texture = Some((texture, mode));
    }

    fn set_vertex_buffer(&mut self, _stream: u8, tvb: &TransientVertexBuffer, start: u32, _num: u32) {
        self.pending.base_vertex = Some(tvb.start_vertex + start);
    }

    fn set_index_buffer(&mut self, tib: &TransientIndexBuffer, first: u32, num: u32) {
        self.pending.indices = Some((tib.start_index + first, num));
    }

    fn submit(&mut self, view: ViewId, program: ProgramHandle) {
        let pending = std::mem::take(&mut self.pending);
        let Some((first_index, num_indices)) = pending.indices else {
            log::trace!("submit to {view} without indices ignored");
            return;
        };
        let Some(slot) = self.backend.view_mut(view) else {
            return;
        };
        slot.touched = true;
        slot.draws.push(DrawItem {
            program,
            state: pending.state.unwrap_or(RenderState::BASE),
            scissor: pending.scissor,
            texture: pending.texture,
            base_vertex: pending.base_vertex.unwrap_or(0),
            first_index,
            num_indices,
        });
    }

    fn end(self) {}
}

impl GraphicsBackend for WgpuBackend {
    type NativeWindow = NativeWindow;
    type Encoder<'a> = WgpuEncoder<'a>;

    fn caps(&self) -> Caps {
        Caps {
            homogeneous_depth: false,
            max_view_id: self.init.max_view_id,
        }
    }

    fn touch(&mut self, view: ViewId) {
        if let Some(slot) = self.view_mut(view) {
            slot.touched = true;
        }
    }

    fn set_view_clear(&mut self, view: ViewId, clear: ViewClear) {
        if let Some(slot) = self.view_mut(view) {
            slot.clear = Some(clear);
        }
    }

    fn set_view_name(&mut self, view: ViewId, name: &str) {
        if let Some(slot) = self.view_mut(view) {
            if slot.name != name {
                slot.name = name.to_string();
            }
        }
    }

    /// Drawcalls always execute in submission order, so both modes behave
    /// as [`ViewMode::Sequential`].
    fn set_view_mode(&mut self, view: ViewId, mode: ViewMode) {
        log::trace!("{view} mode {mode:?}");
    }

    fn set_view_transform(&mut self, view: ViewId, view_mtx: Option<&Mat4>, proj: &Mat4) {
        if let Some(slot) = self.view_mut(view) {
            slot.transform = *proj * view_mtx.copied().unwrap_or(Mat4::IDENTITY);
        }
    }

    fn set_view_rect(&mut self, view: ViewId, x: u16, y: u16, width: u16, height: u16) {
        if let Some(slot) = self.view_mut(view) {
            slot.rect = ScissorRect::new(x, y, width, height);
        }
    }

    fn set_view_frame_buffer(&mut self, view: ViewId, fb: FrameBufferHandle) {
        if let Some(slot) = self.view_mut(view) {
            slot.frame_buffer = fb;
        }
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
        self.vertices.alloc_vertices(num, layout)
    }

    fn alloc_transient_index_buffer(&mut self, num: u32) -> Option<TransientIndexBuffer> {
        self.indices.alloc_indices(num)
    }

    fn transient_vertex_data_mut(&mut self, tvb: &TransientVertexBuffer) -> &mut [u8] {
        self.vertices.region_mut(tvb.offset, tvb.size)
    }

    fn transient_index_data_mut(&mut self, tib: &TransientIndexBuffer) -> &mut [u8] {
        self.indices.region_mut(tib.offset, tib.size)
    }

    fn create_program(
        &mut self,
        shader: &EmbeddedShader,
        layout: &VertexLayout,
    ) -> Result<ProgramHandle, BackendError> {
        if layout.is_empty() {
            return Err(BackendError::Creation {
                what: "program",
                reason: "empty vertex layout".to_string(),
            });
        }
        let attributes = pipeline::vertex_attributes(layout)?;
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(shader.name),
            source: wgpu::ShaderSource::Wgsl(shader.wgsl.into()),
        });
        let program = Program {
            module,
            vs_entry: shader.vs_entry,
            fs_entry: shader.fs_entry,
            stride: u64::from(layout.stride()),
            attributes,
        };
        let idx = self
            .programs
            .insert(program)
            .ok_or(BackendError::HandlesExhausted("program"))?;
        Ok(ProgramHandle(idx))
    }

    fn create_uniform(&mut self, name: &str, ty: UniformType) -> Result<UniformHandle, BackendError> {
        log::trace!("uniform `{name}` ({ty:?})");
        let idx = self
            .uniforms
            .insert(name.to_string())
            .ok_or(BackendError::HandlesExhausted("uniform"))?;
        Ok(UniformHandle(idx))
    }

    fn create_texture_2d(
        &mut self,
        width: u16,
        height: u16,
        format: TextureFormat,
        data: &[u8],
    ) -> Result<TextureHandle, BackendError> {
        let (w, h) = (u32::from(width), u32::from(height));
        let max = self.device.limits().max_texture_dimension_2d;
        if w == 0 || h == 0 || w > max || h > max {
            return Err(BackendError::InvalidSize {
                what: "texture",
                width: w,
                height: h,
            });
        }
        let expected = usize::from(width) * usize::from(height) * format.bytes_per_texel();
        if data.len() != expected {
            return Err(BackendError::DataSize {
                what: "texture",
                expected,
                actual: data.len(),
            });
        }

        let texture = upload_texture(&self.device, &self.queue, w, h, data);
        let idx = self
            .textures
            .insert(texture)
            .ok_or(BackendError::HandlesExhausted("texture"))?;
        Ok(TextureHandle(idx))
    }

    fn create_frame_buffer(
        &mut self,
        native: NativeWindow,
        width: u16,
        height: u16,
    ) -> Result<FrameBufferHandle, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidSize {
                what: "frame buffer",
                width: width.into(),
                height: height.into(),
            });
        }
        let surface = self
            .instance
            .create_surface(native)
            .map_err(|e| BackendError::Creation {
                what: "frame buffer",
                reason: e.to_string(),
            })?;
        let caps = surface.get_capabilities(&self.adapter);
        let format = surface::choose_surface_format(&caps, self.init.prefer_srgb).ok_or_else(|| {
            BackendError::Creation {
                what: "frame buffer",
                reason: "surface reports no supported formats".to_string(),
            }
        })?;
        let config = surface_config(&self.init, &caps, format, width.into(), height.into());
        surface.configure(&self.device, &config);

        let idx = self
            .frame_buffers
            .insert(Target { surface, config })
            .ok_or(BackendError::HandlesExhausted("frame buffer"))?;
        Ok(FrameBufferHandle(idx))
    }

    fn destroy_program(&mut self, handle: ProgramHandle) {
        if self.programs.remove(handle.index()).is_some() {
            self.pipelines.retain(|(p, _, _), _| *p != handle);
        }
    }

    fn destroy_uniform(&mut self, handle: UniformHandle) {
        self.uniforms.remove(handle.index());
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        if self.textures.remove(handle.index()).is_some() {
            self.bind_groups.retain(|(t, _), _| *t != handle);
        }
    }

    fn destroy_frame_buffer(&mut self, handle: FrameBufferHandle) {
        self.frame_buffers.remove(handle.index());
    }

    fn begin(&mut self) -> WgpuEncoder<'_> {
        WgpuEncoder {
            backend: self,
            pending: Pending::default(),
        }
    }

    fn frame(&mut self) -> u64 {
        let completed = self.frame;
        self.frame += 1;

        self.upload_transients();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("relay frame encoder"),
            });
        let mut acquired: Vec<Acquired> = Vec::new();
        let mut unavailable: Vec<TargetKey> = Vec::new();

        for idx in 0..self.views.len() {
            if !self.views[idx].touched {
                continue;
            }
            let fb = self.views[idx].frame_buffer;
            let key = if fb.is_valid() {
                TargetKey::FrameBuffer(fb)
            } else {
                TargetKey::Main
            };

            let pos = match acquired.iter().position(|a| a.key == key) {
                Some(pos) => pos,
                None if unavailable.contains(&key) => continue,
                None => match self.acquire(key) {
                    Some(target) => {
                        acquired.push(target);
                        acquired.len() - 1
                    }
                    None => {
                        unavailable.push(key);
                        continue;
                    }
                },
            };

            self.prepare_view(idx, acquired[pos].format);
            self.encode_view(&mut encoder, idx, &acquired[pos]);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        for target in acquired {
            target.frame.present();
        }

        for slot in &mut self.views {
            slot.touched = false;
            slot.draws.clear();
        }
        self.vertices.reset();
        self.indices.reset();

        completed
    }
}
