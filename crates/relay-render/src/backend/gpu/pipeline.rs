use std::num::NonZeroU64;

use crate::backend::{Attrib, AttribType, BackendError, RenderState, VertexAttribute, VertexLayout};

/// Size of the per-view uniform: one column-major `mat4x4<f32>`.
pub(super) const VIEW_UNIFORM_SIZE: u64 = 64;

/// A compiled program and the vertex layout it was created for.
pub(super) struct Program {
    pub module: wgpu::ShaderModule,
    pub vs_entry: &'static str,
    pub fs_entry: &'static str,
    pub stride: u64,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

/// Bind group layouts shared by every pipeline.
pub(super) struct Layouts {
    pub view: wgpu::BindGroupLayout,
    pub texture: wgpu::BindGroupLayout,
    pub pipeline: wgpu::PipelineLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let view = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("relay view bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(VIEW_UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("relay texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("relay pipeline layout"),
            bind_group_layouts: &[&view, &texture],
            immediate_size: 0,
        });

        Self {
            view,
            texture,
            pipeline,
        }
    }
}

fn shader_location(attrib: Attrib) -> u32 {
    match attrib {
        Attrib::Position => 0,
        Attrib::TexCoord0 => 1,
        Attrib::Color0 => 2,
    }
}

fn vertex_format(attr: &VertexAttribute) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    let format = match (attr.ty, attr.components, attr.normalized) {
        (AttribType::Float, 1, _) => F::Float32,
        (AttribType::Float, 2, _) => F::Float32x2,
        (AttribType::Float, 3, _) => F::Float32x3,
        (AttribType::Float, 4, _) => F::Float32x4,
        (AttribType::Uint8, 2, true) => F::Unorm8x2,
        (AttribType::Uint8, 4, true) => F::Unorm8x4,
        (AttribType::Uint8, 2, false) => F::Uint8x2,
        (AttribType::Uint8, 4, false) => F::Uint8x4,
        _ => return None,
    };
    Some(format)
}

/// Translates a [`VertexLayout`] into wgpu vertex attributes.
pub(super) fn vertex_attributes(layout: &VertexLayout) -> Result<Vec<wgpu::VertexAttribute>, BackendError> {
    layout
        .attributes()
        .iter()
        .map(|attr| {
            let format = vertex_format(attr).ok_or_else(|| BackendError::Creation {
                what: "program",
                reason: format!(
                    "no vertex format for {:?} x{} ({:?})",
                    attr.ty, attr.components, attr.attrib
                ),
            })?;
            Ok(wgpu::VertexAttribute {
                format,
                offset: u64::from(attr.offset),
                shader_location: shader_location(attr.attrib),
            })
        })
        .collect()
}

/// Straight (non-premultiplied) alpha: `src * a + dst * (1 - a)` on every
/// channel.
fn alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

fn write_mask(state: RenderState) -> wgpu::ColorWrites {
    let mut mask = wgpu::ColorWrites::empty();
    if state.contains(RenderState::WRITE_RGB) {
        mask |= wgpu::ColorWrites::COLOR;
    }
    if state.contains(RenderState::WRITE_A) {
        mask |= wgpu::ColorWrites::ALPHA;
    }
    mask
}

/// Pipeline-relevant part of a render state. Targets are single-sampled, so
/// `MSAA` has no pipeline of its own.
pub(super) fn pipeline_state(state: RenderState) -> RenderState {
    state - RenderState::MSAA
}

pub(super) fn create_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    program: &Program,
    state: RenderState,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let buffers = [wgpu::VertexBufferLayout {
        array_stride: program.stride,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &program.attributes,
    }];

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("relay ui pipeline"),
        layout: Some(&layouts.pipeline),

        vertex: wgpu::VertexState {
            module: &program.module,
            entry_point: Some(program.vs_entry),
            compilation_options: Default::default(),
            buffers: &buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: &program.module,
            entry_point: Some(program.fs_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: state.blends().then(alpha_blend),
                write_mask: write_mask(state),
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
