use crate::backend::{
    ClearFlags, Encoder, GraphicsBackend, RenderState, TransientIndexBuffer,
    TransientVertexBuffer, ViewClear, ViewId, ViewMode,
};
use crate::coords::Vec2;
use crate::device::DeviceObjects;
use crate::draw::{DrawCmd, DrawData, DrawList, DrawSpan};

use super::{ortho, scissor_for};

/// Per-view configuration for one translation.
#[derive(Debug, Copy, Clone)]
pub struct ViewSetup<'a> {
    pub view: ViewId,
    /// Debug label applied to the view.
    pub name: &'a str,
    /// `0xRRGGBBAA` color (depth 1, stencil 0) the view is cleared to.
    /// `None` leaves the view's clear state alone.
    pub clear: Option<u32>,
}

/// What a translation did. Purely informational.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub lists_submitted: u32,
    /// Lists skipped because the transient pool ran out.
    pub lists_dropped: u32,
    pub draw_calls: u32,
    pub callbacks: u32,
    /// Spans whose clip rect fell entirely outside the framebuffer.
    pub culled: u32,
    /// Spans with no indices.
    pub skipped_empty: u32,
}

/// Translates `draw_data` into drawcalls on `setup.view`.
///
/// Nothing is touched when the display has no area or the device objects
/// are not ready. Lists are translated in order; the first list the
/// transient pool cannot hold ends the frame and it and all later lists
/// are dropped.
pub fn render_draw_data<B: GraphicsBackend>(
    backend: &mut B,
    device: &DeviceObjects,
    setup: ViewSetup<'_>,
    draw_data: &DrawData,
) -> FrameStats {
    let mut stats = FrameStats::default();
    if !draw_data.has_area() {
        return stats;
    }
    if !device.is_ready() {
        log::debug!("device objects not ready; skipping {}", setup.view);
        return stats;
    }

    configure_view(backend, setup, draw_data);
    log::trace!(
        "{}: {} lists, {} vertices, {} indices",
        setup.view,
        draw_data.lists.len(),
        draw_data.total_vtx_count(),
        draw_data.total_idx_count(),
    );

    for (i, list) in draw_data.lists.iter().enumerate() {
        let Some((tvb, tib)) = upload_list(backend, device, list) else {
            let dropped = draw_data.lists.len() - i;
            log::warn!(
                "transient buffers exhausted on {}: dropping {dropped} of {} draw lists",
                setup.view,
                draw_data.lists.len(),
            );
            stats.lists_dropped = u32::try_from(dropped).unwrap_or(u32::MAX);
            break;
        };

        let mut encoder = backend.begin();
        let num_vertices = tvb.size / u32::from(tvb.stride.max(1));
        let mut offset = 0u32;

        for cmd in list.commands() {
            match cmd {
                DrawCmd::Callback(callback) => {
                    callback.invoke(list);
                    stats.callbacks += 1;
                }
                DrawCmd::Draw(span) if span.elem_count == 0 => stats.skipped_empty += 1,
                DrawCmd::Draw(span) => {
                    let target = SpanTarget {
                        view: setup.view,
                        tvb: &tvb,
                        tib: &tib,
                        num_vertices,
                        first_index: offset,
                    };
                    if submit_span(&mut encoder, device, draw_data, span, target) {
                        stats.draw_calls += 1;
                    } else {
                        stats.culled += 1;
                    }
                }
            }
            // Culled and empty spans still consume their indices.
            offset += cmd.elem_count();
        }

        encoder.end();
        stats.lists_submitted += 1;
    }

    stats
}

fn configure_view<B: GraphicsBackend>(backend: &mut B, setup: ViewSetup<'_>, draw_data: &DrawData) {
    let view = setup.view;

    backend.touch(view);
    if let Some(rgba) = setup.clear {
        backend.set_view_clear(
            view,
            ViewClear {
                flags: ClearFlags::COLOR | ClearFlags::DEPTH,
                rgba,
                depth: 1.0,
                stencil: 0,
            },
        );
    }
    backend.set_view_name(view, setup.name);
    backend.set_view_mode(view, ViewMode::Sequential);

    let pos = draw_data.display_pos;
    let size = draw_data.display_size;
    let proj = ortho(
        pos.x,
        pos.x + size.x,
        pos.y + size.y,
        pos.y,
        0.0,
        1000.0,
        backend.caps().homogeneous_depth,
    );
    backend.set_view_transform(view, None, &proj);

    let fb = draw_data.framebuffer_size();
    backend.set_view_rect(view, 0, 0, fb.x as u16, fb.y as u16);
}

/// Reserves transient space for the whole list and copies its geometry in.
/// `None` when either pool cannot hold it.
fn upload_list<B: GraphicsBackend>(
    backend: &mut B,
    device: &DeviceObjects,
    list: &DrawList,
) -> Option<(TransientVertexBuffer, TransientIndexBuffer)> {
    let layout = device.layout();
    let num_vertices = u32::try_from(list.vertices().len()).ok()?;
    let num_indices = u32::try_from(list.indices().len()).ok()?;

    let fits = backend.avail_transient_vertex_buffer(num_vertices, layout) == num_vertices
        && (num_indices == 0 || backend.avail_transient_index_buffer(num_indices) == num_indices);
    if !fits {
        return None;
    }

    let tvb = backend.alloc_transient_vertex_buffer(num_vertices, layout)?;
    let tib = backend.alloc_transient_index_buffer(num_indices)?;

    backend
        .transient_vertex_data_mut(&tvb)
        .copy_from_slice(bytemuck::cast_slice(list.vertices()));
    backend
        .transient_index_data_mut(&tib)
        .copy_from_slice(bytemuck::cast_slice(list.indices()));

    Some((tvb, tib))
}

struct SpanTarget<'a> {
    view: ViewId,
    tvb: &'a TransientVertexBuffer,
    tib: &'a TransientIndexBuffer,
    num_vertices: u32,
    first_index: u32,
}

/// Submits one span. Returns `false` when it was culled.
fn submit_span<E: Encoder>(
    encoder: &mut E,
    device: &DeviceObjects,
    draw_data: &DrawData,
    span: &DrawSpan,
    target: SpanTarget<'_>,
) -> bool {
    let pos: Vec2 = draw_data.display_pos;
    let scale = draw_data.framebuffer_scale;

    let projected = span.clip_rect.project(pos, scale);
    if !projected.overlaps_framebuffer(draw_data.framebuffer_size()) {
        return false;
    }

    let texture = span.texture.decode();
    let mut state = RenderState::BASE;
    if texture.alpha_blend {
        state |= RenderState::BLEND_ALPHA;
    }

    encoder.set_scissor(scissor_for(span.clip_rect, pos, scale));
    encoder.set_state(state);
    encoder.set_texture(0, device.sampler(), texture.handle, texture.sampler);
    encoder.set_vertex_buffer(
        0,
        target.tvb,
        span.vtx_offset,
        target.num_vertices.saturating_sub(span.vtx_offset),
    );
    encoder.set_index_buffer(target.tib, target.first_index, span.elem_count);
    encoder.submit(target.view, device.program());
    true
}
