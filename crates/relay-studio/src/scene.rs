//! Demo geometry for the studio windows.

use std::cell::Cell;
use std::rc::Rc;

use relay_render::coords::{ClipRect, Vec2};
use relay_render::draw::{pack_color, DrawData, DrawList, TextureRef};

use crate::glyphs::GlyphAtlas;

const BACKDROP: u32 = pack_color(0x1e, 0x22, 0x2a, 0xff);
const PANEL: u32 = pack_color(0x2e, 0x34, 0x40, 0xf0);
const ACCENT: u32 = pack_color(0x88, 0xc0, 0xd0, 0xff);
const WARN: u32 = pack_color(0xd0, 0x87, 0x70, 0xc0);
const TEXT: u32 = pack_color(0xec, 0xef, 0xf4, 0xff);

/// Builds per-frame draw data for the main window and its viewports.
#[derive(Debug, Default)]
pub struct Scene {
    callback_hits: Rc<Cell<u64>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Times the frame callback ran.
    pub fn callback_hits(&self) -> u64 {
        self.callback_hits.get()
    }

    /// Main window: backdrop list plus an overlay list with a clipped panel,
    /// a progress bar driven by `t` (seconds) and a status line.
    pub fn main(&self, glyphs: &GlyphAtlas, font: TextureRef, size: Vec2, scale: f32, t: f32, status: &str) -> DrawData {
        let mut data = DrawData::new(Vec2::zero(), size, Vec2::splat(scale));

        let mut back = DrawList::new();
        back.push_texture(font);
        back.add_rect_filled(Vec2::zero(), size, BACKDROP);
        back.pop_texture();
        data.lists.push(back);

        let mut over = DrawList::new();
        over.push_texture(font);

        let panel_min = Vec2::new(24.0, 24.0);
        let panel_max = Vec2::new((size.x - 24.0).max(panel_min.x), 160.0_f32.min(size.y - 24.0).max(panel_min.y));
        over.add_rect_filled(panel_min, panel_max, PANEL);
        add_text(&mut over, glyphs, font, panel_min + Vec2::new(12.0, 10.0), "relay studio", TEXT);
        add_text(&mut over, glyphs, font, panel_min + Vec2::new(12.0, 40.0), status, TEXT);

        // Bar sweeps past its clip rect to show scissoring.
        let bar_min = panel_min + Vec2::new(12.0, 80.0);
        let bar_width = (panel_max.x - bar_min.x - 12.0).max(0.0);
        over.push_clip_rect(ClipRect::from_corners(bar_min, bar_min + Vec2::new(bar_width, 20.0)), true);
        let phase = (t * 0.5).fract();
        let head = bar_min.x + phase * bar_width * 1.5;
        over.add_rect_filled(Vec2::new(head - bar_width * 0.5, bar_min.y), Vec2::new(head, bar_min.y + 20.0), ACCENT);
        over.pop_clip_rect();

        let hits = Rc::clone(&self.callback_hits);
        over.add_callback(0, move |_, _| hits.set(hits.get() + 1));

        // Off-screen on purpose; the translator culls it.
        over.add_rect_filled(Vec2::new(-200.0, -200.0), Vec2::new(-100.0, -100.0), WARN);

        if glyphs.line_height() > 0.0 {
            let atlas_min = Vec2::new(24.0, panel_max.y + 16.0);
            over.add_image(
                font.opaque().point_sampled(),
                atlas_min,
                atlas_min + Vec2::splat(128.0),
                [0.0, 0.0],
                [0.25, 0.25],
                TEXT,
            );
        }

        over.pop_texture();
        data.lists.push(over);
        data
    }

    /// Secondary viewport at `pos` (logical desktop coordinates).
    pub fn viewport(&self, glyphs: &GlyphAtlas, font: TextureRef, pos: Vec2, size: Vec2, scale: f32, label: &str) -> DrawData {
        let mut data = DrawData::new(pos, size, Vec2::splat(scale));

        let mut list = DrawList::new();
        list.push_texture(font);
        list.add_rect_filled(pos, pos + size, PANEL);
        list.add_rect_filled(pos + Vec2::new(8.0, 8.0), pos + Vec2::new((size.x - 8.0).max(8.0), 12.0), ACCENT);
        add_text(&mut list, glyphs, font, pos + Vec2::new(8.0, 20.0), label, TEXT);
        list.pop_texture();

        data.lists.push(list);
        data
    }
}

/// Lays out `text` with its top-left at `origin`. Characters missing from
/// the atlas are skipped.
pub fn add_text(list: &mut DrawList, glyphs: &GlyphAtlas, font: TextureRef, origin: Vec2, text: &str, col: u32) {
    let mut pen = Vec2::new(origin.x, origin.y + glyphs.ascent());
    for c in text.chars() {
        if c == '\n' {
            pen = Vec2::new(origin.x, pen.y + glyphs.line_height());
            continue;
        }
        let Some(glyph) = glyphs.glyph(c) else { continue };
        if glyph.size.x > 0.0 && glyph.size.y > 0.0 {
            let min = pen + glyph.bearing;
            list.add_image(font, min, min + glyph.size, glyph.uv_min, glyph.uv_max, col);
        }
        pen.x += glyph.advance;
    }
}
