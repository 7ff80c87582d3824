use crate::backend::{
    EmbeddedShader, GraphicsBackend, ProgramHandle, TextureFormat, TextureHandle, UniformHandle,
    UniformType, VertexLayout,
};
use crate::draw::{DrawVert, TextureRef};
use crate::error::Result;

use super::FontAtlas;

/// Program used for every GUI drawcall.
pub const UI_SHADER: EmbeddedShader = EmbeddedShader {
    name: "relay ui",
    wgsl: include_str!("shaders/ui.wgsl"),
    vs_entry: "vs_main",
    fs_entry: "fs_main",
};

/// Name of the font sampler uniform.
const SAMPLER_UNIFORM: &str = "s_tex";

/// GPU objects that live across frames.
///
/// The translator refuses to draw until [`is_ready`](Self::is_ready) reports
/// true; [`ensure_ready`](Self::ensure_ready) is the once-per-frame hook that
/// gets it there.
#[derive(Debug)]
pub struct DeviceObjects {
    program: ProgramHandle,
    layout: VertexLayout,
    sampler: UniformHandle,
    font_texture: TextureHandle,
    ready: bool,
}

impl Default for DeviceObjects {
    fn default() -> Self {
        Self {
            program: ProgramHandle::INVALID,
            layout: DrawVert::layout(),
            sampler: UniformHandle::INVALID,
            font_texture: TextureHandle::INVALID,
            ready: false,
        }
    }
}

impl DeviceObjects {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[inline]
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    #[inline]
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    #[inline]
    pub fn sampler(&self) -> UniformHandle {
        self.sampler
    }

    #[inline]
    pub fn font_texture(&self) -> TextureHandle {
        self.font_texture
    }

    /// Creates the program, sampler uniform and font texture, then publishes
    /// the font texture on `atlas`.
    ///
    /// No-op when already ready. Objects left over from an earlier failed
    /// attempt are destroyed first, so retrying every frame does not leak.
    pub fn init<B: GraphicsBackend>(&mut self, backend: &mut B, atlas: &mut dyn FontAtlas) -> Result<()> {
        if self.ready {
            log::debug!("device objects already initialized");
            return Ok(());
        }
        self.release(backend, None);

        self.program = backend.create_program(&UI_SHADER, &self.layout)?;
        self.sampler = backend.create_uniform(SAMPLER_UNIFORM, UniformType::Sampler)?;

        let pixels = atlas.rgba32_pixels();
        let (width, height) = (pixels.width, pixels.height);
        self.font_texture = backend.create_texture_2d(width, height, TextureFormat::Rgba8, pixels.data)?;

        atlas.set_texture_id(Some(TextureRef::from_handle(self.font_texture)));
        self.ready = true;
        log::debug!(
            "device objects ready (program {:?}, font texture {:?} {width}x{height})",
            self.program,
            self.font_texture
        );
        Ok(())
    }

    /// Destroys everything [`init`](Self::init) created.
    ///
    /// Clears the atlas texture id only if it still points at our texture.
    /// Safe to call when never initialized.
    pub fn teardown<B: GraphicsBackend>(&mut self, backend: &mut B, atlas: Option<&mut dyn FontAtlas>) {
        self.release(backend, atlas);
        self.ready = false;
    }

    /// Calls [`init`](Self::init) when not ready. Returns readiness.
    pub fn ensure_ready<B: GraphicsBackend>(&mut self, backend: &mut B, atlas: &mut dyn FontAtlas) -> bool {
        if !self.ready {
            if let Err(e) = self.init(backend, atlas) {
                log::error!("failed to create device objects: {e}");
            }
        }
        self.ready
    }

    fn release<B: GraphicsBackend>(&mut self, backend: &mut B, atlas: Option<&mut dyn FontAtlas>) {
        if self.program.is_valid() {
            backend.destroy_program(self.program);
            self.program = ProgramHandle::INVALID;
        }

        if self.sampler.is_valid() {
            backend.destroy_uniform(self.sampler);
            self.sampler = UniformHandle::INVALID;
        }

        if let Some(atlas) = atlas {
            let ours = Some(TextureRef::from_handle(self.font_texture));
            if self.font_texture.is_valid() && atlas.texture_id() == ours {
                atlas.set_texture_id(None);
            }
        }

        if self.font_texture.is_valid() {
            backend.destroy_texture(self.font_texture);
            self.font_texture = TextureHandle::INVALID;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, RecordingBackend};
    use crate::device::RgbaAtlas;

    #[test]
    fn init_publishes_font_texture_with_flags_clear() {
        let mut backend = RecordingBackend::new();
        let mut atlas = RgbaAtlas::white();
        let mut objects = DeviceObjects::new();

        objects.init(&mut backend, &mut atlas).unwrap();

        assert!(objects.is_ready());
        let id = atlas.texture_id().unwrap();
        assert_eq!(id.raw() & TextureRef::FLAGS, 0);
        assert_eq!(id.decode().handle, objects.font_texture());
        assert!(backend.calls().contains(&Call::CreateTexture {
            handle: objects.font_texture(),
            width: 1,
            height: 1,
        }));
    }

    #[test]
    fn teardown_before_init_is_a_no_op() {
        let mut backend = RecordingBackend::new();
        let mut atlas = RgbaAtlas::white();
        let mut objects = DeviceObjects::new();

        objects.teardown(&mut backend, Some(&mut atlas));

        assert!(!objects.is_ready());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn second_init_does_not_create_another_texture() {
        let mut backend = RecordingBackend::new();
        let mut atlas = RgbaAtlas::white();
        let mut objects = DeviceObjects::new();

        objects.init(&mut backend, &mut atlas).unwrap();
        objects.init(&mut backend, &mut atlas).unwrap();

        assert_eq!(backend.live_textures(), 1);
        assert_eq!(backend.live_programs(), 1);
    }

    #[test]
    fn teardown_clears_atlas_id_only_if_ours() {
        let mut backend = RecordingBackend::new();
        let mut atlas = RgbaAtlas::white();
        let mut objects = DeviceObjects::new();
        objects.init(&mut backend, &mut atlas).unwrap();

        let foreign = Some(TextureRef(77));
        atlas.set_texture_id(foreign);
        objects.teardown(&mut backend, Some(&mut atlas));
        assert_eq!(atlas.texture_id(), foreign);

        objects.init(&mut backend, &mut atlas).unwrap();
        objects.teardown(&mut backend, Some(&mut atlas));
        assert_eq!(atlas.texture_id(), None);
        assert_eq!(backend.live_textures(), 0);
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(backend.live_uniforms(), 0);
    }

    #[test]
    fn texture_failure_leaves_objects_not_ready() {
        let mut backend = RecordingBackend::new();
        backend.fail_textures = true;
        let mut atlas = RgbaAtlas::white();
        let mut objects = DeviceObjects::new();

        assert!(!objects.ensure_ready(&mut backend, &mut atlas));
        assert_eq!(atlas.texture_id(), None);

        // A retry next frame cleans up the program from the failed attempt.
        assert!(!objects.ensure_ready(&mut backend, &mut atlas));
        assert_eq!(backend.live_programs(), 1);

        backend.fail_textures = false;
        assert!(objects.ensure_ready(&mut backend, &mut atlas));
        assert_eq!(backend.live_textures(), 1);
    }

    #[test]
    fn ensure_ready_initializes_exactly_once() {
        let mut backend = RecordingBackend::new();
        let mut atlas = RgbaAtlas::white();
        let mut objects = DeviceObjects::new();

        assert!(objects.ensure_ready(&mut backend, &mut atlas));
        backend.clear_calls();
        assert!(objects.ensure_ready(&mut backend, &mut atlas));
        assert!(backend.calls().is_empty());
    }
}
