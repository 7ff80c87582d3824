/// Vertex attribute semantic.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Attrib {
    Position,
    TexCoord0,
    Color0,
}

/// Component storage type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttribType {
    Float,
    Uint8,
}

impl AttribType {
    #[inline]
    pub const fn size(self) -> u16 {
        match self {
            AttribType::Float => 4,
            AttribType::Uint8 => 1,
        }
    }
}

/// One attribute inside a [`VertexLayout`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    pub attrib: Attrib,
    pub components: u8,
    pub ty: AttribType,
    pub normalized: bool,
    pub offset: u16,
}

/// Interleaved vertex layout descriptor.
///
/// ```
/// use relay_render::backend::{Attrib, AttribType, VertexLayout};
///
/// let layout = VertexLayout::builder()
///     .add(Attrib::Position, 2, AttribType::Float, false)
///     .add(Attrib::Color0, 4, AttribType::Uint8, true)
///     .build();
/// assert_eq!(layout.stride(), 12);
/// ```
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: u16,
}

impl VertexLayout {
    pub fn builder() -> VertexLayoutBuilder {
        VertexLayoutBuilder::default()
    }

    #[inline]
    pub fn stride(&self) -> u16 {
        self.stride
    }

    #[inline]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct VertexLayoutBuilder {
    layout: VertexLayout,
}

impl VertexLayoutBuilder {
    pub fn add(mut self, attrib: Attrib, components: u8, ty: AttribType, normalized: bool) -> Self {
        let offset = self.layout.stride;
        self.layout.attributes.push(VertexAttribute {
            attrib,
            components,
            ty,
            normalized,
            offset,
        });
        self.layout.stride += u16::from(components) * ty.size();
        self
    }

    pub fn build(self) -> VertexLayout {
        self.layout
    }
}
