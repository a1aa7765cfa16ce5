//! Text rendering resource.
//!
//! Rasterising glyphs and packing them into an atlas is left to an external
//! tool: it hands the font its glyph metrics and atlas through
//! [`Font::set_glyphs`] and [`Font::set_atlas`]. The font itself lays out
//! strings into textured quads and keeps them in dynamic RHI buffers that are
//! reused from one [`Font::set_text`] call to the next.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use anyhow::Context as _;
use cgmath::{Vector2, Vector4};

use crate::{
    resources::{Resource, ResourceInfo, ResourceType, Texture},
    rhi::{
        IndexBuffer, IndexFormat, RhiDevice, RhiError, VertexBuffer, element_count,
        vertex::VertexPosUv,
    },
};

pub const DEFAULT_FONT_SIZE: u32 = 16;
const TAB_WIDTH_IN_SPACES: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Hinting {
    None,
    Light,
    #[default]
    Normal,
}

/// Placement of one character in pixels and in the atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Glyph {
    pub x_left: f32,
    pub x_right: f32,
    pub y_top: f32,
    pub y_bottom: f32,
    pub width: u32,
    pub height: u32,
    pub uv_x_left: f32,
    pub uv_x_right: f32,
    pub uv_y_top: f32,
    pub uv_y_bottom: f32,
    pub descent: f32,
    /// Pen advance after this glyph.
    pub horizontal_offset: f32,
}

#[derive(Debug)]
pub struct Font {
    info: ResourceInfo,
    font_data: Vec<u8>,
    size: u32,
    hinting: Hinting,
    force_autohint: bool,
    color: Vector4<f32>,
    current_text: String,
    char_max_width: u32,
    char_max_height: u32,
    atlas: Option<Arc<Texture>>,
    glyphs: BTreeMap<char, Glyph>,
    vertices: Vec<VertexPosUv>,
    indices: Vec<u32>,
    vertex_buffer: Option<VertexBuffer>,
    index_buffer: Option<IndexBuffer>,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            info: ResourceInfo::default(),
            font_data: Vec::new(),
            size: DEFAULT_FONT_SIZE,
            hinting: Hinting::Normal,
            force_autohint: true,
            color: Vector4::new(1.0, 1.0, 1.0, 1.0),
            current_text: String::new(),
            char_max_width: 0,
            char_max_height: 0,
            atlas: None,
            glyphs: BTreeMap::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            vertex_buffer: None,
            index_buffer: None,
        }
    }
}

impl Font {
    pub fn new(name: &str, size: u32, color: Vector4<f32>) -> Self {
        Self {
            info: ResourceInfo::new(name),
            size: size.max(1),
            color,
            ..Default::default()
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Changes the requested size. Glyphs must be rasterised again afterwards.
    pub fn set_size(&mut self, size: u32) {
        self.size = size.max(1);
    }

    pub fn color(&self) -> Vector4<f32> {
        self.color
    }

    pub fn set_color(&mut self, color: Vector4<f32>) {
        self.color = color;
    }

    pub fn hinting(&self) -> Hinting {
        self.hinting
    }

    pub fn set_hinting(&mut self, hinting: Hinting) {
        self.hinting = hinting;
    }

    pub fn force_autohint(&self) -> bool {
        self.force_autohint
    }

    pub fn set_force_autohint(&mut self, force_autohint: bool) {
        self.force_autohint = force_autohint;
    }

    /// Raw font file, for the rasteriser.
    pub fn font_data(&self) -> &[u8] {
        &self.font_data
    }

    pub fn atlas(&self) -> Option<&Arc<Texture>> {
        self.atlas.as_ref()
    }

    pub fn set_atlas(&mut self, atlas: Arc<Texture>) {
        self.atlas = Some(atlas);
    }

    pub fn glyphs(&self) -> &BTreeMap<char, Glyph> {
        &self.glyphs
    }

    /// Replaces the glyph table and recomputes the largest glyph size.
    pub fn set_glyphs(&mut self, glyphs: BTreeMap<char, Glyph>) {
        self.char_max_width = glyphs.values().map(|g| g.width).max().unwrap_or(0);
        self.char_max_height = glyphs.values().map(|g| g.height).max().unwrap_or(0);
        self.glyphs = glyphs;
    }

    pub fn char_max_width(&self) -> u32 {
        self.char_max_width
    }

    pub fn char_max_height(&self) -> u32 {
        self.char_max_height
    }

    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    pub fn vertex_buffer(&self) -> Option<&VertexBuffer> {
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> Option<&IndexBuffer> {
        self.index_buffer.as_ref()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Lays out `text` starting at `position` (top-left of the first line) and
    /// uploads the quads. Nothing happens when the text did not change.
    pub fn set_text(
        &mut self,
        device: &Arc<dyn RhiDevice>,
        text: &str,
        position: Vector2<f32>,
    ) -> Result<(), RhiError> {
        if text == self.current_text && self.vertex_buffer.is_some() {
            return Ok(());
        }
        self.current_text = text.to_string();
        self.layout_text(position);
        self.update_buffers(device)
    }

    fn layout_text(&mut self, position: Vector2<f32>) {
        self.vertices.clear();
        self.indices.clear();

        let space = self.glyphs.get(&' ').map_or(0.0, |g| g.horizontal_offset);
        let mut pen = position;
        for c in self.current_text.chars() {
            match c {
                '\t' => pen.x += space * TAB_WIDTH_IN_SPACES,
                '\n' => {
                    pen.y -= self.char_max_height as f32;
                    pen.x = position.x;
                }
                ' ' => pen.x += space,
                _ => {
                    let Some(glyph) = self.glyphs.get(&c) else {
                        log::trace!("No glyph for {:?} in {}", c, self.info.name);
                        continue;
                    };
                    let left = pen.x + glyph.x_left;
                    let right = pen.x + glyph.x_right;
                    let top = pen.y - glyph.y_top;
                    let bottom = pen.y - glyph.y_bottom;
                    let quad = |x: f32, y: f32, u: f32, v: f32| VertexPosUv {
                        position: [x, y, 0.0],
                        uv: [u, v],
                    };
                    // Two triangles, top-left / bottom-right diagonal.
                    self.vertices.extend([
                        quad(left, top, glyph.uv_x_left, glyph.uv_y_top),
                        quad(right, bottom, glyph.uv_x_right, glyph.uv_y_bottom),
                        quad(left, bottom, glyph.uv_x_left, glyph.uv_y_bottom),
                        quad(left, top, glyph.uv_x_left, glyph.uv_y_top),
                        quad(right, top, glyph.uv_x_right, glyph.uv_y_top),
                        quad(right, bottom, glyph.uv_x_right, glyph.uv_y_bottom),
                    ]);
                    pen.x += glyph.horizontal_offset;
                }
            }
        }
        self.indices.extend(0..self.vertices.len() as u32);
    }

    /// Writes the laid out quads, growing the buffers when they are too small.
    fn update_buffers(&mut self, device: &Arc<dyn RhiDevice>) -> Result<(), RhiError> {
        if self.vertices.is_empty() {
            return Ok(());
        }
        let count = element_count(self.vertices.len())?;

        if self.vertex_buffer.as_ref().is_none_or(|b| b.vertex_count() < count) {
            self.vertex_buffer = Some(VertexBuffer::new_dynamic::<VertexPosUv>(
                device.clone(),
                count,
            )?);
        }
        if self.index_buffer.as_ref().is_none_or(|b| b.index_count() < count) {
            self.index_buffer = Some(IndexBuffer::new_dynamic(
                device.clone(),
                IndexFormat::Uint32,
                count,
            )?);
        }

        if let Some(buffer) = self.vertex_buffer.as_mut() {
            let mut mapping = buffer.map()?;
            mapping.write(0, &self.vertices)?;
            mapping.unmap()?;
        }
        if let Some(buffer) = self.index_buffer.as_mut() {
            let mut mapping = buffer.map()?;
            mapping.write(0, &self.indices)?;
            mapping.unmap()?;
        }
        Ok(())
    }
}

impl Resource for Font {
    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ResourceInfo {
        &mut self.info
    }

    fn static_type() -> ResourceType {
        ResourceType::Font
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::Font
    }

    fn load_from_file(&mut self, path: &Path) -> anyhow::Result<()> {
        self.font_data = std::fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        Ok(())
    }

    /// Fonts are not written back; their source file is left untouched.
    fn save_to_file(&self, _path: &Path) -> anyhow::Result<()> {
        Ok(())
    }
}
