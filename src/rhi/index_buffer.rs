use std::sync::Arc;

use crate::rhi::{
    BufferKind, BufferLayout, BufferUsage, RhiDevice, RhiError, element_count,
    buffer::{BufferMapping, GpuBuffer},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

impl IndexFormat {
    pub fn stride(self) -> u32 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

impl From<IndexFormat> for wgpu::IndexFormat {
    fn from(format: IndexFormat) -> Self {
        match format {
            IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
            IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
        }
    }
}

/// Index data for indexed draws.
#[derive(Debug)]
pub struct IndexBuffer {
    buffer: GpuBuffer,
    format: IndexFormat,
}

impl IndexBuffer {
    pub fn new(device: Arc<dyn RhiDevice>, indices: &[u32]) -> Result<Self, RhiError> {
        Self::create(
            device,
            IndexFormat::Uint32,
            element_count(indices.len())?,
            BufferUsage::Static,
            Some(bytemuck::cast_slice(indices)),
        )
    }

    pub fn new_u16(device: Arc<dyn RhiDevice>, indices: &[u16]) -> Result<Self, RhiError> {
        Self::create(
            device,
            IndexFormat::Uint16,
            element_count(indices.len())?,
            BufferUsage::Static,
            Some(bytemuck::cast_slice(indices)),
        )
    }

    pub fn new_dynamic(
        device: Arc<dyn RhiDevice>,
        format: IndexFormat,
        count: u32,
    ) -> Result<Self, RhiError> {
        Self::create(device, format, count, BufferUsage::Dynamic, None)
    }

    fn create(
        device: Arc<dyn RhiDevice>,
        format: IndexFormat,
        count: u32,
        usage: BufferUsage,
        contents: Option<&[u8]>,
    ) -> Result<Self, RhiError> {
        let layout = BufferLayout::new(format.stride(), count, usage);
        let buffer = GpuBuffer::create(
            device,
            BufferKind::Index,
            layout,
            contents,
            Some("Index Buffer"),
        )?;
        Ok(Self { buffer, format })
    }

    pub fn map(&mut self) -> Result<BufferMapping<'_>, RhiError> {
        self.buffer.map()
    }

    pub fn format(&self) -> IndexFormat {
        self.format
    }

    pub fn index_count(&self) -> u32 {
        self.buffer.layout().count
    }

    pub fn is_dynamic(&self) -> bool {
        self.buffer.layout().is_dynamic()
    }

    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }
}
