use std::sync::Arc;

use crate::rhi::{
    BufferKind, BufferLayout, BufferUsage, RhiDevice, RhiError, element_count,
    buffer::{BufferMapping, GpuBuffer},
};

/// A vertex buffer whose format is chosen at the call site.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use kestrel_ngin::rhi::{MemoryDevice, VertexBuffer, vertex::VertexPosUv};
/// let device = Arc::new(MemoryDevice::new());
/// let quad = [VertexPosUv::default(); 4];
/// let buffer = VertexBuffer::new(device, &quad).unwrap();
/// assert_eq!(buffer.stride() as usize, std::mem::size_of::<VertexPosUv>());
/// ```
#[derive(Debug)]
pub struct VertexBuffer {
    buffer: GpuBuffer,
}

impl VertexBuffer {
    /// Static buffer holding `vertices`. Stride is `size_of::<T>()`.
    pub fn new<T: bytemuck::Pod>(
        device: Arc<dyn RhiDevice>,
        vertices: &[T],
    ) -> Result<Self, RhiError> {
        let layout = BufferLayout::of::<T>(element_count(vertices.len())?, BufferUsage::Static);
        Self::with_layout(device, layout, Some(bytemuck::cast_slice(vertices)))
    }

    /// Dynamic buffer with room for `count` vertices of `T`, zero initialised.
    pub fn new_dynamic<T: bytemuck::Pod>(
        device: Arc<dyn RhiDevice>,
        count: u32,
    ) -> Result<Self, RhiError> {
        Self::with_layout(device, BufferLayout::of::<T>(count, BufferUsage::Dynamic), None)
    }

    /// Creation from an explicit layout descriptor.
    pub fn with_layout(
        device: Arc<dyn RhiDevice>,
        layout: BufferLayout,
        contents: Option<&[u8]>,
    ) -> Result<Self, RhiError> {
        let buffer = GpuBuffer::create(
            device,
            BufferKind::Vertex,
            layout,
            contents,
            Some("Vertex Buffer"),
        )?;
        Ok(Self { buffer })
    }

    pub fn map(&mut self) -> Result<BufferMapping<'_>, RhiError> {
        self.buffer.map()
    }

    pub fn stride(&self) -> u32 {
        self.buffer.layout().stride
    }

    pub fn vertex_count(&self) -> u32 {
        self.buffer.layout().count
    }

    pub fn size(&self) -> u64 {
        self.buffer.layout().size()
    }

    pub fn is_dynamic(&self) -> bool {
        self.buffer.layout().is_dynamic()
    }

    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }
}
