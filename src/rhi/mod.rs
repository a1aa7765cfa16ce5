//! Rendering hardware interface.
//!
//! The RHI hides the concrete graphics API behind [`RhiDevice`]. Buffers are
//! created from an explicit [`BufferLayout`] (stride, element count, usage) so
//! the vertex format stays typed at the call site while the backend only sees
//! bytes.
//!
//! - `buffer` owns the device allocation and the map/unmap guard
//! - `vertex_buffer` / `index_buffer` are the typed front-ends
//! - `vertex` contains the engine's vertex formats and their wgpu layouts
//! - `wgpu_device` is the GPU backend, `memory_device` keeps buffers in RAM

use std::fmt::Debug;

pub mod buffer;
pub mod index_buffer;
pub mod memory_device;
pub mod vertex;
pub mod vertex_buffer;
pub mod wgpu_device;

pub use buffer::{BufferMapping, GpuBuffer};
pub use index_buffer::{IndexBuffer, IndexFormat};
pub use memory_device::MemoryDevice;
pub use vertex_buffer::VertexBuffer;
pub use wgpu_device::WgpuDevice;

/// Whether a buffer may be written after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Contents are uploaded once at creation.
    Static,
    /// Contents can be rewritten through [`GpuBuffer::map`].
    Dynamic,
}

/// What the buffer is bound as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Explicit description of a buffer's memory layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferLayout {
    /// Size of one element in bytes.
    pub stride: u32,
    /// Number of elements.
    pub count: u32,
    pub usage: BufferUsage,
}

impl BufferLayout {
    pub fn new(stride: u32, count: u32, usage: BufferUsage) -> Self {
        Self {
            stride,
            count,
            usage,
        }
    }

    /// Layout for `count` elements of `T`.
    pub fn of<T>(count: u32, usage: BufferUsage) -> Self {
        Self::new(std::mem::size_of::<T>() as u32, count, usage)
    }

    /// Total size in bytes (`stride * count`).
    pub fn size(&self) -> u64 {
        u64::from(self.stride) * u64::from(self.count)
    }

    pub fn is_dynamic(&self) -> bool {
        self.usage == BufferUsage::Dynamic
    }
}

/// Element count of a slice about to be uploaded.
pub(crate) fn element_count(len: usize) -> Result<u32, RhiError> {
    u32::try_from(len).map_err(|_| RhiError::TooManyElements(len))
}

/// Opaque handle to a buffer owned by a [`RhiDevice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RhiError {
    #[error("buffer layout {stride}x{count} describes an empty allocation")]
    EmptyBuffer { stride: u32, count: u32 },
    #[error("initial data is {actual} bytes but the layout needs {expected}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("{0:?} is static and cannot be mapped or written after creation")]
    NotDynamic(BufferId),
    #[error("write of {len} bytes at offset {offset} overflows {id:?} ({size} bytes)")]
    OutOfBounds {
        id: BufferId,
        offset: u64,
        len: u64,
        size: u64,
    },
    #[error("{0:?} is not a live buffer on this device")]
    UnknownBuffer(BufferId),
    #[error("{0} elements do not fit a u32 element count")]
    TooManyElements(usize),
    #[error("backend failure: {0}")]
    Backend(String),
}

/// A graphics backend able to own buffer allocations.
///
/// Implementations must release an allocation at most once: destroying an id
/// twice reports [`RhiError::UnknownBuffer`].
pub trait RhiDevice: Send + Sync + Debug {
    /// Allocates a buffer. `contents`, when given, must match `layout.size()`.
    fn create_buffer(
        &self,
        kind: BufferKind,
        layout: &BufferLayout,
        contents: Option<&[u8]>,
        label: Option<&str>,
    ) -> Result<BufferId, RhiError>;

    /// Overwrites part of a dynamic buffer.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), RhiError>;

    /// Releases the allocation behind `id`.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), RhiError>;

    /// Number of allocations currently alive.
    fn live_buffers(&self) -> usize;

    /// Human readable backend name, used in logs.
    fn backend_name(&self) -> &'static str;
}

/// Validation shared by every backend before it allocates.
pub(crate) fn validate_creation(
    layout: &BufferLayout,
    contents: Option<&[u8]>,
) -> Result<(), RhiError> {
    if layout.size() == 0 {
        return Err(RhiError::EmptyBuffer {
            stride: layout.stride,
            count: layout.count,
        });
    }
    if let Some(data) = contents {
        if data.len() as u64 != layout.size() {
            return Err(RhiError::SizeMismatch {
                expected: layout.size(),
                actual: data.len() as u64,
            });
        }
    }
    Ok(())
}

/// Validation shared by every backend before a post-creation write.
pub(crate) fn validate_write(
    id: BufferId,
    layout: &BufferLayout,
    offset: u64,
    len: u64,
) -> Result<(), RhiError> {
    if !layout.is_dynamic() {
        return Err(RhiError::NotDynamic(id));
    }
    if offset + len > layout.size() {
        return Err(RhiError::OutOfBounds {
            id,
            offset,
            len,
            size: layout.size(),
        });
    }
    Ok(())
}
