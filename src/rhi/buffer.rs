use std::{ops::Range, sync::Arc};

use crate::rhi::{BufferId, BufferKind, BufferLayout, RhiDevice, RhiError};

const COPY_ALIGNMENT: usize = 4;

/// A device allocation plus, for dynamic buffers, its CPU-visible memory.
///
/// The allocation is released when the buffer is dropped. Dynamic buffers keep
/// a staging copy of their contents: [`map`](Self::map) hands out a guard over
/// it and the touched bytes are uploaded when the guard is unmapped.
#[derive(Debug)]
pub struct GpuBuffer {
    device: Arc<dyn RhiDevice>,
    id: BufferId,
    kind: BufferKind,
    layout: BufferLayout,
    staging: Vec<u8>,
}

impl GpuBuffer {
    pub fn create(
        device: Arc<dyn RhiDevice>,
        kind: BufferKind,
        layout: BufferLayout,
        contents: Option<&[u8]>,
        label: Option<&str>,
    ) -> Result<Self, RhiError> {
        let id = device.create_buffer(kind, &layout, contents, label)?;
        let staging = if layout.is_dynamic() {
            match contents {
                Some(data) => data.to_vec(),
                None => vec![0; layout.size() as usize],
            }
        } else {
            Vec::new()
        };
        log::trace!(
            "{} created {:?} {:?} buffer {:?} ({} x {} bytes)",
            device.backend_name(),
            layout.usage,
            kind,
            id,
            layout.count,
            layout.stride
        );
        Ok(Self {
            device,
            id,
            kind,
            layout,
            staging,
        })
    }

    /// Opens a CPU write scope on a dynamic buffer.
    ///
    /// Static buffers are write-once and return [`RhiError::NotDynamic`].
    pub fn map(&mut self) -> Result<BufferMapping<'_>, RhiError> {
        if !self.layout.is_dynamic() {
            return Err(RhiError::NotDynamic(self.id));
        }
        Ok(BufferMapping {
            buffer: self,
            dirty: None,
            unmapped: false,
        })
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    pub fn device(&self) -> &Arc<dyn RhiDevice> {
        &self.device
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        if let Err(e) = self.device.destroy_buffer(self.id) {
            log::error!("Failed to release {:?}: {}", self.id, e);
        }
    }
}

/// Scoped CPU access to a dynamic buffer.
///
/// Writes go to the staging memory. [`unmap`](Self::unmap) uploads the dirty
/// range; dropping an un-unmapped guard does the same and logs failures.
pub struct BufferMapping<'a> {
    buffer: &'a mut GpuBuffer,
    dirty: Option<Range<usize>>,
    unmapped: bool,
}

impl<'a> BufferMapping<'a> {
    pub fn bytes(&self) -> &[u8] {
        &self.buffer.staging
    }

    /// Whole mapped range. Everything is uploaded on unmap.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let len = self.buffer.staging.len();
        self.mark_dirty(0..len);
        &mut self.buffer.staging
    }

    /// Copies `data` starting at element index `first`, using the buffer's stride.
    pub fn write<T: bytemuck::Pod>(&mut self, first: u32, data: &[T]) -> Result<(), RhiError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let offset = u64::from(first) * u64::from(self.buffer.layout.stride);
        let end = offset + bytes.len() as u64;
        if end > self.buffer.layout.size() {
            return Err(RhiError::OutOfBounds {
                id: self.buffer.id,
                offset,
                len: bytes.len() as u64,
                size: self.buffer.layout.size(),
            });
        }
        let (start, end) = (offset as usize, end as usize);
        self.buffer.staging[start..end].copy_from_slice(bytes);
        self.mark_dirty(start..end);
        Ok(())
    }

    /// Ends the write scope and uploads what changed.
    pub fn unmap(mut self) -> Result<(), RhiError> {
        self.flush()
    }

    fn mark_dirty(&mut self, range: Range<usize>) {
        self.dirty = Some(match self.dirty.take() {
            Some(d) => d.start.min(range.start)..d.end.max(range.end),
            None => range,
        });
    }

    fn flush(&mut self) -> Result<(), RhiError> {
        self.unmapped = true;
        match self.dirty.take() {
            Some(range) if !range.is_empty() => {
                // Uploads are widened to whole 4 byte words, as GPU copies require.
                let start = range.start - range.start % COPY_ALIGNMENT;
                let end = range
                    .end
                    .next_multiple_of(COPY_ALIGNMENT)
                    .min(self.buffer.staging.len());
                self.buffer.device.write_buffer(
                    self.buffer.id,
                    start as u64,
                    &self.buffer.staging[start..end],
                )
            }
            _ => Ok(()),
        }
    }
}

impl Drop for BufferMapping<'_> {
    fn drop(&mut self) {
        if !self.unmapped {
            if let Err(e) = self.flush() {
                log::error!("Failed to unmap {:?}: {}", self.buffer.id, e);
            }
        }
    }
}
