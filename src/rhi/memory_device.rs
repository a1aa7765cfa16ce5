use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use crate::rhi::{
    BufferId, BufferKind, BufferLayout, RhiDevice, RhiError, validate_creation, validate_write,
};

#[derive(Debug)]
struct MemoryBuffer {
    kind: BufferKind,
    layout: BufferLayout,
    data: Vec<u8>,
}

/// RHI backend that keeps every allocation in system memory.
///
/// Used when no adapter is available (CI, tools) and to observe buffer
/// traffic: contents, writes and releases can be inspected after the fact.
#[derive(Debug, Default)]
pub struct MemoryDevice {
    buffers: Mutex<HashMap<BufferId, MemoryBuffer>>,
    next_id: AtomicU64,
    writes: AtomicUsize,
    released: AtomicUsize,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of a live buffer's bytes.
    pub fn contents(&self, id: BufferId) -> Option<Vec<u8>> {
        self.lock().get(&id).map(|b| b.data.clone())
    }

    pub fn kind(&self, id: BufferId) -> Option<BufferKind> {
        self.lock().get(&id).map(|b| b.kind)
    }

    /// Successful writes since creation of the device.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Successful releases since creation of the device.
    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<BufferId, MemoryBuffer>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.buffers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RhiDevice for MemoryDevice {
    fn create_buffer(
        &self,
        kind: BufferKind,
        layout: &BufferLayout,
        contents: Option<&[u8]>,
        _label: Option<&str>,
    ) -> Result<BufferId, RhiError> {
        validate_creation(layout, contents)?;
        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let data = match contents {
            Some(bytes) => bytes.to_vec(),
            None => vec![0; layout.size() as usize],
        };
        self.lock().insert(
            id,
            MemoryBuffer {
                kind,
                layout: *layout,
                data,
            },
        );
        Ok(id)
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), RhiError> {
        let mut buffers = self.lock();
        let buffer = buffers.get_mut(&id).ok_or(RhiError::UnknownBuffer(id))?;
        validate_write(id, &buffer.layout, offset, data.len() as u64)?;
        let start = offset as usize;
        buffer.data[start..start + data.len()].copy_from_slice(data);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), RhiError> {
        self.lock()
            .remove(&id)
            .map(|_| {
                self.released.fetch_add(1, Ordering::Relaxed);
            })
            .ok_or(RhiError::UnknownBuffer(id))
    }

    fn live_buffers(&self) -> usize {
        self.lock().len()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
