use std::{
    borrow::Cow,
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Context as _;
use wgpu::util::DeviceExt;

use crate::rhi::{
    BufferId, BufferKind, BufferLayout, RhiDevice, RhiError, validate_creation, validate_write,
};

/// RHI backend on top of a wgpu device and queue.
#[derive(Debug)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    buffers: Mutex<HashMap<BufferId, (wgpu::Buffer, BufferLayout)>>,
    next_id: AtomicU64,
}

impl WgpuDevice {
    /// Wraps a device/queue pair the host application already created.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            buffers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Requests an adapter without a surface, for offscreen work.
    pub async fn new_headless() -> anyhow::Result<Self> {
        log::info!("WGPU headless setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter found")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("kestrel device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .context("Failed to create the graphics device")?;

        Ok(Self::new(device, queue))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The wgpu buffer behind `id`, for binding in a render pass.
    pub fn buffer(&self, id: BufferId) -> Option<wgpu::Buffer> {
        self.lock().get(&id).map(|(buffer, _)| buffer.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<BufferId, (wgpu::Buffer, BufferLayout)>> {
        self.buffers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RhiDevice for WgpuDevice {
    fn create_buffer(
        &self,
        kind: BufferKind,
        layout: &BufferLayout,
        contents: Option<&[u8]>,
        label: Option<&str>,
    ) -> Result<BufferId, RhiError> {
        validate_creation(layout, contents)?;
        let mut usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        if layout.is_dynamic() {
            usage |= wgpu::BufferUsages::COPY_DST;
        }

        let buffer = match contents {
            Some(contents) => self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label,
                    contents,
                    usage,
                }),
            None => self.device.create_buffer(&wgpu::BufferDescriptor {
                label,
                size: wgpu::util::align_to(layout.size(), wgpu::COPY_BUFFER_ALIGNMENT),
                usage,
                mapped_at_creation: false,
            }),
        };

        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.lock().insert(id, (buffer, *layout));
        Ok(id)
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), RhiError> {
        let buffers = self.lock();
        let (buffer, layout) = buffers.get(&id).ok_or(RhiError::UnknownBuffer(id))?;
        validate_write(id, layout, offset, data.len() as u64)?;
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(RhiError::Backend(format!(
                "write offset {offset} is not {}-byte aligned",
                wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }
        // Copies must cover whole 4 byte words; the allocation is padded to match.
        let data = if data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0 {
            Cow::Borrowed(data)
        } else {
            let padded = wgpu::util::align_to(data.len() as u64, wgpu::COPY_BUFFER_ALIGNMENT);
            let mut bytes = data.to_vec();
            bytes.resize(padded as usize, 0);
            Cow::Owned(bytes)
        };
        self.queue.write_buffer(buffer, offset, &data);
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), RhiError> {
        let (buffer, _) = self.lock().remove(&id).ok_or(RhiError::UnknownBuffer(id))?;
        buffer.destroy();
        Ok(())
    }

    fn live_buffers(&self) -> usize {
        self.lock().len()
    }

    fn backend_name(&self) -> &'static str {
        "wgpu"
    }
}
