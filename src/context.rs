use std::{sync::Arc, time::Duration};

use cgmath::{Vector2, Vector3, Vector4};

use crate::{
    profiler::Profiler,
    rhi::{RhiDevice, RhiError, VertexBuffer, element_count, vertex::VertexPosCol},
    settings::EngineSettings,
};

/// Engine mode flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EngineMode(u32);

impl EngineMode {
    pub const PHYSICS: EngineMode = EngineMode(1 << 0);
    pub const GAME: EngineMode = EngineMode(1 << 1);

    pub fn empty() -> Self {
        EngineMode(0)
    }

    /// True when every flag of `flags` is set.
    pub fn is_set(self, flags: EngineMode) -> bool {
        self.0 & flags.0 == flags.0
    }

    pub fn set(&mut self, flags: EngineMode) {
        self.0 |= flags.0;
    }

    pub fn clear(&mut self, flags: EngineMode) {
        self.0 &= !flags.0;
    }
}

impl std::ops::BitOr for EngineMode {
    type Output = EngineMode;

    fn bitor(self, rhs: Self) -> Self::Output {
        EngineMode(self.0 | rhs.0)
    }
}

/// Renderer flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RenderFlags(u32);

impl RenderFlags {
    /// Draw the physics colliders.
    pub const GIZMO_PHYSICS: RenderFlags = RenderFlags(1 << 0);

    pub fn is_set(self, flags: RenderFlags) -> bool {
        self.0 & flags.0 == flags.0
    }

    pub fn set(&mut self, flags: RenderFlags) {
        self.0 |= flags.0;
    }

    pub fn clear(&mut self, flags: RenderFlags) {
        self.0 &= !flags.0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebugLine {
    pub from: Vector3<f32>,
    pub to: Vector3<f32>,
    pub color: Vector4<f32>,
}

/// Render side of the context: output resolution, flags and debug lines.
///
/// Debug lines collected during a frame are uploaded into a dynamic vertex
/// buffer by [`flush_debug_lines`](Renderer::flush_debug_lines), two vertices
/// per line. The buffer only grows.
#[derive(Debug)]
pub struct Renderer {
    device: Arc<dyn RhiDevice>,
    resolution: Vector2<f32>,
    pub flags: RenderFlags,
    debug_lines: Vec<DebugLine>,
    debug_vertices: Option<VertexBuffer>,
    debug_vertex_count: u32,
}

impl Renderer {
    pub fn new(device: Arc<dyn RhiDevice>, resolution: Vector2<f32>) -> Self {
        Self {
            device,
            resolution,
            flags: RenderFlags::default(),
            debug_lines: Vec::new(),
            debug_vertices: None,
            debug_vertex_count: 0,
        }
    }

    pub fn device(&self) -> &Arc<dyn RhiDevice> {
        &self.device
    }

    pub fn resolution(&self) -> Vector2<f32> {
        self.resolution
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resolution {}x{}", width, height);
            return;
        }
        self.resolution = Vector2::new(width as f32, height as f32);
    }

    pub fn draw_line(&mut self, from: Vector3<f32>, to: Vector3<f32>, color: Vector4<f32>) {
        self.debug_lines.push(DebugLine { from, to, color });
    }

    pub fn debug_lines(&self) -> &[DebugLine] {
        &self.debug_lines
    }

    /// Buffer holding the last flushed lines.
    pub fn debug_vertex_buffer(&self) -> Option<&VertexBuffer> {
        self.debug_vertices.as_ref()
    }

    /// Vertices of the last flush that are meant to be drawn.
    pub fn debug_vertex_count(&self) -> u32 {
        self.debug_vertex_count
    }

    /// Uploads the collected lines and starts a new batch.
    pub fn flush_debug_lines(&mut self) -> Result<(), RhiError> {
        let vertices: Vec<VertexPosCol> = self
            .debug_lines
            .drain(..)
            .flat_map(|line| {
                [
                    VertexPosCol {
                        position: line.from.into(),
                        color: line.color.into(),
                    },
                    VertexPosCol {
                        position: line.to.into(),
                        color: line.color.into(),
                    },
                ]
            })
            .collect();
        let needed = element_count(vertices.len())?;
        self.debug_vertex_count = needed;
        if vertices.is_empty() {
            return Ok(());
        }

        let too_small = self
            .debug_vertices
            .as_ref()
            .is_none_or(|buffer| buffer.vertex_count() < needed);
        if too_small {
            let capacity = needed.next_power_of_two();
            self.debug_vertices = Some(VertexBuffer::new_dynamic::<VertexPosCol>(
                self.device.clone(),
                capacity,
            )?);
        }

        match self.debug_vertices.as_mut() {
            Some(buffer) => {
                let mut mapping = buffer.map()?;
                mapping.write(0, &vertices)?;
                mapping.unmap()
            }
            None => Ok(()),
        }
    }
}

/// Everything the engine's subsystems share during a frame.
#[derive(Debug)]
pub struct Context {
    pub settings: EngineSettings,
    pub mode: EngineMode,
    delta_time: Duration,
    pub renderer: Renderer,
    pub profiler: Profiler,
}

impl Context {
    pub fn new(settings: EngineSettings, device: Arc<dyn RhiDevice>) -> Self {
        let (width, height) = settings.resolution;
        let mut renderer = Renderer::new(device, Vector2::new(width as f32, height as f32));
        if settings.debug_draw_physics {
            renderer.flags.set(RenderFlags::GIZMO_PHYSICS);
        }

        let mut mode = EngineMode::empty();
        if settings.physics_enabled {
            mode.set(EngineMode::PHYSICS);
        }
        if settings.game_mode {
            mode.set(EngineMode::GAME);
        }

        Self {
            settings,
            mode,
            delta_time: Duration::ZERO,
            renderer,
            profiler: Profiler::new(true),
        }
    }

    pub fn delta_time(&self) -> Duration {
        self.delta_time
    }

    pub fn set_delta_time(&mut self, delta_time: Duration) {
        self.delta_time = delta_time;
    }
}
