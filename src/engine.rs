//! Frame driver.
//!
//! The host application owns the window and the event loop and calls
//! [`Engine::tick`] once per frame with the elapsed time. A tick runs, in
//! order: component updates of the scene, body registration, the physics step,
//! the transform write-back and the debug line upload.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;

use crate::{
    context::{Context, EngineMode},
    data_structures::{
        game_object::{GameObject, GameObjectId},
        scene_graph::{GameObjectPool, Removal},
    },
    physics::Physics,
    rhi::RhiDevice,
    serializer::{SceneReader, SceneWriter},
    settings::EngineSettings,
};

#[derive(Debug)]
pub struct Engine {
    pub context: Context,
    pub scene: GameObjectPool,
    pub physics: Physics,
}

/// What happened during a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub cameras_updated: usize,
    pub physics_steps: u32,
}

impl Engine {
    pub fn new(settings: EngineSettings, device: Arc<dyn RhiDevice>) -> Self {
        log::info!(
            "Starting engine on {} ({}x{})",
            device.backend_name(),
            settings.resolution.0,
            settings.resolution.1
        );
        let physics = Physics::new(&settings);
        Self {
            context: Context::new(settings, device),
            scene: GameObjectPool::new(),
            physics,
        }
    }

    pub fn set_game_mode(&mut self, enabled: bool) {
        if enabled {
            self.context.mode.set(EngineMode::GAME);
        } else {
            self.context.mode.clear(EngineMode::GAME);
        }
    }

    pub fn set_physics_enabled(&mut self, enabled: bool) {
        if enabled {
            self.context.mode.set(EngineMode::PHYSICS);
        } else {
            self.context.mode.clear(EngineMode::PHYSICS);
        }
    }

    pub fn tick(&mut self, delta_time: Duration) -> FrameStats {
        self.context.set_delta_time(delta_time);

        let cameras_updated = self.scene.update(&self.context);

        self.physics.register_bodies(&self.scene);
        self.physics.push_kinematic_targets(&self.scene);
        let physics_steps = self.physics.tick(&mut self.context);
        if physics_steps > 0 {
            self.physics.write_back_transforms(&mut self.scene);
        }

        if let Err(e) = self.context.renderer.flush_debug_lines() {
            log::error!("Failed to upload debug lines: {}", e);
        }

        FrameStats {
            cameras_updated,
            physics_steps,
        }
    }

    /// Removes a game object and drops the physics bodies that went with it.
    pub fn remove_game_object(&mut self, id: GameObjectId, removal: Removal) -> Vec<GameObject> {
        let removed = self.scene.remove(id, removal);
        self.physics.remove_bodies(&removed);
        removed
    }

    pub fn clear_scene(&mut self) {
        self.physics.clear();
        self.scene.clear();
    }

    pub fn save_scene(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create scene file {}", path.display()))?;
        let mut writer = SceneWriter::new(BufWriter::new(file));
        writer.write_header()?;
        self.scene.serialize(&mut writer)?;
        writer.flush()?;
        log::info!(
            "Saved {} game objects to {}",
            self.scene.get_game_object_count(),
            path.display()
        );
        Ok(())
    }

    /// Replaces the scene with the content of `path`. Bodies are rebuilt on the
    /// next tick.
    pub fn load_scene(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open scene file {}", path.display()))?;
        let mut reader = SceneReader::new(BufReader::new(file));
        reader
            .read_header()
            .with_context(|| format!("Failed to load {}", path.display()))?;
        self.physics.clear();
        self.scene
            .deserialize(&mut reader)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        log::info!(
            "Loaded {} game objects from {}",
            self.scene.get_game_object_count(),
            path.display()
        );
        Ok(())
    }
}
