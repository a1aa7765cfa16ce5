use std::{sync::Arc, time::Duration};

use kestrel_ngin::{
    Engine, EngineSettings,
    cgmath::Vector3,
    components::RigidBody,
    data_structures::{GameObjectId, Transform},
    rhi::MemoryDevice,
};

/// 20 ms, always enough for exactly one fixed physics step at 60 Hz.
pub(crate) const FRAME: Duration = Duration::from_millis(20);

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Engine on an in-memory device, plus the device to inspect buffer traffic.
pub(crate) fn memory_engine(settings: EngineSettings) -> (Engine, Arc<MemoryDevice>) {
    init_logger();
    let device = Arc::new(MemoryDevice::new());
    let engine = Engine::new(settings, device.clone());
    (engine, device)
}

pub(crate) fn game_settings() -> EngineSettings {
    EngineSettings {
        game_mode: true,
        ..Default::default()
    }
}

/// Spawns an object at `position` carrying `rigid_body`.
pub(crate) fn spawn_body(
    engine: &mut Engine,
    name: &str,
    position: Vector3<f32>,
    rigid_body: RigidBody,
) -> GameObjectId {
    engine.scene.spawn(name, |obj| {
        obj.with_transform(Transform::from(position))
            .with_rigid_body(rigid_body)
    })
}

pub(crate) fn position_of(engine: &Engine, id: GameObjectId) -> Vector3<f32> {
    engine
        .scene
        .get_game_object_by_id(id)
        .map(|o| o.transform.position)
        .expect("game object should exist")
}

pub(crate) fn run_frames(engine: &mut Engine, frames: usize) -> u32 {
    (0..frames).map(|_| engine.tick(FRAME).physics_steps).sum()
}
