//! Physics subsystem.
//!
//! Owns the dynamics world of a context and advances it once per frame. The
//! world is only stepped when the engine runs in game mode with physics
//! enabled; in the editor bodies stay where they are. Game objects carrying a
//! [`RigidBody`] get a body on the next tick and have their transform driven
//! by it from then on.

use std::collections::HashMap;

use cgmath::{Vector3, Zero};
use rapier3d::prelude::RigidBodyHandle;

use crate::{
    components::{BodyType, RigidBody},
    context::{Context, EngineMode, RenderFlags},
    data_structures::{
        game_object::{GameObject, GameObjectId},
        scene_graph::GameObjectPool,
        transform::Transform,
    },
    settings::EngineSettings,
};

pub mod debug_draw;
pub mod world;

pub use debug_draw::PhysicsDebugDraw;
pub use world::PhysicsWorld;

pub const INTERNAL_FPS: f32 = 60.0;
pub const MAX_SOLVER_ITERATIONS: usize = 256;
pub const GRAVITY: Vector3<f32> = Vector3::new(0.0, -9.81, 0.0);

const PROFILER_BLOCK: &str = "physics";

/// How a frame's delta is split into solver steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubStepPlan {
    pub max_sub_steps: u32,
    pub fixed_time_step: f32,
    /// A single step of the whole delta instead of fixed steps.
    pub variable: bool,
}

/// Chooses the sub-stepping for a frame of `delta` seconds.
///
/// `floor(delta * internal_fps) + 1` steps of `1 / internal_fps` are allowed,
/// capped by a positive `max_sub_steps`. A negative `max_sub_steps` asks for a
/// single step of length `delta`.
pub fn compute_sub_steps(delta: f32, max_sub_steps: i32, internal_fps: f32) -> SubStepPlan {
    if max_sub_steps < 0 {
        return SubStepPlan {
            max_sub_steps: 1,
            fixed_time_step: delta,
            variable: true,
        };
    }
    let mut sub_steps = (delta * internal_fps) as u32 + 1;
    if max_sub_steps > 0 {
        sub_steps = sub_steps.min(max_sub_steps as u32);
    }
    SubStepPlan {
        max_sub_steps: sub_steps,
        fixed_time_step: 1.0 / internal_fps,
        variable: false,
    }
}

#[derive(Debug)]
pub struct Physics {
    world: Option<PhysicsWorld>,
    max_sub_steps: i32,
    internal_fps: f32,
    simulating: bool,
    bodies: HashMap<GameObjectId, RigidBodyHandle>,
}

impl Physics {
    pub fn new(settings: &EngineSettings) -> Self {
        let [x, y, z] = settings.gravity;
        let world = PhysicsWorld::new(Vector3::new(x, y, z), settings.solver_iterations);
        log::info!(
            "Physics world ready (gravity {:?}, {} solver iterations)",
            settings.gravity,
            settings.solver_iterations
        );
        Self {
            world: Some(world),
            max_sub_steps: settings.max_sub_steps,
            internal_fps: settings.internal_fps,
            simulating: false,
            bodies: HashMap::new(),
        }
    }

    /// A subsystem without a world: every tick is a no-op.
    pub fn uninitialized() -> Self {
        Self {
            world: None,
            max_sub_steps: 1,
            internal_fps: INTERNAL_FPS,
            simulating: false,
            bodies: HashMap::new(),
        }
    }

    pub fn world(&self) -> Option<&PhysicsWorld> {
        self.world.as_ref()
    }

    pub fn is_simulating(&self) -> bool {
        self.simulating
    }

    pub fn max_sub_steps(&self) -> i32 {
        self.max_sub_steps
    }

    pub fn set_max_sub_steps(&mut self, max_sub_steps: i32) {
        self.max_sub_steps = max_sub_steps;
    }

    /// Advances the world by the context's delta time. Returns the number of
    /// solver steps taken.
    pub fn tick(&mut self, context: &mut Context) -> u32 {
        let Some(world) = self.world.as_mut() else {
            return 0;
        };

        if context.renderer.flags.is_set(RenderFlags::GIZMO_PHYSICS) {
            let mut debug_draw = PhysicsDebugDraw::new(&mut context.renderer);
            world.debug_render(&mut debug_draw);
        }

        if !context.mode.is_set(EngineMode::PHYSICS | EngineMode::GAME) {
            return 0;
        }

        context.profiler.time_block_start(PROFILER_BLOCK);

        let delta = context.delta_time().as_secs_f32();
        let plan = compute_sub_steps(delta, self.max_sub_steps, self.internal_fps);

        self.simulating = true;
        let steps = if plan.variable {
            world.step_once(plan.fixed_time_step)
        } else {
            world.step_simulation(delta, plan.max_sub_steps, plan.fixed_time_step)
        };
        self.simulating = false;

        context.profiler.time_block_end(PROFILER_BLOCK);
        steps
    }

    /// World gravity, or zero when there is no world.
    pub fn get_gravity(&self) -> Vector3<f32> {
        match &self.world {
            Some(world) => world.gravity(),
            None => {
                log::error!("Unable to get gravity, ensure physics are properly initialized.");
                Vector3::zero()
            }
        }
    }

    pub fn set_gravity(&mut self, gravity: Vector3<f32>) {
        match self.world.as_mut() {
            Some(world) => world.set_gravity(gravity),
            None => log::error!("Unable to set gravity, ensure physics are properly initialized."),
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn has_body(&self, id: GameObjectId) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Creates bodies for game objects that got a rigid body since the last
    /// call, and drops bodies whose component was detached.
    pub fn register_bodies(&mut self, pool: &GameObjectPool) {
        let Some(world) = self.world.as_mut() else {
            return;
        };

        self.bodies.retain(|id, handle| {
            let attached = pool
                .get_game_object_by_id(*id)
                .is_some_and(|o| o.rigid_body.is_some());
            if !attached {
                world.remove_body(*handle);
            }
            attached
        });

        for obj in pool.get_all_game_objects() {
            let Some(desc) = obj.rigid_body.as_ref() else {
                continue;
            };
            if self.bodies.contains_key(&obj.id()) {
                continue;
            }
            let Some(transform) = pool.world_transform(obj.id()) else {
                continue;
            };
            let handle = world.add_body(desc, &transform);
            log::trace!("Registered rigid body for {}", obj.name);
            self.bodies.insert(obj.id(), handle);
        }
    }

    /// Feeds kinematic bodies with the transform of their game object.
    pub fn push_kinematic_targets(&mut self, pool: &GameObjectPool) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        for (id, handle) in &self.bodies {
            let Some(obj) = pool.get_game_object_by_id(*id) else {
                continue;
            };
            if is_body_type(obj.rigid_body.as_ref(), BodyType::Kinematic) {
                if let Some(transform) = pool.world_transform(*id) {
                    world.set_kinematic_target(*handle, &transform);
                }
            }
        }
    }

    /// Writes simulated poses of dynamic bodies back into local transforms.
    ///
    /// Parents are written before their children, so a child's local pose is
    /// taken relative to its parent's pose of this step.
    pub fn write_back_transforms(&self, pool: &mut GameObjectPool) {
        let Some(world) = self.world.as_ref() else {
            return;
        };
        let mut poses: Vec<_> = self
            .bodies
            .iter()
            .filter_map(|(id, handle)| {
                let obj = pool.get_game_object_by_id(*id)?;
                if !is_body_type(obj.rigid_body.as_ref(), BodyType::Dynamic) {
                    return None;
                }
                let (position, rotation) = world.body_pose(*handle)?;
                Some((hierarchy_depth(pool, *id), *id, position, rotation))
            })
            .collect();
        poses.sort_by_key(|(depth, id, ..)| (*depth, *id));

        for (_, id, position, rotation) in poses {
            let parent_world = pool
                .get_game_object_by_id(id)
                .and_then(|o| o.parent())
                .and_then(|p| pool.world_transform(p));
            if let Some(obj) = pool.get_game_object_by_id_mut(id) {
                let scale = obj.transform.scale;
                obj.transform = to_local(parent_world, position, rotation, scale);
            }
        }
    }

    /// Drops the bodies of removed game objects.
    pub fn remove_bodies(&mut self, removed: &[GameObject]) {
        for obj in removed {
            if let Some(handle) = self.bodies.remove(&obj.id()) {
                if let Some(world) = self.world.as_mut() {
                    world.remove_body(handle);
                }
            }
        }
    }

    /// Drops every body, keeping the world and its settings.
    pub fn clear(&mut self) {
        if let Some(world) = self.world.as_mut() {
            for (_, handle) in self.bodies.drain() {
                world.remove_body(handle);
            }
        }
        self.bodies.clear();
    }
}

fn is_body_type(rigid_body: Option<&RigidBody>, body_type: BodyType) -> bool {
    rigid_body.is_some_and(|rb| rb.body_type == body_type)
}

/// Number of ancestors of `id`.
fn hierarchy_depth(pool: &GameObjectPool, id: GameObjectId) -> usize {
    let mut depth = 0;
    let mut current = pool.get_game_object_by_id(id).and_then(|o| o.parent());
    while let Some(parent) = current {
        depth += 1;
        current = pool.get_game_object_by_id(parent).and_then(|o| o.parent());
    }
    depth
}

/// Expresses a world pose relative to `parent`.
fn to_local(
    parent: Option<Transform>,
    position: Vector3<f32>,
    rotation: cgmath::Quaternion<f32>,
    scale: Vector3<f32>,
) -> Transform {
    let Some(parent) = parent else {
        return Transform {
            position,
            rotation,
            scale,
        };
    };
    let inverse_rotation = parent.rotation.conjugate();
    let offset = inverse_rotation * (position - parent.position);
    Transform {
        position: Vector3::new(
            offset.x / parent.scale.x,
            offset.y / parent.scale.y,
            offset.z / parent.scale.z,
        ),
        rotation: inverse_rotation * rotation,
        scale,
    }
}
