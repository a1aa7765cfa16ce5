//! Rapier backed dynamics world.

use std::num::NonZeroUsize;

use cgmath::{Quaternion, Vector3};
use rapier3d::prelude::*;

use crate::{
    components::{BodyType, ColliderShape, RigidBody},
    data_structures::transform::Transform,
};

pub struct PhysicsWorld {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    debug_render_pipeline: DebugRenderPipeline,
    /// Time not yet consumed by fixed steps.
    local_time: f32,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("gravity", &self.gravity)
            .field("bodies", &self.rigid_body_set.len())
            .field("colliders", &self.collider_set.len())
            .field("local_time", &self.local_time)
            .finish()
    }
}

impl PhysicsWorld {
    pub fn new(gravity: Vector3<f32>, solver_iterations: usize) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.num_solver_iterations =
            NonZeroUsize::new(solver_iterations).unwrap_or(NonZeroUsize::MIN);

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![gravity.x, gravity.y, gravity.z],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            debug_render_pipeline: DebugRenderPipeline::new(
                DebugRenderStyle::default(),
                DebugRenderMode::default(),
            ),
            local_time: 0.0,
        }
    }

    pub fn gravity(&self) -> Vector3<f32> {
        Vector3::new(self.gravity.x, self.gravity.y, self.gravity.z)
    }

    pub fn set_gravity(&mut self, gravity: Vector3<f32>) {
        self.gravity = vector![gravity.x, gravity.y, gravity.z];
    }

    /// Fixed step accumulator.
    ///
    /// `time_step` is added to the leftover of previous calls and consumed in
    /// steps of `fixed_time_step`, at most `max_sub_steps` of them. Time beyond
    /// the cap is dropped. Returns the number of steps taken.
    pub fn step_simulation(
        &mut self,
        time_step: f32,
        max_sub_steps: u32,
        fixed_time_step: f32,
    ) -> u32 {
        if fixed_time_step <= 0.0 {
            return 0;
        }
        self.local_time += time_step;
        let mut steps = 0;
        if self.local_time >= fixed_time_step {
            steps = (self.local_time / fixed_time_step) as u32;
            self.local_time -= steps as f32 * fixed_time_step;
        }
        let clamped = steps.min(max_sub_steps);
        if clamped < steps {
            log::trace!("Dropping {} physics step(s)", steps - clamped);
        }
        for _ in 0..clamped {
            self.single_step(fixed_time_step);
        }
        clamped
    }

    /// One step of exactly `time_step`, discarding any accumulated time.
    /// Returns the number of steps taken, zero for an empty `time_step`.
    pub fn step_once(&mut self, time_step: f32) -> u32 {
        self.local_time = 0.0;
        if time_step <= 0.0 {
            return 0;
        }
        self.single_step(time_step);
        1
    }

    fn single_step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// Creates a body with a single collider at `transform`.
    pub fn add_body(&mut self, desc: &RigidBody, transform: &Transform) -> RigidBodyHandle {
        let rb_type = match desc.body_type {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Kinematic => RigidBodyType::KinematicPositionBased,
        };
        let position = transform.position;
        let rigid_body = RigidBodyBuilder::new(rb_type)
            .translation(vector![position.x, position.y, position.z])
            .rotation(to_unit_quaternion(transform.rotation).scaled_axis())
            .ccd_enabled(desc.body_type == BodyType::Dynamic)
            .build();
        let handle = self.rigid_body_set.insert(rigid_body);

        let shape = match desc.shape {
            ColliderShape::Box(half) => SharedShape::cuboid(half.x, half.y, half.z),
            ColliderShape::Sphere(radius) => SharedShape::ball(radius),
            ColliderShape::Capsule(half_height, radius) => {
                SharedShape::capsule_y(half_height, radius)
            }
        };
        let mut collider = ColliderBuilder::new(shape)
            .friction(desc.friction)
            .restitution(desc.restitution);
        if desc.mass > 0.0 {
            collider = collider.mass(desc.mass);
        }
        self.collider_set
            .insert_with_parent(collider.build(), handle, &mut self.rigid_body_set);
        handle
    }

    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn body_pose(&self, handle: RigidBodyHandle) -> Option<(Vector3<f32>, Quaternion<f32>)> {
        let rb = self.rigid_body_set.get(handle)?;
        let t = rb.translation();
        let r = rb.rotation();
        Some((Vector3::new(t.x, t.y, t.z), Quaternion::new(r.w, r.i, r.j, r.k)))
    }

    /// Moves a kinematic body to where its game object is.
    pub fn set_kinematic_target(&mut self, handle: RigidBodyHandle, transform: &Transform) {
        if let Some(rb) = self.rigid_body_set.get_mut(handle) {
            let p = transform.position;
            rb.set_next_kinematic_position(Isometry::new(
                vector![p.x, p.y, p.z],
                to_unit_quaternion(transform.rotation).scaled_axis(),
            ));
        }
    }

    pub fn debug_render(&mut self, backend: &mut impl DebugRenderBackend) {
        self.debug_render_pipeline.render(
            backend,
            &self.rigid_body_set,
            &self.collider_set,
            &self.impulse_joint_set,
            &self.multibody_joint_set,
            &self.narrow_phase,
        );
    }
}

fn to_unit_quaternion(q: Quaternion<f32>) -> rapier3d::na::UnitQuaternion<f32> {
    rapier3d::na::UnitQuaternion::from_quaternion(rapier3d::na::Quaternion::new(
        q.s, q.v.x, q.v.y, q.v.z,
    ))
}
