//! Components that can be attached to a game object.
//!
//! - `camera` renders the scene from its owner's point of view
//! - `rigid_body` lets the physics world drive its owner's transform

pub mod camera;
pub mod rigid_body;

pub use camera::{Camera, CameraState, Projection};
pub use rigid_body::{BodyType, ColliderShape, RigidBody};
