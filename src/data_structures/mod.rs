//! Engine data structures: transforms, frustums, game objects and the pool.
//!
//! - `transform` holds position, rotation and scale and composes them
//! - `frustum` is used for point, sphere and box visibility checks
//! - `game_object` is a named node carrying optional components
//! - `scene_graph` owns every game object and the parent/child relations

pub mod frustum;
pub mod game_object;
pub mod scene_graph;
pub mod transform;

pub use game_object::{GameObject, GameObjectId};
pub use scene_graph::{GameObjectPool, Removal, SceneError};
pub use transform::Transform;
