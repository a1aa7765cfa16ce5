//! Scene graph.
//!
//! The [`GameObjectPool`] owns every live game object in a flat list kept in
//! instantiation order. The hierarchy is not reflected in the storage: each
//! object only stores the id of its parent, and children are found by
//! scanning for that id. The pool guarantees that every parent link points to
//! an object of the same pool and that links never form a cycle.

use std::{
    collections::{HashMap, HashSet},
    io::{Read, Write},
};

use crate::{
    context::Context,
    data_structures::{
        game_object::{GameObject, GameObjectId},
        transform::Transform,
    },
    serializer::{SceneReader, SceneWriter},
};

/// What happens to the descendants of a removed object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    /// The object and all of its descendants are removed.
    Subtree,
    /// Only the object is removed, its children become roots.
    Single,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("game object {0} does not exist")]
    NotFound(GameObjectId),
    #[error("making {parent} the parent of {child} would create a cycle")]
    Cycle {
        child: GameObjectId,
        parent: GameObjectId,
    },
}

#[derive(Debug)]
pub struct GameObjectPool {
    game_objects: Vec<GameObject>,
    indices: HashMap<GameObjectId, usize>,
    next_id: u64,
}

impl Default for GameObjectPool {
    fn default() -> Self {
        Self::new()
    }
}

impl GameObjectPool {
    pub fn new() -> Self {
        Self {
            game_objects: Vec::new(),
            indices: HashMap::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> GameObjectId {
        let id = GameObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Creates an empty root object and returns its id.
    pub fn create_game_object(&mut self, name: &str) -> GameObjectId {
        let game_object = GameObject::new(self.allocate_id(), name);
        self.add_game_object(game_object)
    }

    /// Creates an object through `build` and adds it to the pool.
    ///
    /// ```no_run
    /// # use kestrel_ngin::data_structures::scene_graph::GameObjectPool;
    /// # use kestrel_ngin::components::Camera;
    /// let mut pool = GameObjectPool::new();
    /// let camera = pool.spawn("Camera", |obj| obj.with_camera(Camera::default()));
    /// assert!(pool.get_game_object_by_id(camera).is_some());
    /// ```
    pub fn spawn(
        &mut self,
        name: &str,
        build: impl FnOnce(GameObject) -> GameObject,
    ) -> GameObjectId {
        let game_object = build(GameObject::new(self.allocate_id(), name));
        self.add_game_object(game_object)
    }

    /// Appends an object. Its parent link is dropped when it does not resolve
    /// inside this pool; an id clash gives the object a fresh id.
    pub fn add_game_object(&mut self, mut game_object: GameObject) -> GameObjectId {
        if game_object.id.0 == 0 || self.indices.contains_key(&game_object.id) {
            game_object.id = self.allocate_id();
        } else if game_object.id.0 >= self.next_id {
            self.next_id = game_object.id.0 + 1;
        }
        if let Some(parent) = game_object.parent {
            if !self.indices.contains_key(&parent) {
                log::warn!(
                    "Parent {} of {} is not in the pool, adding it as a root",
                    parent,
                    game_object.name
                );
                game_object.parent = None;
            }
        }

        let id = game_object.id;
        self.indices.insert(id, self.game_objects.len());
        self.game_objects.push(game_object);
        id
    }

    pub fn get_all_game_objects(&self) -> &[GameObject] {
        &self.game_objects
    }

    pub fn get_all_game_objects_mut(&mut self) -> &mut [GameObject] {
        &mut self.game_objects
    }

    pub fn get_root_game_objects(&self) -> Vec<&GameObject> {
        self.game_objects.iter().filter(|o| o.is_root()).collect()
    }

    /// Follows parent links up to the top of the hierarchy.
    pub fn get_game_object_root(&self, id: GameObjectId) -> Option<&GameObject> {
        let mut current = self.get_game_object_by_id(id)?;
        while let Some(parent) = current.parent.and_then(|p| self.get_game_object_by_id(p)) {
            current = parent;
        }
        Some(current)
    }

    pub fn get_game_object_count(&self) -> usize {
        self.game_objects.len()
    }

    pub fn get_game_object_index(&self, id: GameObjectId) -> Option<usize> {
        self.indices.get(&id).copied()
    }

    /// First object named `name`, in instantiation order.
    pub fn get_game_object_by_name(&self, name: &str) -> Option<&GameObject> {
        self.game_objects.iter().find(|o| o.name == name)
    }

    pub fn get_game_object_by_index(&self, index: usize) -> Option<&GameObject> {
        self.game_objects.get(index)
    }

    pub fn get_game_object_by_id(&self, id: GameObjectId) -> Option<&GameObject> {
        self.indices.get(&id).map(|&idx| &self.game_objects[idx])
    }

    pub fn get_game_object_by_id_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
        let idx = *self.indices.get(&id)?;
        self.game_objects.get_mut(idx)
    }

    /// Direct children of `id`, in instantiation order.
    pub fn get_game_objects_by_parent_id(&self, id: GameObjectId) -> Vec<&GameObject> {
        self.game_objects
            .iter()
            .filter(|o| o.parent == Some(id))
            .collect()
    }

    pub fn game_object_exists(&self, id: GameObjectId) -> bool {
        self.indices.contains_key(&id)
    }

    pub fn game_object_exists_by_name(&self, name: &str) -> bool {
        self.get_game_object_by_name(name).is_some()
    }

    /// All transitive children of `id`, parents before their children.
    pub fn get_descendants(&self, id: GameObjectId) -> Vec<GameObjectId> {
        let mut descendants = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for child in self.get_game_objects_by_parent_id(current) {
                descendants.push(child.id);
                stack.push(child.id);
            }
        }
        descendants
    }

    /// Makes `parent` the parent of `child`, or turns `child` into a root.
    ///
    /// Rejected when `parent` is `child` itself or one of its descendants.
    pub fn set_parent(
        &mut self,
        child: GameObjectId,
        parent: Option<GameObjectId>,
    ) -> Result<(), SceneError> {
        if !self.game_object_exists(child) {
            return Err(SceneError::NotFound(child));
        }
        if let Some(parent) = parent {
            if !self.game_object_exists(parent) {
                return Err(SceneError::NotFound(parent));
            }
            if self.is_ancestor_or_self(child, parent) {
                return Err(SceneError::Cycle { child, parent });
            }
        }
        if let Some(obj) = self.get_game_object_by_id_mut(child) {
            obj.parent = parent;
        }
        Ok(())
    }

    /// Whether `ancestor` is `id` or lies on the parent chain of `id`.
    fn is_ancestor_or_self(&self, ancestor: GameObjectId, id: GameObjectId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.get_game_object_by_id(c).and_then(|o| o.parent);
        }
        false
    }

    /// Local transforms composed from the root down to `id`.
    pub fn world_transform(&self, id: GameObjectId) -> Option<Transform> {
        let mut world = self.get_game_object_by_id(id)?.transform;
        let mut parent = self.get_game_object_by_id(id)?.parent;
        while let Some(p) = parent.and_then(|p| self.get_game_object_by_id(p)) {
            world = &p.transform * &world;
            parent = p.parent;
        }
        Some(world)
    }

    /// Removes `id` according to `removal` and returns the removed objects.
    ///
    /// Unknown ids remove nothing.
    pub fn remove(&mut self, id: GameObjectId, removal: Removal) -> Vec<GameObject> {
        if !self.game_object_exists(id) {
            return Vec::new();
        }
        let doomed: HashSet<GameObjectId> = match removal {
            Removal::Subtree => std::iter::once(id)
                .chain(self.get_descendants(id))
                .collect(),
            Removal::Single => {
                for obj in self.game_objects.iter_mut() {
                    if obj.parent == Some(id) {
                        obj.parent = None;
                    }
                }
                HashSet::from([id])
            }
        };

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.game_objects)
            .into_iter()
            .partition(|o| doomed.contains(&o.id));
        self.game_objects = kept;
        self.rebuild_indices();
        log::trace!("Removed {} game object(s) starting at {}", removed.len(), id);
        removed
    }

    /// Removes `id` together with all of its descendants.
    pub fn remove_game_object(&mut self, id: GameObjectId) -> Vec<GameObject> {
        self.remove(id, Removal::Subtree)
    }

    /// Removes only `id`; its children become roots.
    pub fn remove_single_game_object(&mut self, id: GameObjectId) -> Option<GameObject> {
        self.remove(id, Removal::Single).pop()
    }

    fn rebuild_indices(&mut self) {
        self.indices = self
            .game_objects
            .iter()
            .enumerate()
            .map(|(idx, o)| (o.id, idx))
            .collect();
    }

    /// Resets every component's derived state.
    pub fn start(&mut self) {
        let transforms: Vec<Option<Transform>> = self
            .game_objects
            .iter()
            .map(|o| self.world_transform(o.id))
            .collect();
        for (obj, transform) in self.game_objects.iter_mut().zip(transforms) {
            if let (Some(camera), Some(transform)) = (obj.camera.as_mut(), transform) {
                camera.reset(&transform);
            }
        }
    }

    /// Per frame component update. Returns how many cameras were recomputed.
    pub fn update(&mut self, context: &Context) -> usize {
        let resolution = context.renderer.resolution();
        let mut recomputed = 0;
        for idx in 0..self.game_objects.len() {
            let obj = &self.game_objects[idx];
            if !obj.active || obj.camera.is_none() {
                continue;
            }
            let Some(transform) = self.world_transform(obj.id) else {
                continue;
            };
            if let Some(camera) = self.game_objects[idx].camera.as_mut() {
                if camera.update(&transform, resolution) {
                    recomputed += 1;
                }
            }
        }
        recomputed
    }

    /// Destroys every object. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.game_objects.clear();
        self.indices.clear();
    }

    pub fn serialize<W: Write>(&self, writer: &mut SceneWriter<W>) -> anyhow::Result<()> {
        writer.write_uint(self.game_objects.len() as u32)?;
        for game_object in &self.game_objects {
            game_object.serialize(writer)?;
        }
        Ok(())
    }

    /// Replaces the pool's content with the objects read from `reader`.
    ///
    /// Parent links are resolved once every object exists. Links to unknown
    /// objects, and links that close a cycle, leave the object as a root.
    pub fn deserialize<R: Read>(&mut self, reader: &mut SceneReader<R>) -> anyhow::Result<()> {
        let count = reader.read_uint()?;
        // The count is untrusted, objects are only stored once decoded
        let mut game_objects = Vec::new();
        for _ in 0..count {
            game_objects.push(GameObject::deserialize(reader)?);
        }

        self.clear();
        let mut parents = Vec::with_capacity(game_objects.len());
        for mut game_object in game_objects {
            let parent = game_object.parent.take();
            if self.game_object_exists(game_object.id) {
                log::warn!("Duplicate game object id {} in scene", game_object.id);
            }
            let id = self.add_game_object(game_object);
            parents.push((id, parent));
        }

        for (child, parent) in parents {
            let Some(parent) = parent else { continue };
            match self.set_parent(child, Some(parent)) {
                Ok(()) => {}
                Err(SceneError::NotFound(_)) => {
                    log::warn!("{} refers to missing parent {}, it becomes a root", child, parent)
                }
                Err(SceneError::Cycle { .. }) => {
                    log::warn!("Parent {} of {} forms a cycle, it becomes a root", parent, child)
                }
            }
        }
        self.start();
        Ok(())
    }
}
