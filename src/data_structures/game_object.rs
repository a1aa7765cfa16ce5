use std::{
    fmt,
    io::{Read, Write},
};

use crate::{
    components::{Camera, RigidBody},
    data_structures::transform::Transform,
    serializer::{SceneReader, SceneWriter},
};

/// Stable handle of a game object.
///
/// Ids are handed out by the pool, never reused within a pool and persisted in
/// scene files so parent links survive a save/load cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameObjectId(pub u64);

impl fmt::Display for GameObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct GameObject {
    pub(crate) id: GameObjectId,
    pub name: String,
    pub active: bool,
    /// Relative to the parent, or to the world for roots.
    pub transform: Transform,
    pub(crate) parent: Option<GameObjectId>,
    pub camera: Option<Camera>,
    pub rigid_body: Option<RigidBody>,
}

impl GameObject {
    pub(crate) fn new(id: GameObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
            transform: Transform::new(),
            parent: None,
            camera: None,
            rigid_body: None,
        }
    }

    pub fn id(&self) -> GameObjectId {
        self.id
    }

    pub fn parent(&self) -> Option<GameObjectId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_rigid_body(mut self, rigid_body: RigidBody) -> Self {
        self.rigid_body = Some(rigid_body);
        self
    }

    /// Writes identity, transform, parent link and components.
    ///
    /// The parent is written as an id (0 for roots) and resolved by the pool
    /// once every object has been read.
    pub(crate) fn serialize<W: Write>(&self, writer: &mut SceneWriter<W>) -> anyhow::Result<()> {
        writer.write_u64(self.id.0)?;
        writer.write_str(&self.name)?;
        writer.write_bool(self.active)?;
        writer.write_u64(self.parent.map_or(0, |p| p.0))?;

        writer.write_vector3(self.transform.position)?;
        writer.write_quaternion(self.transform.rotation)?;
        writer.write_vector3(self.transform.scale)?;

        writer.write_bool(self.camera.is_some())?;
        if let Some(camera) = &self.camera {
            camera.serialize(writer)?;
        }
        writer.write_bool(self.rigid_body.is_some())?;
        if let Some(rigid_body) = &self.rigid_body {
            rigid_body.serialize(writer)?;
        }
        Ok(())
    }

    pub(crate) fn deserialize<R: Read>(reader: &mut SceneReader<R>) -> anyhow::Result<Self> {
        let id = GameObjectId(reader.read_u64()?);
        let name = reader.read_str()?;
        let mut game_object = GameObject::new(id, name);
        game_object.active = reader.read_bool()?;
        game_object.parent = match reader.read_u64()? {
            0 => None,
            parent => Some(GameObjectId(parent)),
        };

        game_object.transform = Transform {
            position: reader.read_vector3()?,
            rotation: reader.read_quaternion()?,
            scale: reader.read_vector3()?,
        };

        if reader.read_bool()? {
            let mut camera = Camera::default();
            camera.deserialize(reader, &game_object.transform)?;
            game_object.camera = Some(camera);
        }
        if reader.read_bool()? {
            game_object.rigid_body = Some(RigidBody::deserialize(reader)?);
        }
        Ok(game_object)
    }
}
