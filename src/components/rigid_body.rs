use std::io::{Read, Write};

use anyhow::bail;
use cgmath::Vector3;

use crate::serializer::{SceneReader, SceneWriter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BodyType {
    #[default]
    Dynamic,
    Static,
    Kinematic,
}

impl BodyType {
    fn to_i32(self) -> i32 {
        match self {
            BodyType::Dynamic => 0,
            BodyType::Static => 1,
            BodyType::Kinematic => 2,
        }
    }

    fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(BodyType::Dynamic),
            1 => Some(BodyType::Static),
            2 => Some(BodyType::Kinematic),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColliderShape {
    /// Half extents along each axis.
    Box(Vector3<f32>),
    Sphere(f32),
    /// Half height of the cylindrical part and radius, aligned with Y.
    Capsule(f32, f32),
}

impl Default for ColliderShape {
    fn default() -> Self {
        ColliderShape::Box(Vector3::new(0.5, 0.5, 0.5))
    }
}

/// Simulation settings of a game object.
///
/// The body itself lives in the physics world; the engine creates it on the
/// first tick after the component was attached and keeps the owner's transform
/// in sync with it afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidBody {
    pub body_type: BodyType,
    pub shape: ColliderShape,
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            shape: ColliderShape::default(),
            mass: 1.0,
            friction: 0.5,
            restitution: 0.0,
        }
    }
}

impl RigidBody {
    pub fn new(body_type: BodyType, shape: ColliderShape) -> Self {
        Self {
            body_type,
            shape,
            ..Default::default()
        }
    }

    pub fn serialize<W: Write>(&self, writer: &mut SceneWriter<W>) -> anyhow::Result<()> {
        writer.write_int(self.body_type.to_i32())?;
        match self.shape {
            ColliderShape::Box(half_extents) => {
                writer.write_int(0)?;
                writer.write_vector3(half_extents)?;
            }
            ColliderShape::Sphere(radius) => {
                writer.write_int(1)?;
                writer.write_float(radius)?;
            }
            ColliderShape::Capsule(half_height, radius) => {
                writer.write_int(2)?;
                writer.write_float(half_height)?;
                writer.write_float(radius)?;
            }
        }
        writer.write_float(self.mass)?;
        writer.write_float(self.friction)?;
        writer.write_float(self.restitution)
    }

    pub fn deserialize<R: Read>(reader: &mut SceneReader<R>) -> anyhow::Result<Self> {
        let body_type = reader.read_int()?;
        let Some(body_type) = BodyType::from_i32(body_type) else {
            bail!("Unknown rigid body type {}", body_type);
        };
        let shape = match reader.read_int()? {
            0 => ColliderShape::Box(reader.read_vector3()?),
            1 => ColliderShape::Sphere(reader.read_float()?),
            2 => ColliderShape::Capsule(reader.read_float()?, reader.read_float()?),
            other => bail!("Unknown collider shape {}", other),
        };
        Ok(Self {
            body_type,
            shape,
            mass: reader.read_float()?,
            friction: reader.read_float()?,
            restitution: reader.read_float()?,
        })
    }
}
