//! Camera component.
//!
//! A camera caches its matrices and only rebuilds them when something they
//! depend on changed: the owner's position or rotation, the output resolution,
//! or one of the projection parameters. Everything follows the left-handed
//! convention of the engine (+Z forward) with depth in the 0..1 range.

use std::io::{Read, Write};

use cgmath::{EuclideanSpace, Matrix4, Point3, Quaternion, Vector2, Vector3, Vector4};

use crate::{
    data_structures::{
        frustum::Frustum,
        transform::{FORWARD, Transform, UP},
    },
    serializer::{SceneReader, SceneWriter},
};

pub const DEFAULT_FOV_DEGREES: f32 = 75.0;
pub const DEFAULT_NEAR_PLANE: f32 = 0.1;
pub const DEFAULT_FAR_PLANE: f32 = 1000.0;
/// Cornflower blue.
pub const DEFAULT_CLEAR_COLOR: Vector4<f32> = Vector4::new(0.396, 0.611, 0.937, 1.0);

const BASE_VIEW_POSITION: Vector3<f32> = Vector3::new(0.0, 0.0, -0.3);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Perspective = 0,
    Orthographic = 1,
}

impl Projection {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Projection::Perspective),
            1 => Some(Projection::Orthographic),
            _ => None,
        }
    }
}

/// Whether the cached matrices match the camera's inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraState {
    Clean,
    Dirty,
}

#[derive(Clone, Debug)]
pub struct Camera {
    clear_color: Vector4<f32>,
    projection: Projection,
    fov: f32,
    near_plane: f32,
    far_plane: f32,
    state: CameraState,

    // Inputs of the last recomputation.
    position: Vector3<f32>,
    rotation: Quaternion<f32>,
    resolution: Vector2<f32>,

    base_view: Matrix4<f32>,
    view: Matrix4<f32>,
    projection_matrix: Matrix4<f32>,
    frustum: Frustum,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vector2::new(1920.0, 1080.0))
    }
}

impl Camera {
    pub fn new(resolution: Vector2<f32>) -> Self {
        let transform = Transform::new();
        let mut camera = Self {
            clear_color: DEFAULT_CLEAR_COLOR,
            projection: Projection::Perspective,
            fov: DEFAULT_FOV_DEGREES.to_radians(),
            near_plane: DEFAULT_NEAR_PLANE,
            far_plane: DEFAULT_FAR_PLANE,
            state: CameraState::Dirty,
            position: transform.position,
            rotation: transform.rotation,
            resolution,
            base_view: Matrix4::from_scale(1.0),
            view: Matrix4::from_scale(1.0),
            projection_matrix: Matrix4::from_scale(1.0),
            frustum: Frustum::default(),
        };
        camera.recompute();
        camera
    }

    /// Rebuilds every derived matrix from the current inputs.
    pub fn reset(&mut self, transform: &Transform) {
        self.position = transform.position;
        self.rotation = transform.rotation;
        self.recompute();
    }

    /// Per frame dirty check. Returns true when the matrices were rebuilt.
    pub fn update(&mut self, transform: &Transform, resolution: Vector2<f32>) -> bool {
        if self.resolution != resolution {
            self.resolution = resolution;
            self.state = CameraState::Dirty;
        }

        if self.position != transform.position || self.rotation != transform.rotation {
            self.position = transform.position;
            self.rotation = transform.rotation;
            self.state = CameraState::Dirty;
        }

        if self.state == CameraState::Clean {
            return false;
        }

        self.recompute();
        true
    }

    fn recompute(&mut self) {
        self.base_view = Self::calculate_base_view();
        self.view = self.calculate_view();
        self.projection_matrix = self.calculate_projection();
        self.frustum = Frustum::construct(self.view, self.projection_matrix, self.far_plane);
        self.state = CameraState::Clean;
    }

    fn calculate_base_view() -> Matrix4<f32> {
        Matrix4::look_at_lh(
            Point3::from_vec(BASE_VIEW_POSITION),
            Point3::from_vec(FORWARD),
            UP,
        )
    }

    fn calculate_view(&self) -> Matrix4<f32> {
        let look_at = self.position + (self.rotation * FORWARD);
        let up = self.rotation * UP;
        Matrix4::look_at_lh(
            Point3::from_vec(self.position),
            Point3::from_vec(look_at),
            up,
        )
    }

    fn calculate_projection(&self) -> Matrix4<f32> {
        match self.projection {
            Projection::Perspective => perspective_lh(
                self.fov,
                self.aspect_ratio(),
                self.near_plane,
                self.far_plane,
            ),
            Projection::Orthographic => orthographic_lh(
                self.resolution.x,
                self.resolution.y,
                self.near_plane,
                self.far_plane,
            ),
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.resolution.y == 0.0 {
            return 1.0;
        }
        self.resolution.x / self.resolution.y
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == CameraState::Dirty
    }

    pub fn near_plane(&self) -> f32 {
        self.near_plane
    }

    pub fn set_near_plane(&mut self, near_plane: f32) {
        self.near_plane = near_plane;
        self.state = CameraState::Dirty;
    }

    pub fn far_plane(&self) -> f32 {
        self.far_plane
    }

    pub fn set_far_plane(&mut self, far_plane: f32) {
        self.far_plane = far_plane;
        self.state = CameraState::Dirty;
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.state = CameraState::Dirty;
    }

    /// Field of view in degrees.
    pub fn field_of_view(&self) -> f32 {
        self.fov.to_degrees()
    }

    /// Sets the field of view in degrees.
    pub fn set_field_of_view(&mut self, degrees: f32) {
        self.fov = degrees.to_radians();
        self.state = CameraState::Dirty;
    }

    pub fn clear_color(&self) -> Vector4<f32> {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Vector4<f32>) {
        self.clear_color = color;
    }

    pub fn resolution(&self) -> Vector2<f32> {
        self.resolution
    }

    pub fn base_view_matrix(&self) -> Matrix4<f32> {
        self.base_view
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Projects a world position to pixel coordinates, origin top-left.
    ///
    /// Returns `None` when the point lies on the camera plane, where the
    /// perspective divide is undefined.
    pub fn world_to_screen_point(&self, world_point: Vector3<f32>) -> Option<Vector2<f32>> {
        let clip = self.projection_matrix * self.view * world_point.extend(1.0);
        if clip.w.abs() <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let half_width = self.resolution.x * 0.5;
        let half_height = self.resolution.y * 0.5;
        Some(Vector2::new(
            ndc.x * half_width + half_width,
            -ndc.y * half_height + half_height,
        ))
    }

    pub fn serialize<W: Write>(&self, writer: &mut SceneWriter<W>) -> anyhow::Result<()> {
        writer.write_vector4(self.clear_color)?;
        writer.write_int(self.projection as i32)?;
        writer.write_float(self.fov)?;
        writer.write_float(self.near_plane)?;
        writer.write_float(self.far_plane)
    }

    /// Reads the persisted parameters and rebuilds the matrices for `transform`.
    pub fn deserialize<R: Read>(
        &mut self,
        reader: &mut SceneReader<R>,
        transform: &Transform,
    ) -> anyhow::Result<()> {
        self.clear_color = reader.read_vector4()?;
        let projection = reader.read_int()?;
        self.projection = Projection::from_i32(projection).unwrap_or_else(|| {
            log::warn!("Unknown projection {}, falling back to perspective", projection);
            Projection::Perspective
        });
        self.fov = reader.read_float()?;
        self.near_plane = reader.read_float()?;
        self.far_plane = reader.read_float()?;
        self.reset(transform);
        Ok(())
    }
}

/// Left-handed perspective projection with 0..1 depth.
pub fn perspective_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let y_scale = 1.0 / (fov_y * 0.5).tan();
    let x_scale = y_scale / aspect;
    let depth = far / (far - near);
    Matrix4::new(
        x_scale, 0.0, 0.0, 0.0, //
        0.0, y_scale, 0.0, 0.0, //
        0.0, 0.0, depth, 1.0, //
        0.0, 0.0, -near * depth, 0.0,
    )
}

/// Left-handed orthographic projection of a `width` x `height` volume centered
/// on the view axis, with 0..1 depth.
pub fn orthographic_lh(width: f32, height: f32, near: f32, far: f32) -> Matrix4<f32> {
    let depth = 1.0 / (far - near);
    Matrix4::new(
        2.0 / width, 0.0, 0.0, 0.0, //
        0.0, 2.0 / height, 0.0, 0.0, //
        0.0, 0.0, depth, 0.0, //
        0.0, 0.0, -near * depth, 1.0,
    )
}
