//! View frustum built from a camera's view and projection matrices.

use cgmath::{InnerSpace, Matrix4, Vector3, Vector4};

/// Result of a visibility test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intersection {
    Outside,
    Inside,
    Intersects,
}

/// A plane `normal . p + d = 0`; points with a positive distance are inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f32>,
    pub d: f32,
}

impl Plane {
    fn from_row(row: Vector4<f32>) -> Self {
        let normal = row.truncate();
        let length = normal.magnitude();
        if length <= f32::EPSILON {
            return Self { normal, d: row.w };
        }
        Self {
            normal: normal / length,
            d: row.w / length,
        }
    }

    pub fn distance(&self, point: Vector3<f32>) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// Six planes in the order left, right, bottom, top, near, far.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Default for Frustum {
    fn default() -> Self {
        Self::construct(Matrix4::from_scale(1.0), Matrix4::from_scale(1.0), 1.0)
    }
}

impl Frustum {
    /// Extracts the planes of `projection * view`.
    ///
    /// For perspective projections the depth terms are rebuilt so that the far
    /// plane sits at `far`. Depth is expected in the 0..1 range.
    pub fn construct(view: Matrix4<f32>, projection: Matrix4<f32>, far: f32) -> Self {
        let mut projection = projection;
        if projection[2][3] != 0.0 && projection[2][2] != 0.0 {
            let z_minimum = -projection[3][2] / projection[2][2];
            let r = far / (far - z_minimum);
            projection[2][2] = r;
            projection[3][2] = -r * z_minimum;
        }

        let m = projection * view;
        let row = |i: usize| Vector4::new(m[0][i], m[1][i], m[2][i], m[3][i]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                Plane::from_row(r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    pub fn check_point(&self, point: Vector3<f32>) -> Intersection {
        if self.planes.iter().all(|p| p.distance(point) >= 0.0) {
            Intersection::Inside
        } else {
            Intersection::Outside
        }
    }

    pub fn check_sphere(&self, center: Vector3<f32>, radius: f32) -> Intersection {
        let mut result = Intersection::Inside;
        for plane in &self.planes {
            let distance = plane.distance(center);
            if distance < -radius {
                return Intersection::Outside;
            }
            if distance < radius {
                result = Intersection::Intersects;
            }
        }
        result
    }

    /// Axis aligned box given by its center and half extents.
    pub fn check_aabb(&self, center: Vector3<f32>, extents: Vector3<f32>) -> Intersection {
        let mut result = Intersection::Inside;
        for plane in &self.planes {
            let radius = extents.x * plane.normal.x.abs()
                + extents.y * plane.normal.y.abs()
                + extents.z * plane.normal.z.abs();
            let distance = plane.distance(center);
            if distance < -radius {
                return Intersection::Outside;
            }
            if distance < radius {
                result = Intersection::Intersects;
            }
        }
        result
    }
}
