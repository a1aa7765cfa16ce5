use kestrel_ngin::{
    cgmath::{Deg, Quaternion, Rotation3, Vector2, Vector3, Vector4},
    components::{Camera, CameraState, Projection},
    data_structures::{Transform, frustum::Intersection},
    serializer::{SceneReader, SceneWriter},
};

fn full_hd() -> Vector2<f32> {
    Vector2::new(1920.0, 1080.0)
}

#[test]
fn should_start_clean() {
    let camera = Camera::new(full_hd());

    assert_eq!(camera.state(), CameraState::Clean);
    assert_eq!(camera.projection(), Projection::Perspective);
    approx::assert_abs_diff_eq!(camera.field_of_view(), 75.0, epsilon = 1e-4);
}

#[test]
fn should_recompute_once_per_change() {
    let mut camera = Camera::new(full_hd());
    let transform = Transform::new();

    assert!(!camera.update(&transform, full_hd()));

    camera.set_field_of_view(60.0);
    assert!(camera.is_dirty());
    assert!(camera.update(&transform, full_hd()));
    assert!(!camera.update(&transform, full_hd()));

    let moved = Transform::from(Vector3::new(0.0, 2.0, 0.0));
    assert!(camera.update(&moved, full_hd()));
    assert!(!camera.update(&moved, full_hd()));

    let turned = Transform::from_position_rotation(
        moved.position,
        Quaternion::from_angle_y(Deg(45.0)),
    );
    assert!(camera.update(&turned, full_hd()));

    assert!(camera.update(&turned, Vector2::new(640.0, 480.0)));
    assert!(!camera.update(&turned, Vector2::new(640.0, 480.0)));
}

#[test]
fn should_not_dirty_on_clear_color() {
    let mut camera = Camera::new(full_hd());
    camera.set_clear_color(Vector4::new(0.0, 0.0, 0.0, 1.0));

    assert_eq!(camera.state(), CameraState::Clean);
}

#[test]
fn should_project_the_view_axis_to_the_screen_center() {
    let camera = Camera::new(full_hd());

    let center = camera
        .world_to_screen_point(Vector3::new(0.0, 0.0, 10.0))
        .unwrap();
    approx::assert_abs_diff_eq!(center.x, 960.0, epsilon = 1e-3);
    approx::assert_abs_diff_eq!(center.y, 540.0, epsilon = 1e-3);

    let right_up = camera
        .world_to_screen_point(Vector3::new(1.0, 1.0, 10.0))
        .unwrap();
    assert!(right_up.x > 960.0);
    // Screen space grows downwards
    assert!(right_up.y < 540.0);
}

#[test]
fn should_not_project_points_on_the_camera_plane() {
    let camera = Camera::new(full_hd());

    assert!(camera.world_to_screen_point(Vector3::new(0.0, 0.0, 0.0)).is_none());
}

#[test]
fn should_project_orthographically() {
    let mut camera = Camera::new(full_hd());
    camera.set_projection(Projection::Orthographic);
    camera.reset(&Transform::new());

    let near = camera
        .world_to_screen_point(Vector3::new(480.0, 0.0, 5.0))
        .unwrap();
    let far = camera
        .world_to_screen_point(Vector3::new(480.0, 0.0, 500.0))
        .unwrap();

    // A quarter of the width right of center, regardless of depth
    approx::assert_abs_diff_eq!(near.x, 1440.0, epsilon = 1e-2);
    approx::assert_abs_diff_eq!(far.x, near.x, epsilon = 1e-2);
}

#[test]
fn should_cull_with_its_frustum() {
    let camera = Camera::new(full_hd());
    let frustum = camera.frustum();

    assert_eq!(frustum.check_point(Vector3::new(0.0, 0.0, 10.0)), Intersection::Inside);
    assert_eq!(frustum.check_point(Vector3::new(0.0, 0.0, -10.0)), Intersection::Outside);
    assert_eq!(frustum.check_point(Vector3::new(0.0, 0.0, 2000.0)), Intersection::Outside);

    assert_eq!(
        frustum.check_sphere(Vector3::new(0.0, 0.0, 0.0), 1.0),
        Intersection::Intersects
    );
    assert_eq!(
        frustum.check_aabb(Vector3::new(0.0, 0.0, 50.0), Vector3::new(1.0, 1.0, 1.0)),
        Intersection::Inside
    );
    assert_eq!(
        frustum.check_aabb(Vector3::new(0.0, -500.0, 10.0), Vector3::new(1.0, 1.0, 1.0)),
        Intersection::Outside
    );
}

#[test]
fn should_persist_its_parameters() {
    let mut camera = Camera::new(full_hd());
    camera.set_projection(Projection::Orthographic);
    camera.set_field_of_view(60.0);
    camera.set_near_plane(0.5);
    camera.set_far_plane(500.0);
    camera.set_clear_color(Vector4::new(0.1, 0.2, 0.3, 1.0));

    let mut writer = SceneWriter::new(Vec::new());
    camera.serialize(&mut writer).unwrap();
    let bytes = writer.into_inner();

    let transform = Transform::from(Vector3::new(0.0, 0.0, -10.0));
    let mut restored = Camera::default();
    restored
        .deserialize(&mut SceneReader::new(bytes.as_slice()), &transform)
        .unwrap();

    assert_eq!(restored.projection(), Projection::Orthographic);
    approx::assert_abs_diff_eq!(restored.field_of_view(), 60.0, epsilon = 1e-4);
    assert_eq!(restored.near_plane(), 0.5);
    assert_eq!(restored.far_plane(), 500.0);
    assert_eq!(restored.clear_color(), Vector4::new(0.1, 0.2, 0.3, 1.0));
    // Matrices are rebuilt for the owner on load
    assert_eq!(restored.state(), CameraState::Clean);
    assert!(!restored.update(&transform, full_hd()));
}

#[test]
fn should_fall_back_to_perspective_for_unknown_projections() {
    assert_eq!(Projection::from_i32(1), Some(Projection::Orthographic));
    assert_eq!(Projection::from_i32(7), None);

    let mut writer = SceneWriter::new(Vec::new());
    writer.write_vector4(Vector4::new(1.0, 1.0, 1.0, 1.0)).unwrap();
    writer.write_int(7).unwrap();
    writer.write_float(1.0).unwrap();
    writer.write_float(0.1).unwrap();
    writer.write_float(100.0).unwrap();
    let bytes = writer.into_inner();

    let mut camera = Camera::default();
    camera
        .deserialize(&mut SceneReader::new(bytes.as_slice()), &Transform::new())
        .unwrap();

    assert_eq!(camera.projection(), Projection::Perspective);
}
