use kestrel_ngin::{
    EngineSettings,
    cgmath::{Deg, Quaternion, Rotation3, Vector3, Vector4},
    components::{BodyType, Camera, ColliderShape, Projection, RigidBody},
    data_structures::{GameObjectPool, Transform},
    serializer::{FORMAT_VERSION, MAGIC, MAX_DECODE_BYTES, SceneReader, SceneWriter},
};

use crate::common::test_utils::memory_engine;

mod common;

#[test]
fn should_restore_a_saved_scene() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level.dss");

    let (mut engine, _) = memory_engine(EngineSettings::default());
    let rotation = Quaternion::from_angle_y(Deg(30.0));
    let root = engine.scene.spawn("player", |obj| {
        obj.with_transform(Transform {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation,
            scale: Vector3::new(1.0, 2.0, 1.0),
        })
        .with_rigid_body(RigidBody::new(BodyType::Kinematic, ColliderShape::Capsule(0.5, 0.25)))
    });
    let camera = engine.scene.spawn("eyes", |obj| {
        let mut camera = Camera::default();
        camera.set_projection(Projection::Orthographic);
        camera.set_far_plane(250.0);
        camera.set_clear_color(Vector4::new(0.0, 0.0, 0.0, 1.0));
        obj.with_camera(camera)
    });
    engine.scene.set_parent(camera, Some(root)).unwrap();
    let hidden = engine.scene.create_game_object("hidden");
    engine.scene.get_game_object_by_id_mut(hidden).unwrap().active = false;

    engine.save_scene(&path).unwrap();
    engine.clear_scene();
    assert_eq!(engine.scene.get_game_object_count(), 0);
    engine.load_scene(&path).unwrap();

    let scene = &engine.scene;
    assert_eq!(scene.get_game_object_count(), 3);

    let player = scene.get_game_object_by_name("player").unwrap();
    assert_eq!(player.id(), root);
    assert_eq!(player.transform.position, Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(player.transform.rotation, rotation);
    assert_eq!(player.transform.scale, Vector3::new(1.0, 2.0, 1.0));
    assert_eq!(
        player.rigid_body,
        Some(RigidBody::new(BodyType::Kinematic, ColliderShape::Capsule(0.5, 0.25)))
    );

    let eyes = scene.get_game_object_by_name("eyes").unwrap();
    assert_eq!(eyes.parent(), Some(root));
    let restored = eyes.camera.as_ref().unwrap();
    assert_eq!(restored.projection(), Projection::Orthographic);
    assert_eq!(restored.far_plane(), 250.0);
    assert_eq!(restored.clear_color(), Vector4::new(0.0, 0.0, 0.0, 1.0));

    assert!(!scene.get_game_object_by_name("hidden").unwrap().active);
}

#[test]
fn should_keep_handing_out_fresh_ids_after_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level.dss");
    let (mut engine, _) = memory_engine(EngineSettings::default());
    let a = engine.scene.create_game_object("a");
    let b = engine.scene.create_game_object("b");
    engine.save_scene(&path).unwrap();

    engine.load_scene(&path).unwrap();
    let c = engine.scene.create_game_object("c");

    assert!(c > a && c > b);
}

/// Hand written stream: `count` objects with the given (id, parent) links.
fn scene_stream(links: &[(u64, u64)]) -> Vec<u8> {
    let mut writer = SceneWriter::new(Vec::new());
    writer.write_uint(links.len() as u32).unwrap();
    for (id, parent) in links {
        writer.write_u64(*id).unwrap();
        writer.write_str(&format!("object {}", id)).unwrap();
        writer.write_bool(true).unwrap();
        writer.write_u64(*parent).unwrap();
        writer.write_vector3(Vector3::new(0.0, 0.0, 0.0)).unwrap();
        writer
            .write_quaternion(Quaternion::new(1.0, 0.0, 0.0, 0.0))
            .unwrap();
        writer.write_vector3(Vector3::new(1.0, 1.0, 1.0)).unwrap();
        writer.write_bool(false).unwrap();
        writer.write_bool(false).unwrap();
    }
    writer.into_inner()
}

#[test]
fn should_turn_dangling_parents_into_roots() {
    let bytes = scene_stream(&[(1, 0), (2, 1), (3, 42)]);
    let mut pool = GameObjectPool::new();

    pool.deserialize(&mut SceneReader::new(bytes.as_slice())).unwrap();

    let obj = |id| {
        pool.get_all_game_objects()
            .iter()
            .find(|o| o.id().0 == id)
            .unwrap()
    };
    assert_eq!(obj(2).parent(), Some(obj(1).id()));
    assert!(obj(3).is_root());
}

#[test]
fn should_break_cycles_on_load() {
    let bytes = scene_stream(&[(1, 2), (2, 1)]);
    let mut pool = GameObjectPool::new();

    pool.deserialize(&mut SceneReader::new(bytes.as_slice())).unwrap();

    assert_eq!(pool.get_game_object_count(), 2);
    assert_eq!(pool.get_root_game_objects().len(), 1);
}

#[test]
fn should_resolve_children_stored_before_their_parents() {
    let bytes = scene_stream(&[(5, 9), (9, 0)]);
    let mut pool = GameObjectPool::new();

    pool.deserialize(&mut SceneReader::new(bytes.as_slice())).unwrap();

    assert_eq!(
        pool.get_all_game_objects()[0].parent().map(|p| p.0),
        Some(9)
    );
}

#[test]
fn should_reject_foreign_files() {
    let mut reader = SceneReader::new(&b"RIFF\x01\x00\x00\x00"[..]);

    assert!(reader.read_header().is_err());
}

#[test]
fn should_reject_newer_format_versions() {
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());

    assert!(SceneReader::new(bytes.as_slice()).read_header().is_err());

    let mut current = MAGIC.to_vec();
    current.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    assert_eq!(
        SceneReader::new(current.as_slice()).read_header().unwrap(),
        FORMAT_VERSION
    );
}

#[test]
fn should_fail_on_truncated_scenes() {
    let (mut engine, _) = memory_engine(EngineSettings::default());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.dss");
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&3u32.to_le_bytes());
    std::fs::write(&path, bytes).unwrap();

    assert!(engine.load_scene(&path).is_err());
    assert!(engine.load_scene(dir.path().join("missing.dss")).is_err());
}

#[test]
fn should_not_trust_the_stored_object_count() {
    let mut writer = SceneWriter::new(Vec::new());
    writer.write_header().unwrap();
    writer.write_uint(u32::MAX).unwrap();
    let bytes = writer.into_inner();
    let mut reader = SceneReader::new(bytes.as_slice());
    reader.read_header().unwrap();
    let mut pool = GameObjectPool::new();

    assert!(pool.deserialize(&mut reader).is_err());
}

#[test]
fn should_reject_oversized_names() {
    let mut writer = SceneWriter::new(Vec::new());
    writer.write_uint(1).unwrap();
    writer.write_u64(1).unwrap();
    // Length prefix of the name, no characters follow
    writer.write_u64(u64::MAX / 4).unwrap();
    let bytes = writer.into_inner();
    let mut pool = GameObjectPool::new();

    assert!(pool.deserialize(&mut SceneReader::new(bytes.as_slice())).is_err());

    let mut writer = SceneWriter::new(Vec::new());
    writer.write_str(&"x".repeat(MAX_DECODE_BYTES)).unwrap();
    let bytes = writer.into_inner();
    assert!(SceneReader::new(bytes.as_slice()).read_str().is_err());
}
