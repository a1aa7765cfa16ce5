use std::{fs, sync::Arc};

use kestrel_ngin::{
    cgmath::Vector3,
    resources::{
        AudioClip, LoadState, Mesh, Resource, ResourceCache, ResourceType, Shader, Texture,
        load_resource, mesh::MESH_EXTENSION,
    },
};

use crate::common::test_utils::init_logger;

mod common;

const TRIANGLE_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

#[test]
fn should_track_load_state() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stone.png");
    Texture::solid("stone", 4, 2, [10, 20, 30, 255])
        .save_to_file(&path)
        .unwrap();

    let mut texture = Texture::default();
    assert_eq!(texture.load_state(), LoadState::Idle);
    texture.load(&path).unwrap();

    assert_eq!(texture.load_state(), LoadState::Completed);
    assert_eq!(texture.name(), "stone");
    assert_eq!(texture.info().file_path.as_deref(), Some(path.as_path()));
    assert_eq!((texture.width(), texture.height()), (4, 2));
    assert_eq!(&texture.rgba()[..4], &[10, 20, 30, 255]);

    let mut missing = Texture::default();
    assert!(missing.load(&dir.path().join("missing.png")).is_err());
    assert_eq!(missing.load_state(), LoadState::Failed);
}

#[test]
fn should_share_cached_resources() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grass.png");
    Texture::solid("grass", 2, 2, [0, 255, 0, 255])
        .save_to_file(&path)
        .unwrap();
    let mut cache = ResourceCache::new();

    let first = cache.load::<Texture>(&path).unwrap();
    let second = cache.load::<Texture>(&path).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.count(ResourceType::Texture), 1);
    assert!(cache.contains(first.id()));
    assert!(cache.get_by_name::<Texture>("grass").is_some());
    // Lookups are typed
    assert!(cache.get_by_id::<AudioClip>(first.id()).is_none());
    assert!(cache.get_by_path::<Shader>(&path).is_none());
}

#[test]
fn should_unload_resources_nobody_holds() {
    let mut cache = ResourceCache::new();
    let kept = cache.add(Texture::solid("kept", 1, 1, [0; 4]));
    let dropped = cache.add(AudioClip::from_bytes("click", vec![1, 2, 3]));
    let again = cache.add(Texture::solid("other", 1, 1, [0; 4]));
    drop(dropped);
    drop(again);

    assert_eq!(cache.unload_unused(), 2);
    assert_eq!(cache.get_all::<Texture>().len(), 1);
    assert!(cache.get_by_id::<Texture>(kept.id()).is_some());

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn should_give_resources_unique_ids() {
    let a = Texture::solid("a", 1, 1, [0; 4]);
    let b = Texture::solid("a", 1, 1, [0; 4]);

    assert_ne!(a.id(), b.id());
    assert_eq!(a.resource_type(), ResourceType::Texture);
}

#[test]
fn should_create_default_normal_maps() {
    let normal = Texture::default_normal_map(2, 2);

    assert!(normal.is_normal_map());
    assert_eq!(normal.rgba().len(), 16);
    assert!(normal.rgba().chunks(4).all(|p| p == [127, 127, 255, 255]));
}

#[test]
fn should_import_obj_meshes_with_tangents() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triangle.obj");
    fs::write(&path, TRIANGLE_OBJ).unwrap();

    let mesh: Mesh = load_resource(&path).unwrap();

    assert_eq!(mesh.vertices().len(), 3);
    assert_eq!(mesh.indices(), &[0, 1, 2]);
    for v in mesh.vertices() {
        approx::assert_abs_diff_eq!(v.tangent[0], 1.0, epsilon = 1e-5);
        approx::assert_abs_diff_eq!(v.tangent[1], 0.0, epsilon = 1e-5);
        approx::assert_abs_diff_eq!(v.normal[2], 1.0);
    }
    let (min, max) = mesh.bounding_box().unwrap();
    assert_eq!(min, Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(max, Vector3::new(1.0, 1.0, 0.0));
}

#[test]
fn should_save_and_reload_native_meshes() {
    let dir = tempfile::tempdir().unwrap();
    let obj_path = dir.path().join("triangle.obj");
    fs::write(&obj_path, TRIANGLE_OBJ).unwrap();
    let mesh: Mesh = load_resource(&obj_path).unwrap();

    let native_path = dir.path().join(format!("triangle{}", MESH_EXTENSION));
    mesh.save_to_file(&native_path).unwrap();
    let reloaded: Mesh = load_resource(&native_path).unwrap();

    assert_eq!(reloaded.vertices(), mesh.vertices());
    assert_eq!(reloaded.indices(), mesh.indices());
}

#[test]
fn should_refuse_unknown_mesh_formats() {
    let dir = tempfile::tempdir().unwrap();
    let fbx = dir.path().join("tree.fbx");
    let txt = dir.path().join("tree.txt");
    fs::write(&fbx, b"").unwrap();
    fs::write(&txt, b"").unwrap();

    assert!(load_resource::<Mesh>(&fbx).is_err());
    assert!(load_resource::<Mesh>(&txt).is_err());
}

#[test]
fn should_load_shader_sources() {
    let dir = tempfile::tempdir().unwrap();
    let wgsl = dir.path().join("flat.wgsl");
    let txt = dir.path().join("flat.txt");
    let source = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
    fs::write(&wgsl, source).unwrap();
    fs::write(&txt, source).unwrap();

    let shader: Shader = load_resource(&wgsl).unwrap();
    assert_eq!(shader.source(), source);
    assert_eq!(shader.name(), "flat");
    assert!(load_resource::<Shader>(&txt).is_err());
}

#[test]
fn should_keep_audio_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("click.ogg");
    AudioClip::from_bytes("click", vec![0x4f, 0x67, 0x67, 0x53])
        .save_to_file(&path)
        .unwrap();

    let clip: AudioClip = load_resource(&path).unwrap();

    assert_eq!(clip.data(), &[0x4f, 0x67, 0x67, 0x53]);
    assert_eq!(clip.len(), 4);
}
