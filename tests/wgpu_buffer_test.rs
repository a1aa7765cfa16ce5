#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_allocate_and_release_gpu_buffers() {
    use std::sync::Arc;

    use kestrel_ngin::rhi::{
        IndexBuffer, IndexFormat, RhiDevice, VertexBuffer, WgpuDevice, vertex::VertexPosCol,
    };

    common::test_utils::init_logger();
    let device: Arc<dyn RhiDevice> = Arc::new(
        futures::executor::block_on(WgpuDevice::new_headless())
            .expect("integration tests need a graphics adapter"),
    );

    let mut lines = VertexBuffer::new_dynamic::<VertexPosCol>(device.clone(), 3).unwrap();
    let indices = IndexBuffer::new_u16(device.clone(), &[0, 1, 2]).unwrap();
    assert_eq!(indices.format(), IndexFormat::Uint16);
    assert_eq!(device.live_buffers(), 2);

    let mut mapping = lines.map().unwrap();
    mapping
        .write(
            1,
            &[VertexPosCol {
                position: [1.0, 2.0, 3.0],
                color: [1.0, 1.0, 1.0, 1.0],
            }],
        )
        .unwrap();
    mapping.unmap().unwrap();

    drop(lines);
    drop(indices);
    assert_eq!(device.live_buffers(), 0);
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_engine_tick_on_a_gpu_device() {
    use std::sync::Arc;

    use kestrel_ngin::{
        Engine, EngineSettings, cgmath::Vector3, components::RigidBody, rhi::WgpuDevice,
    };

    common::test_utils::init_logger();
    let device = futures::executor::block_on(WgpuDevice::new_headless())
        .expect("integration tests need a graphics adapter");
    let mut engine = Engine::new(
        EngineSettings {
            game_mode: true,
            debug_draw_physics: true,
            ..Default::default()
        },
        Arc::new(device),
    );
    let body = common::test_utils::spawn_body(
        &mut engine,
        "crate",
        Vector3::new(0.0, 5.0, 0.0),
        RigidBody::default(),
    );

    common::test_utils::run_frames(&mut engine, 10);

    assert!(common::test_utils::position_of(&engine, body).y < 5.0);
    assert!(engine.context.renderer.debug_vertex_buffer().is_some());
}
