use std::{collections::BTreeMap, sync::Arc};

use kestrel_ngin::{
    cgmath::{Vector2, Vector4},
    resources::font::{Font, Glyph},
    rhi::{
        BufferKind, BufferLayout, BufferUsage, IndexBuffer, IndexFormat, MemoryDevice, RhiDevice,
        RhiError, VertexBuffer,
        vertex::{VertexPosCol, VertexPosUv},
    },
};

fn device() -> (Arc<MemoryDevice>, Arc<dyn RhiDevice>) {
    let memory = Arc::new(MemoryDevice::new());
    let device: Arc<dyn RhiDevice> = memory.clone();
    (memory, device)
}

fn vertex(x: f32) -> VertexPosCol {
    VertexPosCol {
        position: [x, 0.0, 0.0],
        color: [1.0, 0.0, 0.0, 1.0],
    }
}

#[test]
fn should_upload_static_contents_at_creation() {
    let (memory, device) = device();
    let vertices = [vertex(1.0), vertex(2.0), vertex(3.0)];

    let buffer = VertexBuffer::new(device, &vertices).unwrap();

    assert_eq!(buffer.stride() as usize, std::mem::size_of::<VertexPosCol>());
    assert_eq!(buffer.vertex_count(), 3);
    assert_eq!(buffer.size(), 3 * buffer.stride() as u64);
    assert!(!buffer.is_dynamic());
    assert_eq!(
        memory.contents(buffer.buffer().id()).unwrap(),
        bytemuck::cast_slice::<_, u8>(&vertices)
    );
    assert_eq!(memory.kind(buffer.buffer().id()), Some(BufferKind::Vertex));
}

#[test]
fn should_refuse_to_map_static_buffers() {
    let (_, device) = device();
    let mut buffer = VertexBuffer::new(device, &[vertex(0.0)]).unwrap();
    let id = buffer.buffer().id();

    assert_eq!(buffer.map().err(), Some(RhiError::NotDynamic(id)));
}

#[test]
fn should_reject_empty_and_mismatched_layouts() {
    let (_, device) = device();

    let empty = VertexBuffer::new::<VertexPosCol>(device.clone(), &[]);
    assert!(matches!(empty, Err(RhiError::EmptyBuffer { count: 0, .. })));

    let mismatched = VertexBuffer::with_layout(
        device.clone(),
        BufferLayout::new(12, 2, BufferUsage::Static),
        Some(&[0u8; 12]),
    );
    assert_eq!(
        mismatched.err(),
        Some(RhiError::SizeMismatch {
            expected: 24,
            actual: 12
        })
    );
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn should_write_through_mappings() {
    let (memory, device) = device();
    let mut buffer = VertexBuffer::new_dynamic::<VertexPosCol>(device, 4).unwrap();
    let id = buffer.buffer().id();
    let stride = buffer.stride() as usize;

    let mut mapping = buffer.map().unwrap();
    mapping.write(1, &[vertex(7.0), vertex(8.0)]).unwrap();
    mapping.unmap().unwrap();

    let contents = memory.contents(id).unwrap();
    assert_eq!(contents.len(), 4 * stride);
    assert!(contents[..stride].iter().all(|b| *b == 0));
    assert_eq!(
        &contents[stride..3 * stride],
        bytemuck::cast_slice::<_, u8>(&[vertex(7.0), vertex(8.0)])
    );
    assert_eq!(memory.write_count(), 1);
}

#[test]
fn should_upload_when_a_mapping_is_dropped() {
    let (memory, device) = device();
    let mut buffer = VertexBuffer::new_dynamic::<VertexPosCol>(device, 1).unwrap();
    let id = buffer.buffer().id();

    {
        let mut mapping = buffer.map().unwrap();
        mapping.write(0, &[vertex(5.0)]).unwrap();
    }

    assert_eq!(
        memory.contents(id).unwrap(),
        bytemuck::bytes_of(&vertex(5.0))
    );
}

#[test]
fn should_not_write_past_the_end() {
    let (memory, device) = device();
    let mut buffer = VertexBuffer::new_dynamic::<VertexPosCol>(device, 2).unwrap();

    let mut mapping = buffer.map().unwrap();
    let result = mapping.write(1, &[vertex(1.0), vertex(2.0)]);
    mapping.unmap().unwrap();

    assert!(matches!(result, Err(RhiError::OutOfBounds { .. })));
    assert_eq!(memory.write_count(), 0);
}

#[test]
fn should_size_index_buffers_by_format() {
    let (memory, device) = device();

    let wide = IndexBuffer::new(device.clone(), &[0, 1, 2, 2, 3, 0]).unwrap();
    let narrow = IndexBuffer::new_u16(device.clone(), &[0, 1, 2]).unwrap();
    let dynamic = IndexBuffer::new_dynamic(device, IndexFormat::Uint16, 8).unwrap();

    assert_eq!(wide.format(), IndexFormat::Uint32);
    assert_eq!(wide.index_count(), 6);
    assert_eq!(narrow.format(), IndexFormat::Uint16);
    assert_eq!(memory.contents(narrow.buffer().id()).unwrap().len(), 6);
    assert!(dynamic.is_dynamic());
    assert_eq!(memory.kind(dynamic.buffer().id()), Some(BufferKind::Index));
}

#[test]
fn should_release_buffers_on_drop() {
    let (memory, device) = device();
    let vertices = VertexBuffer::new(device.clone(), &[vertex(0.0)]).unwrap();
    let indices = IndexBuffer::new(device.clone(), &[0]).unwrap();
    assert_eq!(device.live_buffers(), 2);

    drop(vertices);
    drop(indices);

    assert_eq!(device.live_buffers(), 0);
    assert_eq!(memory.released_count(), 2);
}

#[test]
#[cfg(target_pointer_width = "64")]
fn should_refuse_counts_beyond_u32() {
    let (_, device) = device();
    // Zero sized elements, nothing is allocated
    let too_many = vec![(); u32::MAX as usize + 1];

    let err = VertexBuffer::new(device.clone(), &too_many).unwrap_err();

    assert_eq!(err, RhiError::TooManyElements(u32::MAX as usize + 1));
    assert_eq!(device.live_buffers(), 0);
}

fn glyph(advance: f32) -> Glyph {
    Glyph {
        x_left: 0.0,
        x_right: 8.0,
        y_top: 0.0,
        y_bottom: 12.0,
        width: 8,
        height: 12,
        uv_x_left: 0.0,
        uv_x_right: 0.5,
        uv_y_top: 0.0,
        uv_y_bottom: 1.0,
        descent: 0.0,
        horizontal_offset: advance,
    }
}

#[test]
fn should_lay_out_text_into_quads() {
    let (memory, device) = device();
    let mut font = Font::new("mono", 12, Vector4::new(1.0, 1.0, 1.0, 1.0));
    font.set_glyphs(BTreeMap::from([('a', glyph(10.0)), (' ', glyph(4.0))]));
    assert_eq!(font.char_max_height(), 12);

    font.set_text(&device, "a a\na?", Vector2::new(0.0, 0.0)).unwrap();

    // Three known glyphs; whitespace and unknown characters emit nothing
    assert_eq!(font.index_count(), 18);
    let buffer = font.vertex_buffer().unwrap();
    let bytes = memory.contents(buffer.buffer().id()).unwrap();
    let stride = std::mem::size_of::<VertexPosUv>();
    let vertex_at =
        |i: usize| bytemuck::pod_read_unaligned::<VertexPosUv>(&bytes[i * stride..(i + 1) * stride]);
    // Second glyph starts after one advance and one space
    assert_eq!(vertex_at(6).position, [14.0, 0.0, 0.0]);
    // Third glyph starts a line below, back at the left edge
    assert_eq!(vertex_at(12).position, [0.0, -12.0, 0.0]);

    let writes = memory.write_count();
    font.set_text(&device, "a a\na?", Vector2::new(0.0, 0.0)).unwrap();
    assert_eq!(memory.write_count(), writes);
}
