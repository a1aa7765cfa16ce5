use std::{path::Path, sync::Arc};

use anyhow::{Context as _, bail};
use bincode::{Decode, Encode};
use cgmath::Vector3;

use crate::{
    filesystem,
    resources::{Resource, ResourceInfo, ResourceType},
    rhi::{IndexBuffer, RhiDevice, RhiError, VertexBuffer, vertex::VertexPosTexNorTan},
};

/// Extension of the engine's own mesh files.
pub const MESH_EXTENSION: &str = ".kmesh";
const MESH_FORMAT_VERSION: u32 = 1;
/// Decoding stops once a native mesh claims more than this many bytes.
const MAX_MESH_BYTES: usize = 256 << 20;

/// On-disk layout: vertices flattened to position, uv, normal, tangent, bitangent.
#[derive(Encode, Decode)]
struct MeshFile {
    version: u32,
    vertices: Vec<[f32; 14]>,
    indices: Vec<u32>,
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    info: ResourceInfo,
    vertices: Vec<VertexPosTexNorTan>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn new(name: &str, vertices: Vec<VertexPosTexNorTan>, indices: Vec<u32>) -> Self {
        Self {
            info: ResourceInfo::new(name),
            vertices,
            indices,
        }
    }

    pub fn vertices(&self) -> &[VertexPosTexNorTan] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Smallest and largest corner of the axis aligned bounding box.
    pub fn bounding_box(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let first: Vector3<f32> = self.vertices.first()?.position.into();
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            let p: Vector3<f32> = v.position.into();
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }

    /// Static GPU buffers holding this mesh.
    pub fn upload(
        &self,
        device: &Arc<dyn RhiDevice>,
    ) -> Result<(VertexBuffer, IndexBuffer), RhiError> {
        let vertex_buffer = VertexBuffer::new(device.clone(), &self.vertices)?;
        let index_buffer = IndexBuffer::new(device.clone(), &self.indices)?;
        Ok((vertex_buffer, index_buffer))
    }

    /// Imports every model of an OBJ file into a single mesh.
    fn load_obj(&mut self, path: &Path) -> anyhow::Result<()> {
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .with_context(|| format!("Failed to parse {}", path.display()))?;

        self.vertices.clear();
        self.indices.clear();
        for m in &models {
            let base = self.vertices.len() as u32;
            let count = m.mesh.positions.len() / 3;
            self.vertices.extend((0..count).map(|i| VertexPosTexNorTan {
                position: [
                    m.mesh.positions[i * 3],
                    m.mesh.positions[i * 3 + 1],
                    m.mesh.positions[i * 3 + 2],
                ],
                tex_coords: [
                    m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                    1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                ],
                normal: [
                    m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                    m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                    m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                ],
                // Filled in by calculate_tangents
                tangent: [0.0; 3],
                bitangent: [0.0; 3],
            }));
            self.indices.extend(m.mesh.indices.iter().map(|i| i + base));
        }
        self.calculate_tangents();
        Ok(())
    }

    /// OBJ files carry no tangents, normal mapping needs them.
    ///
    /// Each triangle contributes the tangent frame solving
    /// `delta_pos = delta_uv.x * T + delta_uv.y * B` to its three vertices, and
    /// the contributions are averaged per vertex.
    pub fn calculate_tangents(&mut self) {
        let vertices = &mut self.vertices;
        let mut triangles_included = vec![0u32; vertices.len()];

        for c in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (c[0] as usize, c[1] as usize, c[2] as usize);
            if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
                continue;
            }
            let (v0, v1, v2) = (vertices[i0], vertices[i1], vertices[i2]);

            let pos0: Vector3<f32> = v0.position.into();
            let pos1: Vector3<f32> = v1.position.into();
            let pos2: Vector3<f32> = v2.position.into();

            let uv0: cgmath::Vector2<f32> = v0.tex_coords.into();
            let uv1: cgmath::Vector2<f32> = v1.tex_coords.into();
            let uv2: cgmath::Vector2<f32> = v2.tex_coords.into();

            let delta_pos1 = pos1 - pos0;
            let delta_pos2 = pos2 - pos0;
            let delta_uv1 = uv1 - uv0;
            let delta_uv2 = uv2 - uv0;

            let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
            // Flipped for right-handed normal maps in wgpu's texture space.
            let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

            for i in [i0, i1, i2] {
                vertices[i].tangent = (tangent + Vector3::from(vertices[i].tangent)).into();
                vertices[i].bitangent = (bitangent + Vector3::from(vertices[i].bitangent)).into();
                triangles_included[i] += 1;
            }
        }

        for (v, n) in vertices.iter_mut().zip(triangles_included) {
            if n == 0 {
                continue;
            }
            let denom = 1.0 / n as f32;
            v.tangent = (Vector3::from(v.tangent) * denom).into();
            v.bitangent = (Vector3::from(v.bitangent) * denom).into();
        }
    }

    fn load_native(&mut self, path: &Path) -> anyhow::Result<()> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read mesh {}", path.display()))?;
        let config = bincode::config::standard().with_limit::<MAX_MESH_BYTES>();
        let (file, _): (MeshFile, usize) = bincode::decode_from_slice(&bytes, config)
            .with_context(|| format!("Corrupt mesh file {}", path.display()))?;
        if file.version != MESH_FORMAT_VERSION {
            bail!("Unsupported mesh format version {}", file.version);
        }
        if let Some(bad) = file.indices.iter().find(|&&i| i as usize >= file.vertices.len()) {
            bail!("Index {} is out of range for {} vertices", bad, file.vertices.len());
        }
        self.vertices = file.vertices.iter().map(unflatten).collect();
        self.indices = file.indices;
        Ok(())
    }
}

fn flatten(v: &VertexPosTexNorTan) -> [f32; 14] {
    let mut out = [0.0; 14];
    out[0..3].copy_from_slice(&v.position);
    out[3..5].copy_from_slice(&v.tex_coords);
    out[5..8].copy_from_slice(&v.normal);
    out[8..11].copy_from_slice(&v.tangent);
    out[11..14].copy_from_slice(&v.bitangent);
    out
}

fn unflatten(f: &[f32; 14]) -> VertexPosTexNorTan {
    VertexPosTexNorTan {
        position: [f[0], f[1], f[2]],
        tex_coords: [f[3], f[4]],
        normal: [f[5], f[6], f[7]],
        tangent: [f[8], f[9], f[10]],
        bitangent: [f[11], f[12], f[13]],
    }
}

impl Resource for Mesh {
    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ResourceInfo {
        &mut self.info
    }

    fn static_type() -> ResourceType {
        ResourceType::Mesh
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::Mesh
    }

    /// Reads either the native format or, by extension, an OBJ file.
    fn load_from_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let path_str = path.to_string_lossy();
        let extension = filesystem::get_extension_from_path(&path_str);
        if extension.eq_ignore_ascii_case(MESH_EXTENSION) {
            self.load_native(path)
        } else if extension.eq_ignore_ascii_case(".obj") {
            self.load_obj(path)
        } else if filesystem::is_supported_model(&path_str) {
            bail!("No importer for {} files yet", extension)
        } else {
            bail!("{} is not a mesh file", path.display())
        }
    }

    fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let file = MeshFile {
            version: MESH_FORMAT_VERSION,
            vertices: self.vertices.iter().map(flatten).collect(),
            indices: self.indices.clone(),
        };
        let bytes = bincode::encode_to_vec(&file, bincode::config::standard())?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write mesh {}", path.display()))
    }
}
