//! Binary scene streams.
//!
//! A scene file starts with the [`MAGIC`] tag and a `u32` format version,
//! followed by whatever the pool writes. Every primitive is encoded with
//! bincode using fixed-width little-endian integers, so a float always takes
//! four bytes and an `i32` never gets varint-compressed. Vectors are written as
//! three floats, quaternions and colours as four.
//!
//! Reads are bounded by [`MAX_DECODE_BYTES`] per primitive, so a corrupt length
//! prefix fails the load instead of requesting a huge allocation.

use std::io::{Read, Write};

use anyhow::{Context, bail};
use bincode::config::{Configuration, Fixint, Limit, LittleEndian, NoLimit};

pub const MAGIC: [u8; 4] = *b"KSCN";
pub const FORMAT_VERSION: u32 = 1;
/// Upper bound for a single decoded value, strings included.
pub const MAX_DECODE_BYTES: usize = 1 << 20;

fn config() -> Configuration<LittleEndian, Fixint, NoLimit> {
    bincode::config::standard().with_fixed_int_encoding()
}

fn read_config() -> Configuration<LittleEndian, Fixint, Limit<MAX_DECODE_BYTES>> {
    config().with_limit::<MAX_DECODE_BYTES>()
}

pub struct SceneWriter<W: Write> {
    inner: W,
}

impl<W: Write> SceneWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes the magic tag and the current format version.
    pub fn write_header(&mut self) -> anyhow::Result<()> {
        self.inner
            .write_all(&MAGIC)
            .context("Failed to write scene header")?;
        self.write_uint(FORMAT_VERSION)
    }

    fn encode<T: bincode::Encode>(&mut self, value: T) -> anyhow::Result<()> {
        bincode::encode_into_std_write(value, &mut self.inner, config())?;
        Ok(())
    }

    pub fn write_int(&mut self, value: i32) -> anyhow::Result<()> {
        self.encode(value)
    }

    pub fn write_uint(&mut self, value: u32) -> anyhow::Result<()> {
        self.encode(value)
    }

    pub fn write_u64(&mut self, value: u64) -> anyhow::Result<()> {
        self.encode(value)
    }

    pub fn write_float(&mut self, value: f32) -> anyhow::Result<()> {
        self.encode(value)
    }

    pub fn write_bool(&mut self, value: bool) -> anyhow::Result<()> {
        self.encode(value)
    }

    pub fn write_str(&mut self, value: &str) -> anyhow::Result<()> {
        self.encode(value)
    }

    pub fn write_vector3(&mut self, value: cgmath::Vector3<f32>) -> anyhow::Result<()> {
        self.encode([value.x, value.y, value.z])
    }

    pub fn write_vector4(&mut self, value: cgmath::Vector4<f32>) -> anyhow::Result<()> {
        self.encode([value.x, value.y, value.z, value.w])
    }

    pub fn write_quaternion(&mut self, value: cgmath::Quaternion<f32>) -> anyhow::Result<()> {
        self.encode([value.v.x, value.v.y, value.v.z, value.s])
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

pub struct SceneReader<R: Read> {
    inner: R,
}

impl<R: Read> SceneReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Checks the magic tag and returns the format version.
    ///
    /// Versions newer than [`FORMAT_VERSION`] are rejected.
    pub fn read_header(&mut self) -> anyhow::Result<u32> {
        let mut magic = [0u8; 4];
        self.inner
            .read_exact(&mut magic)
            .context("Failed to read scene header")?;
        if magic != MAGIC {
            bail!("Not a scene file (magic {:?})", magic);
        }
        let version = self.read_uint()?;
        if version == 0 || version > FORMAT_VERSION {
            bail!(
                "Unsupported scene format version {} (expected {})",
                version,
                FORMAT_VERSION
            );
        }
        Ok(version)
    }

    fn decode<T: bincode::Decode<()>>(&mut self) -> anyhow::Result<T> {
        Ok(bincode::decode_from_std_read(&mut self.inner, read_config())?)
    }

    pub fn read_int(&mut self) -> anyhow::Result<i32> {
        self.decode()
    }

    pub fn read_uint(&mut self) -> anyhow::Result<u32> {
        self.decode()
    }

    pub fn read_u64(&mut self) -> anyhow::Result<u64> {
        self.decode()
    }

    pub fn read_float(&mut self) -> anyhow::Result<f32> {
        self.decode()
    }

    pub fn read_bool(&mut self) -> anyhow::Result<bool> {
        self.decode()
    }

    pub fn read_str(&mut self) -> anyhow::Result<String> {
        self.decode()
    }

    pub fn read_vector3(&mut self) -> anyhow::Result<cgmath::Vector3<f32>> {
        let [x, y, z]: [f32; 3] = self.decode()?;
        Ok(cgmath::Vector3::new(x, y, z))
    }

    pub fn read_vector4(&mut self) -> anyhow::Result<cgmath::Vector4<f32>> {
        let [x, y, z, w]: [f32; 4] = self.decode()?;
        Ok(cgmath::Vector4::new(x, y, z, w))
    }

    pub fn read_quaternion(&mut self) -> anyhow::Result<cgmath::Quaternion<f32>> {
        let [x, y, z, w]: [f32; 4] = self.decode()?;
        Ok(cgmath::Quaternion::new(w, x, y, z))
    }
}
