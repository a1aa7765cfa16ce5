use std::path::Path;

use anyhow::Context as _;

use crate::resources::{Resource, ResourceInfo, ResourceType};

/// An encoded audio file, kept as is until a mixer decodes it.
#[derive(Clone, Debug, Default)]
pub struct AudioClip {
    info: ResourceInfo,
    data: Vec<u8>,
}

impl AudioClip {
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Self {
        Self {
            info: ResourceInfo::new(name),
            data,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Resource for AudioClip {
    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ResourceInfo {
        &mut self.info
    }

    fn static_type() -> ResourceType {
        ResourceType::Audio
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::Audio
    }

    fn load_from_file(&mut self, path: &Path) -> anyhow::Result<()> {
        self.data = std::fs::read(path)
            .with_context(|| format!("Failed to read audio clip {}", path.display()))?;
        Ok(())
    }

    fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, &self.data)
            .with_context(|| format!("Failed to write audio clip {}", path.display()))
    }
}
