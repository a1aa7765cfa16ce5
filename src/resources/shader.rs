use std::{borrow::Cow, path::Path};

use anyhow::{Context as _, bail};

use crate::{
    filesystem,
    resources::{Resource, ResourceInfo, ResourceType},
};

/// WGSL source of a shader program.
#[derive(Clone, Debug, Default)]
pub struct Shader {
    info: ResourceInfo,
    source: String,
}

impl Shader {
    pub fn from_source(name: &str, source: impl Into<String>) -> Self {
        Self {
            info: ResourceInfo::new(name),
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&self.info.name),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&self.source)),
        })
    }
}

impl Resource for Shader {
    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ResourceInfo {
        &mut self.info
    }

    fn static_type() -> ResourceType {
        ResourceType::Shader
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::Shader
    }

    fn load_from_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let path_str = path.to_string_lossy();
        if !filesystem::is_supported_shader(&path_str) {
            bail!("{} is not a supported shader file", path.display());
        }
        self.source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read shader {}", path.display()))?;
        Ok(())
    }

    fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, &self.source)
            .with_context(|| format!("Failed to write shader {}", path.display()))
    }
}
