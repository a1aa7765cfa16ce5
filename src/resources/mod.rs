//! Typed assets and their shared ownership.
//!
//! Every asset implements [`Resource`]: it carries a [`ResourceInfo`] (unique
//! id, name, source path, load state) and knows how to load itself from and
//! save itself to a file. Resources start in [`LoadState::Idle`] and move
//! through `Loading` to `Completed` or `Failed`.
//!
//! The [`ResourceCache`] hands out `Arc`s so an asset lives as long as its
//! longest holder.
//!
//! - `texture` contains RGBA8 images decoded with `image`
//! - `mesh` contains indexed triangle meshes (OBJ import and a native format)
//! - `font` lays out text into dynamic vertex/index buffers
//! - `shader` holds WGSL sources
//! - `audio` holds encoded audio clips

use std::{
    any::Any,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use uuid::Uuid;

pub mod audio;
pub mod cache;
pub mod font;
pub mod mesh;
pub mod shader;
pub mod texture;

pub use audio::AudioClip;
pub use cache::ResourceCache;
pub use font::Font;
pub use mesh::Mesh;
pub use shader::Shader;
pub use texture::Texture;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Unknown,
    Texture,
    Audio,
    Material,
    Shader,
    Mesh,
    Model,
    Animation,
    Font,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Completed,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub Uuid);

impl ResourceId {
    pub fn new() -> Self {
        ResourceId(Uuid::new_v4())
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity and lifecycle shared by every resource.
#[derive(Clone, Debug, Default)]
pub struct ResourceInfo {
    pub id: ResourceId,
    pub name: String,
    pub file_path: Option<PathBuf>,
    pub load_state: LoadState,
}

impl ResourceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

pub trait Resource: Any + Send + Sync {
    fn info(&self) -> &ResourceInfo;

    fn info_mut(&mut self) -> &mut ResourceInfo;

    /// The type tag of this resource type.
    fn static_type() -> ResourceType
    where
        Self: Sized;

    fn resource_type(&self) -> ResourceType;

    fn load_from_file(&mut self, path: &Path) -> anyhow::Result<()>;

    fn save_to_file(&self, path: &Path) -> anyhow::Result<()>;

    fn id(&self) -> ResourceId {
        self.info().id
    }

    fn name(&self) -> &str {
        &self.info().name
    }

    fn load_state(&self) -> LoadState {
        self.info().load_state
    }

    /// [`load_from_file`](Resource::load_from_file) with load state tracking.
    ///
    /// The name defaults to the file stem when it was left empty.
    fn load(&mut self, path: &Path) -> anyhow::Result<()> {
        self.info_mut().load_state = LoadState::Loading;
        match self.load_from_file(path) {
            Ok(()) => {
                let info = self.info_mut();
                info.file_path = Some(path.to_path_buf());
                if info.name.is_empty() {
                    info.name = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                }
                info.load_state = LoadState::Completed;
                Ok(())
            }
            Err(e) => {
                self.info_mut().load_state = LoadState::Failed;
                log::error!("Failed to load {:?} from {}: {:#}", self.resource_type(), path.display(), e);
                Err(e)
            }
        }
    }
}

/// Loads a fresh resource of type `T` from `path`.
pub fn load_resource<T: Resource + Default>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let mut resource = T::default();
    resource
        .load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(resource)
}

/// Downcasts a type erased handle.
pub(crate) fn downcast<T: Resource>(handle: &Arc<dyn Any + Send + Sync>) -> Option<Arc<T>> {
    handle.clone().downcast::<T>().ok()
}
