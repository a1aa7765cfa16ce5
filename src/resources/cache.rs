use std::{
    any::Any,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::resources::{Resource, ResourceId, ResourceType, downcast, load_resource};

struct CacheEntry {
    id: ResourceId,
    name: String,
    file_path: Option<PathBuf>,
    resource_type: ResourceType,
    handle: Arc<dyn Any + Send + Sync>,
}

/// Owns one `Arc` of every cached resource.
///
/// Lookups are typed: asking for a resource under the wrong type returns
/// `None` even when the id, name or path matches.
#[derive(Default)]
pub struct ResourceCache {
    entries: Vec<CacheEntry>,
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.resource_type, &e.name)))
            .finish()
    }
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `resource` and returns a shared handle to it.
    /// A resource with the same id already in the cache is returned instead.
    pub fn add<T: Resource>(&mut self, resource: T) -> Arc<T> {
        if let Some(existing) = self.get_by_id::<T>(resource.id()) {
            return existing;
        }
        let info = resource.info().clone();
        let handle = Arc::new(resource);
        self.entries.push(CacheEntry {
            id: info.id,
            name: info.name,
            file_path: info.file_path,
            resource_type: T::static_type(),
            handle: handle.clone(),
        });
        handle
    }

    /// Loads `path` as a `T`, or returns the cached resource loaded from it.
    pub fn load<T: Resource + Default>(&mut self, path: impl AsRef<Path>) -> anyhow::Result<Arc<T>> {
        let path = path.as_ref();
        if let Some(cached) = self.get_by_path::<T>(path) {
            return Ok(cached);
        }
        let resource = load_resource::<T>(path)?;
        log::info!("Loaded {:?} {}", T::static_type(), path.display());
        Ok(self.add(resource))
    }

    pub fn get_by_id<T: Resource>(&self, id: ResourceId) -> Option<Arc<T>> {
        self.find::<T>(|e| e.id == id)
    }

    pub fn get_by_name<T: Resource>(&self, name: &str) -> Option<Arc<T>> {
        self.find::<T>(|e| e.name == name)
    }

    pub fn get_by_path<T: Resource>(&self, path: &Path) -> Option<Arc<T>> {
        self.find::<T>(|e| e.file_path.as_deref() == Some(path))
    }

    fn find<T: Resource>(&self, predicate: impl Fn(&CacheEntry) -> bool) -> Option<Arc<T>> {
        self.entries
            .iter()
            .filter(|e| e.resource_type == T::static_type())
            .find(|e| predicate(e))
            .and_then(|e| downcast::<T>(&e.handle))
    }

    /// Every cached resource of type `T`, in insertion order.
    pub fn get_all<T: Resource>(&self) -> Vec<Arc<T>> {
        self.entries
            .iter()
            .filter(|e| e.resource_type == T::static_type())
            .filter_map(|e| downcast::<T>(&e.handle))
            .collect()
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, resource_type: ResourceType) -> usize {
        self.entries
            .iter()
            .filter(|e| e.resource_type == resource_type)
            .count()
    }

    /// Drops every resource nobody but the cache holds. Returns how many went.
    pub fn unload_unused(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| Arc::strong_count(&e.handle) > 1);
        let unloaded = before - self.entries.len();
        if unloaded > 0 {
            log::info!("Unloaded {} unused resource(s)", unloaded);
        }
        unloaded
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
