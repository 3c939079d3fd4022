//! Path-keyed store of loaded models.
//!
//! One [`ModelCache`] is created by the host at startup and handed to every
//! call site that needs a model. Keys are the path strings exactly as given;
//! entries live as long as the cache and are never refreshed.

use std::{collections::HashMap, path::Path, sync::Arc};

use parking_lot::Mutex;

use crate::{
    error::LoadResult,
    material::{MaterialLoader, MtlLoader},
    mesh::ModelHandle,
    obj::load_obj_from_path,
};

/// Single-threaded model cache. Loading takes `&mut self`.
#[derive(Debug, Default)]
pub struct ModelCache<L: MaterialLoader = MtlLoader> {
    models: HashMap<String, ModelHandle>,
    materials: L,
}

impl ModelCache<MtlLoader> {
    pub fn new() -> Self {
        Self::with_loader(MtlLoader::new())
    }
}

impl<L: MaterialLoader> ModelCache<L> {
    pub fn with_loader(materials: L) -> Self {
        Self {
            models: HashMap::new(),
            materials,
        }
    }

    /// Return the model stored under `path`, parsing the file on first use.
    /// A failed load leaves the cache untouched.
    pub fn get_or_load(&mut self, path: &str) -> LoadResult<ModelHandle> {
        if let Some(model) = self.models.get(path) {
            log::trace!("Model cache hit: {}", path);
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(load_obj_from_path(Path::new(path), &self.materials)?);
        log::info!(
            "Loaded model {} ({} positions, {} faces, {} groups)",
            path,
            model.geometry().positions.len(),
            model.face_count(),
            model.groups().len()
        );
        self.models.insert(path.to_owned(), Arc::clone(&model));
        Ok(model)
    }

    pub fn get(&self, path: &str) -> Option<ModelHandle> {
        self.models.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.models.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}

/// Cache for hosts that load from more than one thread. The lock is held
/// for the whole load, so a key is parsed at most once.
#[derive(Debug, Default)]
pub struct SharedModelCache<L: MaterialLoader = MtlLoader> {
    inner: Mutex<ModelCache<L>>,
}

impl<L: MaterialLoader> SharedModelCache<L> {
    pub fn new(cache: ModelCache<L>) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }

    pub fn get_or_load(&self, path: &str) -> LoadResult<ModelHandle> {
        self.inner.lock().get_or_load(path)
    }

    pub fn get(&self, path: &str) -> Option<ModelHandle> {
        self.inner.lock().get(path)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn into_inner(self) -> ModelCache<L> {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        path::PathBuf,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{error::LoadError, material::Material};

    static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

    fn temp_obj(contents: &str) -> PathBuf {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("cache_test_{}_{id}.obj", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    const TRIANGLE: &str = "g tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn second_request_shares_the_first_model() {
        let path = temp_obj(TRIANGLE);
        let key = path.to_string_lossy().into_owned();
        let mut cache = ModelCache::new();

        let a = cache.get_or_load(&key).unwrap();
        // The file is not read again.
        fs::remove_file(&path).unwrap();
        let b = cache.get_or_load(&key).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key));
    }

    #[test]
    fn failed_load_is_not_cached() {
        let path = temp_obj("g a\nv 0 0 0\nf 1 2 3\n");
        let key = path.to_string_lossy().into_owned();
        let mut cache = ModelCache::new();

        let err = cache.get_or_load(&key).unwrap_err();
        assert!(matches!(err, LoadError::IndexOutOfRange { .. }));
        assert!(cache.is_empty());

        // Fixing the file is picked up because nothing was stored.
        fs::write(&path, TRIANGLE).unwrap();
        assert!(cache.get_or_load(&key).is_ok());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn keys_are_not_normalized() {
        let path = temp_obj(TRIANGLE);
        let dir = path.parent().unwrap().to_string_lossy().into_owned();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let plain = format!("{dir}/{name}");
        let dotted = format!("{dir}/./{name}");

        let mut cache = ModelCache::new();
        let a = cache.get_or_load(&plain).unwrap();
        let b = cache.get_or_load(&dotted).unwrap();
        fs::remove_file(&path).ok();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
        let mut paths: Vec<&str> = cache.paths().collect();
        paths.sort_unstable();
        let mut expected = [plain.as_str(), dotted.as_str()];
        expected.sort_unstable();
        assert_eq!(paths, expected);
        assert_eq!(a.faces().count(), b.faces().count());
    }

    #[test]
    fn later_edits_do_not_reach_cached_models() {
        let path = temp_obj(TRIANGLE);
        let key = path.to_string_lossy().into_owned();
        let mut cache = ModelCache::new();
        let before = cache.get_or_load(&key).unwrap();

        fs::write(&path, "g quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        let after = cache.get_or_load(&key).unwrap();
        fs::remove_file(&path).ok();

        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.groups()[0].name, "tri");
    }

    #[test]
    fn material_loader_is_consulted_once_per_model() {
        let dir = std::env::temp_dir();
        let path = temp_obj("mtllib shared.mtl\ng a\nusemtl hull\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let key = path.to_string_lossy().into_owned();

        let calls = AtomicUsize::new(0);
        let loader = |lib: &Path| -> LoadResult<Vec<Arc<Material>>> {
            assert_eq!(lib, dir.join("shared.mtl"));
            calls.fetch_add(1, Ordering::Relaxed);
            Ok(vec![Arc::new(Material::new("hull"))])
        };

        let mut cache = ModelCache::with_loader(loader);
        let first = cache.get_or_load(&key).unwrap();
        let second = cache.get_or_load(&key).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(first.groups()[0].material_name(), Some("hull"));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn shared_cache_loads_each_key_once_across_threads() {
        let path = temp_obj(TRIANGLE);
        let key = path.to_string_lossy().into_owned();
        let shared = SharedModelCache::new(ModelCache::new());
        assert!(shared.is_empty());
        assert!(shared.get(&key).is_none());

        let handles: Vec<ModelHandle> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..4)
                .map(|_| s.spawn(|| shared.get_or_load(&key).unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        fs::remove_file(&path).ok();

        assert_eq!(shared.len(), 1);
        assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        let cached = shared.get(&key).unwrap();
        assert!(Arc::ptr_eq(&cached, &handles[0]));

        let cache = shared.into_inner();
        assert!(cache.contains(&key));
        assert_eq!(cache.paths().collect::<Vec<_>>(), [key.as_str()]);
    }
}
