//! Module cache: compiled Wasmtime modules keyed by artifact content.
//!
//! Entries are keyed by the BLAKE3 hash of the artifact bytes and bounded
//! by the total artifact size they account for. When an insert would exceed
//! the capacity, the least recently used entries are evicted first. An
//! artifact larger than the whole capacity is never cached, and a capacity
//! of zero disables caching.

use parking_lot::Mutex;
use schnellru::{Limiter, LruMap};
use tracing::trace;
use wasmtime::Module;

use oracle_primitives::types::hash_to_hex;
use oracle_primitives::Hash;

const LOG_TARGET: &str = "oracle::cache";

/// Content address of an artifact.
pub fn artifact_key(artifact: &[u8]) -> Hash {
    *blake3::hash(artifact).as_bytes()
}

/// Counters describing cache use since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub used_bytes: usize,
}

struct CacheEntry {
    module: Module,
    /// Artifact size the entry is accounted as.
    size: usize,
}

/// Bounds the map by the total artifact size of its entries.
struct ByArtifactSize {
    capacity_bytes: usize,
    used_bytes: usize,
}

impl Limiter<Hash, CacheEntry> for ByArtifactSize {
    type KeyToInsert<'a> = Hash;
    type LinkType = u32;

    fn is_over_the_limit(&self, _length: usize) -> bool {
        self.used_bytes > self.capacity_bytes
    }

    fn on_insert(
        &mut self,
        _length: usize,
        key: Self::KeyToInsert<'_>,
        entry: CacheEntry,
    ) -> Option<(Hash, CacheEntry)> {
        if entry.size > self.capacity_bytes {
            return None;
        }
        self.used_bytes += entry.size;
        Some((key, entry))
    }

    fn on_replace(
        &mut self,
        _length: usize,
        _old_key: &mut Hash,
        _new_key: Self::KeyToInsert<'_>,
        old_entry: &mut CacheEntry,
        new_entry: &mut CacheEntry,
    ) -> bool {
        if new_entry.size > self.capacity_bytes {
            return false;
        }
        self.used_bytes = self.used_bytes - old_entry.size + new_entry.size;
        true
    }

    fn on_removed(&mut self, key: &mut Hash, entry: &mut CacheEntry) {
        self.used_bytes -= entry.size;
        trace!(target: LOG_TARGET, key = %hash_to_hex(key), size = entry.size, "evicted");
    }

    fn on_cleared(&mut self) {
        self.used_bytes = 0;
    }

    fn on_grow(&mut self, _new_memory_usage: usize) -> bool {
        true
    }
}

struct CacheInner {
    modules: LruMap<Hash, CacheEntry, ByArtifactSize>,
    hits: u64,
    misses: u64,
}

/// Bounded cache of compiled modules shared by every call on one VM.
///
/// Released exactly once, when the owning VM drops.
pub struct ModuleCache {
    capacity_bytes: usize,
    inner: Mutex<CacheInner>,
}

impl ModuleCache {
    /// Create a cache holding at most `capacity_kib` KiB of artifacts.
    pub fn new(capacity_kib: u32) -> Self {
        let capacity_bytes = capacity_kib as usize * 1024;
        let limiter = ByArtifactSize { capacity_bytes, used_bytes: 0 };
        Self {
            capacity_bytes,
            inner: Mutex::new(CacheInner {
                modules: LruMap::new(limiter),
                hits: 0,
                misses: 0,
            }),
        }
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Look up a compiled module, marking it most recently used.
    pub fn get(&self, key: &Hash) -> Option<Module> {
        let mut inner = self.inner.lock();
        let module = inner.modules.get(key).map(|e| e.module.clone());
        match module {
            Some(_) => inner.hits += 1,
            None => inner.misses += 1,
        }
        module
    }

    /// Cache `module`, accounted as `size` bytes.
    ///
    /// Returns false if the module was not cached because it does not fit.
    /// An artifact already cached keeps its entry; the same content always
    /// compiles to the same module.
    pub fn insert(&self, key: Hash, module: Module, size: usize) -> bool {
        if size > self.capacity_bytes {
            trace!(target: LOG_TARGET, size, capacity = self.capacity_bytes, "not cached");
            return false;
        }
        let mut inner = self.inner.lock();
        if inner.modules.peek(&key).is_some() {
            return true;
        }
        let cached = inner.modules.insert(key, CacheEntry { module, size });
        if cached {
            trace!(target: LOG_TARGET, key = %hash_to_hex(&key), size, "cached");
        }
        cached
    }

    pub fn contains(&self, key: &Hash) -> bool {
        self.inner.lock().modules.peek(key).is_some()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.modules.len(),
            used_bytes: inner.modules.limiter().used_bytes,
        }
    }
}
