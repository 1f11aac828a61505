//! Build-metadata cache.
//!
//! Resolved descriptor metadata is cached behind a small strategy interface:
//! an in-memory layer, an optional durable JSON-on-disk layer, and a
//! composite that checks the fast layer first. Selection and fallback happen
//! once at setup, not per lookup.

use crate::config::ParserConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Resolved metadata for one build descriptor, keyed by its coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorMetadata {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: String,
    pub profiles: Vec<String>,
    pub source_encoding: Option<String>,
}

impl DescriptorMetadata {
    /// The cache key for these coordinates.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Cache of resolved descriptor metadata. Lookups and inserts must be safe
/// for concurrent use so multiple parse invocations in one process can share
/// a cache.
pub trait MetadataCache {
    fn get(&self, key: &str) -> Option<DescriptorMetadata>;
    fn put(&self, metadata: DescriptorMetadata);
}

/// Non-persistent cache; always available.
#[derive(Debug, Default)]
pub struct InMemoryMetadataCache {
    entries: RwLock<HashMap<String, DescriptorMetadata>>,
}

impl InMemoryMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataCache for InMemoryMetadataCache {
    fn get(&self, key: &str) -> Option<DescriptorMetadata> {
        self.entries.read().expect("cache lock poisoned").get(key).cloned()
    }

    fn put(&self, metadata: DescriptorMetadata) {
        self.entries
            .write()
            .expect("cache lock poisoned")
            .insert(metadata.key(), metadata);
    }
}

/// Durable cache writing one JSON file per entry under a cache directory.
#[derive(Debug)]
pub struct DurableMetadataCache {
    dir: PathBuf,
}

impl DurableMetadataCache {
    /// Open (creating if needed) the cache directory. Fails when the
    /// directory cannot be created or written, which callers turn into a
    /// fallback to the in-memory cache.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create cache directory {}", dir.display()))?;
        // Probe writability up front so fallback happens at setup.
        let probe = dir.join(".reweave-probe");
        std::fs::write(&probe, b"")
            .with_context(|| format!("cache directory {} is not writable", dir.display()))?;
        let _ = std::fs::remove_file(&probe);
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        // Coordinates contain ':' and '.'; keep filenames portable.
        let file: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl MetadataCache for DurableMetadataCache {
    fn get(&self, key: &str) -> Option<DescriptorMetadata> {
        let path = self.entry_path(key);
        let json = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&json) {
            Ok(metadata) => Some(metadata),
            Err(err) => {
                tracing::warn!("discarding corrupt cache entry {}: {err}", path.display());
                let _ = std::fs::remove_file(&path);
                None
            }
        }
    }

    fn put(&self, metadata: DescriptorMetadata) {
        let path = self.entry_path(&metadata.key());
        match serde_json::to_string(&metadata) {
            Ok(json) => {
                if let Err(err) = std::fs::write(&path, json) {
                    tracing::warn!("failed to write cache entry {}: {err}", path.display());
                }
            }
            Err(err) => tracing::warn!("failed to serialize cache entry: {err}"),
        }
    }
}

/// Composite checking the fast in-memory layer first, then the durable
/// layer, promoting durable hits into memory.
pub struct CompositeMetadataCache {
    fast: InMemoryMetadataCache,
    durable: DurableMetadataCache,
}

impl CompositeMetadataCache {
    pub fn new(durable: DurableMetadataCache) -> Self {
        Self {
            fast: InMemoryMetadataCache::new(),
            durable,
        }
    }
}

impl MetadataCache for CompositeMetadataCache {
    fn get(&self, key: &str) -> Option<DescriptorMetadata> {
        if let Some(hit) = self.fast.get(key) {
            return Some(hit);
        }
        let hit = self.durable.get(key)?;
        self.fast.put(hit.clone());
        Some(hit)
    }

    fn put(&self, metadata: DescriptorMetadata) {
        self.fast.put(metadata.clone());
        self.durable.put(metadata);
    }
}

/// Select the cache implementation for `config`. With the durable cache
/// enabled but its backing directory unavailable, falls back to the
/// in-memory cache with a warning rather than failing the invocation.
pub fn cache_from_config(config: &ParserConfig) -> Box<dyn MetadataCache> {
    if !config.metadata_cache_enabled {
        return Box::new(InMemoryMetadataCache::new());
    }
    match DurableMetadataCache::open(&config.metadata_cache_dir) {
        Ok(durable) => Box::new(CompositeMetadataCache::new(durable)),
        Err(err) => {
            tracing::warn!(
                "unable to initialize durable metadata cache, falling back to in-memory: {err:#}"
            );
            Box::new(InMemoryMetadataCache::new())
        }
    }
}
