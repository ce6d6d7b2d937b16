//! On-disk cache of retrieved records
//!
//! Records are stored as bincode under `<dir>/<source_id>_rows.cache` and
//! replaced atomically, so a crashed run never leaves a torn cache behind.

use anyhow::{anyhow, Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use simthings_core::RawRecord;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct RecordCache {
    cache_dir: PathBuf,
}

impl RecordCache {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn path_for(&self, source_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{}_rows.cache", source_id))
    }

    /// Cached records for `source_id`, or `None` when nothing is cached yet
    pub fn load(&self, source_id: &str) -> Result<Option<Vec<RawRecord>>> {
        let path = self.path_for(source_id);
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(&path)?;
        let records: Vec<RawRecord> = bincode::deserialize(&data)
            .map_err(|e| anyhow!("Deserialization error in {}: {}", path.display(), e))?;
        info!("Reading data from cache file {}", path.display());
        Ok(Some(records))
    }

    pub fn store(&self, source_id: &str, records: &[RawRecord]) -> Result<PathBuf> {
        let path = self.path_for(source_id);
        let data = bincode::serialize(records)
            .map_err(|e| anyhow!("Serialization error: {}", e))?;

        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|file| file.write_all(&data))
            .with_context(|| format!("Failed to write cache file {}", path.display()))?;

        info!("Writing data to cache file {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<RawRecord> {
        vec![
            RawRecord::new("a").with_property("size", "1"),
            RawRecord::new("b").with_property("color", "red"),
        ]
    }

    #[test]
    fn test_miss_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RecordCache::new(dir.path()).unwrap();

        assert!(cache.load("abc").unwrap().is_none());

        let path = cache.store("abc", &sample()).unwrap();
        assert!(path.ends_with("abc_rows.cache"));
        assert_eq!(cache.load("abc").unwrap(), Some(sample()));
    }

    #[test]
    fn test_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RecordCache::new(dir.path()).unwrap();

        cache.store("id", &sample()).unwrap();
        cache.store("id", &sample()[..1]).unwrap();
        assert_eq!(cache.load("id").unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RecordCache::new(dir.path()).unwrap();
        fs::write(cache.path_for("bad"), b"\xff\xff\xff\xff\xff\xff\xff\xff\xff").unwrap();

        assert!(cache.load("bad").is_err());
    }
}
