use anyhow::Context;
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::PathBuf;

/// On-disk store of synthesized commentary, evicted least-recently-used first.
#[derive(Debug, Clone)]
pub struct AudioCache {
    pub dir: PathBuf,
    pub extension: String,
    pub max_size_bytes: u64,
    pub max_entries: usize,
}

impl AudioCache {
    pub fn new(dir: PathBuf, extension: &str, max_size_bytes: u64, max_entries: usize) -> Self {
        Self {
            dir,
            extension: extension.to_string(),
            max_size_bytes,
            max_entries,
        }
    }

    /// `settings` is the serialized synthesis config, so any change to voice
    /// or tuning misses the cache.
    pub fn key(backend: &str, settings: &str, text: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in [backend, settings, text] {
            hasher.update(part.as_bytes());
            hasher.update(b"\0");
        }
        hasher.finalize().to_hex().to_string()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.entry_path(key);
        let data = fs::read(&path).ok()?;
        if let Err(err) = set_file_mtime(&path, FileTime::now()) {
            tracing::debug!(error = %err, "could not touch cache entry");
        }
        Some(data)
    }

    pub fn put(&self, key: &str, audio: &[u8]) -> anyhow::Result<()> {
        if audio.is_empty() || audio.len() as u64 > self.max_size_bytes {
            return Ok(());
        }

        fs::create_dir_all(&self.dir).context("create cache dir")?;
        let tmp = self.dir.join(format!("{key}.part"));
        fs::write(&tmp, audio).context("write cache entry")?;
        fs::rename(&tmp, self.entry_path(key)).context("commit cache entry")?;

        self.evict()
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{}", self.extension))
    }

    fn evict(&self) -> anyhow::Result<()> {
        let mut entries = Vec::new();
        let mut total = 0u64;

        for entry in fs::read_dir(&self.dir).context("read cache dir")? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            let meta = entry.metadata()?;
            total += meta.len();
            entries.push((path, FileTime::from_last_modification_time(&meta), meta.len()));
        }

        entries.sort_by_key(|(_, mtime, _)| *mtime);

        let mut count = entries.len();
        for (path, _, size) in entries {
            if total <= self.max_size_bytes && count <= self.max_entries {
                break;
            }
            if let Err(err) = fs::remove_file(&path) {
                tracing::debug!(path = %path.display(), error = %err, "cache eviction failed");
                continue;
            }
            total = total.saturating_sub(size);
            count -= 1;
        }

        Ok(())
    }
}
