// Byte-capped LRU for decoded lightbox images.
//
// Generic over the stored value so eviction and kind-precedence rules stay
// testable without a GDK display; the lightbox instantiates it with textures.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use lru::LruCache;

/// Quality tier of a cached image. A Full entry is never downgraded by a
/// late-arriving Preview for the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Preview,
    Full,
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub bytes: usize,
    pub kind: ImageKind,
}

pub struct ImageCache<T> {
    max_bytes: usize,
    bytes: usize,
    entries: LruCache<PathBuf, CacheEntry<T>>,
}

impl<T: Clone> ImageCache<T> {
    pub fn new(max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(2048).unwrap();
        Self {
            max_bytes,
            bytes: 0,
            entries: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, path: &Path) -> Option<CacheEntry<T>> {
        self.entries.get(path).cloned()
    }

    pub fn contains(&mut self, path: &Path) -> bool {
        self.entries.get(path).is_some()
    }

    /// Whether a full-quality entry is cached. A Preview-only entry does not
    /// count: its full-size decode is still wanted.
    pub fn contains_full(&mut self, path: &Path) -> bool {
        self.entries
            .get(path)
            .is_some_and(|entry| entry.kind == ImageKind::Full)
    }

    pub fn insert(&mut self, path: PathBuf, entry: CacheEntry<T>) {
        if let Some(existing) = self.entries.peek(&path) {
            if existing.kind == ImageKind::Full && entry.kind == ImageKind::Preview {
                return;
            }
        }

        if let Some(existing) = self.entries.put(path, entry.clone()) {
            self.bytes = self.bytes.saturating_sub(existing.bytes);
        }
        self.bytes = self.bytes.saturating_add(entry.bytes);

        while self.bytes > self.max_bytes {
            if let Some((_path, evicted)) = self.entries.pop_lru() {
                self.bytes = self.bytes.saturating_sub(evicted.bytes);
            } else {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: ImageKind, bytes: usize) -> CacheEntry<u8> {
        CacheEntry {
            value: 0,
            bytes,
            kind,
        }
    }

    #[test]
    fn test_eviction_respects_byte_cap() {
        let mut cache: ImageCache<u8> = ImageCache::new(100);
        cache.insert("a".into(), entry(ImageKind::Full, 60));
        cache.insert("b".into(), entry(ImageKind::Full, 60));

        // "a" was least recently used and must be gone.
        assert!(!cache.contains(Path::new("a")));
        assert!(cache.contains(Path::new("b")));
    }

    #[test]
    fn test_preview_never_replaces_full() {
        let mut cache: ImageCache<u8> = ImageCache::new(1024);
        cache.insert("a".into(), entry(ImageKind::Full, 10));
        cache.insert("a".into(), entry(ImageKind::Preview, 10));

        assert_eq!(cache.get(Path::new("a")).unwrap().kind, ImageKind::Full);
    }

    #[test]
    fn test_full_replaces_preview() {
        let mut cache: ImageCache<u8> = ImageCache::new(1024);
        cache.insert("a".into(), entry(ImageKind::Preview, 10));
        cache.insert("a".into(), entry(ImageKind::Full, 20));

        let got = cache.get(Path::new("a")).unwrap();
        assert_eq!(got.kind, ImageKind::Full);
        assert_eq!(got.bytes, 20);
    }

    #[test]
    fn test_replacement_accounts_bytes_once() {
        let mut cache: ImageCache<u8> = ImageCache::new(100);
        cache.insert("a".into(), entry(ImageKind::Preview, 40));
        cache.insert("a".into(), entry(ImageKind::Full, 50));
        // 50 in use; another 50 fits without evicting "a".
        cache.insert("b".into(), entry(ImageKind::Full, 50));
        assert!(cache.contains(Path::new("a")));
        assert!(cache.contains(Path::new("b")));
    }

    #[test]
    fn test_preview_entry_still_wants_full() {
        let mut cache: ImageCache<u8> = ImageCache::new(1024);
        cache.insert("a".into(), entry(ImageKind::Preview, 10));

        assert!(cache.contains(Path::new("a")));
        assert!(!cache.contains_full(Path::new("a")));

        cache.insert("a".into(), entry(ImageKind::Full, 20));
        assert!(cache.contains_full(Path::new("a")));
    }

    #[test]
    fn test_clear_resets_accounting() {
        let mut cache: ImageCache<u8> = ImageCache::new(100);
        cache.insert("a".into(), entry(ImageKind::Full, 80));
        cache.clear();
        cache.insert("b".into(), entry(ImageKind::Full, 80));
        cache.insert("c".into(), entry(ImageKind::Full, 20));
        assert!(cache.contains(Path::new("b")));
        assert!(cache.contains(Path::new("c")));
    }
}
