//! Opened-frame store with an LRU cache keyed by frame path.
//!
//! Decoding is a pure function of frame bytes, so a cached frame yields the
//! same pixels as a freshly opened one; the cache only saves re-parsing
//! frame headers when neighbouring tiles touch the same frames.

use crate::frame::FrameReader;
use crate::telemetry::{FRAMES_OPENED, FRAME_CACHE_HITS};
use crate::{Result, TileError};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// An opened frame and the stamp of its last use.
#[derive(Debug)]
struct CachedFrame<F> {
    frame: Arc<F>,
    stamp: u64,
}

/// LRU cache of opened frames.
///
/// Every use takes a fresh stamp from a monotonic clock; `recency` orders
/// paths by stamp so the least recently used one is always first.
#[derive(Debug)]
struct FrameCache<F> {
    frames: HashMap<PathBuf, CachedFrame<F>>,
    recency: BTreeMap<u64, PathBuf>,
    clock: u64,
}

impl<F> FrameCache<F> {
    fn new() -> Self {
        Self {
            frames: HashMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
        }
    }

    fn contains(&self, path: &Path) -> bool {
        self.frames.contains_key(path)
    }

    /// Look up a frame and mark it most recently used.
    fn get(&mut self, path: &Path) -> Option<Arc<F>> {
        let cached = self.frames.get_mut(path)?;
        self.clock += 1;
        if let Some(key) = self.recency.remove(&cached.stamp) {
            self.recency.insert(self.clock, key);
        }
        cached.stamp = self.clock;
        Some(Arc::clone(&cached.frame))
    }

    fn insert(&mut self, path: PathBuf, frame: Arc<F>, capacity: usize) {
        if self.get(&path).is_some() {
            return;
        }
        while self.frames.len() >= capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.frames.remove(&oldest);
        }
        self.clock += 1;
        self.recency.insert(self.clock, path.clone());
        self.frames.insert(
            path,
            CachedFrame {
                frame,
                stamp: self.clock,
            },
        );
    }

    fn len(&self) -> usize {
        self.frames.len()
    }

    fn clear(&mut self) {
        self.frames.clear();
        self.recency.clear();
    }
}

/// Opens frames through a [`FrameReader`], keeping recently used ones.
///
/// This type is thread-safe when the reader and its frames are.
pub struct FrameStore<R: FrameReader> {
    reader: R,
    cache: RwLock<FrameCache<R::Frame>>,
    capacity: usize,
}

impl<R: FrameReader> std::fmt::Debug for FrameStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStore")
            .field("capacity", &self.capacity)
            .field("cached", &self.cached_count())
            .finish()
    }
}

impl<R: FrameReader> FrameStore<R> {
    /// Create a store caching up to `capacity` frames. Zero disables caching.
    pub fn new(reader: R, capacity: usize) -> Self {
        FrameStore {
            reader,
            cache: RwLock::new(FrameCache::new()),
            capacity,
        }
    }

    /// The underlying reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Maximum number of cached frames.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Open the frame at `path`, from the cache when possible.
    pub fn open(&self, path: &Path) -> Result<Arc<R::Frame>> {
        if self.capacity > 0 {
            let mut cache = self.cache.write().map_err(|_| TileError::CacheLockPoisoned)?;
            if let Some(frame) = cache.get(path) {
                metrics::counter!(FRAME_CACHE_HITS).increment(1);
                return Ok(frame);
            }
        }

        debug!(path = %path.display(), "opening frame");
        let frame = Arc::new(self.reader.open_frame(path)?);
        metrics::counter!(FRAMES_OPENED).increment(1);

        if self.capacity > 0 {
            let mut cache = self.cache.write().map_err(|_| TileError::CacheLockPoisoned)?;
            cache.insert(path.to_path_buf(), Arc::clone(&frame), self.capacity);
        }
        Ok(frame)
    }

    /// Whether the frame at `path` is currently cached.
    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache
            .read()
            .map(|c| c.contains(path))
            .unwrap_or(false)
    }

    /// Number of cached frames.
    pub fn cached_count(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Drop every cached frame.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }
}
