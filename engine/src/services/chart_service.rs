//! Chart tile access with a bounded in-memory cache.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::service::{Lifecycle, Service, ServiceResult};
use crate::models::ServiceStatus;
use crate::providers::{ChartTile, ChartTileSource, TileKey};

pub const DEFAULT_TILE_CAPACITY: usize = 256;

#[derive(Default)]
struct TileCache {
    tiles: HashMap<TileKey, ChartTile>,
    order: VecDeque<TileKey>,
}

pub struct ChartService {
    source: Arc<dyn ChartTileSource>,
    capacity: usize,
    cache: Mutex<TileCache>,
    lifecycle: Lifecycle,
}

impl ChartService {
    /// A zero capacity disables caching.
    pub fn new(source: Arc<dyn ChartTileSource>, capacity: usize) -> Self {
        Self {
            source,
            capacity,
            cache: Mutex::new(TileCache::default()),
            lifecycle: Lifecycle::new("chart"),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached tile, or one loaded from the source. Loading happens outside
    /// the cache lock, so two concurrent misses may both hit the source.
    pub async fn tile(&self, key: TileKey) -> ServiceResult<ChartTile> {
        self.lifecycle.ensure_initialized()?;
        let cached = self.cache.lock().tiles.get(&key).cloned();
        if let Some(tile) = cached {
            return Ok(tile);
        }

        let tile = match self.source.load_tile(key).await {
            Ok(tile) => tile,
            Err(e) => {
                self.lifecycle.record_error(e.to_string());
                return Err(e.into());
            }
        };
        self.insert(tile.clone());
        self.lifecycle.touch();
        Ok(tile)
    }

    /// Oldest tiles are evicted first once the cache is full.
    fn insert(&self, tile: ChartTile) {
        if self.capacity == 0 {
            return;
        }
        let mut cache = self.cache.lock();
        let key = tile.key;
        if cache.tiles.insert(key, tile).is_some() {
            return;
        }
        cache.order.push_back(key);
        while cache.order.len() > self.capacity {
            if let Some(oldest) = cache.order.pop_front() {
                cache.tiles.remove(&oldest);
            }
        }
    }

    pub fn cached_count(&self) -> usize {
        self.cache.lock().tiles.len()
    }

    pub fn is_cached(&self, key: &TileKey) -> bool {
        self.cache.lock().tiles.contains_key(key)
    }

    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.tiles.clear();
        cache.order.clear();
    }
}

#[async_trait]
impl Service for ChartService {
    async fn initialize(&self) -> ServiceResult<()> {
        self.lifecycle.mark_initialized();
        Ok(())
    }

    async fn cleanup(&self) -> ServiceResult<()> {
        self.clear();
        self.lifecycle.mark_stopped();
        Ok(())
    }

    fn status(&self) -> ServiceResult<ServiceStatus> {
        Ok(self.lifecycle.status())
    }
}
