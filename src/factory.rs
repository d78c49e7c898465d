//! # Column Factory
//!
//! `ColumnFactory` turns type descriptors into ready-to-fill codecs. It owns
//! the shared [`CodecContext`] (buffer pool and default time zone) and,
//! optionally, a cache of parsed blueprints keyed by descriptor text.
//!
//! ## Builder Pattern
//!
//! Settings are chained on [`ColumnFactoryBuilder`] before `build()`:
//!
//! | Option            | Default                   | Description                          |
//! |-------------------|---------------------------|--------------------------------------|
//! | buffer_pool       | new pool                  | Share a pool with other factories    |
//! | pool_capacity     | `DEFAULT_BUFFER_POOL_RETAIN` | Idle buffers kept per size class  |
//! | default_time_zone | UTC                       | Zone for `DateTime` without one      |
//! | cache_blueprints  | true                      | Reuse parsed descriptors             |
//!
//! ## Usage
//!
//! ```rust
//! use colwire::ColumnFactory;
//!
//! let factory = ColumnFactory::builder()
//!     .default_time_zone(chrono_tz::Europe::Berlin)
//!     .build();
//!
//! let mut codec = factory.create("Array(Nullable(UInt8))", 2).unwrap();
//! codec.fill_from_texts(&["[1, NULL]", "[]"]).unwrap();
//! assert_eq!(codec.text(0), "[1, NULL]");
//!
//! let mut wire = Vec::new();
//! codec.write_to(&mut wire).unwrap();
//! codec.release();
//! ```
//!
//! ## Thread Safety
//!
//! `ColumnFactory` is `Send + Sync`. The blueprint cache sits behind a
//! `parking_lot::RwLock`; codecs it creates are independent of each other
//! apart from the shared buffer pool.
//!
//! ## Cache Bound
//!
//! The cache holds at most `MAX_CACHED_BLUEPRINTS` descriptors. Once full,
//! new descriptors are parsed on every call and not retained, so a stream of
//! distinct descriptors cannot grow the factory without bound.

use std::sync::Arc;

use chrono_tz::Tz;
use eyre::{bail, Result, WrapErr};
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::column::ColumnCodec;
use crate::config::{DEFAULT_BUFFER_POOL_RETAIN, MAX_BLOCK_BYTES, MAX_CACHED_BLUEPRINTS};
use crate::error::CodecError;
use crate::memory::BufferPool;
use crate::types::{parse_descriptor, CodecContext, ColumnBlueprint};

/// Builder for a [`ColumnFactory`].
pub struct ColumnFactoryBuilder {
    buffer_pool: Option<BufferPool>,
    pool_capacity: Option<usize>,
    default_time_zone: Option<Tz>,
    cache_blueprints: Option<bool>,
}

impl Default for ColumnFactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnFactoryBuilder {
    pub fn new() -> Self {
        Self {
            buffer_pool: None,
            pool_capacity: None,
            default_time_zone: None,
            cache_blueprints: None,
        }
    }

    /// Draw row storage from an existing pool. Takes precedence over
    /// `pool_capacity`.
    pub fn buffer_pool(mut self, pool: BufferPool) -> Self {
        self.buffer_pool = Some(pool);
        self
    }

    /// Idle buffers retained per size class by a newly created pool.
    pub fn pool_capacity(mut self, buffers: usize) -> Self {
        self.pool_capacity = Some(buffers);
        self
    }

    /// Zone for `DateTime`/`DateTime64` columns whose descriptor names none.
    pub fn default_time_zone(mut self, tz: Tz) -> Self {
        self.default_time_zone = Some(tz);
        self
    }

    pub fn cache_blueprints(mut self, enabled: bool) -> Self {
        self.cache_blueprints = Some(enabled);
        self
    }

    pub fn build(self) -> ColumnFactory {
        let pool = self.buffer_pool.unwrap_or_else(|| {
            BufferPool::new(self.pool_capacity.unwrap_or(DEFAULT_BUFFER_POOL_RETAIN))
        });
        let ctx = CodecContext {
            pool,
            time_zone: self.default_time_zone.unwrap_or(Tz::UTC),
        };
        let cache = self
            .cache_blueprints
            .unwrap_or(true)
            .then(|| RwLock::new(HashMap::new()));
        ColumnFactory { ctx, cache }
    }
}

/// Creates codecs from type descriptors.
pub struct ColumnFactory {
    ctx: CodecContext,
    cache: Option<RwLock<HashMap<String, Arc<ColumnBlueprint>>>>,
}

impl Default for ColumnFactory {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for ColumnFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnFactory")
            .field("time_zone", &self.ctx.time_zone)
            .field("cached_blueprints", &self.cached_blueprints())
            .finish()
    }
}

impl ColumnFactory {
    pub fn builder() -> ColumnFactoryBuilder {
        ColumnFactoryBuilder::new()
    }

    pub fn context(&self) -> &CodecContext {
        &self.ctx
    }

    /// Parse `descriptor`, reusing a cached blueprint when enabled.
    pub fn blueprint(&self, descriptor: &str) -> Result<Arc<ColumnBlueprint>> {
        let Some(cache) = &self.cache else {
            return Ok(Arc::new(parse_descriptor(descriptor)?));
        };

        if let Some(hit) = cache.read().get(descriptor) {
            tracing::trace!(descriptor, "blueprint cache hit");
            return Ok(Arc::clone(hit));
        }

        let blueprint = Arc::new(parse_descriptor(descriptor)?);
        tracing::debug!(descriptor, blueprint = %blueprint, "parsed column descriptor");
        let mut cache = cache.write();
        if let Some(hit) = cache.get(descriptor) {
            return Ok(Arc::clone(hit));
        }
        if cache.len() >= MAX_CACHED_BLUEPRINTS {
            tracing::debug!(descriptor, cached = cache.len(), "blueprint cache full");
            return Ok(blueprint);
        }
        cache.insert(descriptor.to_string(), Arc::clone(&blueprint));
        Ok(blueprint)
    }

    /// Create a codec for `rows` rows of `descriptor`.
    pub fn create(&self, descriptor: &str, rows: usize) -> Result<Box<dyn ColumnCodec>> {
        let blueprint = self
            .blueprint(descriptor)
            .wrap_err_with(|| format!("cannot create column of type '{}'", descriptor))?;
        let row_bytes = blueprint.instantiate(0, &self.ctx).wire_row_bytes();
        if !rows
            .checked_mul(row_bytes)
            .is_some_and(|bytes| bytes <= MAX_BLOCK_BYTES)
        {
            bail!(CodecError::shape(format!(
                "{} rows of '{}' exceed the {} byte block limit",
                rows, descriptor, MAX_BLOCK_BYTES
            )));
        }
        Ok(blueprint.instantiate(rows, &self.ctx))
    }

    /// Number of distinct descriptors parsed so far, if caching is enabled.
    pub fn cached_blueprints(&self) -> Option<usize> {
        self.cache.as_ref().map(|cache| cache.read().len())
    }
}
