use std::sync::Arc;

use crate::error::FilterError;

use super::config::FilterConfig;
use super::kernels::{gaussian_kernels, KernelPair};

/// Single-slot memo of the most recently synthesized kernel pair.
///
/// A request is served from the cache when its sigma is within
/// `config.sigma_tolerance` of the cached sigma; otherwise the kernels are synthesized
/// again and replace the cached pair. Requests inside the tolerance get the cached
/// kernels as they are, not kernels for their exact sigma.
///
/// The cache is owned by whoever computes with it; share it across threads by wrapping
/// it in a lock so the cached sigma and kernels are always read and replaced together.
#[derive(Debug, Clone, Default)]
pub struct KernelCache {
    config: FilterConfig,
    entry: Option<Arc<KernelPair>>,
}

impl KernelCache {
    /// Create an empty cache synthesizing kernels with `config`.
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            entry: None,
        }
    }

    /// The constants the cached kernels are synthesized with.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// The cached kernel pair, if any has been computed.
    pub fn cached(&self) -> Option<&KernelPair> {
        self.entry.as_deref()
    }

    /// Return the cached kernels if `sigma` is within tolerance of the cached sigma,
    /// otherwise synthesize and cache new ones.
    ///
    /// # Errors
    ///
    /// Propagates [`FilterError::InvalidConfiguration`] from kernel synthesis. On error
    /// the previously cached pair is kept.
    pub fn get_or_compute(&mut self, sigma: f32) -> Result<Arc<KernelPair>, FilterError> {
        if let Some(entry) = &self.entry {
            if (sigma - entry.sigma).abs() <= self.config.sigma_tolerance {
                log::trace!("kernel cache hit for sigma {} (cached {})", sigma, entry.sigma);
                return Ok(Arc::clone(entry));
            }
        }

        log::trace!("kernel cache miss for sigma {}", sigma);
        self.refresh(sigma)
    }

    /// Synthesize the kernels for `sigma` unconditionally and cache them.
    pub fn refresh(&mut self, sigma: f32) -> Result<Arc<KernelPair>, FilterError> {
        let kernels = Arc::new(gaussian_kernels(sigma, &self.config)?);
        self.entry = Some(Arc::clone(&kernels));
        Ok(kernels)
    }

    /// Drop the cached kernels.
    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_starts_empty() {
        let cache = KernelCache::default();
        assert!(cache.cached().is_none());
    }

    #[test]
    fn test_cache_hit_within_tolerance() -> Result<(), FilterError> {
        let mut cache = KernelCache::default();
        let first = cache.get_or_compute(1.0)?;
        let second = cache.get_or_compute(1.04)?;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.sigma, 1.0);
        Ok(())
    }

    #[test]
    fn test_cache_miss_recomputes() -> Result<(), FilterError> {
        let config = FilterConfig::default();
        let mut cache = KernelCache::new(config);
        let first = cache.get_or_compute(1.0)?;
        let second = cache.get_or_compute(1.5)?;

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*second, gaussian_kernels(1.5, &config)?);
        assert_eq!(cache.cached().map(|k| k.sigma), Some(1.5));
        Ok(())
    }

    #[test]
    fn test_cache_tolerance_is_relative_to_last_request() -> Result<(), FilterError> {
        let mut cache = KernelCache::default();
        cache.get_or_compute(1.0)?;
        // 1.04 hits, so the cached sigma stays 1.0 and 1.08 misses
        cache.get_or_compute(1.04)?;
        let kernels = cache.get_or_compute(1.08)?;
        assert_eq!(kernels.sigma, 1.08);
        Ok(())
    }

    #[test]
    fn test_cache_keeps_entry_on_error() -> Result<(), FilterError> {
        let mut cache = KernelCache::default();
        cache.get_or_compute(2.0)?;
        assert!(cache.get_or_compute(-1.0).is_err());
        assert_eq!(cache.cached().map(|k| k.sigma), Some(2.0));

        cache.clear();
        assert!(cache.cached().is_none());
        Ok(())
    }
}
