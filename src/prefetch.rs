//! Process-wide record of asset URLs that have already been requested.
//!
//! Lifecycle: the global instance lives for the whole process and never evicts. Inserts are
//! idempotent, so screens may admit the same art repeatedly without issuing duplicate fetches.
//! Independent instances can be built with [`ImagePrefetchCache::new`] for tests.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock, PoisonError};

static GLOBAL: OnceLock<ImagePrefetchCache> = OnceLock::new();

#[derive(Debug, Default)]
pub struct ImagePrefetchCache {
    requested: Mutex<HashSet<String>>,
}

impl ImagePrefetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared instance used by every screen.
    pub fn global() -> &'static ImagePrefetchCache {
        GLOBAL.get_or_init(ImagePrefetchCache::new)
    }

    /// Record `sources` and return those not seen before, in input order. Blank sources and
    /// repeats within the same batch are skipped.
    pub fn admit<I, S>(&self, sources: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut requested = self
            .requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut fresh = Vec::new();
        for source in sources {
            let source = source.as_ref();
            if source.trim().is_empty() {
                continue;
            }
            if requested.insert(source.to_string()) {
                fresh.push(source.to_string());
            }
        }
        fresh
    }

    pub fn contains(&self, source: &str) -> bool {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(source)
    }

    pub fn len(&self) -> usize {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_each_source_once() {
        let cache = ImagePrefetchCache::new();
        let first = cache.admit(["a.png", "b.png", "a.png"]);
        assert_eq!(first, vec!["a.png".to_string(), "b.png".to_string()]);

        let second = cache.admit(vec!["b.png".to_string(), "c.png".to_string()]);
        assert_eq!(second, vec!["c.png".to_string()]);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn blank_sources_are_ignored() {
        let cache = ImagePrefetchCache::new();
        assert!(cache.admit(["", "   "]).is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn global_instance_is_shared() {
        let url = "test://prefetch/global-instance-is-shared.png";
        ImagePrefetchCache::global().admit([url]);
        assert!(ImagePrefetchCache::global().contains(url));
        assert!(ImagePrefetchCache::global().admit([url]).is_empty());
    }
}
