// LineWatch - Adapter registry
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Lazily-populated adapter registry
//!
//! One adapter instance per (line, mode), created on first request and kept
//! for the lifetime of the registry. Entries are never evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use rand::rngs::StdRng;
use rand::SeedableRng;
use xxhash_rust::xxh64::xxh64;

use crate::adapter::{create_adapter, AdapterMode, AdapterStatus, DataAdapter};
use crate::catalog::LineId;
use crate::config::EngineConfig;

/// Adapter shared between the registry and its callers
pub type SharedAdapter = Arc<Mutex<Box<dyn DataAdapter>>>;

/// Registry key
pub type AdapterKey = (LineId, AdapterMode);

/// Derive the seed of one adapter from the engine seed.
pub fn derive_seed(seed: u64, line: LineId, mode: AdapterMode) -> u64 {
    let key = format!("{}/{}", line.as_str(), mode.as_str());
    xxh64(key.as_bytes(), seed)
}

/// Random source for one adapter: derived from the engine seed when set.
pub fn adapter_rng(seed: Option<u64>, line: LineId, mode: AdapterMode) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(derive_seed(s, line, mode)),
        None => StdRng::from_entropy(),
    }
}

/// Registry of adapter instances keyed by (line, mode)
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    config: EngineConfig,
    adapters: RwLock<HashMap<AdapterKey, SharedAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            adapters: RwLock::new(HashMap::new()),
        }
    }

    /// Get the adapter for (line, mode), creating it on first demand.
    ///
    /// When two callers race on a missing key the first insert wins and both
    /// receive the same instance.
    pub fn get_adapter(&self, line: LineId, mode: AdapterMode) -> SharedAdapter {
        if let Some(adapter) = self.get(line, mode) {
            return adapter;
        }

        let mut adapters = self.adapters.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(adapters.entry((line, mode)).or_insert_with(|| {
            log::debug!("Creating {} adapter for {}", mode, line);
            let rng = adapter_rng(self.config.seed, line, mode);
            Arc::new(Mutex::new(create_adapter(line, mode, &self.config, rng)))
        }))
    }

    /// Get an existing adapter without creating it
    pub fn get(&self, line: LineId, mode: AdapterMode) -> Option<SharedAdapter> {
        self.adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(line, mode))
            .cloned()
    }

    /// Number of registered adapters
    pub fn len(&self) -> usize {
        self.adapters.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no adapter was created yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<AdapterKey> {
        let mut keys: Vec<AdapterKey> = self
            .adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        keys.sort();
        keys
    }

    /// Status of every registered adapter, sorted by key
    pub fn statuses(&self) -> Vec<AdapterStatus> {
        self.keys()
            .into_iter()
            .filter_map(|(line, mode)| self.get(line, mode))
            .map(|adapter| adapter.lock().unwrap_or_else(PoisonError::into_inner).status())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_get_adapter_creates_once() {
        let registry = AdapterRegistry::new(EngineConfig::default());
        assert!(registry.is_empty());

        let a = registry.get_adapter(LineId::Line1, AdapterMode::Simulated);
        let b = registry.get_adapter(LineId::Line1, AdapterMode::Simulated);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);

        let c = registry.get_adapter(LineId::Line1, AdapterMode::Equipment);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_get_does_not_create() {
        let registry = AdapterRegistry::default();
        assert!(registry.get(LineId::Line3, AdapterMode::Simulated).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_creation_yields_single_instance() {
        let registry = Arc::new(AdapterRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.get_adapter(LineId::Line2, AdapterMode::Simulated))
            })
            .collect();

        let adapters: Vec<SharedAdapter> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(adapters.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_derive_seed_is_stable_and_distinct() {
        let a = derive_seed(42, LineId::Line1, AdapterMode::Simulated);
        assert_eq!(a, derive_seed(42, LineId::Line1, AdapterMode::Simulated));
        assert_ne!(a, derive_seed(42, LineId::Line2, AdapterMode::Simulated));
        assert_ne!(a, derive_seed(42, LineId::Line1, AdapterMode::Equipment));
        assert_ne!(a, derive_seed(43, LineId::Line1, AdapterMode::Simulated));
    }

    #[test]
    fn test_statuses_sorted() {
        let registry = AdapterRegistry::default();
        registry.get_adapter(LineId::Line3, AdapterMode::Simulated);
        registry.get_adapter(LineId::Line1, AdapterMode::Equipment);

        let statuses = registry.statuses();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].line, LineId::Line1);
        assert_eq!(statuses[1].line, LineId::Line3);
    }
}
