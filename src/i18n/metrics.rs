//! Resolution metrics.
//!
//! Counts how generated readers resolved: by an exact language match, by the
//! first-loaded substitution, by the fallback branch, or not at all. Useful
//! for spotting content that is mostly served in the wrong language.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Resolution counters, kept per declared entity type.
#[derive(Debug)]
pub struct ResolutionMetrics {
    /// Lookups answered by a translation in the requested language
    exact_hits: AtomicUsize,

    /// Lookups answered by the first loaded translation
    first_loaded: AtomicUsize,

    /// Lookups answered by the fallback branch (default language or first)
    fallbacks: AtomicUsize,

    /// Lookups that found nothing
    misses: AtomicUsize,

    /// Translations built into a set on demand
    built: AtomicUsize,
}

impl ResolutionMetrics {
    pub fn new() -> Self {
        Self {
            exact_hits: AtomicUsize::new(0),
            first_loaded: AtomicUsize::new(0),
            fallbacks: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            built: AtomicUsize::new(0),
        }
    }

    pub fn record_exact_hit(&self) {
        self.exact_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_first_loaded(&self) {
        self.first_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_built(&self) {
        self.built.fetch_add(1, Ordering::Relaxed);
    }

    pub fn exact_hits(&self) -> usize {
        self.exact_hits.load(Ordering::Relaxed)
    }

    pub fn first_loaded(&self) -> usize {
        self.first_loaded.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn built(&self) -> usize {
        self.built.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let exact_hits = self.exact_hits();
        let first_loaded = self.first_loaded();
        let fallbacks = self.fallbacks();
        let misses = self.misses();
        let lookups = exact_hits + first_loaded + fallbacks + misses;
        let exact_hit_rate = if lookups > 0 {
            (exact_hits as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            exact_hits,
            first_loaded,
            fallbacks,
            misses,
            built: self.built(),
            exact_hit_rate,
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.exact_hits.store(0, Ordering::Relaxed);
        self.first_loaded.store(0, Ordering::Relaxed);
        self.fallbacks.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.built.store(0, Ordering::Relaxed);
    }
}

impl Default for ResolutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the resolution counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub exact_hits: usize,
    pub first_loaded: usize,
    pub fallbacks: usize,
    pub misses: usize,
    pub built: usize,

    /// Share of lookups answered in the requested language, as a percentage (0-100)
    pub exact_hit_rate: f64,
}
